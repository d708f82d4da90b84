// The main loop: wait on the sockets with a bounded timeout, service whichever is ready (TCP
// first), and on every timeout tick ask the watcher whether a rebuild is due. A changed corpus
// is built in full before the old one is dropped, so a parse error partway through a directory
// never interrupts service with the previous snapshot.

use crate::{config, corpus, selector, server, watcher};
use std::sync::{atomic, Arc};

// Upper bound on how long a single `mio::Poll::poll` call may block. Keeping this short is
// what lets the loop notice both a shutdown request and a due watcher poll promptly, even when
// no socket traffic arrives in the meantime.
const POLL_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(250);

pub fn run(configuration: &config::Configuration, shutdown: Arc<atomic::AtomicBool>) -> anyhow::Result<()> {
  let mut server = server::Server::bind(&configuration.host, configuration.tcp_port, configuration.udp_port)?;
  log::info!(
    "listening on {} (tcp port {}, udp port {})",
    configuration.host,
    configuration.tcp_port,
    configuration.udp_port
  );

  let mut poll = mio::Poll::new()?;
  server.register(&poll)?;
  let mut events = mio::Events::with_capacity(128);

  let mut corpus = corpus::build(&configuration.directories);
  let mut selector = selector::Selector::new(configuration.mode, corpus.len());
  let mut watcher = watcher::Watcher::new(configuration.directories.clone());

  let mut last_poll = std::time::Instant::now();

  while !shutdown.load(atomic::Ordering::Relaxed) {
    match poll.poll(&mut events, Some(POLL_TIMEOUT)) {
      Ok(()) => (),
      Err(error) if error.kind() == std::io::ErrorKind::Interrupted => continue,
      Err(error) => return Err(error.into()),
    }

    let mut tokens: Vec<_> = events.iter().map(|event| event.token()).collect();
    // TCP before UDP within a single turn; other tokens (in-progress writes) trail either.
    tokens.sort_by_key(|token| match *token {
      server::TCP => 0,
      server::UDP => 1,
      _ => 2,
    });
    for token in tokens {
      server.handle_event(&poll, token, || {
        selector.next().and_then(|index| corpus.get(index).map(str::to_string))
      });
    }

    if last_poll.elapsed() >= configuration.polling_interval {
      last_poll = std::time::Instant::now();
      if watcher.poll() {
        log::info!("change detected under the configured quote directories, rebuilding corpus");
        corpus = corpus::build(&configuration.directories);
        selector.reset(corpus.len());
      }
    }
  }

  log::info!("shutdown requested, exiting");
  Ok(())
}
