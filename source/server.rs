// The RFC 865 responder itself: a non-blocking TCP listener and a non-blocking UDP socket,
// both registered on a single `mio::Poll`. Both protocols read the *current* quote through a
// shared callback rather than owning a corpus reference, so a corpus swap takes effect on the
// very next connection or datagram without touching this module.
//
// A TCP response is almost always small enough to complete in a single non-blocking write, but
// the contract doesn't assume that: a partial write registers the remaining bytes for write
// readiness and is retried on the connection's own token rather than blocking the event loop.
//
// Both `accept_all` and `service_udp` drain their socket to `WouldBlock` on a single readiness
// notification rather than handling one connection/datagram per call: mio's readiness model is
// edge-triggered on some platforms, so failing to drain risks never being woken for the rest of
// a backlog. TCP is still always serviced before UDP within one loop turn.

use std::{collections, io, net};

pub const TCP: mio::Token = mio::Token(0);
pub const UDP: mio::Token = mio::Token(1);
const FIRST_CONNECTION_TOKEN: usize = 2;

// A datagram larger than this worth of quote text is truncated before sending; RFC 865 puts no
// hard bound on message length, but most UDP stacks will not reliably deliver much more than this
// without fragmentation.
const UDP_MAX_RESPONSE: usize = 8 * 1024;

struct PendingWrite {
  stream: mio::net::TcpStream,
  buffer: Vec<u8>,
  written: usize,
}

pub struct Server {
  pub tcp: mio::net::TcpListener,
  pub udp: mio::net::UdpSocket,
  next_token: usize,
  pending: collections::HashMap<mio::Token, PendingWrite>,
}

// What a caller of `handle_event` should do after it returns.
pub enum Dispatched {
  // Not one of this server's tokens; not an error, just not ours.
  Unrecognized,
  Handled,
}

impl Server {
  pub fn bind(host: &str, tcp_port: u16, udp_port: u16) -> anyhow::Result<Self> {
    let tcp_address: net::SocketAddr = format!("{host}:{tcp_port}").parse()?;
    let udp_address: net::SocketAddr = format!("{host}:{udp_port}").parse()?;
    Ok(Server {
      tcp: mio::net::TcpListener::bind(tcp_address)?,
      udp: mio::net::UdpSocket::from_std(bind_udp_reuseaddr(udp_address)?),
      next_token: FIRST_CONNECTION_TOKEN,
      pending: collections::HashMap::new(),
    })
  }

  pub fn register(&mut self, poll: &mio::Poll) -> io::Result<()> {
    poll.registry().register(&mut self.tcp, TCP, mio::Interest::READABLE)?;
    poll.registry().register(&mut self.udp, UDP, mio::Interest::READABLE)?;
    Ok(())
  }

  fn allocate_token(&mut self) -> mio::Token {
    let token = mio::Token(self.next_token);
    self.next_token += 1;
    token
  }

  // Dispatches one readiness event to whichever of the listener, the UDP socket, or an
  // in-progress connection it belongs to. Returns `Unrecognized` for a token this server never
  // handed out (the caller's own bookkeeping, if any).
  pub fn handle_event(
    &mut self,
    poll: &mio::Poll,
    token: mio::Token,
    mut quote: impl FnMut() -> Option<String>,
  ) -> Dispatched {
    match token {
      TCP => {
        self.accept_all(poll, &mut quote);
        Dispatched::Handled
      }
      UDP => {
        self.service_udp(&mut quote);
        Dispatched::Handled
      }
      connection if self.pending.contains_key(&connection) => {
        self.resume_write(poll, connection);
        Dispatched::Handled
      }
      _ => Dispatched::Unrecognized,
    }
  }

  fn accept_all(&mut self, poll: &mio::Poll, quote: &mut impl FnMut() -> Option<String>) {
    loop {
      let (mut stream, peer) = match self.tcp.accept() {
        Ok(accepted) => accepted,
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => return,
        Err(error) => {
          log::warn!("TCP accept failed: {error}");
          return;
        }
      };

      let Some(text) = quote() else {
        log::debug!("empty corpus, closing TCP connection from {peer} without a response");
        continue;
      };
      let mut buffer = text.into_bytes();
      buffer.push(b'\n');

      match write_some(&mut stream, &buffer, 0) {
        Ok(written) if written == buffer.len() => close(&mut stream),
        Ok(written) => self.register_pending(poll, stream, buffer, written, &peer),
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
          self.register_pending(poll, stream, buffer, 0, &peer)
        }
        Err(error) => log::warn!("couldn't write TCP response to {peer}: {error}"),
      }
    }
  }

  fn register_pending(
    &mut self,
    poll: &mio::Poll,
    mut stream: mio::net::TcpStream,
    buffer: Vec<u8>,
    written: usize,
    peer: &net::SocketAddr,
  ) {
    let token = self.allocate_token();
    if let Err(error) = poll.registry().register(&mut stream, token, mio::Interest::WRITABLE) {
      log::warn!("couldn't register {peer} for write readiness: {error}");
      return;
    }
    self.pending.insert(token, PendingWrite { stream, buffer, written });
  }

  fn resume_write(&mut self, poll: &mio::Poll, token: mio::Token) {
    let Some(mut pending) = self.pending.remove(&token) else { return };
    let peer = pending.stream.peer_addr().ok();
    match write_some(&mut pending.stream, &pending.buffer, pending.written) {
      Ok(written) if pending.written + written == pending.buffer.len() => {
        let _ = poll.registry().deregister(&mut pending.stream);
        close(&mut pending.stream);
      }
      Ok(written) => {
        pending.written += written;
        self.pending.insert(token, pending);
      }
      Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
        self.pending.insert(token, pending);
      }
      Err(error) => {
        log::warn!("couldn't finish TCP write to {peer:?}: {error}");
        let _ = poll.registry().deregister(&mut pending.stream);
      }
    }
  }

  // Drain and serve every pending UDP datagram without blocking. `quote` is called once per
  // datagram received; the datagram's payload is never inspected.
  fn service_udp(&self, quote: &mut impl FnMut() -> Option<String>) {
    let mut discard = [0u8; 1];
    loop {
      let (_, peer) = match self.udp.recv_from(&mut discard) {
        Ok(received) => received,
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => return,
        Err(error) => {
          log::warn!("UDP receive failed: {error}");
          return;
        }
      };
      let Some(text) = quote() else {
        log::debug!("empty corpus, dropping UDP datagram from {peer} silently");
        continue;
      };
      let mut response = text.into_bytes();
      response.push(b'\n');
      if response.len() > UDP_MAX_RESPONSE {
        log::warn!("quote for {peer} exceeds {UDP_MAX_RESPONSE} bytes, truncating");
        response.truncate(UDP_MAX_RESPONSE);
        *response.last_mut().unwrap() = b'\n';
      }
      match self.udp.send_to(&response, peer) {
        Ok(_) => (),
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
          log::warn!("UDP response to {peer} would block, dropping");
        }
        Err(error) => log::warn!("couldn't send UDP response to {peer}: {error}"),
      }
    }
  }
}

// mio's `UdpSocket::bind` doesn't set `SO_REUSEADDR`, unlike its `TcpListener::bind`. Build the
// socket through socket2 instead so a quick restart doesn't hit EADDRINUSE on the UDP port too.
fn bind_udp_reuseaddr(address: net::SocketAddr) -> io::Result<net::UdpSocket> {
  let domain = if address.is_ipv4() { socket2::Domain::IPV4 } else { socket2::Domain::IPV6 };
  let socket = socket2::Socket::new(domain, socket2::Type::DGRAM, Some(socket2::Protocol::UDP))?;
  socket.set_reuse_address(true)?;
  socket.bind(&address.into())?;
  socket.set_nonblocking(true)?;
  Ok(socket.into())
}

fn write_some(stream: &mut mio::net::TcpStream, buffer: &[u8], from: usize) -> io::Result<usize> {
  use io::Write as _;
  stream.write(&buffer[from..])
}

fn close(stream: &mut mio::net::TcpStream) {
  if let Err(error) = stream.shutdown(net::Shutdown::Both) {
    log::debug!("couldn't shut down TCP connection: {error}");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use std::io::{Read as _, Write as _};

  fn loopback_server() -> Server {
    let port = portpicker::pick_unused_port().unwrap();
    Server::bind("127.0.0.1", port, port).unwrap()
  }

  fn drive(server: &mut Server, poll: &mio::Poll, events: &mut mio::Events, quote: &impl Fn() -> Option<String>) {
    for _ in 0..20 {
      if poll.poll(events, Some(std::time::Duration::from_millis(200))).is_err() {
        continue;
      }
      let tokens: Vec<_> = events.iter().map(|event| event.token()).collect();
      if tokens.is_empty() {
        return;
      }
      for token in tokens {
        server.handle_event(poll, token, || quote());
      }
    }
  }

  #[test]
  fn tcp_writes_quote_and_closes() {
    let mut server = loopback_server();
    let address = server.tcp.local_addr().unwrap();
    let poll = mio::Poll::new().unwrap();
    server.register(&poll).unwrap();
    let mut events = mio::Events::with_capacity(16);

    let handle = std::thread::spawn(move || {
      std::thread::sleep(std::time::Duration::from_millis(50));
      let mut stream = net::TcpStream::connect(address).unwrap();
      stream.write_all(b"ignored\n").unwrap();
      let mut received = Vec::new();
      stream.read_to_end(&mut received).unwrap();
      received
    });

    drive(&mut server, &poll, &mut events, &|| Some("Be yourself — Oscar Wilde".to_string()));
    assert_eq!(b"Be yourself \xe2\x80\x94 Oscar Wilde\n".to_vec(), handle.join().unwrap());
  }

  #[test]
  fn tcp_closes_without_writing_when_corpus_is_empty() {
    let mut server = loopback_server();
    let address = server.tcp.local_addr().unwrap();
    let poll = mio::Poll::new().unwrap();
    server.register(&poll).unwrap();
    let mut events = mio::Events::with_capacity(16);

    let handle = std::thread::spawn(move || {
      std::thread::sleep(std::time::Duration::from_millis(50));
      let mut stream = net::TcpStream::connect(address).unwrap();
      let mut received = Vec::new();
      stream.read_to_end(&mut received).unwrap();
      received
    });

    drive(&mut server, &poll, &mut events, &|| None);
    assert!(handle.join().unwrap().is_empty());
  }

  #[test]
  fn udp_responds_with_quote_to_sender() {
    let mut server = loopback_server();
    let address = server.udp.local_addr().unwrap();
    let poll = mio::Poll::new().unwrap();
    server.register(&poll).unwrap();
    let mut events = mio::Events::with_capacity(16);

    let client = net::UdpSocket::bind("127.0.0.1:0").unwrap();
    client.set_read_timeout(Some(std::time::Duration::from_secs(2))).unwrap();
    client.send_to(b"x", address).unwrap();

    drive(&mut server, &poll, &mut events, &|| Some("Quote A".to_string()));

    let mut buffer = [0u8; 64];
    let (count, _) = client.recv_from(&mut buffer).unwrap();
    assert_eq!(b"Quote A\n", &buffer[..count]);
  }

  #[test]
  fn udp_truncation_preserves_trailing_newline() {
    let mut server = loopback_server();
    let address = server.udp.local_addr().unwrap();
    let poll = mio::Poll::new().unwrap();
    server.register(&poll).unwrap();
    let mut events = mio::Events::with_capacity(16);

    let client = net::UdpSocket::bind("127.0.0.1:0").unwrap();
    client.set_read_timeout(Some(std::time::Duration::from_secs(2))).unwrap();
    client.send_to(b"x", address).unwrap();

    let huge = "a".repeat(UDP_MAX_RESPONSE * 2);
    drive(&mut server, &poll, &mut events, &|| Some(huge.clone()));

    let mut buffer = vec![0u8; UDP_MAX_RESPONSE + 16];
    let (count, _) = client.recv_from(&mut buffer).unwrap();
    assert_eq!(UDP_MAX_RESPONSE, count);
    assert_eq!(b'\n', buffer[count - 1]);
  }
}
