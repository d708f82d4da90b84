use std::{fs, path, thread, time};

// Spins up a real server on loopback addresses in a background thread and returns the ports
// it bound to along with the directory backing its corpus, so a test can write files into that
// directory and observe the server react.
pub struct Runner {
  pub directory: tempfile::TempDir,
  pub tcp_port: u16,
  pub udp_port: u16,
}

pub fn write_quote_file(directory: &path::Path, name: &str, content: &str) {
  fs::write(directory.join(name), content).unwrap();
}

pub fn start(extra_config: &str) -> Runner {
  let directory = tempfile::tempdir().unwrap();
  let quotes_directory = directory.path().join("quotes");
  fs::create_dir(&quotes_directory).unwrap();

  let tcp_port = portpicker::pick_unused_port().unwrap();
  let udp_port = portpicker::pick_unused_port().unwrap();

  let config_path = directory.path().join("qotd.toml");
  fs::write(
    &config_path,
    format!(
      "server.host = \"127.0.0.1\"\n\
       server.tcp_port = {tcp_port}\n\
       server.udp_port = {udp_port}\n\
       quotes.directories = [{quotes_directory:?}]\n\
       polling.interval_seconds = 1\n\
       {extra_config}\n"
    ),
  )
  .unwrap();

  thread::spawn(move || {
    let arguments = qotd::Arguments { config: config_path };
    if let Err(error) = qotd::run(&arguments) {
      log::warn!("server exited: {error:#}");
    }
  });

  // Give the background thread time to bind its sockets before a test starts connecting.
  thread::sleep(time::Duration::from_millis(200));

  Runner {
    directory,
    tcp_port,
    udp_port,
  }
}

impl Runner {
  pub fn quotes_directory(&self) -> path::PathBuf {
    self.directory.path().join("quotes")
  }

  pub fn wait_for_reload(&self) {
    thread::sleep(time::Duration::from_millis(1_500));
  }
}
