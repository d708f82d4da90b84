// https://www.rfc-editor.org/rfc/rfc865 - Quote of the Day Protocol

use std::path;

pub mod config;
mod corpus;
mod parsers;
mod quote;
mod selector;
mod server;
mod supervisor;
mod watcher;

#[derive(clap::Args)]
#[group(skip)]
pub struct Arguments {
  #[arg(long = "config", help = "Path to the TOML configuration file")]
  pub config: path::PathBuf,
}

// Load the configuration, install the shutdown signal handlers, and run the server until
// interrupted.
pub fn run(arguments: &Arguments) -> anyhow::Result<()> {
  let configuration = config::Configuration::load(&arguments.config)?;

  let shutdown = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
  signal_hook::flag::register(signal_hook::consts::SIGINT, shutdown.clone())?;
  signal_hook::flag::register(signal_hook::consts::SIGTERM, shutdown.clone())?;

  supervisor::run(&configuration, shutdown)
}
