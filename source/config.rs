// Static TOML configuration: parsed once at startup, validated, and never reloaded. Follows
// the reference crate's own error style (a hand-written `Debug` + `Display` + `std::error::Error`
// enum, no `thiserror`) so that `main` can report exactly which key failed validation.

use crate::selector;
use std::{error, fmt, fs, io, path, time};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 17;
const DEFAULT_MODE: selector::Mode = selector::Mode::Random;
const DEFAULT_INTERVAL_SECONDS: u32 = 60;

#[derive(Debug)]
pub enum ConfigError {
  Read(path::PathBuf, io::Error),
  Parse(toml::de::Error),
  MissingDirectories,
  EmptyDirectories,
  InvalidPort { field: &'static str, value: i64 },
  InvalidInterval(i64),
}

impl fmt::Display for ConfigError {
  fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
    match self {
      ConfigError::Read(path, error) => write!(formatter, "couldn't read {}: {error}", path.display()),
      ConfigError::Parse(error) => write!(formatter, "invalid configuration: {error}"),
      ConfigError::MissingDirectories => write!(formatter, "quotes.directories is required"),
      ConfigError::EmptyDirectories => write!(formatter, "quotes.directories must not be empty"),
      ConfigError::InvalidPort { field, value } => {
        write!(formatter, "{field} must be in 1..=65535, got {value}")
      }
      ConfigError::InvalidInterval(value) => {
        write!(formatter, "polling.interval_seconds must be >= 1, got {value}")
      }
    }
  }
}

impl error::Error for ConfigError {}

impl From<toml::de::Error> for ConfigError {
  fn from(error: toml::de::Error) -> Self {
    ConfigError::Parse(error)
  }
}

#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct RawServer {
  host: Option<String>,
  tcp_port: Option<i64>,
  udp_port: Option<i64>,
}

#[derive(serde::Deserialize)]
struct RawQuotes {
  directories: Vec<String>,
  #[serde(default)]
  mode: Option<selector::Mode>,
}

#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct RawPolling {
  interval_seconds: Option<i64>,
}

#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct RawConfiguration {
  server: RawServer,
  quotes: Option<RawQuotes>,
  polling: RawPolling,
}

// The validated, immutable, in-memory form of the configuration file. Constructed once at
// startup and handed by reference to every component that needs a piece of it.
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
  pub host: String,
  pub tcp_port: u16,
  pub udp_port: u16,
  pub directories: Vec<path::PathBuf>,
  pub mode: selector::Mode,
  pub polling_interval: time::Duration,
}

fn validated_port(field: &'static str, value: Option<i64>) -> Result<u16, ConfigError> {
  match value {
    None => {
      log::info!("{field} not set, defaulting to {DEFAULT_PORT}");
      Ok(DEFAULT_PORT)
    }
    Some(value) if (1..=65535).contains(&value) => Ok(value as u16),
    Some(value) => Err(ConfigError::InvalidPort { field, value }),
  }
}

impl Configuration {
  // Parse and validate a configuration document. Applied defaults are logged at `info`.
  pub fn parse(text: &str) -> Result<Self, ConfigError> {
    let raw: RawConfiguration = toml::from_str(text)?;

    let host = raw.server.host.unwrap_or_else(|| {
      log::info!("server.host not set, defaulting to {DEFAULT_HOST:?}");
      DEFAULT_HOST.to_string()
    });
    let tcp_port = validated_port("server.tcp_port", raw.server.tcp_port)?;
    let udp_port = validated_port("server.udp_port", raw.server.udp_port)?;

    let quotes = raw.quotes.ok_or(ConfigError::MissingDirectories)?;
    if quotes.directories.is_empty() {
      return Err(ConfigError::EmptyDirectories);
    }
    let directories = quotes.directories.into_iter().map(path::PathBuf::from).collect();
    let mode = quotes.mode.unwrap_or_else(|| {
      log::info!("quotes.mode not set, defaulting to random");
      DEFAULT_MODE
    });

    let interval_seconds = match raw.polling.interval_seconds {
      None => {
        log::info!("polling.interval_seconds not set, defaulting to {DEFAULT_INTERVAL_SECONDS}");
        DEFAULT_INTERVAL_SECONDS as i64
      }
      Some(value) if value >= 1 => value,
      Some(value) => return Err(ConfigError::InvalidInterval(value)),
    };

    Ok(Configuration {
      host,
      tcp_port,
      udp_port,
      directories,
      mode,
      polling_interval: time::Duration::from_secs(interval_seconds as u64),
    })
  }

  // Read and parse the configuration file at `path`.
  pub fn load(path: &path::Path) -> Result<Self, ConfigError> {
    let text = fs::read_to_string(path).map_err(|error| ConfigError::Read(path.to_path_buf(), error))?;
    Self::parse(&text)
  }
}
