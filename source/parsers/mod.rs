// Per-format parsing: turn one file's raw bytes into an ordered list of candidate quote
// strings. Each parser is a pure function from bytes to strings; the dispatcher below is a
// single switch on the detected format. No plugin registry, the format set is closed.

mod csv;
mod detect;
mod json;
mod plain;
mod toml;
mod yaml;

pub use detect::{detect, Format};

// Run the format-appropriate parser over a file's bytes.
//
// Parse failures (syntax, encoding) are reported as `Err` so the caller can log and skip the
// file; they never panic and never abort the build.
pub fn parse(format: Format, bytes: &[u8]) -> anyhow::Result<Vec<String>> {
  match format {
    Format::Json => json::parse(bytes),
    Format::Csv => csv::parse(bytes),
    Format::Toml => toml::parse(bytes),
    Format::Yaml => yaml::parse(bytes),
    Format::Plain => Ok(plain::parse(bytes)),
  }
}
