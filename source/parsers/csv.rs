// CSV quote files. The delimiter is auto-detected from the first line (comma vs. tab,
// comma wins ties); an optional header row naming the quote column is dropped; an optional
// second column is treated as the author.

use crate::quote;
use anyhow::Context as _;

const HEADER_NAMES: [&str; 4] = ["quote", "text", "content", "quotes"];

fn detect_delimiter(bytes: &[u8]) -> u8 {
  let first_line = bytes.split(|&byte| byte == b'\n').next().unwrap_or(bytes);
  let commas = memchr::memchr_iter(b',', first_line).count();
  let tabs = memchr::memchr_iter(b'\t', first_line).count();
  if tabs > commas {
    b'\t'
  } else {
    b','
  }
}

fn is_header(first_cell: &str) -> bool {
  HEADER_NAMES
    .iter()
    .any(|name| first_cell.eq_ignore_ascii_case(name))
}

pub fn parse(bytes: &[u8]) -> anyhow::Result<Vec<String>> {
  let delimiter = detect_delimiter(bytes);
  let mut reader = csv::ReaderBuilder::new()
    .delimiter(delimiter)
    .has_headers(false)
    .flexible(true)
    .from_reader(bytes);

  let mut candidates = Vec::new();
  for (index, record) in reader.records().enumerate() {
    let record = record.context("invalid CSV row")?;
    let Some(first) = record.get(0) else {
      continue;
    };
    if index == 0 && is_header(first) {
      continue;
    }
    let candidate = match record.get(1) {
      Some(author) if !author.is_empty() => quote::with_author(first, author),
      _ => first.to_owned(),
    };
    candidates.push(candidate);
  }
  Ok(candidates)
}
