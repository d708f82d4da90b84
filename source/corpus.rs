// Assembling a fresh, immutable corpus snapshot from a configured list of directories.
// `build` never fails: unreadable directories and unparseable files are logged and skipped,
// and an empty corpus is itself a valid, final result.

use crate::{parsers, quote};
use std::{collections, fs, path, time};

// Files larger than this are skipped with a warning rather than read in full. The spec's own
// floor is 10 MiB; this implementation sets it a bit above that for headroom.
pub const MAX_FILE_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq)]
pub struct Metadata {
  pub files_scanned: usize,
  pub candidates_parsed: usize,
  pub duplicates_removed: usize,
  pub unique_quotes: usize,
  pub built_at: time::SystemTime,
}

// The immutable, deduplicated, ordered set of quotes live at a given instant.
#[derive(Clone, Debug, PartialEq)]
pub struct Corpus {
  quotes: Vec<String>,
  metadata: Metadata,
}

impl Corpus {
  pub fn len(&self) -> usize {
    self.quotes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.quotes.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&str> {
    self.quotes.get(index).map(String::as_str)
  }

  pub fn metadata(&self) -> &Metadata {
    &self.metadata
  }
}

fn read_capped(path: &path::Path) -> anyhow::Result<Option<Vec<u8>>> {
  let metadata = fs::metadata(path)?;
  if metadata.len() > MAX_FILE_BYTES {
    return Ok(None);
  }
  Ok(Some(fs::read(path)?))
}

fn scan_file(
  path: &path::Path,
  quotes: &mut Vec<String>,
  seen: &mut collections::HashSet<quote::Fingerprint>,
  candidates_parsed: &mut usize,
) {
  let bytes = match read_capped(path) {
    Ok(Some(bytes)) => bytes,
    Ok(None) => {
      log::warn!("{} exceeds the {MAX_FILE_BYTES}-byte read cap, skipping", path.display());
      return;
    }
    Err(error) => {
      log::warn!("couldn't read {}: {error:#}", path.display());
      return;
    }
  };

  let format = parsers::detect(path, &bytes);
  let candidates = match parsers::parse(format, &bytes) {
    Ok(candidates) => candidates,
    Err(error) => {
      log::warn!("couldn't parse {} as {format:?}: {error:#}", path.display());
      return;
    }
  };

  for candidate in candidates {
    let normalized = quote::normalize(&candidate);
    if normalized.is_empty() {
      continue;
    }
    *candidates_parsed += 1;
    let fingerprint = quote::fingerprint(&normalized);
    if !seen.insert(fingerprint) {
      continue;
    }
    quotes.push(normalized);
  }
}

// Walk `directories` in order, parse every regular file found, deduplicate by content
// fingerprint, and return the resulting snapshot. Never fails.
pub fn build(directories: &[path::PathBuf]) -> Corpus {
  let mut quotes = Vec::new();
  let mut seen = collections::HashSet::new();
  let mut files_scanned = 0;
  let mut candidates_parsed = 0;

  for directory in directories {
    if let Err(error) = fs::read_dir(directory) {
      log::warn!("couldn't open directory {}: {error}", directory.display());
      continue;
    }
    let walker = walkdir::WalkDir::new(directory).sort_by_file_name();
    for entry in walker {
      let entry = match entry {
        Ok(entry) => entry,
        Err(error) => {
          log::warn!("couldn't walk {}: {error}", directory.display());
          continue;
        }
      };
      if !entry.file_type().is_file() {
        continue;
      }
      files_scanned += 1;
      scan_file(entry.path(), &mut quotes, &mut seen, &mut candidates_parsed);
    }
  }

  let unique_quotes = quotes.len();
  if unique_quotes == 0 {
    log::warn!("corpus build yielded no quotes ({files_scanned} file(s) scanned)");
  }
  let metadata = Metadata {
    files_scanned,
    candidates_parsed,
    duplicates_removed: candidates_parsed - unique_quotes,
    unique_quotes,
    built_at: time::SystemTime::now(),
  };
  log::info!(
    "corpus built: {files_scanned} file(s) scanned, {candidates_parsed} candidate(s), \
     {} duplicate(s) removed, {unique_quotes} unique quote(s)",
    metadata.duplicates_removed
  );
  Corpus { quotes, metadata }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use std::io::Write as _;

  fn write(directory: &path::Path, name: &str, content: &str) {
    let mut file = fs::File::create(directory.join(name)).unwrap();
    file.write_all(content.as_bytes()).unwrap();
  }

  #[test]
  fn deduplicates_across_formats() {
    let directory = tempfile::tempdir().unwrap();
    write(directory.path(), "a.json", r#"["Quote A", "Quote B"]"#);
    write(directory.path(), "b.csv", "quote\nQuote B\nQuote C");
    write(directory.path(), "c.txt", "Quote C\nQuote D");

    let corpus = build(&[directory.path().to_path_buf()]);

    assert_eq!(
      vec!["Quote A", "Quote B", "Quote C", "Quote D"],
      (0..corpus.len())
        .map(|index| corpus.get(index).unwrap())
        .collect::<Vec<_>>()
    );
    assert_eq!(3, corpus.metadata().files_scanned);
    assert_eq!(6, corpus.metadata().candidates_parsed);
    assert_eq!(2, corpus.metadata().duplicates_removed);
    assert_eq!(4, corpus.metadata().unique_quotes);
  }

  #[test]
  fn empty_directory_yields_empty_corpus() {
    let directory = tempfile::tempdir().unwrap();
    let corpus = build(&[directory.path().to_path_buf()]);
    assert!(corpus.is_empty());
    assert_eq!(0, corpus.metadata().candidates_parsed);
  }

  #[test]
  fn unreadable_directory_does_not_abort_the_build() {
    let missing = path::PathBuf::from("/nonexistent/does-not-exist");
    let corpus = build(&[missing]);
    assert!(corpus.is_empty());
  }

  #[test]
  fn invariant_candidates_equals_unique_plus_duplicates() {
    let directory = tempfile::tempdir().unwrap();
    write(directory.path(), "a.txt", "one\ntwo\none\n");
    let corpus = build(&[directory.path().to_path_buf()]);
    assert_eq!(
      corpus.metadata().candidates_parsed,
      corpus.metadata().unique_quotes + corpus.metadata().duplicates_removed
    );
  }
}
