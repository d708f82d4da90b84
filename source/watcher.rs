// Poll-based change detection over the configured quote directories. Filesystem event APIs
// (inotify and friends) differ enough across platforms that a plain mtime snapshot, compared
// on a timer, is the simpler and more portable choice here — at the cost of missing changes
// that don't bump an mtime (a file replaced with identical content and timestamp, for
// instance). Good enough for a directory of quote files edited by hand or by a deploy script.

use std::{collections, fs, path, time};

pub struct Watcher {
  directories: Vec<path::PathBuf>,
  snapshot: collections::HashMap<path::PathBuf, time::SystemTime>,
}

fn snapshot(directories: &[path::PathBuf]) -> collections::HashMap<path::PathBuf, time::SystemTime> {
  let mut snapshot = collections::HashMap::new();
  for directory in directories {
    let walker = walkdir::WalkDir::new(directory).sort_by_file_name();
    for entry in walker.into_iter().filter_map(Result::ok) {
      if !entry.file_type().is_file() {
        continue;
      }
      if let Ok(metadata) = fs::metadata(entry.path()) {
        if let Ok(modified) = metadata.modified() {
          snapshot.insert(entry.path().to_path_buf(), modified);
        }
      }
    }
  }
  snapshot
}

impl Watcher {
  pub fn new(directories: Vec<path::PathBuf>) -> Self {
    let snapshot = snapshot(&directories);
    Watcher { directories, snapshot }
  }

  // Returns `true` the first time it observes a difference from the last snapshot: a file's
  // mtime changed, a file appeared, or a file disappeared. Resets the baseline either way.
  pub fn poll(&mut self) -> bool {
    let current = snapshot(&self.directories);
    let changed = current != self.snapshot;
    self.snapshot = current;
    changed
  }
}
