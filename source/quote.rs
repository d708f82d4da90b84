// A single quote's normalization and content fingerprint.

// 32-byte content fingerprint used for deduplication.
pub type Fingerprint = [u8; 32];

// Collapse internal whitespace to single spaces, replace embedded newlines, and trim the
// ends. UTF-8 repair happens before this runs (callers pass already-lossy-decoded text).
//
// Idempotent: normalizing an already-normalized string is a no-op.
pub fn normalize(raw: &str) -> String {
  raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Append an author per the em-dash rule: `"{quote} — {author}"`.
pub fn with_author(quote: &str, author: &str) -> String {
  format!("{quote} — {author}")
}

// Content fingerprint (Blake3) of an already-normalized string.
pub fn fingerprint(content: &str) -> Fingerprint {
  *blake3::hash(content.as_bytes()).as_bytes()
}
