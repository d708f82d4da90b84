// Plain-text quotes: one per line.

// Split on LF, trim ASCII whitespace (including a trailing CR), skip empties.
pub fn parse(bytes: &[u8]) -> Vec<String> {
  String::from_utf8_lossy(bytes)
    .split('\n')
    .map(|line| line.trim_matches(|char: char| char.is_ascii_whitespace()))
    .filter(|line| !line.is_empty())
    .map(str::to_owned)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn splits_and_trims_lines() {
    assert_eq!(
      vec!["Quote C".to_string(), "Quote D".to_string()],
      parse(b"Quote C\nQuote D\n")
    );
  }

  #[test]
  fn skips_empty_lines_and_crlf() {
    assert_eq!(
      vec!["a".to_string(), "b".to_string()],
      parse(b"a\r\n\r\nb\r\n\n")
    );
  }
}
