// Two-stage format detection: an explicit, recognized extension always wins; otherwise content
// is sniffed in a strict priority order with `plain` as the universal fallback.

use std::path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
  Json,
  Csv,
  Toml,
  Yaml,
  Plain,
}

fn by_extension(path: &path::Path) -> Option<Format> {
  match path.extension().and_then(|extension| extension.to_str()) {
    Some(extension) if extension.eq_ignore_ascii_case("json") => Some(Format::Json),
    Some(extension) if extension.eq_ignore_ascii_case("csv") => Some(Format::Csv),
    Some(extension) if extension.eq_ignore_ascii_case("toml") => Some(Format::Toml),
    Some(extension)
      if extension.eq_ignore_ascii_case("yaml") || extension.eq_ignore_ascii_case("yml") =>
    {
      Some(Format::Yaml)
    }
    Some(extension) if extension.eq_ignore_ascii_case("txt") => Some(Format::Plain),
    _ => None,
  }
}

fn first_non_empty_line(bytes: &[u8]) -> Option<&[u8]> {
  bytes
    .split(|&byte| byte == b'\n')
    .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
    .find(|line| !line.is_empty())
}

fn looks_like_json(bytes: &[u8]) -> bool {
  bytes
    .iter()
    .find(|byte| !byte.is_ascii_whitespace())
    .is_some_and(|&byte| byte == b'{' || byte == b'[')
}

fn looks_like_csv(bytes: &[u8]) -> bool {
  match first_non_empty_line(bytes) {
    Some(line) => memchr::memchr(b',', line).is_some() || memchr::memchr(b'\t', line).is_some(),
    None => false,
  }
}

fn is_comment(line: &[u8]) -> bool {
  line
    .iter()
    .find(|byte| !byte.is_ascii_whitespace())
    .is_some_and(|&byte| byte == b'#')
}

fn looks_like_toml(bytes: &[u8]) -> bool {
  bytes
    .split(|&byte| byte == b'\n')
    .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
    .filter(|line| !line.is_empty() && !is_comment(line))
    .any(|line| {
      let trimmed = trim_ascii(line);
      (trimmed.first() == Some(&b'[') && trimmed.last() == Some(&b']'))
        || windows_contain(trimmed, b" = ")
    })
}

fn looks_like_yaml(bytes: &[u8]) -> bool {
  if bytes.starts_with(b"---") {
    return true;
  }
  bytes
    .split(|&byte| byte == b'\n')
    .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
    .any(|line| {
      let trimmed = trim_ascii(line);
      trimmed.starts_with(b"- ") || contains_top_level_key(trimmed)
    })
}

fn contains_top_level_key(line: &[u8]) -> bool {
  match memchr::memchr(b':', line) {
    Some(position) => {
      let key = &line[..position];
      !key.is_empty()
        && key
          .iter()
          .all(|&byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-')
    }
    None => false,
  }
}

fn windows_contain(haystack: &[u8], needle: &[u8]) -> bool {
  haystack.windows(needle.len()).any(|window| window == needle)
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
  let start = bytes
    .iter()
    .position(|byte| !byte.is_ascii_whitespace())
    .unwrap_or(bytes.len());
  let end = bytes
    .iter()
    .rposition(|byte| !byte.is_ascii_whitespace())
    .map_or(start, |position| position + 1);
  &bytes[start..end]
}

fn by_content(bytes: &[u8]) -> Format {
  if looks_like_json(bytes) {
    Format::Json
  } else if looks_like_csv(bytes) {
    Format::Csv
  } else if looks_like_toml(bytes) {
    Format::Toml
  } else if looks_like_yaml(bytes) {
    Format::Yaml
  } else {
    Format::Plain
  }
}

// Detect the format of one file. Stable: calling this twice on the same inputs always
// produces the same `Format`.
pub fn detect(path: &path::Path, bytes: &[u8]) -> Format {
  by_extension(path).unwrap_or_else(|| by_content(bytes))
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use std::path::Path;

  #[test]
  fn extension_wins_over_content() {
    // Content looks like CSV but the extension says otherwise.
    assert_eq!(
      Format::Json,
      detect(Path::new("a.json"), b"quote,author\nhi,me\n")
    );
  }

  #[test]
  fn detection_is_stable() {
    let bytes: &[u8] = b"- one\n- two\n";
    let path = Path::new("no-extension");
    assert_eq!(detect(path, bytes), detect(path, bytes));
  }

  #[test]
  fn sniffs_json() {
    assert_eq!(Format::Json, detect(Path::new("x"), b"  [\"a\", \"b\"]"));
    assert_eq!(Format::Json, detect(Path::new("x"), b"{\"quotes\": []}"));
  }

  #[test]
  fn sniffs_csv() {
    assert_eq!(Format::Csv, detect(Path::new("x"), b"quote,author\nhi,me\n"));
    assert_eq!(Format::Csv, detect(Path::new("x"), b"quote\tauthor\nhi\tme\n"));
  }

  #[test]
  fn sniffs_toml() {
    assert_eq!(Format::Toml, detect(Path::new("x"), b"[[quotes]]\nquote = \"hi\"\n"));
    assert_eq!(Format::Toml, detect(Path::new("x"), b"quotes = [\"hi\"]\n"));
  }

  #[test]
  fn sniffs_yaml() {
    assert_eq!(Format::Yaml, detect(Path::new("x"), b"---\n- one\n"));
    assert_eq!(Format::Yaml, detect(Path::new("x"), b"- one\n- two\n"));
    assert_eq!(Format::Yaml, detect(Path::new("x"), b"quotes:\n  - one\n"));
  }

  #[test]
  fn falls_back_to_plain() {
    assert_eq!(Format::Plain, detect(Path::new("x"), b"just a line of text\n"));
  }

  #[test]
  fn unrecognized_extension_falls_back_to_sniffing() {
    assert_eq!(Format::Json, detect(Path::new("a.quotes"), b"[\"hi\"]"));
  }
}
