// A minimal YAML subset: a top-level sequence of scalars or mappings (optionally nested under
// a `quotes:` key). `---` separators, blank lines, and `#` comments are ignored. The grammar
// below only has to cope with the one genuinely fiddly part — a single scalar, quoted or not —
// everything else (grouping lines into sequence entries) is plain line-oriented Rust.

use crate::quote;

peg::parser! {
  grammar scalar() for str {
    rule double_quoted() -> String
      = "\"" chars:double_quoted_char()* "\""
      { chars.into_iter().collect() }
    rule double_quoted_char() -> char
      = "\\\"" { '"' }
      / "\\\\" { '\\' }
      / "\\n" { '\n' }
      / "\\t" { '\t' }
      / !"\"" c:[_] { c }

    rule single_quoted() -> String
      = "'" parts:(single_quoted_run() ** "''") "'"
      { parts.join("'") }
    rule single_quoted_run() -> &'input str
      = $((!"'" [_])*)

    rule bareword() -> String
      = s:$((!"#" [_])*)
      { s.trim_end().to_string() }

    pub rule value() -> String
      = v:double_quoted() { v }
      / v:single_quoted() { v }
      / v:bareword() { v }
  }
}

fn decode_scalar(raw: &str) -> String {
  let trimmed = raw.trim();
  scalar::value(trimmed).unwrap_or_else(|_| trimmed.to_string())
}

fn strip_comment_and_separators(text: &str) -> Vec<(usize, &str)> {
  text
    .lines()
    .map(|line| {
      let indent = line.len() - line.trim_start().len();
      (indent, line.trim_start())
    })
    .filter(|(_, line)| !line.is_empty() && *line != "---")
    .collect()
}

fn key_value(line: &str) -> Option<(&str, &str)> {
  let colon = line.find(':')?;
  let key = line[..colon].trim();
  if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
    return None;
  }
  Some((key, line[colon + 1..].trim()))
}

enum Entry {
  Scalar(String),
  Mapping { quote: Option<String>, author: Option<String> },
}

fn parse_entries(lines: &[(usize, &str)]) -> Vec<Entry> {
  let mut entries = Vec::new();
  let mut index = 0;
  while index < lines.len() {
    let (indent, line) = lines[index];
    let Some(rest) = line.strip_prefix("- ").or_else(|| (line == "-").then_some("")) else {
      index += 1;
      continue;
    };
    index += 1;
    if let Some((key, value)) = key_value(rest) {
      let mut mapping = (None, None);
      apply_key(&mut mapping, key, value);
      while index < lines.len() && lines[index].0 > indent && !lines[index].1.starts_with("- ") {
        if let Some((key, value)) = key_value(lines[index].1) {
          apply_key(&mut mapping, key, value);
        }
        index += 1;
      }
      entries.push(Entry::Mapping {
        quote: mapping.0,
        author: mapping.1,
      });
    } else {
      entries.push(Entry::Scalar(decode_scalar(rest)));
    }
  }
  entries
}

fn apply_key(mapping: &mut (Option<String>, Option<String>), key: &str, value: &str) {
  match key {
    "quote" | "text" if mapping.0.is_none() => mapping.0 = Some(decode_scalar(value)),
    "author" => mapping.1 = Some(decode_scalar(value)),
    _ => (),
  }
}

fn entries_to_candidates(entries: Vec<Entry>) -> Vec<String> {
  entries
    .into_iter()
    .filter_map(|entry| match entry {
      Entry::Scalar(text) => Some(text),
      Entry::Mapping {
        quote: Some(text),
        author: Some(author),
      } => Some(quote::with_author(&text, &author)),
      Entry::Mapping {
        quote: Some(text), ..
      } => Some(text),
      Entry::Mapping { quote: None, .. } => None,
    })
    .collect()
}

pub fn parse(bytes: &[u8]) -> anyhow::Result<Vec<String>> {
  let text = String::from_utf8_lossy(bytes);
  let lines = strip_comment_and_separators(&text);

  // Shape (c): a top-level `quotes:` key whose children are the real sequence.
  let sequence_lines: &[(usize, &str)] = match lines.iter().position(|(indent, line)| {
    *indent == 0 && (*line == "quotes:" || key_value(line).is_some_and(|(key, _)| key == "quotes"))
  }) {
    Some(position) => {
      let base_indent = lines
        .get(position + 1)
        .map(|(indent, _)| *indent)
        .unwrap_or(0);
      let end = lines[position + 1..]
        .iter()
        .position(|(indent, _)| *indent < base_indent)
        .map(|offset| position + 1 + offset)
        .unwrap_or(lines.len());
      &lines[position + 1..end]
    }
    None => &lines,
  };

  Ok(entries_to_candidates(parse_entries(sequence_lines)))
}
