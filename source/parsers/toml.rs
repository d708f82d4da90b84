// TOML quote files: either a top-level `quotes = [...]` array of strings, or one or more
// `[[quotes]]` array-of-tables entries with a `quote`/`text` string and optional `author`.

use crate::quote;
use anyhow::Context as _;
use toml::Value;

fn candidate_from_table(table: &toml::Table) -> Option<String> {
  let text = table
    .get("quote")
    .or_else(|| table.get("text"))
    .and_then(Value::as_str)?;
  match table.get("author").and_then(Value::as_str) {
    Some(author) => Some(quote::with_author(text, author)),
    None => Some(text.to_owned()),
  }
}

pub fn parse(bytes: &[u8]) -> anyhow::Result<Vec<String>> {
  let text = std::str::from_utf8(bytes).context("TOML file isn't UTF-8")?;
  let document: Value = text.parse().context("invalid TOML")?;
  let Some(quotes) = document.get("quotes") else {
    return Ok(Vec::new());
  };
  let candidates = match quotes {
    Value::Array(array) => array
      .iter()
      .filter_map(|entry| match entry {
        Value::String(text) => Some(text.clone()),
        Value::Table(table) => candidate_from_table(table),
        _ => None,
      })
      .collect(),
    _ => Vec::new(),
  };
  Ok(candidates)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn array_of_strings() {
    assert_eq!(
      vec!["Quote A".to_string(), "Quote B".to_string()],
      parse(b"quotes = [\"Quote A\", \"Quote B\"]\n").unwrap()
    );
  }

  #[test]
  fn array_of_tables_with_author() {
    let input = br#"
[[quotes]]
quote = "Be yourself"
author = "Oscar Wilde"

[[quotes]]
text = "No author here"
"#;
    assert_eq!(
      vec![
        "Be yourself — Oscar Wilde".to_string(),
        "No author here".to_string()
      ],
      parse(input).unwrap()
    );
  }

  #[test]
  fn missing_quotes_key_yields_nothing() {
    assert_eq!(Vec::<String>::new(), parse(b"title = \"not quotes\"\n").unwrap());
  }

  #[test]
  fn syntax_error_is_rejected() {
    assert!(parse(b"quotes = [").is_err());
  }
}
