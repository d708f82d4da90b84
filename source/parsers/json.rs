// JSON quote files. Three root shapes are accepted: an array of strings, an object with a
// `"quotes"` array, or an array of `{quote|text, author?}` objects. Anything else in an array
// is skipped silently; a syntax error skips the whole file.

use crate::quote;
use anyhow::Context as _;
use serde_json::Value;

fn candidate_from_object(object: &serde_json::Map<String, Value>) -> Option<String> {
  let text = object
    .get("quote")
    .or_else(|| object.get("text"))
    .and_then(Value::as_str)?;
  match object.get("author").and_then(Value::as_str) {
    Some(author) => Some(quote::with_author(text, author)),
    None => Some(text.to_owned()),
  }
}

fn candidates_from_array(array: &[Value]) -> Vec<String> {
  array
    .iter()
    .filter_map(|entry| match entry {
      Value::String(text) => Some(text.clone()),
      Value::Object(object) => candidate_from_object(object),
      _ => None,
    })
    .collect()
}

pub fn parse(bytes: &[u8]) -> anyhow::Result<Vec<String>> {
  let value: Value = serde_json::from_slice(bytes).context("invalid JSON")?;
  Ok(match value {
    Value::Array(array) => candidates_from_array(&array),
    Value::Object(object) => match object.get("quotes") {
      Some(Value::Array(array)) => candidates_from_array(array),
      _ => Vec::new(),
    },
    _ => Vec::new(),
  })
}
