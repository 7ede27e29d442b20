//! Splits a single LLM completion into named outputs.
//!
//! Tries, in order: a JSON object keyed by output name, a JSON array
//! assigned positionally, line-oriented `key: value` pairs, and finally —
//! for a single expected name — the whole trimmed text. Any name still
//! unassigned after all four passes gets the sentinel error string rather
//! than failing the block outright, so a partially-parseable completion
//! still produces usable output for the names it did cover.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const UNASSIGNED_SENTINEL: &str = "Error: Value not found or parsed.";

static LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*([A-Za-z_][\w ]*?)\s*:\s*(.+?)\s*$").unwrap());

/// Discretize `raw_text` into one string per entry of `output_names`, in
/// the order given. Every name is present in the result, falling back to
/// [`UNASSIGNED_SENTINEL`] when it could not be recovered.
///
/// Each stage only fills in names still unassigned by an earlier stage,
/// rather than committing wholesale on first match — a completion can be
/// a JSON object that covers some names and leave the rest to the
/// line-oriented or singleton fallback.
pub fn discretize_output(raw_text: &str, output_names: &[String]) -> HashMap<String, String> {
    let trimmed = raw_text.trim();
    let mut assigned: HashMap<String, String> = HashMap::new();

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for name in output_names {
            if let Some(value) = map.get(name) {
                assigned.insert(name.clone(), value_to_plain_string(value));
            }
        }
    }

    if assigned.len() < output_names.len() {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
            if items.len() == output_names.len() {
                for (i, name) in output_names.iter().enumerate() {
                    if assigned.contains_key(name) {
                        continue;
                    }
                    if let Some(value) = items.get(i) {
                        assigned.insert(name.clone(), value_to_plain_string(value));
                    }
                }
            }
        }
    }

    if assigned.len() < output_names.len() {
        let mut by_line: HashMap<String, String> = HashMap::new();
        for caps in LINE_RE.captures_iter(trimmed) {
            let key = caps.get(1).unwrap().as_str().trim().to_string();
            let value = caps.get(2).unwrap().as_str().trim().to_string();
            by_line.entry(key).or_insert(value);
        }
        for name in output_names {
            if assigned.contains_key(name) {
                continue;
            }
            if let Some(value) = by_line.get(name) {
                assigned.insert(name.clone(), value.clone());
            }
        }
    }

    if let [only] = output_names {
        if !assigned.contains_key(only) {
            assigned.insert(only.clone(), trimmed.to_string());
        }
    }

    output_names
        .iter()
        .map(|name| {
            let value = assigned.get(name).cloned().unwrap_or_else(|| {
                warn_unassigned(name);
                UNASSIGNED_SENTINEL.to_string()
            });
            (name.clone(), value)
        })
        .collect()
}

fn warn_unassigned(name: &str) {
    tracing::warn!(
        output_name = name,
        "discretizer could not recover a value for output name, using sentinel"
    );
}

fn value_to_plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_json_object() {
        let out = discretize_output(r#"{"a": "1", "b": "2"}"#, &names(&["a", "b"]));
        assert_eq!(out["a"], "1");
        assert_eq!(out["b"], "2");
    }

    #[test]
    fn parses_json_array_positionally() {
        let out = discretize_output(r#"["x", "y"]"#, &names(&["a", "b"]));
        assert_eq!(out["a"], "x");
        assert_eq!(out["b"], "y");
    }

    #[test]
    fn parses_line_oriented_pairs() {
        let out = discretize_output("a: hello\nb: world", &names(&["a", "b"]));
        assert_eq!(out["a"], "hello");
        assert_eq!(out["b"], "world");
    }

    #[test]
    fn singleton_fallback_uses_whole_text() {
        let out = discretize_output("just some prose", &names(&["a"]));
        assert_eq!(out["a"], "just some prose");
    }

    #[test]
    fn unassigned_names_get_sentinel() {
        let out = discretize_output("a: hello", &names(&["a", "b"]));
        assert_eq!(out["a"], "hello");
        assert_eq!(out["b"], UNASSIGNED_SENTINEL);
    }

    #[test]
    fn unparseable_multi_name_text_is_all_sentinel() {
        let out = discretize_output("completely unstructured prose here", &names(&["a", "b"]));
        assert_eq!(out["a"], UNASSIGNED_SENTINEL);
        assert_eq!(out["b"], UNASSIGNED_SENTINEL);
    }
}
