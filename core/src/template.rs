//! Safe interpolation of `{{name}}` templates against a flat variable
//! mapping.
//!
//! Expressions support identifier substitution plus dotted attribute
//! access and bracketed index access (`{{user.name}}`, `{{items[0]}}`).
//! Auto-escaping is off by default — prompts are plain text, not HTML.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{EngineError, Result};

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.\[\]]*)\s*\}\}").unwrap());

/// Render `template` against `context`. Every `{{name...}}` reference must
/// resolve to a value in `context` or this fails with
/// [`EngineError::TemplateUndefined`] — referenced-but-missing names never
/// render as an empty string.
pub fn render(template: &str, context: &HashMap<String, Value>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last_end = 0;

    for caps in TOKEN_RE.captures_iter(template) {
        let m = caps.get(0).unwrap();
        let path = caps.get(1).unwrap().as_str();
        out.push_str(&template[last_end..m.start()]);

        let root = root_name(path);
        let value = context
            .get(root)
            .ok_or_else(|| EngineError::TemplateUndefined {
                name: root.to_string(),
            })?;
        let resolved = resolve_path(value, path)
            .ok_or_else(|| EngineError::TemplateUndefined {
                name: path.to_string(),
            })?;
        out.push_str(&stringify(resolved));

        last_end = m.end();
    }
    out.push_str(&template[last_end..]);
    Ok(out)
}

/// Enumerate every base variable name referenced by `template`. Used by the
/// Preview Engine and the Available-Variable Resolver for static analysis.
pub fn undeclared_names(template: &str) -> HashSet<String> {
    TOKEN_RE
        .captures_iter(template)
        .map(|caps| root_name(caps.get(1).unwrap().as_str()).to_string())
        .collect()
}

fn root_name(path: &str) -> &str {
    let end = path
        .find(['.', '['])
        .unwrap_or(path.len());
    &path[..end]
}

/// Resolve a dotted/bracketed path against a root JSON value, e.g.
/// `user.name` or `items[0]`. Returns `None` if any segment is missing.
fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    let mut rest = &path[root_name(path).len()..];
    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('.') {
            let end = stripped.find(['.', '[']).unwrap_or(stripped.len());
            let field = &stripped[..end];
            current = current.get(field)?;
            rest = &stripped[end..];
        } else if let Some(stripped) = rest.strip_prefix('[') {
            let end = stripped.find(']')?;
            let idx: usize = stripped[..end].parse().ok()?;
            current = current.get(idx)?;
            rest = &stripped[end + 1..];
        } else {
            return None;
        }
    }
    Some(current)
}

/// Canonical string conversion: numbers decimal, booleans lowercase, null
/// as empty, strings passed through unquoted.
fn stringify(value: &Value) -> String {
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
    use serde_json::json;

    fn ctx(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn substitutes_known_variable() {
        let c = ctx(&[("name", json!("World"))]);
        assert_eq!(render("Hello {{name}}", &c).unwrap(), "Hello World");
    }

    #[test]
    fn fails_loudly_on_undefined() {
        let c = ctx(&[]);
        let err = render("Hello {{name}}", &c).unwrap_err();
        assert!(matches!(err, EngineError::TemplateUndefined { name } if name == "name"));
    }

    #[test]
    fn ignores_unreferenced_entries() {
        let c = ctx(&[("name", json!("World")), ("unused", json!("noise"))]);
        assert_eq!(render("Hi {{name}}", &c).unwrap(), "Hi World");
    }

    #[test]
    fn numbers_bools_and_null_use_canonical_form() {
        let c = ctx(&[
            ("n", json!(42)),
            ("b", json!(true)),
            ("z", Value::Null),
        ]);
        assert_eq!(render("{{n}}-{{b}}-[{{z}}]", &c).unwrap(), "42-true-[]");
    }

    #[test]
    fn supports_attribute_and_index_access() {
        let c = ctx(&[
            ("user", json!({"name": "Ada"})),
            ("items", json!(["a", "b"])),
        ]);
        assert_eq!(
            render("{{user.name}} likes {{items[1]}}", &c).unwrap(),
            "Ada likes b"
        );
    }

    #[test]
    fn undeclared_names_collects_base_identifiers() {
        let names = undeclared_names("{{a}} and {{b.c}} and {{d[0]}} and {{a}}");
        let mut v: Vec<_> = names.into_iter().collect();
        v.sort();
        assert_eq!(v, vec!["a", "b", "d"]);
    }
}
