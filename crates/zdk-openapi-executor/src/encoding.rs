//! Bracket-notation encoding for query strings and form bodies.
//!
//! `{a: {b: 1}, c: [1, 2], d: [{e: "x"}]}` becomes
//! `a[b]=1&c[]=1&c[]=2&d[0][e]=x`. Keys keep encounter order, values are
//! percent-encoded one by one, and `null` values are skipped.

use serde_json::Value;

/// Encode key/value entries as `k=v` pairs joined with `&`.
pub fn encode_pairs<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let mut pairs = Vec::new();
    for (key, value) in entries {
        push_pairs(&urlencoding::encode(key), value, &mut pairs);
    }
    pairs.join("&")
}

fn push_pairs(key: &str, value: &Value, pairs: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (sub_key, sub_value) in map {
                let nested = format!("{}[{}]", key, urlencoding::encode(sub_key));
                push_pairs(&nested, sub_value, pairs);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let nested = if item.is_object() || item.is_array() {
                    format!("{}[{}]", key, index)
                } else {
                    format!("{}[]", key)
                };
                push_pairs(&nested, item, pairs);
            }
        }
        Value::String(s) => pairs.push(format!("{}={}", key, urlencoding::encode(s))),
        scalar => pairs.push(format!("{}={}", key, urlencoding::encode(&scalar.to_string()))),
    }
}

/// Render a JSON value the way it appears in a path segment or header.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
