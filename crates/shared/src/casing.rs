//! Key-casing transforms for untyped JSON payloads.
//!
//! Typed wire structs declare their field names through serde; these helpers
//! cover the leftovers, such as printing a record in the camelCase form the
//! presentation layer expects. Only object keys are rewritten, values are left
//! untouched, and arrays are walked element by element.

use serde_json::{Map, Value};

/// `poster_url` -> `posterUrl`. Only an underscore followed by a lowercase ASCII
/// letter is folded; anything else is kept as is.
pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' {
            if let Some(next) = chars.peek().copied().filter(char::is_ascii_lowercase) {
                out.push(next.to_ascii_uppercase());
                chars.next();
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// `posterUrl` -> `poster_url`. An underscore is inserted before every uppercase
/// ASCII letter that follows a lowercase letter or digit, then the key is
/// lowercased.
pub fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for c in key.chars() {
        if c.is_ascii_uppercase()
            && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
        {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
        prev = Some(c);
    }
    out
}

pub fn snake_to_camel_keys(value: Value) -> Value {
    rewrite_keys(value, &snake_to_camel)
}

pub fn camel_to_snake_keys(value: Value) -> Value {
    rewrite_keys(value, &camel_to_snake)
}

fn rewrite_keys(value: Value, rename: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(fields) => {
            let mut renamed = Map::with_capacity(fields.len());
            for (key, inner) in fields {
                renamed.insert(rename(&key), rewrite_keys(inner, rename));
            }
            Value::Object(renamed)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rewrite_keys(item, rename))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
#[path = "tests/casing_tests.rs"]
mod tests;
