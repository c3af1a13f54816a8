//! Tolerant extraction of JSON objects from free-form model output.
//!
//! Models wrap JSON in prose, Markdown fences or both, and often leave
//! trailing commas behind. Nothing here fails: callers get `None` and fall
//! back to treating the text as prose.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Removes Markdown fence lines (```` ``` ```` and ```` ```json ````) while
/// keeping the fenced content and any surrounding prose.
#[must_use]
pub fn strip_code_fences(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

/// Every balanced top-level `{...}` block in `text`, in order of appearance.
///
/// Braces inside JSON strings (including escaped quotes) do not count.
/// Quotes outside any block are treated as prose.
#[must_use]
pub fn json_object_candidates(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut depth = 0_usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (index, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(index);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(begin) = start.take() {
                        blocks.push(&text[begin..=index]);
                    }
                }
            }
            _ => {}
        }
    }
    blocks
}

/// Drops commas that directly precede a closing `}` or `]`, outside strings.
#[must_use]
pub fn repair_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut repaired = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for (index, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[index + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        repaired.push(c);
    }
    repaired
}

/// Every JSON object in `raw` that parses, as is or with trailing commas
/// repaired, in order of appearance.
#[must_use]
pub fn json_objects(raw: &str) -> Vec<Map<String, Value>> {
    let text = strip_code_fences(raw);
    json_object_candidates(&text)
        .into_iter()
        .filter_map(|candidate| {
            let value = serde_json::from_str::<Value>(candidate)
                .or_else(|_| serde_json::from_str(&repair_trailing_commas(candidate)))
                .ok()?;
            match value {
                Value::Object(map) => Some(map),
                _ => None,
            }
        })
        .collect()
}

/// The first JSON object in `raw` that deserializes into `T`.
#[must_use]
pub fn parse_lenient<T: DeserializeOwned>(raw: &str) -> Option<T> {
    json_objects(raw)
        .into_iter()
        .find_map(|map| serde_json::from_value(Value::Object(map)).ok())
}

/// Truncates to at most `max` characters, appending `...` when anything was
/// cut. Never splits a code point.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}
