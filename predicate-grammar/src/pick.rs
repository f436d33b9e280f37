//! Property selection by path, for consumers that render or inspect entities.
//!
//! Paths use dots between segments and accept `[n]` as array index sugar, so
//! `relations[0].targetRef` and `relations.0.targetRef` select the same value.

use serde_json::Value;

use crate::field_path::locate_segments;

/// Selects the value at `path` inside `value`, or `None` when any segment is missing.
pub fn pick<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let segments = split_path(path);
    if segments.is_empty() {
        return None;
    }
    locate_segments(value, segments.iter().map(String::as_str))
}

/// Owned variant of [`pick`].
pub fn pick_owned(value: &Value, path: &str) -> Option<Value> {
    pick(value, path).cloned()
}

fn split_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    for ch in path.chars() {
        match ch {
            '.' | '[' | ']' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}
