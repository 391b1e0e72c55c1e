//! Prettier-style JSON layout.
//!
//! Objects are always expanded with a 2-space indent. Arrays holding only
//! scalars stay on one line when their inline form is at most
//! `MAX_LINE_LENGTH` characters, wherever they are nested; otherwise every
//! item gets its own line. Key order and non-ASCII text are kept as-is.

use serde_json::Value;
use std::path::Path;

use crate::error::{Error, Result};
use crate::io;

pub const INDENT: usize = 2;
pub const MAX_LINE_LENGTH: usize = 80;

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn scalar(value: &Value) -> String {
    // Scalars always serialize.
    serde_json::to_string(value).unwrap_or_default()
}

/// One-line rendering of an all-scalar array, `["a", 1, null]`.
fn inline_array(items: &[Value]) -> Option<String> {
    if !items.iter().all(is_scalar) {
        return None;
    }
    let body = items.iter().map(scalar).collect::<Vec<_>>().join(", ");
    Some(format!("[{}]", body))
}

fn fits(text: &str) -> bool {
    text.chars().count() <= MAX_LINE_LENGTH
}

fn format_value(value: &Value, indent: usize, out: &mut String) {
    match value {
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            let inner = indent + INDENT;
            out.push_str("{\n");
            for (i, (key, v)) in map.iter().enumerate() {
                out.push_str(&" ".repeat(inner));
                out.push_str(&scalar(&Value::String(key.clone())));
                out.push_str(": ");
                format_value(v, inner, out);
                if i + 1 < map.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&" ".repeat(indent));
            out.push('}');
        }
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            if let Some(line) = inline_array(items).filter(|l| fits(l)) {
                out.push_str(&line);
                return;
            }
            let inner = indent + INDENT;
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                out.push_str(&" ".repeat(inner));
                format_value(item, inner, out);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&" ".repeat(indent));
            out.push(']');
        }
        other => out.push_str(&scalar(other)),
    }
}

/// Render `value` in prettier layout, without a trailing newline.
pub fn format_prettier(value: &Value) -> String {
    let mut out = String::new();
    format_value(value, 0, &mut out);
    out
}

/// Parse and re-render JSON text.
pub fn format_str(content: &str) -> Result<String> {
    let value: Value = serde_json::from_str(content).map_err(|e| {
        Error::validation_invalid_json(
            e,
            Some("parse JSON document".to_string()),
            Some(content.chars().take(200).collect()),
        )
    })?;
    Ok(format_prettier(&value))
}

/// Format a file. With `write`, the file is rewritten in place (trailing
/// newline added) and the return value reports whether its content changed.
pub fn format_file(path: &Path, write: bool) -> Result<(String, bool)> {
    let content = io::read_file(path, "read JSON document")?;
    let formatted = format_str(&content)?;

    if !write {
        return Ok((formatted, false));
    }

    let with_newline = format!("{}\n", formatted);
    let changed = with_newline != content;
    if changed {
        io::write_file_atomic(path, &with_newline, "write JSON document")?;
    }
    Ok((formatted, changed))
}
