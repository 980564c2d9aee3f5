//! Parsing of untrusted mapping text
//!
//! Mapping tables come from a language model or a human editor. The text as a
//! whole must be a JSON object; individual members are tagged rather than
//! rejected, and the rebuilder skips the ones it cannot use.

use crate::error::{Result, TranslateError};
use crate::types::MappingTable;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

// ```json ... ``` wrappers that chat models like to add
static CODE_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n(.*?)\n?\s*```\s*$").unwrap()
});

/// Parse mapping text into a table, keeping members in declaration order
pub fn parse_mapping(text: &str) -> Result<MappingTable> {
    let body = strip_code_fence(text);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| TranslateError::InvalidMapping(format!("not valid JSON: {}", e)))?;
    mapping_from_value(value)
}

/// Convert an already-parsed JSON value into a table
pub fn mapping_from_value(value: Value) -> Result<MappingTable> {
    match value {
        Value::Object(obj) => {
            let table = MappingTable::from_object(obj);
            let invalid = table.invalid_count();
            if invalid > 0 {
                warn!(invalid, total = table.len(), "mapping contains unusable targets");
            }
            Ok(table)
        }
        other => Err(TranslateError::InvalidMapping(format!(
            "expected a JSON object, found {}",
            kind(&other)
        ))),
    }
}

/// Remove a surrounding Markdown code fence, if there is one
pub fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE_REGEX.captures(text).and_then(|c| c.get(1)) {
        Some(body) => body.as_str(),
        None => text.trim(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
