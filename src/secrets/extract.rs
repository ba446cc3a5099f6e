//! Normalization of raw secret payloads into credential values
//!
//! Secrets arrive in several shapes:
//!
//! - plain text, possibly with surrounding whitespace: `"  abc123\n"`
//! - a JSON wrapper around a single value: `{"value": "abc123"}`
//! - one JSON object holding both keys (combined-secret mode):
//!   `{"DD_API_KEY": "...", "DD_APP_KEY": "..."}`
//!
//! Each shape is handled by an ordered list of rules; the first rule that
//! matches and produces a value wins.

use serde_json::{Map, Value};

use crate::errors::{CredentialError, Result};

/// Field names probed, in order, inside a JSON-wrapped single secret
pub const VALUE_FIELDS: [&str; 5] = ["value", "secret", "key", "DD_API_KEY", "DD_APP_KEY"];

/// One step of the value-extraction pipeline
pub struct ExtractionRule {
    pub name: &'static str,
    matches: fn(&str) -> bool,
    /// `None` means the rule declined and the next rule is tried
    extract: fn(&str) -> Option<Result<String>>,
}

impl ExtractionRule {
    /// Run the rule against already-trimmed text
    pub fn apply(&self, trimmed: &str) -> Option<Result<String>> {
        if (self.matches)(trimmed) {
            (self.extract)(trimmed)
        } else {
            None
        }
    }
}

impl std::fmt::Debug for ExtractionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionRule").field("name", &self.name).finish()
    }
}

/// Value-extraction rules in evaluation order
pub const EXTRACTION_RULES: &[ExtractionRule] = &[
    ExtractionRule {
        name: "json-object",
        matches: looks_like_json_object,
        extract: extract_json_value,
    },
    ExtractionRule {
        name: "plain-text",
        matches: always,
        extract: extract_plain_text,
    },
];

fn looks_like_json_object(text: &str) -> bool {
    text.starts_with('{')
}

fn always(_: &str) -> bool {
    true
}

fn extract_plain_text(text: &str) -> Option<Result<String>> {
    Some(Ok(text.to_string()))
}

fn extract_json_value(text: &str) -> Option<Result<String>> {
    let object: Map<String, Value> = serde_json::from_str(text).ok()?;

    if let Some((field, value)) =
        VALUE_FIELDS.iter().find_map(|field| object.get(*field).map(|value| (*field, value)))
    {
        return Some(string_field(field, value));
    }

    // No known field: the first key in document order
    let (field, value) = object.iter().next()?;
    Some(string_field(field, value))
}

fn string_field(field: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(CredentialError::malformed(
            "",
            format!("field '{}' holds a {} instead of a string", field, json_type(other)),
        )),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extract a single credential value from a raw payload.
///
/// Surrounding whitespace is trimmed. Text that starts with `{` and parses as
/// a JSON object yields the first of [`VALUE_FIELDS`] present, or else the
/// value of its first key; anything else is returned as plain text.
pub fn extract_value(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    EXTRACTION_RULES
        .iter()
        .find_map(|rule| rule.apply(trimmed))
        .unwrap_or_else(|| Ok(trimmed.to_string()))
}

/// A credential field of a combined secret and the names it may appear under
#[derive(Debug, Clone, Copy)]
pub struct CombinedField {
    pub label: &'static str,
    pub names: &'static [&'static str],
}

pub const COMBINED_PRIMARY: CombinedField = CombinedField {
    label: "DD_API_KEY/api_key",
    names: &["DD_API_KEY", "api_key"],
};

pub const COMBINED_SECONDARY: CombinedField = CombinedField {
    label: "DD_APP_KEY/app_key",
    names: &["DD_APP_KEY", "app_key"],
};

impl CombinedField {
    /// First non-empty string among the field's names
    fn lookup(&self, object: &Map<String, Value>) -> Option<String> {
        self.names
            .iter()
            .filter_map(|name| object.get(*name).and_then(Value::as_str))
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }
}

/// Split a combined JSON secret into (primary, secondary).
///
/// # Errors
/// [`CredentialError::MalformedSecret`] if the payload is not a JSON object or
/// either field is absent or empty.
pub fn extract_combined(secret_id: &str, raw: &str) -> Result<(String, String)> {
    let object: Map<String, Value> = serde_json::from_str(raw.trim())
        .map_err(|_| CredentialError::malformed(secret_id, "combined secret is not valid JSON"))?;

    let primary = COMBINED_PRIMARY.lookup(&object);
    let secondary = COMBINED_SECONDARY.lookup(&object);

    match (primary, secondary) {
        (Some(primary), Some(secondary)) => Ok((primary, secondary)),
        _ => Err(CredentialError::malformed(
            secret_id,
            format!(
                "combined secret must contain {} and {} fields",
                COMBINED_PRIMARY.label, COMBINED_SECONDARY.label
            ),
        )),
    }
}
