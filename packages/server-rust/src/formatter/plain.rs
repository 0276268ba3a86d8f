use reqlog_core::Payload;
use serde_json::Value;

use super::{FormatError, Formatter};

/// Line-oriented `key=value` formatter.
///
/// Strings are written bare, `null` as an empty value, and everything else
/// (numbers, booleans, nested params) in compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

impl Formatter for Plain {
    fn format(&self, payload: &Payload) -> Result<String, FormatError> {
        let line = payload
            .entries()
            .into_iter()
            .map(|(key, value)| format!("{key}={}", render(&value)))
            .collect::<Vec<_>>()
            .join(" ");
        Ok(line)
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
