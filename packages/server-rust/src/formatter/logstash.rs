use reqlog_core::Payload;

use super::{FormatError, Formatter};

/// Structured formatter emitting one JSON object per call.
///
/// Keys keep payload order and `params` stays a nested object.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logstash;

impl Formatter for Logstash {
    fn format(&self, payload: &Payload) -> Result<String, FormatError> {
        Ok(serde_json::to_string(payload)?)
    }
}
