//! Payload formatters and their resolution from configuration.
//!
//! - [`plain`]: space-joined `key=value` pairs
//! - [`logstash`]: one JSON object per call
//! - [`registry`]: name and type lookup with capability validation
//! - [`resolver`]: per-logger memoized resolution of a [`FormatterRef`]

pub mod logstash;
pub mod plain;
pub mod registry;
pub mod resolver;

pub use logstash::Logstash;
pub use plain::Plain;
pub use registry::{FormatterError, FormatterRef, FormatterRegistry, TypeRef};
pub use resolver::FormatterResolver;

use reqlog_core::Payload;

/// Renders a payload into a single log line.
///
/// Implementations are stateless and shared across concurrent calls.
pub trait Formatter: Send + Sync {
    /// Render `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] if the payload cannot be encoded.
    fn format(&self, payload: &Payload) -> Result<String, FormatError>;
}

/// Errors raised while rendering a payload.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}
