//! `reqlog` server: per-call request logging for RPC services.
//!
//! A [`RequestLogger`] turns each completed call into one log line with a
//! redacted copy of the request, rendered by a configurable [`Formatter`].
//! [`RequestLogLayer`] wires the logger into a `tower` service stack.

pub mod config;
pub mod error;
pub mod formatter;
pub mod hook;
pub mod layer;
pub mod logging;
pub mod redact;
pub mod sink;

pub use config::{RequestLogConfig, RequestLogSettings, SettingsError};
pub use error::{CallError, RequestLogError};
pub use formatter::{
    FormatError, Formatter, FormatterError, FormatterRef, FormatterRegistry, FormatterResolver,
    Logstash, Plain, TypeRef,
};
pub use hook::{log_level, RequestLogger};
pub use layer::{RequestLogLayer, RequestLogService};
pub use logging::{init_logging, LogFormat};
pub use redact::{Redactor, DEFAULT_REDACTED_STRING};
pub use sink::{LogSink, MemorySink, TracingSink};
