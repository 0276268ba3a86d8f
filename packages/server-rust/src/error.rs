use reqlog_core::RpcStatus;

use crate::formatter::{FormatError, FormatterError};

/// Errors raised by the request logger itself.
///
/// A failed RPC is not one of these: it is logged at `error` level as a
/// normal outcome.
#[derive(Debug, thiserror::Error)]
pub enum RequestLogError {
    #[error(transparent)]
    Formatter(#[from] FormatterError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("failed to read host name: {0}")]
    Hostname(#[source] std::io::Error),
}

/// Error returned by a service wrapped in [`RequestLogLayer`](crate::layer::RequestLogLayer).
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The wrapped handler failed.
    #[error(transparent)]
    Status(#[from] RpcStatus),
    /// The call completed but could not be logged.
    #[error("request logging failed: {0}")]
    Logging(#[from] RequestLogError),
}

impl CallError {
    /// The handler's status, if the handler itself failed.
    #[must_use]
    pub fn status(&self) -> Option<&RpcStatus> {
        match self {
            Self::Status(status) => Some(status),
            Self::Logging(_) => None,
        }
    }
}
