//! Call envelope exchanged between the server dispatch path and handlers.

use serde_json::Value;

use crate::context::CallOutcome;
use crate::status::StatusCode;

/// Inbound call: which method of which service, with its decoded body.
#[derive(Debug, Clone)]
pub struct RpcCall {
    pub service: String,
    pub method: String,
    pub request: Value,
}

impl RpcCall {
    pub fn new(service: impl Into<String>, method: impl Into<String>, request: Value) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
            request,
        }
    }
}

/// Successful handler response.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcReply {
    pub body: Value,
}

/// Failure status returned by a handler.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct RpcStatus {
    pub code: StatusCode,
    pub message: String,
}

impl RpcStatus {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Internal, message)
    }
}

impl From<&RpcStatus> for CallOutcome {
    fn from(status: &RpcStatus) -> Self {
        CallOutcome::failure(status.code, status.message.clone())
    }
}
