use serde_json::Value;

use crate::status::StatusCode;

/// How a single call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// The handler returned a response.
    Success,
    /// The handler failed with a status.
    Failure {
        /// Name of the failure status type, logged as `grpc_status`.
        class_name: String,
        /// Status code reported to the caller.
        code: StatusCode,
        /// Human-readable message from the failed response.
        message: String,
    },
}

impl CallOutcome {
    /// Failure whose class name is derived from the status code.
    pub fn failure(code: StatusCode, message: impl Into<String>) -> Self {
        Self::Failure {
            class_name: code.class_name().to_string(),
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// One completed or failed RPC invocation, as seen by the request logger.
///
/// Built by the server once per call and handed to the logger read-only.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Logical service name, e.g. `"rpc.thing_service"`.
    pub service_key: String,
    /// Method identifier, e.g. `"get_thing"`.
    pub call_signature: String,
    /// Deserialized request body.
    pub request: Value,
    /// Result of the call.
    pub outcome: CallOutcome,
    /// Wall time spent in the handler, in milliseconds rounded to two decimals.
    pub execution_time_rounded: f64,
}

impl RequestContext {
    /// Creates a successful context with an empty request body and zero duration.
    pub fn new(service_key: impl Into<String>, call_signature: impl Into<String>) -> Self {
        Self {
            service_key: service_key.into(),
            call_signature: call_signature.into(),
            request: Value::Null,
            outcome: CallOutcome::Success,
            execution_time_rounded: 0.0,
        }
    }

    #[must_use]
    pub fn with_request(mut self, request: Value) -> Self {
        self.request = request;
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: CallOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    #[must_use]
    pub fn with_execution_time(mut self, millis: f64) -> Self {
        self.execution_time_rounded = millis;
        self
    }
}

/// Rounds a duration to milliseconds with two decimals.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn round_millis(elapsed: std::time::Duration) -> f64 {
    let hundredths = (elapsed.as_micros() + 5) / 10;
    hundredths as f64 / 100.0
}
