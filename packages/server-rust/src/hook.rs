//! Per-call request logging.
//!
//! [`RequestLogger::call`] turns one [`RequestContext`] into one log line:
//! classify the outcome, assemble the payload (redacting `params` when
//! enabled), render it with the configured formatter, and write it to the
//! sink at `info` for successful calls or `error` for failed ones.

use std::sync::Arc;

use reqlog_core::{CallOutcome, LogLevel, Payload, RequestContext, StatusCode};

use crate::config::RequestLogConfig;
use crate::error::RequestLogError;
use crate::formatter::{Formatter, FormatterError, FormatterRegistry, FormatterResolver};
use crate::redact::Redactor;
use crate::sink::LogSink;

/// Timestamp layout for the `time` field.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Request logging hook, shared by all calls of a server.
pub struct RequestLogger {
    config: RequestLogConfig,
    redactor: Redactor,
    resolver: FormatterResolver,
    sink: Arc<dyn LogSink>,
}

impl RequestLogger {
    /// Creates a logger resolving formatters against the built-in registry.
    #[must_use]
    pub fn new(config: RequestLogConfig, sink: Arc<dyn LogSink>) -> Self {
        Self::with_registry(config, sink, Arc::new(FormatterRegistry::with_builtins()))
    }

    /// Creates a logger resolving formatters against `registry`.
    #[must_use]
    pub fn with_registry(
        config: RequestLogConfig,
        sink: Arc<dyn LogSink>,
        registry: Arc<FormatterRegistry>,
    ) -> Self {
        let redactor = Redactor::new(&config.blacklist, config.redacted_string.clone());
        let resolver = FormatterResolver::new(config.formatter.clone(), registry);
        Self {
            config,
            redactor,
            resolver,
            sink,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RequestLogConfig {
        &self.config
    }

    /// The memoized formatter for this logger.
    ///
    /// # Errors
    ///
    /// Returns the (cached) [`FormatterError`] if the configured formatter
    /// cannot be resolved.
    pub fn formatter(&self) -> Result<Arc<dyn Formatter>, FormatterError> {
        self.resolver.formatter()
    }

    /// Log one completed call and return the rendered line.
    ///
    /// Writes exactly one line to the sink on success. Nothing is written if
    /// the payload cannot be built, the formatter cannot be resolved, or
    /// rendering fails.
    ///
    /// # Errors
    ///
    /// Returns [`RequestLogError`] for hostname lookup, formatter resolution,
    /// or rendering failures.
    pub fn call(&self, ctx: &RequestContext) -> Result<String, RequestLogError> {
        let level = log_level(&ctx.outcome);
        let payload = self.build_payload(ctx)?;
        let formatter = self.formatter()?;
        let line = formatter.format(&payload)?;
        self.sink.log(level, &line);
        Ok(line)
    }

    /// Assemble the payload for one call.
    ///
    /// # Errors
    ///
    /// Returns [`RequestLogError::Hostname`] if the host name cannot be read.
    pub fn build_payload(&self, ctx: &RequestContext) -> Result<Payload, RequestLogError> {
        let route = format!("{}.{}", ctx.service_key, ctx.call_signature);
        let (grpc_status, message, status) = match &ctx.outcome {
            CallOutcome::Success => (
                StatusCode::Ok.class_name().to_string(),
                format!("[{}] ({route})", StatusCode::Ok.class_name()),
                StatusCode::Ok.code(),
            ),
            CallOutcome::Failure {
                class_name,
                code,
                message,
            } => (
                class_name.clone(),
                format!("[{class_name}] ({route}) {message}"),
                code.code(),
            ),
        };

        let params = self
            .config
            .log_parameters
            .then(|| self.redactor.sanitize(&ctx.request));

        Ok(Payload {
            params,
            message,
            service: ctx.service_key.clone(),
            method: ctx.call_signature.clone(),
            action: ctx.call_signature.clone(),
            grpc_status,
            duration: ctx.execution_time_rounded,
            status,
            thread_id: current_thread_id(),
            time: chrono::Local::now().format(TIME_FORMAT).to_string(),
            host: host_name()?,
        })
    }
}

/// `info` for successful calls, `error` for failed ones.
#[must_use]
pub fn log_level(outcome: &CallOutcome) -> LogLevel {
    if outcome.is_success() {
        LogLevel::Info
    } else {
        LogLevel::Error
    }
}

/// Numeric part of the current thread's id.
fn current_thread_id() -> String {
    format!("{:?}", std::thread::current().id())
        .chars()
        .filter(char::is_ascii_digit)
        .collect()
}

fn host_name() -> Result<String, RequestLogError> {
    hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .map_err(RequestLogError::Hostname)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::formatter::{FormatError, FormatterRef, TypeRef};
    use crate::sink::MemorySink;

    fn logger(config: RequestLogConfig) -> (RequestLogger, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (RequestLogger::new(config, sink.clone()), sink)
    }

    fn success_ctx() -> RequestContext {
        RequestContext::new("rpc.thing_service", "get_thing")
            .with_request(json!({"id": 1, "password": "hunter2"}))
            .with_execution_time(3.25)
    }

    fn failure_ctx() -> RequestContext {
        success_ctx().with_outcome(CallOutcome::failure(StatusCode::NotFound, "thing 1 missing"))
    }

    #[test]
    fn success_logs_info_once() {
        let (logger, sink) = logger(RequestLogConfig::default());
        let line = logger.call(&success_ctx()).unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, LogLevel::Info);
        assert_eq!(records[0].1, line);
        assert!(line.starts_with("message=[Ok] (rpc.thing_service.get_thing) "));
        assert!(line.contains(" grpc_status=Ok "));
        assert!(line.contains(" status=0 "));
        assert!(line.contains(" duration=3.25 "));
    }

    #[test]
    fn failure_logs_error_once() {
        let (logger, sink) = logger(RequestLogConfig::default());
        let line = logger.call(&failure_ctx()).unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, LogLevel::Error);
        assert!(line
            .starts_with("message=[NotFound] (rpc.thing_service.get_thing) thing 1 missing "));
        assert!(line.contains(" grpc_status=NotFound "));
        assert!(line.contains(" status=5 "));
    }

    #[test]
    fn payload_fields_on_success() {
        let (logger, _) = logger(RequestLogConfig::default());
        let payload = logger.build_payload(&success_ctx()).unwrap();
        assert!(payload.params.is_none());
        assert_eq!(payload.message, "[Ok] (rpc.thing_service.get_thing)");
        assert_eq!(payload.service, "rpc.thing_service");
        assert_eq!(payload.method, "get_thing");
        assert_eq!(payload.action, "get_thing");
        assert_eq!(payload.grpc_status, "Ok");
        assert_eq!(payload.status, 0);
        assert!(!payload.thread_id.is_empty());
        assert!(payload.thread_id.chars().all(|c| c.is_ascii_digit()));
        assert!(!payload.time.is_empty());
    }

    #[test]
    fn failure_keeps_custom_class_name() {
        let (logger, _) = logger(RequestLogConfig::default());
        let ctx = success_ctx().with_outcome(CallOutcome::Failure {
            class_name: "QuotaExceeded".to_string(),
            code: StatusCode::ResourceExhausted,
            message: "slow down".to_string(),
        });
        let payload = logger.build_payload(&ctx).unwrap();
        assert_eq!(payload.grpc_status, "QuotaExceeded");
        assert_eq!(payload.status, 8);
        assert_eq!(
            payload.message,
            "[QuotaExceeded] (rpc.thing_service.get_thing) slow down"
        );
    }

    #[test]
    fn params_absent_by_default_even_with_blacklist() {
        let (logger, _) = logger(RequestLogConfig::default().with_blacklist(["password"]));
        let payload = logger.build_payload(&success_ctx()).unwrap();
        assert!(payload.params.is_none());
    }

    #[test]
    fn params_are_redacted_when_enabled() {
        let config = RequestLogConfig::default()
            .with_log_parameters(true)
            .with_blacklist(["password"]);
        let (logger, _) = logger(config);
        let ctx = success_ctx();
        let payload = logger.build_payload(&ctx).unwrap();
        assert_eq!(payload.params, Some(json!({"id": 1, "password": "REDACTED"})));
        assert_eq!(ctx.request["password"], "hunter2");
    }

    #[test]
    fn custom_redacted_string_reaches_params() {
        let config = RequestLogConfig::default()
            .with_log_parameters(true)
            .with_blacklist(["password"])
            .with_redacted_string("[hidden]");
        let (logger, _) = logger(config);
        let payload = logger.build_payload(&success_ctx()).unwrap();
        assert_eq!(payload.params, Some(json!({"id": 1, "password": "[hidden]"})));
    }

    #[test]
    fn payload_carries_host_name() {
        let (logger, _) = logger(RequestLogConfig::default());
        let payload = logger.build_payload(&success_ctx()).unwrap();
        assert!(!payload.host.is_empty());
    }

    #[test]
    fn formatter_accessor_returns_memoized_instance() {
        let (logger, _) = logger(RequestLogConfig::default());
        let first = logger.formatter().unwrap();
        let second = logger.formatter().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn logstash_formatter_embeds_params() {
        let config = RequestLogConfig::default()
            .with_log_parameters(true)
            .with_blacklist(["password"])
            .with_formatter(FormatterRef::named("logstash"));
        let (logger, sink) = logger(config);
        let line = logger.call(&success_ctx()).unwrap();

        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["params"], json!({"id": 1, "password": "REDACTED"}));
        assert_eq!(parsed["grpc_status"], "Ok");
        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn unknown_formatter_fails_without_logging() {
        let config = RequestLogConfig::default().with_formatter(FormatterRef::named("nope"));
        let (logger, sink) = logger(config);

        let err = logger.call(&success_ctx()).unwrap_err();
        assert!(matches!(
            err,
            RequestLogError::Formatter(FormatterError::NotFound { .. })
        ));
        assert!(sink.is_empty());

        // Failure is cached: the next call fails the same way.
        assert!(logger.call(&failure_ctx()).is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn invalid_formatter_type_fails() {
        #[derive(Default)]
        struct NotAFormatter;

        let config = RequestLogConfig::default()
            .with_formatter(FormatterRef::Type(TypeRef::of::<NotAFormatter>()));
        let (logger, sink) = logger(config);
        let err = logger.call(&success_ctx()).unwrap_err();
        assert!(matches!(
            err,
            RequestLogError::Formatter(FormatterError::Invalid { .. })
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn custom_formatter_instance_is_used() {
        struct MethodOnly;

        impl Formatter for MethodOnly {
            fn format(&self, payload: &Payload) -> Result<String, FormatError> {
                Ok(format!("{} {}", payload.grpc_status, payload.method))
            }
        }

        let config = RequestLogConfig::default()
            .with_formatter(FormatterRef::from_formatter(Arc::new(MethodOnly)));
        let (logger, sink) = logger(config);
        assert_eq!(logger.call(&success_ctx()).unwrap(), "Ok get_thing");
        assert_eq!(logger.call(&failure_ctx()).unwrap(), "NotFound get_thing");
        assert_eq!(sink.records().len(), 2);
    }

    #[test]
    fn log_level_classification() {
        assert_eq!(log_level(&CallOutcome::Success), LogLevel::Info);
        assert_eq!(
            log_level(&CallOutcome::failure(StatusCode::Internal, "x")),
            LogLevel::Error
        );
    }
}
