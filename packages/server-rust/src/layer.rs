//! Request logging middleware for RPC calls.
//!
//! Times the wrapped call, builds a [`RequestContext`] from the call and its
//! result, and hands it to the [`RequestLogger`]. The inner result is returned
//! unchanged; a logging failure replaces it with [`CallError::Logging`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use reqlog_core::{round_millis, CallOutcome, RequestContext, RpcCall, RpcReply, RpcStatus};
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::error::CallError;
use crate::hook::RequestLogger;

// ---------------------------------------------------------------------------
// RequestLogLayer
// ---------------------------------------------------------------------------

/// Tower layer that logs every call through a shared [`RequestLogger`].
#[derive(Clone)]
pub struct RequestLogLayer {
    logger: Arc<RequestLogger>,
}

impl RequestLogLayer {
    #[must_use]
    pub fn new(logger: Arc<RequestLogger>) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogService {
            inner,
            logger: Arc::clone(&self.logger),
        }
    }
}

// ---------------------------------------------------------------------------
// RequestLogService
// ---------------------------------------------------------------------------

/// Service wrapper produced by [`RequestLogLayer`].
#[derive(Clone)]
pub struct RequestLogService<S> {
    inner: S,
    logger: Arc<RequestLogger>,
}

impl<S> Service<RpcCall> for RequestLogService<S>
where
    S: Service<RpcCall, Response = RpcReply, Error = RpcStatus> + Send,
    S::Future: Send + 'static,
{
    type Response = RpcReply;
    type Error = CallError;
    type Future = Pin<Box<dyn Future<Output = Result<RpcReply, CallError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(CallError::Status)
    }

    fn call(&mut self, call: RpcCall) -> Self::Future {
        if self.logger.config().ignores(&call.method) {
            let fut = self.inner.call(call);
            return Box::pin(async move { fut.await.map_err(CallError::Status) });
        }

        let logger = Arc::clone(&self.logger);
        let span = info_span!("rpc_call", service = %call.service, method = %call.method);
        let ctx = RequestContext::new(call.service.clone(), call.method.clone())
            .with_request(call.request.clone());

        let start = Instant::now();
        let fut = self.inner.call(call);

        Box::pin(
            async move {
                let result = fut.await;

                let outcome = match &result {
                    Ok(_) => CallOutcome::Success,
                    Err(status) => CallOutcome::from(status),
                };
                let ctx = ctx
                    .with_outcome(outcome)
                    .with_execution_time(round_millis(start.elapsed()));

                logger.call(&ctx)?;
                result.map_err(CallError::Status)
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use reqlog_core::{LogLevel, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::RequestLogConfig;
    use crate::error::RequestLogError;
    use crate::formatter::{FormatterError, FormatterRef};
    use crate::sink::MemorySink;

    /// Echoes the request body, or fails with `NotFound` for `get_missing`.
    struct EchoService;

    impl Service<RpcCall> for EchoService {
        type Response = RpcReply;
        type Error = RpcStatus;
        type Future = Pin<Box<dyn Future<Output = Result<RpcReply, RpcStatus>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, call: RpcCall) -> Self::Future {
            Box::pin(async move {
                if call.method == "get_missing" {
                    Err(RpcStatus::not_found("no such thing"))
                } else {
                    Ok(RpcReply { body: call.request })
                }
            })
        }
    }

    /// Does its work before returning an already-completed future.
    struct BlockingService;

    impl Service<RpcCall> for BlockingService {
        type Response = RpcReply;
        type Error = RpcStatus;
        type Future = std::future::Ready<Result<RpcReply, RpcStatus>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, call: RpcCall) -> Self::Future {
            std::thread::sleep(std::time::Duration::from_millis(20));
            std::future::ready(Ok(RpcReply { body: call.request }))
        }
    }

    fn layered(config: RequestLogConfig) -> (RequestLogService<EchoService>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let logger = Arc::new(RequestLogger::new(config, sink.clone()));
        (RequestLogLayer::new(logger).layer(EchoService), sink)
    }

    fn call(method: &str) -> RpcCall {
        RpcCall::new("rpc.thing_service", method, json!({"id": 9, "token": "abc"}))
    }

    #[tokio::test]
    async fn passes_through_response_and_logs_info() {
        let (svc, sink) = layered(RequestLogConfig::default());
        let reply = svc.oneshot(call("get_thing")).await.unwrap();
        assert_eq!(reply.body, json!({"id": 9, "token": "abc"}));

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, LogLevel::Info);
        assert!(records[0].1.starts_with("message=[Ok] (rpc.thing_service.get_thing)"));
    }

    #[tokio::test]
    async fn failed_call_returns_status_and_logs_error() {
        let (svc, sink) = layered(RequestLogConfig::default());
        let err = svc.oneshot(call("get_missing")).await.unwrap_err();
        assert_eq!(err.status().map(|s| s.code), Some(StatusCode::NotFound));

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, LogLevel::Error);
        assert!(records[0].1.contains("[NotFound] (rpc.thing_service.get_missing) no such thing"));
        assert!(records[0].1.contains(" status=5 "));
    }

    #[tokio::test]
    async fn logs_redacted_params_as_json() {
        let config = RequestLogConfig::default()
            .with_log_parameters(true)
            .with_blacklist(["token"])
            .with_formatter(FormatterRef::named("logstash"));
        let (svc, sink) = layered(config);
        let reply = svc.oneshot(call("get_thing")).await.unwrap();
        // The handler still sees the original request.
        assert_eq!(reply.body["token"], "abc");

        let line = &sink.records()[0].1;
        let parsed: Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed["params"], json!({"id": 9, "token": "REDACTED"}));
        assert!(parsed["duration"].is_number());
    }

    #[tokio::test]
    async fn duration_includes_work_done_in_call() {
        let sink = Arc::new(MemorySink::new());
        let config = RequestLogConfig::default().with_formatter(FormatterRef::named("logstash"));
        let logger = Arc::new(RequestLogger::new(config, sink.clone()));
        let svc = RequestLogLayer::new(logger).layer(BlockingService);
        svc.oneshot(call("get_thing")).await.unwrap();

        let parsed: Value = serde_json::from_str(&sink.records()[0].1).unwrap();
        let duration = parsed["duration"].as_f64().unwrap();
        assert!(duration >= 20.0, "duration {duration} misses synchronous work");
    }

    #[tokio::test]
    async fn ignored_methods_are_not_logged() {
        let config = RequestLogConfig::default().with_ignore_methods(["health_check"]);
        let (svc, sink) = layered(config);
        svc.oneshot(call("health_check")).await.unwrap();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn formatter_error_surfaces_as_logging_error() {
        let config = RequestLogConfig::default().with_formatter(FormatterRef::named("bogus"));
        let (svc, sink) = layered(config);
        let err = svc.oneshot(call("get_thing")).await.unwrap_err();
        assert!(matches!(
            err,
            CallError::Logging(RequestLogError::Formatter(FormatterError::NotFound { .. }))
        ));
        assert!(err.status().is_none());
        assert!(sink.is_empty());
    }
}
