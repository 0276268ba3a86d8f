//! Demo server: runs a few calls against a stub service behind the request
//! logging layer and prints the resulting log lines to stderr.

use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use reqlog_core::{RpcCall, RpcReply, RpcStatus};
use reqlog_server::{
    init_logging, LogFormat, RequestLogConfig, RequestLogLayer, RequestLogSettings, RequestLogger,
    TracingSink,
};
use serde_json::json;
use tower::{service_fn, Layer, ServiceExt};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "demo-server", about = "Request logging demo")]
struct Args {
    /// Formatter name (`plain` or `logstash`).
    #[arg(long, env = "REQLOG_FORMATTER", default_value = "plain")]
    formatter: String,

    /// Include redacted request bodies in log lines.
    #[arg(long, env = "REQLOG_LOG_PARAMETERS")]
    log_parameters: bool,

    /// Comma-separated dotted paths to redact.
    #[arg(long, env = "REQLOG_BLACKLIST", value_delimiter = ',')]
    blacklist: Vec<String>,

    /// Replacement for redacted values.
    #[arg(long, env = "REQLOG_REDACTED_STRING", default_value = reqlog_server::DEFAULT_REDACTED_STRING)]
    redacted_string: String,

    /// Comma-separated methods that are never logged.
    #[arg(long, env = "REQLOG_IGNORE_METHODS", value_delimiter = ',')]
    ignore_methods: Vec<String>,

    /// JSON settings file; overrides the flags above.
    #[arg(long, env = "REQLOG_SETTINGS")]
    settings: Option<std::path::PathBuf>,

    /// Emit process logs as JSON.
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> anyhow::Result<RequestLogConfig> {
        if let Some(path) = &self.settings {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            return Ok(RequestLogSettings::from_json_str(&raw)?.into_config());
        }
        Ok(RequestLogSettings {
            log_parameters: self.log_parameters,
            formatter: self.formatter.clone(),
            blacklist: self.blacklist.clone(),
            redacted_string: self.redacted_string.clone(),
            ignore_methods: self.ignore_methods.clone(),
        }
        .into_config())
    }
}

async fn handle(call: RpcCall) -> Result<RpcReply, RpcStatus> {
    match call.method.as_str() {
        "get_thing" => {
            let id = call.request["id"]
                .as_u64()
                .ok_or_else(|| RpcStatus::invalid_argument("id must be a positive integer"))?;
            Ok(RpcReply {
                body: json!({"id": id, "name": "widget"}),
            })
        }
        "delete_thing" => Err(RpcStatus::internal("storage is read-only")),
        "health_check" => Ok(RpcReply { body: json!({"ok": true}) }),
        other => Err(RpcStatus::not_found(format!("unknown method {other}"))),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(
        if args.json { LogFormat::Json } else { LogFormat::Human },
        args.verbose,
    );

    let logger = Arc::new(RequestLogger::new(args.config()?, Arc::new(TracingSink)));
    let layer = RequestLogLayer::new(logger);

    let calls = [
        RpcCall::new(
            "rpc.thing_service",
            "get_thing",
            json!({"id": 1, "auth": {"token": "s3cret"}}),
        ),
        RpcCall::new("rpc.thing_service", "get_thing", json!({"id": "one"})),
        RpcCall::new("rpc.thing_service", "health_check", json!({})),
        RpcCall::new("rpc.thing_service", "delete_thing", json!({"id": 2})),
        RpcCall::new("rpc.thing_service", "rename_thing", json!({"id": 3})),
    ];

    for call in calls {
        let method = call.method.clone();
        match layer.layer(service_fn(handle)).oneshot(call).await {
            Ok(reply) => info!(%method, body = %reply.body, "call succeeded"),
            Err(error) if error.status().is_some() => warn!(%method, %error, "call failed"),
            Err(error) => return Err(error.into()),
        }
    }
    Ok(())
}
