//! `reqlog` core: call context, status codes, and the per-call log payload.

pub mod call;
pub mod context;
pub mod level;
pub mod payload;
pub mod status;

pub use call::{RpcCall, RpcReply, RpcStatus};
pub use context::{round_millis, CallOutcome, RequestContext};
pub use level::LogLevel;
pub use payload::Payload;
pub use status::StatusCode;
