use serde::Serialize;
use serde_json::Value;

/// The structured record assembled for one call before formatting.
///
/// Field order is fixed and shared by [`Payload::entries`] and the `Serialize`
/// impl. `params` is only present when parameter logging is enabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub message: String,
    pub service: String,
    pub method: String,
    pub action: String,
    pub grpc_status: String,
    pub duration: f64,
    pub status: i32,
    pub thread_id: String,
    pub time: String,
    pub host: String,
}

impl Payload {
    /// Key/value pairs in payload order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, Value)> {
        let mut entries = Vec::with_capacity(11);
        if let Some(params) = &self.params {
            entries.push(("params", params.clone()));
        }
        entries.extend([
            ("message", Value::from(self.message.as_str())),
            ("service", Value::from(self.service.as_str())),
            ("method", Value::from(self.method.as_str())),
            ("action", Value::from(self.action.as_str())),
            ("grpc_status", Value::from(self.grpc_status.as_str())),
            ("duration", Value::from(self.duration)),
            ("status", Value::from(self.status)),
            ("thread_id", Value::from(self.thread_id.as_str())),
            ("time", Value::from(self.time.as_str())),
            ("host", Value::from(self.host.as_str())),
        ]);
        entries
    }
}
