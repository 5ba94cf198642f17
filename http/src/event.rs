//! The invocation event JSON envelope (spec §3), received as the body of
//! a successful `GET /invocation/next` call.
use serde::Deserialize;
use std::collections::HashMap;

fn default_encoding() -> String {
    "base64".to_string()
}

/// One pending invocation, as handed to the dispatcher by the control
/// plane.
#[derive(Debug, Clone, Deserialize)]
pub struct InvocationEvent {
    /// The HTTP method of the original request.
    pub method: String,
    /// The request path, including any query string.
    pub path: String,
    /// The authority (host[:port]) of the original request.
    pub host: String,
    /// Request headers. Must carry `x-forwarded-proto`.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// The request body, encoded per `encoding`. Absent for bodyless
    /// requests such as a plain `GET`.
    #[serde(default)]
    pub body: Option<String>,
    /// The scheme used to encode `body`. Defaults to `base64`.
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Platform bookkeeping: when the control plane dispatched this
    /// invocation. Observability only; not interpreted by the runtime.
    #[serde(default, rename = "invokedAt")]
    pub invoked_at: Option<i64>,
    /// Platform bookkeeping: the invocation's maximum allotted duration,
    /// in milliseconds. Observability only.
    #[serde(default, rename = "maxDuration")]
    pub max_duration: Option<u64>,
    /// Capability flags forwarded to the handler verbatim. The core does
    /// not interpret these.
    #[serde(default)]
    pub features: serde_json::Value,
}
