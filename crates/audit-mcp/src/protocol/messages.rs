//! JSON-RPC 2.0 envelopes
//!
//! Requests and notifications share one shape, [`JsonRpcMessage`]: a message
//! without an `id` is a notification. A server answers a request with a
//! [`JsonRpcResponse`] carrying exactly one of `result` or `error`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifier
///
/// MCP forbids `null` ids on requests; `Null` is kept so that such a request
/// can still be told apart from a notification and answered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
    Null,
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_owned())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => n.fmt(f),
            RequestId::String(s) => s.fmt(f),
            RequestId::Null => f.write_str("null"),
        }
    }
}

/// An `id` member that is present, even when it is `null`
fn present_id<'de, D>(deserializer: D) -> Result<Option<RequestId>, D::Error>
where
    D: Deserializer<'de>,
{
    RequestId::deserialize(deserializer).map(Some)
}

/// A request (with `id`) or notification (without)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcMessage {
    pub jsonrpc: String,
    #[serde(
        default,
        deserialize_with = "present_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcMessage {
    pub fn request(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id: Some(id.into()),
            method: method.into(),
            params: None,
        }
    }

    pub fn notification(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id: None,
            method: method.into(),
            params: None,
        }
    }

    pub fn with_params<P: Serialize>(mut self, params: P) -> Result<Self, serde_json::Error> {
        self.params = Some(serde_json::to_value(params)?);
        Ok(self)
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Error object of a failed request
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("[{code}] {message}")]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Either half of a response; serialized as a `result` or `error` member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(JsonRpcError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            outcome: Outcome::Result(result),
        }
    }

    pub fn failure(id: RequestId, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            outcome: Outcome::Error(JsonRpcError::new(code, message)),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }

    pub fn error(&self) -> Option<&JsonRpcError> {
        match &self.outcome {
            Outcome::Error(err) => Some(err),
            Outcome::Result(_) => None,
        }
    }

    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match self.outcome {
            Outcome::Result(value) => Ok(value),
            Outcome::Error(err) => Err(err),
        }
    }
}

/// Anything a server may put on the wire towards the client
///
/// Servers can interleave notifications (and requests of their own) with
/// the response a client is waiting for.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Response(JsonRpcResponse),
    Message(JsonRpcMessage),
}
