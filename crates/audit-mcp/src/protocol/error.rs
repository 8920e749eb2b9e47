use std::time::Duration;

use thiserror::Error;

use crate::protocol::messages::JsonRpcError;

/// Failure of one exchange with an MCP server
///
/// A tool that runs and reports `isError` is not an `McpError`; that outcome
/// arrives as a normal [`McpToolResult`](crate::McpToolResult).
#[derive(Debug, Error)]
pub enum McpError {
    /// The server answered with a JSON-RPC error object
    #[error("MCP server error: {0}")]
    ServerError(#[from] JsonRpcError),

    /// Connection refused, non-success HTTP status or unreadable body
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Client not initialized - call connect() first")]
    NotInitialized,

    /// The server did not advertise the capability a request needs
    #[error("Server does not support {0}")]
    Unsupported(&'static str),

    #[error("Response ID mismatch: expected {expected}, got {actual}")]
    ResponseIdMismatch { expected: String, actual: String },
}

impl McpError {
    pub fn transport(msg: impl Into<String>) -> Self {
        McpError::Transport(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_cause() {
        assert_eq!(
            McpError::Unsupported("resources").to_string(),
            "Server does not support resources"
        );
        assert_eq!(
            McpError::transport("connection refused").to_string(),
            "Transport error: connection refused"
        );
        assert_eq!(
            McpError::from(JsonRpcError::new(JsonRpcError::METHOD_NOT_FOUND, "Method not found"))
                .to_string(),
            "MCP server error: [-32601] Method not found"
        );
    }

    #[test]
    fn test_timeout_names_the_limit() {
        assert_eq!(
            McpError::Timeout(Duration::from_secs(5)).to_string(),
            "Request timed out after 5s"
        );
    }
}
