//! Message transports
//!
//! A transport moves serialized JSON-RPC messages and nothing else; request
//! ids, timeouts and the handshake belong to [`McpClient`](crate::McpClient).

#[cfg(feature = "http")]
pub mod http;
pub mod sse;

use async_trait::async_trait;

use crate::protocol::McpError;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&mut self, message: &str) -> Result<(), McpError>;

    /// Next message from the server, in arrival order
    async fn receive(&mut self) -> Result<String, McpError>;

    /// Release the connection; idempotent
    async fn close(&mut self) -> Result<(), McpError>;

    fn is_connected(&self) -> bool;

    /// Called once the handshake has fixed the protocol version
    fn set_protocol_version(&mut self, _version: &str) {}
}
