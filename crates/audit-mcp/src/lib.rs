//! # audit-mcp
//!
//! Minimal Model Context Protocol (MCP) client used by the tool safety auditor.
//!
//! The crate speaks JSON-RPC 2.0 over the streamable HTTP transport and covers
//! exactly what a read-only inspector needs: the initialize handshake, tool
//! listing and resource listing. The wire types in [`protocol`] are shared
//! with the demo calculator server, which serializes the same structures.
//!
//! ## Example
//!
//! ```rust,ignore
//! use audit_mcp::{HttpTransport, McpClient};
//!
//! let transport = HttpTransport::new("http://localhost:8002/mcp")
//!     .with_timeout_secs(10)
//!     .build()?;
//!
//! let mut client = McpClient::connect(transport).await?;
//! for tool in client.list_tools().await? {
//!     println!("{} - {}", tool.name, tool.description.as_deref().unwrap_or(""));
//! }
//! client.close().await?;
//! ```

pub mod protocol;
pub mod transport;

mod client;

// Re-exports
pub use client::{McpClient, McpClientConfig};
pub use protocol::{
    error::McpError,
    schema::{InputSchema, Properties, PropertySchema},
    types::{
        InitializeResult, McpContent, McpResource, McpTool, McpToolResult, ServerCapabilities,
        ToolAnnotations,
    },
};

#[cfg(feature = "http")]
pub use transport::http::{HttpTransport, HttpTransportBuilder, ProxyPolicy};
