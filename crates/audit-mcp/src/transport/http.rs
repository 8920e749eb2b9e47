//! Streamable HTTP Transport for MCP
//!
//! Every JSON-RPC message is POSTed to a single endpoint. The server answers
//! with either a plain `application/json` body or a `text/event-stream` body
//! carrying one or more messages; notifications are acknowledged with
//! `202 Accepted` and no body.
//!
//! ## Example
//!
//! ```rust,ignore
//! use audit_mcp::{HttpTransport, ProxyPolicy};
//!
//! let transport = HttpTransport::new("http://localhost:8002/mcp")
//!     .with_proxy_policy(ProxyPolicy::Direct)
//!     .build()?;
//!
//! let client = McpClient::connect(transport).await?;
//! ```

use super::sse::decode_sse_events;
use crate::protocol::McpError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// Header carrying the server-issued session id
pub const SESSION_ID_HEADER: &str = "Mcp-Session-Id";

/// Header carrying the negotiated protocol version
pub const PROTOCOL_VERSION_HEADER: &str = "MCP-Protocol-Version";

/// How the HTTP client treats proxy settings from the environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProxyPolicy {
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY`
    #[default]
    System,
    /// Connect directly, ignoring any proxy variables
    Direct,
}

/// Client side of one streamable HTTP endpoint
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
    headers: HashMap<String, String>,
    /// Issued by the server in the initialize response
    session_id: Option<String>,
    /// Echoed on every request once the handshake is done
    protocol_version: Option<String>,
    connected: bool,
    /// Messages decoded from response bodies, oldest first
    pending: VecDeque<String>,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> HttpTransportBuilder {
        HttpTransportBuilder::new(url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Session id assigned by the server, once known
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, &self.url);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }
        if let Some(session_id) = &self.session_id {
            request = request.header(SESSION_ID_HEADER, session_id);
        }
        if let Some(version) = &self.protocol_version {
            request = request.header(PROTOCOL_VERSION_HEADER, version);
        }
        request
    }

    fn queue_body(&mut self, body: String, is_event_stream: bool) {
        if is_event_stream {
            self.pending.extend(decode_sse_events(&body));
        } else if !body.trim().is_empty() {
            self.pending.push_back(body);
        }
    }

    fn remember_session(&mut self, headers: &HeaderMap) {
        if let Some(session_id) = headers
            .get(SESSION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            if self.session_id.as_deref() != Some(session_id) {
                tracing::debug!(session_id, "MCP HTTP session established");
                self.session_id = Some(session_id.to_string());
            }
        }
    }
}

pub struct HttpTransportBuilder {
    url: String,
    headers: HashMap<String, String>,
    timeout_secs: u64,
    proxy: ProxyPolicy,
}

impl HttpTransportBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            timeout_secs: 30,
            proxy: ProxyPolicy::default(),
        }
    }

    /// Extra header sent with every request
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Per-request HTTP timeout (default 30s)
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Whether proxy variables from the environment apply (default: they do)
    pub fn with_proxy_policy(mut self, proxy: ProxyPolicy) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn build(self) -> Result<HttpTransport, McpError> {
        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(self.timeout_secs));
        if self.proxy == ProxyPolicy::Direct {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| McpError::transport(format!("cannot create HTTP client: {e}")))?;

        Ok(HttpTransport {
            url: self.url,
            client,
            headers: self.headers,
            session_id: None,
            protocol_version: None,
            connected: true,
            pending: VecDeque::new(),
        })
    }
}

#[async_trait]
impl super::Transport for HttpTransport {
    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        if !self.connected {
            return Err(McpError::transport("transport is closed"));
        }
        tracing::debug!(url = %self.url, body = message, "POST");

        let response = self
            .request(reqwest::Method::POST)
            .header(CONTENT_TYPE, "application/json")
            .header("Accept", "application/json, text/event-stream")
            .body(message.to_string())
            .send()
            .await
            .map_err(|e| McpError::transport(format!("POST {} failed: {e}", self.url)))?;

        self.remember_session(response.headers());

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::transport(format!("HTTP {status}: {}", body.trim())));
        }
        if status == StatusCode::ACCEPTED {
            return Ok(());
        }

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/event-stream"));

        let body = response
            .text()
            .await
            .map_err(|e| McpError::transport(format!("unreadable response body: {e}")))?;
        tracing::debug!(url = %self.url, %status, body = %body, "Response");

        self.queue_body(body, is_event_stream);
        Ok(())
    }

    async fn receive(&mut self) -> Result<String, McpError> {
        // Responses only arrive with a POST; an empty queue means the server
        // answered without a message.
        self.pending
            .pop_front()
            .ok_or_else(|| McpError::transport("no message received from server"))
    }

    async fn close(&mut self) -> Result<(), McpError> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        self.pending.clear();

        if self.session_id.is_none() {
            return Ok(());
        }
        let response = self
            .request(reqwest::Method::DELETE)
            .send()
            .await
            .map_err(|e| McpError::transport(format!("DELETE {} failed: {e}", self.url)))?;

        // Servers may refuse client-initiated termination.
        if response.status() == StatusCode::METHOD_NOT_ALLOWED {
            tracing::debug!(url = %self.url, "Server does not support session termination");
        } else if !response.status().is_success() {
            return Err(McpError::transport(format!(
                "HTTP {} while ending session",
                response.status()
            )));
        }
        self.session_id = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn set_protocol_version(&mut self, version: &str) {
        self.protocol_version = Some(version.to_string());
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("session_id", &self.session_id)
            .field("connected", &self.connected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Transport;

    #[test]
    fn test_builder_defaults() {
        let transport = HttpTransport::new("http://localhost:8002/mcp")
            .build()
            .unwrap();

        assert_eq!(transport.url(), "http://localhost:8002/mcp");
        assert!(transport.is_connected());
        assert!(transport.session_id().is_none());
    }

    #[test]
    fn test_builder_with_headers_and_proxy_policy() {
        let transport = HttpTransport::new("http://localhost:8002/mcp")
            .with_header("Authorization", "Bearer test-token")
            .with_proxy_policy(ProxyPolicy::Direct)
            .with_timeout_secs(5)
            .build()
            .unwrap();

        assert_eq!(
            transport.headers.get("Authorization"),
            Some(&"Bearer test-token".to_string())
        );
    }

    #[test]
    fn test_debug_hides_header_values() {
        let transport = HttpTransport::new("http://localhost:8002/mcp")
            .with_header("Authorization", "secret")
            .build()
            .unwrap();

        let debug_str = format!("{:?}", transport);
        assert!(debug_str.contains("Authorization"));
        assert!(!debug_str.contains("secret"));
    }

    #[tokio::test]
    async fn test_receive_without_send_fails() {
        let mut transport = HttpTransport::new("http://localhost:8002/mcp")
            .build()
            .unwrap();
        assert!(matches!(
            transport.receive().await,
            Err(McpError::Transport(_))
        ));
    }

    #[test]
    fn test_bodies_are_queued_in_order() {
        let mut transport = HttpTransport::new("http://localhost:8002/mcp")
            .build()
            .unwrap();
        transport.queue_body("data: {\"id\":1}\n\ndata: {\"id\":2}\n\n".to_string(), true);
        transport.queue_body("  ".to_string(), false);
        transport.queue_body("{\"id\":3}".to_string(), false);

        let queued: Vec<_> = transport.pending.iter().map(String::as_str).collect();
        assert_eq!(queued, vec!["{\"id\":1}", "{\"id\":2}", "{\"id\":3}"]);
    }

    #[tokio::test]
    async fn test_close_without_session_is_local() {
        let mut transport = HttpTransport::new("http://localhost:1/mcp")
            .build()
            .unwrap();
        transport.close().await.unwrap();
        assert!(!transport.is_connected());
        assert!(transport.send("{}").await.is_err());
    }
}
