//! One MCP session over a [`Transport`]
//!
//! The session performs the initialize handshake on connect and then serves
//! strictly sequential requests: the transport lock is held from sending a
//! request until its response has arrived.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, instrument, trace, warn};

use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcMessage, McpError, McpResource, McpTool,
    McpToolResult, PaginatedParams, ReadResourceParams, ReadResourceResult, RequestId,
    ResourcesListResult, ServerMessage, ToolCallParams, ToolsListResult,
};
use crate::transport::Transport;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Stop following `nextCursor` after this many pages
const MAX_PAGES: usize = 64;

#[derive(Debug, Clone)]
pub struct McpClientConfig {
    /// Applies to each request/response pair, not to the whole session
    pub request_timeout: Duration,
    /// Overrides the `clientInfo.name` sent at initialize
    pub client_name: Option<String>,
    pub client_version: Option<String>,
}

impl Default for McpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_TIMEOUT,
            client_name: None,
            client_version: None,
        }
    }
}

/// A page of a cursor-paginated list result
trait Page: DeserializeOwned {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

impl Page for ToolsListResult {
    type Item = McpTool;

    fn into_parts(self) -> (Vec<McpTool>, Option<String>) {
        (self.tools, self.next_cursor)
    }
}

impl Page for ResourcesListResult {
    type Item = McpResource;

    fn into_parts(self) -> (Vec<McpResource>, Option<String>) {
        (self.resources, self.next_cursor)
    }
}

pub struct McpClient {
    transport: Mutex<Box<dyn Transport>>,
    next_id: AtomicI64,
    config: McpClientConfig,
    server_info: Option<InitializeResult>,
    initialized: bool,
}

impl McpClient {
    /// Connect with default settings and perform the handshake
    #[instrument(skip(transport), name = "mcp_connect")]
    pub async fn connect<T: Transport + 'static>(transport: T) -> Result<Self, McpError> {
        Self::connect_with_config(transport, McpClientConfig::default()).await
    }

    /// Connect and perform the handshake
    ///
    /// On a failed handshake the transport is closed before the error is
    /// returned, so no session is left open on the server.
    #[instrument(skip(transport, config), name = "mcp_connect")]
    pub async fn connect_with_config<T: Transport + 'static>(
        transport: T,
        config: McpClientConfig,
    ) -> Result<Self, McpError> {
        let mut client = Self::unconnected(Box::new(transport), config);

        match client.handshake().await {
            Ok(()) => Ok(client),
            Err(err) => {
                if let Err(close_err) = client.close().await {
                    debug!(error = %close_err, "Closing transport after failed handshake");
                }
                Err(err)
            }
        }
    }

    fn unconnected(transport: Box<dyn Transport>, config: McpClientConfig) -> Self {
        Self {
            transport: Mutex::new(transport),
            next_id: AtomicI64::new(1),
            config,
            server_info: None,
            initialized: false,
        }
    }

    async fn handshake(&mut self) -> Result<(), McpError> {
        let mut params = InitializeParams::default();
        if let Some(name) = &self.config.client_name {
            params.client_info.name = name.clone();
        }
        if let Some(version) = &self.config.client_version {
            params.client_info.version = Some(version.clone());
        }

        let result: InitializeResult = self.request("initialize", Some(params)).await?;
        info!(
            server_name = %result.server_info.name,
            server_version = ?result.server_info.version,
            protocol_version = %result.protocol_version,
            "MCP session established"
        );

        self.transport
            .lock()
            .await
            .set_protocol_version(&result.protocol_version);
        self.server_info = Some(result);

        self.notify("notifications/initialized").await?;
        self.initialized = true;
        Ok(())
    }

    /// Every tool the server exposes, in server order
    #[instrument(skip(self), name = "mcp_list_tools")]
    pub async fn list_tools(&self) -> Result<Vec<McpTool>, McpError> {
        self.ensure_initialized()?;
        let tools = self.list_all::<ToolsListResult>("tools/list").await?;
        for tool in &tools {
            trace!(tool_name = %tool.name, "Listed tool");
        }
        info!(tool_count = tools.len(), "Listed MCP tools");
        Ok(tools)
    }

    /// Every resource the server exposes
    ///
    /// Fails with [`McpError::Unsupported`] when the server did not advertise
    /// resources at initialize.
    #[instrument(skip(self), name = "mcp_list_resources")]
    pub async fn list_resources(&self) -> Result<Vec<McpResource>, McpError> {
        self.ensure_initialized()?;
        if !self.supports_resources() {
            return Err(McpError::Unsupported("resources"));
        }
        let resources = self.list_all::<ResourcesListResult>("resources/list").await?;
        info!(resource_count = resources.len(), "Listed MCP resources");
        Ok(resources)
    }

    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        self.ensure_initialized()?;
        let params = ReadResourceParams {
            uri: uri.to_owned(),
        };
        self.request("resources/read", Some(params)).await
    }

    /// Invoke a tool
    ///
    /// A failure inside the tool is `Ok` with `is_error` set.
    #[instrument(skip(self, arguments), fields(tool_name = %name))]
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<McpToolResult, McpError> {
        self.ensure_initialized()?;
        let params = ToolCallParams {
            name: name.to_owned(),
            arguments,
        };

        let result: McpToolResult = self.request("tools/call", Some(params)).await?;
        if result.is_error {
            warn!(error = ?result.first_text(), "Tool reported an error");
        } else {
            debug!(blocks = result.content.len(), "Tool call succeeded");
        }
        Ok(result)
    }

    /// Handshake result, present once connected
    pub fn server_info(&self) -> Option<&InitializeResult> {
        self.server_info.as_ref()
    }

    pub fn supports_resources(&self) -> bool {
        self.server_info
            .as_ref()
            .is_some_and(|info| info.capabilities.resources.is_some())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub async fn is_connected(&self) -> bool {
        self.transport.lock().await.is_connected()
    }

    /// End the session; later requests fail with `NotInitialized`
    pub async fn close(&mut self) -> Result<(), McpError> {
        debug!("Closing MCP session");
        self.initialized = false;
        self.transport.lock().await.close().await
    }

    fn ensure_initialized(&self) -> Result<(), McpError> {
        if self.initialized {
            Ok(())
        } else {
            Err(McpError::NotInitialized)
        }
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn list_all<P: Page>(&self, method: &str) -> Result<Vec<P::Item>, McpError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let params = cursor.clone().map(|cursor| PaginatedParams {
                cursor: Some(cursor),
            });
            let (page, next) = self.request::<_, P>(method, params).await?.into_parts();
            items.extend(page);

            // A repeated cursor would loop forever.
            match next {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => return Ok(items),
            }
        }

        warn!(method, max_pages = MAX_PAGES, "Stopped following list cursor");
        Ok(items)
    }

    async fn request<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<R, McpError> {
        let id = self.next_request_id();
        let mut message = JsonRpcMessage::request(id.clone(), method);
        if let Some(params) = params {
            message = message.with_params(params)?;
        }
        let body = serde_json::to_string(&message)?;
        trace!(method, %id, "Sending request");

        let response = timeout(self.config.request_timeout, async {
            let mut transport = self.transport.lock().await;
            transport.send(&body).await?;

            loop {
                let raw = transport.receive().await?;
                match serde_json::from_str::<ServerMessage>(&raw)? {
                    ServerMessage::Response(response) => return Ok::<_, McpError>(response),
                    ServerMessage::Message(other) => {
                        trace!(method = %other.method, "Skipping server-initiated message");
                    }
                }
            }
        })
        .await
        .map_err(|_| McpError::Timeout(self.config.request_timeout))??;

        if response.id != id {
            return Err(McpError::ResponseIdMismatch {
                expected: id.to_string(),
                actual: response.id.to_string(),
            });
        }

        Ok(serde_json::from_value(response.into_result()?)?)
    }

    async fn notify(&self, method: &str) -> Result<(), McpError> {
        let body = serde_json::to_string(&JsonRpcMessage::notification(method))?;
        trace!(method, "Sending notification");
        self.transport.lock().await.send(&body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex as StdMutex};

    const INIT_RESPONSE: &str = r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2025-03-26","capabilities":{"tools":{},"resources":{}},"serverInfo":{"name":"calc","version":"1.0"}}}"#;

    /// Replies queued up front; sent messages recorded
    #[derive(Clone, Default)]
    struct MockTransport {
        replies: Arc<StdMutex<VecDeque<String>>>,
        sent: Arc<StdMutex<Vec<String>>>,
        closed: Arc<StdMutex<bool>>,
        protocol_version: Arc<StdMutex<Option<String>>>,
    }

    impl MockTransport {
        fn new(replies: &[&str]) -> Self {
            let mock = Self::default();
            mock.replies
                .lock()
                .unwrap()
                .extend(replies.iter().map(|r| r.to_string()));
            mock
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }

        fn was_closed(&self) -> bool {
            *self.closed.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl Transport for MockTransport {
        async fn send(&mut self, message: &str) -> Result<(), McpError> {
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }

        async fn receive(&mut self) -> Result<String, McpError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| McpError::transport("no more scripted replies"))
        }

        async fn close(&mut self) -> Result<(), McpError> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            !*self.closed.lock().unwrap()
        }

        fn set_protocol_version(&mut self, version: &str) {
            *self.protocol_version.lock().unwrap() = Some(version.to_string());
        }
    }

    fn initialized_client(transport: MockTransport) -> McpClient {
        let mut client = McpClient::unconnected(Box::new(transport), McpClientConfig::default());
        client.initialized = true;
        client
    }

    #[test]
    fn test_request_ids_increase() {
        let client = initialized_client(MockTransport::default());
        assert_eq!(client.next_request_id(), RequestId::Number(1));
        assert_eq!(client.next_request_id(), RequestId::Number(2));
    }

    #[tokio::test]
    async fn test_connect_performs_handshake() {
        let transport = MockTransport::new(&[INIT_RESPONSE]);
        let client = McpClient::connect(transport.clone()).await.unwrap();

        assert!(client.is_initialized());
        assert!(client.supports_resources());
        assert_eq!(client.server_info().unwrap().server_info.name, "calc");

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        let init: Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(init["method"], "initialize");
        assert_eq!(init["params"]["clientInfo"]["name"], "tool-auditor");
        assert!(sent[1].contains("notifications/initialized"));
        assert_eq!(
            transport.protocol_version.lock().unwrap().as_deref(),
            Some("2025-03-26")
        );
    }

    #[tokio::test]
    async fn test_configured_client_name_is_sent() {
        let transport = MockTransport::new(&[INIT_RESPONSE]);
        let config = McpClientConfig {
            client_name: Some("custom".into()),
            ..McpClientConfig::default()
        };
        McpClient::connect_with_config(transport.clone(), config)
            .await
            .unwrap();

        let init: Value = serde_json::from_str(&transport.sent()[0]).unwrap();
        assert_eq!(init["params"]["clientInfo"]["name"], "custom");
    }

    #[tokio::test]
    async fn test_failed_handshake_closes_transport() {
        let transport = MockTransport::new(&[
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32603,"message":"boom"}}"#,
        ]);
        let result = McpClient::connect(transport.clone()).await;

        assert!(matches!(result, Err(McpError::ServerError(_))));
        assert!(transport.was_closed());
    }

    #[tokio::test]
    async fn test_list_tools_follows_cursor_and_keeps_order() {
        let transport = MockTransport::new(&[
            r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[{"name":"b","inputSchema":{}}],"nextCursor":"p2"}}"#,
            r#"{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"a","inputSchema":{}}]}}"#,
        ]);
        let client = initialized_client(transport.clone());

        let tools = client.list_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(transport.sent()[1].contains("\"cursor\":\"p2\""));
    }

    #[tokio::test]
    async fn test_repeated_cursor_stops_listing() {
        let transport = MockTransport::new(&[
            r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[{"name":"a"}],"nextCursor":"same"}}"#,
            r#"{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"b"}],"nextCursor":"same"}}"#,
        ]);
        let client = initialized_client(transport.clone());

        let tools = client.list_tools().await.unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_list_resources_requires_capability() {
        let client = initialized_client(MockTransport::default());
        assert!(matches!(
            client.list_resources().await,
            Err(McpError::Unsupported("resources"))
        ));
    }

    #[tokio::test]
    async fn test_requests_before_connect_fail() {
        let client =
            McpClient::unconnected(Box::new(MockTransport::default()), McpClientConfig::default());
        assert!(matches!(
            client.list_tools().await,
            Err(McpError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_server_notifications_are_skipped() {
        let transport = MockTransport::new(&[
            r#"{"jsonrpc":"2.0","method":"notifications/tools/list_changed"}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/resources/list_changed"}"#,
            r#"{"jsonrpc":"2.0","id":1,"result":{"success":true}}"#,
        ]);
        let client = initialized_client(transport);

        let result: Value = client.request("test/method", None::<()>).await.unwrap();
        assert_eq!(result, json!({"success": true}));
    }

    #[tokio::test]
    async fn test_mismatched_id_is_an_error() {
        let transport = MockTransport::new(&[r#"{"jsonrpc":"2.0","id":999,"result":{}}"#]);
        let client = initialized_client(transport);

        let result: Result<Value, _> = client.request("test/method", None::<()>).await;
        assert!(matches!(result, Err(McpError::ResponseIdMismatch { .. })));
    }

    #[tokio::test]
    async fn test_json_rpc_error_becomes_server_error() {
        let transport = MockTransport::new(&[
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32600,"message":"Invalid Request"}}"#,
        ]);
        let client = initialized_client(transport);

        let result: Result<Value, _> = client.request("test/method", None::<()>).await;
        assert!(matches!(result, Err(McpError::ServerError(_))));
    }

    #[tokio::test]
    async fn test_tool_error_is_not_a_request_error() {
        let transport = MockTransport::new(&[
            r#"{"jsonrpc":"2.0","id":1,"result":{"content":[{"type":"text","text":"Division by zero"}],"isError":true}}"#,
        ]);
        let client = initialized_client(transport);

        let result = client
            .call_tool("divide", json!({"a": 10, "b": 0}))
            .await
            .unwrap();
        assert!(result.is_error);
        assert_eq!(result.first_text(), Some("Division by zero"));
    }

    #[tokio::test]
    async fn test_close_ends_the_session() {
        let transport = MockTransport::default();
        let mut client = initialized_client(transport.clone());
        client.close().await.unwrap();

        assert!(!client.is_initialized());
        assert!(transport.was_closed());
        assert!(!client.is_connected().await);
    }
}
