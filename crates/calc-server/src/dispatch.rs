//! JSON-RPC dispatch
//!
//! Maps one incoming MCP message to at most one response. Transport
//! concerns (HTTP status codes, session headers) live in [`crate::http`].

use audit_mcp::protocol::{
    Implementation, InitializeParams, InitializeResult, JsonRpcError, JsonRpcMessage,
    JsonRpcResponse, McpToolResult, PaginatedParams, ReadResourceParams, ReadResourceResult,
    RequestId, ResourcesCapability, ResourcesListResult, ServerCapabilities, ToolCallParams,
    ToolsCapability, ToolsListResult, JSONRPC_VERSION, MCP_PROTOCOL_VERSION,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::operations::OperationTable;
use crate::resources;

pub const SERVER_NAME: &str = "calc-server";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol revisions this server can speak
const SUPPORTED_VERSIONS: &[&str] = &[MCP_PROTOCOL_VERSION, "2024-11-05"];

const INSTRUCTIONS: &str =
    "Arithmetic demo server. Read calc://help for usage; every call is independent.";

/// Stateless MCP request handler over an operation table
#[derive(Debug, Clone, Default)]
pub struct CalcServer {
    operations: OperationTable,
}

impl CalcServer {
    pub fn new(operations: OperationTable) -> Self {
        Self { operations }
    }

    pub fn operations(&self) -> &OperationTable {
        &self.operations
    }

    /// Parse and handle a raw request body
    ///
    /// Unparsable bodies yield a `-32700` response with a null id.
    pub fn handle_raw(&self, body: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcMessage>(body) {
            Ok(message) => self.handle(message),
            Err(err) => {
                debug!(error = %err, "Rejecting unparsable MCP message");
                Some(JsonRpcResponse::failure(
                    RequestId::Null,
                    JsonRpcError::PARSE_ERROR,
                    format!("Parse error: {err}"),
                ))
            }
        }
    }

    /// Handle one message; notifications produce no response
    ///
    /// A request whose `id` is `null` is answered with `-32600` and a null id.
    pub fn handle(&self, message: JsonRpcMessage) -> Option<JsonRpcResponse> {
        if message.is_notification() {
            debug!(method = %message.method, "MCP notification");
            return None;
        }

        let id = message.id.unwrap_or(RequestId::Null);
        if id == RequestId::Null {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::INVALID_REQUEST,
                "Request id must not be null",
            ));
        }

        if message.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::INVALID_REQUEST,
                format!("Unsupported jsonrpc version '{}'", message.jsonrpc),
            ));
        }

        let params = message.params.unwrap_or(Value::Null);
        let outcome = match message.method.as_str() {
            "initialize" => parse_params(params).map(|p| self.initialize(p)).and_then(to_value),
            "ping" => Ok(json!({})),
            "tools/list" => parse_optional::<PaginatedParams>(params)
                .map(|_| self.list_tools())
                .and_then(to_value),
            "tools/call" => parse_params(params)
                .and_then(|p| self.call_tool(p))
                .and_then(to_value),
            "resources/list" => parse_optional::<PaginatedParams>(params)
                .map(|_| self.list_resources())
                .and_then(to_value),
            "resources/read" => parse_params(params)
                .and_then(|p| self.read_resource(p))
                .and_then(to_value),
            other => Err((JsonRpcError::METHOD_NOT_FOUND, format!("Unknown method: {other}"))),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err((code, message)) => JsonRpcResponse::failure(id, code, message),
        })
    }

    fn initialize(&self, params: InitializeParams) -> InitializeResult {
        let protocol_version = if SUPPORTED_VERSIONS.contains(&params.protocol_version.as_str()) {
            params.protocol_version
        } else {
            MCP_PROTOCOL_VERSION.to_string()
        };

        info!(
            client = %params.client_info.name,
            protocol_version = %protocol_version,
            "MCP client initialized"
        );

        InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
                resources: Some(ResourcesCapability::default()),
                ..ServerCapabilities::default()
            },
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: Some(SERVER_VERSION.to_string()),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    fn list_tools(&self) -> ToolsListResult {
        ToolsListResult {
            tools: self.operations.descriptors(),
            next_cursor: None,
        }
    }

    fn call_tool(&self, params: ToolCallParams) -> Result<McpToolResult, RpcFailure> {
        let Some(operation) = self.operations.get(&params.name) else {
            let message = format!("Unknown tool: {}", params.name);
            return Err((JsonRpcError::INVALID_PARAMS, message));
        };

        match operation.invoke(&params.arguments) {
            Ok(value) => {
                info!(tool = operation.name, result = value, "Tool call succeeded");
                let structured = json!({ "result": value });
                let text = structured["result"].to_string();
                Ok(McpToolResult::success(text, Some(structured)))
            }
            Err(err) => {
                warn!(tool = operation.name, error = %err, "Tool call rejected");
                Ok(McpToolResult::error(err.to_string()))
            }
        }
    }

    fn list_resources(&self) -> ResourcesListResult {
        ResourcesListResult {
            resources: resources::RESOURCES.iter().map(|r| r.descriptor()).collect(),
            next_cursor: None,
        }
    }

    fn read_resource(&self, params: ReadResourceParams) -> Result<ReadResourceResult, RpcFailure> {
        match resources::find(&params.uri) {
            Some(resource) => Ok(ReadResourceResult {
                contents: vec![resource.contents()],
            }),
            None => {
                let message = format!("Unknown resource: {}", params.uri);
                Err((JsonRpcError::INVALID_PARAMS, message))
            }
        }
    }
}

type RpcFailure = (i64, String);

fn parse_params<P: DeserializeOwned>(params: Value) -> Result<P, RpcFailure> {
    serde_json::from_value(params)
        .map_err(|e| (JsonRpcError::INVALID_PARAMS, format!("Invalid params: {e}")))
}

fn parse_optional<P: DeserializeOwned + Default>(params: Value) -> Result<P, RpcFailure> {
    if params.is_null() {
        return Ok(P::default());
    }
    parse_params(params)
}

fn to_value<T: Serialize>(result: T) -> Result<Value, RpcFailure> {
    serde_json::to_value(result)
        .map_err(|e| (JsonRpcError::INTERNAL_ERROR, format!("Failed to encode result: {e}")))
}
