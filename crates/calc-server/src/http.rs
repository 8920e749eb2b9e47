//! Streamable HTTP endpoint
//!
//! - `POST /mcp`: one JSON-RPC message per request. Requests are answered
//!   with `200 application/json`, notifications with `202 Accepted`.
//! - `DELETE /mcp`: ends the session named by `Mcp-Session-Id`.
//! - `GET /mcp`: server-initiated streams are not offered (`405`).

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use audit_mcp::protocol::JsonRpcMessage;
use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

use crate::dispatch::CalcServer;

/// Path the MCP endpoint is mounted on
pub const MCP_PATH: &str = "/mcp";

const SESSION_ID_HEADER: &str = "mcp-session-id";

#[derive(Clone)]
struct AppState {
    server: Arc<CalcServer>,
    sessions: Arc<RwLock<HashSet<String>>>,
}

/// Build the axum router for `server`
pub fn router(server: CalcServer) -> Router {
    let state = AppState {
        server: Arc::new(server),
        sessions: Arc::new(RwLock::new(HashSet::new())),
    };

    Router::new()
        .route(
            MCP_PATH,
            post(handle_post).get(reject_get).delete(handle_delete),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `server` on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, server: CalcServer, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown)
        .await
}

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
}

async fn handle_post(State(state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    let message = match serde_json::from_str::<JsonRpcMessage>(&body) {
        Ok(message) => message,
        Err(_) => {
            // Let the dispatcher build the -32700 response.
            let response = state.server.handle_raw(&body);
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    let is_initialize = message.method == "initialize";
    if !is_initialize {
        if let Some(session_id) = session_header(&headers) {
            if !state.sessions.read().await.contains(session_id) {
                debug!(session_id, "Rejecting request for unknown session");
                return StatusCode::NOT_FOUND.into_response();
            }
        }
    }

    let Some(response) = state.server.handle(message) else {
        return StatusCode::ACCEPTED.into_response();
    };

    let mut http_response = Json(&response).into_response();
    if is_initialize && !response.is_error() {
        let session_id = Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&session_id) {
            http_response.headers_mut().insert(SESSION_ID_HEADER, value);
            state.sessions.write().await.insert(session_id.clone());
            info!(session_id = %session_id, "MCP session opened");
        }
    }
    http_response
}

async fn handle_delete(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    let Some(session_id) = session_header(&headers) else {
        return StatusCode::BAD_REQUEST;
    };
    if state.sessions.write().await.remove(session_id) {
        info!(session_id, "MCP session closed");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn reject_get() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}
