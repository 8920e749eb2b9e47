//! The connect → report → close flow
//!
//! A failure to reach the server, or to complete the handshake, is reported
//! as one line and the flow ends normally. Once connected, each section is
//! best-effort and the session is closed whatever the sections did.

use std::io::{self, Write};

use audit_mcp::transport::Transport;
use audit_mcp::{HttpTransport, McpClient, McpClientConfig};
use audit_report::{print_resources, print_server_info, print_tools, AuditSummary};
use tracing::{debug, info, warn};

use crate::config::AuditorConfig;

const CLIENT_NAME: &str = "tool-auditor";

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The server could not be reached or refused the handshake
    ConnectFailed,
    /// The session was used and closed; `summary` is `None` if the tool
    /// list could not be fetched
    Completed { summary: Option<AuditSummary> },
}

/// Audit the server named by `config`, writing the report to `out`
///
/// Only errors writing to `out` are returned.
pub async fn run<W: Write>(config: &AuditorConfig, out: &mut W) -> io::Result<RunOutcome> {
    let url = config.endpoint_url();
    writeln!(out, "🔌 Connecting to MCP server at {url}")?;
    writeln!(out)?;

    let transport = HttpTransport::new(&url)
        .with_timeout_secs(config.timeout.as_secs())
        .with_proxy_policy(config.proxy)
        .build();

    match transport {
        Ok(transport) => run_with_transport(transport, config, out).await,
        Err(err) => {
            warn!(error = %err, "Failed to build HTTP transport");
            writeln!(out, "❌ Failed to connect to MCP server: {err}")?;
            Ok(RunOutcome::ConnectFailed)
        }
    }
}

/// Same flow as [`run`] over an already-built transport
pub async fn run_with_transport<T, W>(
    transport: T,
    config: &AuditorConfig,
    out: &mut W,
) -> io::Result<RunOutcome>
where
    T: Transport + 'static,
    W: Write,
{
    let client_config = McpClientConfig {
        request_timeout: config.timeout,
        client_name: Some(CLIENT_NAME.to_string()),
        client_version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    let mut client = match McpClient::connect_with_config(transport, client_config).await {
        Ok(client) => client,
        Err(err) => {
            warn!(error = %err, "Connecting to MCP server failed");
            writeln!(out, "❌ Failed to connect to MCP server: {err}")?;
            return Ok(RunOutcome::ConnectFailed);
        }
    };
    info!("Connected to MCP server");

    let written = write_sections(&client, config, out).await;

    if let Err(err) = client.close().await {
        debug!(error = %err, "Closing MCP session failed");
    }

    let summary = written?;
    Ok(RunOutcome::Completed { summary })
}

async fn write_sections<W: Write>(
    client: &McpClient,
    config: &AuditorConfig,
    out: &mut W,
) -> io::Result<Option<AuditSummary>> {
    if config.sections.server_info {
        print_server_info(client, out)?;
    }

    let summary = print_tools(client, out, config.mode).await?;

    if config.sections.resources {
        writeln!(out)?;
        print_resources(client, out).await?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Sections;
    use audit_mcp::McpError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    const INIT: &str = r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2025-03-26","capabilities":{"tools":{}},"serverInfo":{"name":"scripted","version":"1.0"}}}"#;

    const TOOLS: &str = r#"{"jsonrpc":"2.0","id":2,"result":{"tools":[
        {"name":"guarded","inputSchema":{"type":"object","properties":{"is_safe":{"type":"boolean"}}}},
        {"name":"bare","inputSchema":{"type":"object","properties":{"x":{"type":"number"}}}}
    ]}}"#;

    #[derive(Clone, Default)]
    struct Scripted {
        replies: Arc<Mutex<VecDeque<String>>>,
        closed: Arc<Mutex<bool>>,
    }

    impl Scripted {
        fn with(replies: &[&str]) -> Self {
            let scripted = Self::default();
            scripted
                .replies
                .lock()
                .unwrap()
                .extend(replies.iter().map(|r| r.to_string()));
            scripted
        }

        fn was_closed(&self) -> bool {
            *self.closed.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl Transport for Scripted {
        async fn send(&mut self, _message: &str) -> Result<(), McpError> {
            Ok(())
        }

        async fn receive(&mut self) -> Result<String, McpError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| McpError::transport("connection reset"))
        }

        async fn close(&mut self) -> Result<(), McpError> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            !*self.closed.lock().unwrap()
        }
    }

    async fn run_scripted(transport: Scripted, config: &AuditorConfig) -> (RunOutcome, String) {
        let mut out = Vec::new();
        let outcome = run_with_transport(transport, config, &mut out).await.unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_completed_run_reports_and_closes() {
        let transport = Scripted::with(&[INIT, TOOLS]);
        let (outcome, text) = run_scripted(transport.clone(), &AuditorConfig::default()).await;

        assert_eq!(
            outcome,
            RunOutcome::Completed {
                summary: Some(AuditSummary {
                    with_param: 1,
                    without_param: 1
                })
            }
        );
        assert!(text.contains("=== Available Tools (2) ==="));
        assert!(text.contains("Summary: 1 with is_safe / 1 without is_safe"));
        assert!(transport.was_closed());
    }

    #[tokio::test]
    async fn test_failed_handshake_prints_one_line() {
        let transport = Scripted::with(&[]);
        let (outcome, text) = run_scripted(transport.clone(), &AuditorConfig::default()).await;

        assert_eq!(outcome, RunOutcome::ConnectFailed);
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("❌ Failed to connect to MCP server"));
        assert!(transport.was_closed());
    }

    #[tokio::test]
    async fn test_tool_failure_still_closes_and_prints_later_sections() {
        let transport = Scripted::with(&[INIT]);
        let config = AuditorConfig {
            sections: Sections {
                server_info: true,
                resources: true,
            },
            ..AuditorConfig::default()
        };
        let (outcome, text) = run_scripted(transport.clone(), &config).await;

        assert_eq!(outcome, RunOutcome::Completed { summary: None });
        assert!(text.contains("=== Server Information ==="));
        assert!(text.contains("Name: scripted"));
        assert!(text.contains("❌ Failed to list tools"));
        assert!(text.contains("Server does not advertise resources."));
        assert!(transport.was_closed());
    }
}
