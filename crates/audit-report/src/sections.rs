//! Best-effort report sections driven by a live session
//!
//! Each section performs at most one read against the server. A failed read
//! prints a single line and the section returns normally; whatever was
//! already written stays. Only a failure to write the output is an error.

use std::io::{self, Write};

use audit_mcp::McpClient;
use tracing::warn;

use crate::report::{AuditSummary, ReportMode, ToolReport};
use crate::resources::{write_resources, write_server_info};

/// Print the metadata negotiated at connect time
pub fn print_server_info<W: Write>(client: &McpClient, out: &mut W) -> io::Result<()> {
    match client.server_info() {
        Some(info) => write_server_info(out, info),
        None => writeln!(out, "❌ Server information unavailable"),
    }
}

/// Fetch, audit and print the tool list
///
/// Returns the audit summary, or `None` when the list could not be fetched.
pub async fn print_tools<W: Write>(
    client: &McpClient,
    out: &mut W,
    mode: ReportMode,
) -> io::Result<Option<AuditSummary>> {
    let tools = match client.list_tools().await {
        Ok(tools) => tools,
        Err(err) => {
            warn!(error = %err, "Listing tools failed");
            writeln!(out, "❌ Failed to list tools: {err}")?;
            return Ok(None);
        }
    };

    let report = ToolReport::build(&tools);
    report.write_to(out, mode)?;
    Ok(Some(report.summary()))
}

/// Fetch and print the resource list
pub async fn print_resources<W: Write>(client: &McpClient, out: &mut W) -> io::Result<()> {
    if !client.supports_resources() {
        return writeln!(out, "Server does not advertise resources.");
    }

    match client.list_resources().await {
        Ok(resources) => write_resources(out, &resources),
        Err(err) => {
            warn!(error = %err, "Listing resources failed");
            writeln!(out, "❌ Failed to list resources: {err}")
        }
    }
}
