//! Resource listing and server metadata reports

use std::io::{self, Write};

use audit_mcp::{InitializeResult, McpResource};

const UNNAMED: &str = "Unnamed resource";
const NO_DESCRIPTION: &str = "No description available";
const UNKNOWN: &str = "unknown";

fn or_fallback<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
}

/// Write every resource in server order
pub fn write_resources<W: Write>(out: &mut W, resources: &[McpResource]) -> io::Result<()> {
    writeln!(out, "=== Available Resources ({}) ===", resources.len())?;
    writeln!(out)?;

    if resources.is_empty() {
        writeln!(out, "No resources exposed by the server.")?;
        writeln!(out)?;
        return Ok(());
    }

    for (index, resource) in resources.iter().enumerate() {
        writeln!(out, "{}. {}", index + 1, resource.uri)?;
        writeln!(out, "   Name: {}", or_fallback(resource.name.as_deref(), UNNAMED))?;
        writeln!(
            out,
            "   Description: {}",
            or_fallback(resource.description.as_deref(), NO_DESCRIPTION)
        )?;
        writeln!(
            out,
            "   MIME type: {}",
            or_fallback(resource.mime_type.as_deref(), UNKNOWN)
        )?;
        writeln!(out)?;
    }
    Ok(())
}

/// Write the negotiated server metadata
pub fn write_server_info<W: Write>(out: &mut W, info: &InitializeResult) -> io::Result<()> {
    let caps = &info.capabilities;

    writeln!(out, "=== Server Information ===")?;
    writeln!(out, "Name: {}", info.server_info.name)?;
    writeln!(
        out,
        "Version: {}",
        or_fallback(info.server_info.version.as_deref(), UNKNOWN)
    )?;
    writeln!(out, "Protocol version: {}", info.protocol_version)?;
    writeln!(out, "Capabilities:")?;
    match &caps.tools {
        Some(tools) => writeln!(out, "  - tools (listChanged={})", tools.list_changed)?,
        None => writeln!(out, "  - tools: not advertised")?,
    }
    match &caps.resources {
        Some(resources) => writeln!(
            out,
            "  - resources (subscribe={}, listChanged={})",
            resources.subscribe, resources.list_changed
        )?,
        None => writeln!(out, "  - resources: not advertised")?,
    }
    match &caps.prompts {
        Some(prompts) => writeln!(out, "  - prompts (listChanged={})", prompts.list_changed)?,
        None => writeln!(out, "  - prompts: not advertised")?,
    }
    if caps.logging.is_some() {
        writeln!(out, "  - logging")?;
    }
    if caps.experimental.is_some() {
        writeln!(out, "  - experimental")?;
    }
    if let Some(instructions) = info.instructions.as_deref().filter(|i| !i.trim().is_empty()) {
        writeln!(out, "Instructions: {}", instructions.trim())?;
    }
    writeln!(out)
}
