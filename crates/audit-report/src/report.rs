//! Tool listing report
//!
//! Renders the tools of one server in the order the server returned them,
//! each with its audit outcome and declared parameters, followed by a
//! with/without summary. Every optional field has a literal fallback, so
//! rendering cannot fail on missing metadata.

use std::borrow::Cow;
use std::io::{self, Write};

use audit_mcp::{McpTool, ToolAnnotations};

use crate::audit::{audit_schema, AuditResult, SAFETY_PARAM};

/// Placeholder printed for tools without a description
pub const NO_DESCRIPTION: &str = "No description available";

/// Which parts of the tool report to print
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportMode {
    /// Descriptions, annotations and parameters as well as the audit
    #[default]
    Full,
    /// Tool names, audit lines and the summary only
    SafetyOnly,
}

/// With/without counts over one tool listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub with_param: usize,
    pub without_param: usize,
}

impl AuditSummary {
    pub fn total(&self) -> usize {
        self.with_param + self.without_param
    }
}

/// Audited view of a tool listing
#[derive(Debug)]
pub struct ToolReport<'a> {
    entries: Vec<(&'a McpTool, AuditResult)>,
    summary: AuditSummary,
}

impl<'a> ToolReport<'a> {
    /// Audit every tool once, keeping server order
    pub fn build(tools: &'a [McpTool]) -> Self {
        let mut summary = AuditSummary::default();
        let entries = tools
            .iter()
            .map(|tool| {
                let audit = audit_schema(tool.input_schema.as_ref());
                if audit.has_target_param {
                    summary.with_param += 1;
                } else {
                    summary.without_param += 1;
                }
                (tool, audit)
            })
            .collect();

        Self { entries, summary }
    }

    pub fn summary(&self) -> AuditSummary {
        self.summary
    }

    /// Names of the tools that failed the audit, in server order
    pub fn failing_tools(&self) -> Vec<&'a str> {
        self.entries
            .iter()
            .filter(|(_, audit)| !audit.has_target_param)
            .map(|&(tool, _)| tool.name.as_str())
            .collect()
    }

    /// Write the report
    pub fn write_to<W: Write>(&self, out: &mut W, mode: ReportMode) -> io::Result<()> {
        writeln!(out, "=== Available Tools ({}) ===", self.entries.len())?;
        writeln!(out)?;

        if self.entries.is_empty() {
            writeln!(out, "No tools exposed by the server.")?;
            writeln!(out)?;
        }

        for (index, (tool, audit)) in self.entries.iter().enumerate() {
            writeln!(out, "{}. {}", index + 1, tool.name)?;
            if mode == ReportMode::Full {
                writeln!(out, "   Description: {}", description_or_placeholder(tool))?;
            }
            write_audit(out, tool, audit)?;
            if mode == ReportMode::Full {
                if let Some(annotations) = tool.annotations.as_ref().filter(|a| !a.is_empty()) {
                    writeln!(out, "   Annotations: {}", format_annotations(annotations))?;
                }
                write_parameters(out, tool)?;
            }
            writeln!(out)?;
        }

        self.write_summary(out)
    }

    fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let AuditSummary {
            with_param,
            without_param,
        } = self.summary;

        writeln!(out, "=== Safety Parameter Summary ===")?;
        writeln!(out, "Total tools: {}", self.summary.total())?;
        writeln!(
            out,
            "Summary: {with_param} with {SAFETY_PARAM} / {without_param} without {SAFETY_PARAM}"
        )?;
        if without_param > 0 {
            writeln!(
                out,
                "⚠️  WARNING: {without_param} tool(s) do not declare a boolean '{SAFETY_PARAM}' parameter: {}",
                self.failing_tools().join(", ")
            )?;
        } else {
            writeln!(out, "✅ All tools declare a boolean '{SAFETY_PARAM}' parameter")?;
        }
        Ok(())
    }
}

fn description_or_placeholder(tool: &McpTool) -> &str {
    tool.description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(NO_DESCRIPTION)
}

fn write_audit<W: Write>(out: &mut W, tool: &McpTool, audit: &AuditResult) -> io::Result<()> {
    if audit.has_target_param {
        writeln!(out, "   ✅ Safety check passed: {}", audit.message)
    } else {
        writeln!(out, "   ⚠️  Safety check failed: {}", audit.message)?;
        writeln!(
            out,
            "   ⚠️  WARNING: '{}' cannot be asked to run in safe mode",
            tool.name
        )
    }
}

fn write_parameters<W: Write>(out: &mut W, tool: &McpTool) -> io::Result<()> {
    let Some(schema) = tool.input_schema.as_ref() else {
        return writeln!(out, "   Parameters: none declared");
    };
    let Some(properties) = schema.properties.as_ref().filter(|p| !p.is_empty()) else {
        return writeln!(out, "   Parameters: none declared");
    };

    writeln!(out, "   Parameters:")?;
    for (name, property) in properties.iter() {
        let marker = if schema.is_required(name) {
            "required"
        } else {
            "optional"
        };
        let type_name = property.type_label().unwrap_or(Cow::Borrowed("unknown"));
        let tag = if name == SAFETY_PARAM { " [SAFETY]" } else { "" };

        write!(out, "     - {name} ({type_name}, {marker}){tag}")?;
        match property.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => writeln!(out, ": {description}")?,
            None => writeln!(out)?,
        }
    }
    Ok(())
}

fn format_annotations(annotations: &ToolAnnotations) -> String {
    let mut parts = Vec::new();
    if let Some(title) = &annotations.title {
        parts.push(format!("title=\"{title}\""));
    }
    let hints = [
        ("readOnly", annotations.read_only_hint),
        ("destructive", annotations.destructive_hint),
        ("idempotent", annotations.idempotent_hint),
        ("openWorld", annotations.open_world_hint),
    ];
    for (label, value) in hints {
        if let Some(value) = value {
            parts.push(format!("{label}={value}"));
        }
    }
    parts.join(", ")
}
