//! Safety-parameter audit
//!
//! A tool passes when its input schema declares a parameter named `is_safe`
//! whose JSON Schema type is exactly `"boolean"`. The audit is a warning
//! heuristic only; nothing is enforced.

use audit_mcp::InputSchema;

/// Name of the parameter every tool is expected to declare
pub const SAFETY_PARAM: &str = "is_safe";

/// Type the safety parameter must declare
pub const SAFETY_PARAM_TYPE: &str = "boolean";

/// Outcome of auditing one tool schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditResult {
    /// Whether the schema declares a boolean `is_safe` parameter
    pub has_target_param: bool,
    /// Human-readable reason
    pub message: String,
}

impl AuditResult {
    fn pass(message: impl Into<String>) -> Self {
        Self {
            has_target_param: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            has_target_param: false,
            message: message.into(),
        }
    }
}

/// Audit a tool's input schema.
///
/// Checks run in a fixed order and the first failing one decides the
/// message. A property without a `type` is treated as having the empty type
/// and therefore fails. A non-string `type` (a union such as
/// `["boolean", "null"]`) also fails and is quoted as JSON.
pub fn audit_schema(schema: Option<&InputSchema>) -> AuditResult {
    let Some(properties) = schema.and_then(|s| s.properties.as_ref()) else {
        return AuditResult::fail("no input schema properties found");
    };

    let Some(param) = properties.get(SAFETY_PARAM) else {
        return AuditResult::fail(format!("missing parameter '{SAFETY_PARAM}'"));
    };

    if !param.has_type(SAFETY_PARAM_TYPE) {
        let found = param
            .schema_type
            .as_ref()
            .map_or_else(|| "\"\"".to_string(), |declared| declared.to_string());
        return AuditResult::fail(format!(
            "parameter '{SAFETY_PARAM}' has type {found}, expected \"{SAFETY_PARAM_TYPE}\""
        ));
    }

    AuditResult::pass(format!("has {SAFETY_PARAM_TYPE} parameter '{SAFETY_PARAM}'"))
}
