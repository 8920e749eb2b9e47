//! # audit-report
//!
//! Safety-parameter audit over MCP tool schemas and the console report built
//! around it.
//!
//! - [`audit`]: the pure `is_safe` rule
//! - [`report`]: per-tool listing plus with/without summary
//! - [`resources`]: resource listing and server metadata
//! - [`sections`]: best-effort sections that read from a live [`audit_mcp::McpClient`]

pub mod audit;
pub mod report;
pub mod resources;
pub mod sections;

pub use audit::{audit_schema, AuditResult, SAFETY_PARAM};
pub use report::{AuditSummary, ReportMode, ToolReport};
pub use sections::{print_resources, print_server_info, print_tools};
