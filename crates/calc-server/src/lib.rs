//! Arithmetic MCP server used to exercise the tool auditor.
//!
//! Exposes six calculator tools over streamable HTTP. `add`, `subtract` and
//! `multiply` declare a boolean `is_safe` parameter; `divide`, `power` and
//! `square_root` do not, so an audit of this server reports a mix.

pub mod dispatch;
pub mod error;
pub mod http;
pub mod operations;
pub mod resources;

pub use dispatch::{CalcServer, SERVER_NAME, SERVER_VERSION};
pub use error::CalcError;
pub use http::{router, serve, MCP_PATH};
pub use operations::{OperationSpec, OperationTable};
