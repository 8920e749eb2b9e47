//! Wire types shared by the auditor client and the demo server

pub mod error;
pub mod messages;
pub mod schema;
pub mod types;

pub use error::McpError;
pub use messages::*;
pub use schema::*;
pub use types::*;
