//! # tool-auditor
//!
//! Connects to an MCP server over streamable HTTP, lists its tools and
//! reports which of them declare a boolean `is_safe` parameter.
//!
//! ```no_run
//! use tool_auditor::{run, AuditorConfig};
//!
//! # async fn example() -> std::io::Result<()> {
//! let config = AuditorConfig::default();
//! let mut stdout = std::io::stdout();
//! run(&config, &mut stdout).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod run;

pub use cli::Cli;
pub use config::{AuditorConfig, ConfigError, Sections};
pub use run::{run, run_with_transport, RunOutcome};
