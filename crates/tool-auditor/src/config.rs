//! Resolved auditor configuration
//!
//! Built once from the command line (and environment) and passed explicitly
//! to the transport and the report flow.

use std::time::Duration;

use audit_mcp::ProxyPolicy;
use audit_report::ReportMode;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("timeout must be at least one second")]
    ZeroTimeout,
}

/// Which report sections to print
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sections {
    pub server_info: bool,
    pub resources: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditorConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub timeout: Duration,
    pub proxy: ProxyPolicy,
    pub sections: Sections,
    pub mode: ReportMode,
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8002,
            path: "/mcp".to_string(),
            timeout: Duration::from_secs(30),
            proxy: ProxyPolicy::System,
            sections: Sections::default(),
            mode: ReportMode::Full,
        }
    }
}

impl AuditorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// `http://{host}:{port}{path}`, with a leading `/` added to the path if missing
    pub fn endpoint_url(&self) -> String {
        let path = self.path.trim();
        let separator = if path.starts_with('/') { "" } else { "/" };
        format!("http://{}:{}{}{}", self.host.trim(), self.port, separator, path)
    }

    /// Restrict output to the audit section
    pub fn safety_only(mut self) -> Self {
        self.mode = ReportMode::SafetyOnly;
        self.sections = Sections::default();
        self
    }
}
