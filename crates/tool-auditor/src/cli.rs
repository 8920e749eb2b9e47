use std::time::Duration;

use audit_mcp::ProxyPolicy;
use clap::Parser;

use crate::config::{AuditorConfig, ConfigError, Sections};

#[derive(Debug, Parser)]
#[command(name = "tool-auditor")]
#[command(about = "List the tools of an MCP server and check each for a boolean is_safe parameter", version)]
pub struct Cli {
    /// Host of the MCP server
    #[arg(long, env = "MCP_HOST", default_value = "localhost")]
    pub host: String,

    /// Port of the MCP server
    #[arg(short, long, env = "MCP_PORT", default_value = "8002")]
    pub port: u16,

    /// Path of the MCP endpoint
    #[arg(long, env = "MCP_PATH", default_value = "/mcp")]
    pub path: String,

    /// Also list the resources exposed by the server
    #[arg(long)]
    pub show_resources: bool,

    /// Also print the server's name, version and capabilities
    #[arg(long)]
    pub show_server_info: bool,

    /// Print only the safety audit
    #[arg(long)]
    pub safety_check_only: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "MCP_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Ignore HTTP(S)_PROXY and connect directly
    #[arg(long, env = "MCP_NO_PROXY")]
    pub no_proxy: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn into_config(self) -> Result<AuditorConfig, ConfigError> {
        let config = AuditorConfig {
            host: self.host,
            port: self.port,
            path: self.path,
            timeout: Duration::from_secs(self.timeout_secs),
            proxy: if self.no_proxy {
                ProxyPolicy::Direct
            } else {
                ProxyPolicy::System
            },
            sections: Sections {
                server_info: self.show_server_info,
                resources: self.show_resources,
            },
            ..AuditorConfig::default()
        };
        let config = if self.safety_check_only {
            config.safety_only()
        } else {
            config
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_report::ReportMode;

    #[test]
    fn test_flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "tool-auditor",
            "--host",
            "127.0.0.1",
            "-p",
            "9100",
            "--show-resources",
            "--no-proxy",
            "--timeout-secs",
            "5",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();

        assert_eq!(config.endpoint_url(), "http://127.0.0.1:9100/mcp");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.proxy, ProxyPolicy::Direct);
        assert!(config.sections.resources);
        assert!(!config.sections.server_info);
        assert_eq!(config.mode, ReportMode::Full);
    }

    #[test]
    fn test_safety_check_only_wins_over_section_flags() {
        let cli = Cli::try_parse_from([
            "tool-auditor",
            "--show-server-info",
            "--show-resources",
            "--safety-check-only",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();

        assert_eq!(config.mode, ReportMode::SafetyOnly);
        assert!(!config.sections.server_info);
        assert!(!config.sections.resources);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let cli = Cli::try_parse_from(["tool-auditor", "--timeout-secs", "0"]).unwrap();
        assert_eq!(cli.into_config(), Err(ConfigError::ZeroTimeout));
    }
}
