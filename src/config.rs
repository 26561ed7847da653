// src/config.rs

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::time::Duration;

/// Ports that should never answer plain HTTP on a public host.
pub const DEFAULT_SENSITIVE_PORTS: &[u16] = &[21, 22, 23, 3306];

pub const DEFAULT_USER_AGENT: &str = concat!("vulnscan-engine/", env!("CARGO_PKG_VERSION"));

#[derive(Parser, Debug)]
#[command(name = "vulnscan-engine")]
#[command(about = "A web vulnerability scanning engine with an HTTP front door.")]
pub struct CommandLine {
    #[command(flatten)]
    pub scan: ScanArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the scan endpoint over HTTP
    #[command(alias = "s")]
    Serve {
        /// Address the HTTP server binds to
        #[arg(long, env = "VULNSCAN_BIND", default_value = "0.0.0.0:5000")]
        bind: SocketAddr,

        /// Add probe errors to `/scan` responses as a `diagnostics` list
        #[arg(long, env = "VULNSCAN_EXPOSE_DIAGNOSTICS")]
        expose_diagnostics: bool,
    },
    /// Scan a single URL and print the findings
    Scan { url: String },
}

/// Tunables shared by both subcommands.
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Timeout for a single outbound request, in seconds
    #[arg(long, global = true, env = "VULNSCAN_REQUEST_TIMEOUT_SECS", default_value_t = 5)]
    pub request_timeout_secs: u64,

    /// Wall-clock budget for a whole scan, in seconds
    #[arg(long, global = true, env = "VULNSCAN_SCAN_BUDGET_SECS", default_value_t = 30)]
    pub scan_budget_secs: u64,

    /// Timeout for each open-port check, in seconds
    #[arg(long, global = true, env = "VULNSCAN_PORT_TIMEOUT_SECS", default_value_t = 2)]
    pub port_timeout_secs: u64,

    /// Comma-separated ports checked by the open-port probe
    #[arg(
        long,
        global = true,
        env = "VULNSCAN_SENSITIVE_PORTS",
        value_delimiter = ',',
        default_values_t = DEFAULT_SENSITIVE_PORTS.to_vec()
    )]
    pub sensitive_ports: Vec<u16>,

    #[arg(long, global = true, env = "VULNSCAN_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}

impl ScanArgs {
    pub fn to_config(&self) -> ScanConfig {
        ScanConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            scan_budget: Duration::from_secs(self.scan_budget_secs),
            port_timeout: Duration::from_secs(self.port_timeout_secs),
            sensitive_ports: self.sensitive_ports.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Runtime settings for a single scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub request_timeout: Duration,
    pub scan_budget: Duration,
    pub port_timeout: Duration,
    pub sensitive_ports: Vec<u16>,
    pub user_agent: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            scan_budget: Duration::from_secs(30),
            port_timeout: Duration::from_secs(2),
            sensitive_ports: DEFAULT_SENSITIVE_PORTS.to_vec(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Settings for the HTTP boundary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub expose_diagnostics: bool,
    pub scan: ScanConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_limits() {
        let config = ScanConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.scan_budget, Duration::from_secs(30));
        assert_eq!(config.sensitive_ports, vec![21, 22, 23, 3306]);
    }

    #[test]
    fn parses_serve_with_overrides() {
        let cli = CommandLine::try_parse_from([
            "vulnscan-engine",
            "serve",
            "--bind",
            "127.0.0.1:8080",
            "--scan-budget-secs",
            "10",
            "--sensitive-ports",
            "22,8081",
        ])
        .unwrap();

        let config = cli.scan.to_config();
        assert_eq!(config.scan_budget, Duration::from_secs(10));
        assert_eq!(config.sensitive_ports, vec![22, 8081]);
        match cli.command {
            Commands::Serve { bind, expose_diagnostics } => {
                assert_eq!(bind, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
                assert!(!expose_diagnostics);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_one_shot_scan() {
        let cli = CommandLine::try_parse_from(["vulnscan-engine", "scan", "https://example.com"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Scan { ref url } if url == "https://example.com"));
    }
}
