// src/core/scanner/fingerprint_scanner.rs

use super::{Probe, ProbeContext};
use crate::core::models::{Finding, VulnerabilityKind};
use crate::errors::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// A rule that flags a product in the `Server` header when its version is
/// older than the oldest release still considered supported.
struct OutdatedRule<'a> {
    /// Product token as it appears in the header (e.g., "Apache").
    product: &'a str,
    /// Captures the version in group 1.
    pattern: &'a Lazy<Regex>,
    /// Oldest supported (major, minor).
    minimum: (u32, u32),
}

// Statically compiled regexes. Each one captures the version following a
// product token in a `Server` header.
static RE_APACHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Apache/(\d+(?:\.\d+)*)").unwrap());
static RE_NGINX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)nginx/(\d+(?:\.\d+)*)").unwrap());
static RE_IIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Microsoft-IIS/(\d+(?:\.\d+)*)").unwrap());
static RE_OPENSSL: Lazy<Regex> = Lazy::new(|| Regex::new(r"OpenSSL/(\d+(?:\.\d+)*)").unwrap());
static RE_PHP: Lazy<Regex> = Lazy::new(|| Regex::new(r"PHP/(\d+(?:\.\d+)*)").unwrap());

/// The master list of outdated-version rules.
static RULES: &[OutdatedRule] = &[
    OutdatedRule { product: "Apache", pattern: &RE_APACHE, minimum: (2, 4) },
    OutdatedRule { product: "nginx", pattern: &RE_NGINX, minimum: (1, 20) },
    OutdatedRule { product: "Microsoft-IIS", pattern: &RE_IIS, minimum: (10, 0) },
    OutdatedRule { product: "OpenSSL", pattern: &RE_OPENSSL, minimum: (1, 1) },
    OutdatedRule { product: "PHP", pattern: &RE_PHP, minimum: (8, 0) },
];

/// "2.2.15" -> (2, 2). A missing minor counts as 0.
fn major_minor(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map(|m| m.parse().ok()).unwrap_or(Some(0))?;
    Some((major, minor))
}

/// Applies every rule to a `Server` header value.
pub fn analyze_server_header(server: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    debug!(total_rules = RULES.len(), server, "Applying fingerprint rules.");

    for rule in RULES {
        let Some(version) = rule.pattern.captures(server).and_then(|c| c.get(1)) else {
            continue;
        };
        let version = version.as_str();
        match major_minor(version) {
            Some(found) if found < rule.minimum => {
                debug!(product = rule.product, version, "Rule matched outdated version.");
                findings.push(
                    Finding::new(
                        VulnerabilityKind::OutdatedServer,
                        format!("Outdated server software detected: {}/{}", rule.product, version),
                    )
                    .with_evidence(format!("Server: {}", server)),
                );
            }
            _ => debug!(product = rule.product, version, "Version is supported."),
        }
    }
    findings
}

/// Reads the `Server` header of the target and compares product versions
/// against known minimums.
pub struct ServerFingerprintProbe;

#[async_trait]
impl Probe for ServerFingerprintProbe {
    fn name(&self) -> &'static str {
        "server_fingerprint"
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Vec<Finding>> {
        let response = ctx.client.get(ctx.target.url()).await?;

        let Some(server) = response.header("server") else {
            debug!("No Server header to fingerprint.");
            return Ok(Vec::new());
        };

        let findings = analyze_server_header(server);
        info!(server, findings = findings.len(), "Server fingerprint finished.");
        Ok(findings)
    }
}
