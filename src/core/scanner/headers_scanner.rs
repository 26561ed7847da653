// src/core/scanner/headers_scanner.rs

use super::{Probe, ProbeContext};
use crate::core::models::{Finding, VulnerabilityKind};
use crate::errors::Result;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::{debug, info, warn};

/// Headers whose absence is reported, in reporting order.
pub const AUDITED_HEADERS: &[&str] = &[
    "X-Frame-Options",
    "Content-Security-Policy",
    "Strict-Transport-Security",
];

/// Checks for the presence of a specific HTTP header in a `HeaderMap`.
///
/// A header with a non UTF-8 value still counts as present.
fn has_header(headers: &HeaderMap, name: &str) -> bool {
    debug!(header_name = name, "Checking for header.");
    match headers.get(name) {
        Some(value) => {
            if value.to_str().is_err() {
                warn!(header_name = name, "Header found but contained invalid UTF-8.");
            }
            true
        }
        None => {
            debug!(header_name = name, "Header not found.");
            false
        }
    }
}

/// Turns the response headers into one finding per missing audited header.
pub fn analyze_headers(headers: &HeaderMap) -> Vec<Finding> {
    AUDITED_HEADERS
        .iter()
        .filter(|name| !has_header(headers, name))
        .map(|name| {
            Finding::new(
                VulnerabilityKind::MissingSecurityHeader,
                format!("Missing security header: {}", name),
            )
        })
        .collect()
}

/// Single GET to the target, then a presence check for each audited header.
pub struct SecurityHeadersProbe;

#[async_trait]
impl Probe for SecurityHeadersProbe {
    fn name(&self) -> &'static str {
        "security_headers"
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Vec<Finding>> {
        let response = ctx.client.get(ctx.target.url()).await?;
        info!(status = %response.status, "Received HTTP response for headers audit.");

        let findings = analyze_headers(&response.headers);
        info!(findings = findings.len(), "Headers audit finished.");
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn all_headers_present_yields_nothing() {
        let mut headers = HeaderMap::new();
        headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
        headers.insert("content-security-policy", HeaderValue::from_static("default-src 'self'"));
        headers.insert("strict-transport-security", HeaderValue::from_static("max-age=31536000"));
        assert!(analyze_headers(&headers).is_empty());
    }

    #[test]
    fn each_missing_header_is_its_own_finding() {
        let findings = analyze_headers(&HeaderMap::new());
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Missing security header: X-Frame-Options",
                "Missing security header: Content-Security-Policy",
                "Missing security header: Strict-Transport-Security",
            ]
        );
    }

    #[test]
    fn binary_header_value_counts_as_present() {
        let mut headers = HeaderMap::new();
        headers.insert("x-frame-options", HeaderValue::from_bytes(b"\xffDENY").unwrap());
        let findings = analyze_headers(&headers);
        assert_eq!(findings.len(), 2);
    }
}
