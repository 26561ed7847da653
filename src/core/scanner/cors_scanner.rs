// src/core/scanner/cors_scanner.rs

use super::{Probe, ProbeContext};
use crate::core::models::{Finding, VulnerabilityKind};
use crate::errors::Result;
use async_trait::async_trait;
use tracing::{debug, info};

pub const HOSTILE_ORIGIN: &str = "https://evil.example";

/// Classifies an `Access-Control-Allow-Origin` value returned for the
/// hostile origin.
pub fn analyze_allow_origin(allow_origin: &str, allow_credentials: bool) -> Option<Finding> {
    let allow_origin = allow_origin.trim();
    let evidence = format!(
        "Origin: {}\nAccess-Control-Allow-Origin: {}\nAccess-Control-Allow-Credentials: {}",
        HOSTILE_ORIGIN, allow_origin, allow_credentials
    );

    if allow_origin == "*" {
        Some(
            Finding::new(
                VulnerabilityKind::CorsMisconfiguration,
                "CORS misconfiguration: Access-Control-Allow-Origin is *",
            )
            .with_evidence(evidence),
        )
    } else if allow_origin.eq_ignore_ascii_case(HOSTILE_ORIGIN) {
        Some(
            Finding::new(
                VulnerabilityKind::CorsMisconfiguration,
                "CORS misconfiguration: arbitrary origin reflected",
            )
            .with_evidence(evidence),
        )
    } else {
        None
    }
}

pub struct CorsProbe;

#[async_trait]
impl Probe for CorsProbe {
    fn name(&self) -> &'static str {
        "cors"
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Vec<Finding>> {
        let response = ctx
            .client
            .get_with_headers(ctx.target.url(), &[("Origin", HOSTILE_ORIGIN)])
            .await?;

        let Some(allow_origin) = response.header("access-control-allow-origin") else {
            debug!("No Access-Control-Allow-Origin header returned.");
            return Ok(Vec::new());
        };
        let allow_credentials = response
            .header("access-control-allow-credentials")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        debug!(allow_origin, allow_credentials, "CORS headers returned for hostile origin.");
        let findings: Vec<Finding> = analyze_allow_origin(allow_origin, allow_credentials).into_iter().collect();
        info!(findings = findings.len(), "CORS check finished.");
        Ok(findings)
    }
}
