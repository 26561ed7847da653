// src/core/scanner/method_scanner.rs

use super::{Probe, ProbeContext};
use crate::core::models::{Finding, VulnerabilityKind};
use crate::errors::Result;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tracing::{debug, info};

/// A 200 to TRACE means the server echoes requests, cookies included,
/// which enables cross-site tracing.
pub struct TraceMethodProbe;

#[async_trait]
impl Probe for TraceMethodProbe {
    fn name(&self) -> &'static str {
        "http_methods"
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Vec<Finding>> {
        let url = ctx.target.url();
        let response = ctx.client.request(Method::TRACE, url, None, &[], None).await?;

        if response.status == StatusCode::OK {
            info!(%url, "TRACE is enabled.");
            return Ok(vec![
                Finding::new(
                    VulnerabilityKind::HttpMethodExposure,
                    "HTTP TRACE method enabled (cross-site tracing)",
                )
                .with_evidence(format!("TRACE {} -> {}", url, response.status)),
            ]);
        }
        debug!(status = %response.status, "TRACE not accepted.");
        Ok(Vec::new())
    }
}
