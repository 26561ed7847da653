// src/core/scanner/exposure_scanner.rs

use super::{Probe, ProbeContext};
use crate::core::http_client::HttpResponse;
use crate::core::models::{Finding, VulnerabilityKind};
use crate::errors::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info};

/// Conventional paths that should never be served to anonymous visitors.
pub const SENSITIVE_PATHS: &[&str] = &["/admin", "/.git", "/.env", "/config", "/backup"];

/// Body markers that mean the page is a login wall or a soft 404.
const BENIGN_MARKERS: &[&str] = &["login", "404"];

/// A path counts as exposed only on a 200 whose body is neither a login
/// page nor a soft 404.
pub fn is_exposed(response: &HttpResponse) -> bool {
    response.status == StatusCode::OK
        && !BENIGN_MARKERS.iter().any(|m| response.body_contains_ignore_case(m))
}

pub struct SensitivePathProbe;

#[async_trait]
impl Probe for SensitivePathProbe {
    fn name(&self) -> &'static str {
        "sensitive_paths"
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for path in SENSITIVE_PATHS {
            let url = ctx.target.with_path_segment(path);
            let response = ctx.client.get(&url).await?;

            if is_exposed(&response) {
                info!(%url, "Sensitive path is publicly readable.");
                findings.push(
                    Finding::new(
                        VulnerabilityKind::SensitivePathExposure,
                        format!("Sensitive path exposed: {}", path),
                    )
                    .with_evidence(format!("GET {} -> {}", url, response.status)),
                );
            } else {
                debug!(%url, status = %response.status, "Path not exposed.");
            }
        }
        Ok(findings)
    }
}
