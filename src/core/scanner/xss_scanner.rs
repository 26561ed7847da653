// src/core/scanner/xss_scanner.rs

use super::{Probe, ProbeContext};
use crate::core::models::{Finding, VulnerabilityKind};
use crate::errors::Result;
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

pub const REFLECTED_MARKER: &str = "<script>alert('Reflected XSS')</script>";
pub const STORED_MARKER: &str = "<script>alert('Stored XSS')</script>";

/// Sends a script marker in a query parameter and looks for it, unescaped,
/// in the response body.
pub struct ReflectedXssProbe;

#[async_trait]
impl Probe for ReflectedXssProbe {
    fn name(&self) -> &'static str {
        "reflected_xss"
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Vec<Finding>> {
        let url = ctx.target.with_query_param("message", REFLECTED_MARKER);
        let response = ctx.client.get(&url).await?;

        if response.body.contains(REFLECTED_MARKER) {
            info!(%url, "Script marker reflected unescaped.");
            return Ok(vec![
                Finding::new(VulnerabilityKind::ReflectedXss, "Reflected XSS vulnerability found")
                    .with_evidence(format!("GET {} echoed {}", url, REFLECTED_MARKER)),
            ]);
        }
        debug!("Reflected marker not found in response.");
        Ok(Vec::new())
    }
}

/// Posts a comment carrying a script marker, then reads the target back.
/// Only a marker that shows up in the later read counts as stored.
pub struct StoredXssProbe;

#[async_trait]
impl Probe for StoredXssProbe {
    fn name(&self) -> &'static str {
        "stored_xss"
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Vec<Finding>> {
        let url = ctx.target.url();
        let write = ctx.client.post_json(url, &json!({ "comment": STORED_MARKER })).await?;
        debug!(status = %write.status, "Comment submitted.");

        let read = ctx.client.get(url).await?;
        if read.body.contains(STORED_MARKER) {
            info!(%url, "Stored script marker served back unescaped.");
            return Ok(vec![
                Finding::new(VulnerabilityKind::StoredXss, "Stored XSS vulnerability found")
                    .with_evidence(format!("POST then GET {} served {}", url, STORED_MARKER)),
            ]);
        }
        Ok(Vec::new())
    }
}
