// src/core/scanner/port_scanner.rs

use super::{Probe, ProbeContext};
use crate::core::models::{Finding, VulnerabilityKind};
use crate::errors::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info};

/// HEADs each configured sensitive port on the target host. A port that
/// answers HTTP 200 is a service that should not be speaking HTTP publicly.
///
/// Refused or silent ports are the expected answer, so per-port connection
/// failures are not probe errors.
pub struct OpenPortProbe;

#[async_trait]
impl Probe for OpenPortProbe {
    fn name(&self) -> &'static str {
        "open_ports"
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for &port in &ctx.config.sensitive_ports {
            let url = ctx.target.on_port(port)?;
            match ctx.client.head(&url, ctx.config.port_timeout).await {
                Ok(response) if response.status == StatusCode::OK => {
                    info!(port, "Sensitive port answered HTTP 200.");
                    findings.push(
                        Finding::new(
                            VulnerabilityKind::OpenPort,
                            format!("Sensitive port {} is open and answers HTTP", port),
                        )
                        .with_evidence(format!("HEAD {} -> {}", url, response.status)),
                    );
                }
                Ok(response) => debug!(port, status = %response.status, "Port answered without 200."),
                Err(e) => debug!(port, error = %e, "Port closed or filtered."),
            }
        }
        Ok(findings)
    }
}
