// src/core/scanner/mod.rs

// Every probe lives in its own module and is registered in `default_probes`.
pub mod cors_scanner;
pub mod exposure_scanner;
pub mod fingerprint_scanner;
pub mod headers_scanner;
pub mod injection_scanner;
pub mod method_scanner;
pub mod port_scanner;
pub mod ssl_scanner;
pub mod xss_scanner;

use crate::config::ScanConfig;
use crate::core::executor::Executor;
use crate::core::http_client::BoundedClient;
use crate::core::models::{Finding, ScanReport};
use crate::core::target::Target;
use crate::errors::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Everything a probe may touch during one scan. Shared read-only between
/// all probes of that scan and dropped with it.
#[derive(Debug)]
pub struct ProbeContext {
    pub target: Target,
    pub client: BoundedClient,
    pub config: ScanConfig,
}

/// A single, independent vulnerability check.
///
/// Probes are stateless and never look at each other's results. A probe
/// that cannot finish returns `Err`; the executor turns that into a
/// `ProbeError` so siblings are never affected.
#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &'static str;

    /// Probes that make no sense for a target (TLS on plain http) return
    /// false and are recorded as completed with no findings.
    fn applies_to(&self, _target: &Target) -> bool {
        true
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Vec<Finding>>;
}

/// The full probe set, in declaration order. Report ordering follows this.
pub fn default_probes() -> Vec<Arc<dyn Probe>> {
    vec![
        Arc::new(xss_scanner::ReflectedXssProbe),
        Arc::new(xss_scanner::StoredXssProbe),
        Arc::new(injection_scanner::SqlInjectionGetProbe),
        Arc::new(injection_scanner::SqlInjectionPostProbe),
        Arc::new(injection_scanner::DirectoryTraversalProbe),
        Arc::new(injection_scanner::CommandInjectionProbe),
        Arc::new(headers_scanner::SecurityHeadersProbe),
        Arc::new(fingerprint_scanner::ServerFingerprintProbe),
        Arc::new(exposure_scanner::SensitivePathProbe),
        Arc::new(ssl_scanner::TlsCertificateProbe),
        Arc::new(port_scanner::OpenPortProbe),
        Arc::new(cors_scanner::CorsProbe),
        Arc::new(method_scanner::TraceMethodProbe),
    ]
}

/// Validates `raw` and runs every probe against it.
///
/// The only error this returns before any probe runs is
/// `ScanError::InvalidTarget`. After validation the scan always completes;
/// `ScanError::Aggregation` is the one remaining failure and indicates a bug.
pub async fn run_full_scan(raw: &str, config: &ScanConfig) -> Result<ScanReport> {
    let target = Target::parse(raw)?;
    info!(%target, "Target validated, starting full scan.");
    Executor::new(default_probes(), config.clone()).run(target).await
}
