// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use strum::{Display, EnumIter, IntoStaticStr};

/// Rendered in place of an empty finding list so that "scanned, found
/// nothing" never looks like "not scanned".
pub const NO_VULNERABILITIES: &str = "No vulnerabilities found";

// --- Core Data Models ---

// How bad a finding is. Used by the knowledge base and the detailed report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// The closed set of vulnerability signals the probes can raise.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VulnerabilityKind {
    ReflectedXss,
    StoredXss,
    SqlInjection,
    DirectoryTraversal,
    CommandInjection,
    MissingSecurityHeader,
    OutdatedServer,
    SensitivePathExposure,
    TlsCertificate,
    OpenPort,
    CorsMisconfiguration,
    HttpMethodExposure,
}

/// One concrete vulnerability signal.
///
/// Two findings are equal when kind and message match; evidence is carried
/// along for the detailed report but never takes part in deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub kind: VulnerabilityKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl Finding {
    pub fn new(kind: VulnerabilityKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), evidence: None }
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }
}

impl PartialEq for Finding {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

impl Eq for Finding {}

impl Hash for Finding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.message.hash(state);
    }
}

/// Records that a probe could not complete. Never fatal to the scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProbeError {
    pub probe_name: String,
    pub cause: String,
}

impl ProbeError {
    pub fn new(probe_name: &str, cause: impl Into<String>) -> Self {
        Self { probe_name: probe_name.to_string(), cause: cause.into() }
    }
}

/// Lifecycle of one probe inside one scan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeStatus {
    Pending,
    Running,
    Completed,
    TimedOut,
    Errored,
}

impl ProbeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProbeStatus::Completed | ProbeStatus::TimedOut | ProbeStatus::Errored)
    }
}

/// What a single probe left behind once the executor was done with it.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub probe_name: &'static str,
    pub status: ProbeStatus,
    pub findings: Vec<Finding>,
    pub error: Option<ProbeError>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeRun {
    pub name: String,
    pub status: ProbeStatus,
    pub elapsed_ms: u64,
}

// --- Main Report ---

/// The result of one scan invocation. Built once by the aggregator and never
/// mutated after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub target: String,
    pub findings: Vec<Finding>,
    pub probe_errors: Vec<ProbeError>,
    pub probe_runs: Vec<ProbeRun>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl ScanReport {
    /// True when the scan found nothing and every probe ran to completion.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.probe_errors.is_empty()
    }

    /// The user-facing list of strings, one per finding, or the sentinel.
    pub fn rendered_findings(&self) -> Vec<String> {
        if self.findings.is_empty() {
            return vec![NO_VULNERABILITIES.to_string()];
        }
        self.findings.iter().map(|f| f.message.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn report(findings: Vec<Finding>, probe_errors: Vec<ProbeError>) -> ScanReport {
        ScanReport {
            target: "http://example.com/".to_string(),
            findings,
            probe_errors,
            probe_runs: Vec::new(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn findings_dedup_ignores_evidence() {
        let a = Finding::new(VulnerabilityKind::OpenPort, "port 22").with_evidence("a");
        let b = Finding::new(VulnerabilityKind::OpenPort, "port 22").with_evidence("b");
        let c = Finding::new(VulnerabilityKind::CorsMisconfiguration, "port 22");

        let set: HashSet<Finding> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn empty_report_renders_sentinel() {
        let clean = report(Vec::new(), Vec::new());
        assert!(clean.is_clean());
        assert_eq!(clean.rendered_findings(), vec![NO_VULNERABILITIES.to_string()]);

        let errored = report(Vec::new(), vec![ProbeError::new("cors", "refused")]);
        assert!(!errored.is_clean());
        assert_eq!(errored.rendered_findings(), vec![NO_VULNERABILITIES.to_string()]);
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&VulnerabilityKind::SqlInjection).unwrap();
        assert_eq!(json, "\"sql_injection\"");
        assert_eq!(VulnerabilityKind::ReflectedXss.to_string(), "reflected_xss");
        assert_eq!(ProbeStatus::TimedOut.to_string(), "TIMED_OUT");
    }
}
