// src/core/mod.rs

/// Data structures shared by every stage of a scan: findings, probe
/// outcomes and the final `ScanReport`.
pub mod models;

/// Validation of raw user input into a `Target`.
pub mod target;

/// Outbound HTTP with per-request timeouts bound to the scan deadline.
pub mod http_client;

/// The probe trait and every probe implementation.
pub mod scanner;

/// Fans probes out under the scan budget and collects their outcomes.
pub mod executor;

/// Merges probe outcomes into an ordered, deduplicated report.
pub mod report;

/// Titles, severities and remediation advice per vulnerability kind.
pub mod knowledge_base;
