// src/core/report.rs

use crate::core::models::{Finding, ProbeOutcome, ProbeRun, ScanReport};
use crate::errors::{Result, ScanError};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, info};

/// Collects probe outcomes into slots indexed by probe declaration order and
/// builds the final report in one pass.
///
/// Only the executor holds the aggregator, so writes are serialized and the
/// report cannot be observed half-built.
#[derive(Debug)]
pub struct Aggregator {
    target: String,
    started_at: DateTime<Utc>,
    slots: Vec<Option<ProbeOutcome>>,
}

impl Aggregator {
    pub fn new(target: impl Into<String>, started_at: DateTime<Utc>, probe_count: usize) -> Self {
        Self { target: target.into(), started_at, slots: vec![None; probe_count] }
    }

    /// Stores the outcome of probe number `index`. Each slot takes exactly one
    /// outcome.
    pub fn record(&mut self, index: usize, outcome: ProbeOutcome) -> Result<()> {
        let slot = self.slots.get_mut(index).ok_or_else(|| {
            ScanError::Aggregation(format!("no slot for probe #{} ({})", index, outcome.probe_name))
        })?;
        if slot.is_some() {
            return Err(ScanError::Aggregation(format!(
                "probe '{}' reported twice",
                outcome.probe_name
            )));
        }
        debug!(probe = outcome.probe_name, status = %outcome.status, findings = outcome.findings.len(), "Outcome recorded.");
        *slot = Some(outcome);
        Ok(())
    }

    /// Merges every slot, in order, into an immutable report.
    pub fn finish(self, completed_at: DateTime<Utc>) -> Result<ScanReport> {
        let mut seen: HashSet<Finding> = HashSet::new();
        let mut findings = Vec::new();
        let mut probe_errors = Vec::new();
        let mut probe_runs = Vec::with_capacity(self.slots.len());

        for (index, slot) in self.slots.into_iter().enumerate() {
            let outcome = slot.ok_or_else(|| {
                ScanError::Aggregation(format!("probe #{} never reported an outcome", index))
            })?;

            for finding in outcome.findings {
                if seen.insert(finding.clone()) {
                    findings.push(finding);
                }
            }
            if let Some(error) = outcome.error {
                probe_errors.push(error);
            }
            probe_runs.push(ProbeRun {
                name: outcome.probe_name.to_string(),
                status: outcome.status,
                elapsed_ms: outcome.elapsed_ms,
            });
        }

        info!(
            target = %self.target,
            findings = findings.len(),
            probe_errors = probe_errors.len(),
            "Report aggregated."
        );
        Ok(ScanReport {
            target: self.target,
            findings,
            probe_errors,
            probe_runs,
            started_at: self.started_at,
            completed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{ProbeError, ProbeStatus, VulnerabilityKind};

    fn completed(name: &'static str, findings: Vec<Finding>) -> ProbeOutcome {
        ProbeOutcome { probe_name: name, status: ProbeStatus::Completed, findings, error: None, elapsed_ms: 1 }
    }

    fn header(name: &str) -> Finding {
        Finding::new(VulnerabilityKind::MissingSecurityHeader, format!("Missing security header: {}", name))
    }

    #[test]
    fn keeps_declaration_order_regardless_of_arrival() {
        let mut agg = Aggregator::new("http://t/", Utc::now(), 3);
        agg.record(2, completed("c", vec![header("C")])).unwrap();
        agg.record(0, completed("a", vec![header("A1"), header("A2")])).unwrap();
        agg.record(1, completed("b", vec![header("B")])).unwrap();

        let report = agg.finish(Utc::now()).unwrap();
        let messages: Vec<&str> = report.findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Missing security header: A1",
                "Missing security header: A2",
                "Missing security header: B",
                "Missing security header: C",
            ]
        );
        let runs: Vec<&str> = report.probe_runs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(runs, vec!["a", "b", "c"]);
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let mut agg = Aggregator::new("http://t/", Utc::now(), 2);
        agg.record(0, completed("a", vec![header("X").with_evidence("first")])).unwrap();
        agg.record(1, completed("b", vec![header("X").with_evidence("second"), header("Y")])).unwrap();

        let report = agg.finish(Utc::now()).unwrap();
        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.findings[0].evidence.as_deref(), Some("first"));
    }

    #[test]
    fn errors_are_collected_separately() {
        let mut agg = Aggregator::new("http://t/", Utc::now(), 1);
        agg.record(
            0,
            ProbeOutcome {
                probe_name: "cors",
                status: ProbeStatus::Errored,
                findings: Vec::new(),
                error: Some(ProbeError::new("cors", "connection refused")),
                elapsed_ms: 3,
            },
        )
        .unwrap();

        let report = agg.finish(Utc::now()).unwrap();
        assert!(report.findings.is_empty());
        assert_eq!(report.probe_errors, vec![ProbeError::new("cors", "connection refused")]);
        assert_eq!(report.rendered_findings(), vec!["No vulnerabilities found".to_string()]);
    }

    #[test]
    fn missing_or_double_outcomes_are_aggregation_errors() {
        let mut agg = Aggregator::new("http://t/", Utc::now(), 2);
        agg.record(0, completed("a", Vec::new())).unwrap();
        assert!(matches!(agg.record(0, completed("a", Vec::new())), Err(ScanError::Aggregation(_))));
        assert!(matches!(agg.record(5, completed("z", Vec::new())), Err(ScanError::Aggregation(_))));
        assert!(matches!(agg.finish(Utc::now()), Err(ScanError::Aggregation(_))));
    }
}
