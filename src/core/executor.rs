// src/core/executor.rs

use crate::config::ScanConfig;
use crate::core::http_client::BoundedClient;
use crate::core::models::{Finding, ProbeError, ProbeOutcome, ProbeStatus, ScanReport};
use crate::core::report::Aggregator;
use crate::core::scanner::{Probe, ProbeContext};
use crate::core::target::Target;
use crate::errors::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

type ProbeTask = JoinHandle<(Result<Vec<Finding>>, Duration)>;

/// Runs a probe set against one target under a single scan budget.
///
/// Every probe runs in its own task, exactly once. When the budget runs out
/// the remaining tasks are aborted and reported as timed out, so a hung probe
/// can never hold the scan past its deadline.
pub struct Executor {
    probes: Vec<Arc<dyn Probe>>,
    config: ScanConfig,
}

impl Executor {
    pub fn new(probes: Vec<Arc<dyn Probe>>, config: ScanConfig) -> Self {
        Self { probes, config }
    }

    pub async fn run(&self, target: Target) -> Result<ScanReport> {
        let started_at = Utc::now();
        let started = Instant::now();
        let deadline = started + self.config.scan_budget;

        let client = BoundedClient::new(&self.config, deadline)?;
        let ctx = Arc::new(ProbeContext { target, client, config: self.config.clone() });
        let mut aggregator = Aggregator::new(ctx.target.to_string(), started_at, self.probes.len());

        info!(target = %ctx.target, probes = self.probes.len(), budget_ms = self.config.scan_budget.as_millis() as u64, "Scan RUNNING.");

        // Fan out. Probes that do not apply are settled on the spot.
        let mut tasks: Vec<Option<ProbeTask>> = Vec::with_capacity(self.probes.len());
        for (index, probe) in self.probes.iter().enumerate() {
            if !probe.applies_to(&ctx.target) {
                debug!(probe = probe.name(), "Probe does not apply to target, skipping.");
                aggregator.record(index, outcome(probe.name(), ProbeStatus::Completed, Vec::new(), None, Duration::ZERO))?;
                tasks.push(None);
                continue;
            }

            debug!(probe = probe.name(), from = %ProbeStatus::Pending, to = %ProbeStatus::Running, "Probe state change.");
            let probe = Arc::clone(probe);
            let ctx = Arc::clone(&ctx);
            tasks.push(Some(tokio::spawn(async move {
                let probe_started = Instant::now();
                let result = probe.run(&ctx).await;
                (result, probe_started.elapsed())
            })));
        }

        // Fan in, in declaration order. Every task is already running, so
        // waiting on them one by one costs nothing extra.
        for (index, task) in tasks.into_iter().enumerate() {
            let Some(mut task) = task else { continue };
            let name = self.probes[index].name();

            let settled = match tokio::time::timeout_at(deadline, &mut task).await {
                Ok(Ok((Ok(findings), elapsed))) => {
                    info!(probe = name, findings = findings.len(), "Probe COMPLETED.");
                    outcome(name, ProbeStatus::Completed, findings, None, elapsed)
                }
                Ok(Ok((Err(e), elapsed))) => {
                    let status = if e.is_timeout() { ProbeStatus::TimedOut } else { ProbeStatus::Errored };
                    warn!(probe = name, error = %e, %status, "Probe did not complete.");
                    outcome(name, status, Vec::new(), Some(ProbeError::new(name, e.to_string())), elapsed)
                }
                Ok(Err(join_error)) => {
                    error!(probe = name, error = %join_error, "Probe task failed.");
                    let cause = format!("probe task failed: {}", join_error);
                    outcome(name, ProbeStatus::Errored, Vec::new(), Some(ProbeError::new(name, cause)), started.elapsed())
                }
                Err(_) => {
                    task.abort();
                    warn!(probe = name, "Scan budget exhausted, probe aborted.");
                    let cause = format!(
                        "scan budget of {}ms exhausted",
                        self.config.scan_budget.as_millis()
                    );
                    outcome(name, ProbeStatus::TimedOut, Vec::new(), Some(ProbeError::new(name, cause)), started.elapsed())
                }
            };
            aggregator.record(index, settled)?;
        }

        let report = aggregator.finish(Utc::now())?;
        info!(
            target = %report.target,
            findings = report.findings.len(),
            probe_errors = report.probe_errors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan COMPLETED."
        );
        Ok(report)
    }
}

fn outcome(
    probe_name: &'static str,
    status: ProbeStatus,
    findings: Vec<Finding>,
    error: Option<ProbeError>,
    elapsed: Duration,
) -> ProbeOutcome {
    debug_assert!(status.is_terminal());
    ProbeOutcome { probe_name, status, findings, error, elapsed_ms: elapsed.as_millis() as u64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::VulnerabilityKind;
    use crate::core::scanner::ProbeContext;
    use crate::errors::ScanError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed(&'static str, &'static str);

    #[async_trait]
    impl Probe for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
        async fn run(&self, _ctx: &ProbeContext) -> Result<Vec<Finding>> {
            Ok(vec![Finding::new(VulnerabilityKind::OpenPort, self.1)])
        }
    }

    struct Slow(Duration, &'static str);

    #[async_trait]
    impl Probe for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }
        async fn run(&self, _ctx: &ProbeContext) -> Result<Vec<Finding>> {
            tokio::time::sleep(self.0).await;
            Ok(vec![Finding::new(VulnerabilityKind::OpenPort, self.1)])
        }
    }

    struct Failing;

    #[async_trait]
    impl Probe for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        async fn run(&self, _ctx: &ProbeContext) -> Result<Vec<Finding>> {
            Err(ScanError::Network("connection refused".to_string()))
        }
    }

    struct Panicking;

    #[async_trait]
    impl Probe for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }
        async fn run(&self, _ctx: &ProbeContext) -> Result<Vec<Finding>> {
            panic!("probe bug");
        }
    }

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl Probe for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }
        async fn run(&self, _ctx: &ProbeContext) -> Result<Vec<Finding>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    struct HttpsOnly;

    #[async_trait]
    impl Probe for HttpsOnly {
        fn name(&self) -> &'static str {
            "https_only"
        }
        fn applies_to(&self, target: &Target) -> bool {
            target.is_https()
        }
        async fn run(&self, _ctx: &ProbeContext) -> Result<Vec<Finding>> {
            Err(ScanError::Tls("must not run".to_string()))
        }
    }

    fn target() -> Target {
        Target::parse("http://127.0.0.1:9/").unwrap()
    }

    fn config(budget: Duration) -> ScanConfig {
        ScanConfig { scan_budget: budget, ..ScanConfig::default() }
    }

    #[tokio::test]
    async fn order_follows_declaration_not_completion() {
        let probes: Vec<Arc<dyn Probe>> = vec![
            Arc::new(Slow(Duration::from_millis(150), "first")),
            Arc::new(Fixed("fast", "second")),
        ];
        let report = Executor::new(probes, config(Duration::from_secs(5))).run(target()).await.unwrap();
        let messages: Vec<&str> = report.findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn failures_and_panics_do_not_abort_siblings() {
        let probes: Vec<Arc<dyn Probe>> = vec![
            Arc::new(Failing),
            Arc::new(Panicking),
            Arc::new(Fixed("ok", "still here")),
        ];
        let report = Executor::new(probes, config(Duration::from_secs(5))).run(target()).await.unwrap();

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].message, "still here");
        let failed: Vec<&str> = report.probe_errors.iter().map(|e| e.probe_name.as_str()).collect();
        assert_eq!(failed, vec!["failing", "panicking"]);
        let statuses: Vec<ProbeStatus> = report.probe_runs.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![ProbeStatus::Errored, ProbeStatus::Errored, ProbeStatus::Completed]);
    }

    #[tokio::test]
    async fn hung_probe_is_cut_at_the_budget() {
        let probes: Vec<Arc<dyn Probe>> = vec![
            Arc::new(Slow(Duration::from_secs(60), "never")),
            Arc::new(Fixed("fast", "done")),
        ];
        let started = std::time::Instant::now();
        let report = Executor::new(probes, config(Duration::from_millis(300))).run(target()).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(report.probe_runs[0].status, ProbeStatus::TimedOut);
        assert_eq!(report.probe_errors.len(), 1);
        assert!(report.probe_errors[0].cause.contains("scan budget"));
        assert_eq!(report.findings.len(), 1);
    }

    #[tokio::test]
    async fn each_probe_runs_exactly_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let probes: Vec<Arc<dyn Probe>> = vec![Arc::new(Counting(Arc::clone(&counter)))];
        Executor::new(probes, config(Duration::from_secs(5))).run(target()).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn inapplicable_probe_is_a_silent_no_op() {
        let probes: Vec<Arc<dyn Probe>> = vec![Arc::new(HttpsOnly)];
        let report = Executor::new(probes, config(Duration::from_secs(5))).run(target()).await.unwrap();
        assert!(report.is_clean());
        assert_eq!(report.probe_runs[0].status, ProbeStatus::Completed);
    }
}
