// src/main.rs

use color_eyre::eyre::Result;
use vulnscan_engine::config::{CommandLine, Commands, ServerConfig};
use vulnscan_engine::core::knowledge_base::get_finding_detail;
use vulnscan_engine::core::models::ScanReport;
use vulnscan_engine::{logging, run_full_scan, server};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;

    let cli = CommandLine::parse_args();
    let scan = cli.scan.to_config();

    match cli.command {
        Commands::Serve { bind, expose_diagnostics } => {
            server::serve(ServerConfig { bind, expose_diagnostics, scan }).await?;
        }
        Commands::Scan { url } => {
            let report = run_full_scan(&url, &scan).await?;
            print_report(&report);
        }
    }
    Ok(())
}

/// Plain-text rendering for the one-shot `scan` command.
fn print_report(report: &ScanReport) {
    println!("Target: {}", report.target);
    println!(
        "Finished in {}ms",
        (report.completed_at - report.started_at).num_milliseconds()
    );

    if report.findings.is_empty() {
        for line in report.rendered_findings() {
            println!("  {}", line);
        }
    }
    for finding in &report.findings {
        let severity = get_finding_detail(finding.kind)
            .map(|d| format!("{:?}", d.severity).to_uppercase())
            .unwrap_or_else(|| "UNKNOWN".to_string());
        println!("  [{}] {}", severity, finding.message);
        if let Some(evidence) = &finding.evidence {
            println!("      {}", evidence.replace('\n', "\n      "));
        }
    }

    if !report.probe_errors.is_empty() {
        println!("Probes that did not complete:");
        for error in &report.probe_errors {
            println!("  {}: {}", error.probe_name, error.cause);
        }
    }
}
