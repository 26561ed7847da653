//! The `scan` subcommand run as a real process.

mod common;

use common::closed_port;
use std::process::Command;

#[test]
fn scan_prints_report_on_stdout_and_logs_on_stderr() {
    let home = env!("CARGO_TARGET_TMPDIR");
    let target = format!("http://127.0.0.1:{}/", closed_port());

    let output = Command::new(env!("CARGO_BIN_EXE_vulnscan-engine"))
        .args(["scan", &target, "--sensitive-ports", "1", "--scan-budget-secs", "5"])
        .env("HOME", home)
        .env("XDG_DATA_HOME", home)
        .env("RUST_LOG", "vulnscan_engine=info")
        .output()
        .expect("run binary");

    assert!(output.status.success(), "exit status {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stdout.starts_with("Target: "), "stdout: {stdout}");
    assert!(stdout.contains("No vulnerabilities found"));
    assert!(!stdout.contains("Scan COMPLETED"), "log line leaked into stdout: {stdout}");
    assert!(stderr.contains("Scan COMPLETED"), "stderr: {stderr}");
}
