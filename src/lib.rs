//! Web vulnerability scanning engine.
//!
//! A scan validates a target URL, runs every probe against it concurrently
//! under one time budget, and returns a deduplicated `ScanReport`. The
//! `server` module exposes that over HTTP.

pub mod config;
pub mod core;
pub mod errors;
pub mod logging;
pub mod server;

pub use crate::core::models::{Finding, ScanReport, VulnerabilityKind};
pub use crate::core::scanner::run_full_scan;
pub use crate::errors::{Result, ScanError};
