// src/errors.rs

use std::time::Duration;
use thiserror::Error;

/// Every error the scanning engine can produce.
///
/// Only `InvalidTarget` and `Aggregation` ever reach the HTTP boundary. The
/// rest are absorbed per probe and turned into `ProbeError` entries.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid URL provided")]
    InvalidTarget(String),

    #[error("request to {url} timed out after {}ms", .after.as_millis())]
    Timeout { url: String, after: Duration },

    #[error("network error: {0}")]
    Network(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("report aggregation failed: {0}")]
    Aggregation(String),
}

impl ScanError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScanError::Timeout { .. })
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(e: reqwest::Error) -> Self {
        ScanError::Network(e.to_string())
    }
}

impl From<native_tls::Error> for ScanError {
    fn from(e: native_tls::Error) -> Self {
        ScanError::Tls(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_target_renders_boundary_message() {
        let err = ScanError::InvalidTarget("not-a-url".to_string());
        assert_eq!(err.to_string(), "Invalid URL provided");
    }

    #[test]
    fn timeout_reports_url_and_duration() {
        let err = ScanError::Timeout {
            url: "http://example.com/".to_string(),
            after: Duration::from_millis(1500),
        };
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "request to http://example.com/ timed out after 1500ms"
        );
    }
}
