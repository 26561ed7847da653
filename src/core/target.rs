// src/core/target.rs

use crate::errors::{Result, ScanError};
use std::fmt;
use tracing::debug;
use url::{form_urlencoded, Url};

/// A validated absolute http(s) URL. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
}

impl Target {
    /// Validates raw user input. No network I/O happens here.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed).map_err(|e| {
            debug!(input = trimmed, error = %e, "Target rejected: not an absolute URL.");
            ScanError::InvalidTarget(format!("{}: {}", trimmed, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            debug!(input = trimmed, scheme = url.scheme(), "Target rejected: unsupported scheme.");
            return Err(ScanError::InvalidTarget(format!(
                "{}: unsupported scheme '{}'",
                trimmed,
                url.scheme()
            )));
        }

        match url.host_str() {
            Some(host) if !host.is_empty() => Ok(Self { url }),
            _ => Err(ScanError::InvalidTarget(format!("{}: missing host", trimmed))),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_https(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// Host name or address literal. IPv6 literals come back without brackets
    /// so they can be used for resolution and SNI directly.
    pub fn host(&self) -> &str {
        // Checked non-empty in `parse`.
        let host = self.url.host_str().unwrap_or_default();
        host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host)
    }

    /// Explicit port, or the scheme default.
    pub fn port(&self) -> u16 {
        self.url.port_or_known_default().unwrap_or(80)
    }

    /// The target URL with `name=value` appended to its query string.
    /// Both parts are percent-encoded as URI components, so a space is `%20`.
    pub fn with_query_param(&self, name: &str, value: &str) -> Url {
        let pair = format!("{}={}", encode_component(name), encode_component(value));
        let mut url = self.url.clone();
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{}&{}", existing, pair),
            _ => pair,
        };
        url.set_query(Some(&query));
        url
    }

    /// The target URL with one more path segment and no query or fragment.
    /// `segment` is used as-is, so callers pass it already encoded.
    pub fn with_path_segment(&self, segment: &str) -> Url {
        let mut url = self.url.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}/{}", base, segment.trim_start_matches('/')));
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    /// Plain-http root URL of the same host on another port.
    pub fn on_port(&self, port: u16) -> Result<Url> {
        let raw = match self.url.host() {
            Some(url::Host::Ipv6(addr)) => format!("http://[{}]:{}/", addr, port),
            _ => format!("http://{}:{}/", self.host(), port),
        };
        Url::parse(&raw).map_err(|e| ScanError::InvalidTarget(format!("{}: {}", raw, e)))
    }
}

// Form encoding escapes a literal `+` as `%2B`, so every `+` left in its
// output stands for a space.
fn encode_component(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
