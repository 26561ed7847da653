// src/core/scanner/injection_scanner.rs

use super::{Probe, ProbeContext};
use crate::core::http_client::HttpResponse;
use crate::core::models::{Finding, VulnerabilityKind};
use crate::errors::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::{debug, info};

pub const SQL_PAYLOAD: &str = "' OR '1'='1";
pub const COMMAND_PAYLOAD: &str = "127.0.0.1; ls";

/// Traversal sent as a single path segment. Encoded slashes keep URL
/// normalisation from collapsing the `..` parts before the request leaves.
pub const TRAVERSAL_SEGMENT: &str = "..%2F..%2F..%2F..%2Fetc%2Fpasswd";
pub const TRAVERSAL_PAYLOAD: &str = "../../../../etc/passwd";
const PASSWD_MARKER: &str = "root:x";

// Tokens that only show up when `ls` output leaks into the page.
static RE_LISTING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)index\.html|^total \d+$|[d-][rwx-]{9}\s+\d+").expect("listing regex is valid")
});

/// Error-based signal shared by both SQL injection probes.
fn looks_like_sql_error(response: &HttpResponse) -> bool {
    response.status.is_server_error()
        || response.body_contains_ignore_case("sql")
        || response.body_contains_ignore_case("error")
}

pub struct SqlInjectionGetProbe;

#[async_trait]
impl Probe for SqlInjectionGetProbe {
    fn name(&self) -> &'static str {
        "sql_injection_get"
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Vec<Finding>> {
        let url = ctx.target.with_query_param("id", SQL_PAYLOAD);
        let response = ctx.client.get(&url).await?;

        if looks_like_sql_error(&response) {
            info!(%url, status = %response.status, "SQL error signal after GET payload.");
            return Ok(vec![
                Finding::new(VulnerabilityKind::SqlInjection, "SQL Injection vulnerability found (GET)")
                    .with_evidence(format!("GET {} -> {}", url, response.status)),
            ]);
        }
        Ok(Vec::new())
    }
}

pub struct SqlInjectionPostProbe;

#[async_trait]
impl Probe for SqlInjectionPostProbe {
    fn name(&self) -> &'static str {
        "sql_injection_post"
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Vec<Finding>> {
        let url = ctx.target.url();

        // JSON first, then the same field as a classic form post.
        let mut response = ctx.client.post_json(url, &json!({ "id": SQL_PAYLOAD })).await?;
        let mut encoding = "json";
        if !looks_like_sql_error(&response) {
            response = ctx.client.post_form(url, &[("id", SQL_PAYLOAD)]).await?;
            encoding = "form";
        }

        if looks_like_sql_error(&response) {
            info!(%url, status = %response.status, encoding, "SQL error signal after POST payload.");
            return Ok(vec![
                Finding::new(VulnerabilityKind::SqlInjection, "SQL Injection vulnerability found (POST)")
                    .with_evidence(format!("POST ({}) {} -> {}", encoding, url, response.status)),
            ]);
        }
        Ok(Vec::new())
    }
}

/// Tries the traversal both as a path segment and as a `file` parameter.
pub struct DirectoryTraversalProbe;

#[async_trait]
impl Probe for DirectoryTraversalProbe {
    fn name(&self) -> &'static str {
        "directory_traversal"
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Vec<Finding>> {
        let attempts = [
            ctx.target.with_path_segment(TRAVERSAL_SEGMENT),
            ctx.target.with_query_param("file", TRAVERSAL_PAYLOAD),
        ];

        for url in &attempts {
            let response = ctx.client.get(url).await?;
            if response.body.contains(PASSWD_MARKER) {
                info!(%url, "passwd contents leaked.");
                return Ok(vec![
                    Finding::new(VulnerabilityKind::DirectoryTraversal, "Directory Traversal vulnerability found")
                        .with_evidence(format!("GET {} returned '{}'", url, PASSWD_MARKER)),
                ]);
            }
            debug!(%url, "No passwd marker.");
        }
        Ok(Vec::new())
    }
}

pub struct CommandInjectionProbe;

#[async_trait]
impl Probe for CommandInjectionProbe {
    fn name(&self) -> &'static str {
        "command_injection"
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Vec<Finding>> {
        let url = ctx.target.with_query_param("ip", COMMAND_PAYLOAD);
        let response = ctx.client.get(&url).await?;

        if let Some(token) = RE_LISTING.find(&response.body) {
            info!(%url, token = token.as_str(), "Directory listing token in response.");
            return Ok(vec![
                Finding::new(VulnerabilityKind::CommandInjection, "Command Injection vulnerability found")
                    .with_evidence(format!("GET {} returned '{}'", url, token.as_str())),
            ]);
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_regex_matches_ls_output() {
        assert!(RE_LISTING.is_match("index.html\nstyle.css"));
        assert!(RE_LISTING.is_match("total 12\ndrwxr-xr-x  2 root root 4096 ."));
        assert!(RE_LISTING.is_match("-rw-r--r-- 1 www www 10 a.txt"));
        assert!(!RE_LISTING.is_match("127.0.0.1; ls"));
        assert!(!RE_LISTING.is_match("<p>Total: 12 items</p>"));
    }

    #[test]
    fn sql_signal_is_case_insensitive() {
        let response = HttpResponse {
            status: reqwest::StatusCode::OK,
            headers: Default::default(),
            body: "You have an ERROR in your syntax".to_string(),
        };
        assert!(looks_like_sql_error(&response));

        let clean = HttpResponse { body: "welcome".to_string(), ..response.clone() };
        assert!(!looks_like_sql_error(&clean));

        let crashed = HttpResponse { status: reqwest::StatusCode::BAD_GATEWAY, ..clean };
        assert!(looks_like_sql_error(&crashed));
    }
}
