// src/core/http_client.rs

use crate::config::ScanConfig;
use crate::errors::{Result, ScanError};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::{form_urlencoded, Url};

/// A fully read response. The body is consumed inside the timeout scope so
/// probes never hold a live connection.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    /// Header value as text. Non UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body_contains_ignore_case(&self, needle: &str) -> bool {
        self.body.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Outbound HTTP with a hard per-request timeout that is also clamped to the
/// scan deadline. No retries, no idle connections kept between calls.
#[derive(Debug, Clone)]
pub struct BoundedClient {
    client: reqwest::Client,
    default_timeout: Duration,
    deadline: Instant,
}

impl BoundedClient {
    pub fn new(config: &ScanConfig, deadline: Instant) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .pool_max_idle_per_host(0)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client, default_timeout: config.request_timeout, deadline })
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Sends one request and reads the whole response.
    ///
    /// `timeout` overrides the configured default. Either way the effective
    /// limit never reaches past the scan deadline. On expiry the request
    /// future is dropped, which aborts the connection, and `ScanError::Timeout`
    /// is returned.
    pub async fn request(
        &self,
        method: Method,
        url: &Url,
        body: Option<String>,
        headers: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<HttpResponse> {
        let wanted = timeout.unwrap_or(self.default_timeout);
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        let limit = wanted.min(remaining);

        if limit.is_zero() {
            warn!(%url, "Scan deadline already passed, request not sent.");
            return Err(ScanError::Timeout { url: url.to_string(), after: Duration::ZERO });
        }

        let mut builder = self.client.request(method.clone(), url.clone());
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        debug!(%method, %url, timeout_ms = limit.as_millis() as u64, "Sending request.");
        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(HttpResponse { status, headers, body })
        };

        match tokio::time::timeout(limit, exchange).await {
            Ok(Ok(response)) => {
                debug!(%method, %url, status = %response.status, bytes = response.body.len(), "Response received.");
                Ok(response)
            }
            Ok(Err(e)) => {
                debug!(%method, %url, error = %e, "Request failed.");
                if e.is_timeout() {
                    Err(ScanError::Timeout { url: url.to_string(), after: limit })
                } else {
                    Err(e.into())
                }
            }
            Err(_) => {
                debug!(%method, %url, timeout_ms = limit.as_millis() as u64, "Request timed out.");
                Err(ScanError::Timeout { url: url.to_string(), after: limit })
            }
        }
    }

    pub async fn get(&self, url: &Url) -> Result<HttpResponse> {
        self.request(Method::GET, url, None, &[], None).await
    }

    pub async fn get_with_headers(&self, url: &Url, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        self.request(Method::GET, url, None, headers, None).await
    }

    pub async fn post_json(&self, url: &Url, body: &serde_json::Value) -> Result<HttpResponse> {
        let content_type = CONTENT_TYPE.as_str();
        self.request(
            Method::POST,
            url,
            Some(body.to_string()),
            &[(content_type, "application/json")],
            None,
        )
        .await
    }

    /// POSTs `fields` as an `application/x-www-form-urlencoded` body.
    pub async fn post_form(&self, url: &Url, fields: &[(&str, &str)]) -> Result<HttpResponse> {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter())
            .finish();
        self.request(
            Method::POST,
            url,
            Some(body),
            &[(CONTENT_TYPE.as_str(), "application/x-www-form-urlencoded")],
            None,
        )
        .await
    }

    pub async fn head(&self, url: &Url, timeout: Duration) -> Result<HttpResponse> {
        self.request(Method::HEAD, url, None, &[], Some(timeout)).await
    }
}
