// src/server.rs

use crate::config::{ScanConfig, ServerConfig};
use crate::core::knowledge_base::{self, EnrichedFinding};
use crate::core::models::{ProbeError, ProbeRun, ScanReport};
use crate::core::scanner::run_full_scan;
use crate::errors::ScanError;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

pub struct AppState {
    pub scan: ScanConfig,
    pub expose_diagnostics: bool,
}

impl From<&ServerConfig> for AppState {
    fn from(config: &ServerConfig) -> Self {
        Self { scan: config.scan.clone(), expose_diagnostics: config.expose_diagnostics }
    }
}

pub fn create_scan_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/scan",
            post(scan_handler).options(preflight_handler).fallback(method_not_allowed),
        )
        .route(
            "/scan/report",
            post(report_handler).options(preflight_handler).fallback(method_not_allowed),
        )
        .route("/health", get(health_handler))
        .layer(map_response(add_cors_headers))
        .with_state(state)
}

/// Binds `config.bind` and serves until the process stops.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let state = Arc::new(AppState::from(&config));
    let listener = TcpListener::bind(config.bind).await?;
    info!(addr = %listener.local_addr()?, "Scan API listening.");
    axum::serve(listener, create_scan_router(state).into_make_service()).await
}

async fn add_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST, OPTIONS"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));
    response
}

async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// Pulls `url` out of a raw JSON body.
fn extract_url(body: &[u8]) -> Result<String, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "Rejected scan request with unparsable body.");
        ApiError::BadRequest("Invalid JSON body".to_string())
    })?;

    match value.get("url").and_then(Value::as_str).map(str::trim) {
        Some(url) if !url.is_empty() => Ok(url.to_string()),
        _ => Err(ApiError::BadRequest("No URL provided".to_string())),
    }
}

async fn scan_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let url = extract_url(&body)?;
    info!(url = %url, "Scan requested.");

    let report = run_full_scan(&url, &state.scan).await?;
    let mut payload = json!({ "vulnerabilities": report.rendered_findings() });
    if state.expose_diagnostics {
        payload["diagnostics"] = json!(report.probe_errors);
    }
    Ok(Json(payload))
}

/// The full report with every finding enriched from the knowledge base.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedReport {
    pub target: String,
    pub vulnerabilities: Vec<String>,
    pub findings: Vec<EnrichedFinding>,
    pub probe_errors: Vec<ProbeError>,
    pub probe_runs: Vec<ProbeRun>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl From<ScanReport> for DetailedReport {
    fn from(report: ScanReport) -> Self {
        Self {
            vulnerabilities: report.rendered_findings(),
            findings: report.findings.iter().filter_map(knowledge_base::enrich).collect(),
            target: report.target,
            probe_errors: report.probe_errors,
            probe_runs: report.probe_runs,
            started_at: report.started_at,
            completed_at: report.completed_at,
        }
    }
}

async fn report_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<DetailedReport>, ApiError> {
    let url = extract_url(&body)?;
    info!(url = %url, "Detailed scan requested.");

    let report = run_full_scan(&url, &state.scan).await?;
    Ok(Json(DetailedReport::from(report)))
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    InternalError(String),
    MethodNotAllowed,
}

impl From<ScanError> for ApiError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::InvalidTarget(detail) => {
                warn!(detail = %detail, "Scan refused: invalid target.");
                ApiError::InternalError("Invalid URL provided".to_string())
            }
            other => {
                error!(error = %other, "Scan failed.");
                ApiError::InternalError(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_extraction_rules() {
        assert_eq!(extract_url(br#"{"url": " http://a.test "}"#).unwrap(), "http://a.test");

        let missing: [&[u8]; 4] = [b"{}", br#"{"url": ""}"#, br#"{"url": 42}"#, br#"{"link": "x"}"#];
        for body in missing {
            match extract_url(body) {
                Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "No URL provided"),
                other => panic!("unexpected {:?}", other),
            }
        }

        let garbled: [&[u8]; 3] = [b"", b"{not json", b"url=http://a.test"];
        for body in garbled {
            match extract_url(body) {
                Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "Invalid JSON body"),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn invalid_target_maps_to_500_with_boundary_message() {
        let api: ApiError = ScanError::InvalidTarget("not-a-url".to_string()).into();
        match api {
            ApiError::InternalError(msg) => assert_eq!(msg, "Invalid URL provided"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
