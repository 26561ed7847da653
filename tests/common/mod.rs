//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::time::Duration;
use vulnscan_engine::config::ScanConfig;
use wiremock::{Request, Respond, ResponseTemplate};

/// Short limits and no port sweep, so every scan finishes quickly.
pub fn test_config() -> ScanConfig {
    ScanConfig {
        request_timeout: Duration::from_secs(2),
        scan_budget: Duration::from_secs(5),
        port_timeout: Duration::from_millis(500),
        sensitive_ports: Vec::new(),
        user_agent: "vulnscan-test/0.1.0".to_string(),
    }
}

/// A target that writes every decoded query value back into the body,
/// one per line, without any escaping.
pub struct QueryEcho;

impl Respond for QueryEcho {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = request
            .url
            .query_pairs()
            .map(|(_, value)| value.into_owned())
            .collect::<Vec<_>>()
            .join("\n");
        ResponseTemplate::new(200).set_body_string(body)
    }
}

/// A localhost port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}
