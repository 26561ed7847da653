// src/core/scanner/ssl_scanner.rs

use super::{Probe, ProbeContext};
use crate::core::models::{Finding, VulnerabilityKind};
use crate::core::target::Target;
use crate::errors::{Result, ScanError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use native_tls::{HandshakeError, TlsConnector};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant as StdInstant};
use tokio::net::lookup_host;
use tokio::task::spawn_blocking;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use x509_parser::prelude::*;

/// Certificates expiring within this many days are reported.
pub const EXPIRY_WARNING_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct CertificateInfo {
    pub subject_name: String,
    pub issuer_name: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

/// What the handshake told us about the peer certificate.
#[derive(Debug, Clone)]
pub struct TlsObservation {
    pub certificate: CertificateInfo,
    /// Set when a verifying handshake refused the certificate.
    pub rejection: Option<String>,
}

/// Only https targets carry a certificate worth checking.
pub struct TlsCertificateProbe;

#[async_trait]
impl Probe for TlsCertificateProbe {
    fn name(&self) -> &'static str {
        "tls_certificate"
    }

    fn applies_to(&self, target: &Target) -> bool {
        target.is_https()
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Vec<Finding>> {
        let host = ctx.target.host().to_string();
        let remaining = ctx.client.deadline().saturating_duration_since(Instant::now());
        let limit = ctx.config.request_timeout.min(remaining);
        info!(host = %host, port = ctx.target.port(), "Starting TLS certificate check.");
        if limit.is_zero() {
            return Err(ScanError::Timeout { url: ctx.target.to_string(), after: limit });
        }
        let until = Instant::now() + limit;

        let addr = match tokio::time::timeout_at(until, resolve(&ctx.target)).await {
            Ok(addr) => addr?,
            Err(_) => return Err(ScanError::Timeout { url: ctx.target.to_string(), after: limit }),
        };

        // native-tls is blocking, so the handshake runs on its own thread.
        // `DeadlineStream` stops that thread at `until` even if we stop waiting.
        debug!(%addr, "Spawning blocking task for TLS connection.");
        let until_std = until.into_std();
        let task = spawn_blocking(move || inspect_certificate(addr, &host, until_std, limit));
        let observation = match tokio::time::timeout_at(until, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => {
                error!(panic = %e, "Blocking TLS task panicked!");
                return Err(ScanError::Tls(format!("task panicked: {}", e)));
            }
            Err(_) => {
                return Err(ScanError::Timeout {
                    url: ctx.target.to_string(),
                    after: limit,
                });
            }
        };

        let findings = analyze_certificate(&observation, Utc::now());
        info!(findings = findings.len(), "TLS certificate check finished.");
        Ok(findings)
    }
}

/// First socket address for the target, resolved on the async runtime.
async fn resolve(target: &Target) -> Result<SocketAddr> {
    let host = target.host();
    lookup_host((host, target.port()))
        .await
        .map_err(|e| ScanError::Network(format!("DNS resolution failed: {}", e)))?
        .next()
        .ok_or_else(|| ScanError::Network(format!("no address for {}", host)))
}

/// Verifying handshake first. If that refuses the certificate, a second,
/// non-verifying handshake fetches it anyway so its dates can be read.
/// Both handshakes together never run past `until`.
fn inspect_certificate(
    addr: SocketAddr,
    server_name: &str,
    until: StdInstant,
    limit: Duration,
) -> Result<TlsObservation> {
    let strict = TlsConnector::new()?;
    match handshake(&strict, addr, server_name, until, limit) {
        Ok(der) => Ok(TlsObservation { certificate: parse_certificate(&der)?, rejection: None }),
        Err(Handshake::Rejected(reason)) => {
            warn!(server_name, reason = %reason, "Verifying handshake refused the certificate.");
            let lenient = TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()?;
            match handshake(&lenient, addr, server_name, until, limit) {
                Ok(der) => Ok(TlsObservation {
                    certificate: parse_certificate(&der)?,
                    rejection: Some(reason),
                }),
                Err(Handshake::Rejected(e)) => Err(ScanError::Tls(e)),
                Err(Handshake::Failed(e)) => Err(e),
            }
        }
        Err(Handshake::Failed(e)) => Err(e),
    }
}

enum Handshake {
    /// The TLS layer itself refused to proceed.
    Rejected(String),
    /// We never got as far as TLS.
    Failed(ScanError),
}

fn handshake(
    connector: &TlsConnector,
    addr: SocketAddr,
    server_name: &str,
    until: StdInstant,
    limit: Duration,
) -> std::result::Result<Vec<u8>, Handshake> {
    let timed_out = || Handshake::Failed(ScanError::Timeout { url: server_name.to_string(), after: limit });
    let remaining = until.saturating_duration_since(StdInstant::now());
    if remaining.is_zero() {
        return Err(timed_out());
    }

    debug!(%addr, "Connecting TCP stream.");
    let stream = TcpStream::connect_timeout(&addr, remaining)
        .map_err(|e| Handshake::Failed(io_error(e, server_name, limit)))?;

    debug!(server_name, "Performing TLS handshake.");
    let tls = match connector.connect(server_name, DeadlineStream { inner: stream, until }) {
        Ok(s) => s,
        Err(HandshakeError::Failure(_)) if StdInstant::now() >= until => return Err(timed_out()),
        Err(HandshakeError::Failure(e)) => return Err(Handshake::Rejected(e.to_string())),
        Err(HandshakeError::WouldBlock(_)) => return Err(timed_out()),
    };

    match tls.peer_certificate() {
        Ok(Some(cert)) => cert.to_der().map_err(|e| Handshake::Failed(e.into())),
        Ok(None) => Err(Handshake::Failed(ScanError::Tls("server did not present a certificate".to_string()))),
        Err(e) => Err(Handshake::Failed(e.into())),
    }
}

/// A socket whose every read and write is cut off at a fixed instant,
/// so a peer trickling bytes cannot keep the handshake thread alive.
#[derive(Debug)]
struct DeadlineStream {
    inner: TcpStream,
    until: StdInstant,
}

impl DeadlineStream {
    fn remaining(&self) -> io::Result<Duration> {
        let remaining = self.until.saturating_duration_since(StdInstant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "TLS handshake deadline passed"));
        }
        Ok(remaining)
    }
}

impl Read for DeadlineStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining()?;
        self.inner.set_read_timeout(Some(remaining))?;
        self.inner.read(buf)
    }
}

impl Write for DeadlineStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = self.remaining()?;
        self.inner.set_write_timeout(Some(remaining))?;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn io_error(e: io::Error, host: &str, limit: Duration) -> ScanError {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
            ScanError::Timeout { url: host.to_string(), after: limit }
        }
        _ => ScanError::Network(format!("TCP connection error: {}", e)),
    }
}

fn parse_certificate(der: &[u8]) -> Result<CertificateInfo> {
    let (_, x509) = parse_x509_certificate(der).map_err(|e| {
        error!(error = %e, "Failed to parse X.509 certificate");
        ScanError::Tls(format!("X.509 parse error: {}", e))
    })?;

    info!(subject = %x509.subject(), issuer = %x509.issuer(), "Successfully parsed certificate.");
    let validity = x509.validity();
    Ok(CertificateInfo {
        subject_name: x509.subject().to_string(),
        issuer_name: x509.issuer().to_string(),
        not_before: asn1_time_to_chrono_utc(&validity.not_before),
        not_after: asn1_time_to_chrono_utc(&validity.not_after),
    })
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}

/// Whole days left before `not_after`, rounded up: any part of a day counts.
fn days_until(not_after: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    const MS_PER_DAY: i64 = 86_400_000;
    let ms = not_after.signed_duration_since(now).num_milliseconds();
    (ms + MS_PER_DAY - 1).div_euclid(MS_PER_DAY)
}

/// Pure analysis of a handshake observation at instant `now`.
pub fn analyze_certificate(observation: &TlsObservation, now: DateTime<Utc>) -> Vec<Finding> {
    let cert = &observation.certificate;
    let mut findings = Vec::new();

    if let Some(reason) = &observation.rejection {
        findings.push(
            Finding::new(VulnerabilityKind::TlsCertificate, "SSL/TLS certificate is invalid")
                .with_evidence(format!("{} (issuer: {})", reason, cert.issuer_name)),
        );
    }

    if now >= cert.not_after {
        debug!(expiry_date = %cert.not_after, "Certificate is expired.");
        findings.push(
            Finding::new(VulnerabilityKind::TlsCertificate, "SSL/TLS certificate has expired")
                .with_evidence(format!("notAfter {}", cert.not_after)),
        );
    } else if now < cert.not_before {
        findings.push(
            Finding::new(VulnerabilityKind::TlsCertificate, "SSL/TLS certificate is not yet valid")
                .with_evidence(format!("notBefore {}", cert.not_before)),
        );
    } else {
        let days_left = days_until(cert.not_after, now);
        if days_left <= EXPIRY_WARNING_DAYS {
            debug!(days_left, "Certificate is expiring soon.");
            let unit = if days_left == 1 { "day" } else { "days" };
            findings.push(
                Finding::new(
                    VulnerabilityKind::TlsCertificate,
                    format!("SSL/TLS certificate expires in {} {}", days_left, unit),
                )
                .with_evidence(format!("subject {} notAfter {}", cert.subject_name, cert.not_after)),
            );
        }
    }
    findings
}
