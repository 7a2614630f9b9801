// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - SSL/TLS Scanner
 * Transport security, certificate validity and negotiated parameters
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */
use crate::scanners::{Probe, ProbeReport, ScanContext};
use crate::tls_inspector::{TlsFault, TlsProbe, TlsSession};
use crate::types::{Finding, ScanMode, Severity, VulnType};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

const DEPRECATED_PROTOCOLS: &[&str] = &["SSLv2", "SSLv3", "TLSv1", "TLSv1.1"];
const WEAK_CIPHER_MARKERS: &[&str] = &["RC4", "DES", "3DES", "MD5", "NULL", "EXPORT", "anon"];
const FORWARD_SECRECY_MARKERS: &[&str] = &["ECDHE", "DHE"];
const EXPIRY_WARNING_DAYS: i64 = 30;

pub struct TlsScanner {
    tls_probe: Arc<dyn TlsProbe>,
}

impl TlsScanner {
    pub fn new(tls_probe: Arc<dyn TlsProbe>) -> Self {
        Self { tls_probe }
    }

    pub async fn scan(&self, target: &Url, mode: ScanMode) -> Result<(Vec<Finding>, usize)> {
        info!("[TLS] Scanning: {}", target);

        let mut vulnerabilities = Vec::new();

        if target.scheme() != "https" {
            vulnerabilities.push(
                Finding::new(
                    VulnType::Tls,
                    Severity::Critical,
                    "Insecure HTTP Protocol",
                    "The website is not using HTTPS encryption. All data transmitted between the client and server can be intercepted.",
                    "Implement HTTPS with a valid SSL/TLS certificate. Redirect all HTTP traffic to HTTPS.",
                )
                .with_url(target.as_str()),
            );
            return Ok((vulnerabilities, 0));
        }

        let host = target.host_str().unwrap_or_default().to_string();
        let port = target.port_or_known_default().unwrap_or(443);

        match self.tls_probe.handshake(&host, port).await {
            Ok(session) => {
                self.check_session(&session, target, mode, Utc::now(), &mut vulnerabilities);
            }
            Err(fault) => {
                self.check_fault(&fault, target, &mut vulnerabilities);
            }
        }

        info!("[SUCCESS] [TLS] Completed scan, found {} issues", vulnerabilities.len());
        Ok((vulnerabilities, 1))
    }

    fn check_session(
        &self,
        session: &TlsSession,
        target: &Url,
        mode: ScanMode,
        now: DateTime<Utc>,
        vulnerabilities: &mut Vec<Finding>,
    ) {
        let url = target.as_str();
        let mut expiry_reported = false;

        if let Some(cert) = &session.certificate {
            if cert.not_after < now {
                expiry_reported = true;
                vulnerabilities.push(
                    Finding::new(
                        VulnType::Tls,
                        Severity::Critical,
                        "Expired SSL Certificate",
                        format!("The SSL certificate expired on {}", cert.not_after.format("%Y-%m-%d %H:%M:%S UTC")),
                        "Renew the SSL certificate immediately.",
                    )
                    .with_url(url),
                );
            }
        }

        match &session.verification_fault {
            Some(TlsFault::CertificateExpired(_)) if expiry_reported => {}
            Some(fault) => self.check_fault(fault, target, vulnerabilities),
            None => {}
        }

        if !mode.is_comprehensive() {
            return;
        }

        if let Some(protocol) = session.protocol.as_deref() {
            if DEPRECATED_PROTOCOLS.contains(&protocol) {
                vulnerabilities.push(
                    Finding::new(
                        VulnType::Tls,
                        Severity::High,
                        "Weak SSL/TLS Protocol",
                        format!("The server supports {}, which is deprecated and insecure.", protocol),
                        "Disable SSLv2, SSLv3, TLS 1.0, and TLS 1.1. Use TLS 1.2 or TLS 1.3 only.",
                    )
                    .with_url(url)
                    .with_evidence(format!("Protocol: {}", protocol)),
                );
            }
        }

        if let Some(cipher) = session.cipher.as_deref() {
            if WEAK_CIPHER_MARKERS.iter().any(|marker| cipher.contains(marker)) {
                vulnerabilities.push(
                    Finding::new(
                        VulnType::Tls,
                        Severity::High,
                        "Weak Cipher Suite",
                        format!("The server uses a weak cipher: {}", cipher),
                        "Configure the server to use only strong cipher suites (AES-GCM, ChaCha20).",
                    )
                    .with_url(url)
                    .with_evidence(format!("Cipher: {}", cipher)),
                );
            }

            if !FORWARD_SECRECY_MARKERS.iter().any(|marker| cipher.contains(marker)) {
                vulnerabilities.push(
                    Finding::new(
                        VulnType::Tls,
                        Severity::Medium,
                        "Missing Perfect Forward Secrecy",
                        "The cipher suite does not support Perfect Forward Secrecy.",
                        "Use cipher suites with ECDHE or DHE key exchange for forward secrecy.",
                    )
                    .with_url(url)
                    .with_evidence(format!("Cipher: {}", cipher)),
                );
            }
        }

        if let Some(cert) = &session.certificate {
            if cert.subject_cn.is_some() && cert.issuer_cn == cert.subject_cn {
                vulnerabilities.push(
                    Finding::new(
                        VulnType::Tls,
                        Severity::High,
                        "Self-Signed Certificate",
                        "The SSL certificate is self-signed and not trusted by browsers.",
                        "Obtain a certificate from a trusted Certificate Authority (CA).",
                    )
                    .with_url(url),
                );
            }

            let days_remaining = (cert.not_after - now).num_days();
            if days_remaining > 0 && days_remaining <= EXPIRY_WARNING_DAYS {
                vulnerabilities.push(
                    Finding::new(
                        VulnType::Tls,
                        Severity::Medium,
                        "Certificate Expiring Soon",
                        format!("The SSL certificate will expire in {} days.", days_remaining),
                        "Renew the SSL certificate before it expires.",
                    )
                    .with_url(url),
                );
            }
        }
    }

    /// Expired and untrusted certificates are reported, anything else is dropped
    fn check_fault(&self, fault: &TlsFault, target: &Url, vulnerabilities: &mut Vec<Finding>) {
        match fault {
            TlsFault::CertificateExpired(_) => {
                vulnerabilities.push(
                    Finding::new(
                        VulnType::Tls,
                        Severity::Critical,
                        "Expired SSL Certificate",
                        "The SSL certificate has expired.",
                        "Renew the SSL certificate immediately.",
                    )
                    .with_url(target.as_str()),
                );
            }
            TlsFault::UntrustedChain(reason) => {
                vulnerabilities.push(
                    Finding::new(
                        VulnType::Tls,
                        Severity::High,
                        "Certificate Validation Error",
                        "The SSL certificate chain cannot be verified.",
                        "Ensure the certificate chain is complete and properly configured.",
                    )
                    .with_url(target.as_str())
                    .with_evidence(reason.as_str()),
                );
            }
            TlsFault::Other(reason) => {
                debug!("[TLS] Handshake with {} failed: {}", target, reason);
            }
        }
    }
}

#[async_trait]
impl Probe for TlsScanner {
    async fn run(&self, ctx: &ScanContext<'_>) -> Result<ProbeReport> {
        let (findings, tests_run) = self.scan(ctx.target, ctx.mode).await?;
        Ok(ProbeReport::findings(findings, tests_run))
    }
}
