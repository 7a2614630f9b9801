// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Security Headers Scanner
 * Tests for missing HTTP security headers and server banner disclosure
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */
use crate::http_client::{HttpClient, HttpResponse, RequestOptions};
use crate::scanners::{Probe, ProbeReport, ScanContext};
use crate::types::{Finding, ScanMode, Severity, VulnType};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

const HEADER_TIMEOUT_SECS: u64 = 10;

/// (header, display name) checked in every mode
const BASELINE_HEADERS: &[(&str, &str)] = &[
    ("strict-transport-security", "HSTS"),
    ("x-frame-options", "X-Frame-Options"),
    ("x-content-type-options", "X-Content-Type-Options"),
    ("x-xss-protection", "X-XSS-Protection"),
    ("content-security-policy", "Content-Security-Policy"),
    ("referrer-policy", "Referrer-Policy"),
    ("permissions-policy", "Permissions-Policy"),
];

/// Cross-origin isolation headers, comprehensive mode only
const ISOLATION_HEADERS: &[(&str, &str)] = &[
    ("cross-origin-embedder-policy", "Cross-Origin-Embedder-Policy"),
    ("cross-origin-opener-policy", "Cross-Origin-Opener-Policy"),
    ("cross-origin-resource-policy", "Cross-Origin-Resource-Policy"),
];

pub struct SecurityHeadersScanner {
    http_client: Arc<HttpClient>,
}

impl SecurityHeadersScanner {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }

    /// Scan URL for missing security headers
    pub async fn scan(&self, url: &str, mode: ScanMode) -> Result<(Vec<Finding>, usize)> {
        info!("[Security Headers] Scanning: {}", url);

        let mut vulnerabilities = Vec::new();
        let tests_run = 1;

        match self
            .http_client
            .get_with(url, RequestOptions::new(HEADER_TIMEOUT_SECS).no_redirects())
            .await
        {
            Ok(response) => {
                self.check_headers(&response, url, mode, &mut vulnerabilities);
                self.check_server_banner(&response, url, &mut vulnerabilities);
            }
            Err(e) => {
                debug!("Failed to fetch URL for header check: {}", e);
            }
        }

        info!(
            "[SUCCESS] [Security Headers] Completed scan, found {} issues",
            vulnerabilities.len()
        );

        Ok((vulnerabilities, tests_run))
    }

    /// Headers expected for the mode, in reporting order
    pub fn expected_headers(mode: ScanMode) -> Vec<(&'static str, &'static str)> {
        let mut headers = BASELINE_HEADERS.to_vec();
        if mode.is_comprehensive() {
            headers.extend_from_slice(ISOLATION_HEADERS);
        }
        headers
    }

    fn check_headers(&self, response: &HttpResponse, url: &str, mode: ScanMode, vulnerabilities: &mut Vec<Finding>) {
        for (header, name) in Self::expected_headers(mode) {
            if response.has_header(header) {
                continue;
            }

            let severity = if header == "content-security-policy" {
                Severity::High
            } else {
                Severity::Medium
            };

            vulnerabilities.push(
                Finding::new(
                    VulnType::SecurityHeaders,
                    severity,
                    format!("Missing {} Header", name),
                    format!(
                        "The {} security header is not set. This header helps protect against various attacks.",
                        name
                    ),
                    format!("Add the {} header to your server configuration. Example: {}", name, example_value(header)),
                )
                .with_url(url),
            );
        }
    }

    fn check_server_banner(&self, response: &HttpResponse, url: &str, vulnerabilities: &mut Vec<Finding>) {
        if let Some(server) = response.header("server") {
            vulnerabilities.push(
                Finding::new(
                    VulnType::ServerConfiguration,
                    Severity::Low,
                    "Server Header Information Disclosure",
                    format!("The server header reveals: {}", server),
                    "Remove or obfuscate the Server header to prevent information disclosure.",
                )
                .with_url(url)
                .with_evidence(format!("Server: {}", server)),
            );
        }
    }
}

fn example_value(header: &str) -> &'static str {
    match header {
        "strict-transport-security" => "max-age=31536000; includeSubDomains",
        "x-frame-options" => "DENY",
        "x-content-type-options" => "nosniff",
        "x-xss-protection" => "1; mode=block",
        "content-security-policy" => "default-src 'self'",
        "referrer-policy" => "strict-origin-when-cross-origin",
        "permissions-policy" => "geolocation=(), microphone=()",
        _ => "See security best practices",
    }
}

#[async_trait]
impl Probe for SecurityHeadersScanner {
    async fn run(&self, ctx: &ScanContext<'_>) -> Result<ProbeReport> {
        let (findings, tests_run) = self.scan(ctx.target.as_str(), ctx.mode).await?;
        Ok(ProbeReport::findings(findings, tests_run))
    }
}
