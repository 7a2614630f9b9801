// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - CORS Policy Scanner
 * Checks cross-origin isolation and Access-Control response headers
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

const CORS_TIMEOUT_SECS: u64 = 10;

const ISOLATION_POLICIES: &[(&str, &str)] = &[
    ("cross-origin-embedder-policy", "Cross-Origin-Embedder-Policy"),
    ("cross-origin-opener-policy", "Cross-Origin-Opener-Policy"),
    ("cross-origin-resource-policy", "Cross-Origin-Resource-Policy"),
];

pub struct CorsScanner {
    http_client: Arc<HttpClient>,
}

impl CorsScanner {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }

    /// Scan URL for CORS misconfigurations
    pub async fn scan(&self, url: &str, mode: ScanMode) -> Result<(Vec<Finding>, usize)> {
        info!("[CORS] Scanning: {}", url);

        let mut vulnerabilities = Vec::new();

        match self
            .http_client
            .get_with(url, RequestOptions::new(CORS_TIMEOUT_SECS).no_redirects())
            .await
        {
            Ok(response) => {
                self.check_isolation_policies(&response, url, &mut vulnerabilities);
                if mode.is_comprehensive() {
                    self.check_access_control(&response, url, &mut vulnerabilities);
                }
            }
            Err(e) => {
                debug!("Failed to fetch URL for CORS check: {}", e);
            }
        }

        info!("[SUCCESS] [CORS] Completed scan, found {} issues", vulnerabilities.len());
        Ok((vulnerabilities, 1))
    }

    fn check_isolation_policies(&self, response: &HttpResponse, url: &str, vulnerabilities: &mut Vec<Finding>) {
        for (header, name) in ISOLATION_POLICIES {
            if response.has_header(header) {
                continue;
            }
            vulnerabilities.push(
                Finding::new(
                    VulnType::CorsPolicy,
                    Severity::Medium,
                    format!("Missing {}", name),
                    format!("The {} header is not configured.", name),
                    format!("Configure {} to enhance cross-origin isolation.", name),
                )
                .with_url(url),
            );
        }
    }

    fn check_access_control(&self, response: &HttpResponse, url: &str, vulnerabilities: &mut Vec<Finding>) {
        let allow_origin = response.header("access-control-allow-origin");
        let allow_credentials = response.header("access-control-allow-credentials");

        if allow_origin.as_deref() == Some("*") {
            vulnerabilities.push(
                Finding::new(
                    VulnType::CorsPolicy,
                    Severity::High,
                    "Wildcard CORS Policy",
                    "The server allows requests from any origin (Access-Control-Allow-Origin: *).",
                    "Restrict CORS to specific trusted origins instead of using wildcard.",
                )
                .with_url(url)
                .with_evidence("Access-Control-Allow-Origin: *"),
            );

            if allow_credentials.as_deref() == Some("true") {
                vulnerabilities.push(
                    Finding::new(
                        VulnType::CorsPolicy,
                        Severity::Critical,
                        "Dangerous CORS Configuration",
                        "Wildcard origin combined with credentials allowed creates a severe security risk.",
                        "Never combine Access-Control-Allow-Origin: * with Access-Control-Allow-Credentials: true.",
                    )
                    .with_url(url)
                    .with_evidence("Access-Control-Allow-Origin: *, Access-Control-Allow-Credentials: true"),
                );
            }
        }

        if let Some(methods) = response.header("access-control-allow-methods") {
            if methods.contains('*') {
                vulnerabilities.push(
                    Finding::new(
                        VulnType::CorsPolicy,
                        Severity::Medium,
                        "Permissive CORS Methods",
                        "All HTTP methods are allowed for cross-origin requests.",
                        "Limit allowed methods to only those required (e.g., GET, POST).",
                    )
                    .with_url(url)
                    .with_evidence(format!("Access-Control-Allow-Methods: {}", methods)),
                );
            }
        }
    }
}

#[async_trait]
impl Probe for CorsScanner {
    async fn run(&self, ctx: &ScanContext<'_>) -> Result<ProbeReport> {
        let (findings, tests_run) = self.scan(ctx.target.as_str(), ctx.mode).await?;
        Ok(ProbeReport::findings(findings, tests_run))
    }
}
