// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - SQL Injection Scanner
 * Error-based and time-based detection over discovered URLs
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */
use crate::http_client::{HttpClient, HttpResponse, RequestOptions};
use crate::payloads::{self, Catalog};
use crate::scanners::{truncate_chars, with_query_param, Probe, ProbeReport, ScanContext};
use crate::types::{Finding, ScanMode, Severity, VulnType};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

const SQLI_TIMEOUT_SECS: u64 = 5;

const RECOMMENDATION: &str = "Use parameterized queries or prepared statements. Never concatenate user input directly into SQL queries. Implement input validation and use an ORM.";

pub struct SqliScanner {
    http_client: Arc<HttpClient>,
}

impl SqliScanner {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }

    /// Latency above which a time-delay payload counts as injected
    pub fn delay_threshold_ms(mode: ScanMode) -> u64 {
        if mode.is_comprehensive() {
            3000
        } else {
            2000
        }
    }

    /// Probe each URL; at most one finding per URL
    pub async fn scan<'a, I>(&self, urls: I, mode: ScanMode) -> Result<(Vec<Finding>, usize)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let urls: Vec<&str> = urls
            .into_iter()
            .take(payloads::injection_url_limit(mode))
            .collect();

        info!("[SQLi] Testing {} URLs", urls.len());

        let mut vulnerabilities = Vec::new();
        let mut tests_run = 0;

        for url in urls {
            let (finding, tests) = self.scan_url(url, mode).await;
            tests_run += tests;
            if let Some(finding) = finding {
                info!("[SQLi] Vulnerability found at {}", url);
                vulnerabilities.push(finding);
            }
        }

        info!(
            "[SUCCESS] [SQLi] Completed {} tests, found {} issues",
            tests_run,
            vulnerabilities.len()
        );

        Ok((vulnerabilities, tests_run))
    }

    /// Stops at the first parameter that yields a finding
    async fn scan_url(&self, url: &str, mode: ScanMode) -> (Option<Finding>, usize) {
        let mut tests_run = 0;

        for param in payloads::catalog(Catalog::SqliParameters, mode) {
            for payload in payloads::catalog(Catalog::SqliPayloads, mode) {
                let test_url = with_query_param(url, param, payload);
                tests_run += 1;

                let response = match self
                    .http_client
                    .get_with(&test_url, RequestOptions::new(SQLI_TIMEOUT_SECS))
                    .await
                {
                    Ok(response) => response,
                    Err(e) => {
                        debug!("[SQLi] Request failed for {}: {}", test_url, e);
                        continue;
                    }
                };

                if let Some(finding) = self.analyze_response(&response, url, param, payload, mode) {
                    return (Some(finding), tests_run);
                }
            }
        }

        (None, tests_run)
    }

    /// Error fingerprint first, then latency for time-delay payloads
    fn analyze_response(
        &self,
        response: &HttpResponse,
        url: &str,
        param: &str,
        payload: &str,
        mode: ScanMode,
    ) -> Option<Finding> {
        let body_lower = response.body.to_lowercase();

        if let Some(fingerprint) = payloads::match_sql_error(&body_lower) {
            return Some(
                Finding::new(
                    VulnType::SqlInjection,
                    Severity::Critical,
                    "SQL Injection Vulnerability Detected",
                    format!(
                        "The parameter \"{}\" appears to be vulnerable to SQL injection. Database error messages were detected in the response.",
                        param
                    ),
                    RECOMMENDATION,
                )
                .with_url(url)
                .with_parameter(param)
                .with_evidence(format!(
                    "Payload: {}... | Error pattern: {}",
                    truncate_chars(payload, 50),
                    fingerprint
                )),
            );
        }

        if response.duration_ms > Self::delay_threshold_ms(mode) && payloads::is_time_delay_payload(payload) {
            return Some(
                Finding::new(
                    VulnType::SqlInjection,
                    Severity::Critical,
                    "Time-Based SQL Injection Detected",
                    format!(
                        "The parameter \"{}\" appears to be vulnerable to time-based SQL injection.",
                        param
                    ),
                    RECOMMENDATION,
                )
                .with_url(url)
                .with_parameter(param)
                .with_evidence(format!(
                    "Response time: {}ms with time-delay payload",
                    response.duration_ms
                )),
            );
        }

        None
    }
}

#[async_trait]
impl Probe for SqliScanner {
    async fn run(&self, ctx: &ScanContext<'_>) -> Result<ProbeReport> {
        let (findings, tests_run) = self.scan(ctx.discovered.iter(), ctx.mode).await?;
        Ok(ProbeReport::findings(findings, tests_run))
    }
}
