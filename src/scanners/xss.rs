// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Reflected XSS Scanner
 * Detects payload reflection in discovered URLs
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

const XSS_TIMEOUT_SECS: u64 = 3;

/// Outcome of checking one response for a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reflection {
    Raw,
    Encoded,
    None,
}

pub struct XssScanner {
    http_client: Arc<HttpClient>,
}

impl XssScanner {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }

    pub async fn scan<'a, I>(&self, urls: I, mode: ScanMode) -> Result<(Vec<Finding>, usize)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let urls: Vec<&str> = urls
            .into_iter()
            .take(payloads::injection_url_limit(mode))
            .collect();

        info!("[XSS] Testing {} URLs", urls.len());

        let mut vulnerabilities = Vec::new();
        let mut tests_run = 0;

        for url in urls {
            tests_run += self.scan_url(url, mode, &mut vulnerabilities).await;
        }

        info!(
            "[SUCCESS] [XSS] Completed {} tests, found {} issues",
            tests_run,
            vulnerabilities.len()
        );

        Ok((vulnerabilities, tests_run))
    }

    /// A raw reflection ends the URL; encoded reflections are noted and iteration goes on
    async fn scan_url(&self, url: &str, mode: ScanMode, vulnerabilities: &mut Vec<Finding>) -> usize {
        let mut tests_run = 0;

        for param in payloads::catalog(Catalog::XssParameters, mode) {
            for payload in payloads::catalog(Catalog::XssPayloads, mode) {
                let test_url = with_query_param(url, param, payload);
                tests_run += 1;

                let response = match self
                    .http_client
                    .get_with(&test_url, RequestOptions::new(XSS_TIMEOUT_SECS))
                    .await
                {
                    Ok(response) => response,
                    Err(e) => {
                        debug!("[XSS] Request failed for {}: {}", test_url, e);
                        continue;
                    }
                };

                match check_reflection(&response, payload) {
                    Reflection::Raw => {
                        info!("[XSS] Unescaped reflection of {} at {}", param, url);
                        vulnerabilities.push(
                            Finding::new(
                                VulnType::Xss,
                                Severity::High,
                                "Reflected XSS Vulnerability Detected",
                                format!(
                                    "The parameter \"{}\" reflects user input without proper encoding, allowing XSS attacks.",
                                    param
                                ),
                                "Encode all user input before rendering in HTML. Use Content-Security-Policy headers. Implement input validation and output encoding.",
                            )
                            .with_url(url)
                            .with_parameter(*param)
                            .with_evidence(format!(
                                "Payload was reflected unescaped: {}",
                                truncate_chars(payload, 80)
                            )),
                        );
                        return tests_run;
                    }
                    Reflection::Encoded => {
                        vulnerabilities.push(
                            Finding::new(
                                VulnType::Xss,
                                Severity::Low,
                                "Input Reflection with HTML Encoding",
                                format!(
                                    "The parameter \"{}\" reflects user input with HTML encoding. While encoded, this should be reviewed.",
                                    param
                                ),
                                "Ensure consistent encoding across all contexts (HTML, JavaScript, URL, CSS).",
                            )
                            .with_url(url)
                            .with_parameter(*param)
                            .with_evidence("Encoded payload found in response"),
                        );
                    }
                    Reflection::None => {}
                }
            }
        }

        tests_run
    }
}

fn check_reflection(response: &HttpResponse, payload: &str) -> Reflection {
    if response.contains(payload) {
        return Reflection::Raw;
    }
    let encoded = payload.replace('<', "&lt;").replace('>', "&gt;");
    if encoded != payload && response.contains(&encoded) {
        return Reflection::Encoded;
    }
    Reflection::None
}

#[async_trait]
impl Probe for XssScanner {
    async fn run(&self, ctx: &ScanContext<'_>) -> Result<ProbeReport> {
        let (findings, tests_run) = self.scan(ctx.discovered.iter(), ctx.mode).await?;
        Ok(ProbeReport::findings(findings, tests_run))
    }
}
