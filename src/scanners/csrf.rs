// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - CSRF (Cross-Site Request Forgery) Scanner
 * Form-level checks for missing tokens, insecure actions and autocomplete
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */
use crate::http_client::{HttpClient, RequestOptions};
use crate::scanners::{Probe, ProbeReport, ScanContext};
use crate::types::{Finding, ScanMode, Severity, VulnType};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, info};

const CSRF_TIMEOUT_SECS: u64 = 10;

const SENSITIVE_FIELD_SELECTOR: &str =
    r#"input[type="password"], input[name*="card"], input[name*="ssn"], input[name*="credit"]"#;

pub struct CsrfScanner {
    http_client: Arc<HttpClient>,
}

impl CsrfScanner {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }

    /// Scan URL for CSRF vulnerabilities
    pub async fn scan(&self, url: &str, mode: ScanMode) -> Result<(Vec<Finding>, usize)> {
        info!("[CSRF] Scanning: {}", url);

        let mut vulnerabilities = Vec::new();

        match self
            .http_client
            .get_with(url, RequestOptions::new(CSRF_TIMEOUT_SECS))
            .await
        {
            Ok(response) => {
                self.analyze_forms(&response.body, url, mode, &mut vulnerabilities)?;
            }
            Err(e) => {
                debug!("Failed to fetch URL for CSRF check: {}", e);
            }
        }

        info!("[SUCCESS] [CSRF] Completed scan, found {} issues", vulnerabilities.len());
        Ok((vulnerabilities, 1))
    }

    fn analyze_forms(
        &self,
        html: &str,
        url: &str,
        mode: ScanMode,
        vulnerabilities: &mut Vec<Finding>,
    ) -> Result<()> {
        let form_selector = Selector::parse("form").map_err(|e| anyhow!("Invalid selector: {:?}", e))?;
        let input_selector = Selector::parse("input").map_err(|e| anyhow!("Invalid selector: {:?}", e))?;
        let sensitive_selector =
            Selector::parse(SENSITIVE_FIELD_SELECTOR).map_err(|e| anyhow!("Invalid selector: {:?}", e))?;

        let document = Html::parse_document(html);

        for form in document.select(&form_selector) {
            let method = form
                .value()
                .attr("method")
                .map(|m| m.to_lowercase())
                .unwrap_or_else(|| "get".to_string());
            let action = form.value().attr("action");

            let has_token_field = form.select(&input_selector).any(|input| {
                input
                    .value()
                    .attr("name")
                    .map(|name| {
                        let name = name.to_lowercase();
                        name.contains("csrf") || name.contains("token")
                    })
                    .unwrap_or(false)
            });

            if method == "post" && !has_token_field {
                vulnerabilities.push(
                    Finding::new(
                        VulnType::Csrf,
                        Severity::Medium,
                        "Missing CSRF Protection",
                        "A POST form was found without a visible CSRF token. This could allow Cross-Site Request Forgery attacks.",
                        "Implement CSRF tokens in all state-changing forms. Use the synchronizer token pattern or the double-submit cookie pattern.",
                    )
                    .with_url(url)
                    .with_evidence(format!(
                        "Form action: {}, method: {}",
                        action.unwrap_or("current page"),
                        method
                    )),
                );
            }

            if !mode.is_comprehensive() {
                continue;
            }

            if let Some(action) = action.filter(|a| a.starts_with("http://")) {
                vulnerabilities.push(
                    Finding::new(
                        VulnType::Csrf,
                        Severity::High,
                        "Form Submitted Over HTTP",
                        format!("A form submits data over insecure HTTP: {}", action),
                        "All forms should submit data over HTTPS to prevent interception.",
                    )
                    .with_url(url)
                    .with_evidence(format!("Form action: {}", action)),
                );
            }

            for input in form.select(&sensitive_selector) {
                let autocomplete = input.value().attr("autocomplete");
                if matches!(autocomplete, Some("off") | Some("new-password")) {
                    continue;
                }

                let field_name = input
                    .value()
                    .attr("name")
                    .or_else(|| input.value().attr("id"))
                    .unwrap_or("unknown");

                vulnerabilities.push(
                    Finding::new(
                        VulnType::Csrf,
                        Severity::Low,
                        "Sensitive Field with Autocomplete",
                        format!("Sensitive field \"{}\" allows autocomplete, which could expose data.", field_name),
                        "Disable autocomplete on sensitive fields using autocomplete=\"off\" or autocomplete=\"new-password\".",
                    )
                    .with_url(url)
                    .with_parameter(field_name)
                    .with_evidence(format!("Field: {}", field_name)),
                );
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Probe for CsrfScanner {
    async fn run(&self, ctx: &ScanContext<'_>) -> Result<ProbeReport> {
        let (findings, tests_run) = self.scan(ctx.target.as_str(), ctx.mode).await?;
        Ok(ProbeReport::findings(findings, tests_run))
    }
}
