// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Cookie Security Scanner
 * Audits Set-Cookie attributes on the target response
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */
use crate::http_client::{HttpClient, RequestOptions};
use crate::scanners::{Probe, ProbeReport, ScanContext};
use crate::types::{Finding, ScanMode, Severity, VulnType};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

const COOKIE_TIMEOUT_SECS: u64 = 10;
const ONE_YEAR_SECS: i64 = 31_536_000;

/// Parsed view of one Set-Cookie line
#[derive(Debug, Clone, PartialEq)]
pub struct CookieAttributes {
    pub name: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<String>,
    pub domain: Option<String>,
    pub max_age: Option<i64>,
}

impl CookieAttributes {
    pub fn parse(set_cookie: &str) -> Self {
        let mut parts = set_cookie.split(';');
        let name = parts
            .next()
            .and_then(|pair| pair.split('=').next())
            .unwrap_or_default()
            .trim()
            .to_string();

        let mut attributes = Self {
            name,
            http_only: false,
            secure: false,
            same_site: None,
            domain: None,
            max_age: None,
        };

        for part in parts {
            let (key, value) = match part.split_once('=') {
                Some((k, v)) => (k.trim().to_lowercase(), Some(v.trim().to_string())),
                None => (part.trim().to_lowercase(), None),
            };
            match key.as_str() {
                "httponly" => attributes.http_only = true,
                "secure" => attributes.secure = true,
                "samesite" => attributes.same_site = Some(value.unwrap_or_default()),
                "domain" => attributes.domain = value,
                "max-age" => attributes.max_age = value.and_then(|v| v.parse().ok()),
                _ => {}
            }
        }

        attributes
    }
}

pub struct CookieSecurityScanner {
    http_client: Arc<HttpClient>,
}

impl CookieSecurityScanner {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }

    pub async fn scan(&self, target: &Url, mode: ScanMode) -> Result<(Vec<Finding>, usize)> {
        info!("[Cookies] Scanning: {}", target);

        let mut vulnerabilities = Vec::new();

        match self
            .http_client
            .get_with(target.as_str(), RequestOptions::new(COOKIE_TIMEOUT_SECS).no_redirects())
            .await
        {
            Ok(response) => {
                for set_cookie in &response.set_cookies {
                    self.check_cookie(set_cookie, target, mode, &mut vulnerabilities);
                }
            }
            Err(e) => {
                debug!("Failed to fetch URL for cookie check: {}", e);
            }
        }

        info!("[SUCCESS] [Cookies] Completed scan, found {} issues", vulnerabilities.len());
        Ok((vulnerabilities, 1))
    }

    fn check_cookie(&self, set_cookie: &str, target: &Url, mode: ScanMode, vulnerabilities: &mut Vec<Finding>) {
        let cookie = CookieAttributes::parse(set_cookie);
        let https = target.scheme() == "https";

        if !cookie.http_only {
            vulnerabilities.push(self.create_vulnerability(
                target,
                Severity::Medium,
                "Missing HttpOnly Flag on Cookie",
                &cookie.name,
                format!(
                    "Cookie \"{}\" is missing the HttpOnly flag, making it accessible to JavaScript.",
                    cookie.name
                ),
                "Set the HttpOnly flag on all cookies to prevent XSS attacks from stealing cookie values.",
            ));
        }

        if https && !cookie.secure {
            vulnerabilities.push(self.create_vulnerability(
                target,
                Severity::High,
                "Missing Secure Flag on Cookie",
                &cookie.name,
                format!(
                    "Cookie \"{}\" is missing the Secure flag on an HTTPS site.",
                    cookie.name
                ),
                "Set the Secure flag on all cookies to ensure they are only sent over HTTPS.",
            ));
        }

        if cookie.same_site.is_none() {
            vulnerabilities.push(self.create_vulnerability(
                target,
                Severity::Medium,
                "Missing SameSite Attribute on Cookie",
                &cookie.name,
                format!(
                    "Cookie \"{}\" is missing the SameSite attribute, making it vulnerable to CSRF attacks.",
                    cookie.name
                ),
                "Set SameSite=Strict or SameSite=Lax on cookies to prevent CSRF attacks.",
            ));
        }

        if !mode.is_comprehensive() {
            return;
        }

        if let Some(domain) = cookie.domain.as_deref().filter(|d| d.starts_with('.')) {
            vulnerabilities.push(self.create_vulnerability(
                target,
                Severity::Low,
                "Cookie with Broad Domain Scope",
                &cookie.name,
                format!(
                    "Cookie \"{}\" is scoped to {}, which includes all subdomains.",
                    cookie.name, domain
                ),
                "Limit cookie domain scope to the specific domain that needs it.",
            ));
        }

        if let Some(max_age) = cookie.max_age.filter(|age| *age > ONE_YEAR_SECS) {
            vulnerabilities.push(self.create_vulnerability(
                target,
                Severity::Low,
                "Long-Lived Cookie",
                &cookie.name,
                format!(
                    "Cookie \"{}\" has a very long expiration time ({} days).",
                    cookie.name,
                    max_age / 86_400
                ),
                "Use shorter expiration times for cookies, especially for sensitive data.",
            ));
        }
    }

    fn create_vulnerability(
        &self,
        target: &Url,
        severity: Severity,
        title: &str,
        cookie_name: &str,
        description: String,
        recommendation: &str,
    ) -> Finding {
        Finding::new(VulnType::CookieSecurity, severity, title, description, recommendation)
            .with_url(target.as_str())
            .with_parameter(cookie_name)
    }
}

#[async_trait]
impl Probe for CookieSecurityScanner {
    async fn run(&self, ctx: &ScanContext<'_>) -> Result<ProbeReport> {
        let (findings, tests_run) = self.scan(ctx.target, ctx.mode).await?;
        Ok(ProbeReport::findings(findings, tests_run))
    }
}
