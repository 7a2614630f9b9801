// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Information Disclosure Scanner
 * Requests well-known sensitive files relative to the target origin
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::http_client::{HttpClient, RequestOptions};
use crate::payloads::{self, Catalog};
use crate::scanners::{Probe, ProbeReport, ScanContext};
use crate::types::{Finding, ScanMode, Severity, VulnType};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

const DISCLOSURE_TIMEOUT_SECS: u64 = 3;

pub struct InformationDisclosureScanner {
    http_client: Arc<HttpClient>,
}

impl InformationDisclosureScanner {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }

    pub async fn scan(&self, target: &Url, mode: ScanMode) -> Result<(Vec<Finding>, usize)> {
        info!("[InfoDisclosure] Scanning: {}", target);

        let origin = target.origin().ascii_serialization();
        let mut vulnerabilities = Vec::new();
        let mut tests_run = 0;

        for file in payloads::catalog(Catalog::SensitiveFiles, mode) {
            let file_url = format!("{}/{}", origin, file);
            tests_run += 1;

            match self
                .http_client
                .get_with(&file_url, RequestOptions::new(DISCLOSURE_TIMEOUT_SECS))
                .await
            {
                Ok(response) if response.status_code == 200 && !response.body.is_empty() => {
                    info!("[InfoDisclosure] Exposed file: {}", file_url);
                    vulnerabilities.push(
                        Finding::new(
                            VulnType::InformationDisclosure,
                            severity_for(file),
                            "Sensitive File Exposed",
                            format!("The file \"{}\" is publicly accessible and may contain sensitive information.", file),
                            "Remove sensitive files from the web root or restrict access using server configuration.",
                        )
                        .with_url(file_url.as_str())
                        .with_evidence(format!("HTTP 200 - File size: {} bytes", response.body.len())),
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("[InfoDisclosure] Request failed for {}: {}", file_url, e);
                }
            }
        }

        info!(
            "[SUCCESS] [InfoDisclosure] Completed {} tests, found {} issues",
            tests_run,
            vulnerabilities.len()
        );

        Ok((vulnerabilities, tests_run))
    }
}

/// Database dumps and env files are critical, anything else high
fn severity_for(path: &str) -> Severity {
    if path.contains(".sql") || path.contains(".env") {
        Severity::Critical
    } else {
        Severity::High
    }
}

#[async_trait]
impl Probe for InformationDisclosureScanner {
    async fn run(&self, ctx: &ScanContext<'_>) -> Result<ProbeReport> {
        let (findings, tests_run) = self.scan(ctx.target, ctx.mode).await?;
        Ok(ProbeReport::findings(findings, tests_run))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_for_path() {
        assert_eq!(severity_for(".env"), Severity::Critical);
        assert_eq!(severity_for(".env.backup"), Severity::Critical);
        assert_eq!(severity_for("dump.sql"), Severity::Critical);
        assert_eq!(severity_for(".git/config"), Severity::High);
        assert_eq!(severity_for("phpinfo.php"), Severity::High);
    }
}
