// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Server Misconfiguration Scanner
 * Directory listing, exposed admin interfaces and leftover backup files
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
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

const LISTING_TIMEOUT_SECS: u64 = 5;
const ADMIN_TIMEOUT_SECS: u64 = 3;
const BACKUP_TIMEOUT_SECS: u64 = 3;

const LISTING_SIGNATURES: &[&str] = &["Index of", "Directory listing"];

pub struct MisconfigurationScanner {
    http_client: Arc<HttpClient>,
}

impl MisconfigurationScanner {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }

    pub async fn scan(&self, target: &Url, mode: ScanMode) -> Result<(Vec<Finding>, usize)> {
        info!("[Misconfig] Scanning: {}", target);

        let mut vulnerabilities = Vec::new();
        let mut tests_run = 0;

        tests_run += self.check_directory_listing(target, mode, &mut vulnerabilities).await;

        if mode.is_comprehensive() {
            tests_run += self.check_admin_interfaces(target, &mut vulnerabilities).await;
            tests_run += self.check_backup_files(target, &mut vulnerabilities).await;
        }

        info!(
            "[SUCCESS] [Misconfig] Completed {} tests, found {} issues",
            tests_run,
            vulnerabilities.len()
        );

        Ok((vulnerabilities, tests_run))
    }

    async fn check_directory_listing(&self, target: &Url, mode: ScanMode, vulnerabilities: &mut Vec<Finding>) -> usize {
        let base = target.as_str().trim_end_matches('/');
        let mut tests_run = 0;

        for path in payloads::catalog(Catalog::DirectoryListingPaths, mode) {
            let url = if path.is_empty() {
                target.to_string()
            } else {
                format!("{}/{}", base, path)
            };
            tests_run += 1;

            match self
                .http_client
                .get_with(&url, RequestOptions::new(LISTING_TIMEOUT_SECS))
                .await
            {
                Ok(response) => {
                    if LISTING_SIGNATURES.iter().any(|sig| response.contains(sig)) {
                        vulnerabilities.push(
                            Finding::new(
                                VulnType::ServerConfiguration,
                                Severity::Medium,
                                "Directory Listing Enabled",
                                "Directory listing is enabled, exposing file structure.",
                                "Disable directory listing in your web server configuration.",
                            )
                            .with_url(url.as_str()),
                        );
                    }
                }
                Err(e) => {
                    debug!("[Misconfig] Request failed for {}: {}", url, e);
                }
            }
        }

        tests_run
    }

    async fn check_admin_interfaces(&self, target: &Url, vulnerabilities: &mut Vec<Finding>) -> usize {
        let mut tests_run = 0;

        for path in payloads::catalog(Catalog::AdminPaths, ScanMode::Comprehensive) {
            let Ok(admin_url) = target.join(path) else {
                continue;
            };
            tests_run += 1;

            match self
                .http_client
                .get_with(admin_url.as_str(), RequestOptions::new(ADMIN_TIMEOUT_SECS).no_redirects())
                .await
            {
                Ok(response) if matches!(response.status_code, 200 | 401 | 403) => {
                    vulnerabilities.push(
                        Finding::new(
                            VulnType::ServerConfiguration,
                            Severity::Low,
                            "Exposed Admin Interface",
                            format!("An admin interface was found at {}", path),
                            "Restrict access to admin interfaces using IP whitelisting or VPN.",
                        )
                        .with_url(admin_url.as_str())
                        .with_evidence(format!("HTTP {}", response.status_code)),
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("[Misconfig] Request failed for {}: {}", admin_url, e);
                }
            }
        }

        tests_run
    }

    async fn check_backup_files(&self, target: &Url, vulnerabilities: &mut Vec<Finding>) -> usize {
        let mut tests_run = 0;

        for name in payloads::catalog(Catalog::BackupFiles, ScanMode::Comprehensive) {
            let Ok(backup_url) = target.join(name) else {
                continue;
            };
            tests_run += 1;

            match self
                .http_client
                .head_with(backup_url.as_str(), RequestOptions::new(BACKUP_TIMEOUT_SECS))
                .await
            {
                Ok(response) if response.status_code == 200 => {
                    vulnerabilities.push(
                        Finding::new(
                            VulnType::ServerConfiguration,
                            Severity::High,
                            "Exposed Backup File",
                            format!("A backup file was found: {}", name),
                            "Remove backup files from publicly accessible directories.",
                        )
                        .with_url(backup_url.as_str()),
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("[Misconfig] Request failed for {}: {}", backup_url, e);
                }
            }
        }

        tests_run
    }
}

#[async_trait]
impl Probe for MisconfigurationScanner {
    async fn run(&self, ctx: &ScanContext<'_>) -> Result<ProbeReport> {
        let (findings, tests_run) = self.scan(ctx.target, ctx.mode).await?;
        Ok(ProbeReport::findings(findings, tests_run))
    }
}
