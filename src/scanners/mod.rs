// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Probe Modules
 * Independent checks, each turning target context into findings
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::crawler::DiscoveredUrls;
use crate::types::{Finding, ScanMode};
use anyhow::Result;
use async_trait::async_trait;
use url::Url;

pub mod cookies;
pub mod cors;
pub mod csrf;
pub mod information_disclosure;
pub mod misconfiguration;
pub mod security_headers;
pub mod sqli;
pub mod tls;
pub mod xss;

pub use cookies::CookieSecurityScanner;
pub use cors::CorsScanner;
pub use csrf::CsrfScanner;
pub use information_disclosure::InformationDisclosureScanner;
pub use misconfiguration::MisconfigurationScanner;
pub use security_headers::SecurityHeadersScanner;
pub use sqli::SqliScanner;
pub use tls::TlsScanner;
pub use xss::XssScanner;

/// Read-only view of a scan handed to each probe
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    pub scan_id: &'a str,
    pub target: &'a Url,
    pub mode: ScanMode,
    pub discovered: &'a DiscoveredUrls,
}

/// What one phase hands back to the run loop
#[derive(Debug, Default)]
pub struct ProbeReport {
    pub findings: Vec<Finding>,
    /// Replacement URL set, only produced by discovery
    pub discovered: Option<DiscoveredUrls>,
    pub tests_run: usize,
}

impl ProbeReport {
    pub fn findings(findings: Vec<Finding>, tests_run: usize) -> Self {
        Self {
            findings,
            discovered: None,
            tests_run,
        }
    }

    pub fn discovery(discovered: DiscoveredUrls) -> Self {
        Self {
            findings: Vec::new(),
            discovered: Some(discovered),
            tests_run: 1,
        }
    }
}

/// One pipeline phase. Errors are contained by the orchestrator and count as
/// "no findings" for that phase.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn run(&self, ctx: &ScanContext<'_>) -> Result<ProbeReport>;
}

/// `url?param=value`, or `url&param=value` when a query already exists
pub fn with_query_param(url: &str, param: &str, payload: &str) -> String {
    if url.contains('?') {
        format!("{}&{}={}", url, param, urlencoding::encode(payload))
    } else {
        format!("{}?{}={}", url, param, urlencoding::encode(payload))
    }
}

/// First `max` characters, char-boundary safe
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
