// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Pipeline Table
 * Ordered phases with their progress checkpoints and probes
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use crate::crawler::UrlDiscoverer;
use crate::engine::progress::Checkpoint;
use crate::http_client::HttpClient;
use crate::scanners::{
    CookieSecurityScanner, CorsScanner, CsrfScanner, InformationDisclosureScanner,
    MisconfigurationScanner, Probe, SecurityHeadersScanner, SqliScanner, TlsScanner, XssScanner,
};
use crate::tls_inspector::TlsProbe;
use std::sync::Arc;

/// Written once every phase has run, just before findings are persisted
pub const SAVING: Checkpoint = Checkpoint::new(97, "Saving vulnerabilities...", 3, 3);

pub const DISCOVERY: (Checkpoint, Checkpoint) = (
    Checkpoint::new(8, "Discovering URLs...", 180, 420),
    Checkpoint::new(12, "URL discovery complete", 150, 380),
);
pub const TLS: (Checkpoint, Checkpoint) = (
    Checkpoint::new(15, "Verifying SSL/TLS security...", 120, 360),
    Checkpoint::new(22, "SSL/TLS verification complete", 100, 320),
);
pub const HEADERS: (Checkpoint, Checkpoint) = (
    Checkpoint::new(25, "Analyzing security headers...", 90, 300),
    Checkpoint::new(32, "Security headers analyzed", 80, 280),
);
pub const COOKIES: (Checkpoint, Checkpoint) = (
    Checkpoint::new(35, "Analyzing cookie security...", 70, 260),
    Checkpoint::new(40, "Cookie security analyzed", 65, 240),
);
pub const CORS: (Checkpoint, Checkpoint) = (
    Checkpoint::new(42, "Checking CORS policies...", 60, 220),
    Checkpoint::new(47, "CORS policies checked", 55, 200),
);
pub const SQLI: (Checkpoint, Checkpoint) = (
    Checkpoint::new(50, "Testing for SQL Injection vulnerabilities...", 50, 180),
    Checkpoint::new(60, "SQL Injection scan complete", 40, 140),
);
pub const XSS: (Checkpoint, Checkpoint) = (
    Checkpoint::new(63, "Testing for XSS vulnerabilities...", 35, 120),
    Checkpoint::new(72, "XSS scan complete", 28, 100),
);
pub const CSRF: (Checkpoint, Checkpoint) = (
    Checkpoint::new(75, "Checking for CSRF vulnerabilities...", 22, 80),
    Checkpoint::new(80, "CSRF check complete", 18, 60),
);
pub const INFO_DISCLOSURE: (Checkpoint, Checkpoint) = (
    Checkpoint::new(83, "Checking for information disclosure...", 15, 50),
    Checkpoint::new(88, "Information disclosure check complete", 10, 35),
);
pub const MISCONFIGURATION: (Checkpoint, Checkpoint) = (
    Checkpoint::new(90, "Checking server configuration...", 8, 25),
    Checkpoint::new(94, "Server configuration checked", 5, 15),
);

/// One row of the pipeline: a probe bracketed by two checkpoints
#[derive(Clone)]
pub struct PipelinePhase {
    pub name: &'static str,
    pub start: Checkpoint,
    pub end: Checkpoint,
    pub probe: Arc<dyn Probe>,
}

impl PipelinePhase {
    pub fn new(name: &'static str, checkpoints: (Checkpoint, Checkpoint), probe: Arc<dyn Probe>) -> Self {
        Self {
            name,
            start: checkpoints.0,
            end: checkpoints.1,
            probe,
        }
    }
}

impl std::fmt::Debug for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelinePhase")
            .field("name", &self.name)
            .field("start", &self.start.percent)
            .field("end", &self.end.percent)
            .finish()
    }
}

/// Builds the phase table for one scan from its scoped HTTP client
pub type PipelineBuilder = Arc<dyn Fn(Arc<HttpClient>) -> Vec<PipelinePhase> + Send + Sync>;

/// Discovery, then the nine probes, in fixed order
pub fn standard_pipeline(http_client: Arc<HttpClient>, tls_probe: Arc<dyn TlsProbe>) -> Vec<PipelinePhase> {
    vec![
        PipelinePhase::new("discovery", DISCOVERY, Arc::new(UrlDiscoverer::new(http_client.clone()))),
        PipelinePhase::new("tls", TLS, Arc::new(TlsScanner::new(tls_probe))),
        PipelinePhase::new(
            "security_headers",
            HEADERS,
            Arc::new(SecurityHeadersScanner::new(http_client.clone())),
        ),
        PipelinePhase::new(
            "cookies",
            COOKIES,
            Arc::new(CookieSecurityScanner::new(http_client.clone())),
        ),
        PipelinePhase::new("cors", CORS, Arc::new(CorsScanner::new(http_client.clone()))),
        PipelinePhase::new("sqli", SQLI, Arc::new(SqliScanner::new(http_client.clone()))),
        PipelinePhase::new("xss", XSS, Arc::new(XssScanner::new(http_client.clone()))),
        PipelinePhase::new("csrf", CSRF, Arc::new(CsrfScanner::new(http_client.clone()))),
        PipelinePhase::new(
            "information_disclosure",
            INFO_DISCLOSURE,
            Arc::new(InformationDisclosureScanner::new(http_client.clone())),
        ),
        PipelinePhase::new(
            "misconfiguration",
            MISCONFIGURATION,
            Arc::new(MisconfigurationScanner::new(http_client)),
        ),
    ]
}

/// Builder for the standard table bound to one TLS probe
pub fn standard_builder(tls_probe: Arc<dyn TlsProbe>) -> PipelineBuilder {
    Arc::new(move |http_client| standard_pipeline(http_client, tls_probe.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls_inspector::RustlsProbe;
    use crate::types::ScanMode;

    fn table() -> Vec<PipelinePhase> {
        let http = Arc::new(HttpClient::new(10, 5).unwrap());
        standard_pipeline(http, Arc::new(RustlsProbe::new()))
    }

    #[test]
    fn test_phase_order() {
        let names: Vec<&str> = table().iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![
                "discovery",
                "tls",
                "security_headers",
                "cookies",
                "cors",
                "sqli",
                "xss",
                "csrf",
                "information_disclosure",
                "misconfiguration",
            ]
        );
    }

    #[test]
    fn test_checkpoints_strictly_increase() {
        let mut percents = vec![5u8];
        for phase in table() {
            percents.push(phase.start.percent);
            percents.push(phase.end.percent);
        }
        percents.push(SAVING.percent);
        percents.push(100);

        assert!(percents.windows(2).all(|w| w[0] < w[1]), "{:?}", percents);
    }

    #[test]
    fn test_eta_shrinks_through_the_table() {
        for mode in [ScanMode::Quick, ScanMode::Comprehensive] {
            let mut etas: Vec<u32> = Vec::new();
            for phase in table() {
                etas.push(phase.start.eta_secs(mode));
                etas.push(phase.end.eta_secs(mode));
            }
            etas.push(SAVING.eta_secs(mode));
            assert!(etas.windows(2).all(|w| w[0] > w[1]), "{:?}", etas);
        }
    }

    #[test]
    fn test_comprehensive_estimates_are_larger() {
        for phase in table() {
            assert!(phase.start.eta_comprehensive_secs > phase.start.eta_quick_secs);
            assert!(phase.end.eta_comprehensive_secs > phase.end.eta_quick_secs);
        }
    }
}
