// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Finding Aggregator
 * Accumulates phase output and writes the terminal scan state
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::crawler::DiscoveredUrls;
use crate::scanners::ProbeReport;
use crate::store::{transition, ScanStore};
use crate::types::{Finding, ScanPatch, ScanStatus, SeverityCounts, Severity, VulnType};
use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

/// Everything a run has collected so far. Owned by the run loop and
/// extended with each phase's report.
#[derive(Debug)]
pub struct ScanAccumulator {
    pub discovered: DiscoveredUrls,
    pub findings: Vec<Finding>,
    pub tests_run: usize,
    /// Set once the findings are in the store
    pub persisted: bool,
}

impl ScanAccumulator {
    pub fn new(discovered: DiscoveredUrls) -> Self {
        Self {
            discovered,
            findings: Vec::new(),
            tests_run: 0,
            persisted: false,
        }
    }

    pub fn absorb(&mut self, report: ProbeReport) {
        if let Some(discovered) = report.discovered {
            self.discovered = discovered;
        }
        self.findings.extend(report.findings);
        self.tests_run += report.tests_run;
    }
}

/// Placeholder recorded when a scan turns up nothing
pub fn no_issues_finding(target: &str) -> Finding {
    Finding::new(
        VulnType::Other,
        Severity::Info,
        "No Major Vulnerabilities Found",
        "The security scan did not detect any major vulnerabilities. However, manual testing is always recommended.",
        "Continue to monitor and perform regular security assessments.",
    )
    .with_url(target)
}

/// Persist the findings and return their counts. An empty list is replaced
/// by the "no issues" finding.
pub async fn persist_findings(
    store: &dyn ScanStore,
    scan_id: &str,
    target: &str,
    mut findings: Vec<Finding>,
) -> Result<SeverityCounts> {
    if findings.is_empty() {
        findings.push(no_issues_finding(target));
    }

    store
        .insert_findings(scan_id, &findings)
        .await
        .with_context(|| format!("Failed to persist findings for scan {}", scan_id))?;

    Ok(SeverityCounts::tally(&findings))
}

/// Counts only, no status change; used when a failed scan keeps what it found
pub async fn persist_partial(
    store: &dyn ScanStore,
    scan_id: &str,
    findings: &[Finding],
) -> Result<SeverityCounts> {
    if !findings.is_empty() {
        store
            .insert_findings(scan_id, findings)
            .await
            .with_context(|| format!("Failed to persist partial findings for scan {}", scan_id))?;
    }

    let counts = SeverityCounts::tally(findings);
    store
        .update_scan(
            scan_id,
            ScanPatch {
                counts: Some(counts),
                total_vulnerabilities: Some(counts.total()),
                ..Default::default()
            },
        )
        .await?;

    Ok(counts)
}

/// Terminal write: completed at 100%, only while the scan is still running
pub async fn complete_scan(store: &dyn ScanStore, scan_id: &str, counts: SeverityCounts) -> Result<()> {
    transition(
        store,
        scan_id,
        ScanStatus::Running,
        ScanPatch {
            status: Some(ScanStatus::Completed),
            progress: Some(100),
            current_activity: Some("Scan completed".to_string()),
            estimated_time_remaining: Some("0 seconds".to_string()),
            completed_at: Some(Utc::now()),
            counts: Some(counts),
            total_vulnerabilities: Some(counts.total()),
            ..Default::default()
        },
    )
    .await?;

    info!(
        "[SUCCESS] Scan {} completed: {} findings ({} critical, {} high, {} medium, {} low, {} info)",
        scan_id,
        counts.total(),
        counts.critical,
        counts.high,
        counts.medium,
        counts.low,
        counts.info
    );

    Ok(())
}
