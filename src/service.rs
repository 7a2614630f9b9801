// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Service
 * Request-facing operations: validate, create, inspect, cancel and delete scans
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use crate::errors::{ScannerError, ScannerResult};
use crate::scorer::overall_score;
use crate::store::ScanStore;
use crate::types::{NewScan, Scan, ScanFilter, ScanMode, ScanPatch, ScanStatus, Vulnerability};
use crate::worker::{ScanExecutor, ScanHandle};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use url::Url;

pub const CANCELLED_ACTIVITY: &str = "Cancelled by user";

/// Scan creation request as received from a caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScanRequest {
    pub name: String,
    pub target_url: String,
    #[serde(default)]
    pub scan_type: ScanMode,
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// Scan record with its findings, most severe first
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanDetails {
    #[serde(flatten)]
    pub scan: Scan,
    pub overall_score: u8,
    pub findings: Vec<Vulnerability>,
}

/// Listing entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    #[serde(flatten)]
    pub scan: Scan,
    pub overall_score: u8,
}

pub struct ScanService {
    store: Arc<dyn ScanStore>,
    executor: Arc<ScanExecutor>,
}

impl ScanService {
    pub fn new(store: Arc<dyn ScanStore>, executor: Arc<ScanExecutor>) -> Self {
        Self { store, executor }
    }

    /// Validate, record as pending and hand off to the executor
    pub async fn create_scan(&self, request: CreateScanRequest) -> ScannerResult<Scan> {
        let (scan, _handle) = self.start_scan(request).await?;
        Ok(scan)
    }

    /// Same as `create_scan`, keeping the handle for callers that wait
    pub async fn start_scan(&self, request: CreateScanRequest) -> ScannerResult<(Scan, ScanHandle)> {
        let new_scan = validate_request(request)?;
        let scan = self.store.create_scan(new_scan).await?;

        info!(
            "Created {} scan {} ({}) for {}",
            scan.scan_type, scan.id, scan.name, scan.target_url
        );

        let handle = self.executor.submit(&scan.id, &scan.target_url)?;
        Ok((scan, handle))
    }

    pub async fn get_scan(&self, scan_id: &str) -> ScannerResult<Option<ScanDetails>> {
        let Some(scan) = self.store.get_scan(scan_id).await? else {
            return Ok(None);
        };

        let mut findings = self.store.find_findings(scan_id).await?;
        findings.sort_by(|a, b| b.finding.severity.cmp(&a.finding.severity));

        Ok(Some(ScanDetails {
            overall_score: overall_score(&scan.counts),
            scan,
            findings,
        }))
    }

    pub async fn list_scans(&self, filter: &ScanFilter) -> ScannerResult<Vec<ScanSummary>> {
        let scans = self.store.list_scans(filter).await?;

        Ok(scans
            .into_iter()
            .map(|scan| ScanSummary {
                overall_score: overall_score(&scan.counts),
                scan,
            })
            .collect())
    }

    /// Mark a pending or running scan failed and stop it at the next phase
    /// boundary
    pub async fn cancel_scan(&self, scan_id: &str) -> ScannerResult<Scan> {
        let scan = self.require_scan(scan_id).await?;

        if !scan.status.can_transition_to(ScanStatus::Failed) {
            return Err(ScannerError::Validation("Scan is not running".to_string()));
        }

        self.executor.cancel(scan_id);

        let patch = ScanPatch {
            status: Some(ScanStatus::Failed),
            current_activity: Some(CANCELLED_ACTIVITY.to_string()),
            completed_at: Some(Utc::now()),
            ..Default::default()
        };

        let updated = self
            .store
            .update_scan(scan_id, patch)
            .await?
            .ok_or_else(|| ScannerError::ScanNotFound {
                scan_id: scan_id.to_string(),
            })?;

        info!("Scan {} cancelled by user", scan_id);
        Ok(updated)
    }

    /// Stop the scan if active, then remove its findings and the record
    pub async fn delete_scan(&self, scan_id: &str) -> ScannerResult<()> {
        self.require_scan(scan_id).await?;

        if self.executor.is_active(scan_id) {
            self.executor.cancel(scan_id);
        }

        let findings = self.store.delete_findings(scan_id).await?;
        self.store.delete_scan(scan_id).await?;

        info!("Deleted scan {} and {} findings", scan_id, findings);
        Ok(())
    }

    pub fn executor(&self) -> Arc<ScanExecutor> {
        Arc::clone(&self.executor)
    }

    async fn require_scan(&self, scan_id: &str) -> ScannerResult<Scan> {
        self.store
            .get_scan(scan_id)
            .await?
            .ok_or_else(|| ScannerError::ScanNotFound {
                scan_id: scan_id.to_string(),
            })
    }
}

/// Trimmed name and URL; only absolute http(s) URLs are scannable
pub fn validate_request(request: CreateScanRequest) -> ScannerResult<NewScan> {
    let name = request.name.trim();
    let target_url = request.target_url.trim();

    if name.is_empty() {
        return Err(ScannerError::Validation("Scan name is required".to_string()));
    }
    if target_url.is_empty() {
        return Err(ScannerError::Validation("Target URL is required".to_string()));
    }

    let parsed = Url::parse(target_url)
        .map_err(|_| ScannerError::Validation("Invalid target URL".to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ScannerError::Validation("Invalid target URL".to_string()));
    }

    Ok(NewScan {
        name: name.to_string(),
        target_url: target_url.to_string(),
        scan_type: request.scan_type,
        owner_id: request.owner_id,
    })
}
