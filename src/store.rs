// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Persistence Port
 * Read/write operations the orchestrator and service need from storage
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use crate::errors::ScannerError;
use crate::types::{Finding, NewScan, Scan, ScanFilter, ScanPatch, ScanStatus, Vulnerability};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Persistence collaborator. Findings belong to a scan and go away with it.
#[async_trait]
pub trait ScanStore: Send + Sync {
    async fn create_scan(&self, new_scan: NewScan) -> Result<Scan>;

    /// Applies the patch and returns the updated record. None if the scan is
    /// gone or its status no longer matches `patch.expected_status`.
    async fn update_scan(&self, scan_id: &str, patch: ScanPatch) -> Result<Option<Scan>>;

    async fn get_scan(&self, scan_id: &str) -> Result<Option<Scan>>;

    /// Newest first
    async fn list_scans(&self, filter: &ScanFilter) -> Result<Vec<Scan>>;

    /// Returns false when nothing was deleted
    async fn delete_scan(&self, scan_id: &str) -> Result<bool>;

    async fn insert_findings(&self, scan_id: &str, findings: &[Finding]) -> Result<usize>;

    async fn find_findings(&self, scan_id: &str) -> Result<Vec<Vulnerability>>;

    async fn delete_findings(&self, scan_id: &str) -> Result<usize>;
}

/// Guarded write that only lands while the scan is still `from`. A scan that
/// moved on in the meantime yields `ScannerError::InvalidTransition`.
pub async fn transition(
    store: &dyn ScanStore,
    scan_id: &str,
    from: ScanStatus,
    mut patch: ScanPatch,
) -> Result<Scan> {
    let to = patch.status.unwrap_or(from);
    patch.expected_status = Some(from);

    if let Some(scan) = store.update_scan(scan_id, patch).await? {
        return Ok(scan);
    }

    match store.get_scan(scan_id).await? {
        Some(current) => Err(ScannerError::InvalidTransition {
            scan_id: scan_id.to_string(),
            from: current.status.to_string(),
            to: to.to_string(),
        }
        .into()),
        None => Err(ScannerError::ScanNotFound {
            scan_id: scan_id.to_string(),
        }
        .into()),
    }
}

/// True when the error is a guarded write losing to another status change
pub fn is_superseded(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ScannerError>(),
        Some(ScannerError::InvalidTransition { .. })
    )
}

/// Process-local store for tests and database-less deployments
#[derive(Default, Clone)]
pub struct MemoryStore {
    scans: Arc<RwLock<HashMap<String, Scan>>>,
    findings: Arc<RwLock<HashMap<String, Vec<Vulnerability>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan_count(&self) -> usize {
        self.scans.read().len()
    }
}

#[async_trait]
impl ScanStore for MemoryStore {
    async fn create_scan(&self, new_scan: NewScan) -> Result<Scan> {
        let scan = Scan::new(new_scan);
        self.scans.write().insert(scan.id.clone(), scan.clone());
        Ok(scan)
    }

    async fn update_scan(&self, scan_id: &str, patch: ScanPatch) -> Result<Option<Scan>> {
        let mut scans = self.scans.write();
        Ok(scans
            .get_mut(scan_id)
            .filter(|scan| patch.expected_status.map_or(true, |status| scan.status == status))
            .map(|scan| {
                scan.apply(&patch);
                scan.clone()
            }))
    }

    async fn get_scan(&self, scan_id: &str) -> Result<Option<Scan>> {
        Ok(self.scans.read().get(scan_id).cloned())
    }

    async fn list_scans(&self, filter: &ScanFilter) -> Result<Vec<Scan>> {
        let mut scans: Vec<Scan> = self
            .scans
            .read()
            .values()
            .filter(|scan| filter.matches(scan))
            .cloned()
            .collect();

        scans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        scans.truncate(filter.limit);
        Ok(scans)
    }

    async fn delete_scan(&self, scan_id: &str) -> Result<bool> {
        let removed = self.scans.write().remove(scan_id).is_some();
        if removed {
            self.findings.write().remove(scan_id);
        }
        Ok(removed)
    }

    async fn insert_findings(&self, scan_id: &str, findings: &[Finding]) -> Result<usize> {
        let rows: Vec<Vulnerability> = findings
            .iter()
            .cloned()
            .map(|finding| Vulnerability::from_finding(scan_id, finding))
            .collect();
        let inserted = rows.len();

        self.findings
            .write()
            .entry(scan_id.to_string())
            .or_default()
            .extend(rows);

        Ok(inserted)
    }

    async fn find_findings(&self, scan_id: &str) -> Result<Vec<Vulnerability>> {
        Ok(self.findings.read().get(scan_id).cloned().unwrap_or_default())
    }

    async fn delete_findings(&self, scan_id: &str) -> Result<usize> {
        Ok(self
            .findings
            .write()
            .remove(scan_id)
            .map(|rows| rows.len())
            .unwrap_or(0))
    }
}
