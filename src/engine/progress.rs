// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Progress Reporter
 * Writes checkpoints (percent, activity, ETA) onto the scan record
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::store::{self, ScanStore};
use crate::types::{ScanMode, ScanPatch, ScanStatus};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

pub const INITIAL_ACTIVITY: &str = "Initializing scan...";
pub const FAILED_ACTIVITY: &str = "Scan failed";

/// One row of the progress table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub percent: u8,
    pub activity: &'static str,
    pub eta_quick_secs: u32,
    pub eta_comprehensive_secs: u32,
}

impl Checkpoint {
    pub const fn new(
        percent: u8,
        activity: &'static str,
        eta_quick_secs: u32,
        eta_comprehensive_secs: u32,
    ) -> Self {
        Self {
            percent,
            activity,
            eta_quick_secs,
            eta_comprehensive_secs,
        }
    }

    pub fn eta_secs(&self, mode: ScanMode) -> u32 {
        if mode.is_comprehensive() {
            self.eta_comprehensive_secs
        } else {
            self.eta_quick_secs
        }
    }
}

/// "2 minutes 5 seconds", "1 minute 0 seconds", "45 seconds"; zero means
/// the scan is wrapping up.
pub fn format_eta(total_secs: u32) -> String {
    if total_secs == 0 {
        return "Completing...".to_string();
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    let seconds_text = format!("{} second{}", seconds, if seconds != 1 { "s" } else { "" });

    if minutes > 0 {
        format!("{} minute{} {}", minutes, if minutes > 1 { "s" } else { "" }, seconds_text)
    } else {
        seconds_text
    }
}

/// Per-scan writer that never lets the percentage go backwards
pub struct ProgressReporter {
    store: Arc<dyn ScanStore>,
    scan_id: String,
    mode: ScanMode,
    last_percent: u8,
}

impl ProgressReporter {
    pub fn new(store: Arc<dyn ScanStore>, scan_id: &str, mode: ScanMode) -> Self {
        Self {
            store,
            scan_id: scan_id.to_string(),
            mode,
            last_percent: 0,
        }
    }

    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }

    /// pending -> running at 5%
    pub async fn start(&mut self) -> Result<()> {
        let patch = ScanPatch {
            status: Some(ScanStatus::Running),
            progress: Some(5),
            current_activity: Some(INITIAL_ACTIVITY.to_string()),
            estimated_time_remaining: Some("Calculating...".to_string()),
            started_at: Some(Utc::now()),
            ..Default::default()
        };
        self.write(ScanStatus::Pending, patch).await?;
        self.last_percent = 5;
        Ok(())
    }

    pub async fn checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        if checkpoint.percent < self.last_percent {
            warn!(
                "[Progress] Refusing to move scan {} back from {}% to {}%",
                self.scan_id, self.last_percent, checkpoint.percent
            );
            return Ok(());
        }

        debug!(
            "[Progress] {} {}% {}",
            self.scan_id, checkpoint.percent, checkpoint.activity
        );

        let patch = ScanPatch {
            progress: Some(checkpoint.percent),
            current_activity: Some(checkpoint.activity.to_string()),
            estimated_time_remaining: Some(format_eta(checkpoint.eta_secs(self.mode))),
            ..Default::default()
        };
        self.write(ScanStatus::Running, patch).await?;
        self.last_percent = checkpoint.percent;
        Ok(())
    }

    /// Terminal failure write; progress drops to 0 by contract
    pub async fn fail(&mut self) -> Result<()> {
        let from = if self.last_percent > 0 {
            ScanStatus::Running
        } else {
            ScanStatus::Pending
        };

        let patch = ScanPatch {
            status: Some(ScanStatus::Failed),
            progress: Some(0),
            current_activity: Some(FAILED_ACTIVITY.to_string()),
            estimated_time_remaining: Some("0 seconds".to_string()),
            completed_at: Some(Utc::now()),
            ..Default::default()
        };
        self.write(from, patch).await?;
        self.last_percent = 0;
        Ok(())
    }

    /// Every write is guarded on the status this run expects, so a scan
    /// cancelled elsewhere is never touched again
    async fn write(&self, from: ScanStatus, patch: ScanPatch) -> Result<()> {
        store::transition(self.store.as_ref(), &self.scan_id, from, patch).await?;
        Ok(())
    }
}
