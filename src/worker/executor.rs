// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Executor
 * Bounded pool of background scan tasks with per-scan cancellation
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use crate::engine::{CancellationToken, ScanEngine, ScanOutcome};
use crate::errors::{ScannerError, ScannerResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

type ActiveScans = Arc<RwLock<HashMap<String, CancellationToken>>>;

/// Caller's handle on one submitted scan
pub struct ScanHandle {
    pub scan_id: String,
    pub token: CancellationToken,
    join: JoinHandle<ScanOutcome>,
}

impl ScanHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the task; a panicked task reports as failed
    pub async fn join(self) -> ScanOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("[Executor] Scan task {} aborted: {}", self.scan_id, e);
                ScanOutcome::Failed {
                    reason: format!("scan task aborted: {}", e),
                }
            }
        }
    }
}

/// Removes the scan from the active set however the task ends
struct ActiveGuard {
    active: ActiveScans,
    scan_id: String,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.write().remove(&self.scan_id);
    }
}

/// Runs each scan as its own task, at most `max_concurrent_scans` at a time
pub struct ScanExecutor {
    engine: Arc<ScanEngine>,
    slots: Arc<Semaphore>,
    active: ActiveScans,
}

impl ScanExecutor {
    pub fn new(engine: Arc<ScanEngine>, max_concurrent_scans: usize) -> Self {
        let max_concurrent_scans = max_concurrent_scans.max(1);
        info!("[Executor] Ready with {} scan slots", max_concurrent_scans);

        Self {
            engine,
            slots: Arc::new(Semaphore::new(max_concurrent_scans)),
            active: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Spawn the scan. Queues behind the slot semaphore when the pool is full.
    /// Must be called from inside a tokio runtime.
    pub fn submit(&self, scan_id: &str, target: &str) -> ScannerResult<ScanHandle> {
        let token = CancellationToken::new();

        {
            let mut active = self.active.write();
            if active.contains_key(scan_id) {
                return Err(ScannerError::AlreadyRunning {
                    scan_id: scan_id.to_string(),
                });
            }
            active.insert(scan_id.to_string(), token.clone());
        }

        let guard = ActiveGuard {
            active: Arc::clone(&self.active),
            scan_id: scan_id.to_string(),
        };
        let engine = Arc::clone(&self.engine);
        let slots = Arc::clone(&self.slots);
        let task_token = token.clone();
        let task_scan_id = scan_id.to_string();
        let task_target = target.to_string();

        let join = tokio::spawn(async move {
            let _guard = guard;

            let _permit = match slots.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("[Executor] Slot pool closed for scan {}: {}", task_scan_id, e);
                    return ScanOutcome::Failed {
                        reason: "executor shut down".to_string(),
                    };
                }
            };

            if task_token.is_cancelled() {
                info!("[Executor] Scan {} cancelled while queued", task_scan_id);
                return ScanOutcome::Cancelled;
            }

            engine.run(&task_scan_id, &task_target, task_token).await
        });

        info!("[Executor] Submitted scan {} for {}", scan_id, target);

        Ok(ScanHandle {
            scan_id: scan_id.to_string(),
            token,
            join,
        })
    }

    /// Flag a scan for cancellation; false when it is not active
    pub fn cancel(&self, scan_id: &str) -> bool {
        match self.active.read().get(scan_id) {
            Some(token) => {
                token.cancel();
                info!("[Executor] Cancellation requested for scan {}", scan_id);
                true
            }
            None => {
                warn!("[Executor] Cancel for inactive scan {}", scan_id);
                false
            }
        }
    }

    pub fn is_active(&self, scan_id: &str) -> bool {
        self.active.read().contains_key(scan_id)
    }

}
