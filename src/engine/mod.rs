// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Engine
 * Drives one scan through the phase table, writing progress between phases
 * and the terminal state at the end
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

pub mod aggregator;
pub mod cancellation;
pub mod phases;
pub mod progress;

pub use aggregator::ScanAccumulator;
pub use cancellation::CancellationToken;
pub use phases::{standard_pipeline, PipelineBuilder, PipelinePhase};
pub use progress::{format_eta, Checkpoint, ProgressReporter};

use crate::config::ScannerConfig;
use crate::crawler::DiscoveredUrls;
use crate::http_client::HttpClient;
use crate::scanners::ScanContext;
use crate::store::{self, ScanStore};
use crate::tls_inspector::TlsProbe;
use crate::types::{ScanMode, ScanStatus, SeverityCounts};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use url::Url;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed { total: u32 },
    Failed { reason: String },
    Cancelled,
    /// The scan was missing or no longer pending
    Skipped,
}

/// Orchestrator with its collaborators injected at construction
pub struct ScanEngine {
    config: ScannerConfig,
    http_client: Arc<HttpClient>,
    store: Arc<dyn ScanStore>,
    pipeline: PipelineBuilder,
}

impl ScanEngine {
    pub fn new(
        config: ScannerConfig,
        http_client: Arc<HttpClient>,
        store: Arc<dyn ScanStore>,
        tls_probe: Arc<dyn TlsProbe>,
    ) -> Self {
        Self {
            config,
            http_client,
            store,
            pipeline: phases::standard_builder(tls_probe),
        }
    }

    /// Replace the phase table
    pub fn with_pipeline<F>(mut self, builder: F) -> Self
    where
        F: Fn(Arc<HttpClient>) -> Vec<PipelinePhase> + Send + Sync + 'static,
    {
        self.pipeline = Arc::new(builder);
        self
    }

    /// Run one scan to a terminal state. Never returns an error: failures end
    /// up as a failed record and `ScanOutcome::Failed`.
    pub async fn run(&self, scan_id: &str, target: &str, token: CancellationToken) -> ScanOutcome {
        let scan = match self.store.get_scan(scan_id).await {
            Ok(Some(scan)) => scan,
            Ok(None) => {
                warn!("[Engine] Scan {} not found, skipping", scan_id);
                return ScanOutcome::Skipped;
            }
            Err(e) => {
                error!("[Engine] Failed to load scan {}: {:#}", scan_id, e);
                return ScanOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if scan.status != ScanStatus::Pending {
            warn!(
                "[Engine] Scan {} is {}, not pending; skipping",
                scan_id, scan.status
            );
            return ScanOutcome::Skipped;
        }

        if token.is_cancelled() {
            info!("[Engine] Scan {} cancelled before start", scan_id);
            return ScanOutcome::Cancelled;
        }

        let mode = scan.scan_type;
        let start = Instant::now();
        info!("[Engine] Starting {} scan {} against {}", mode, scan_id, target);

        let mut reporter = ProgressReporter::new(self.store.clone(), scan_id, mode);

        let target_url = match Url::parse(target) {
            Ok(url) => url,
            Err(e) => {
                let acc = ScanAccumulator::new(DiscoveredUrls::empty(mode.url_cap()));
                return self
                    .fail(scan_id, anyhow!("Invalid target URL {}: {}", target, e), acc, &mut reporter, &token)
                    .await;
            }
        };

        let mut acc = ScanAccumulator::new(DiscoveredUrls::seeded(&target_url, mode.url_cap()));

        let result = self
            .execute(scan_id, &target_url, mode, &mut acc, &mut reporter, &token)
            .await;

        match result {
            Ok(Some(counts)) => {
                info!(
                    "[Engine] Scan {} finished in {:.1}s after {} tests",
                    scan_id,
                    start.elapsed().as_secs_f64(),
                    acc.tests_run
                );
                ScanOutcome::Completed {
                    total: counts.total(),
                }
            }
            Ok(None) => {
                info!("[Engine] Scan {} cancelled at {}%", scan_id, reporter.last_percent());
                ScanOutcome::Cancelled
            }
            Err(e) if store::is_superseded(&e) => {
                info!("[Engine] Scan {} was stopped elsewhere: {}", scan_id, e);
                ScanOutcome::Cancelled
            }
            Err(e) => self.fail(scan_id, e, acc, &mut reporter, &token).await,
        }
    }

    /// The phase sequence. `Ok(None)` means the token was cancelled.
    async fn execute(
        &self,
        scan_id: &str,
        target: &Url,
        mode: ScanMode,
        acc: &mut ScanAccumulator,
        reporter: &mut ProgressReporter,
        token: &CancellationToken,
    ) -> Result<Option<SeverityCounts>> {
        reporter.start().await?;

        let http_client = Arc::new(self.http_client.scoped(self.config.max_requests_per_scan));
        let phases = (self.pipeline)(http_client);

        for phase in &phases {
            if token.is_cancelled() {
                return Ok(None);
            }
            reporter.checkpoint(&phase.start).await?;

            let ctx = ScanContext {
                scan_id,
                target,
                mode,
                discovered: &acc.discovered,
            };

            match phase.probe.run(&ctx).await {
                Ok(report) => acc.absorb(report),
                Err(e) => {
                    warn!(
                        "[Engine] Phase {} failed for scan {}, continuing: {:#}",
                        phase.name, scan_id, e
                    );
                }
            }

            if token.is_cancelled() {
                return Ok(None);
            }
            reporter.checkpoint(&phase.end).await?;
        }

        if token.is_cancelled() {
            return Ok(None);
        }
        reporter.checkpoint(&phases::SAVING).await?;

        let counts = aggregator::persist_findings(
            self.store.as_ref(),
            scan_id,
            target.as_str(),
            acc.findings.clone(),
        )
        .await?;
        acc.persisted = true;

        if token.is_cancelled() {
            return Ok(None);
        }
        aggregator::complete_scan(self.store.as_ref(), scan_id, counts).await?;

        Ok(Some(counts))
    }

    /// Outer failure handler: optionally keep partial findings, then mark the
    /// scan failed. A cancelled scan is left alone.
    async fn fail(
        &self,
        scan_id: &str,
        cause: anyhow::Error,
        acc: ScanAccumulator,
        reporter: &mut ProgressReporter,
        token: &CancellationToken,
    ) -> ScanOutcome {
        error!("[Engine] Scan {} failed: {:#}", scan_id, cause);

        if token.is_cancelled() {
            return ScanOutcome::Cancelled;
        }

        if self.config.persist_partial_findings && !acc.persisted {
            match aggregator::persist_partial(self.store.as_ref(), scan_id, &acc.findings).await {
                Ok(counts) => {
                    info!(
                        "[Engine] Kept {} partial findings for failed scan {}",
                        counts.total(),
                        scan_id
                    );
                }
                Err(e) => {
                    warn!("[Engine] Could not keep partial findings for {}: {:#}", scan_id, e);
                }
            }
        }

        if let Err(e) = reporter.fail().await {
            if store::is_superseded(&e) {
                return ScanOutcome::Cancelled;
            }
            error!("[Engine] Failed to mark scan {} as failed: {:#}", scan_id, e);
        }

        ScanOutcome::Failed {
            reason: cause.to_string(),
        }
    }
}
