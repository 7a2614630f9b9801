// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Engine Tests
 * End-to-end runs of the standard pipeline against mock targets
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use webscan_engine::config::ScannerConfig;
use webscan_engine::engine::{CancellationToken, ScanEngine, ScanOutcome};
use webscan_engine::http_client::HttpClient;
use webscan_engine::service::CANCELLED_ACTIVITY;
use webscan_engine::store::{MemoryStore, ScanStore};
use webscan_engine::tls_inspector::RustlsProbe;
use webscan_engine::types::{
    Finding, NewScan, Scan, ScanFilter, ScanMode, ScanPatch, ScanStatus, Severity, Vulnerability,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Memory store that records every progress value written. It can be told
/// to refuse writes at one percentage, or to cancel the scan the moment its
/// findings are saved.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStore,
    progress: Mutex<Vec<u8>>,
    fail_at: Option<u8>,
    cancel_on_save: bool,
    token: Option<CancellationToken>,
}

impl RecordingStore {
    fn failing_at(percent: u8) -> Self {
        Self {
            fail_at: Some(percent),
            ..Default::default()
        }
    }

    /// Cancels while findings are being saved, flipping the token too when given
    fn cancelling_on_save(token: Option<CancellationToken>) -> Self {
        Self {
            cancel_on_save: true,
            token,
            ..Default::default()
        }
    }

    fn progress(&self) -> Vec<u8> {
        self.progress.lock().clone()
    }
}

#[async_trait]
impl ScanStore for RecordingStore {
    async fn create_scan(&self, new_scan: NewScan) -> Result<Scan> {
        self.inner.create_scan(new_scan).await
    }

    async fn update_scan(&self, scan_id: &str, patch: ScanPatch) -> Result<Option<Scan>> {
        if let Some(percent) = patch.progress {
            if Some(percent) == self.fail_at {
                return Err(anyhow!("connection reset while writing {}%", percent));
            }
            self.progress.lock().push(percent);
        }
        self.inner.update_scan(scan_id, patch).await
    }

    async fn get_scan(&self, scan_id: &str) -> Result<Option<Scan>> {
        self.inner.get_scan(scan_id).await
    }

    async fn list_scans(&self, filter: &ScanFilter) -> Result<Vec<Scan>> {
        self.inner.list_scans(filter).await
    }

    async fn delete_scan(&self, scan_id: &str) -> Result<bool> {
        self.inner.delete_scan(scan_id).await
    }

    async fn insert_findings(&self, scan_id: &str, findings: &[Finding]) -> Result<usize> {
        let inserted = self.inner.insert_findings(scan_id, findings).await?;

        if self.cancel_on_save {
            if let Some(token) = &self.token {
                token.cancel();
            }
            self.inner
                .update_scan(
                    scan_id,
                    ScanPatch {
                        status: Some(ScanStatus::Failed),
                        current_activity: Some(CANCELLED_ACTIVITY.to_string()),
                        completed_at: Some(Utc::now()),
                        ..Default::default()
                    },
                )
                .await?;
        }

        Ok(inserted)
    }

    async fn find_findings(&self, scan_id: &str) -> Result<Vec<Vulnerability>> {
        self.inner.find_findings(scan_id).await
    }

    async fn delete_findings(&self, scan_id: &str) -> Result<usize> {
        self.inner.delete_findings(scan_id).await
    }
}

fn engine(store: Arc<RecordingStore>, config: ScannerConfig) -> ScanEngine {
    ScanEngine::new(
        config,
        Arc::new(HttpClient::new(5, 3).unwrap()),
        store,
        Arc::new(RustlsProbe::new()),
    )
}

async fn pending(store: &RecordingStore, target: &str, mode: ScanMode) -> Scan {
    store
        .create_scan(NewScan {
            name: "engine test".to_string(),
            target_url: target.to_string(),
            scan_type: mode,
            owner_id: Some("user-1".to_string()),
        })
        .await
        .unwrap()
}

async fn mock_site() -> MockServer {
    let mock_server = MockServer::start().await;

    let html = r#"
        <html><body>
            <a href="/about">About</a>
            <form method="POST" action="/login"><input type="password" name="pw"></form>
        </body></html>
    "#;

    // Only the landing page exists; every other probe path is a 404
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Server", "Apache/2.4.41")
                .set_body_raw(html, "text/html"),
        )
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_quick_scan_of_http_target_completes() {
    let mock_server = mock_site().await;
    let store = Arc::new(RecordingStore::default());
    let engine = engine(store.clone(), ScannerConfig::default());

    let target = format!("{}/", mock_server.uri());
    let scan = pending(&store, &target, ScanMode::Quick).await;

    let outcome = engine.run(&scan.id, &target, CancellationToken::new()).await;
    let ScanOutcome::Completed { total } = outcome else {
        panic!("expected completion, got {:?}", outcome);
    };

    let stored = store.get_scan(&scan.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ScanStatus::Completed);
    assert_eq!(stored.progress, 100);
    assert_eq!(stored.current_activity, "Scan completed");
    assert!(stored.started_at.is_some());
    assert!(stored.completed_at.is_some());
    assert_eq!(stored.total_vulnerabilities, total);
    assert_eq!(stored.counts.total(), total);
    assert_eq!(stored.counts.critical, 1);

    let findings = store.find_findings(&scan.id).await.unwrap();
    assert_eq!(findings.len() as u32, total);
    assert!(findings.iter().any(|v| v.finding.title == "Insecure HTTP Protocol"
        && v.finding.severity == Severity::Critical));
    assert!(findings.iter().any(|v| v.finding.title == "Missing CSRF Protection"));
    assert!(findings
        .iter()
        .any(|v| v.finding.title == "Server Header Information Disclosure"));

    let progress = store.progress();
    assert_eq!(progress.first(), Some(&5));
    assert_eq!(progress.last(), Some(&100));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {:?}", progress);
}

#[tokio::test]
async fn test_unreachable_target_still_completes() {
    let store = Arc::new(RecordingStore::default());
    let engine = engine(store.clone(), ScannerConfig::default());

    let target = "http://127.0.0.1:1/";
    let scan = pending(&store, target, ScanMode::Quick).await;

    let outcome = engine.run(&scan.id, target, CancellationToken::new()).await;
    assert!(matches!(outcome, ScanOutcome::Completed { .. }));

    let findings = store.find_findings(&scan.id).await.unwrap();
    assert!(findings
        .iter()
        .any(|v| v.finding.title == "Insecure HTTP Protocol"));
}

#[tokio::test]
async fn test_storage_failure_marks_scan_failed_with_partial_findings() {
    let mock_server = mock_site().await;
    let store = Arc::new(RecordingStore::failing_at(97));
    let engine = engine(store.clone(), ScannerConfig::default());

    let target = format!("{}/", mock_server.uri());
    let scan = pending(&store, &target, ScanMode::Quick).await;

    let outcome = engine.run(&scan.id, &target, CancellationToken::new()).await;
    assert!(matches!(outcome, ScanOutcome::Failed { .. }));

    let stored = store.get_scan(&scan.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ScanStatus::Failed);
    assert_eq!(stored.progress, 0);
    assert_eq!(stored.current_activity, "Scan failed");
    assert!(stored.completed_at.is_some());

    let findings = store.find_findings(&scan.id).await.unwrap();
    assert!(!findings.is_empty());
    assert_eq!(stored.total_vulnerabilities as usize, findings.len());
}

#[tokio::test]
async fn test_storage_failure_can_discard_partial_findings() {
    let mock_server = mock_site().await;
    let store = Arc::new(RecordingStore::failing_at(97));
    let config = ScannerConfig {
        persist_partial_findings: false,
        ..Default::default()
    };
    let engine = engine(store.clone(), config);

    let target = format!("{}/", mock_server.uri());
    let scan = pending(&store, &target, ScanMode::Quick).await;

    engine.run(&scan.id, &target, CancellationToken::new()).await;

    let stored = store.get_scan(&scan.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ScanStatus::Failed);
    assert!(store.find_findings(&scan.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_scan_stops_writing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&mock_server)
        .await;

    let store = Arc::new(RecordingStore::default());
    let engine = Arc::new(engine(store.clone(), ScannerConfig::default()));

    let target = format!("{}/", mock_server.uri());
    let scan = pending(&store, &target, ScanMode::Quick).await;

    let token = CancellationToken::new();
    let task = {
        let engine = engine.clone();
        let token = token.clone();
        let scan_id = scan.id.clone();
        let target = target.clone();
        tokio::spawn(async move { engine.run(&scan_id, &target, token).await })
    };

    // Discovery is still waiting on the slow root page
    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();

    assert_eq!(task.await.unwrap(), ScanOutcome::Cancelled);

    let progress = store.progress();
    assert!(progress.iter().all(|p| *p < 100), "wrote past cancellation: {:?}", progress);
    assert!(store.find_findings(&scan.id).await.unwrap().is_empty());

    let stored = store.get_scan(&scan.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ScanStatus::Running);
}

#[tokio::test]
async fn test_cancel_during_save_is_not_overwritten() {
    let mock_server = mock_site().await;
    let target = format!("{}/", mock_server.uri());

    // With the token flipped, and with only the record changed
    for with_token in [true, false] {
        let token = CancellationToken::new();
        let store = Arc::new(RecordingStore::cancelling_on_save(
            with_token.then(|| token.clone()),
        ));
        let engine = engine(store.clone(), ScannerConfig::default());
        let scan = pending(&store, &target, ScanMode::Quick).await;

        let outcome = engine.run(&scan.id, &target, token).await;
        assert_eq!(outcome, ScanOutcome::Cancelled, "with_token={}", with_token);

        let stored = store.get_scan(&scan.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ScanStatus::Failed);
        assert_eq!(stored.current_activity, CANCELLED_ACTIVITY);
        assert_ne!(stored.progress, 100);
        assert!(stored.completed_at.is_some());
    }
}
