// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Service Tests
 * Create, inspect, list, cancel and delete through the request-facing API
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;
use std::time::Duration;
use webscan_engine::config::ScannerConfig;
use webscan_engine::engine::{ScanEngine, ScanOutcome};
use webscan_engine::errors::ScannerError;
use webscan_engine::http_client::HttpClient;
use webscan_engine::service::{CreateScanRequest, ScanService, CANCELLED_ACTIVITY};
use webscan_engine::store::{MemoryStore, ScanStore};
use webscan_engine::tls_inspector::RustlsProbe;
use webscan_engine::types::{ScanFilter, ScanMode, ScanStatus, Severity};
use webscan_engine::worker::ScanExecutor;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

fn service(store: Arc<MemoryStore>, slots: usize) -> ScanService {
    let engine = ScanEngine::new(
        ScannerConfig::default(),
        Arc::new(HttpClient::new(5, 3).unwrap()),
        store.clone(),
        Arc::new(RustlsProbe::new()),
    );
    ScanService::new(store, Arc::new(ScanExecutor::new(Arc::new(engine), slots)))
}

fn request(name: &str, target: &str, owner: Option<&str>) -> CreateScanRequest {
    CreateScanRequest {
        name: name.to_string(),
        target_url: target.to_string(),
        scan_type: ScanMode::Quick,
        owner_id: owner.map(str::to_string),
    }
}

async fn slow_site(delay_ms: u64) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>ok</body></html>", "text/html")
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_invalid_requests_never_reach_the_store() {
    let store = Arc::new(MemoryStore::new());
    let service = service(store.clone(), 2);

    for (name, target, message) in [
        ("", "https://example.com", "Scan name is required"),
        ("nightly", "", "Target URL is required"),
        ("nightly", "example.com/path", "Invalid target URL"),
        ("nightly", "javascript:alert(1)", "Invalid target URL"),
    ] {
        match service.create_scan(request(name, target, None)).await {
            Err(ScannerError::Validation(msg)) => assert_eq!(msg, message),
            other => panic!("expected validation error for {:?}, got {:?}", target, other.map(|s| s.id)),
        }
    }

    assert_eq!(store.scan_count(), 0);
}

#[tokio::test]
async fn test_create_then_inspect_completed_scan() {
    let mock_server = slow_site(0).await;
    let store = Arc::new(MemoryStore::new());
    let service = service(store.clone(), 2);

    let (scan, handle) = service
        .start_scan(request("landing page", &format!("{}/", mock_server.uri()), Some("user-1")))
        .await
        .unwrap();

    assert_eq!(scan.status, ScanStatus::Pending);
    assert_eq!(scan.progress, 0);
    assert_eq!(scan.current_activity, "Initializing scan...");

    assert!(matches!(handle.join().await, ScanOutcome::Completed { .. }));

    let details = service.get_scan(&scan.id).await.unwrap().unwrap();
    assert_eq!(details.scan.status, ScanStatus::Completed);
    assert_eq!(details.findings.len() as u32, details.scan.total_vulnerabilities);
    assert_eq!(details.findings[0].finding.severity, Severity::Critical);
    assert!(details
        .findings
        .windows(2)
        .all(|w| w[0].finding.severity >= w[1].finding.severity));
    assert!(details.overall_score < 100);

    let json = serde_json::to_value(&details).unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["criticalCount"], 1);
    assert!(json["findings"].is_array());

    assert!(service.get_scan("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_filters_by_owner() {
    let mock_server = slow_site(0).await;
    let store = Arc::new(MemoryStore::new());
    let service = service(store.clone(), 4);
    let target = format!("{}/", mock_server.uri());

    let mut handles = Vec::new();
    for (name, owner) in [("a", "alice"), ("b", "bob"), ("c", "alice")] {
        let (_, handle) = service
            .start_scan(request(name, &target, Some(owner)))
            .await
            .unwrap();
        handles.push(handle);
    }
    for handle in handles {
        handle.join().await;
    }

    let alice = service
        .list_scans(&ScanFilter {
            owner_id: Some("alice".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(alice.len(), 2);
    assert_eq!(alice[0].scan.name, "c");
    assert_eq!(alice[1].scan.name, "a");

    let everyone = service.list_scans(&ScanFilter::default()).await.unwrap();
    assert_eq!(everyone.len(), 3);
}

#[tokio::test]
async fn test_cancel_running_scan() {
    let mock_server = slow_site(500).await;
    let store = Arc::new(MemoryStore::new());
    let service = service(store.clone(), 2);

    let (scan, handle) = service
        .start_scan(request("slow", &format!("{}/", mock_server.uri()), None))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let cancelled = service.cancel_scan(&scan.id).await.unwrap();
    assert_eq!(cancelled.status, ScanStatus::Failed);
    assert!(cancelled.completed_at.is_some());

    assert_eq!(handle.join().await, ScanOutcome::Cancelled);

    let stored = store.get_scan(&scan.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ScanStatus::Failed);
    assert_eq!(stored.current_activity, CANCELLED_ACTIVITY);
    assert_eq!(stored.total_vulnerabilities, 0);
    assert!(!service.executor().is_active(&scan.id));

    match service.cancel_scan(&scan.id).await {
        Err(ScannerError::Validation(msg)) => assert_eq!(msg, "Scan is not running"),
        other => panic!("expected validation error, got {:?}", other.map(|s| s.status)),
    }
}

#[tokio::test]
async fn test_cancel_unknown_scan() {
    let service = service(Arc::new(MemoryStore::new()), 1);
    assert!(matches!(
        service.cancel_scan("nope").await,
        Err(ScannerError::ScanNotFound { .. })
    ));
}

#[tokio::test]
async fn test_delete_removes_scan_and_findings() {
    let mock_server = slow_site(0).await;
    let store = Arc::new(MemoryStore::new());
    let service = service(store.clone(), 2);

    let (scan, handle) = service
        .start_scan(request("to delete", &format!("{}/", mock_server.uri()), None))
        .await
        .unwrap();
    handle.join().await;
    assert!(!store.find_findings(&scan.id).await.unwrap().is_empty());

    service.delete_scan(&scan.id).await.unwrap();

    assert!(store.get_scan(&scan.id).await.unwrap().is_none());
    assert!(store.find_findings(&scan.id).await.unwrap().is_empty());
    assert!(matches!(
        service.delete_scan(&scan.id).await,
        Err(ScannerError::ScanNotFound { .. })
    ));
}
