// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - URL Discovery Tests
 * Tests for same-host link collection, caps and fetch failures
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;
use url::Url;
use webscan_engine::crawler::UrlDiscoverer;
use webscan_engine::http_client::HttpClient;
use webscan_engine::types::ScanMode;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

fn discoverer() -> UrlDiscoverer {
    UrlDiscoverer::new(Arc::new(HttpClient::new(10, 3).unwrap()))
}

#[tokio::test]
async fn test_discovery_collects_same_host_links() {
    let mock_server = MockServer::start().await;

    let html = r##"
        <!DOCTYPE html>
        <html>
        <body>
            <a href="/products?id=1">Products</a>
            <a href="/about">About</a>
            <a href="/about">About again</a>
            <a href="https://cdn.other.test/lib.js">External</a>
            <a href="#main">Skip</a>
            <form action="/search" method="GET"><input name="q"></form>
        </body>
        </html>
    "##;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(&mock_server)
        .await;

    let target = Url::parse(&format!("{}/", mock_server.uri())).unwrap();
    let discovered = discoverer().discover(&target, ScanMode::Quick.url_cap()).await;

    let urls: Vec<&str> = discovered.iter().collect();
    assert_eq!(urls[0], target.as_str());
    assert_eq!(urls.len(), 4);
    assert!(discovered.contains(&format!("{}/products?id=1", mock_server.uri())));
    assert!(discovered.contains(&format!("{}/about", mock_server.uri())));
    assert!(discovered.contains(&format!("{}/search", mock_server.uri())));
    assert!(!urls.iter().any(|u| u.contains("other.test")));
}

#[tokio::test]
async fn test_discovery_stops_at_cap() {
    let mock_server = MockServer::start().await;

    let links: String = (0..100)
        .map(|i| format!("<a href=\"/page/{}\">p{}</a>", i, i))
        .collect();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!("<html><body>{}</body></html>", links),
            "text/html",
        ))
        .mount(&mock_server)
        .await;

    let target = Url::parse(&mock_server.uri()).unwrap();

    let quick = discoverer().discover(&target, ScanMode::Quick.url_cap()).await;
    assert_eq!(quick.len(), 20);
    assert!(quick.is_full());

    let comprehensive = discoverer()
        .discover(&target, ScanMode::Comprehensive.url_cap())
        .await;
    assert_eq!(comprehensive.len(), 50);
}

#[tokio::test]
async fn test_non_html_keeps_seed_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"next": "<a href=\"/hidden\">x</a>"}"#,
            "application/json",
        ))
        .mount(&mock_server)
        .await;

    let target = Url::parse(&mock_server.uri()).unwrap();
    let discovered = discoverer().discover(&target, 20).await;

    assert_eq!(discovered.len(), 1);
    assert_eq!(discovered.iter().next(), Some(target.as_str()));
}

#[tokio::test]
async fn test_unreachable_target_keeps_seed_only() {
    let target = Url::parse("http://127.0.0.1:1/").unwrap();
    let discovered = discoverer().discover(&target, 20).await;

    assert_eq!(discovered.len(), 1);
    assert!(discovered.contains("http://127.0.0.1:1/"));
}
