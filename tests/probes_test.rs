// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Probe Tests
 * Wire-level tests for the injection, disclosure, misconfiguration and
 * response-inspection probes
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;
use std::time::Duration;
use url::Url;
use webscan_engine::http_client::HttpClient;
use webscan_engine::scanners::{
    CookieSecurityScanner, CsrfScanner, InformationDisclosureScanner, MisconfigurationScanner,
    SecurityHeadersScanner, SqliScanner, XssScanner,
};
use webscan_engine::types::{ScanMode, Severity, VulnType};
use wiremock::{
    matchers::{method, path},
    Match, Mock, MockServer, Request, ResponseTemplate,
};

fn client() -> Arc<HttpClient> {
    Arc::new(HttpClient::new(10, 3).unwrap())
}

fn root(server: &MockServer) -> Url {
    Url::parse(&format!("{}/", server.uri())).unwrap()
}

/// Matches requests whose query carries a stall payload
struct DelayPayload;

impl Match for DelayPayload {
    fn matches(&self, request: &Request) -> bool {
        request
            .url
            .query()
            .map(|q| q.contains("SLEEP") || q.contains("WAITFOR"))
            .unwrap_or(false)
    }
}

#[tokio::test]
async fn test_sqli_error_based_detection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("Warning: You have an error in your SQL syntax; check the manual"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/item", mock_server.uri());
    let scanner = SqliScanner::new(client());
    let (findings, tests_run) = scanner.scan([url.as_str()], ScanMode::Quick).await.unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(tests_run, 1);

    let finding = &findings[0];
    assert_eq!(finding.vuln_type, VulnType::SqlInjection);
    assert_eq!(finding.severity, Severity::Critical);
    assert_eq!(finding.title, "SQL Injection Vulnerability Detected");
    assert_eq!(finding.affected_parameter.as_deref(), Some("id"));
    assert_eq!(finding.affected_url.as_deref(), Some(url.as_str()));
    assert!(finding.evidence.as_deref().unwrap().contains("sql syntax"));
}

#[tokio::test]
async fn test_sqli_time_based_detection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(DelayPayload)
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(2500)))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/report", mock_server.uri());
    let scanner = SqliScanner::new(client());
    let (findings, tests_run) = scanner.scan([url.as_str()], ScanMode::Quick).await.unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].title, "Time-Based SQL Injection Detected");
    assert_eq!(findings[0].affected_url.as_deref(), Some(url.as_str()));
    // fourth quick payload on the first parameter
    assert_eq!(tests_run, 4);
}

#[tokio::test]
async fn test_sqli_clean_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Product list</p>"))
        .mount(&mock_server)
        .await;

    let url = mock_server.uri();
    let (findings, tests_run) = SqliScanner::new(client())
        .scan([url.as_str()], ScanMode::Quick)
        .await
        .unwrap();

    assert!(findings.is_empty());
    assert_eq!(tests_run, 5 * 6);
}

#[tokio::test]
async fn test_sqli_moves_on_after_each_finding() {
    let mock_server = MockServer::start().await;

    for route in ["/orders", "/invoices"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(500).set_body_string(
                "ERROR: unterminated quoted string at or near \"'\" (PostgreSQL)",
            ))
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Catalog</p>"))
        .mount(&mock_server)
        .await;

    let urls = [
        format!("{}/orders", mock_server.uri()),
        format!("{}/catalog", mock_server.uri()),
        format!("{}/invoices", mock_server.uri()),
    ];
    let (findings, tests_run) = SqliScanner::new(client())
        .scan(urls.iter().map(String::as_str), ScanMode::Quick)
        .await
        .unwrap();

    // One request per vulnerable URL, the full grid for the clean one
    assert_eq!(tests_run, 1 + 5 * 6 + 1);
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].affected_url.as_deref(), Some(urls[0].as_str()));
    assert_eq!(findings[1].affected_url.as_deref(), Some(urls[2].as_str()));
    assert!(findings.iter().all(|f| f.affected_parameter.as_deref() == Some("id")));
}

#[tokio::test]
async fn test_xss_unescaped_reflection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(|req: &Request| {
            let echoed: String = req
                .url
                .query_pairs()
                .map(|(_, v)| v.into_owned())
                .collect();
            ResponseTemplate::new(200).set_body_string(format!("<p>Results for {}</p>", echoed))
        })
        .mount(&mock_server)
        .await;

    let url = format!("{}/search", mock_server.uri());
    let (findings, tests_run) = XssScanner::new(client())
        .scan([url.as_str()], ScanMode::Quick)
        .await
        .unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(tests_run, 1);
    assert_eq!(findings[0].severity, Severity::High);
    assert_eq!(findings[0].title, "Reflected XSS Vulnerability Detected");
    assert_eq!(findings[0].affected_parameter.as_deref(), Some("q"));
}

#[tokio::test]
async fn test_xss_encoded_reflection_is_low() {
    let mock_server = MockServer::start().await;

    // Angle-bracket payloads come back escaped, anything else is dropped
    Mock::given(method("GET"))
        .respond_with(|req: &Request| {
            let echoed: String = req
                .url
                .query_pairs()
                .map(|(_, v)| v.into_owned())
                .filter(|v| v.contains('<'))
                .map(|v| v.replace('<', "&lt;").replace('>', "&gt;"))
                .collect();
            ResponseTemplate::new(200).set_body_string(format!("<p>{}</p>", echoed))
        })
        .mount(&mock_server)
        .await;

    let url = mock_server.uri();
    let (findings, tests_run) = XssScanner::new(client())
        .scan([url.as_str()], ScanMode::Quick)
        .await
        .unwrap();

    assert_eq!(tests_run, 5 * 4);
    assert_eq!(findings.len(), 5 * 3);
    assert!(findings.iter().all(|f| f.severity == Severity::Low));
    assert!(findings
        .iter()
        .all(|f| f.title == "Input Reflection with HTML Encoding"));
}

#[tokio::test]
async fn test_xss_moves_on_after_each_finding() {
    let mock_server = MockServer::start().await;

    for route in ["/search", "/find"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(|req: &Request| {
                let echoed: String = req
                    .url
                    .query_pairs()
                    .map(|(_, v)| v.into_owned())
                    .collect();
                ResponseTemplate::new(200).set_body_string(format!("<p>{}</p>", echoed))
            })
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/static"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>nothing here</p>"))
        .mount(&mock_server)
        .await;

    let urls = [
        format!("{}/search", mock_server.uri()),
        format!("{}/static", mock_server.uri()),
        format!("{}/find", mock_server.uri()),
    ];
    let (findings, tests_run) = XssScanner::new(client())
        .scan(urls.iter().map(String::as_str), ScanMode::Quick)
        .await
        .unwrap();

    assert_eq!(tests_run, 1 + 5 * 4 + 1);
    assert_eq!(findings.len(), 2);
    assert!(findings.iter().all(|f| f.severity == Severity::High));
    assert_eq!(findings[0].affected_url.as_deref(), Some(urls[0].as_str()));
    assert_eq!(findings[1].affected_url.as_deref(), Some(urls[2].as_str()));
}

#[tokio::test]
async fn test_information_disclosure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.env"))
        .respond_with(ResponseTemplate::new(200).set_body_string("DB_PASSWORD=hunter2"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/.git/config"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[core]\n\tbare = false"))
        .mount(&mock_server)
        .await;

    // Empty 200 bodies are not exposures
    Mock::given(method("GET"))
        .and(path("/package.json"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let target = Url::parse(&format!("{}/app/index.html", mock_server.uri())).unwrap();
    let (findings, tests_run) = InformationDisclosureScanner::new(client())
        .scan(&target, ScanMode::Quick)
        .await
        .unwrap();

    assert_eq!(tests_run, 15);
    assert_eq!(findings.len(), 2);

    let env = findings
        .iter()
        .find(|f| f.affected_url.as_deref().unwrap().ends_with("/.env"))
        .unwrap();
    assert_eq!(env.severity, Severity::Critical);
    assert_eq!(env.evidence.as_deref(), Some("HTTP 200 - File size: 19 bytes"));

    let git = findings
        .iter()
        .find(|f| f.affected_url.as_deref().unwrap().ends_with("/.git/config"))
        .unwrap();
    assert_eq!(git.severity, Severity::High);
}

#[tokio::test]
async fn test_misconfiguration_quick_checks_listing_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/images/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Index of /images</h1>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let (findings, tests_run) = MisconfigurationScanner::new(client())
        .scan(&root(&mock_server), ScanMode::Quick)
        .await
        .unwrap();

    assert_eq!(tests_run, 2);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].title, "Directory Listing Enabled");
    assert_eq!(findings[0].severity, Severity::Medium);
}

#[tokio::test]
async fn test_misconfiguration_comprehensive() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/uploads/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Directory listing for /uploads"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    // Redirects are reported as-is and do not count as exposed
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/sso"))
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/backup.zip"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let (findings, tests_run) = MisconfigurationScanner::new(client())
        .scan(&root(&mock_server), ScanMode::Comprehensive)
        .await
        .unwrap();

    assert_eq!(tests_run, 5 + 10 + 8);
    assert_eq!(findings.len(), 3);

    let titles: Vec<&str> = findings.iter().map(|f| f.title.as_str()).collect();
    assert!(titles.contains(&"Directory Listing Enabled"));
    assert!(titles.contains(&"Exposed Admin Interface"));
    assert!(titles.contains(&"Exposed Backup File"));

    let admin = findings
        .iter()
        .find(|f| f.title == "Exposed Admin Interface")
        .unwrap();
    assert_eq!(admin.evidence.as_deref(), Some("HTTP 401"));
}

#[tokio::test]
async fn test_security_headers_and_banner() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Strict-Transport-Security", "max-age=31536000")
                .insert_header("Server", "nginx/1.18.0"),
        )
        .mount(&mock_server)
        .await;

    let (findings, tests_run) = SecurityHeadersScanner::new(client())
        .scan(&mock_server.uri(), ScanMode::Quick)
        .await
        .unwrap();

    assert_eq!(tests_run, 1);
    assert!(!findings.iter().any(|f| f.title == "Missing HSTS Header"));
    assert!(findings.iter().any(|f| f.title == "Missing X-Frame-Options Header"));

    let csp = findings
        .iter()
        .find(|f| f.title == "Missing Content-Security-Policy Header")
        .unwrap();
    assert_eq!(csp.severity, Severity::High);

    let banner = findings
        .iter()
        .find(|f| f.title == "Server Header Information Disclosure")
        .unwrap();
    assert_eq!(banner.evidence.as_deref(), Some("Server: nginx/1.18.0"));
}

#[tokio::test]
async fn test_cookie_flags() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "session=abc; Path=/")
                .append_header("Set-Cookie", "prefs=1; HttpOnly; SameSite=Lax"),
        )
        .mount(&mock_server)
        .await;

    let (findings, _) = CookieSecurityScanner::new(client())
        .scan(&root(&mock_server), ScanMode::Quick)
        .await
        .unwrap();

    // Plain http target: no Secure-flag findings
    assert_eq!(findings.len(), 2);
    assert!(findings
        .iter()
        .all(|f| f.affected_parameter.as_deref() == Some("session")));
}

#[tokio::test]
async fn test_csrf_post_form_without_token() {
    let mock_server = MockServer::start().await;

    let html = r#"
        <html><body>
            <form method="POST" action="/transfer"><input name="amount"></form>
            <form method="POST" action="/profile"><input type="hidden" name="csrf_token" value="x"></form>
            <form action="/search"><input name="q"></form>
        </body></html>
    "#;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(&mock_server)
        .await;

    let (findings, _) = CsrfScanner::new(client())
        .scan(&mock_server.uri(), ScanMode::Quick)
        .await
        .unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].title, "Missing CSRF Protection");
    assert_eq!(
        findings[0].evidence.as_deref(),
        Some("Form action: /transfer, method: post")
    );
}
