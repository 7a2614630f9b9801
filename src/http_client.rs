// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use reqwest::{Client, Method};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::errors::{NetworkError, ScannerError};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; WebscanEngine/1.0; +https://bountyy.fi)";

/// Maximum response body size (10MB) to prevent memory exhaustion
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

const DEFAULT_POOL_IDLE_PER_HOST: usize = 8;
const DEFAULT_POOL_MAX_IDLE_TIMEOUT: u64 = 90;

/// Per-call knobs for a probe request
#[derive(Debug, Clone, Copy)]
pub struct RequestOptions {
    pub timeout: Duration,
    pub follow_redirects: bool,
}

impl RequestOptions {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            follow_redirects: true,
        }
    }

    pub fn no_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }
}

/// HTTP client for probes. Every status code comes back as a response and
/// nothing is retried; a failed call is the caller's negative signal.
#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    no_redirect_client: Arc<Client>,
    timeout: Duration,
    max_body_size: usize,
    /// Cap shared by every scan in the process
    global_limit: Option<Arc<Semaphore>>,
    /// Cap owned by one scan
    scan_limit: Option<Arc<Semaphore>>,
}

impl HttpClient {
    pub fn new(timeout_secs: u64, max_redirects: usize) -> Result<Self> {
        Self::with_config(timeout_secs, max_redirects, None, false)
    }

    pub fn with_config(
        timeout_secs: u64,
        max_redirects: usize,
        user_agent: Option<&str>,
        accept_invalid_certs: bool,
    ) -> Result<Self> {
        let user_agent = user_agent.unwrap_or(DEFAULT_USER_AGENT);

        let client = Self::builder(timeout_secs, user_agent, accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::limited(max_redirects))
            .build()
            .context("Failed to create HTTP client")?;

        let no_redirect_client = Self::builder(timeout_secs, user_agent, accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client: Arc::new(client),
            no_redirect_client: Arc::new(no_redirect_client),
            timeout: Duration::from_secs(timeout_secs),
            max_body_size: MAX_BODY_SIZE,
            global_limit: None,
            scan_limit: None,
        })
    }

    fn builder(timeout_secs: u64, user_agent: &str, accept_invalid_certs: bool) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .user_agent(user_agent)
            .pool_max_idle_per_host(DEFAULT_POOL_IDLE_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(DEFAULT_POOL_MAX_IDLE_TIMEOUT))
            .tcp_nodelay(true)
    }

    /// Bound outbound requests in flight across every clone of this client
    pub fn with_global_limit(mut self, limit: Arc<Semaphore>) -> Self {
        self.global_limit = Some(limit);
        self
    }

    /// Clone for one scan, with its own in-flight cap on top of the global one
    pub fn scoped(&self, max_in_flight: usize) -> Self {
        let mut scoped = self.clone();
        scoped.scan_limit = Some(Arc::new(Semaphore::new(max_in_flight.max(1))));
        scoped
    }

    /// GET with the client-wide timeout, following redirects
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.request(Method::GET, url, RequestOptions {
            timeout: self.timeout,
            follow_redirects: true,
        })
        .await
    }

    pub async fn get_with(&self, url: &str, options: RequestOptions) -> Result<HttpResponse> {
        self.request(Method::GET, url, options).await
    }

    pub async fn head_with(&self, url: &str, options: RequestOptions) -> Result<HttpResponse> {
        self.request(Method::HEAD, url, options).await
    }

    async fn request(&self, method: Method, url: &str, options: RequestOptions) -> Result<HttpResponse> {
        // Per-scan permit first so a busy scan never hoards global slots
        let _scan_permit = match &self.scan_limit {
            Some(limit) => Some(limit.acquire().await.context("Scan request limiter closed")?),
            None => None,
        };
        let _global_permit = match &self.global_limit {
            Some(limit) => Some(limit.acquire().await.context("Global request limiter closed")?),
            None => None,
        };

        let client = if options.follow_redirects {
            &self.client
        } else {
            &self.no_redirect_client
        };

        let start = Instant::now();
        let response = client
            .request(method.clone(), url)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| {
                debug!("{} {} failed: {}", method, url, e);
                if e.is_timeout() {
                    ScannerError::Network(NetworkError::ConnectionTimeout {
                        url: url.to_string(),
                        timeout: options.timeout,
                    })
                } else {
                    ScannerError::from(e)
                }
            })?;

        let status_code = response.status().as_u16();
        let mut headers = HashMap::new();
        let mut set_cookies = Vec::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).to_string();
            let name = name.as_str().to_lowercase();
            if name == "set-cookie" {
                set_cookies.push(value.clone());
            }
            headers
                .entry(name)
                .and_modify(|existing: &mut String| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        let body_bytes = response
            .bytes()
            .await
            .map_err(ScannerError::from)
            .with_context(|| format!("Failed to read body from {}", url))?;
        let body = if body_bytes.len() > self.max_body_size {
            debug!("Response body truncated from {} bytes to {}", body_bytes.len(), self.max_body_size);
            String::from_utf8_lossy(&body_bytes[..self.max_body_size]).to_string()
        } else {
            String::from_utf8_lossy(&body_bytes).to_string()
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!("{} {} -> {} in {}ms", method, url, status_code, duration_ms);

        Ok(HttpResponse {
            status_code,
            body,
            headers,
            set_cookies,
            duration_ms,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: String,
    /// Lower-cased names; repeated headers joined with ", "
    pub headers: HashMap<String, String>,
    /// Every raw Set-Cookie line, in order
    pub set_cookies: Vec<String>,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn contains(&self, pattern: &str) -> bool {
        self.body.contains(pattern)
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_lowercase()).cloned()
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_lowercase())
    }

    pub fn is_html(&self) -> bool {
        match self.header("content-type") {
            Some(content_type) => content_type.to_lowercase().contains("html"),
            None => true,
        }
    }
}
