// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - URL Discovery
 * Single-pass, same-host link extraction from the target page
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::http_client::{HttpClient, RequestOptions};
use crate::scanners::{Probe, ProbeReport, ScanContext};
use anyhow::Result;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

const DISCOVERY_TIMEOUT_SECS: u64 = 10;

const LINK_SELECTOR: &str = "a[href], link[href], script[src], img[src], form[action]";

/// Scan-scoped, insertion-ordered set of same-host URLs with a hard cap
#[derive(Debug, Clone)]
pub struct DiscoveredUrls {
    urls: Vec<String>,
    seen: HashSet<String>,
    cap: usize,
}

impl DiscoveredUrls {
    /// Set holding only the seed
    pub fn seeded(seed: &Url, cap: usize) -> Self {
        let mut set = Self::empty(cap);
        set.insert(seed.as_str());
        set
    }

    pub fn empty(cap: usize) -> Self {
        Self {
            urls: Vec::new(),
            seen: HashSet::new(),
            cap: cap.max(1),
        }
    }

    /// Returns false when the URL is a duplicate or the cap is reached
    pub fn insert(&mut self, url: &str) -> bool {
        if self.is_full() || self.seen.contains(url) {
            return false;
        }
        self.seen.insert(url.to_string());
        self.urls.push(url.to_string());
        true
    }

    pub fn is_full(&self) -> bool {
        self.urls.len() >= self.cap
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }
}

/// Extract absolute, same-host, fragment-free references from a page
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let selector = match Selector::parse(LINK_SELECTOR) {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let value = element.value();
        let reference = value
            .attr("href")
            .or_else(|| value.attr("src"))
            .or_else(|| value.attr("action"));

        let Some(reference) = reference else {
            continue;
        };

        let absolute = match base.join(reference.trim()) {
            Ok(url) => url,
            Err(e) => {
                debug!("[Crawler] Skipping malformed reference {:?}: {}", reference, e);
                continue;
            }
        };

        if absolute.host_str() != base.host_str() || absolute.fragment().is_some() {
            continue;
        }

        links.push(absolute);
    }

    links
}

/// Fetches the target once and collects same-host links up to the mode's cap
pub struct UrlDiscoverer {
    http_client: Arc<HttpClient>,
}

impl UrlDiscoverer {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }

    /// Never fails: a fetch or parse problem leaves only the seed
    pub async fn discover(&self, target: &Url, cap: usize) -> DiscoveredUrls {
        info!("[Crawler] Discovering URLs from {}", target);

        let mut discovered = DiscoveredUrls::seeded(target, cap);

        let response = match self
            .http_client
            .get_with(target.as_str(), RequestOptions::new(DISCOVERY_TIMEOUT_SECS))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("[Crawler] Fetch failed for {}: {}", target, e);
                return discovered;
            }
        };

        if !response.is_html() {
            debug!("[Crawler] Non-HTML response from {}, keeping seed only", target);
            return discovered;
        }

        for link in extract_links(&response.body, target) {
            if discovered.is_full() {
                break;
            }
            discovered.insert(link.as_str());
        }

        info!("[Crawler] Discovered {} URLs (cap {})", discovered.len(), discovered.cap());
        discovered
    }
}

#[async_trait]
impl Probe for UrlDiscoverer {
    async fn run(&self, ctx: &ScanContext<'_>) -> Result<ProbeReport> {
        let discovered = self.discover(ctx.target, ctx.mode.url_cap()).await;
        Ok(ProbeReport::discovery(discovered))
    }
}
