pub mod extractor;
pub mod frontier;


use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use ureq::{Agent, ResponseExt};
use url::Url;

use self::extractor::{extract_page, section_for};
use self::frontier::{CrawlFrontier, normalize_url};
use crate::documents::Document;

/// Configuration for the web crawler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// User agent string to use for requests
    pub user_agent: String,
    /// Timeout for each page fetch in seconds
    pub timeout_seconds: u64,
    /// Minimum delay between two requests in milliseconds
    pub rate_limit_ms: u64,
    /// Stop after this many pages have been visited
    pub max_pages: Option<usize>,
}

impl Default for CrawlerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            user_agent: concat!("ragchat/", env!("CARGO_PKG_VERSION"), " (Embedding Crawler)")
                .to_string(),
            timeout_seconds: 10,
            rate_limit_ms: 100,
            max_pages: Some(500),
        }
    }
}

/// A fetched response, body only read for HTML
#[derive(Debug, Clone)]
pub struct PageResponse {
    /// Where the response came from after following redirects
    pub final_url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Option<String>,
}

impl PageResponse {
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[inline]
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("text/html"))
    }
}

/// Blocking HTTP client with a per-request rate limit and no retries
#[derive(Debug)]
pub struct HttpClient {
    agent: Agent,
    rate_limit: Duration,
    last_request_time: Option<Instant>,
}

impl HttpClient {
    #[inline]
    pub fn new(config: &CrawlerConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .user_agent(&config.user_agent)
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            rate_limit: Duration::from_millis(config.rate_limit_ms),
            last_request_time: None,
        }
    }

    /// GET a page. Non-2xx statuses are returned, not raised; only
    /// transport failures are errors.
    #[inline]
    pub fn fetch(&mut self, url: &Url) -> Result<PageResponse> {
        self.apply_rate_limit();
        debug!("Making HTTP GET request to: {}", url);

        let mut response = self
            .agent
            .get(url.as_str())
            .call()
            .with_context(|| format!("Failed to make HTTP request to {}", url))?;

        let final_url = Url::parse(&response.get_uri().to_string())
            .with_context(|| format!("Invalid redirect target for {}", url))?;
        if final_url != *url {
            debug!("{} redirected to {}", url, final_url);
        }

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let mut page = PageResponse {
            final_url,
            status,
            content_type,
            body: None,
        };
        if page.is_success() && page.is_html() {
            let body = response
                .body_mut()
                .read_to_string()
                .with_context(|| format!("Failed to read response body from {}", url))?;
            debug!("Read {} bytes from {}", body.len(), url);
            page.body = Some(body);
        }

        Ok(page)
    }

    fn apply_rate_limit(&mut self) {
        if let Some(last_time) = self.last_request_time {
            let elapsed = last_time.elapsed();
            if elapsed < self.rate_limit {
                let sleep_duration = self.rate_limit - elapsed;
                debug!("Rate limiting: sleeping for {:?}", sleep_duration);
                std::thread::sleep(sleep_duration);
            }
        }

        self.last_request_time = Some(Instant::now());
    }
}

/// Validate a crawl seed
#[inline]
pub fn validate_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str).with_context(|| format!("Invalid URL format: {}", url_str))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!("URL must use HTTP or HTTPS scheme: {}", url_str));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(anyhow!("URL must have a valid host: {}", url_str));
    }

    Ok(url)
}

/// Host a crawl is confined to: the filter when given, else the seed's host.
///
/// A filter may be a bare host (`example.com`), a host with port, or a full URL.
#[inline]
pub fn crawl_scope(seed: &Url, filter_domain: Option<&str>) -> String {
    let filter = filter_domain.map(str::trim).filter(|f| !f.is_empty());

    match filter {
        Some(filter) if filter.contains("://") => Url::parse(filter)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
            .unwrap_or_else(|| filter.to_ascii_lowercase()),
        Some(filter) => filter.trim_end_matches('/').to_ascii_lowercase(),
        None => seed.host_str().unwrap_or_default().to_ascii_lowercase(),
    }
}

/// True when `url` is on the scope host. The scope matches the bare host
/// or, when it names a port, the host and port.
#[inline]
pub fn is_in_scope(url: &Url, scope: &str) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    if host == scope {
        return true;
    }

    url.port_or_known_default()
        .is_some_and(|port| format!("{}:{}", host, port) == scope)
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Counters for one crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Pages turned into documents
    pub pages_emitted: usize,
    /// Pages answered with a non-2xx status or a non-HTML body
    pub pages_skipped: usize,
    /// Pages that could not be fetched or parsed at all
    pub pages_failed: usize,
}

/// Same-host crawl yielding one document per fetched HTML page.
///
/// Pages are fetched in discovery order. Iterating blocks on the network;
/// async callers drive it from a blocking task.
#[derive(Debug)]
pub struct Crawler {
    client: HttpClient,
    frontier: CrawlFrontier,
    scope: String,
    max_pages: Option<usize>,
    stats: CrawlStats,
    finished: bool,
}

impl Crawler {
    #[inline]
    pub fn new(seed: Url, filter_domain: Option<&str>, config: &CrawlerConfig) -> Self {
        let scope = crawl_scope(&seed, filter_domain);
        info!("Starting crawl at {}", seed);

        Self {
            client: HttpClient::new(config),
            frontier: CrawlFrontier::new(&seed),
            scope,
            max_pages: config.max_pages,
            stats: CrawlStats::default(),
            finished: false,
        }
    }

    #[inline]
    pub fn stats(&self) -> CrawlStats {
        self.stats
    }

    #[inline]
    pub fn visited_count(&self) -> usize {
        self.frontier.visited_count()
    }

    #[inline]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    fn page_limit_reached(&self) -> bool {
        self.max_pages
            .is_some_and(|max| self.frontier.visited_count() >= max)
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            info!(
                "Crawl finished: {} pages emitted, {} skipped, {} failed, {} left pending",
                self.stats.pages_emitted,
                self.stats.pages_skipped,
                self.stats.pages_failed,
                self.frontier.pending_count()
            );
        }
    }

    /// Fetch one page; `None` means it was skipped or failed
    fn visit(&mut self, url: &Url) -> Option<Document> {
        let page = match self.client.fetch(url) {
            Ok(page) => page,
            Err(e) => {
                warn!("Skipping {}: {:#}", url, e);
                self.stats.pages_failed += 1;
                return None;
            }
        };

        // Links resolve against the redirect target, and the document is
        // labelled with it
        let page_url = page.final_url.clone();
        if normalize_url(&page_url) != *url {
            if !same_origin(url, &page_url) && !is_in_scope(&page_url, &self.scope) {
                debug!("Skipping {}: redirected out of scope to {}", url, page_url);
                self.stats.pages_skipped += 1;
                return None;
            }
            if !self.frontier.mark_visited(&page_url) {
                debug!("Skipping {}: redirect target {} already visited", url, page_url);
                self.stats.pages_skipped += 1;
                return None;
            }
        }

        let Some(html) = page.body.as_deref() else {
            debug!(
                "Skipping {}: status {}, content type {}",
                url,
                page.status,
                page.content_type.as_deref().unwrap_or("unknown")
            );
            self.stats.pages_skipped += 1;
            return None;
        };

        let extracted = match extract_page(html, &page_url) {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!("Failed to extract {}: {}", page_url, e);
                self.stats.pages_failed += 1;
                return None;
            }
        };

        let mut queued = 0;
        for link in &extracted.links {
            if is_in_scope(link, &self.scope) && self.frontier.push(link) {
                queued += 1;
            }
        }
        debug!("Queued {} new links from {}", queued, page_url);

        self.stats.pages_emitted += 1;
        Some(Document::new(extracted.text, page_url.as_str()).with_section(section_for(&page_url)))
    }
}

impl Iterator for Crawler {
    type Item = Document;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }
            if self.page_limit_reached() {
                warn!(
                    "Page limit of {} reached, stopping crawl",
                    self.frontier.visited_count()
                );
                self.finish();
                return None;
            }
            let Some(url) = self.frontier.next_unvisited() else {
                self.finish();
                return None;
            };

            if let Some(document) = self.visit(&url) {
                return Some(document);
            }
        }
    }
}

/// Validate the seed and start a crawl
#[inline]
pub fn crawl(seed_url: &str, filter_domain: Option<&str>, config: &CrawlerConfig) -> Result<Crawler> {
    let seed = validate_url(seed_url)?;
    Ok(Crawler::new(seed, filter_domain, config))
}
