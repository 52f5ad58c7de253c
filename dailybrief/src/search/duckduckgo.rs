use anyhow::{Context, Result};
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tracing::debug;

use super::{NewsRequest, ResultStream, SafeSearch, SearchProvider, SearchResult, TimeLimit};

pub const DEFAULT_BASE_URL: &str = "https://duckduckgo.com";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// DuckDuckGo serves news 30 results a page; five pages is plenty for a daily digest
const DEFAULT_MAX_PAGES: usize = 5;

/// News search against DuckDuckGo's `news.js` endpoint.
///
/// Each query takes two round trips: the search page (to obtain the `vqd`
/// token that `news.js` insists on), then one request per result page.
pub struct DuckDuckGoProvider {
    base_url: String,
    timeout: Duration,
    max_pages: usize,
}

impl DuckDuckGoProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(20),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = Duration::from_secs(timeout_secs);
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    async fn fetch_vqd(&self, client: &Client, query: &str) -> Result<String> {
        let url = url::Url::parse_with_params(&format!("{}/", self.base_url), &[("q", query)])
            .context("failed to build search token URL")?;

        let response = client
            .get(url)
            .send()
            .await
            .context("search token request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("search token request failed with status: {}", status);
        }

        let body = response.text().await.context("failed to read search token page")?;
        extract_vqd(&body).with_context(|| format!("no vqd token in search page for '{}'", query))
    }
}

#[async_trait::async_trait]
impl SearchProvider for DuckDuckGoProvider {
    async fn news(&self, request: &NewsRequest) -> Result<Box<dyn ResultStream>> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build reqwest client")?;

        let vqd = self.fetch_vqd(&client, &request.query).await?;
        debug!(query = %request.query, "obtained vqd token");

        Ok(Box::new(NewsPager {
            client,
            base_url: self.base_url.clone(),
            request: request.clone(),
            vqd,
            next_offset: Some("0".to_string()),
            pages_left: self.max_pages,
            buffer: VecDeque::new(),
            seen_urls: HashSet::new(),
        }))
    }
}

/// Pulls result pages on demand; a page is only requested once the previous
/// one has been fully consumed.
struct NewsPager {
    client: Client,
    base_url: String,
    request: NewsRequest,
    vqd: String,
    next_offset: Option<String>,
    pages_left: usize,
    buffer: VecDeque<SearchResult>,
    seen_urls: HashSet<String>,
}

impl NewsPager {
    async fn fetch_page(&mut self, offset: &str) -> Result<NewsPage> {
        let params = [
            ("l", self.request.region.as_str()),
            ("o", "json"),
            ("noamp", "1"),
            ("q", self.request.query.as_str()),
            ("vqd", self.vqd.as_str()),
            ("p", safesearch_param(self.request.safesearch)),
            ("df", timelimit_param(self.request.timelimit)),
            ("s", offset),
        ];
        let url = url::Url::parse_with_params(&format!("{}/news.js", self.base_url), &params)
            .context("failed to build news URL")?;

        let response = self.client.get(url).send().await.context("news request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("news search failed with status {}: {}", status, body);
        }

        response.json().await.context("failed to parse news response")
    }
}

#[async_trait::async_trait]
impl ResultStream for NewsPager {
    async fn next_result(&mut self) -> Result<Option<SearchResult>> {
        loop {
            if let Some(result) = self.buffer.pop_front() {
                return Ok(Some(result));
            }

            if self.pages_left == 0 {
                return Ok(None);
            }
            let Some(offset) = self.next_offset.take() else {
                return Ok(None);
            };
            self.pages_left -= 1;

            let page = self.fetch_page(&offset).await?;
            debug!(query = %self.request.query, offset = %offset, results = page.results.len(), "fetched news page");

            if page.results.is_empty() {
                return Ok(None);
            }

            self.next_offset = page.next.as_deref().and_then(next_offset);

            for row in page.results {
                if row.url.is_empty() || !self.seen_urls.insert(row.url.clone()) {
                    continue;
                }
                self.buffer.push_back(row.into_result());
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewsPage {
    #[serde(default)]
    results: Vec<NewsRow>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsRow {
    #[serde(default)]
    title: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    url: String,
    source: Option<String>,
    /// Unix timestamp
    date: Option<serde_json::Value>,
}

impl NewsRow {
    fn into_result(self) -> SearchResult {
        let published = self
            .date
            .as_ref()
            .and_then(|d| d.as_i64().or_else(|| d.as_f64().map(|f| f as i64)))
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.to_rfc3339());

        SearchResult {
            title: normalize(&self.title),
            body: normalize(&self.excerpt),
            url: self.url,
            source: self.source.filter(|s| !s.is_empty()),
            published,
        }
    }
}

fn safesearch_param(safesearch: SafeSearch) -> &'static str {
    match safesearch {
        SafeSearch::On => "1",
        SafeSearch::Moderate => "-1",
        SafeSearch::Off => "-2",
    }
}

fn timelimit_param(timelimit: TimeLimit) -> &'static str {
    match timelimit {
        TimeLimit::Day => "d",
        TimeLimit::Week => "w",
        TimeLimit::Month => "m",
    }
}

/// `next` looks like `news.js?q=...&s=30&...`; only the offset matters
fn next_offset(next: &str) -> Option<String> {
    let (_, tail) = next.rsplit_once("s=")?;
    let offset = tail.split('&').next().unwrap_or_default();
    (!offset.is_empty()).then(|| offset.to_string())
}

/// Pull the `vqd` token out of the search page
fn extract_vqd(html: &str) -> Option<String> {
    let quoted = [("vqd=\"", '"'), ("vqd='", '\'')];
    for (prefix, end) in quoted {
        if let Some(pos) = html.find(prefix) {
            let rest = &html[pos + prefix.len()..];
            if let Some(stop) = rest.find(end) {
                if stop > 0 {
                    return Some(rest[..stop].to_string());
                }
            }
        }
    }

    let pos = html.find("vqd=")?;
    let rest = &html[pos + 4..];
    let stop = rest.find(['&', '"', '\'']).unwrap_or(rest.len());
    (stop > 0).then(|| rest[..stop].to_string())
}

/// Titles and excerpts come back with inline markup (`<b>`) and HTML entities.
/// Only complete `<...>` tags are removed; a stray `<` is kept as text.
fn normalize(raw: &str) -> String {
    let stripped = strip_tags(raw);
    if !stripped.contains('&') {
        return stripped.trim().to_string();
    }
    // Entity decoding only: escape what is left of `<` so the parser sees plain text
    let escaped = stripped.replace('<', "&lt;");
    let fragment = Html::parse_fragment(&escaped);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_string()
}

/// A tag opens with a letter, `/` or `!` and closes before any other `<`
fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find('<') {
        let after = &rest[open + 1..];
        let opens_tag = after
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic() || c == '/' || c == '!');
        let close = after.find('>').filter(|&close| !after[..close].contains('<'));

        match close {
            Some(close) if opens_tag => {
                out.push_str(&rest[..open]);
                rest = &after[close + 1..];
            }
            _ => {
                out.push_str(&rest[..=open]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
