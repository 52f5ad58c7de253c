use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::str::FromStr;
use tracing::{debug, error, info};

use crate::query::NewsQuery;

pub mod duckduckgo;

/// Title substrings that disqualify a result outright (case-sensitive).
pub const DEFAULT_BLOCKLIST: [&str; 5] = ["Kardashian", "Taylor Swift", "Netflix", "Review", "Box Office"];

pub const DEFAULT_MAX_PER_QUERY: usize = 3;
pub const DEFAULT_REGION: &str = "wt-wt";

/// Core trait for news search backends
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Open a lazy result stream for one query
    async fn news(&self, request: &NewsRequest) -> Result<Box<dyn ResultStream>>;
}

/// Finite, lazily produced sequence of results for one query.
/// Once it returns `Ok(None)` it stays exhausted; it cannot be rewound.
#[async_trait::async_trait]
pub trait ResultStream: Send {
    async fn next_result(&mut self) -> Result<Option<SearchResult>>;
}

/// A single search hit, as returned by the provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub body: String,
    pub url: String,
    /// Publisher name, when the provider reports one
    pub source: Option<String>,
    /// Publication time as reported by the provider
    pub published: Option<String>,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, body: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            url: url.into(),
            source: None,
            published: None,
        }
    }
}

/// One accepted result rendered as the text block fed to the summarizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem(String);

impl NewsItem {
    /// `category` is the query text that produced the result
    pub fn format(category: &str, result: &SearchResult) -> Self {
        Self(format!(
            "Category: {}\nTitle: {}\nSummary: {}\nLink: {}",
            category, result.title, result.body, result.url
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NewsItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeSearch {
    On,
    Moderate,
    Off,
}

impl FromStr for SafeSearch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" | "strict" => Ok(Self::On),
            "moderate" => Ok(Self::Moderate),
            "off" => Ok(Self::Off),
            other => anyhow::bail!("unknown safesearch value '{}' (expected on, moderate or off)", other),
        }
    }
}

/// How far back results may reach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLimit {
    Day,
    Week,
    Month,
}

impl FromStr for TimeLimit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "day" => Ok(Self::Day),
            "w" | "week" => Ok(Self::Week),
            "m" | "month" => Ok(Self::Month),
            other => anyhow::bail!("unknown timelimit value '{}' (expected d, w or m)", other),
        }
    }
}

/// Request sent to a provider for one query
#[derive(Debug, Clone, PartialEq)]
pub struct NewsRequest {
    pub query: String,
    pub region: String,
    pub safesearch: SafeSearch,
    pub timelimit: TimeLimit,
}

/// Everything the searcher needs for one run
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub queries: Vec<NewsQuery>,
    pub blocklist: Vec<String>,
    pub max_per_query: usize,
    pub region: String,
    pub safesearch: SafeSearch,
    pub timelimit: TimeLimit,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            queries: crate::query::default_queries(),
            blocklist: DEFAULT_BLOCKLIST.iter().map(|s| s.to_string()).collect(),
            max_per_query: DEFAULT_MAX_PER_QUERY,
            region: DEFAULT_REGION.to_string(),
            safesearch: SafeSearch::Off,
            timelimit: TimeLimit::Day,
        }
    }
}

/// Returns the first blocklisted term found in `title`, if any
pub fn blocked_term<'a>(title: &str, blocklist: &'a [String]) -> Option<&'a str> {
    blocklist
        .iter()
        .map(String::as_str)
        .find(|term| !term.is_empty() && title.contains(term))
}

/// Why the searcher would drop `result`, or `None` when it would keep it
pub fn rejection(result: &SearchResult, blocklist: &[String]) -> Option<String> {
    if let Some(term) = blocked_term(&result.title, blocklist) {
        return Some(format!("blocked ({})", term));
    }
    if result.title.is_empty() || result.url.is_empty() {
        return Some("missing title or link".to_string());
    }
    None
}

/// Search every configured query and keep at most `max_per_query` items each.
///
/// Any provider error discards everything gathered so far: the caller gets an
/// empty list and should treat it as "no usable news today".
pub async fn search_news(
    provider: &dyn SearchProvider,
    settings: &SearchSettings,
    date: NaiveDate,
) -> Vec<NewsItem> {
    info!("Searching serious international news for {}", date.format("%Y/%m/%d"));

    match collect_news(provider, settings).await {
        Ok(items) => {
            info!("Search finished, kept {} high-value news items", items.len());
            items
        }
        Err(e) => {
            error!("Search failed: {:#}", e);
            Vec::new()
        }
    }
}

async fn collect_news(provider: &dyn SearchProvider, settings: &SearchSettings) -> Result<Vec<NewsItem>> {
    let mut items = Vec::new();

    for query in &settings.queries {
        info!("  searching category: {} ...", query);

        let request = NewsRequest {
            query: query.as_str().to_string(),
            region: settings.region.clone(),
            safesearch: settings.safesearch,
            timelimit: settings.timelimit,
        };

        let mut stream = provider
            .news(&request)
            .await
            .with_context(|| format!("failed to start search for '{}'", query))?;

        let mut accepted = 0;
        while accepted < settings.max_per_query {
            let Some(result) = stream
                .next_result()
                .await
                .with_context(|| format!("failed to read results for '{}'", query))?
            else {
                break;
            };

            if let Some(reason) = rejection(&result, &settings.blocklist) {
                debug!(title = %result.title, %reason, "dropping result");
                continue;
            }

            items.push(NewsItem::format(query.as_str(), &result));
            accepted += 1;
        }
    }

    Ok(items)
}

/// In-memory stream, handy for providers that fetch everything up front and for tests
pub struct VecStream {
    items: VecDeque<Result<SearchResult>>,
}

impl VecStream {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            items: results.into_iter().map(Ok).collect(),
        }
    }

    /// Yields `results`, then fails with `message`
    pub fn failing_after(results: Vec<SearchResult>, message: &str) -> Self {
        let mut stream = Self::new(results);
        stream.items.push_back(Err(anyhow::anyhow!(message.to_string())));
        stream
    }
}

#[async_trait::async_trait]
impl ResultStream for VecStream {
    async fn next_result(&mut self) -> Result<Option<SearchResult>> {
        self.items.pop_front().transpose()
    }
}
