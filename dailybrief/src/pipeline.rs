use chrono::NaiveDate;
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::summarizer::{self, SummarizerSettings};
use crate::llm::LlmProvider;
use crate::messaging::{self, Messenger};
use crate::search::{self, SearchProvider, SearchSettings};

const FRAME_WIDTH: usize = 30;

/// Provider clients, built once by the entry point and shared by the run
#[derive(Clone)]
pub struct Providers {
    pub search: Arc<dyn SearchProvider>,
    pub llm: Arc<dyn LlmProvider>,
    pub messenger: Arc<dyn Messenger>,
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub search: SearchSettings,
    pub summarizer: SummarizerSettings,
    /// The one recipient of the digest
    pub recipient: String,
    /// Print the digest but skip delivery
    pub dry_run: bool,
}

/// How a run ended. None of these is a process failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NoNews,
    NoDigest,
    DryRun,
    Delivered,
    DeliveryFailed,
}

/// One pass of search → summarize → print → deliver, stopping at the first
/// stage that comes back empty.
pub async fn run_digest<W: Write>(
    providers: &Providers,
    settings: &RunSettings,
    date: NaiveDate,
    out: &mut W,
) -> RunOutcome {
    let news = search::search_news(providers.search.as_ref(), &settings.search, date).await;
    if news.is_empty() {
        warn!("Not enough news today, skipping the digest");
        return RunOutcome::NoNews;
    }

    let Some(digest) = summarizer::summarize(providers.llm.as_ref(), &news, date, &settings.summarizer).await
    else {
        return RunOutcome::NoDigest;
    };

    if let Err(e) = print_framed(out, &digest) {
        warn!("Failed to print the digest: {}", e);
    }

    if settings.dry_run {
        info!("Dry run: digest not sent");
        return RunOutcome::DryRun;
    }

    if messaging::publish(providers.messenger.as_ref(), &settings.recipient, &digest).await {
        RunOutcome::Delivered
    } else {
        RunOutcome::DeliveryFailed
    }
}

fn print_framed<W: Write>(out: &mut W, digest: &str) -> std::io::Result<()> {
    let rule = "=".repeat(FRAME_WIDTH);
    writeln!(out, "\n{}", rule)?;
    writeln!(out, "{}", digest)?;
    writeln!(out, "{}\n", rule)?;
    out.flush()
}
