// Digest summarizer
use chrono::NaiveDate;
use tracing::{error, info, warn};

use super::{LlmProvider, LlmRequest};
use crate::search::NewsItem;

/// Quality first, the always-available flash model last
pub const DEFAULT_CANDIDATE_MODELS: [&str; 2] = ["gemini-1.5-pro-002", "gemini-flash-latest"];
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_LANGUAGE: &str = "Traditional Chinese (zh-TW)";
pub const DEFAULT_EMPTY_NOTICE: &str = "今日無重大地緣政治或科學新聞";

const ITEM_SEPARATOR: &str = "\n---\n";

#[derive(Debug, Clone)]
pub struct SummarizerSettings {
    pub candidate_models: Vec<String>,
    pub temperature: f32,
    pub max_tokens: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub language: String,
    pub empty_notice: String,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            candidate_models: DEFAULT_CANDIDATE_MODELS.iter().map(|m| m.to_string()).collect(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            timeout_seconds: None,
            language: DEFAULT_LANGUAGE.to_string(),
            empty_notice: DEFAULT_EMPTY_NOTICE.to_string(),
        }
    }
}

/// Progress through the ordered candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackState {
    /// Calling the candidate at this index
    Trying(usize),
    Succeeded(String),
    Exhausted,
}

impl FallbackState {
    pub fn start(candidates: usize) -> Self {
        if candidates == 0 {
            Self::Exhausted
        } else {
            Self::Trying(0)
        }
    }

    /// Apply the outcome of the current candidate's call.
    /// Terminal states ignore further outcomes.
    pub fn advance<E>(self, outcome: Result<String, E>, candidates: usize) -> Self {
        match (self, outcome) {
            (Self::Trying(_), Ok(text)) => Self::Succeeded(text),
            (Self::Trying(idx), Err(_)) if idx + 1 < candidates => Self::Trying(idx + 1),
            (Self::Trying(_), Err(_)) => Self::Exhausted,
            (terminal, _) => terminal,
        }
    }
}

pub fn build_prompt(items: &[NewsItem], date: NaiveDate, settings: &SummarizerSettings) -> String {
    let news = items
        .iter()
        .map(NewsItem::as_str)
        .collect::<Vec<_>>()
        .join(ITEM_SEPARATOR);

    format!(
        r#"Today is {date}.
You are a senior analyst focused on hard geopolitics and frontier scientific research.
Using the material collected below, write a high-value daily briefing.

STRICT EXCLUSION RULES:
1. Never include entertainment, celebrity gossip, sports events, or purely criminal/social news.
2. If the material contains nothing but such news, reply with exactly: "{notice}"

WRITING REQUIREMENTS:
1. Pick the 5 most impactful items about geopolitical shifts or major scientific discoveries.
2. Keep the tone professional, objective and concise, like a briefing written for a CEO or a researcher.
3. Format each item as: 【domain tag】headline (newline) in-depth summary (newline) 🔗 link.
4. Close with one professional sentence of insight about the state of the world.
5. Write the whole briefing in {language}.

RAW NEWS MATERIAL:
{news}"#,
        date = date.format("%Y/%m/%d"),
        notice = settings.empty_notice,
        language = settings.language,
        news = news,
    )
}

/// Ask the candidate models, in order, for the digest. The first success wins;
/// `None` means there was nothing to summarize or every candidate failed.
pub async fn summarize<P: LlmProvider + ?Sized>(
    provider: &P,
    items: &[NewsItem],
    date: NaiveDate,
    settings: &SummarizerSettings,
) -> Option<String> {
    if items.is_empty() {
        return None;
    }

    info!("Drafting the news report from {} items", items.len());
    let prompt = build_prompt(items, date, settings);

    let candidates = &settings.candidate_models;
    let mut state = FallbackState::start(candidates.len());

    while let FallbackState::Trying(idx) = state {
        let model = &candidates[idx];
        info!("Trying model {} for the report...", model);

        let request = LlmRequest {
            model: model.clone(),
            prompt: prompt.clone(),
            max_tokens: settings.max_tokens,
            temperature: Some(settings.temperature),
            timeout_seconds: settings.timeout_seconds,
        };

        let outcome = match provider.generate(request).await {
            Ok(response) => {
                info!(
                    "Report completed with {} ({} tokens)",
                    response.model, response.usage.total_tokens
                );
                Ok(response.content)
            }
            Err(e) => {
                warn!("Model {} failed (quota exhausted or unsupported?): {:#}", model, e);
                if idx + 1 < candidates.len() {
                    info!("Switching to the next fallback model...");
                }
                Err(e)
            }
        };

        state = state.advance(outcome, candidates.len());
    }

    match state {
        FallbackState::Succeeded(text) => Some(text),
        _ => {
            error!("All candidate models failed; no report generated");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<NewsItem> {
        vec![
            NewsItem::format(
                "Science",
                &crate::search::SearchResult::new("Fusion record", "Plasma held", "https://a.example"),
            ),
            NewsItem::format(
                "Economy",
                &crate::search::SearchResult::new("Rates held", "Central bank", "https://b.example"),
            ),
        ]
    }

    #[test]
    fn fallback_success_is_terminal() {
        let state = FallbackState::start(2).advance(Ok::<_, ()>("text".to_string()), 2);
        assert_eq!(state, FallbackState::Succeeded("text".to_string()));
        let state = state.advance(Err(()), 2);
        assert_eq!(state, FallbackState::Succeeded("text".to_string()));
    }

    #[test]
    fn fallback_moves_to_next_then_exhausts() {
        let state = FallbackState::start(2);
        assert_eq!(state, FallbackState::Trying(0));
        let state = state.advance(Err::<String, _>("quota"), 2);
        assert_eq!(state, FallbackState::Trying(1));
        let state = state.advance(Err::<String, _>("unsupported"), 2);
        assert_eq!(state, FallbackState::Exhausted);
        let state = state.advance(Ok::<_, ()>("late".to_string()), 2);
        assert_eq!(state, FallbackState::Exhausted);
    }

    #[test]
    fn fallback_with_no_candidates() {
        assert_eq!(FallbackState::start(0), FallbackState::Exhausted);
    }

    #[test]
    fn prompt_contains_date_rules_and_items() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
        let prompt = build_prompt(&items(), date, &SummarizerSettings::default());

        assert!(prompt.starts_with("Today is 2024/05/07."));
        assert!(prompt.contains("senior analyst"));
        assert!(prompt.contains(DEFAULT_EMPTY_NOTICE));
        assert!(prompt.contains("5 most impactful"));
        assert!(prompt.contains(DEFAULT_LANGUAGE));
        assert!(prompt.ends_with(
            "Category: Science\nTitle: Fusion record\nSummary: Plasma held\nLink: https://a.example\n---\n\
             Category: Economy\nTitle: Rates held\nSummary: Central bank\nLink: https://b.example"
        ));
    }
}
