//! Resolves the optional config file sections into the concrete settings the
//! pipeline runs with, filling every gap with the built-in defaults.

use anyhow::{Context, Result};
use common::{LlmConfig, SearchConfig};

use crate::llm::summarizer::{self, SummarizerSettings};
use crate::query;
use crate::search::{SafeSearch, SearchSettings, TimeLimit, DEFAULT_BLOCKLIST, DEFAULT_MAX_PER_QUERY, DEFAULT_REGION};

pub fn search_settings(cfg: &SearchConfig, max_per_query_override: Option<usize>) -> Result<SearchSettings> {
    let safesearch: SafeSearch = cfg
        .safesearch
        .as_deref()
        .unwrap_or("off")
        .parse()
        .context("invalid [search] safesearch")?;
    let timelimit: TimeLimit = cfg
        .timelimit
        .as_deref()
        .unwrap_or("d")
        .parse()
        .context("invalid [search] timelimit")?;

    let blocklist = cfg
        .blocklist
        .clone()
        .unwrap_or_else(|| DEFAULT_BLOCKLIST.iter().map(|s| s.to_string()).collect());

    Ok(SearchSettings {
        queries: query::queries_or_default(&cfg.queries),
        blocklist,
        max_per_query: max_per_query_override
            .or(cfg.max_per_query)
            .unwrap_or(DEFAULT_MAX_PER_QUERY),
        region: cfg.region.clone().unwrap_or_else(|| DEFAULT_REGION.to_string()),
        safesearch,
        timelimit,
    })
}

pub fn summarizer_settings(cfg: &LlmConfig) -> SummarizerSettings {
    let defaults = SummarizerSettings::default();

    let candidate_models: Vec<String> = cfg
        .candidate_models
        .iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();

    SummarizerSettings {
        candidate_models: if candidate_models.is_empty() {
            defaults.candidate_models
        } else {
            candidate_models
        },
        temperature: cfg.temperature.unwrap_or(summarizer::DEFAULT_TEMPERATURE),
        max_tokens: cfg.max_tokens,
        timeout_seconds: cfg.timeout_seconds,
        language: cfg.language.clone().unwrap_or(defaults.language),
        empty_notice: cfg.empty_notice.clone().unwrap_or(defaults.empty_notice),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gives_defaults() {
        let search = search_settings(&SearchConfig::default(), None).unwrap();
        assert_eq!(search.queries, query::default_queries());
        assert_eq!(search.blocklist.len(), DEFAULT_BLOCKLIST.len());
        assert_eq!(search.max_per_query, 3);
        assert_eq!(search.region, "wt-wt");
        assert_eq!(search.safesearch, SafeSearch::Off);
        assert_eq!(search.timelimit, TimeLimit::Day);

        let llm = summarizer_settings(&LlmConfig::default());
        assert_eq!(llm.candidate_models, vec!["gemini-1.5-pro-002", "gemini-flash-latest"]);
        assert!((llm.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn cli_override_beats_config() {
        let cfg = SearchConfig {
            max_per_query: Some(5),
            ..SearchConfig::default()
        };
        assert_eq!(search_settings(&cfg, None).unwrap().max_per_query, 5);
        assert_eq!(search_settings(&cfg, Some(1)).unwrap().max_per_query, 1);
    }

    #[test]
    fn explicit_empty_blocklist_disables_filtering() {
        let cfg = SearchConfig {
            blocklist: Some(Vec::new()),
            ..SearchConfig::default()
        };
        assert!(search_settings(&cfg, None).unwrap().blocklist.is_empty());
    }

    #[test]
    fn invalid_safesearch_is_rejected() {
        let cfg = SearchConfig {
            safesearch: Some("maybe".to_string()),
            ..SearchConfig::default()
        };
        let err = search_settings(&cfg, None).unwrap_err();
        assert!(format!("{:#}", err).contains("safesearch"));
    }

    #[test]
    fn configured_models_replace_defaults() {
        let cfg = LlmConfig {
            candidate_models: vec!["gemini-2.0-flash".to_string(), " ".to_string()],
            language: Some("English".to_string()),
            ..LlmConfig::default()
        };
        let settings = summarizer_settings(&cfg);
        assert_eq!(settings.candidate_models, vec!["gemini-2.0-flash"]);
        assert_eq!(settings.language, "English");
    }
}
