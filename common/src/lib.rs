/*!
common/src/lib.rs

Shared configuration types and secret loading for dailybrief.

This file provides:
- Config data structures (deserialized from TOML, every section optional)
- An async loader for a default + override pair of TOML files
- The three required secrets, read from the environment (or a `.env` file)
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const LINE_TOKEN_ENV: &str = "LINE_CHANNEL_ACCESS_TOKEN";
pub const LINE_USER_ID_ENV: &str = "LINE_USER_ID";

/// News search configuration section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the search provider (e.g. "https://duckduckgo.com")
    pub base_url: Option<String>,
    /// Region code, "wt-wt" means no region restriction
    pub region: Option<String>,
    /// "on", "moderate" or "off"
    pub safesearch: Option<String>,
    /// Recency window: "d" (day), "w" (week), "m" (month)
    pub timelimit: Option<String>,
    pub max_per_query: Option<usize>,
    pub timeout_seconds: Option<u64>,
    /// Replaces the built-in topic queries when non-empty
    #[serde(default)]
    pub queries: Vec<String>,
    /// Replaces the built-in title blocklist when present
    pub blocklist: Option<Vec<String>>,
}

/// Generative-language service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_url: Option<String>,
    /// Ordered list of models, tried until one succeeds
    #[serde(default)]
    pub candidate_models: Vec<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    pub timeout_seconds: Option<u64>,
    /// Language the digest is written in
    pub language: Option<String>,
    /// Sentence the model answers with when nothing survives its filter
    pub empty_notice: Option<String>,
}

/// Messaging provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagingConfig {
    pub api_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
}

impl Config {
    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence). With neither,
    /// every section falls back to its defaults.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

/// The three secrets the job cannot run without.
#[derive(Clone)]
pub struct Secrets {
    pub gemini_api_key: String,
    pub line_channel_access_token: String,
    /// The single recipient every digest is pushed to
    pub line_user_id: String,
}

impl Secrets {
    /// Read the secrets from the process environment, after seeding it from a `.env`
    /// file when one is found in the working directory or its ancestors.
    pub fn from_env() -> Result<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the secrets from an arbitrary lookup. Empty values count as missing.
    /// The error names every missing variable, not just the first one.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini = read(GEMINI_API_KEY_ENV);
        let token = read(LINE_TOKEN_ENV);
        let user = read(LINE_USER_ID_ENV);

        match (gemini, token, user) {
            (Some(gemini_api_key), Some(line_channel_access_token), Some(line_user_id)) => Ok(Self {
                gemini_api_key,
                line_channel_access_token,
                line_user_id,
            }),
            (gemini, token, user) => {
                let missing: Vec<&str> = [
                    (GEMINI_API_KEY_ENV, gemini.is_none()),
                    (LINE_TOKEN_ENV, token.is_none()),
                    (LINE_USER_ID_ENV, user.is_none()),
                ]
                .into_iter()
                .filter(|(_, absent)| *absent)
                .map(|(key, _)| key)
                .collect();
                anyhow::bail!("missing required environment variables: {}", missing.join(", "))
            }
        }
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("gemini_api_key", &"<redacted>")
            .field("line_channel_access_token", &"<redacted>")
            .field("line_user_id", &self.line_user_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn config_from_string() {
        let toml = r#"
            [search]
            max_per_query = 5
            queries = ["Rust language -game"]
            blocklist = ["Oscars"]

            [llm]
            candidate_models = ["model-a", "model-b"]
            temperature = 0.2
        "#;

        let cfg: Config = toml::from_str(toml).expect("parse config");
        assert_eq!(cfg.search.max_per_query, Some(5));
        assert_eq!(cfg.search.queries, vec!["Rust language -game"]);
        assert_eq!(cfg.search.blocklist.as_deref(), Some(&["Oscars".to_string()][..]));
        assert_eq!(cfg.llm.candidate_models.len(), 2);
        assert_eq!(cfg.llm.temperature, Some(0.2));
        assert!(cfg.messaging.api_url.is_none());
    }

    #[tokio::test]
    async fn load_without_files_gives_defaults() {
        let cfg = Config::load_with_defaults(None, None).await.expect("load");
        assert!(cfg.search.queries.is_empty());
        assert!(cfg.search.blocklist.is_none());
        assert!(cfg.llm.candidate_models.is_empty());
    }

    #[tokio::test]
    async fn override_file_takes_precedence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let default_path = dir.path().join("config.default.toml");
        let override_path = dir.path().join("config.toml");
        std::fs::write(
            &default_path,
            "[search]\nregion = \"wt-wt\"\nmax_per_query = 3\n\n[messaging]\ntimeout_seconds = 30\n",
        )
        .expect("write default");
        std::fs::write(&override_path, "[search]\nmax_per_query = 7\n").expect("write override");

        let cfg = Config::load_with_defaults(Some(&default_path), Some(&override_path))
            .await
            .expect("load");
        assert_eq!(cfg.search.max_per_query, Some(7));
        assert_eq!(cfg.search.region.as_deref(), Some("wt-wt"));
        assert_eq!(cfg.messaging.timeout_seconds, Some(30));
    }

    #[tokio::test]
    async fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search\nbroken").expect("write");

        assert!(Config::load_with_defaults(None, Some(&path)).await.is_err());
    }

    #[test]
    fn secrets_all_present() {
        let secrets = Secrets::from_lookup(lookup_from(&[
            (GEMINI_API_KEY_ENV, "g-key"),
            (LINE_TOKEN_ENV, "l-token"),
            (LINE_USER_ID_ENV, "U123"),
        ]))
        .expect("secrets");
        assert_eq!(secrets.gemini_api_key, "g-key");
        assert_eq!(secrets.line_user_id, "U123");
        assert!(!format!("{:?}", secrets).contains("g-key"));
    }

    #[test]
    fn secrets_missing_each_one_fails() {
        let all = [
            (GEMINI_API_KEY_ENV, "g-key"),
            (LINE_TOKEN_ENV, "l-token"),
            (LINE_USER_ID_ENV, "U123"),
        ];
        for skip in 0..all.len() {
            let pairs: Vec<(&str, &str)> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, p)| *p)
                .collect();
            let err = Secrets::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(err.to_string().contains(all[skip].0));
        }
    }

    #[test]
    fn secrets_empty_value_counts_as_missing() {
        let err = Secrets::from_lookup(lookup_from(&[
            (GEMINI_API_KEY_ENV, "g-key"),
            (LINE_TOKEN_ENV, "  "),
            (LINE_USER_ID_ENV, ""),
        ]))
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(LINE_TOKEN_ENV));
        assert!(msg.contains(LINE_USER_ID_ENV));
        assert!(!msg.contains(GEMINI_API_KEY_ENV));
    }
}
