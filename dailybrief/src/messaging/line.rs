use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

use super::Messenger;

pub const DEFAULT_API_URL: &str = "https://api.line.me";

/// LINE rejects text messages longer than this many characters
pub const MAX_TEXT_CHARS: usize = 5000;

/// LINE Messaging API push client.
///
/// Only the token lives here; the HTTP client is built for each push and
/// dropped when the call returns.
pub struct LineMessenger {
    base_url: String,
    access_token: String,
    timeout: Duration,
}

impl LineMessenger {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = Duration::from_secs(timeout_secs);
        self
    }
}

#[async_trait::async_trait]
impl Messenger for LineMessenger {
    async fn push_text(&self, recipient: &str, text: &str) -> Result<()> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .context("failed to build reqwest client")?;

        let text = fit_message(text);
        let body = PushMessageRequest {
            to: recipient,
            messages: vec![TextMessage {
                kind: "text",
                text: &text,
            }],
        };

        let response = client
            .post(format!("{}/v2/bot/message/push", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .context("LINE push request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LINE push failed with status {}: {}", status, body);
        }

        Ok(())
    }
}

/// Truncate to the LINE limit, keeping a single message
fn fit_message(text: &str) -> String {
    let total = text.chars().count();
    if total <= MAX_TEXT_CHARS {
        return text.to_string();
    }

    warn!("Digest has {} chars, truncating to {}", total, MAX_TEXT_CHARS);
    let mut truncated: String = text.chars().take(MAX_TEXT_CHARS - 1).collect();
    truncated.push('…');
    truncated
}

#[derive(Debug, Serialize)]
struct PushMessageRequest<'a> {
    to: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(fit_message("短訊息"), "短訊息");
        let exact = "a".repeat(MAX_TEXT_CHARS);
        assert_eq!(fit_message(&exact), exact);
    }

    #[test]
    fn long_text_is_cut_on_char_boundary() {
        let long = "新".repeat(MAX_TEXT_CHARS + 10);
        let fitted = fit_message(&long);
        assert_eq!(fitted.chars().count(), MAX_TEXT_CHARS);
        assert!(fitted.ends_with('…'));
    }

    #[test]
    fn push_body_shape() {
        let body = PushMessageRequest {
            to: "U123",
            messages: vec![TextMessage { kind: "text", text: "hi" }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"to": "U123", "messages": [{"type": "text", "text": "hi"}]})
        );
    }
}
