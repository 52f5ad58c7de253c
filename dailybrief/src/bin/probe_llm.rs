// Manual smoke test for the Gemini provider: sends a tiny digest prompt to
// each candidate model and reports which ones answer.

use chrono::Local;
use dailybrief::llm::gemini::{GeminiProvider, DEFAULT_API_URL};
use dailybrief::llm::summarizer::{build_prompt, SummarizerSettings};
use dailybrief::llm::{LlmProvider, LlmRequest};
use dailybrief::search::{NewsItem, SearchResult};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let _ = dotenv::dotenv();
    let api_key = match std::env::var(common::GEMINI_API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            eprintln!("Set {} in the environment or .env", common::GEMINI_API_KEY_ENV);
            std::process::exit(1);
        }
    };
    let base_url = std::env::var("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

    let settings = SummarizerSettings::default();
    let provider = GeminiProvider::new(&base_url, api_key);

    let sample = SearchResult::new(
        "Researchers report sustained fusion reaction",
        "A tokamak held plasma for a record duration, the lab said on Thursday.",
        "https://example.org/fusion",
    );
    let items = vec![NewsItem::format("Breakthrough Science Technology", &sample)];
    let prompt = build_prompt(&items, Local::now().date_naive(), &settings);

    for model in &settings.candidate_models {
        println!("\n{}", "=".repeat(60));
        println!("Model: {}", model);
        println!("{}", "=".repeat(60));

        let request = LlmRequest {
            model: model.clone(),
            prompt: prompt.clone(),
            max_tokens: settings.max_tokens,
            temperature: Some(settings.temperature),
            timeout_seconds: Some(60),
        };

        match provider.generate(request).await {
            Ok(resp) => {
                println!("✓ Success ({})", resp.model);
                println!("{}", resp.content);
                println!(
                    "  Usage: {} tokens (prompt: {}, completion: {})",
                    resp.usage.total_tokens, resp.usage.prompt_tokens, resp.usage.completion_tokens
                );
            }
            Err(e) => eprintln!("✗ Failed: {:#}", e),
        }
    }
}
