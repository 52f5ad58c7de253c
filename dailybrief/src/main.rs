/*
dailybrief - main.rs
Runs the daily digest once: search the news, have the model write the briefing,
print it, and push it to the configured LINE user. Scheduling is left to cron.
*/

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use common::{Config, Secrets};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use dailybrief::llm::gemini::{self, GeminiProvider};
use dailybrief::llm::summarizer;
use dailybrief::messaging::line::{self, LineMessenger};
use dailybrief::pipeline::{self, Providers, RunSettings};
use dailybrief::search::duckduckgo::{self, DuckDuckGoProvider};
use dailybrief::settings;

#[derive(Parser, Debug)]
#[command(name = "dailybrief", about = "Search, summarize and push today's news digest")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Maximum accepted results per topic query
    #[arg(long)]
    max_per_query: Option<usize>,

    /// Print the digest without sending it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Secrets come first: a missing one must stop the run before any network call
    let secrets = match Secrets::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!(%e, "environment incomplete, check the .env file");
            return Err(e);
        }
    };

    let config = load_config(args.config).await?;

    let search_settings = settings::search_settings(&config.search, args.max_per_query)?;
    let summarizer_settings = settings::summarizer_settings(&config.llm);

    let providers = build_providers(&config, &secrets);
    let run_settings = RunSettings {
        search: search_settings,
        summarizer: summarizer_settings,
        recipient: secrets.line_user_id.clone(),
        dry_run: args.dry_run,
    };

    let today = Local::now().date_naive();
    let outcome = pipeline::run_digest(&providers, &run_settings, today, &mut std::io::stdout()).await;
    info!(?outcome, "run finished");

    Ok(())
}

async fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = explicit {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = match Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default_file = ?default_path, override_file = ?override_path, "configuration loaded");

    Ok(config)
}

fn build_providers(config: &Config, secrets: &Secrets) -> Providers {
    let search_cfg = &config.search;
    let search = DuckDuckGoProvider::new(
        search_cfg
            .base_url
            .clone()
            .unwrap_or_else(|| duckduckgo::DEFAULT_BASE_URL.to_string()),
    )
    .with_timeout(search_cfg.timeout_seconds.unwrap_or(20));

    let llm_cfg = &config.llm;
    let llm = GeminiProvider::new(
        llm_cfg
            .api_url
            .clone()
            .unwrap_or_else(|| gemini::DEFAULT_API_URL.to_string()),
        secrets.gemini_api_key.clone(),
    )
    .with_defaults(
        llm_cfg.timeout_seconds.unwrap_or(120),
        llm_cfg.max_tokens,
        llm_cfg.temperature.unwrap_or(summarizer::DEFAULT_TEMPERATURE),
    );

    let messaging_cfg = &config.messaging;
    let messenger = LineMessenger::new(
        messaging_cfg
            .api_url
            .clone()
            .unwrap_or_else(|| line::DEFAULT_API_URL.to_string()),
        secrets.line_channel_access_token.clone(),
    )
    .with_timeout(messaging_cfg.timeout_seconds.unwrap_or(30));

    Providers {
        search: Arc::new(search),
        llm: Arc::new(llm),
        messenger: Arc::new(messenger),
    }
}
