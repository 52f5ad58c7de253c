// Manual smoke test for the news search provider: runs each topic query
// against the live endpoint and prints what the searcher would keep.

use dailybrief::query;
use dailybrief::search::duckduckgo::{DuckDuckGoProvider, DEFAULT_BASE_URL};
use dailybrief::search::{rejection, NewsRequest, ResultStream, SearchProvider, SearchSettings};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let base_url = std::env::var("SEARCH_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let provider = DuckDuckGoProvider::new(&base_url).with_max_pages(1);
    let settings = SearchSettings::default();

    for q in query::default_queries() {
        println!("\n{}", "=".repeat(60));
        println!("Query: {}", q);
        println!("{}", "=".repeat(60));

        let request = NewsRequest {
            query: q.as_str().to_string(),
            region: settings.region.clone(),
            safesearch: settings.safesearch,
            timelimit: settings.timelimit,
        };

        let mut stream = match provider.news(&request).await {
            Ok(stream) => stream,
            Err(e) => {
                println!("✗ Failed: {:#}", e);
                continue;
            }
        };

        for i in 1..=10 {
            match stream.next_result().await {
                Ok(Some(result)) => {
                    let verdict = rejection(&result, &settings.blocklist).unwrap_or_else(|| "kept".to_string());
                    println!("  {}. [{}] {}", i, verdict, result.title);
                    println!("     URL: {}", result.url);
                    println!(
                        "     Source: {}  Published: {}",
                        result.source.as_deref().unwrap_or("?"),
                        result.published.as_deref().unwrap_or("?")
                    );
                }
                Ok(None) => break,
                Err(e) => {
                    println!("✗ Failed mid-stream: {:#}", e);
                    break;
                }
            }
        }
    }
}
