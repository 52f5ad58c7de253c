/// Built-in topic queries. Each one carries `-term` exclusions so the search
/// provider drops entertainment and sports coverage before we ever see it.
pub const DEFAULT_QUERIES: [&str; 3] = [
    "Major International Geopolitics -celebrity -gossip -sport -movie",
    "Global Economic Impact -stock -crypto",
    "Scientific Research Breakthroughs AI Space -movie -fiction",
];

/// A single topic query, sent verbatim to the search provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    text: String,
}

impl NewsQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Negative keywords embedded in the query (without the leading `-`)
    pub fn exclusions(&self) -> Vec<&str> {
        self.text
            .split_whitespace()
            .filter_map(|word| word.strip_prefix('-'))
            .filter(|term| !term.is_empty())
            .collect()
    }
}

impl std::fmt::Display for NewsQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

pub fn default_queries() -> Vec<NewsQuery> {
    DEFAULT_QUERIES.iter().map(|q| NewsQuery::new(*q)).collect()
}

/// Configured queries, or the built-in ones when nothing usable is configured.
pub fn queries_or_default(configured: &[String]) -> Vec<NewsQuery> {
    let queries: Vec<NewsQuery> = configured
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .map(NewsQuery::new)
        .collect();

    if queries.is_empty() {
        default_queries()
    } else {
        queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_queries_are_ordered_topics() {
        let queries = default_queries();
        assert_eq!(queries.len(), 3);
        assert!(queries[0].as_str().starts_with("Major International Geopolitics"));
        assert!(queries[1].as_str().starts_with("Global Economic Impact"));
        assert!(queries[2].as_str().starts_with("Scientific Research Breakthroughs"));
        assert_eq!(default_queries(), queries);
    }

    #[test]
    fn every_default_query_excludes_something() {
        for q in default_queries() {
            assert!(!q.exclusions().is_empty(), "no exclusions in {}", q);
        }
        assert_eq!(
            default_queries()[0].exclusions(),
            vec!["celebrity", "gossip", "sport", "movie"]
        );
    }

    #[test]
    fn configured_queries_replace_defaults() {
        let configured = vec!["Rust -game".to_string(), "   ".to_string()];
        let queries = queries_or_default(&configured);
        assert_eq!(queries, vec![NewsQuery::new("Rust -game")]);

        assert_eq!(queries_or_default(&[]), default_queries());
        assert_eq!(queries_or_default(&[" ".to_string()]), default_queries());
    }
}
