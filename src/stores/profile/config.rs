use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_CACHE_URL: &str = "wss://cache2.primal.net/v1";

/// Tunables for the profile view
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Caching service the socket connects to
    pub cache_url: String,
    /// Seconds before an unanswered query is given up on
    pub fetch_timeout: u64,
    pub sidebar_notes_limit: u32,
    pub common_followers_limit: u32,
    pub recent_articles_limit: u32,
    pub page_size: u32,
    /// No new-notes check while more than this many are staged
    pub future_notes_cap: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            cache_url: DEFAULT_CACHE_URL.to_string(),
            fetch_timeout: 15,
            sidebar_notes_limit: 8,
            common_followers_limit: 6,
            recent_articles_limit: 2,
            page_size: 20,
            future_notes_cap: 100,
        }
    }
}

impl ProfileConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }
}
