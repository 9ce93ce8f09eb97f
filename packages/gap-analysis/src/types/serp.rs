//! Search-result discovery types.

use serde::{Deserialize, Serialize};

/// One organic result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultEntry {
    pub url: String,
    pub title: String,
    /// 1-based rank
    pub position: u32,
}

impl SearchResultEntry {
    pub fn new(url: impl Into<String>, title: impl Into<String>, position: u32) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            position,
        }
    }
}

/// Query sent to a [`SerpSearcher`](crate::traits::searcher::SerpSearcher).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerpQuery {
    pub keyword: String,
    pub locale: String,
    pub result_count: u32,
    /// Scanning may stop once this URL is seen.
    pub subject_url: Option<String>,
    /// CAPTCHA retries after the first attempt; `None` keeps the searcher's default.
    #[serde(default)]
    pub retry_count: Option<u32>,
}

/// A results page as returned by either strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerpPage {
    pub results: Vec<SearchResultEntry>,
    pub total_results: u64,
}

/// Which strategy produced a competitor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStrategy {
    Browser,
    Api,
}

/// Discovery result for one keyword, after windowing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorSet {
    pub keyword: String,
    pub competitors: Vec<SearchResultEntry>,
    pub own_position: Option<u32>,
    pub total_results: u64,
    pub strategy: DiscoveryStrategy,
}
