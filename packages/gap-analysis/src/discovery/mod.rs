//! Competitor discovery.
//!
//! [`SearchResultDiscoverer`] chooses between the browser and search-API
//! strategies, falls back from a CAPTCHA-blocked browser to the API, and
//! windows the raw results down to the pages that outrank the subject.

mod api;
mod browser;
pub mod captcha;
pub mod user_agents;
pub mod window;

pub use api::SerpApiSearcher;
pub use browser::{parse_results_page, BrowserSearcher};
pub use window::{apply_competitor_window, normalize_url};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::retry::jittered;
use crate::traits::searcher::SerpSearcher;
use crate::types::config::DiscoveryConfig;
use crate::types::serp::{CompetitorSet, DiscoveryStrategy, SerpPage, SerpQuery};

/// Discovery input for one keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRequest {
    pub keyword: String,
    pub subject_url: String,
    pub locale: String,
    pub max_competitors: usize,
    pub api_preferred: bool,
    /// CAPTCHA retries after the first browser attempt
    pub retry_count: u32,
    /// Rank reported by telemetry; sizes the API request
    pub known_own_rank: Option<u32>,
}

impl DiscoveryRequest {
    pub fn new(keyword: impl Into<String>, subject_url: impl Into<String>, locale: impl Into<String>) -> Self {
        let defaults = DiscoveryConfig::default();
        Self {
            keyword: keyword.into(),
            subject_url: subject_url.into(),
            locale: locale.into(),
            max_competitors: defaults.max_competitors,
            api_preferred: defaults.api_preferred,
            retry_count: defaults.retry_count,
            known_own_rank: None,
        }
    }

    /// Copy limits and strategy preference from configuration.
    pub fn with_config(mut self, config: &DiscoveryConfig) -> Self {
        self.max_competitors = config.max_competitors;
        self.api_preferred = config.api_preferred;
        self.retry_count = config.retry_count;
        self
    }

    pub fn with_retry_count(mut self, retries: u32) -> Self {
        self.retry_count = retries;
        self
    }

    pub fn with_known_own_rank(mut self, rank: Option<u32>) -> Self {
        self.known_own_rank = rank;
        self
    }
}

/// Results to request: enough to cover the subject's neighbourhood.
pub fn result_count_for_rank(known_own_rank: Option<u32>) -> u32 {
    match known_own_rank {
        Some(rank) if rank <= 5 => 10,
        Some(rank) if rank <= 10 => 15,
        _ => 20,
    }
}

/// `hl` / `gl` query parameters for a locale tag such as `ja`, `en-GB`.
pub(crate) fn locale_params(locale: &str) -> (String, String) {
    let mut parts = locale.split(['-', '_']);
    let language = parts
        .next()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| "en".to_string());
    let country = match parts.next() {
        Some(region) if !region.trim().is_empty() => region.trim().to_lowercase(),
        _ => match language.as_str() {
            "ja" => "jp",
            "en" => "us",
            "ko" => "kr",
            "zh" => "cn",
            other => other,
        }
        .to_string(),
    };
    (language, country)
}

pub struct SearchResultDiscoverer {
    browser: Option<Arc<dyn SerpSearcher>>,
    api: Option<Arc<dyn SerpSearcher>>,
    config: DiscoveryConfig,
}

impl SearchResultDiscoverer {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            browser: None,
            api: None,
            config,
        }
    }

    pub fn with_browser(mut self, searcher: Arc<dyn SerpSearcher>) -> Self {
        self.browser = Some(searcher);
        self
    }

    pub fn with_api(mut self, searcher: Arc<dyn SerpSearcher>) -> Self {
        self.api = Some(searcher);
        self
    }

    fn api(&self) -> Option<&Arc<dyn SerpSearcher>> {
        self.api.as_ref().filter(|s| s.is_available())
    }

    fn browser(&self) -> Option<&Arc<dyn SerpSearcher>> {
        self.browser.as_ref().filter(|s| s.is_available())
    }

    /// Strategy a run will start with, which also picks the inter-keyword delay.
    pub fn primary_strategy(&self, api_preferred: bool) -> Option<DiscoveryStrategy> {
        match (self.browser(), self.api()) {
            (_, Some(_)) if api_preferred => Some(DiscoveryStrategy::Api),
            (Some(_), _) => Some(DiscoveryStrategy::Browser),
            (None, Some(_)) => Some(DiscoveryStrategy::Api),
            (None, None) => None,
        }
    }

    /// Pause to take before the next keyword of a run.
    pub fn inter_keyword_delay(&self, api_preferred: bool) -> Duration {
        let (min, max) = match self.primary_strategy(api_preferred) {
            Some(DiscoveryStrategy::Browser) => self.config.browser_keyword_delay,
            _ => self.config.api_keyword_delay,
        };
        jittered(min, max)
    }

    async fn search_with(
        &self,
        searcher: &Arc<dyn SerpSearcher>,
        request: &DiscoveryRequest,
        known_own_rank: Option<u32>,
    ) -> DiscoveryResult<CompetitorSet> {
        let query = SerpQuery {
            keyword: request.keyword.clone(),
            locale: request.locale.clone(),
            result_count: result_count_for_rank(known_own_rank),
            subject_url: Some(request.subject_url.clone()),
            retry_count: Some(request.retry_count),
        };
        let page = searcher.search(&query).await?;
        Ok(self.window(request, page, searcher.strategy()))
    }

    fn window(&self, request: &DiscoveryRequest, page: SerpPage, strategy: DiscoveryStrategy) -> CompetitorSet {
        let (competitors, own_position) =
            apply_competitor_window(&page.results, &request.subject_url, request.max_competitors);

        info!(
            keyword = %request.keyword,
            strategy = ?strategy,
            own_position = ?own_position,
            competitors = competitors.len(),
            "Discovered competitors"
        );

        CompetitorSet {
            keyword: request.keyword.clone(),
            competitors,
            own_position,
            total_results: page.total_results,
            strategy,
        }
    }

    /// Find the competitors that outrank the subject for one keyword.
    pub async fn discover(&self, request: &DiscoveryRequest) -> DiscoveryResult<CompetitorSet> {
        if request.api_preferred {
            if let Some(api) = self.api() {
                return self.search_with(api, request, request.known_own_rank).await;
            }
        }

        let Some(browser) = self.browser() else {
            return match self.api() {
                Some(api) => self.search_with(api, request, request.known_own_rank).await,
                None => Err(DiscoveryError::NoStrategy),
            };
        };

        match self.search_with(browser, request, request.known_own_rank).await {
            Err(DiscoveryError::CaptchaDetected { own_rank, attempts, .. }) => {
                let carried_rank = own_rank.or(request.known_own_rank);
                match self.api() {
                    Some(api) => {
                        warn!(
                            keyword = %request.keyword,
                            attempts,
                            known_own_rank = ?carried_rank,
                            "Browser blocked by CAPTCHA, falling back to search API"
                        );
                        self.search_with(api, request, carried_rank).await
                    }
                    None => {
                        warn!(keyword = %request.keyword, attempts, "Browser blocked by CAPTCHA and no search API configured");
                        Err(DiscoveryError::RetryLater {
                            keyword: request.keyword.clone(),
                        })
                    }
                }
            }
            other => other,
        }
    }
}
