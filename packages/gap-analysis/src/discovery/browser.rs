//! Search-engine results through a headless browser.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::captcha::is_captcha_page;
use super::locale_params;
use super::user_agents::UserAgentRotation;
use super::window::normalize_url;
use crate::browser::PageLoader;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::retry::{jittered, RetryPolicy};
use crate::traits::searcher::SerpSearcher;
use crate::types::config::DiscoveryConfig;
use crate::types::serp::{DiscoveryStrategy, SearchResultEntry, SerpPage, SerpQuery};

const DEFAULT_SEARCH_BASE: &str = "https://www.google.com";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

static RESULT_BLOCKS: LazyLock<Selector> = LazyLock::new(|| selector("div.g, div.MjjYud"));
static RESULT_LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static RESULT_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h3"));
static RESULT_STATS: LazyLock<Selector> = LazyLock::new(|| selector("#result-stats"));

pub struct BrowserSearcher {
    loader: Arc<dyn PageLoader>,
    user_agents: UserAgentRotation,
    discovery: DiscoveryConfig,
    settle_delay: (Duration, Duration),
    base_url: String,
}

impl BrowserSearcher {
    pub fn new(loader: Arc<dyn PageLoader>, config: &DiscoveryConfig) -> Self {
        Self {
            loader,
            user_agents: UserAgentRotation::randomized(),
            discovery: config.clone(),
            settle_delay: config.settle_delay,
            base_url: DEFAULT_SEARCH_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_url(&self, query: &SerpQuery) -> DiscoveryResult<String> {
        let (hl, gl) = locale_params(&query.locale);
        let num = query.result_count.to_string();
        let url = url::Url::parse_with_params(
            &format!("{}/search", self.base_url.trim_end_matches('/')),
            &[
                ("q", query.keyword.as_str()),
                ("hl", hl.as_str()),
                ("gl", gl.as_str()),
                ("num", num.as_str()),
                ("pws", "0"),
            ],
        )
        .map_err(|e| DiscoveryError::Browser(format!("invalid search URL: {}", e)))?;
        Ok(url.into())
    }

    fn captcha_policy(&self, retry_count: Option<u32>) -> RetryPolicy {
        match retry_count {
            Some(retries) => self.discovery.clone().with_retry_count(retries).captcha_policy(),
            None => self.discovery.captcha_policy(),
        }
    }

    async fn attempt(&self, query: &SerpQuery, url: &str, attempt: u32) -> DiscoveryResult<SerpPage> {
        let user_agent = self.user_agents.next_agent();
        let settle = jittered(self.settle_delay.0, self.settle_delay.1);
        debug!(keyword = %query.keyword, attempt, "Loading results page");

        let page = self.loader.load(url, Some(user_agent), settle).await?;

        if is_captcha_page(&page) {
            warn!(keyword = %query.keyword, attempt, final_url = %page.final_url, "CAPTCHA detected");
            return Err(DiscoveryError::CaptchaDetected {
                keyword: query.keyword.clone(),
                attempts: attempt,
                own_rank: None,
            });
        }

        Ok(parse_results_page(
            &page.html,
            query.subject_url.as_deref(),
            query.result_count as usize,
        ))
    }
}

#[async_trait]
impl SerpSearcher for BrowserSearcher {
    async fn search(&self, query: &SerpQuery) -> DiscoveryResult<SerpPage> {
        let url = self.search_url(query)?;
        let policy = self.captcha_policy(query.retry_count);

        let page = policy
            .run(
                |attempt| self.attempt(query, &url, attempt),
                |e| matches!(e, DiscoveryError::CaptchaDetected { .. }),
            )
            .await?;

        info!(
            keyword = %query.keyword,
            results = page.results.len(),
            "Browser search complete"
        );
        Ok(page)
    }

    fn strategy(&self) -> DiscoveryStrategy {
        DiscoveryStrategy::Browser
    }

    fn name(&self) -> &str {
        "browser"
    }
}

/// Extract organic results from a results page.
///
/// Each result block contributes its first external link and its heading.
/// URLs are unique by normalized form; scanning stops at the subject URL
/// (inclusive) or after `limit` results.
pub fn parse_results_page(html: &str, subject_url: Option<&str>, limit: usize) -> SerpPage {
    let document = Html::parse_document(html);
    let subject = subject_url.map(normalize_url);

    let mut seen = HashSet::new();
    let mut results = Vec::new();

    for block in document.select(&RESULT_BLOCKS) {
        if results.len() >= limit {
            break;
        }
        let Some(url) = first_external_link(block) else {
            continue;
        };
        let Some(title) = block
            .select(&RESULT_TITLE)
            .next()
            .map(|h| h.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
        else {
            continue;
        };

        let key = normalize_url(&url);
        if !seen.insert(key.clone()) {
            continue;
        }

        let position = results.len() as u32 + 1;
        results.push(SearchResultEntry::new(url, title, position));

        if subject.as_deref() == Some(key.as_str()) {
            break;
        }
    }

    let total_results = document
        .select(&RESULT_STATS)
        .next()
        .and_then(|el| parse_total(&el.text().collect::<String>()))
        .unwrap_or(results.len() as u64);

    SerpPage {
        results,
        total_results,
    }
}

fn first_external_link(block: ElementRef<'_>) -> Option<String> {
    block
        .select(&RESULT_LINKS)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(resolve_href)
        .find(|href| !is_search_engine_url(href))
}

/// Absolute links pass through; `/url?q=` redirect wrappers are unwrapped.
fn resolve_href(href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    if href.starts_with("/url?") {
        let parsed = url::Url::parse(&format!("https://www.google.com{}", href)).ok()?;
        return parsed
            .query_pairs()
            .find(|(k, _)| k == "q" || k == "url")
            .map(|(_, v)| v.into_owned())
            .filter(|v| v.starts_with("http"));
    }
    None
}

const GOOGLE_SERVICE_HOSTS: &[&str] = &[
    "www", "images", "maps", "news", "translate", "accounts", "policies", "webcache",
];

/// Search and navigation hosts only; content hosts such as
/// developers.google.com are organic results.
fn is_search_engine_url(href: &str) -> bool {
    let Some(host) = url::Url::parse(href)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
    else {
        return true;
    };
    if host.ends_with("googleusercontent.com") || host.ends_with("gstatic.com") {
        return true;
    }
    let labels: Vec<&str> = host.split('.').collect();
    match labels.iter().position(|label| *label == "google") {
        Some(0) => true,
        Some(1) => GOOGLE_SERVICE_HOSTS.contains(&labels[0]),
        _ => false,
    }
}

/// "About 1,230,000 results (0.42 seconds)" / "約 1,230,000 件" -> 1230000
fn parse_total(text: &str) -> Option<u64> {
    let head = text.split(['(', '（']).next().unwrap_or(text);
    let digits: String = head.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
