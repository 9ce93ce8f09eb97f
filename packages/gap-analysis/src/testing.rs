//! Testing utilities including mock implementations.
//!
//! Every trait the pipeline depends on has a mock here, so the whole
//! three-stage run can be exercised without network access, a browser or an
//! LLM. Mocks record their calls for assertions.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::browser::{LoadedPage, PageLoader};
use crate::error::{
    BrowserError, BrowserResult, DiscoveryError, DiscoveryResult, FetchError, FetchResult,
    SemanticError, SemanticResult, TelemetryError, TelemetryResult,
};
use crate::pipeline::AnalysisReport;
use crate::traits::{
    analyzer::SemanticAnalyzer,
    fetcher::DocumentFetcher,
    searcher::SerpSearcher,
    sink::ReportSink,
    telemetry::{TelemetryDimension, TelemetryQuery, TelemetryRow, TelemetrySource},
};
use crate::types::{
    document::ScrapedDocument,
    semantic::SemanticDiffResult,
    serp::{DiscoveryStrategy, SerpPage, SerpQuery},
    telemetry::{KeywordRecord, SiteIdentifier},
};

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// A mock telemetry source serving fixed date and keyword rows.
#[derive(Default)]
pub struct MockTelemetrySource {
    date_rows: Vec<TelemetryRow>,
    keyword_rows: Vec<TelemetryRow>,
    /// Properties (wire form) that answer with 403
    unauthorized: HashSet<String>,
    calls: Arc<RwLock<Vec<(String, TelemetryDimension)>>>,
}

impl MockTelemetrySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Daily rows as `(YYYY-MM-DD, position, impressions)`.
    pub fn with_date_rows(mut self, rows: Vec<(&str, f64, f64)>) -> Self {
        self.date_rows.extend(rows.into_iter().map(|(date, position, impressions)| TelemetryRow {
            keys: vec![date.to_string()],
            clicks: 0.0,
            impressions,
            ctr: 0.0,
            position,
        }));
        self
    }

    pub fn with_keyword(mut self, record: KeywordRecord) -> Self {
        self.keyword_rows.push(TelemetryRow {
            keys: vec![record.keyword],
            clicks: record.clicks,
            impressions: record.impressions,
            ctr: record.ctr,
            position: record.position,
        });
        self
    }

    /// Answer 403 for this property, e.g. `"https://example.com/"`.
    pub fn unauthorized_for(mut self, property: impl Into<String>) -> Self {
        self.unauthorized.insert(property.into());
        self
    }

    /// Properties queried so far, in order.
    pub fn queried_sites(&self) -> Vec<String> {
        self.calls.read().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }
}

#[async_trait]
impl TelemetrySource for MockTelemetrySource {
    async fn query(
        &self,
        site: &SiteIdentifier,
        query: &TelemetryQuery,
    ) -> TelemetryResult<Vec<TelemetryRow>> {
        let property = site.as_property();
        let dimension = query
            .dimensions
            .first()
            .copied()
            .unwrap_or(TelemetryDimension::Date);
        self.calls.write().unwrap().push((property.clone(), dimension));

        if self.unauthorized.contains(&property) {
            return Err(TelemetryError::Unauthorized {
                site: property,
                message: "User does not have sufficient permission for site".into(),
            });
        }

        Ok(match dimension {
            TelemetryDimension::Date => self.date_rows.clone(),
            TelemetryDimension::Query => self.keyword_rows.clone(),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum SearchBehavior {
    Page(SerpPage),
    Captcha,
    Fail(String),
}

/// A mock search strategy.
pub struct MockSearcher {
    strategy: DiscoveryStrategy,
    default: SearchBehavior,
    by_keyword: HashMap<String, SearchBehavior>,
    available: bool,
    queries: Arc<RwLock<Vec<SerpQuery>>>,
}

impl MockSearcher {
    fn with_strategy(strategy: DiscoveryStrategy) -> Self {
        Self {
            strategy,
            default: SearchBehavior::Page(SerpPage::default()),
            by_keyword: HashMap::new(),
            available: true,
            queries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Mock that reports itself as the browser strategy.
    pub fn browser() -> Self {
        Self::with_strategy(DiscoveryStrategy::Browser)
    }

    /// Mock that reports itself as the API strategy.
    pub fn api() -> Self {
        Self::with_strategy(DiscoveryStrategy::Api)
    }

    /// Page returned for any keyword without a specific entry.
    pub fn with_page(mut self, page: SerpPage) -> Self {
        self.default = SearchBehavior::Page(page);
        self
    }

    pub fn with_keyword_page(mut self, keyword: impl Into<String>, page: SerpPage) -> Self {
        self.by_keyword.insert(keyword.into(), SearchBehavior::Page(page));
        self
    }

    /// Every search ends in `CaptchaDetected`.
    pub fn with_captcha(mut self) -> Self {
        self.default = SearchBehavior::Captcha;
        self
    }

    /// Searches for this keyword fail with a browser error.
    pub fn with_failure(mut self, keyword: impl Into<String>, message: impl Into<String>) -> Self {
        self.by_keyword
            .insert(keyword.into(), SearchBehavior::Fail(message.into()));
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn queries(&self) -> Vec<SerpQuery> {
        self.queries.read().unwrap().clone()
    }
}

#[async_trait]
impl SerpSearcher for MockSearcher {
    async fn search(&self, query: &SerpQuery) -> DiscoveryResult<SerpPage> {
        self.queries.write().unwrap().push(query.clone());
        let behavior = self
            .by_keyword
            .get(&query.keyword)
            .cloned()
            .unwrap_or_else(|| self.default.clone());

        match behavior {
            SearchBehavior::Page(page) => Ok(page),
            SearchBehavior::Captcha => Err(DiscoveryError::CaptchaDetected {
                keyword: query.keyword.clone(),
                attempts: 1,
                own_rank: None,
            }),
            SearchBehavior::Fail(message) => Err(DiscoveryError::Browser(message)),
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn strategy(&self) -> DiscoveryStrategy {
        self.strategy
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// A mock fetcher serving prebuilt documents by URL.
#[derive(Default)]
pub struct MockFetcher {
    documents: HashMap<String, ScrapedDocument>,
    not_found: HashSet<String>,
    failures: HashMap<String, u16>,
    delay: Option<Duration>,
    fetched: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `doc` at `doc.url`.
    pub fn with_document(mut self, doc: ScrapedDocument) -> Self {
        self.documents.insert(doc.url.clone(), doc);
        self
    }

    pub fn with_not_found(mut self, url: impl Into<String>) -> Self {
        self.not_found.insert(url.into());
        self
    }

    /// Fail this URL with an HTTP status.
    pub fn with_failure(mut self, url: impl Into<String>, status: u16) -> Self {
        self.failures.insert(url.into(), status);
        self
    }

    /// Sleep this long (tokio time) before every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched.read().unwrap().clone()
    }
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<ScrapedDocument> {
        self.fetched.write().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.not_found.contains(url) {
            return Err(FetchError::NotFound { url: url.to_string() });
        }
        if let Some(status) = self.failures.get(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            });
        }
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound { url: url.to_string() })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Semantic analysis
// ---------------------------------------------------------------------------

/// Record of a call made to the mock analyzer.
#[derive(Debug, Clone)]
pub struct MockAnalyzerCall {
    pub keyword: String,
    pub competitor_urls: Vec<String>,
    pub locale: String,
}

/// A mock LLM backend.
///
/// Responses are raw model text and go through the real parse/validation
/// step, so malformed output behaves exactly as it would in production.
pub struct MockAnalyzer {
    default_response: String,
    responses: HashMap<String, String>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    available: bool,
    calls: Arc<RwLock<Vec<MockAnalyzerCall>>>,
}

impl Default for MockAnalyzer {
    fn default() -> Self {
        Self {
            default_response: r#"{"whyCompetitorsRankHigher": "Competitors cover the topic in more depth."}"#.to_string(),
            responses: HashMap::new(),
            failing: HashSet::new(),
            delay: None,
            available: true,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw text returned for keywords without a specific response.
    pub fn with_default_response(mut self, raw: impl Into<String>) -> Self {
        self.default_response = raw.into();
        self
    }

    pub fn with_response(mut self, keyword: impl Into<String>, raw: impl Into<String>) -> Self {
        self.responses.insert(keyword.into(), raw.into());
        self
    }

    /// Calls for this keyword fail with an API error.
    pub fn with_error(mut self, keyword: impl Into<String>) -> Self {
        self.failing.insert(keyword.into());
        self
    }

    /// Sleep this long (tokio time) before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn calls(&self) -> Vec<MockAnalyzerCall> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl SemanticAnalyzer for MockAnalyzer {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn analyze_semantic_diff(
        &self,
        keyword: &str,
        _own_doc: &ScrapedDocument,
        competitor_docs: &[ScrapedDocument],
        locale: &str,
    ) -> SemanticResult<SemanticDiffResult> {
        self.calls.write().unwrap().push(MockAnalyzerCall {
            keyword: keyword.to_string(),
            competitor_urls: competitor_docs.iter().map(|d| d.url.clone()).collect(),
            locale: locale.to_string(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(keyword) {
            return Err(SemanticError::Api("mock failure".into()));
        }

        let raw = self
            .responses
            .get(keyword)
            .unwrap_or(&self.default_response);
        Ok(crate::semantic::parse_semantic_response(raw, keyword, competitor_docs))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Browser
// ---------------------------------------------------------------------------

/// A results page that trips CAPTCHA detection.
pub fn captcha_page() -> LoadedPage {
    LoadedPage {
        html: r#"<html><body><form id="captcha-form"></form></body></html>"#.to_string(),
        title: "Sorry...".to_string(),
        final_url: "https://www.google.com/sorry/index".to_string(),
    }
}

/// A normal page with the given HTML.
pub fn results_page(html: &str) -> LoadedPage {
    LoadedPage {
        html: html.to_string(),
        title: "Search results".to_string(),
        final_url: "https://www.google.com/search".to_string(),
    }
}

/// A mock page loader.
///
/// Pages queued with [`with_sequence`](Self::with_sequence) are served first,
/// in order, regardless of URL; after that pages are looked up by URL.
#[derive(Default)]
pub struct MockPageLoader {
    pages: HashMap<String, String>,
    sequence: RwLock<VecDeque<LoadedPage>>,
    loads: Arc<RwLock<Vec<(String, Option<String>)>>>,
}

impl MockPageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn with_sequence(self, pages: Vec<LoadedPage>) -> Self {
        self.sequence.write().unwrap().extend(pages);
        self
    }

    pub fn loaded_urls(&self) -> Vec<String> {
        self.loads.read().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }

    pub fn user_agents(&self) -> Vec<Option<String>> {
        self.loads.read().unwrap().iter().map(|(_, ua)| ua.clone()).collect()
    }
}

#[async_trait]
impl PageLoader for MockPageLoader {
    async fn load(
        &self,
        url: &str,
        user_agent: Option<&str>,
        _settle: Duration,
    ) -> BrowserResult<LoadedPage> {
        self.loads
            .write()
            .unwrap()
            .push((url.to_string(), user_agent.map(str::to_string)));

        if let Some(page) = self.sequence.write().unwrap().pop_front() {
            return Ok(page);
        }
        match self.pages.get(url) {
            Some(html) => Ok(LoadedPage {
                html: html.clone(),
                title: String::new(),
                final_url: url.to_string(),
            }),
            None => Err(BrowserError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".into(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Collects delivered reports in memory.
#[derive(Default)]
pub struct MemorySink {
    reports: Arc<RwLock<Vec<AnalysisReport>>>,
    fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose deliveries always fail (after recording the report).
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn reports(&self) -> Vec<AnalysisReport> {
        self.reports.read().unwrap().clone()
    }
}

#[async_trait]
impl ReportSink for MemorySink {
    async fn deliver(&self, report: &AnalysisReport) -> anyhow::Result<()> {
        self.reports.write().unwrap().push(report.clone());
        if self.fail {
            anyhow::bail!("sink unavailable");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
