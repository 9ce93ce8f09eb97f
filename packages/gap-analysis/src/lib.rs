//! Competitive Content-Gap Analysis
//!
//! Explains why a page lost search ranking by comparing it against the pages
//! that now outrank it.
//!
//! # Design Philosophy
//!
//! - Every external dependency (telemetry, search engine, origin servers,
//!   LLM) sits behind a trait and can be mocked
//! - Degrade instead of failing: a blocked search, a dead competitor page or
//!   a malformed model response shrinks the report, it does not end the run
//! - Budget-aware: the content stage finishes within a fixed wall-clock limit
//!   and flags anything it had to leave out
//!
//! # Usage
//!
//! ```rust,ignore
//! use gap_analysis::{AnalysisRequest, PipelineConfig, PipelineOrchestrator, SiteIdentifier};
//!
//! let orchestrator = PipelineOrchestrator::new(config, telemetry, discoverer, fetcher, analyzer);
//! let request = AnalysisRequest::new(
//!     SiteIdentifier::parse("sc-domain:example.com"),
//!     "https://example.com/guide",
//! )
//! .with_locale("ja");
//!
//! let report = orchestrator.run(&request).await?;
//! println!("{}", report.summary().headline);
//! ```
//!
//! # Modules
//!
//! - [`telemetry`] - Ranking time series and keyword rows for a page
//! - [`detection`] - Weighted positions and drop/rise detection
//! - [`keywords`] - Keyword normalization, scoring and selection
//! - [`discovery`] - Competitor discovery (browser automation, search API)
//! - [`fetch`] - Document fetching and HTML parsing
//! - [`analysis`] - Structural diff and quality signals
//! - [`semantic`] - LLM semantic diff backends
//! - [`pipeline`] - Three-stage orchestration under a budget
//! - [`testing`] - Mock implementations for testing

pub mod analysis;
pub mod browser;
pub mod deadline;
pub mod detection;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod keywords;
pub mod pipeline;
pub mod retry;
pub mod security;
pub mod semantic;
pub mod telemetry;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    BrowserError, DiscoveryError, FetchError, PipelineError, SemanticError, TelemetryError,
};
pub use traits::{
    analyzer::SemanticAnalyzer,
    fetcher::DocumentFetcher,
    searcher::SerpSearcher,
    sink::ReportSink,
    telemetry::{AccessTokenProvider, StaticTokenProvider, TelemetrySource},
};
pub use types::{
    config::{
        DetectionConfig, DiscoveryConfig, FetchConfig, KeywordConfig, LlmProvider,
        PipelineConfig, SemanticConfig,
    },
    diff::{DiffReport, QualityChecklist, QualityReport, QualitySignal},
    document::ScrapedDocument,
    keyword::PrioritizedKeyword,
    semantic::SemanticDiffResult,
    serp::{CompetitorSet, DiscoveryStrategy, SearchResultEntry},
    telemetry::{DateRange, KeywordRecord, SiteIdentifier, TimeSeriesPoint},
};

// Re-export components
pub use analysis::{ContentDiffEngine, QualitySignalChecker};
pub use browser::{BrowserConfig, ChromePageLoader, PageLoader};
pub use detection::{RankChange, RankChangeDetector};
pub use discovery::{
    BrowserSearcher, DiscoveryRequest, SearchResultDiscoverer, SerpApiSearcher,
};
pub use fetch::{ContentFetcher, HttpFetcher, RenderedFetcher};
pub use keywords::KeywordSelector;
pub use semantic::{build_analyzer, LlmKeys};
pub use telemetry::{SearchConsoleSource, TelemetryClient};

// Re-export pipeline
pub use pipeline::{
    AnalysisReport, AnalysisRequest, ContentStageOutput, DiscoveryStageOutput,
    KeywordStageOutput, PipelineOrchestrator, ReportSummary, SemanticStatus,
};
