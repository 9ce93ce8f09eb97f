//! End-to-end tests for the three-stage pipeline.
//!
//! Every external dependency is mocked:
//! 1. Telemetry (ranking time series + keyword rows)
//! 2. Search results (API strategy)
//! 3. Document fetches
//! 4. LLM backend

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use gap_analysis::{
    semantic::DisabledAnalyzer,
    testing::{MemorySink, MockAnalyzer, MockFetcher, MockSearcher, MockTelemetrySource},
    types::semantic::ANALYSIS_FAILED_MESSAGE,
    AnalysisRequest, DiscoveryConfig, KeywordRecord, PipelineConfig, PipelineError,
    PipelineOrchestrator, ScrapedDocument, SearchResultDiscoverer, SearchResultEntry,
    SemanticAnalyzer, SemanticStatus, SiteIdentifier, TelemetryError,
};
use gap_analysis::types::serp::SerpPage;
use tokio_test::{assert_err, assert_ok};

const PAGE: &str = "https://example.com/guide";
const C1: &str = "https://competitor-one.com/rust-async";
const C2: &str = "https://competitor-two.com/blog/async";
const C3: &str = "https://competitor-three.com/tokio";

fn site() -> SiteIdentifier {
    SiteIdentifier::parse("https://example.com/")
}

fn request() -> AnalysisRequest {
    AnalysisRequest::new(site(), PAGE)
        .with_locale("en")
        .with_as_of(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
}

/// Position 4 for a week, then 9 on the most recent day.
fn telemetry() -> MockTelemetrySource {
    MockTelemetrySource::new()
        .with_date_rows(vec![
            ("2026-10-10", 4.0, 100.0),
            ("2026-10-11", 4.0, 100.0),
            ("2026-10-12", 4.0, 100.0),
            ("2026-10-13", 4.0, 100.0),
            ("2026-10-14", 4.0, 100.0),
            ("2026-10-15", 4.0, 100.0),
            ("2026-10-16", 4.0, 100.0),
            ("2026-10-17", 9.0, 100.0),
        ])
        .with_keyword(KeywordRecord::new("rust async", 14.0, 400.0).with_clicks(5.0))
        .with_keyword(KeywordRecord::new("tokio tutorial", 12.0, 250.0))
        .with_keyword(KeywordRecord::new("rust", 3.0, 1000.0))
}

fn serp(urls: &[&str]) -> SerpPage {
    SerpPage {
        results: urls
            .iter()
            .enumerate()
            .map(|(i, u)| SearchResultEntry::new(*u, format!("Result {}", i + 1), i as u32 + 1))
            .collect(),
        total_results: 120_000,
    }
}

fn searcher() -> MockSearcher {
    MockSearcher::api()
        .with_page(serp(&[C1, C2, C3, PAGE]))
        .with_keyword_page("rust async", serp(&[C1, C2, PAGE, C3]))
        .with_keyword_page("rust", serp(&[C3, PAGE, C1]))
}

fn subject_doc() -> ScrapedDocument {
    ScrapedDocument::new(PAGE)
        .with_title("Async Rust guide")
        .with_heading(1, "Async Rust guide")
        .with_heading(2, "Getting started")
        .with_paragraph("Async programming lets a single thread juggle many connections.")
}

fn competitor_doc(url: &str) -> ScrapedDocument {
    ScrapedDocument::new(url)
        .with_title("Async in depth")
        .with_heading(2, "Getting started")
        .with_heading(2, "Frequently asked questions")
        .with_heading(3, "Is tokio faster than async-std?")
        .with_paragraph("The tokio runtime schedules tasks across worker threads with work stealing.")
        .with_paragraph("Benchmarks show throughput of 120,000 requests per second on eight cores.")
        .with_list(vec!["Install tokio".into(), "Write an async main".into()])
        .with_structured_data(true)
}

fn fetcher() -> MockFetcher {
    MockFetcher::new()
        .with_document(subject_doc())
        .with_document(competitor_doc(C1))
        .with_document(competitor_doc(C2))
        .with_document(competitor_doc(C3))
}

fn config() -> PipelineConfig {
    PipelineConfig::default().with_discovery(DiscoveryConfig::default().without_delays())
}

fn orchestrator(
    config: PipelineConfig,
    telemetry: Arc<MockTelemetrySource>,
    searcher: Arc<MockSearcher>,
    fetcher: Arc<MockFetcher>,
    analyzer: Arc<dyn SemanticAnalyzer>,
) -> PipelineOrchestrator {
    let discoverer = SearchResultDiscoverer::new(config.discovery.clone()).with_api(searcher);
    PipelineOrchestrator::new(config, telemetry, discoverer, fetcher, analyzer)
}

#[tokio::test]
async fn test_full_run_produces_report() {
    let searcher = Arc::new(searcher());
    let fetcher = Arc::new(fetcher());
    let analyzer = Arc::new(MockAnalyzer::new());
    let sink = Arc::new(MemorySink::new());

    let pipeline = orchestrator(
        config(),
        Arc::new(telemetry()),
        searcher.clone(),
        fetcher.clone(),
        analyzer.clone(),
    )
    .with_sink(sink.clone());

    let report = assert_ok!(pipeline.run(&request()).await);

    // Stage 1
    let change = &report.keyword_stage.rank_change;
    assert!(change.detected);
    assert_eq!(change.baseline_position, 4.0);
    assert_eq!(change.recent_position, 9.0);
    let keywords: Vec<&str> = report
        .keyword_stage
        .keywords
        .iter()
        .map(|k| k.keyword.as_str())
        .collect();
    assert_eq!(keywords, vec!["rust async", "rust", "tokio tutorial"]);
    assert_eq!(report.keyword_stage.resolved_site, site());

    // Stage 2
    assert_eq!(report.discovery.results.len(), 3);
    assert_eq!(report.discovery.competitor_urls, vec![C1, C2, C3]);
    assert_eq!(searcher.queries().len(), 3);

    // Stage 3
    let content = &report.content;
    assert_eq!(content.competitors_analyzed, vec![C1, C2, C3]);
    assert_eq!(fetcher.fetched_urls().len(), 4);
    let diff = content.diff.as_ref().unwrap();
    assert_eq!(diff.missing_headings[0].text, "Frequently asked questions");
    assert_eq!(diff.missing_headings[0].competitor_count, 3);
    assert!(!diff.missing_headings.iter().any(|h| h.text == "Getting started"));
    let quality = content.quality.as_ref().unwrap();
    assert!(!quality.missing_elements.is_empty());
    assert!(content
        .semantic
        .iter()
        .all(|s| s.status == SemanticStatus::Completed));
    assert!(!content.partial_results);

    // Each keyword is compared against its own competitors.
    let calls = analyzer.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].competitor_urls, vec![C1, C2]);
    assert_eq!(calls[1].competitor_urls, vec![C3]);
    assert_eq!(calls[2].competitor_urls, vec![C1, C2, C3]);

    // Sink
    let delivered = sink.reports();
    assert_eq!(delivered.len(), 1);
    let summary = delivered[0].summary();
    assert!(summary.drop_detected);
    assert_eq!(summary.competitors_analyzed, 3);
    assert_eq!(summary.site, "https://example.com/");
}

#[tokio::test]
async fn test_unauthorized_retries_alternate_format() {
    let telemetry = Arc::new(telemetry().unauthorized_for("https://example.com/"));
    let pipeline = orchestrator(
        config(),
        telemetry.clone(),
        Arc::new(searcher()),
        Arc::new(fetcher()),
        Arc::new(MockAnalyzer::new()),
    );

    let output = assert_ok!(pipeline.run_keyword_stage(&request()).await);

    assert_eq!(output.resolved_site, SiteIdentifier::Domain("example.com".into()));
    assert!(output.rank_change.detected);
    let sites = telemetry.queried_sites();
    assert_eq!(sites[0], "https://example.com/");
    assert!(sites[1..].iter().all(|s| s == "sc-domain:example.com"));
}

#[tokio::test]
async fn test_unauthorized_on_both_formats_surfaces_original_error() {
    let telemetry = Arc::new(
        telemetry()
            .unauthorized_for("https://example.com/")
            .unauthorized_for("sc-domain:example.com"),
    );
    let pipeline = orchestrator(
        config(),
        telemetry,
        Arc::new(searcher()),
        Arc::new(fetcher()),
        Arc::new(MockAnalyzer::new()),
    );

    let err = assert_err!(pipeline.run(&request()).await);
    match err {
        PipelineError::Telemetry(TelemetryError::Unauthorized { site, .. }) => {
            assert_eq!(site, "https://example.com/");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_relative_page_url_is_rejected_before_telemetry() {
    let telemetry = Arc::new(telemetry());
    let pipeline = orchestrator(
        config(),
        telemetry.clone(),
        Arc::new(searcher()),
        Arc::new(fetcher()),
        Arc::new(MockAnalyzer::new()),
    );
    let request = AnalysisRequest::new(site(), "example.com/guide");

    let err = assert_err!(pipeline.run(&request).await);
    assert!(matches!(err, PipelineError::InvalidRequest(_)));
    assert!(err.user_reason().contains("example.com/guide"));
    assert!(telemetry.queried_sites().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_discovery_pauses_between_keywords() {
    let mut discovery = DiscoveryConfig::default().without_delays();
    discovery.api_keyword_delay = (Duration::from_secs(5), Duration::from_secs(5));
    let searcher = Arc::new(searcher());
    let pipeline = orchestrator(
        PipelineConfig::default().with_discovery(discovery),
        Arc::new(telemetry()),
        searcher.clone(),
        Arc::new(fetcher()),
        Arc::new(MockAnalyzer::new()),
    );
    let request = request();
    let stage1 = assert_ok!(pipeline.run_keyword_stage(&request).await);
    assert_eq!(stage1.keywords.len(), 3);

    let started = tokio::time::Instant::now();
    let stage2 = pipeline.run_discovery_stage(&request, &stage1).await;
    let elapsed = started.elapsed();

    // Two pauses for three keywords, none before the first.
    assert!(elapsed >= Duration::from_secs(10), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(15), "elapsed {:?}", elapsed);
    assert_eq!(searcher.queries().len(), 3);
    assert_eq!(stage2.failed_keywords().count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_budget_exceeded_after_diff_keeps_partial_results() {
    let analyzer = Arc::new(MockAnalyzer::new());
    let pipeline = orchestrator(
        config().with_budget(Duration::from_secs(10)),
        Arc::new(telemetry()),
        Arc::new(searcher()),
        Arc::new(fetcher().with_delay(Duration::from_secs(12))),
        analyzer.clone(),
    );

    let report = assert_ok!(pipeline.run(&request()).await);
    let content = &report.content;

    assert!(content.diff.is_some());
    assert!(content.quality.is_some());
    assert!(content.partial_results);
    assert_eq!(content.semantic.len(), 3);
    assert!(content
        .semantic
        .iter()
        .all(|s| s.status == SemanticStatus::BudgetExceeded && s.result.is_none()));
    assert!(content.merged_semantic().is_none());
    assert!(analyzer.calls().is_empty());
    assert!(content.elapsed_ms >= 12_000);
}

#[tokio::test(start_paused = true)]
async fn test_semantic_calls_are_capped_by_timeout() {
    let analyzer = Arc::new(MockAnalyzer::new().with_delay(Duration::from_secs(20)));
    let pipeline = orchestrator(
        config().with_max_semantic_keywords(2),
        Arc::new(telemetry()),
        Arc::new(searcher()),
        Arc::new(fetcher()),
        analyzer.clone(),
    );

    let report = assert_ok!(pipeline.run(&request()).await);
    let semantic = &report.content.semantic;

    assert_eq!(semantic[0].status, SemanticStatus::TimedOut);
    assert_eq!(semantic[1].status, SemanticStatus::TimedOut);
    assert_eq!(semantic[2].status, SemanticStatus::Skipped);
    let placeholder = semantic[0].result.as_ref().unwrap();
    let why = &placeholder.keyword_specific_analysis[0].why_ranking_dropped;
    assert_ne!(why, ANALYSIS_FAILED_MESSAGE);
    assert!(why.contains("timed out after"));
    assert!(!report.content.partial_results);
}

#[tokio::test]
async fn test_subject_not_found_short_circuits() {
    let analyzer = Arc::new(MockAnalyzer::new());
    let fetcher = MockFetcher::new()
        .with_not_found(PAGE)
        .with_document(competitor_doc(C1))
        .with_document(competitor_doc(C2))
        .with_document(competitor_doc(C3));
    let pipeline = orchestrator(
        config(),
        Arc::new(telemetry()),
        Arc::new(searcher()),
        Arc::new(fetcher),
        analyzer.clone(),
    );

    let report = assert_ok!(pipeline.run(&request()).await);
    let content = &report.content;

    assert!(content.subject_not_found);
    assert!(content.subject_error.is_none());
    assert!(content.diff.is_none());
    assert!(content.quality.is_none());
    assert!(content.semantic.is_empty());
    assert!(analyzer.calls().is_empty());
    assert!(report.summary().headline.contains("404"));
}

#[tokio::test]
async fn test_subject_failure_is_reported() {
    let fetcher = fetcher().with_failure(PAGE, 503);
    let pipeline = orchestrator(
        config(),
        Arc::new(telemetry()),
        Arc::new(searcher()),
        Arc::new(fetcher),
        Arc::new(MockAnalyzer::new()),
    );

    let report = assert_ok!(pipeline.run(&request()).await);

    assert!(!report.content.subject_not_found);
    assert!(report.content.subject_error.as_deref().unwrap().contains("503"));
    assert!(report.content.diff.is_none());
}

#[tokio::test]
async fn test_competitor_fetch_failure_is_skipped() {
    let fetcher = fetcher().with_failure(C2, 500);
    let pipeline = orchestrator(
        config(),
        Arc::new(telemetry()),
        Arc::new(searcher()),
        Arc::new(fetcher),
        Arc::new(MockAnalyzer::new()),
    );

    let report = assert_ok!(pipeline.run(&request()).await);

    assert_eq!(report.content.competitors_analyzed, vec![C1, C3]);
    assert_eq!(report.content.fetch_errors.len(), 1);
    assert_eq!(report.content.fetch_errors[0].url, C2);
    assert!(report.content.diff.is_some());
}

#[tokio::test]
async fn test_discovery_failure_is_recorded_and_batch_continues() {
    let searcher = Arc::new(searcher().with_failure("rust", "navigation blocked"));
    let pipeline = orchestrator(
        config(),
        Arc::new(telemetry()),
        searcher.clone(),
        Arc::new(fetcher()),
        Arc::new(MockAnalyzer::new()),
    );

    let report = assert_ok!(pipeline.run(&request()).await);
    let results = &report.discovery.results;

    assert_eq!(results.len(), 3);
    assert!(results[0].competitors.is_some());
    assert!(results[1].competitors.is_none());
    assert!(results[1].error.as_deref().unwrap().contains("navigation blocked"));
    assert!(results[2].competitors.is_some());
    assert_eq!(report.discovery.failed_keywords().count(), 1);
    assert_eq!(searcher.queries().len(), 3);
}

#[tokio::test]
async fn test_malformed_llm_output_gives_placeholder() {
    let analyzer = Arc::new(MockAnalyzer::new().with_response("rust", "I cannot help with that."));
    let pipeline = orchestrator(
        config(),
        Arc::new(telemetry()),
        Arc::new(searcher()),
        Arc::new(fetcher()),
        analyzer,
    );

    let report = assert_ok!(pipeline.run(&request()).await);
    let semantic = &report.content.semantic;

    assert_eq!(semantic[0].status, SemanticStatus::Completed);
    assert_eq!(semantic[1].status, SemanticStatus::Failed);
    let analysis = &semantic[1].result.as_ref().unwrap().keyword_specific_analysis[0];
    assert_eq!(analysis.keyword, "rust");
    assert_eq!(analysis.why_ranking_dropped, ANALYSIS_FAILED_MESSAGE);
    assert!(analysis.what_to_add.is_empty());
    assert_eq!(semantic[2].status, SemanticStatus::Completed);
}

#[tokio::test]
async fn test_llm_transport_error_becomes_placeholder() {
    let analyzer = Arc::new(MockAnalyzer::new().with_error("rust async"));
    let pipeline = orchestrator(
        config(),
        Arc::new(telemetry()),
        Arc::new(searcher()),
        Arc::new(fetcher()),
        analyzer,
    );

    let report = assert_ok!(pipeline.run(&request()).await);
    let first = &report.content.semantic[0];

    assert_eq!(first.status, SemanticStatus::Failed);
    assert!(first.error.is_some());
    let placeholder = first.result.as_ref().unwrap();
    let why = &placeholder.keyword_specific_analysis[0].why_ranking_dropped;
    assert_ne!(why, ANALYSIS_FAILED_MESSAGE);
    assert!(why.starts_with("The analysis request failed"));
}

#[tokio::test]
async fn test_keywords_beyond_limit_are_skipped() {
    let analyzer = Arc::new(MockAnalyzer::new());
    let pipeline = orchestrator(
        config().with_max_semantic_keywords(1),
        Arc::new(telemetry()),
        Arc::new(searcher()),
        Arc::new(fetcher()),
        analyzer.clone(),
    );

    let report = assert_ok!(pipeline.run(&request()).await);
    let statuses: Vec<SemanticStatus> = report.content.semantic.iter().map(|s| s.status).collect();

    assert_eq!(
        statuses,
        vec![
            SemanticStatus::Completed,
            SemanticStatus::Skipped,
            SemanticStatus::Skipped
        ]
    );
    assert_eq!(analyzer.calls().len(), 1);
}

#[tokio::test]
async fn test_manual_keywords_bypass_scoring() {
    let searcher = Arc::new(searcher());
    let pipeline = orchestrator(
        config(),
        Arc::new(telemetry()),
        searcher.clone(),
        Arc::new(fetcher()),
        Arc::new(MockAnalyzer::new()),
    );
    let request = request().with_keywords(vec![
        "Rust".into(),
        "brand new topic".into(),
        "rust".into(),
    ]);

    let output = assert_ok!(pipeline.run_keyword_stage(&request).await);
    let names: Vec<&str> = output.keywords.iter().map(|k| k.keyword.as_str()).collect();
    assert_eq!(names, vec!["Rust", "brand new topic"]);
    assert_eq!(output.keywords[0].priority_score, 100.0);
    assert_eq!(output.keywords[0].position, 3.0);

    // Telemetry rank 3 sizes the first request; the unknown keyword asks for more.
    pipeline.run_discovery_stage(&request, &output).await;
    let queries = searcher.queries();
    assert_eq!(queries[0].result_count, 10);
    assert_eq!(queries[1].result_count, 20);
}

#[tokio::test]
async fn test_failing_sink_does_not_fail_run() {
    let failing = Arc::new(MemorySink::failing());
    let healthy = Arc::new(MemorySink::new());
    let pipeline = orchestrator(
        config(),
        Arc::new(telemetry()),
        Arc::new(searcher()),
        Arc::new(fetcher()),
        Arc::new(MockAnalyzer::new()),
    )
    .with_sink(failing.clone())
    .with_sink(healthy.clone());

    assert_ok!(pipeline.run(&request()).await);
    assert_eq!(failing.reports().len(), 1);
    assert_eq!(healthy.reports().len(), 1);
}

#[tokio::test]
async fn test_unavailable_analyzer_still_diffs() {
    let pipeline = orchestrator(
        config(),
        Arc::new(telemetry()),
        Arc::new(searcher()),
        Arc::new(fetcher()),
        Arc::new(DisabledAnalyzer::new("no API key")),
    );

    let report = assert_ok!(pipeline.run(&request()).await);

    assert!(report.content.diff.is_some());
    assert!(report
        .content
        .semantic
        .iter()
        .all(|s| s.status == SemanticStatus::Unavailable));
}

#[tokio::test]
async fn test_stages_can_be_rerun_from_serialized_output() {
    let pipeline = orchestrator(
        config(),
        Arc::new(telemetry()),
        Arc::new(searcher()),
        Arc::new(fetcher()),
        Arc::new(MockAnalyzer::new()),
    );
    let request = request();

    let stage1 = assert_ok!(pipeline.run_keyword_stage(&request).await);
    let stage2 = pipeline.run_discovery_stage(&request, &stage1).await;

    let stage1 = serde_json::from_str(&serde_json::to_string(&stage1).unwrap()).unwrap();
    let stage2 = serde_json::from_str(&serde_json::to_string(&stage2).unwrap()).unwrap();
    let content = pipeline.run_content_stage(&request, &stage1, &stage2).await;

    assert_eq!(content.competitors_analyzed.len(), 3);
    assert!(content.diff.is_some());
}
