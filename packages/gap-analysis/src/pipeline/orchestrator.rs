//! Three-stage analysis run under a wall-clock budget.

use chrono::Utc;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analysis::{ContentDiffEngine, QualitySignalChecker};
use crate::deadline::Deadline;
use crate::detection::RankChangeDetector;
use crate::discovery::{normalize_url, DiscoveryRequest, SearchResultDiscoverer};
use crate::error::{FetchError, PipelineError, Result, TelemetryResult};
use crate::fetch::validate_url;
use crate::keywords::KeywordSelector;
use crate::pipeline::report::{
    AnalysisReport, AnalysisRequest, ContentStageOutput, DiscoveryStageOutput, FetchFailure,
    KeywordDiscovery, KeywordSemantic, KeywordStageOutput, SemanticStatus,
};
use crate::telemetry::TelemetryClient;
use crate::traits::{
    analyzer::SemanticAnalyzer, fetcher::DocumentFetcher, sink::ReportSink,
    telemetry::TelemetrySource,
};
use crate::types::{
    config::PipelineConfig,
    document::ScrapedDocument,
    semantic::SemanticDiffResult,
    telemetry::{DateRange, KeywordRecord, SiteIdentifier, TimeSeriesPoint},
};

/// Runs keyword selection, competitor discovery and content analysis.
///
/// Each stage is callable on its own and takes the previous stage's output,
/// so a failed stage can be retried without repeating the earlier ones.
/// [`run`](Self::run) chains all three and hands the report to the sinks.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    telemetry: TelemetryClient,
    detector: RankChangeDetector,
    selector: KeywordSelector,
    discoverer: SearchResultDiscoverer,
    fetcher: Arc<dyn DocumentFetcher>,
    analyzer: Arc<dyn SemanticAnalyzer>,
    diff_engine: ContentDiffEngine,
    quality: QualitySignalChecker,
    sinks: Vec<Arc<dyn ReportSink>>,
}

impl PipelineOrchestrator {
    pub fn new(
        config: PipelineConfig,
        telemetry: Arc<dyn TelemetrySource>,
        discoverer: SearchResultDiscoverer,
        fetcher: Arc<dyn DocumentFetcher>,
        analyzer: Arc<dyn SemanticAnalyzer>,
    ) -> Self {
        Self {
            detector: RankChangeDetector::new(config.detection.clone()),
            selector: KeywordSelector::new(config.keywords.clone()),
            telemetry: TelemetryClient::new(telemetry),
            discoverer,
            fetcher,
            analyzer,
            diff_engine: ContentDiffEngine::new(),
            quality: QualitySignalChecker::new(),
            sinks: Vec::new(),
            config,
        }
    }

    /// Register a sink that receives every finished report.
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    async fn read_telemetry(
        &self,
        site: &SiteIdentifier,
        page_url: &str,
        range: DateRange,
    ) -> TelemetryResult<(Vec<TimeSeriesPoint>, Vec<KeywordRecord>)> {
        let series = self.telemetry.time_series(site, page_url, range).await?;
        let keywords = self.telemetry.keywords(site, page_url, range).await?;
        Ok((series, keywords))
    }

    /// Stage 1: detect the drop and choose the keywords to investigate.
    pub async fn run_keyword_stage(&self, request: &AnalysisRequest) -> Result<KeywordStageOutput> {
        if validate_url(&request.page_url).is_err() {
            return Err(PipelineError::InvalidRequest(format!(
                "page URL must be an absolute http(s) URL, got {:?}",
                request.page_url
            )));
        }

        let today = request.as_of.unwrap_or_else(|| Utc::now().date_naive());
        let range = DateRange::ending_with_lag(today, self.config.detection.lookback_days);

        info!(
            site = %request.site,
            page = %request.page_url,
            start = %range.start,
            end = %range.end,
            "Stage 1: reading ranking telemetry"
        );

        let (resolved_site, (series, keyword_rows)) =
            match self.read_telemetry(&request.site, &request.page_url, range).await {
                Ok(data) => (request.site.clone(), data),
                Err(err) if err.is_unauthorized() => {
                    let Some(alternate) = request.site.alternate() else {
                        return Err(err.into());
                    };
                    warn!(
                        site = %request.site,
                        alternate = %alternate,
                        "Telemetry refused property, retrying with alternate format"
                    );
                    match self.read_telemetry(&alternate, &request.page_url, range).await {
                        Ok(data) => (alternate, data),
                        Err(alt_err) => {
                            warn!(alternate = %alternate, error = %alt_err, "Alternate property also failed");
                            return Err(err.into());
                        }
                    }
                }
                Err(err) => return Err(err.into()),
            };

        let rank_change = self.detector.detect_drop(&series, &keyword_rows);
        let keywords = match request.manual_keywords() {
            Some(manual) => self.selector.manual(manual, &keyword_rows),
            None => self.selector.select(&rank_change.candidates, &keyword_rows),
        };

        info!(
            site = %resolved_site,
            drop_detected = rank_change.detected,
            baseline = rank_change.baseline_position,
            recent = rank_change.recent_position,
            keywords = keywords.len(),
            "Stage 1 complete"
        );

        Ok(KeywordStageOutput {
            resolved_site,
            rank_change,
            keywords,
            time_series: series,
        })
    }

    /// Stage 2: find who outranks the page, one keyword at a time.
    ///
    /// A keyword that fails is recorded with its error and the batch moves on.
    pub async fn run_discovery_stage(
        &self,
        request: &AnalysisRequest,
        keywords: &KeywordStageOutput,
    ) -> DiscoveryStageOutput {
        let api_preferred = request
            .api_preferred
            .unwrap_or(self.config.discovery.api_preferred);
        info!(
            keywords = keywords.keywords.len(),
            strategy = ?self.discoverer.primary_strategy(api_preferred),
            "Stage 2: discovering competitors"
        );

        let mut output = DiscoveryStageOutput::default();
        let mut seen = HashSet::new();

        for (i, keyword) in keywords.keywords.iter().enumerate() {
            if i > 0 {
                let delay = self.discoverer.inter_keyword_delay(api_preferred);
                debug!(keyword = %keyword.keyword, delay_ms = delay.as_millis() as u64, "Pausing before next keyword");
                tokio::time::sleep(delay).await;
            }

            let known_rank = (keyword.position > 0.0).then(|| keyword.position.round() as u32);
            let mut discovery =
                DiscoveryRequest::new(&keyword.keyword, &request.page_url, &request.locale)
                    .with_config(&self.config.discovery)
                    .with_known_own_rank(known_rank);
            discovery.api_preferred = api_preferred;

            match self.discoverer.discover(&discovery).await {
                Ok(set) => {
                    for entry in &set.competitors {
                        if seen.insert(normalize_url(&entry.url)) {
                            output.competitor_urls.push(entry.url.clone());
                        }
                    }
                    output.results.push(KeywordDiscovery {
                        keyword: keyword.keyword.clone(),
                        competitors: Some(set),
                        error: None,
                    });
                }
                Err(err) => {
                    warn!(keyword = %keyword.keyword, error = %err, "Discovery failed for keyword");
                    output.results.push(KeywordDiscovery {
                        keyword: keyword.keyword.clone(),
                        competitors: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        info!(
            competitors = output.competitor_urls.len(),
            failed = output.failed_keywords().count(),
            "Stage 2 complete"
        );
        output
    }

    /// Stage 3: fetch, diff, quality-check and semantically compare.
    ///
    /// The budget is measured from the start of this stage and checked
    /// between phases. Running out is not an error: whatever finished is
    /// returned with `partial_results` set.
    pub async fn run_content_stage(
        &self,
        request: &AnalysisRequest,
        keywords: &KeywordStageOutput,
        discovery: &DiscoveryStageOutput,
    ) -> ContentStageOutput {
        let deadline = Deadline::start(self.config.budget);
        let mut output = ContentStageOutput {
            subject_url: request.page_url.clone(),
            ..Default::default()
        };
        let keyword_names: Vec<&str> = keywords.keywords.iter().map(|k| k.keyword.as_str()).collect();

        if deadline.is_exceeded() {
            warn!("Budget exhausted before content stage started");
            output.semantic = self.unfinished_semantic(&keyword_names, SemanticStatus::BudgetExceeded);
            output.partial_results = true;
            return output;
        }

        let competitor_urls: Vec<&String> = discovery
            .competitor_urls
            .iter()
            .take(self.config.max_competitor_documents)
            .collect();
        info!(
            subject = %request.page_url,
            competitors = competitor_urls.len(),
            budget_ms = self.config.budget.as_millis() as u64,
            "Stage 3: fetching documents"
        );

        let fetches = std::iter::once(&request.page_url)
            .chain(competitor_urls.iter().copied())
            .map(|url| self.fetcher.fetch(url));
        let mut results = join_all(fetches).await.into_iter();

        let subject = match results.next() {
            Some(Ok(doc)) => Some(doc),
            Some(Err(FetchError::NotFound { url })) => {
                warn!(url = %url, "Subject page not found");
                output.subject_not_found = true;
                None
            }
            Some(Err(err)) => {
                warn!(url = %request.page_url, error = %err, "Subject page could not be fetched");
                output.subject_error = Some(err.to_string());
                None
            }
            None => None,
        };

        let mut competitor_docs = Vec::new();
        for (url, result) in competitor_urls.iter().zip(results) {
            match result {
                Ok(doc) => competitor_docs.push(doc),
                Err(err) => {
                    warn!(url = %url, error = %err, "Skipping competitor page");
                    output.fetch_errors.push(FetchFailure {
                        url: url.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }
        output.competitors_analyzed = competitor_docs.iter().map(|d| d.url.clone()).collect();

        let Some(subject) = subject else {
            output.elapsed_ms = deadline.elapsed().as_millis() as u64;
            return output;
        };

        output.diff = Some(self.diff_engine.diff(&subject, &competitor_docs));
        output.quality = Some(self.quality.compare(&subject, &competitor_docs));
        debug!(elapsed_ms = deadline.elapsed().as_millis() as u64, "Structural diff and quality checks done");

        self.run_semantic(request, &subject, &competitor_docs, discovery, &keyword_names, &deadline, &mut output)
            .await;

        output.elapsed_ms = deadline.elapsed().as_millis() as u64;
        info!(
            elapsed_ms = output.elapsed_ms,
            partial = output.partial_results,
            fetch_errors = output.fetch_errors.len(),
            "Stage 3 complete"
        );
        output
    }

    /// Placeholder entries for keywords that will not be analyzed.
    fn unfinished_semantic(&self, keywords: &[&str], status: SemanticStatus) -> Vec<KeywordSemantic> {
        keywords
            .iter()
            .enumerate()
            .map(|(i, kw)| {
                if i < self.config.max_semantic_keywords {
                    KeywordSemantic::with_status(*kw, status)
                } else {
                    KeywordSemantic::with_status(*kw, SemanticStatus::Skipped)
                }
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_semantic(
        &self,
        request: &AnalysisRequest,
        subject: &ScrapedDocument,
        competitor_docs: &[ScrapedDocument],
        discovery: &DiscoveryStageOutput,
        keywords: &[&str],
        deadline: &Deadline,
        output: &mut ContentStageOutput,
    ) {
        if !self.analyzer.is_available() {
            info!(analyzer = self.analyzer.name(), "Semantic analysis unavailable, skipping");
            output.semantic = self.unfinished_semantic(keywords, SemanticStatus::Unavailable);
            return;
        }

        for (i, keyword) in keywords.iter().enumerate() {
            if i >= self.config.max_semantic_keywords {
                output
                    .semantic
                    .push(KeywordSemantic::with_status(*keyword, SemanticStatus::Skipped));
                continue;
            }
            if deadline.is_exceeded() {
                debug!(keyword = %keyword, "Budget exhausted, not analyzing keyword");
                output
                    .semantic
                    .push(KeywordSemantic::with_status(*keyword, SemanticStatus::BudgetExceeded));
                output.partial_results = true;
                continue;
            }

            let docs = competitor_docs_for(keyword, discovery, competitor_docs);
            if docs.is_empty() {
                output.semantic.push(KeywordSemantic {
                    error: Some("no competitor documents to compare against".into()),
                    ..KeywordSemantic::with_status(*keyword, SemanticStatus::Skipped)
                });
                continue;
            }

            let limit = deadline.cap(self.config.semantic.timeout);
            let call = self
                .analyzer
                .analyze_semantic_diff(keyword, subject, &docs, &request.locale);

            let entry = match tokio::time::timeout(limit, call).await {
                Ok(Ok(result)) => {
                    let status = if result == SemanticDiffResult::analysis_failed(keyword) {
                        SemanticStatus::Failed
                    } else {
                        SemanticStatus::Completed
                    };
                    info!(keyword = %keyword, status = ?status, analyzer = self.analyzer.name(), "Semantic analysis finished");
                    KeywordSemantic {
                        keyword: keyword.to_string(),
                        status,
                        result: Some(result),
                        error: None,
                    }
                }
                Ok(Err(err)) => {
                    warn!(keyword = %keyword, error = %err, "Semantic analysis failed");
                    let message = format!("The analysis request failed: {}", err);
                    KeywordSemantic {
                        keyword: keyword.to_string(),
                        status: SemanticStatus::Failed,
                        result: Some(SemanticDiffResult::placeholder(keyword, &message)),
                        error: Some(err.to_string()),
                    }
                }
                Err(_) => {
                    warn!(keyword = %keyword, limit_ms = limit.as_millis() as u64, "Semantic analysis timed out");
                    if deadline.is_exceeded() {
                        output.partial_results = true;
                    }
                    let error = format!("timed out after {}ms", limit.as_millis());
                    let message = format!("The analysis {}.", error);
                    KeywordSemantic {
                        keyword: keyword.to_string(),
                        status: SemanticStatus::TimedOut,
                        result: Some(SemanticDiffResult::placeholder(keyword, &message)),
                        error: Some(error),
                    }
                }
            };
            output.semantic.push(entry);
        }
    }

    /// Run all three stages and deliver the report to every sink.
    ///
    /// Only a Stage 1 failure ends the run; sink failures are logged.
    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let keyword_stage = self.run_keyword_stage(request).await?;
        let discovery = self.run_discovery_stage(request, &keyword_stage).await;
        let content = self
            .run_content_stage(request, &keyword_stage, &discovery)
            .await;

        let report = AnalysisReport {
            request: request.clone(),
            keyword_stage,
            discovery,
            content,
            generated_at: Utc::now(),
        };

        for sink in &self.sinks {
            if let Err(e) = sink.deliver(&report).await {
                warn!(sink = sink.name(), error = %e, "Failed to deliver report");
            }
        }

        Ok(report)
    }
}

/// The fetched documents that competed on this keyword, or all of them when
/// none match (e.g. the keyword's discovery failed).
fn competitor_docs_for(
    keyword: &str,
    discovery: &DiscoveryStageOutput,
    docs: &[ScrapedDocument],
) -> Vec<ScrapedDocument> {
    let urls: HashSet<String> = discovery
        .results
        .iter()
        .filter(|r| r.keyword == keyword)
        .filter_map(|r| r.competitors.as_ref())
        .flat_map(|set| set.competitors.iter().map(|c| normalize_url(&c.url)))
        .collect();

    let own: Vec<ScrapedDocument> = docs
        .iter()
        .filter(|d| urls.contains(&normalize_url(&d.url)))
        .cloned()
        .collect();

    if own.is_empty() {
        docs.to_vec()
    } else {
        own
    }
}
