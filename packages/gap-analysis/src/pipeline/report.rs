//! Stage inputs and outputs.
//!
//! Every value here is serializable so a caller can persist one stage's
//! output and re-run the next stage alone.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::detection::RankChange;
use crate::types::{
    diff::{DiffReport, QualityReport},
    keyword::PrioritizedKeyword,
    semantic::SemanticDiffResult,
    serp::CompetitorSet,
    telemetry::{SiteIdentifier, TimeSeriesPoint},
};

/// What to analyze.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub site: SiteIdentifier,
    pub page_url: String,
    /// Locale tag such as `ja` or `en-GB`; drives search parameters and the
    /// language of the semantic analysis.
    pub locale: String,
    /// Explicit keywords. When present, telemetry scoring is bypassed.
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    /// Overrides `DiscoveryConfig::api_preferred` for this run.
    #[serde(default)]
    pub api_preferred: Option<bool>,
    /// Reference day for the telemetry window. Today when None.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

impl AnalysisRequest {
    pub fn new(site: SiteIdentifier, page_url: impl Into<String>) -> Self {
        Self {
            site,
            page_url: page_url.into(),
            locale: "en".to_string(),
            keywords: None,
            api_preferred: None,
            as_of: None,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = Some(keywords);
        self
    }

    pub fn with_api_preferred(mut self, preferred: bool) -> Self {
        self.api_preferred = Some(preferred);
        self
    }

    pub fn with_as_of(mut self, day: NaiveDate) -> Self {
        self.as_of = Some(day);
        self
    }

    /// Explicit keywords, if any non-blank ones were given.
    pub fn manual_keywords(&self) -> Option<&[String]> {
        self.keywords
            .as_deref()
            .filter(|k| k.iter().any(|s| !s.trim().is_empty()))
    }
}

/// Stage 1 output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordStageOutput {
    /// Property format that actually answered; may be the alternate of the requested one.
    pub resolved_site: SiteIdentifier,
    pub rank_change: RankChange,
    pub keywords: Vec<PrioritizedKeyword>,
    pub time_series: Vec<TimeSeriesPoint>,
}

/// Discovery outcome for one keyword. Exactly one of `competitors` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordDiscovery {
    pub keyword: String,
    pub competitors: Option<CompetitorSet>,
    pub error: Option<String>,
}

/// Stage 2 output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryStageOutput {
    pub results: Vec<KeywordDiscovery>,
    /// Competitor URLs across all keywords, first-seen order, normalized duplicates removed
    pub competitor_urls: Vec<String>,
}

impl DiscoveryStageOutput {
    pub fn failed_keywords(&self) -> impl Iterator<Item = &KeywordDiscovery> {
        self.results.iter().filter(|r| r.error.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticStatus {
    Completed,
    /// The backend errored or returned unusable output; `result` holds the placeholder
    Failed,
    TimedOut,
    /// Beyond the per-run keyword limit, or nothing to compare against
    Skipped,
    BudgetExceeded,
    /// No LLM backend configured
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordSemantic {
    pub keyword: String,
    pub status: SemanticStatus,
    pub result: Option<SemanticDiffResult>,
    pub error: Option<String>,
}

impl KeywordSemantic {
    pub fn with_status(keyword: impl Into<String>, status: SemanticStatus) -> Self {
        Self {
            keyword: keyword.into(),
            status,
            result: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub url: String,
    pub error: String,
}

/// Stage 3 output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStageOutput {
    pub subject_url: String,
    pub competitors_analyzed: Vec<String>,
    /// The subject page answered 404/410
    pub subject_not_found: bool,
    /// Any other subject fetch failure
    pub subject_error: Option<String>,
    pub fetch_errors: Vec<FetchFailure>,
    pub diff: Option<DiffReport>,
    pub quality: Option<QualityReport>,
    pub semantic: Vec<KeywordSemantic>,
    /// The budget ran out before every step finished
    pub partial_results: bool,
    pub elapsed_ms: u64,
}

impl ContentStageOutput {
    /// Every per-keyword semantic result folded into one.
    pub fn merged_semantic(&self) -> Option<SemanticDiffResult> {
        let mut results = self.semantic.iter().filter_map(|s| s.result.clone());
        let mut merged = results.next()?;
        for result in results {
            merged.merge(result);
        }
        Some(merged)
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub request: AnalysisRequest,
    pub keyword_stage: KeywordStageOutput,
    pub discovery: DiscoveryStageOutput,
    pub content: ContentStageOutput,
    pub generated_at: DateTime<Utc>,
}

/// Short digest of a report, used as the notification payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub page_url: String,
    pub site: String,
    pub drop_detected: bool,
    pub baseline_position: f64,
    pub recent_position: f64,
    pub keywords: Vec<String>,
    pub competitors_analyzed: usize,
    pub missing_headings: usize,
    pub missing_elements: Vec<String>,
    pub partial_results: bool,
    pub headline: String,
}

impl AnalysisReport {
    pub fn summary(&self) -> ReportSummary {
        let change = &self.keyword_stage.rank_change;
        let content = &self.content;

        let headline = if content.subject_not_found {
            format!("{} returned 404; nothing to compare.", content.subject_url)
        } else if change.detected {
            format!(
                "Average position moved from {:.1} to {:.1}; {} competitor page(s) compared.",
                change.baseline_position,
                change.recent_position,
                content.competitors_analyzed.len()
            )
        } else {
            format!(
                "No significant ranking drop; {} competitor page(s) compared.",
                content.competitors_analyzed.len()
            )
        };

        ReportSummary {
            page_url: self.request.page_url.clone(),
            site: self.keyword_stage.resolved_site.as_property(),
            drop_detected: change.detected,
            baseline_position: change.baseline_position,
            recent_position: change.recent_position,
            keywords: self
                .keyword_stage
                .keywords
                .iter()
                .map(|k| k.keyword.clone())
                .collect(),
            competitors_analyzed: content.competitors_analyzed.len(),
            missing_headings: content
                .diff
                .as_ref()
                .map(|d| d.missing_headings.len())
                .unwrap_or(0),
            missing_elements: content
                .quality
                .as_ref()
                .map(|q| q.missing_elements.iter().map(|m| m.label.clone()).collect())
                .unwrap_or_default(),
            partial_results: content.partial_results,
            headline,
        }
    }
}
