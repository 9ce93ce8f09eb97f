//! LLM semantic-diff schema.
//!
//! The JSON field names are part of the prompt contract and are identical
//! for every backend.

use serde::{Deserialize, Serialize};

/// Message placed in the per-keyword analysis when the model response is unusable.
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "Analysis failed: the model response could not be parsed. Review the structural diff instead.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticDiffResult {
    #[serde(default)]
    pub why_competitors_rank_higher: String,
    #[serde(default)]
    pub missing_content: Vec<String>,
    #[serde(default)]
    pub recommended_additions: Vec<RecommendedAddition>,
    #[serde(default)]
    pub keyword_specific_analysis: Vec<KeywordAnalysis>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedAddition {
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub competitor_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordAnalysis {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub why_ranking_dropped: String,
    #[serde(default)]
    pub what_to_add: Vec<WhatToAdd>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatToAdd {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub competitor_urls: Vec<String>,
}

impl SemanticDiffResult {
    /// Placeholder returned instead of an error when a backend misbehaves.
    pub fn analysis_failed(keyword: &str) -> Self {
        Self::placeholder(keyword, ANALYSIS_FAILED_MESSAGE)
    }

    /// Placeholder carrying an arbitrary explanation (timeouts, transport errors).
    pub fn placeholder(keyword: &str, message: &str) -> Self {
        Self {
            why_competitors_rank_higher: String::new(),
            missing_content: Vec::new(),
            recommended_additions: Vec::new(),
            keyword_specific_analysis: vec![KeywordAnalysis {
                keyword: keyword.to_string(),
                why_ranking_dropped: message.to_string(),
                what_to_add: Vec::new(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.why_competitors_rank_higher.is_empty()
            && self.missing_content.is_empty()
            && self.recommended_additions.is_empty()
            && self.keyword_specific_analysis.is_empty()
    }

    /// Fold another keyword's result into this one.
    ///
    /// Explanations are joined, lists are appended with exact duplicates dropped.
    pub fn merge(&mut self, other: SemanticDiffResult) {
        if !other.why_competitors_rank_higher.is_empty() {
            if self.why_competitors_rank_higher.is_empty() {
                self.why_competitors_rank_higher = other.why_competitors_rank_higher;
            } else {
                self.why_competitors_rank_higher.push_str("\n\n");
                self.why_competitors_rank_higher
                    .push_str(&other.why_competitors_rank_higher);
            }
        }
        for item in other.missing_content {
            if !self.missing_content.contains(&item) {
                self.missing_content.push(item);
            }
        }
        for addition in other.recommended_additions {
            if !self.recommended_additions.contains(&addition) {
                self.recommended_additions.push(addition);
            }
        }
        self.keyword_specific_analysis
            .extend(other.keyword_specific_analysis);
    }
}
