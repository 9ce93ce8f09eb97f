//! Rank-change detection over a page's ranking time series.
//!
//! Positions are 1-based, so a larger number is a worse rank and a positive
//! delta means the page fell.

use serde::{Deserialize, Serialize};

use crate::types::config::DetectionConfig;
use crate::types::telemetry::{KeywordRecord, TimeSeriesPoint};

/// Number of candidate keywords promoted to target keywords.
pub const TARGET_KEYWORDS: usize = 3;

/// Outcome of comparing the most recent day against its baseline window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankChange {
    pub baseline_position: f64,
    pub recent_position: f64,
    /// recent - baseline for drops, baseline - recent for rises
    pub delta: f64,
    pub detected: bool,
    /// Keywords over (drop) or under (rise) the per-keyword threshold
    pub candidates: Vec<KeywordRecord>,
    /// Top candidates by impressions
    pub target_keywords: Vec<String>,
}

/// Σ(position × impressions) / Σ(impressions), or 0.0 without impressions.
pub fn weighted_average_position(points: &[TimeSeriesPoint]) -> f64 {
    let impressions: f64 = points.iter().map(|p| p.impressions).sum();
    if impressions <= 0.0 {
        return 0.0;
    }
    points.iter().map(|p| p.position * p.impressions).sum::<f64>() / impressions
}

/// (baseline, recent) averages. Recent is the last day; baseline is the
/// `comparison_days` days before it, or the last day itself when nothing precedes it.
fn window_averages(series: &[TimeSeriesPoint], comparison_days: u32) -> (f64, f64) {
    let mut sorted = series.to_vec();
    sorted.sort_by_key(|p| p.date);

    let Some((last, earlier)) = sorted.split_last() else {
        return (0.0, 0.0);
    };
    let recent = weighted_average_position(std::slice::from_ref(last));

    let take = (comparison_days.max(1) as usize).min(earlier.len());
    let baseline_points = &earlier[earlier.len() - take..];
    let baseline = if baseline_points.is_empty() {
        recent
    } else {
        weighted_average_position(baseline_points)
    };

    (baseline, recent)
}

fn top_by_impressions(candidates: &[KeywordRecord]) -> Vec<String> {
    let mut ranked: Vec<&KeywordRecord> = candidates.iter().collect();
    ranked.sort_by(|a, b| b.impressions.total_cmp(&a.impressions));
    ranked
        .into_iter()
        .take(TARGET_KEYWORDS)
        .map(|k| k.keyword.clone())
        .collect()
}

/// Detect a ranking drop.
pub fn detect_drop(
    series: &[TimeSeriesPoint],
    keywords: &[KeywordRecord],
    comparison_days: u32,
    drop_threshold: f64,
    keyword_drop_threshold: f64,
) -> RankChange {
    let (baseline, recent) = window_averages(series, comparison_days);
    let delta = if baseline == 0.0 || recent == 0.0 {
        0.0
    } else {
        recent - baseline
    };

    let candidates: Vec<KeywordRecord> = keywords
        .iter()
        .filter(|k| k.position >= keyword_drop_threshold)
        .cloned()
        .collect();

    RankChange {
        baseline_position: baseline,
        recent_position: recent,
        delta,
        detected: delta >= drop_threshold || !candidates.is_empty(),
        target_keywords: top_by_impressions(&candidates),
        candidates,
    }
}

/// Detect a ranking rise. Mirror image of [`detect_drop`].
pub fn detect_rise(
    series: &[TimeSeriesPoint],
    keywords: &[KeywordRecord],
    comparison_days: u32,
    rise_threshold: f64,
    keyword_rise_threshold: f64,
) -> RankChange {
    let (baseline, recent) = window_averages(series, comparison_days);
    let delta = if baseline == 0.0 || recent == 0.0 {
        0.0
    } else {
        baseline - recent
    };

    let candidates: Vec<KeywordRecord> = keywords
        .iter()
        .filter(|k| k.position > 0.0 && k.position <= keyword_rise_threshold)
        .cloned()
        .collect();

    RankChange {
        baseline_position: baseline,
        recent_position: recent,
        delta,
        detected: delta >= rise_threshold,
        target_keywords: top_by_impressions(&candidates),
        candidates,
    }
}

/// Config-driven entry points.
pub struct RankChangeDetector {
    config: DetectionConfig,
}

impl RankChangeDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn detect_drop(&self, series: &[TimeSeriesPoint], keywords: &[KeywordRecord]) -> RankChange {
        detect_drop(
            series,
            keywords,
            self.config.comparison_days,
            self.config.drop_threshold,
            self.config.keyword_drop_threshold,
        )
    }

    pub fn detect_rise(&self, series: &[TimeSeriesPoint], keywords: &[KeywordRecord]) -> RankChange {
        detect_rise(
            series,
            keywords,
            self.config.comparison_days,
            self.config.rise_threshold,
            self.config.keyword_rise_threshold,
        )
    }
}
