//! Keyword normalization, scoring and selection.

use std::collections::HashMap;
use tracing::debug;

use crate::types::config::KeywordConfig;
use crate::types::keyword::PrioritizedKeyword;
use crate::types::telemetry::KeywordRecord;

/// Priority given to caller-supplied keywords.
pub const MANUAL_PRIORITY: f64 = 100.0;

/// Canonical comparison key for a keyword.
///
/// Folds the ideographic space and full-width ASCII to half-width, collapses
/// whitespace, trims and lowercases. Idempotent.
pub fn normalize(keyword: &str) -> String {
    let folded: String = keyword
        .chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect();
    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Priority score for a telemetry row.
pub fn score(record: &KeywordRecord) -> f64 {
    let impressions = (record.impressions / 10.0).min(50.0);
    let clicks = (record.clicks * 2.0).min(30.0);
    let position = match record.position {
        p if p <= 0.0 => 0.0,
        p if p <= 5.0 => 15.0,
        p if p <= 10.0 => 10.0,
        p if p <= 20.0 => 5.0,
        _ => 0.0,
    };
    let ctr = (record.ctr * 100.0).min(5.0);
    impressions + clicks + position + ctr
}

/// Union candidates, keep the best-scoring variant per normalized key,
/// sort by score (stable, so ties keep first-seen order), truncate.
pub fn merge(candidates: Vec<PrioritizedKeyword>, max_keywords: usize) -> Vec<PrioritizedKeyword> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<PrioritizedKeyword> = Vec::new();

    for candidate in candidates {
        let key = normalize(&candidate.keyword);
        if key.is_empty() {
            continue;
        }
        match index.get(&key) {
            Some(&i) => {
                if candidate.priority_score > merged[i].priority_score {
                    merged[i] = candidate;
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(candidate);
            }
        }
    }

    merged.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
    merged.truncate(max_keywords);
    merged
}

pub struct KeywordSelector {
    config: KeywordConfig,
}

impl KeywordSelector {
    pub fn new(config: KeywordConfig) -> Self {
        Self { config }
    }

    fn prioritize(&self, record: &KeywordRecord, dropped: bool) -> Option<PrioritizedKeyword> {
        if record.impressions < self.config.min_impressions {
            return None;
        }
        let base = score(record);
        Some(PrioritizedKeyword {
            keyword: record.keyword.clone(),
            priority_score: if dropped { base * 2.0 } else { base },
            impressions: record.impressions,
            clicks: record.clicks,
            position: record.position,
            dropped,
        })
    }

    /// Pick keywords from telemetry. Dropped keywords are doubled and considered first.
    pub fn select(
        &self,
        dropped: &[KeywordRecord],
        all: &[KeywordRecord],
    ) -> Vec<PrioritizedKeyword> {
        let candidates: Vec<PrioritizedKeyword> = dropped
            .iter()
            .filter_map(|r| self.prioritize(r, true))
            .chain(all.iter().filter_map(|r| self.prioritize(r, false)))
            .collect();

        let selected = merge(candidates, self.config.max_keywords);
        debug!(
            dropped = dropped.len(),
            total = all.len(),
            selected = selected.len(),
            "Selected keywords"
        );
        selected
    }

    /// Caller-supplied keywords bypass scoring.
    ///
    /// Input order is kept, duplicates by normalized key are dropped, and
    /// telemetry stats are attached when a row matches.
    pub fn manual(&self, keywords: &[String], telemetry: &[KeywordRecord]) -> Vec<PrioritizedKeyword> {
        let stats: HashMap<String, &KeywordRecord> = telemetry
            .iter()
            .map(|r| (normalize(&r.keyword), r))
            .collect();

        let mut seen = std::collections::HashSet::new();
        keywords
            .iter()
            .filter_map(|raw| {
                let key = normalize(raw);
                if key.is_empty() || !seen.insert(key.clone()) {
                    return None;
                }
                let mut keyword = PrioritizedKeyword::new(raw.trim(), MANUAL_PRIORITY);
                if let Some(row) = stats.get(&key) {
                    keyword.impressions = row.impressions;
                    keyword.clicks = row.clicks;
                    keyword.position = row.position;
                }
                Some(keyword)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_full_width() {
        assert_eq!(normalize("ＡＢＣ\u{3000}ｔｅｓｔ"), "abc test");
        assert_eq!(normalize("abc test"), normalize("ＡＢＣ\u{3000}ｔｅｓｔ"));
        assert_eq!(normalize("  Rust   Async "), "rust async");
    }

    #[test]
    fn test_normalize_japanese_spacing() {
        assert_eq!(
            normalize("キーワード\u{3000} テスト"),
            normalize(" キーワード テスト ")
        );
        assert_eq!(normalize("キーワード\u{3000} テスト"), "キーワード テスト");
    }

    #[test]
    fn test_normalize_idempotent() {
        for raw in ["ＡＢＣ\u{3000}ｔｅｓｔ", "  日本語　キーワード ", "Mixed CASE"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_score_components() {
        let record = KeywordRecord::new("k", 3.0, 1000.0)
            .with_clicks(40.0)
            .with_ctr(0.5);
        // 50 + 30 + 15 + 5
        assert_eq!(score(&record), 100.0);

        let record = KeywordRecord::new("k", 15.0, 100.0).with_clicks(2.0).with_ctr(0.25);
        // 10 + 4 + 5 + 5
        assert_eq!(score(&record), 24.0);

        assert_eq!(score(&KeywordRecord::new("k", 50.0, 0.0)), 0.0);
    }

    #[test]
    fn test_merge_keeps_highest_variant() {
        let merged = merge(
            vec![
                PrioritizedKeyword::new("abc test", 10.0),
                PrioritizedKeyword::new("ＡＢＣ\u{3000}ｔｅｓｔ", 20.0),
            ],
            5,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].priority_score, 20.0);
    }

    #[test]
    fn test_merge_ties_keep_first_seen() {
        let merged = merge(
            vec![
                PrioritizedKeyword::new("first", 5.0),
                PrioritizedKeyword::new("second", 5.0),
                PrioritizedKeyword::new("top", 9.0),
            ],
            2,
        );
        let names: Vec<_> = merged.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(names, vec!["top", "first"]);
    }

    #[test]
    fn test_select_prefers_dropped_and_filters_low_impressions() {
        let selector = KeywordSelector::new(KeywordConfig::default());
        let dropped = vec![KeywordRecord::new("falling", 14.0, 200.0)];
        let all = vec![
            KeywordRecord::new("falling", 14.0, 200.0),
            KeywordRecord::new("steady", 3.0, 300.0),
            KeywordRecord::new("rare", 2.0, 5.0),
        ];

        let selected = selector.select(&dropped, &all);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].keyword, "falling");
        assert!(selected[0].dropped);
        // (20 + 5) * 2
        assert_eq!(selected[0].priority_score, 50.0);
        assert!(selected.iter().all(|k| k.keyword != "rare"));
    }

    #[test]
    fn test_select_caps_at_max() {
        let selector = KeywordSelector::new(KeywordConfig {
            max_keywords: 2,
            ..Default::default()
        });
        let all: Vec<_> = (0..6)
            .map(|i| KeywordRecord::new(format!("kw{}", i), 8.0, 100.0 + i as f64 * 10.0))
            .collect();
        let selected = selector.select(&[], &all);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].keyword, "kw5");
    }

    #[test]
    fn test_manual_override() {
        let selector = KeywordSelector::new(KeywordConfig::default());
        let telemetry = vec![KeywordRecord::new("rust async", 7.0, 420.0)];
        let manual = selector.manual(
            &[
                "Rust Async".to_string(),
                "tokio".to_string(),
                "rust　async".to_string(),
            ],
            &telemetry,
        );

        assert_eq!(manual.len(), 2);
        assert_eq!(manual[0].keyword, "Rust Async");
        assert_eq!(manual[0].priority_score, MANUAL_PRIORITY);
        assert_eq!(manual[0].impressions, 420.0);
        assert_eq!(manual[1].keyword, "tokio");
        assert_eq!(manual[1].impressions, 0.0);
    }
}
