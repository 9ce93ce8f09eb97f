//! Structural diff between a subject document and its competitors.
//!
//! Pure and deterministic: same inputs, same report, no I/O.

use std::collections::{HashMap, HashSet};

use super::tokens::{heading_key, tokenize};
use crate::types::diff::{DiffReport, MissingHeading, MissingKeyword};
use crate::types::document::ScrapedDocument;

/// Frequent English function words that carry no topical signal.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "are", "was", "were", "you", "your", "from",
    "have", "has", "had", "not", "but", "can", "will", "all", "our", "their", "they", "them",
    "its", "into", "more", "than", "then", "also", "about", "what", "when", "which", "who",
    "how", "why", "there", "here", "these", "those", "been", "being", "such", "out", "use",
];

#[derive(Debug, Clone)]
pub struct ContentDiffEngine {
    max_headings: usize,
    max_keywords: usize,
}

impl Default for ContentDiffEngine {
    fn default() -> Self {
        Self {
            max_headings: 10,
            max_keywords: 20,
        }
    }
}

impl ContentDiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diff(&self, subject: &ScrapedDocument, competitors: &[ScrapedDocument]) -> DiffReport {
        let missing_headings = self.missing_headings(subject, competitors);
        let missing_keywords = self.missing_keywords(subject, competitors);
        let word_count_delta = word_count_delta(subject, competitors);
        let recommendations = recommendations(&missing_headings, &missing_keywords, word_count_delta);

        DiffReport {
            missing_headings,
            missing_keywords,
            word_count_delta,
            recommendations,
        }
    }

    fn missing_headings(&self, subject: &ScrapedDocument, competitors: &[ScrapedDocument]) -> Vec<MissingHeading> {
        let own: HashSet<String> = subject.headings.iter().map(|h| heading_key(&h.text)).collect();

        // key -> (first-seen order, heading)
        let mut found: HashMap<String, (usize, MissingHeading)> = HashMap::new();
        for competitor in competitors {
            let mut counted = HashSet::new();
            for heading in &competitor.headings {
                let key = heading_key(&heading.text);
                if key.is_empty() || own.contains(&key) || !counted.insert(key.clone()) {
                    continue;
                }
                let order = found.len();
                found
                    .entry(key)
                    .and_modify(|(_, m)| m.competitor_count += 1)
                    .or_insert_with(|| {
                        (
                            order,
                            MissingHeading {
                                text: heading.text.clone(),
                                level: heading.level,
                                competitor_count: 1,
                            },
                        )
                    });
            }
        }

        let mut ranked: Vec<(usize, MissingHeading)> = found.into_values().collect();
        ranked.sort_by(|(order_a, a), (order_b, b)| {
            b.competitor_count
                .cmp(&a.competitor_count)
                .then(order_a.cmp(order_b))
        });
        ranked
            .into_iter()
            .take(self.max_headings)
            .map(|(_, m)| m)
            .collect()
    }

    fn missing_keywords(&self, subject: &ScrapedDocument, competitors: &[ScrapedDocument]) -> Vec<MissingKeyword> {
        let own: HashSet<String> = document_tokens(subject).into_iter().collect();

        let mut frequency: HashMap<String, usize> = HashMap::new();
        for competitor in competitors {
            for token in document_tokens(competitor) {
                if own.contains(&token) || STOPWORDS.contains(&token.as_str()) {
                    continue;
                }
                *frequency.entry(token).or_default() += 1;
            }
        }

        let mut ranked: Vec<MissingKeyword> = frequency
            .into_iter()
            .map(|(token, frequency)| MissingKeyword { token, frequency })
            .collect();
        ranked.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.token.cmp(&b.token)));
        ranked.truncate(self.max_keywords);
        ranked
    }
}

/// Headings are part of the visible text, so `full_text` already covers them.
fn document_tokens(doc: &ScrapedDocument) -> Vec<String> {
    tokenize(&doc.full_text)
}

/// round(mean competitor word count) - subject word count; 0 with no competitors.
fn word_count_delta(subject: &ScrapedDocument, competitors: &[ScrapedDocument]) -> i64 {
    if competitors.is_empty() {
        return 0;
    }
    let total: usize = competitors.iter().map(|c| c.word_count).sum();
    let average = (total as f64 / competitors.len() as f64).round() as i64;
    average - subject.word_count as i64
}

fn recommendations(headings: &[MissingHeading], keywords: &[MissingKeyword], delta: i64) -> Vec<String> {
    let mut out = Vec::new();

    if !headings.is_empty() {
        let topics: Vec<&str> = headings.iter().take(3).map(|h| h.text.as_str()).collect();
        out.push(format!(
            "Add sections covering topics competitors address: {}",
            topics.join(", ")
        ));
    }
    if !keywords.is_empty() {
        let terms: Vec<&str> = keywords.iter().take(5).map(|k| k.token.as_str()).collect();
        out.push(format!(
            "Work in terms competitors use that the page never mentions: {}",
            terms.join(", ")
        ));
    }
    if delta > 0 {
        out.push(format!(
            "Competitors average {} more words; expand thin sections with concrete detail",
            delta
        ));
    }

    out
}
