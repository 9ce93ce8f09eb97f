//! Heuristic content-quality checklist.
//!
//! Markers cover English and Japanese pages.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::diff::{MissingElement, QualityChecklist, QualityReport, QualitySignal};
use crate::types::document::{Heading, ScrapedDocument};

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex is valid")
}

static FAQ: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\bfaqs?\b|frequently asked|\bq\s?&\s?a\b|よくある(ご)?質問|Ｑ＆Ａ")
});
static SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\bsummary\b|\btl;?dr\b|key takeaways|at a glance|\bin short\b|まとめ|要約|結論|概要")
});
static SUMMARY_LEAD: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\bin this (article|guide|post)\b|\bthis (article|guide|post) (covers|explains|shows)\b|この記事では|本記事では|結論から")
});
static DATE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\b(updated|published|last modified|posted on)\b|更新日|公開日|投稿日|最終更新")
});
static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\b\d{4}[-/.]\d{1,2}[-/.]\d{1,2}\b|\d{4}年\s?\d{1,2}月(\s?\d{1,2}日)?|\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2},\s+\d{4}\b")
});
static AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\b(author|written by|reviewed by|edited by|editor)\b|著者|執筆者|監修|編集部|筆者|ライター")
});
static DATA_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\b(statistics|survey|study|research|according to)\b|調査|統計|データ|割合")
});
static NUMBER_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\d+(\.\d+)?\s?(%|％|percent\b|円|万|億|ドル|usd\b|kg\b|km\b|ms\b|gb\b|mb\b|人|件|倍)|[$¥€£]\s?\d")
});
static QUESTION_START: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)^(what|why|how|when|where|which|who|can|is|are|does|do|should)\b")
});
static QUESTION_JA: LazyLock<Regex> = LazyLock::new(|| regex(r"とは|ですか|ますか|方法は|なぜ|どう"));
static TABLE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\b(table|comparison|compared|versus|vs\.?)\b|比較表|一覧表|比較|早見表|スペック表")
});

/// Question-style headings needed to count as an implicit FAQ.
const FAQ_QUESTION_HEADINGS: usize = 3;

/// A first paragraph this short reads as a lead/summary.
const SUMMARY_LEAD_MAX_CHARS: usize = 200;

fn is_question_heading(heading: &Heading) -> bool {
    let text = heading.text.trim();
    text.ends_with('?')
        || text.ends_with('？')
        || QUESTION_START.is_match(text)
        || QUESTION_JA.is_match(text)
}

#[derive(Debug, Clone, Default)]
pub struct QualitySignalChecker;

impl QualitySignalChecker {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate all nine signals on one document.
    pub fn check(&self, doc: &ScrapedDocument) -> QualityChecklist {
        let heading_text = doc
            .headings
            .iter()
            .map(|h| h.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let haystack = format!("{}\n{}\n{}", doc.title, heading_text, doc.full_text);

        let question_headings = doc.headings.iter().filter(|h| is_question_heading(h)).count();

        let summary_lead = doc
            .paragraphs
            .first()
            .map(|p| p.chars().count() <= SUMMARY_LEAD_MAX_CHARS && SUMMARY_LEAD.is_match(p))
            .unwrap_or(false);

        QualityChecklist {
            has_faq: FAQ.is_match(&haystack) || question_headings >= FAQ_QUESTION_HEADINGS,
            has_summary: SUMMARY.is_match(&haystack) || summary_lead,
            has_dates: DATE_KEYWORD.is_match(&haystack) || DATE_PATTERN.is_match(&haystack),
            has_author: AUTHOR.is_match(&haystack),
            has_data: DATA_KEYWORD.is_match(&haystack)
                || NUMBER_WITH_UNIT.is_match(&haystack)
                || doc.has_lists(),
            has_structured_data: doc.has_structured_data,
            has_question_headings: question_headings > 0,
            has_lists: doc.has_lists(),
            has_tables: TABLE.is_match(&haystack),
        }
    }

    /// Signals the subject lacks that at least one competitor has.
    pub fn compare(&self, subject: &ScrapedDocument, competitors: &[ScrapedDocument]) -> QualityReport {
        let own = self.check(subject);
        let checked: Vec<(&str, QualityChecklist)> = competitors
            .iter()
            .map(|c| (c.url.as_str(), self.check(c)))
            .collect();

        let missing_elements = QualitySignal::ALL
            .iter()
            .filter(|signal| !own.get(**signal))
            .filter_map(|signal| {
                let competitor_urls: Vec<String> = checked
                    .iter()
                    .filter(|(_, list)| list.get(*signal))
                    .map(|(url, _)| url.to_string())
                    .collect();
                (!competitor_urls.is_empty()).then(|| MissingElement {
                    signal: *signal,
                    label: signal.label().to_string(),
                    competitor_urls,
                    remediation: signal.remediation().to_string(),
                })
            })
            .collect();

        QualityReport {
            subject: own,
            missing_elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> QualitySignalChecker {
        QualitySignalChecker::new()
    }

    #[test]
    fn test_bare_document_fails_everything() {
        let doc = ScrapedDocument::new("https://a.com/")
            .with_heading(1, "Rust")
            .with_paragraph("Rust is a systems programming language.");
        assert_eq!(checker().check(&doc).passed(), 0);
    }

    #[test]
    fn test_english_markers() {
        let doc = ScrapedDocument::new("https://a.com/")
            .with_heading(2, "Frequently Asked Questions")
            .with_heading(2, "Key Takeaways")
            .with_heading(2, "Comparison table")
            .with_paragraph("Written by Jane Doe. Last updated March 3, 2026.")
            .with_paragraph("Adoption grew 42% year over year according to the survey.")
            .with_structured_data(true);
        let list = checker().check(&doc);

        assert!(list.has_faq);
        assert!(list.has_summary);
        assert!(list.has_dates);
        assert!(list.has_author);
        assert!(list.has_data);
        assert!(list.has_structured_data);
        assert!(list.has_tables);
        assert!(!list.has_question_headings);
        assert!(!list.has_lists);
    }

    #[test]
    fn test_japanese_markers() {
        let doc = ScrapedDocument::new("https://a.jp/")
            .with_heading(2, "よくある質問")
            .with_heading(2, "非同期処理とは")
            .with_heading(2, "まとめ")
            .with_paragraph("監修：山田太郎　公開日 2026年3月3日")
            .with_paragraph("利用者は前年比で2倍に増えました。料金の比較表も掲載しています。");
        let list = checker().check(&doc);

        assert!(list.has_faq);
        assert!(list.has_summary);
        assert!(list.has_dates);
        assert!(list.has_author);
        assert!(list.has_data);
        assert!(list.has_question_headings);
        assert!(list.has_tables);
    }

    #[test]
    fn test_question_headings_imply_faq() {
        let doc = ScrapedDocument::new("https://a.com/")
            .with_heading(2, "What is a future?")
            .with_heading(2, "How does polling work")
            .with_heading(2, "Why pin?");
        let list = checker().check(&doc);
        assert!(list.has_question_headings);
        assert!(list.has_faq);
    }

    #[test]
    fn test_lists_count_as_data() {
        let doc = ScrapedDocument::new("https://a.com/").with_list(vec!["one".into()]);
        let list = checker().check(&doc);
        assert!(list.has_lists);
        assert!(list.has_data);
    }

    #[test]
    fn test_compare_names_competitors() {
        let subject = ScrapedDocument::new("https://mine.com/");
        let with_faq = ScrapedDocument::new("https://a.com/").with_heading(2, "FAQ");
        let with_schema = ScrapedDocument::new("https://b.com/")
            .with_heading(2, "FAQ")
            .with_structured_data(true);

        let report = checker().compare(&subject, &[with_faq, with_schema]);
        let faq = report
            .missing_elements
            .iter()
            .find(|m| m.signal == QualitySignal::Faq)
            .unwrap();
        assert_eq!(faq.competitor_urls, vec!["https://a.com/", "https://b.com/"]);
        assert_eq!(faq.remediation, QualitySignal::Faq.remediation());

        let signals: Vec<_> = report.missing_elements.iter().map(|m| m.signal).collect();
        assert_eq!(signals, vec![QualitySignal::Faq, QualitySignal::StructuredData]);
    }

    #[test]
    fn test_compare_skips_signals_subject_has() {
        let subject = ScrapedDocument::new("https://mine.com/").with_structured_data(true);
        let competitor = ScrapedDocument::new("https://a.com/").with_structured_data(true);
        let report = checker().compare(&subject, &[competitor]);
        assert!(report.missing_elements.is_empty());
    }
}
