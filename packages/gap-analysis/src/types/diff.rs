//! Structural diff and quality-check output types.

use serde::{Deserialize, Serialize};

/// A competitor heading the subject lacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingHeading {
    pub text: String,
    pub level: u8,
    /// How many competitors carry it
    pub competitor_count: usize,
}

/// A competitor term the subject never uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingKeyword {
    pub token: String,
    pub frequency: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub missing_headings: Vec<MissingHeading>,
    pub missing_keywords: Vec<MissingKeyword>,
    /// Average competitor word count minus subject word count
    pub word_count_delta: i64,
    pub recommendations: Vec<String>,
}

/// The nine heuristic quality signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualitySignal {
    Faq,
    Summary,
    Dates,
    Author,
    Data,
    StructuredData,
    QuestionHeadings,
    Lists,
    Tables,
}

impl QualitySignal {
    pub const ALL: [QualitySignal; 9] = [
        Self::Faq,
        Self::Summary,
        Self::Dates,
        Self::Author,
        Self::Data,
        Self::StructuredData,
        Self::QuestionHeadings,
        Self::Lists,
        Self::Tables,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Faq => "FAQ section",
            Self::Summary => "Summary or key takeaways",
            Self::Dates => "Published/updated date",
            Self::Author => "Author or editor information",
            Self::Data => "Data and statistics",
            Self::StructuredData => "Structured data markup",
            Self::QuestionHeadings => "Question-style headings",
            Self::Lists => "Bulleted or numbered lists",
            Self::Tables => "Comparison tables",
        }
    }

    pub fn remediation(&self) -> &'static str {
        match self {
            Self::Faq => "Add an FAQ section answering the questions searchers ask about this topic.",
            Self::Summary => "Open with a short summary that states the conclusion up front.",
            Self::Dates => "Show when the article was published and last updated.",
            Self::Author => "Name the author or editor and state their expertise.",
            Self::Data => "Back claims with concrete numbers, sources, or survey data.",
            Self::StructuredData => "Add JSON-LD structured data (Article, FAQPage, HowTo) to the page.",
            Self::QuestionHeadings => "Phrase some headings as the questions readers search for.",
            Self::Lists => "Break steps and options into bulleted or numbered lists.",
            Self::Tables => "Summarize comparisons or specifications in a table.",
        }
    }
}

/// Nine booleans, one per [`QualitySignal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityChecklist {
    pub has_faq: bool,
    pub has_summary: bool,
    pub has_dates: bool,
    pub has_author: bool,
    pub has_data: bool,
    pub has_structured_data: bool,
    pub has_question_headings: bool,
    pub has_lists: bool,
    pub has_tables: bool,
}

impl QualityChecklist {
    pub fn get(&self, signal: QualitySignal) -> bool {
        match signal {
            QualitySignal::Faq => self.has_faq,
            QualitySignal::Summary => self.has_summary,
            QualitySignal::Dates => self.has_dates,
            QualitySignal::Author => self.has_author,
            QualitySignal::Data => self.has_data,
            QualitySignal::StructuredData => self.has_structured_data,
            QualitySignal::QuestionHeadings => self.has_question_headings,
            QualitySignal::Lists => self.has_lists,
            QualitySignal::Tables => self.has_tables,
        }
    }

    pub fn passed(&self) -> usize {
        QualitySignal::ALL.iter().filter(|s| self.get(**s)).count()
    }
}

/// A signal competitors have and the subject lacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingElement {
    pub signal: QualitySignal,
    pub label: String,
    pub competitor_urls: Vec<String>,
    pub remediation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub subject: QualityChecklist,
    pub missing_elements: Vec<MissingElement>,
}
