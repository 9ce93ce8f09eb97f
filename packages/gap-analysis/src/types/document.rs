use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

impl Heading {
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// A fetched page reduced to the structure the diff engines compare.
///
/// Lives only for the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedDocument {
    pub url: String,
    pub title: String,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub lists: Vec<Vec<String>>,
    pub full_text: String,
    pub word_count: usize,
    pub has_structured_data: bool,
}

impl ScrapedDocument {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_heading(mut self, level: u8, text: impl Into<String>) -> Self {
        self.headings.push(Heading::new(level, text));
        self
    }

    pub fn with_paragraph(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.full_text = if self.full_text.is_empty() {
            text.clone()
        } else {
            format!("{} {}", self.full_text, text)
        };
        self.word_count = crate::fetch::parse::count_words(&self.full_text);
        self.paragraphs.push(text);
        self
    }

    pub fn with_list(mut self, items: Vec<String>) -> Self {
        self.lists.push(items);
        self
    }

    pub fn with_word_count(mut self, word_count: usize) -> Self {
        self.word_count = word_count;
        self
    }

    pub fn with_structured_data(mut self, has: bool) -> Self {
        self.has_structured_data = has;
        self
    }

    pub fn has_lists(&self) -> bool {
        self.lists.iter().any(|l| !l.is_empty())
    }
}
