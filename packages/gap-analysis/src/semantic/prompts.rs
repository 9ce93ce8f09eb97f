//! Prompt construction for semantic diffing.

use crate::types::document::ScrapedDocument;

const SUBJECT_PARAGRAPHS: usize = 5;
const COMPETITOR_PARAGRAPHS: usize = 3;
const EXCERPT_CHARS: usize = 300;

/// Human language name the model should answer in.
pub fn response_language(locale: &str) -> &'static str {
    match locale.split(['-', '_']).next().unwrap_or("").to_lowercase().as_str() {
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "de" => "German",
        "fr" => "French",
        "es" => "Spanish",
        _ => "English",
    }
}

pub fn system_prompt(locale: &str) -> String {
    format!(
        r#"You are an SEO content analyst. You compare a page that lost search ranking against the pages that now outrank it and explain which content gaps are responsible.

Rules:
- Only cite content that actually appears in the competitor excerpts you are given. Never invent competitor content.
- Every recommended addition and every "whatToAdd" item must list the URLs of the competitors that support it in "competitorUrls". Use only URLs from the input.
- Write all prose in {language}.
- Respond with a single JSON object and nothing else, using exactly this shape:
{{
  "whyCompetitorsRankHigher": "string",
  "missingContent": ["string"],
  "recommendedAdditions": [
    {{"section": "string", "reason": "string", "content": "string", "competitorUrls": ["string"]}}
  ],
  "keywordSpecificAnalysis": [
    {{"keyword": "string", "whyRankingDropped": "string", "whatToAdd": [{{"item": "string", "competitorUrls": ["string"]}}]}}
  ]
}}"#,
        language = response_language(locale)
    )
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}

fn outline(doc: &ScrapedDocument) -> String {
    if doc.headings.is_empty() {
        return "  (no headings)".to_string();
    }
    doc.headings
        .iter()
        .map(|h| format!("  {}H{}: {}", "  ".repeat(h.level.saturating_sub(1) as usize), h.level, h.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn excerpts(doc: &ScrapedDocument, limit: usize) -> String {
    if doc.paragraphs.is_empty() {
        return "  (no paragraphs)".to_string();
    }
    doc.paragraphs
        .iter()
        .take(limit)
        .map(|p| format!("  - {}", excerpt(p)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// User prompt for one keyword.
pub fn build_prompt(
    keyword: &str,
    own_doc: &ScrapedDocument,
    competitor_docs: &[ScrapedDocument],
    locale: &str,
) -> String {
    let mut prompt = format!(
        "Keyword: {keyword}\n\n## Our page\nURL: {url}\nWord count: {words}\nHeadings:\n{headings}\nOpening paragraphs:\n{paragraphs}\n",
        keyword = keyword,
        url = own_doc.url,
        words = own_doc.word_count,
        headings = outline(own_doc),
        paragraphs = excerpts(own_doc, SUBJECT_PARAGRAPHS),
    );

    for (i, competitor) in competitor_docs.iter().enumerate() {
        prompt.push_str(&format!(
            "\n## Competitor {n}\nURL: {url}\nWord count: {words}\nHeadings:\n{headings}\nOpening paragraphs:\n{paragraphs}\n",
            n = i + 1,
            url = competitor.url,
            words = competitor.word_count,
            headings = outline(competitor),
            paragraphs = excerpts(competitor, COMPETITOR_PARAGRAPHS),
        ));
    }

    prompt.push_str(&format!(
        "\nExplain why the competitors outrank our page for \"{}\" and what to add. Answer in {}.",
        keyword,
        response_language(locale)
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_limits_excerpts() {
        let mut own = ScrapedDocument::new("https://mine.com/").with_heading(1, "Mine");
        for i in 0..8 {
            own = own.with_paragraph(format!("Own paragraph number {}", i));
        }
        let mut competitor = ScrapedDocument::new("https://a.com/").with_heading(2, "Pricing");
        for i in 0..6 {
            competitor = competitor.with_paragraph(format!("Competitor paragraph number {}", i));
        }

        let prompt = build_prompt("rust async", &own, &[competitor], "ja");

        assert!(prompt.contains("Own paragraph number 4"));
        assert!(!prompt.contains("Own paragraph number 5"));
        assert!(prompt.contains("Competitor paragraph number 2"));
        assert!(!prompt.contains("Competitor paragraph number 3"));
        assert!(prompt.contains("URL: https://a.com/"));
        assert!(prompt.contains("H2: Pricing"));
        assert!(prompt.contains("Answer in Japanese"));
    }

    #[test]
    fn test_long_paragraph_is_truncated() {
        let long = "x".repeat(1000);
        assert_eq!(excerpt(&long).chars().count(), EXCERPT_CHARS + 3);
    }

    #[test]
    fn test_system_prompt_language() {
        assert!(system_prompt("en-US").contains("in English"));
        assert!(system_prompt("ja").contains("in Japanese"));
    }
}
