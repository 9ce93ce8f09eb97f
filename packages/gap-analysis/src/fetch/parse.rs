//! HTML to [`ScrapedDocument`].
//!
//! Boilerplate subtrees (scripts, navigation, forms, etc.) are skipped while
//! walking, then the densest of the `article`, `main` or `body` candidates
//! is taken as the content root.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

pub use crate::analysis::tokens::count_words;
use crate::analysis::tokens::collapse_whitespace;
use crate::types::document::{Heading, ScrapedDocument};

/// Paragraphs shorter than this (in characters) are navigation crumbs, captions, etc.
const MIN_PARAGRAPH_CHARS: usize = 20;

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "nav", "header", "footer", "aside", "form",
    "template", "svg",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "li", "ul", "ol", "br", "tr", "td", "th",
    "table", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "dd", "dt",
];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

static CONTAINER_SELECTORS: LazyLock<[Selector; 4]> = LazyLock::new(|| {
    [
        selector("article"),
        selector("main"),
        selector("[role='main']"),
        selector("body"),
    ]
});
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static HEADINGS: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3, h4, h5, h6"));
static PARAGRAPHS: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static LISTS: LazyLock<Selector> = LazyLock::new(|| selector("ul, ol"));
static STRUCTURED_DATA: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"script[type="application/ld+json"], [itemscope]"#));

/// Parse raw HTML fetched from `url`.
pub fn parse_document(url: &str, html: &str) -> ScrapedDocument {
    let document = Html::parse_document(html);

    let root = content_root(&document);
    let full_text = root.map(visible_text).unwrap_or_default();

    let (headings, paragraphs, lists) = match root {
        Some(root) => (
            extract_headings(root),
            extract_paragraphs(root),
            extract_lists(root),
        ),
        None => Default::default(),
    };

    let title = document
        .select(&TITLE)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .or_else(|| {
            headings
                .iter()
                .find(|h| h.level == 1)
                .map(|h| h.text.clone())
        })
        .unwrap_or_default();

    ScrapedDocument {
        url: url.to_string(),
        title,
        headings,
        paragraphs,
        lists,
        word_count: count_words(&full_text),
        full_text,
        has_structured_data: document.select(&STRUCTURED_DATA).next().is_some(),
    }
}

/// The first selector with any candidates wins; among its matches the one
/// with the most visible text is used.
fn content_root(document: &Html) -> Option<ElementRef<'_>> {
    for sel in CONTAINER_SELECTORS.iter() {
        let best = document
            .select(sel)
            .filter(|el| !inside_skipped(*el))
            .map(|el| (visible_text(el).chars().count(), el))
            .filter(|(len, _)| *len > 0)
            .max_by_key(|(len, _)| *len);
        if let Some((_, el)) = best {
            return Some(el);
        }
    }
    None
}

fn is_skipped(el: &ElementRef<'_>) -> bool {
    SKIPPED_TAGS.contains(&el.value().name())
}

fn inside_skipped(el: ElementRef<'_>) -> bool {
    is_skipped(&el)
        || el
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| is_skipped(&a))
}

fn visible_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(el, &mut out);
    collapse_whitespace(&out)
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if is_skipped(&child_el) {
                continue;
            }
            collect_text(child_el, out);
            if BLOCK_TAGS.contains(&child_el.value().name()) {
                out.push(' ');
            }
        }
    }
}

fn extract_headings(root: ElementRef<'_>) -> Vec<Heading> {
    root.select(&HEADINGS)
        .filter(|el| !inside_skipped(*el))
        .filter_map(|el| {
            let level = el.value().name()[1..].parse::<u8>().ok()?;
            let text = visible_text(el);
            (!text.is_empty()).then(|| Heading::new(level, text))
        })
        .collect()
}

fn extract_paragraphs(root: ElementRef<'_>) -> Vec<String> {
    root.select(&PARAGRAPHS)
        .filter(|el| !inside_skipped(*el))
        .map(visible_text)
        .filter(|p| p.chars().count() >= MIN_PARAGRAPH_CHARS)
        .collect()
}

fn extract_lists(root: ElementRef<'_>) -> Vec<Vec<String>> {
    root.select(&LISTS)
        .filter(|el| !inside_skipped(*el))
        .map(|list| {
            list.children()
                .filter_map(ElementRef::wrap)
                .filter(|child| child.value().name() == "li")
                .map(visible_text)
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|items| !items.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <head>
            <title>Async Rust Guide</title>
            <script type="application/ld+json">{"@type": "Article"}</script>
          </head>
          <body>
            <nav><ul><li>Home</li><li>Blog</li></ul></nav>
            <header><h1>Site Header</h1></header>
            <article>
              <h1>Async Rust Guide</h1>
              <p>Async Rust lets a single thread juggle thousands of tasks.</p>
              <h2>What is a future?</h2>
              <p>Short.</p>
              <p>A future is a value that will be ready at some point later.</p>
              <ul><li>Poll</li><li>Wake</li></ul>
              <script>var tracking = "ignore me";</script>
            </article>
            <footer><p>Copyright notice for the whole website here.</p></footer>
          </body>
        </html>
    "#;

    #[test]
    fn test_parse_article_page() {
        let doc = parse_document("https://example.com/guide", PAGE);

        assert_eq!(doc.title, "Async Rust Guide");
        assert_eq!(
            doc.headings,
            vec![
                Heading::new(1, "Async Rust Guide"),
                Heading::new(2, "What is a future?")
            ]
        );
        assert_eq!(doc.paragraphs.len(), 2);
        assert_eq!(doc.lists, vec![vec!["Poll".to_string(), "Wake".to_string()]]);
        assert!(doc.has_structured_data);
        assert!(!doc.full_text.contains("ignore me"));
        assert!(!doc.full_text.contains("Copyright"));
        assert!(!doc.full_text.contains("Blog"));
    }

    #[test]
    fn test_densest_candidate_wins() {
        let html = r#"<body>
            <article><p>Related: a teaser card of some sort.</p></article>
            <article><p>The real article body is considerably longer than the teaser card.</p></article>
        </body>"#;
        let doc = parse_document("https://example.com/", html);
        assert_eq!(doc.paragraphs.len(), 1);
        assert!(doc.paragraphs[0].starts_with("The real article"));
    }

    #[test]
    fn test_body_fallback_and_itemscope() {
        let html = r#"<body><div itemscope><p>No article or main element on this page at all.</p></div></body>"#;
        let doc = parse_document("https://example.com/", html);
        assert_eq!(doc.paragraphs.len(), 1);
        assert!(doc.has_structured_data);
        assert_eq!(doc.word_count, 10);
    }

    #[test]
    fn test_japanese_word_count() {
        let html = "<main><p>非同期処理の基本を解説します。サンプルコード付きです。</p></main>";
        let doc = parse_document("https://example.jp/", html);
        assert_eq!(doc.word_count, 25);
    }

    #[test]
    fn test_empty_html() {
        let doc = parse_document("https://example.com/", "");
        assert!(doc.full_text.is_empty());
        assert_eq!(doc.word_count, 0);
    }
}
