//! CAPTCHA / bot-wall detection for search result pages.

use scraper::{Html, Selector};
use std::sync::LazyLock;

use crate::browser::LoadedPage;

static CAPTCHA_MARKERS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"#captcha-form, form[action*="sorry"], #recaptcha, .g-recaptcha, iframe[src*="recaptcha"]"#,
    )
    .expect("static selector is valid")
});

const CHALLENGE_TITLE_PREFIXES: &[&str] = &["sorry", "captcha"];

/// True when the page is a challenge instead of results.
///
/// Checks the redirect target, the title, then the DOM.
pub fn is_captcha_page(page: &LoadedPage) -> bool {
    if page.final_url.contains("/sorry/") {
        return true;
    }
    if is_challenge_title(&page.title) {
        return true;
    }
    let document = Html::parse_document(&page.html);
    document.select(&CAPTCHA_MARKERS).next().is_some()
}

/// Results pages are titled "<query> - Google ...", so the query itself
/// never counts as a challenge marker.
fn is_challenge_title(title: &str) -> bool {
    let title = title.trim().to_lowercase();
    if title.contains(" - google") {
        return false;
    }
    title.contains("unusual traffic")
        || CHALLENGE_TITLE_PREFIXES
            .iter()
            .any(|prefix| title.starts_with(prefix))
}
