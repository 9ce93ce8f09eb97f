//! URL normalization and competitor windowing.

use std::collections::HashSet;

use crate::types::serp::SearchResultEntry;

/// Ranks at or below this are "page one".
pub const FIRST_PAGE: u32 = 10;

/// Scheme, host (with port) and path; query and fragment dropped.
///
/// A trailing slash on a non-root path is removed. Every URL equality check
/// in discovery goes through this.
pub fn normalize_url(raw: &str) -> String {
    match url::Url::parse(raw.trim()) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default();
            let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
            let path = url.path();
            let path = if path.len() > 1 {
                path.trim_end_matches('/')
            } else {
                path
            };
            format!("{}://{}{}{}", url.scheme(), host, port, path)
        }
        Err(_) => raw
            .trim()
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Rank of the subject among `results`, if present.
pub fn find_own_rank(results: &[SearchResultEntry], subject_url: &str) -> Option<u32> {
    let subject = normalize_url(subject_url);
    results
        .iter()
        .find(|r| normalize_url(&r.url) == subject)
        .map(|r| r.position)
}

/// Reduce raw results to the competitors worth comparing against.
///
/// - own rank 1: nobody outranks the page, no competitors
/// - own rank 2-10: exactly the entries ranked above it
/// - own rank beyond page one, or absent: page one
///
/// The subject URL is never included and URLs are unique by normalized form.
/// Returns the window and the subject's rank.
pub fn apply_competitor_window(
    results: &[SearchResultEntry],
    subject_url: &str,
    max_competitors: usize,
) -> (Vec<SearchResultEntry>, Option<u32>) {
    let subject = normalize_url(subject_url);
    let own_rank = find_own_rank(results, subject_url);

    let cutoff = match own_rank {
        Some(rank) if rank <= 1 => return (Vec::new(), own_rank),
        Some(rank) if rank <= FIRST_PAGE => rank - 1,
        _ => FIRST_PAGE,
    };

    let mut seen = HashSet::new();
    let window = results
        .iter()
        .filter(|r| r.position <= cutoff)
        .filter(|r| {
            let key = normalize_url(&r.url);
            key != subject && seen.insert(key)
        })
        .take(max_competitors)
        .cloned()
        .collect();

    (window, own_rank)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(n: u32, own_at: Option<u32>) -> Vec<SearchResultEntry> {
        (1..=n)
            .map(|i| {
                let url = if Some(i) == own_at {
                    "https://mine.com/page".to_string()
                } else {
                    format!("https://site{}.com/post", i)
                };
                SearchResultEntry::new(url, format!("Result {}", i), i)
            })
            .collect()
    }

    fn positions(window: &[SearchResultEntry]) -> Vec<u32> {
        window.iter().map(|r| r.position).collect()
    }

    #[test]
    fn test_normalize_url_strips_query_and_fragment() {
        assert_eq!(
            normalize_url("https://a.com/x?utm=1#top"),
            normalize_url("https://a.com/x")
        );
        assert_eq!(normalize_url("https://A.com/x/"), "https://a.com/x");
        assert_eq!(normalize_url("https://a.com"), "https://a.com/");
        assert_eq!(normalize_url("not a url?x=1"), "not a url");
    }

    #[test]
    fn test_window_own_rank_5() {
        let (window, rank) = apply_competitor_window(&results(20, Some(5)), "https://mine.com/page", 10);
        assert_eq!(rank, Some(5));
        assert_eq!(positions(&window), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_window_own_rank_15() {
        let (window, rank) = apply_competitor_window(&results(20, Some(15)), "https://mine.com/page", 10);
        assert_eq!(rank, Some(15));
        assert_eq!(positions(&window), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_window_unknown_rank_capped() {
        let (window, rank) = apply_competitor_window(&results(20, None), "https://mine.com/page", 5);
        assert_eq!(rank, None);
        assert_eq!(positions(&window), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_window_top_rank_is_empty() {
        let (window, rank) = apply_competitor_window(&results(10, Some(1)), "https://mine.com/page?ref=x", 10);
        assert_eq!(rank, Some(1));
        assert!(window.is_empty());
    }

    #[test]
    fn test_window_dedupes_urls() {
        let mut entries = results(4, Some(4));
        entries[1].url = "https://site1.com/post?utm_source=x".into();
        let (window, _) = apply_competitor_window(&entries, "https://mine.com/page", 10);
        assert_eq!(positions(&window), vec![1, 3]);
    }
}
