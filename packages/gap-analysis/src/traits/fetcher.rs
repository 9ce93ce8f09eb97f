//! Document fetcher trait.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::types::document::ScrapedDocument;

/// Retrieves a URL and parses it into a [`ScrapedDocument`].
///
/// Implementations:
/// - `HttpFetcher` - plain HTTP with retry
/// - `RenderedFetcher` - headless browser for JavaScript-heavy pages
/// - `ContentFetcher` - HTTP first, rendered fallback for script shells
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<ScrapedDocument>;

    fn name(&self) -> &str {
        "unknown"
    }
}
