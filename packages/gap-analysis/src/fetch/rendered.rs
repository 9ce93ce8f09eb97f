//! Headless-browser document fetcher for script-rendered pages.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::http::validate_url;
use super::parse::parse_document;
use crate::browser::PageLoader;
use crate::error::FetchResult;
use crate::traits::fetcher::DocumentFetcher;
use crate::types::document::ScrapedDocument;

pub struct RenderedFetcher {
    loader: Arc<dyn PageLoader>,
    settle: Duration,
}

impl RenderedFetcher {
    /// `settle` is the fixed wait after navigation completes.
    pub fn new(loader: Arc<dyn PageLoader>, settle: Duration) -> Self {
        Self { loader, settle }
    }
}

#[async_trait]
impl DocumentFetcher for RenderedFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<ScrapedDocument> {
        validate_url(url)?;

        let page = self.loader.load(url, None, self.settle).await?;
        let document = parse_document(url, &page.html);
        debug!(
            url = %url,
            loader = self.loader.name(),
            words = document.word_count,
            "Parsed rendered document"
        );
        Ok(document)
    }

    fn name(&self) -> &str {
        "rendered"
    }
}
