//! Content fetching.
//!
//! [`ContentFetcher`] is the fetcher the pipeline uses: plain HTTP first,
//! then a headless-browser re-fetch when the static HTML is a script shell.

mod http;
pub mod parse;
mod rendered;

pub use http::HttpFetcher;
pub(crate) use http::validate_url;
pub use parse::parse_document;
pub use rendered::RenderedFetcher;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::browser::PageLoader;
use crate::error::FetchResult;
use crate::traits::fetcher::DocumentFetcher;
use crate::types::config::FetchConfig;
use crate::types::document::ScrapedDocument;

pub struct ContentFetcher {
    http: Arc<dyn DocumentFetcher>,
    rendered: Option<Arc<dyn DocumentFetcher>>,
    render_threshold_words: usize,
}

impl ContentFetcher {
    /// HTTP only.
    pub fn new(http: Arc<dyn DocumentFetcher>) -> Self {
        Self {
            http,
            rendered: None,
            render_threshold_words: FetchConfig::default().render_threshold_words,
        }
    }

    /// Build from configuration. The loader is only used when `render_fallback` is on.
    pub fn from_config(config: &FetchConfig, loader: Option<Arc<dyn PageLoader>>) -> FetchResult<Self> {
        let http: Arc<dyn DocumentFetcher> = Arc::new(HttpFetcher::new(config)?);
        let rendered = loader
            .filter(|_| config.render_fallback)
            .map(|l| Arc::new(RenderedFetcher::new(l, config.render_settle)) as Arc<dyn DocumentFetcher>);

        Ok(Self {
            http,
            rendered,
            render_threshold_words: config.render_threshold_words,
        })
    }

    pub fn with_render_fallback(mut self, rendered: Arc<dyn DocumentFetcher>) -> Self {
        self.rendered = Some(rendered);
        self
    }

    pub fn with_render_threshold(mut self, words: usize) -> Self {
        self.render_threshold_words = words;
        self
    }

    fn looks_like_shell(&self, document: &ScrapedDocument) -> bool {
        document.word_count < self.render_threshold_words
    }
}

#[async_trait]
impl DocumentFetcher for ContentFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<ScrapedDocument> {
        let document = self.http.fetch(url).await?;

        let Some(rendered) = &self.rendered else {
            return Ok(document);
        };
        if !self.looks_like_shell(&document) {
            return Ok(document);
        }

        info!(url = %url, words = document.word_count, "Static HTML looks script-rendered, re-fetching in browser");
        match rendered.fetch(url).await {
            Ok(rendered_doc) if rendered_doc.word_count > document.word_count => Ok(rendered_doc),
            Ok(_) => Ok(document),
            Err(e) => {
                warn!(url = %url, error = %e, "Rendered fetch failed, keeping static HTML");
                Ok(document)
            }
        }
    }

    fn name(&self) -> &str {
        "content"
    }
}
