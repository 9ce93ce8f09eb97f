//! Plain HTTP document fetcher.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::parse::parse_document;
use crate::discovery::user_agents::DESKTOP_USER_AGENTS;
use crate::error::{FetchError, FetchResult};
use crate::retry::RetryPolicy;
use crate::traits::fetcher::DocumentFetcher;
use crate::types::config::FetchConfig;
use crate::types::document::ScrapedDocument;

pub struct HttpFetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> FetchResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("ja,en-US;q=0.8,en;q=0.6"),
        );

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(DESKTOP_USER_AGENTS[0])
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            retry: config.retry.clone(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_html(&self, url: &str) -> FetchResult<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout { url: url.to_string() }
            } else {
                FetchError::Http(Box::new(e))
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Err(FetchError::NotFound { url: url.to_string() });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Http(Box::new(e)))
    }
}

pub(crate) fn validate_url(url: &str) -> FetchResult<()> {
    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(FetchError::InvalidUrl { url: url.to_string() }),
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<ScrapedDocument> {
        validate_url(url)?;

        let html = self
            .retry
            .run(
                |attempt| {
                    debug!(url = %url, attempt, "Fetching document");
                    self.fetch_html(url)
                },
                FetchError::is_retryable,
            )
            .await
            .inspect_err(|e| warn!(url = %url, error = %e, "Document fetch failed"))?;

        let document = parse_document(url, &html);
        debug!(url = %url, words = document.word_count, headings = document.headings.len(), "Parsed document");
        Ok(document)
    }

    fn name(&self) -> &str {
        "http"
    }
}
