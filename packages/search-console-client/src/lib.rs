//! Pure Search Console REST API client.
//!
//! A minimal client for the search-analytics endpoint. Supports both property
//! formats: URL-prefix (`https://example.com/`) and domain (`sc-domain:example.com`).
//!
//! # Example
//!
//! ```rust,ignore
//! use search_console_client::{Dimension, SearchAnalyticsQuery, SearchConsoleClient};
//!
//! let client = SearchConsoleClient::new("ya29.access-token".into());
//! let query = SearchAnalyticsQuery::new(start, end)
//!     .dimension(Dimension::Date)
//!     .for_page("https://example.com/blog/post");
//!
//! let rows = client.query("sc-domain:example.com", &query).await?;
//! ```

pub mod error;
pub mod types;

pub use error::{Result, SearchConsoleError};
pub use types::{Dimension, Filter, FilterGroup, Row, SearchAnalyticsQuery, SearchAnalyticsResponse};

const BASE_URL: &str = "https://www.googleapis.com/webmasters/v3";

pub struct SearchConsoleClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl SearchConsoleClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different host (proxies, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Run a search-analytics query against a property.
    pub async fn query(&self, site: &str, query: &SearchAnalyticsQuery) -> Result<Vec<Row>> {
        let url = format!(
            "{}/sites/{}/searchAnalytics/query",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(site)
        );
        tracing::debug!(site, dimensions = ?query.dimensions, "Search Console query");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchConsoleError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: SearchAnalyticsResponse = resp.json().await?;
        tracing::debug!(site, rows = parsed.rows.len(), "Search Console query complete");
        Ok(parsed.rows)
    }
}
