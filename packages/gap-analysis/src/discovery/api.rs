//! Paid search-API strategy (SerpApi JSON endpoint).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::locale_params;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::security::SecretString;
use crate::traits::searcher::SerpSearcher;
use crate::types::serp::{DiscoveryStrategy, SearchResultEntry, SerpPage, SerpQuery};

const DEFAULT_BASE_URL: &str = "https://serpapi.com";

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    search_information: Option<SearchInformation>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    position: Option<u32>,
    #[serde(default)]
    title: String,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchInformation {
    #[serde(default)]
    total_results: Option<u64>,
}

pub struct SerpApiSearcher {
    api_key: SecretString,
    client: reqwest::Client,
    base_url: String,
}

impl SerpApiSearcher {
    pub fn new(api_key: impl Into<SecretString>) -> DiscoveryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DiscoveryError::Http(Box::new(e)))?;

        Ok(Self {
            api_key: api_key.into(),
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SerpSearcher for SerpApiSearcher {
    async fn search(&self, query: &SerpQuery) -> DiscoveryResult<SerpPage> {
        let (hl, gl) = locale_params(&query.locale);
        let num = query.result_count.to_string();
        debug!(keyword = %query.keyword, num = query.result_count, "Querying search API");

        let response = self
            .client
            .get(format!("{}/search.json", self.base_url.trim_end_matches('/')))
            .query(&[
                ("engine", "google"),
                ("q", query.keyword.as_str()),
                ("hl", hl.as_str()),
                ("gl", gl.as_str()),
                ("num", num.as_str()),
                ("api_key", self.api_key.expose()),
            ])
            .send()
            .await
            .map_err(|e| DiscoveryError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SerpApiResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Http(Box::new(e)))?;

        if body.organic_results.is_empty() {
            if let Some(error) = body.error {
                // "Google hasn't returned any results for this query." is a valid empty page.
                if !error.contains("hasn't returned any results") {
                    return Err(DiscoveryError::Api {
                        status: status.as_u16(),
                        message: error,
                    });
                }
            }
        }

        let mut results = Vec::new();
        for organic in body.organic_results {
            let Some(link) = organic.link else { continue };
            let position = organic.position.unwrap_or(results.len() as u32 + 1);
            results.push(SearchResultEntry::new(link, organic.title, position));
        }
        let total_results = body
            .search_information
            .and_then(|i| i.total_results)
            .unwrap_or(results.len() as u64);

        info!(keyword = %query.keyword, results = results.len(), "Search API query complete");
        Ok(SerpPage {
            results,
            total_results,
        })
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn strategy(&self) -> DiscoveryStrategy {
        DiscoveryStrategy::Api
    }

    fn name(&self) -> &str {
        "serpapi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query() -> SerpQuery {
        SerpQuery {
            keyword: "rust async".into(),
            locale: "ja".into(),
            result_count: 15,
            subject_url: None,
            retry_count: None,
        }
    }

    #[tokio::test]
    async fn test_search_maps_organic_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("q", "rust async"))
            .and(query_param("num", "15"))
            .and(query_param("hl", "ja"))
            .and(query_param("api_key", "serp-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "search_information": {"total_results": 98100},
                "organic_results": [
                    {"position": 1, "title": "One", "link": "https://one.com/"},
                    {"position": 2, "title": "No link"},
                    {"position": 3, "title": "Three", "link": "https://three.com/x"}
                ]
            })))
            .mount(&server)
            .await;

        let searcher = SerpApiSearcher::new("serp-key").unwrap().with_base_url(server.uri());
        let page = searcher.search(&query()).await.unwrap();

        assert_eq!(page.total_results, 98100);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[1].position, 3);
        assert_eq!(page.results[1].url, "https://three.com/x");
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        let searcher = SerpApiSearcher::new("bad").unwrap().with_base_url(server.uri());
        let err = searcher.search(&query()).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_no_results_is_empty_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "Google hasn't returned any results for this query."
            })))
            .mount(&server)
            .await;

        let searcher = SerpApiSearcher::new("k").unwrap().with_base_url(server.uri());
        let page = searcher.search(&query()).await.unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.total_results, 0);
    }

    #[test]
    fn test_availability_follows_key() {
        assert!(SerpApiSearcher::new("k").unwrap().is_available());
        assert!(!SerpApiSearcher::new("").unwrap().is_available());
    }
}
