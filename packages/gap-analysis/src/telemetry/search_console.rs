//! Search Console-backed telemetry source.

use async_trait::async_trait;
use search_console_client::{Dimension, SearchAnalyticsQuery, SearchConsoleClient, SearchConsoleError};
use std::sync::Arc;

use crate::error::{TelemetryError, TelemetryResult};
use crate::traits::telemetry::{
    AccessTokenProvider, TelemetryDimension, TelemetryQuery, TelemetryRow, TelemetrySource,
};
use crate::types::telemetry::SiteIdentifier;

pub struct SearchConsoleSource {
    tokens: Arc<dyn AccessTokenProvider>,
    base_url: Option<String>,
}

impl SearchConsoleSource {
    pub fn new(tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            tokens,
            base_url: None,
        }
    }

    /// Override the API host (proxies, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    fn map_error(site: &SiteIdentifier, err: SearchConsoleError) -> TelemetryError {
        if err.is_unauthorized() {
            return TelemetryError::Unauthorized {
                site: site.as_property(),
                message: err.to_string(),
            };
        }
        match err {
            SearchConsoleError::Api { status, message } => TelemetryError::Api { status, message },
            SearchConsoleError::Http(e) => TelemetryError::Http(Box::new(e)),
        }
    }
}

#[async_trait]
impl TelemetrySource for SearchConsoleSource {
    async fn query(
        &self,
        site: &SiteIdentifier,
        query: &TelemetryQuery,
    ) -> TelemetryResult<Vec<TelemetryRow>> {
        let token = self.tokens.access_token().await?;
        let mut client = SearchConsoleClient::new(token.expose().to_string());
        if let Some(base_url) = &self.base_url {
            client = client.with_base_url(base_url.clone());
        }

        let mut request = SearchAnalyticsQuery::new(query.start, query.end).with_row_limit(query.row_limit);
        for dimension in &query.dimensions {
            request = request.dimension(match dimension {
                TelemetryDimension::Date => Dimension::Date,
                TelemetryDimension::Query => Dimension::Query,
            });
        }
        if let Some(page) = &query.page_url {
            request = request.for_page(page.clone());
        }

        let rows = client
            .query(&site.as_property(), &request)
            .await
            .map_err(|e| Self::map_error(site, e))?;

        Ok(rows
            .into_iter()
            .map(|r| TelemetryRow {
                keys: r.keys,
                clicks: r.clicks,
                impressions: r.impressions,
                ctr: r.ctr,
                position: r.position,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "search_console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::telemetry::StaticTokenProvider;
    use chrono::NaiveDate;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query() -> TelemetryQuery {
        TelemetryQuery {
            page_url: Some("https://example.com/a".into()),
            start: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 10, 7).unwrap(),
            dimensions: vec![TelemetryDimension::Date],
            row_limit: 7,
        }
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let source = SearchConsoleSource::new(Arc::new(StaticTokenProvider::new("t")))
            .with_base_url(server.uri());
        let site = SiteIdentifier::parse("https://example.com/");

        let err = source.query(&site, &query()).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_rows_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "rows": [{"keys": ["2026-10-01"], "clicks": 3.0, "impressions": 80.0, "ctr": 0.0375, "position": 6.5}]
            })))
            .mount(&server)
            .await;

        let source = SearchConsoleSource::new(Arc::new(StaticTokenProvider::new("t")))
            .with_base_url(server.uri());
        let site = SiteIdentifier::parse("sc-domain:example.com");

        let rows = source.query(&site, &query()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].position, 6.5);
    }

    #[tokio::test]
    async fn test_empty_token_is_credential_error() {
        let source = SearchConsoleSource::new(Arc::new(StaticTokenProvider::new("")));
        let site = SiteIdentifier::parse("sc-domain:example.com");
        let err = source.query(&site, &query()).await.unwrap_err();
        assert!(matches!(err, TelemetryError::Credential(_)));
    }
}
