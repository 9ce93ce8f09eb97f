//! Typed telemetry queries.
//!
//! [`TelemetryClient`] turns raw [`TelemetryRow`]s into time-series points and
//! keyword records for a single page. [`SearchConsoleSource`] is the
//! production [`TelemetrySource`].

mod search_console;

pub use search_console::SearchConsoleSource;

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{TelemetryError, TelemetryResult};
use crate::traits::telemetry::{TelemetryDimension, TelemetryQuery, TelemetryRow, TelemetrySource};
use crate::types::telemetry::{DateRange, KeywordRecord, SiteIdentifier, TimeSeriesPoint};

const KEYWORD_ROW_LIMIT: u32 = 500;

pub struct TelemetryClient {
    source: Arc<dyn TelemetrySource>,
}

impl TelemetryClient {
    pub fn new(source: Arc<dyn TelemetrySource>) -> Self {
        Self { source }
    }

    /// Daily position/impression series for a page, sorted by date.
    pub async fn time_series(
        &self,
        site: &SiteIdentifier,
        page_url: &str,
        range: DateRange,
    ) -> TelemetryResult<Vec<TimeSeriesPoint>> {
        let query = TelemetryQuery {
            page_url: Some(page_url.to_string()),
            start: range.start,
            end: range.end,
            dimensions: vec![TelemetryDimension::Date],
            row_limit: range.days().max(1) as u32,
        };
        let rows = self.source.query(site, &query).await?;

        let mut points = rows
            .into_iter()
            .map(row_to_point)
            .collect::<TelemetryResult<Vec<_>>>()?;
        points.sort_by_key(|p| p.date);

        debug!(site = %site, page = %page_url, points = points.len(), "Loaded time series");
        Ok(points)
    }

    /// Per-query rows for a page over the window.
    pub async fn keywords(
        &self,
        site: &SiteIdentifier,
        page_url: &str,
        range: DateRange,
    ) -> TelemetryResult<Vec<KeywordRecord>> {
        let query = TelemetryQuery {
            page_url: Some(page_url.to_string()),
            start: range.start,
            end: range.end,
            dimensions: vec![TelemetryDimension::Query],
            row_limit: KEYWORD_ROW_LIMIT,
        };
        let rows = self.source.query(site, &query).await?;

        let records: Vec<KeywordRecord> = rows
            .into_iter()
            .filter_map(|row| match row.keys.into_iter().next() {
                Some(keyword) if !keyword.trim().is_empty() => Some(KeywordRecord {
                    keyword,
                    position: row.position,
                    impressions: row.impressions,
                    clicks: row.clicks,
                    ctr: row.ctr,
                }),
                _ => {
                    warn!(site = %site, "Dropping keyword row without a query key");
                    None
                }
            })
            .collect();

        debug!(site = %site, page = %page_url, keywords = records.len(), "Loaded keywords");
        Ok(records)
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }
}

fn row_to_point(row: TelemetryRow) -> TelemetryResult<TimeSeriesPoint> {
    let key = row
        .keys
        .first()
        .ok_or_else(|| TelemetryError::Parse("date row without keys".into()))?;
    let date = NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .map_err(|e| TelemetryError::Parse(format!("bad date '{}': {}", key, e)))?;
    Ok(TimeSeriesPoint {
        date,
        position: row.position,
        impressions: row.impressions,
        clicks: row.clicks,
        ctr: row.ctr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTelemetrySource;

    fn range() -> DateRange {
        DateRange {
            start: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 10, 3).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_time_series_sorted() {
        let source = MockTelemetrySource::new().with_date_rows(vec![
            ("2026-10-03", 9.0, 100.0),
            ("2026-10-01", 4.0, 120.0),
            ("2026-10-02", 5.0, 90.0),
        ]);
        let client = TelemetryClient::new(Arc::new(source));
        let site = SiteIdentifier::parse("sc-domain:example.com");

        let points = client
            .time_series(&site, "https://example.com/a", range())
            .await
            .unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].position, 4.0);
        assert_eq!(points[2].position, 9.0);
    }

    #[tokio::test]
    async fn test_bad_date_is_parse_error() {
        let source = MockTelemetrySource::new().with_date_rows(vec![("yesterday", 9.0, 100.0)]);
        let client = TelemetryClient::new(Arc::new(source));
        let site = SiteIdentifier::parse("sc-domain:example.com");

        let err = client
            .time_series(&site, "https://example.com/a", range())
            .await
            .unwrap_err();
        assert!(matches!(err, TelemetryError::Parse(_)));
    }

    #[tokio::test]
    async fn test_keywords_skip_empty_keys() {
        let source = MockTelemetrySource::new()
            .with_keyword(KeywordRecord::new("rust async", 12.0, 300.0))
            .with_keyword(KeywordRecord::new("  ", 3.0, 50.0));
        let client = TelemetryClient::new(Arc::new(source));
        let site = SiteIdentifier::parse("sc-domain:example.com");

        let keywords = client
            .keywords(&site, "https://example.com/a", range())
            .await
            .unwrap();
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0].keyword, "rust async");
    }
}
