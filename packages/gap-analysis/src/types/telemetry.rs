//! Ranking telemetry types.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One day of aggregated ranking data for a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub position: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub ctr: f64,
}

impl TimeSeriesPoint {
    pub fn new(date: NaiveDate, position: f64, impressions: f64) -> Self {
        Self {
            date,
            position,
            impressions,
            clicks: 0.0,
            ctr: 0.0,
        }
    }
}

/// One search query the page was shown for, aggregated over the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordRecord {
    pub keyword: String,
    pub position: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub ctr: f64,
}

impl KeywordRecord {
    pub fn new(keyword: impl Into<String>, position: f64, impressions: f64) -> Self {
        Self {
            keyword: keyword.into(),
            position,
            impressions,
            clicks: 0.0,
            ctr: 0.0,
        }
    }

    pub fn with_clicks(mut self, clicks: f64) -> Self {
        self.clicks = clicks;
        self
    }

    pub fn with_ctr(mut self, ctr: f64) -> Self {
        self.ctr = ctr;
        self
    }
}

/// A telemetry property in one of its two interchangeable formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SiteIdentifier {
    /// `https://example.com/`
    UrlPrefix(String),
    /// `sc-domain:example.com`
    Domain(String),
}

impl SiteIdentifier {
    const DOMAIN_PREFIX: &'static str = "sc-domain:";

    /// Parse whatever the caller stored: `sc-domain:` prefix, full URL, or bare host.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(domain) = raw.strip_prefix(Self::DOMAIN_PREFIX) {
            return Self::Domain(domain.to_string());
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            let mut prefix = raw.to_string();
            if !prefix.ends_with('/') {
                prefix.push('/');
            }
            return Self::UrlPrefix(prefix);
        }
        Self::Domain(raw.trim_end_matches('/').to_string())
    }

    /// Wire value expected by the telemetry API.
    pub fn as_property(&self) -> String {
        match self {
            Self::UrlPrefix(url) => url.clone(),
            Self::Domain(domain) => format!("{}{}", Self::DOMAIN_PREFIX, domain),
        }
    }

    /// The same property in the other format (URL-prefix <-> domain).
    pub fn alternate(&self) -> Option<Self> {
        match self {
            Self::UrlPrefix(prefix) => {
                let host = url::Url::parse(prefix).ok()?.host_str()?.to_string();
                Some(Self::Domain(host.trim_start_matches("www.").to_string()))
            }
            Self::Domain(domain) => Some(Self::UrlPrefix(format!("https://{}/", domain))),
        }
    }
}

impl fmt::Display for SiteIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_property())
    }
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Telemetry is finalized roughly two days after the fact.
    pub const REPORTING_LAG_DAYS: i64 = 2;

    /// The `days` most recent finalized days ending before `today`.
    pub fn ending_with_lag(today: NaiveDate, days: u32) -> Self {
        let end = today - Duration::days(Self::REPORTING_LAG_DAYS);
        let start = end - Duration::days(i64::from(days.max(1)) - 1);
        Self { start, end }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_identifier_parse() {
        assert_eq!(
            SiteIdentifier::parse("sc-domain:example.com"),
            SiteIdentifier::Domain("example.com".into())
        );
        assert_eq!(
            SiteIdentifier::parse("https://example.com"),
            SiteIdentifier::UrlPrefix("https://example.com/".into())
        );
        assert_eq!(
            SiteIdentifier::parse("example.com"),
            SiteIdentifier::Domain("example.com".into())
        );
    }

    #[test]
    fn test_site_identifier_alternate() {
        let prefix = SiteIdentifier::UrlPrefix("https://www.example.com/".into());
        let domain = prefix.alternate().unwrap();
        assert_eq!(domain.as_property(), "sc-domain:example.com");
        assert_eq!(
            domain.alternate().unwrap().as_property(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_date_range_with_lag() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let range = DateRange::ending_with_lag(today, 28);
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
        assert_eq!(range.days(), 28);
    }
}
