use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Dimensions a search-analytics query can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Date,
    Query,
    Page,
    Country,
    Device,
}

/// Body of `POST /sites/{site}/searchAnalytics/query`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAnalyticsQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dimensions: Vec<Dimension>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dimension_filter_groups: Vec<FilterGroup>,
    pub row_limit: u32,
}

impl SearchAnalyticsQuery {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            dimensions: Vec::new(),
            dimension_filter_groups: Vec::new(),
            row_limit: 1000,
        }
    }

    pub fn dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    /// Restrict rows to a single page URL.
    pub fn for_page(mut self, page_url: impl Into<String>) -> Self {
        self.dimension_filter_groups.push(FilterGroup {
            filters: vec![Filter {
                dimension: Dimension::Page,
                operator: "equals".to_string(),
                expression: page_url.into(),
            }],
        });
        self
    }

    pub fn with_row_limit(mut self, limit: u32) -> Self {
        self.row_limit = limit;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterGroup {
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Filter {
    pub dimension: Dimension,
    pub operator: String,
    pub expression: String,
}

/// Response wrapper. `rows` is omitted entirely when there is no data.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchAnalyticsResponse {
    #[serde(default)]
    pub rows: Vec<Row>,
}

/// A single aggregated row; `keys` follow the order of the requested dimensions.
#[derive(Debug, Clone, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub keys: Vec<String>,
    pub clicks: f64,
    pub impressions: f64,
    pub ctr: f64,
    pub position: f64,
}
