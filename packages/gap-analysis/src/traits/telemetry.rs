//! Telemetry source trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{TelemetryError, TelemetryResult};
use crate::security::SecretString;
use crate::types::telemetry::SiteIdentifier;

/// Grouping dimension for a telemetry query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryDimension {
    Date,
    Query,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryQuery {
    pub page_url: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub dimensions: Vec<TelemetryDimension>,
    pub row_limit: u32,
}

/// Raw aggregated row; `keys` follow the order of `dimensions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRow {
    pub keys: Vec<String>,
    pub clicks: f64,
    pub impressions: f64,
    pub ctr: f64,
    pub position: f64,
}

/// Anything that can answer ranking queries for a property.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn query(
        &self,
        site: &SiteIdentifier,
        query: &TelemetryQuery,
    ) -> TelemetryResult<Vec<TelemetryRow>>;

    fn name(&self) -> &str {
        "unknown"
    }
}

/// Supplies the telemetry access credential.
///
/// Session issuance lives outside this crate; the pipeline only asks for a
/// token right before each query so refreshed credentials are picked up.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> TelemetryResult<SecretString>;
}

/// A fixed token, e.g. from the environment.
pub struct StaticTokenProvider {
    token: SecretString,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<SecretString>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> TelemetryResult<SecretString> {
        if self.token.is_empty() {
            return Err(TelemetryError::Credential("empty access token".into()));
        }
        Ok(self.token.clone())
    }
}
