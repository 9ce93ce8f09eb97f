//! Typed errors for the analysis pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so each stage can decide
//! which failures degrade into partial results and which end the run.

use thiserror::Error;

/// Errors from the ranking-telemetry source.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// 401/403 from the telemetry API. Often a property-format mismatch.
    #[error("not authorized for property {site}: {message}")]
    Unauthorized { site: String, message: String },

    /// Any other non-2xx API response
    #[error("telemetry API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport failure
    #[error("telemetry HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Row could not be mapped into a typed record
    #[error("unexpected telemetry row: {0}")]
    Parse(String),

    /// Credential could not be obtained
    #[error("telemetry credential unavailable: {0}")]
    Credential(String),
}

impl TelemetryError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Errors from competitor discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The search engine kept serving a CAPTCHA after every retry.
    #[error("CAPTCHA detected for '{keyword}' after {attempts} attempts")]
    CaptchaDetected {
        keyword: String,
        attempts: u32,
        /// Own rank learned before the block, carried into the API fallback.
        own_rank: Option<u32>,
    },

    /// Blocked and no fallback strategy is configured.
    #[error("search engine blocked automated queries for '{keyword}'; retry later")]
    RetryLater { keyword: String },

    /// Headless browser failed (launch, navigation, content)
    #[error("browser error: {0}")]
    Browser(String),

    /// Search API returned non-2xx
    #[error("search API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport failure
    #[error("search HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// No strategy is able to serve the request
    #[error("no discovery strategy configured")]
    NoStrategy,
}

/// Errors from the headless browser.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("failed to read page content: {0}")]
    Content(String),

    /// The blocking browser task panicked or was cancelled
    #[error("browser task failed: {0}")]
    Task(String),
}

impl From<BrowserError> for DiscoveryError {
    fn from(err: BrowserError) -> Self {
        Self::Browser(err.to_string())
    }
}

impl From<BrowserError> for FetchError {
    fn from(err: BrowserError) -> Self {
        Self::Browser(err.to_string())
    }
}

/// Errors from content fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    /// 404/410 from the origin. Not retried.
    #[error("page not found: {url}")]
    NotFound { url: String },

    /// Other non-2xx status after all retries
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("fetch HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("browser error: {0}")]
    Browser(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Missing pages and malformed URLs fail fast; every other status and
    /// transport failure gets another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotFound { .. } | Self::InvalidUrl { .. })
    }
}

/// Errors from an LLM backend.
#[derive(Debug, Error)]
pub enum SemanticError {
    #[error("LLM backend unavailable: {0}")]
    Unavailable(String),

    #[error("LLM API error: {0}")]
    Api(String),

    #[error("LLM request timed out")]
    Timeout,
}

/// Errors that end a pipeline run.
///
/// Everything else is folded into degraded-but-present stage output.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("telemetry failed: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl PipelineError {
    /// Short reason suitable for showing to the person who requested the run.
    pub fn user_reason(&self) -> String {
        match self {
            Self::Telemetry(TelemetryError::Unauthorized { site, .. }) => format!(
                "The ranking data for {} could not be accessed. Check that the property is \
                 registered and that the account has permission to read it.",
                site
            ),
            Self::Telemetry(TelemetryError::Credential(_)) => {
                "The ranking data credential is missing or expired. Reconnect the account and try again."
                    .to_string()
            }
            Self::Telemetry(_) => {
                "Ranking data is temporarily unavailable. Try again in a few minutes.".to_string()
            }
            Self::InvalidRequest(reason) => format!("The analysis request is invalid: {}", reason),
        }
    }
}

/// Result type alias for telemetry operations.
pub type TelemetryResult<T> = std::result::Result<T, TelemetryError>;

/// Result type alias for discovery operations.
pub type DiscoveryResult<T> = std::result::Result<T, DiscoveryError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for browser operations.
pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

/// Result type alias for LLM operations.
pub type SemanticResult<T> = std::result::Result<T, SemanticError>;

/// Result type alias for pipeline runs.
pub type Result<T> = std::result::Result<T, PipelineError>;
