use thiserror::Error;

/// Result type for Search Console client operations.
pub type Result<T> = std::result::Result<T, SearchConsoleError>;

#[derive(Debug, Error)]
pub enum SearchConsoleError {
    /// Non-2xx response from the API.
    #[error("Search Console API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SearchConsoleError {
    /// True for 401/403 responses, which usually mean the property format
    /// (URL-prefix vs. domain) does not match what the credential can see.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == 401 || *status == 403)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }
}
