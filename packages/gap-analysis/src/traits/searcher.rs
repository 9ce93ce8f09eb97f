//! Search-engine results trait.
//!
//! Both the browser-automation path and the paid search API return the same
//! [`SerpPage`] shape, so the discoverer can fall back from one to the other
//! without caring which produced the data.

use async_trait::async_trait;

use crate::error::DiscoveryResult;
use crate::types::serp::{DiscoveryStrategy, SerpPage, SerpQuery};

#[async_trait]
pub trait SerpSearcher: Send + Sync {
    /// Fetch organic results for a keyword.
    ///
    /// Browser implementations handle their own CAPTCHA retries and return
    /// `DiscoveryError::CaptchaDetected` once those are exhausted.
    async fn search(&self, query: &SerpQuery) -> DiscoveryResult<SerpPage>;

    /// Whether this searcher is configured well enough to be tried.
    fn is_available(&self) -> bool {
        true
    }

    fn strategy(&self) -> DiscoveryStrategy;

    fn name(&self) -> &str {
        "unknown"
    }
}
