//! LLM semantic analyzer trait.

use async_trait::async_trait;

use crate::error::SemanticResult;
use crate::types::{document::ScrapedDocument, semantic::SemanticDiffResult};

/// One capability interface for every LLM backend.
///
/// Backends are substituted by configuration; the orchestrator only sees
/// this trait.
#[async_trait]
pub trait SemanticAnalyzer: Send + Sync {
    /// Whether the backend has what it needs (API key, model) to be called.
    fn is_available(&self) -> bool;

    /// Explain why competitors outrank the subject for one keyword.
    ///
    /// A response that is not valid JSON yields the "analysis failed"
    /// placeholder, not an error. Errors are reserved for transport and API
    /// failures.
    async fn analyze_semantic_diff(
        &self,
        keyword: &str,
        own_doc: &ScrapedDocument,
        competitor_docs: &[ScrapedDocument],
        locale: &str,
    ) -> SemanticResult<SemanticDiffResult>;

    fn name(&self) -> &str {
        "unknown"
    }
}
