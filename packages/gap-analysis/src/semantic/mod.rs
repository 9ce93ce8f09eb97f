//! LLM-backed semantic diffing.
//!
//! Backends implement [`SemanticAnalyzer`]; [`build_analyzer`] picks one from
//! [`SemanticConfig`]. Every backend shares the prompt in `prompts` and the
//! parse/validation step in `parse`, so the output schema is identical
//! whichever provider answers.

mod anthropic;
mod openai;
pub mod parse;
pub mod prompts;

pub use anthropic::AnthropicAnalyzer;
pub use openai::OpenAiAnalyzer;
pub use parse::parse_semantic_response;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{SemanticError, SemanticResult};
use crate::security::SecretString;
use crate::traits::analyzer::SemanticAnalyzer;
use crate::types::config::{LlmProvider, SemanticConfig};
use crate::types::document::ScrapedDocument;
use crate::types::semantic::SemanticDiffResult;

/// API keys for the LLM providers. Only the selected provider's key is used.
#[derive(Debug, Clone, Default)]
pub struct LlmKeys {
    pub openai: Option<SecretString>,
    pub openrouter: Option<SecretString>,
    pub anthropic: Option<SecretString>,
}

/// Backend used when semantic analysis is switched off or unconfigured.
#[derive(Debug, Clone, Default)]
pub struct DisabledAnalyzer {
    reason: String,
}

impl DisabledAnalyzer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SemanticAnalyzer for DisabledAnalyzer {
    fn is_available(&self) -> bool {
        false
    }

    async fn analyze_semantic_diff(
        &self,
        _keyword: &str,
        _own_doc: &ScrapedDocument,
        _competitor_docs: &[ScrapedDocument],
        _locale: &str,
    ) -> SemanticResult<SemanticDiffResult> {
        Err(SemanticError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

fn usable(key: &Option<SecretString>) -> Option<SecretString> {
    key.as_ref().filter(|k| !k.is_empty()).cloned()
}

/// Select the backend named by `config.provider`.
///
/// A provider without an API key degrades to [`DisabledAnalyzer`]; the
/// pipeline then skips semantic analysis instead of failing.
pub fn build_analyzer(config: &SemanticConfig, keys: &LlmKeys) -> Arc<dyn SemanticAnalyzer> {
    let analyzer: Arc<dyn SemanticAnalyzer> = match config.provider {
        LlmProvider::Disabled => Arc::new(DisabledAnalyzer::new("semantic analysis disabled")),
        LlmProvider::OpenAi => match usable(&keys.openai) {
            Some(key) => {
                let mut analyzer = OpenAiAnalyzer::new(key)
                    .with_max_tokens(config.max_tokens)
                    .with_timeout(config.timeout);
                if let Some(model) = &config.model {
                    analyzer = analyzer.with_model(model.clone());
                }
                Arc::new(analyzer)
            }
            None => missing_key("OPENAI_API_KEY"),
        },
        LlmProvider::OpenRouter => match usable(&keys.openrouter) {
            Some(key) => {
                let mut analyzer = OpenAiAnalyzer::openrouter(key)
                    .with_max_tokens(config.max_tokens)
                    .with_timeout(config.timeout);
                if let Some(model) = &config.model {
                    analyzer = analyzer.with_model(model.clone());
                }
                Arc::new(analyzer)
            }
            None => missing_key("OPENROUTER_API_KEY"),
        },
        LlmProvider::Anthropic => match usable(&keys.anthropic) {
            Some(key) => {
                let mut analyzer = AnthropicAnalyzer::new(key)
                    .with_max_tokens(config.max_tokens)
                    .with_timeout(config.timeout);
                if let Some(model) = &config.model {
                    analyzer = analyzer.with_model(model.clone());
                }
                Arc::new(analyzer)
            }
            None => missing_key("ANTHROPIC_API_KEY"),
        },
    };

    info!(backend = analyzer.name(), available = analyzer.is_available(), "Semantic analyzer selected");
    analyzer
}

fn missing_key(var: &str) -> Arc<dyn SemanticAnalyzer> {
    warn!(var = var, "LLM provider selected but no API key configured; semantic analysis disabled");
    Arc::new(DisabledAnalyzer::new(format!("{} not set", var)))
}
