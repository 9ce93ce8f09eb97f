//! Anthropic messages API backend.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::parse::parse_semantic_response;
use super::prompts::{build_prompt, system_prompt};
use crate::error::{SemanticError, SemanticResult};
use crate::security::SecretString;
use crate::traits::analyzer::SemanticAnalyzer;
use crate::types::document::ScrapedDocument;
use crate::types::semantic::SemanticDiffResult;

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

pub struct AnthropicAnalyzer {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicAnalyzer {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: ANTHROPIC_BASE_URL.to_string(),
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            max_tokens: 4096,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        self
    }

    async fn complete(&self, system: &str, user: &str) -> SemanticResult<String> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(self.api_key.expose().trim())
                .map_err(|_| SemanticError::Unavailable("invalid Anthropic API key".into()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: 0.2,
            system,
            messages: vec![Message {
                role: "user",
                content: user,
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url.trim_end_matches('/')))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(backend = "anthropic", error = %e, "LLM request failed");
                if e.is_timeout() {
                    SemanticError::Timeout
                } else {
                    SemanticError::Api(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(backend = "anthropic", status = %status, error = %text, "LLM API error");
            return Err(SemanticError::Api(format!("anthropic returned {}: {}", status, text)));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| SemanticError::Api(format!("malformed anthropic response: {}", e)))?;

        let answer = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        if answer.is_empty() {
            return Err(SemanticError::Api("anthropic response missing text content".into()));
        }

        debug!(backend = "anthropic", model = %self.model, chars = answer.len(), "LLM completion");
        Ok(answer)
    }
}

#[async_trait]
impl SemanticAnalyzer for AnthropicAnalyzer {
    fn is_available(&self) -> bool {
        !self.api_key.is_empty() && !self.model.is_empty()
    }

    async fn analyze_semantic_diff(
        &self,
        keyword: &str,
        own_doc: &ScrapedDocument,
        competitor_docs: &[ScrapedDocument],
        locale: &str,
    ) -> SemanticResult<SemanticDiffResult> {
        if !self.is_available() {
            return Err(SemanticError::Unavailable("anthropic API key not configured".into()));
        }
        let raw = self
            .complete(&system_prompt(locale), &build_prompt(keyword, own_doc, competitor_docs, locale))
            .await?;
        Ok(parse_semantic_response(&raw, keyword, competitor_docs))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
