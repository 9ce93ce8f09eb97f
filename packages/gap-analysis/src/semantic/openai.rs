//! OpenAI-compatible chat completions backend (OpenAI, OpenRouter).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::parse::parse_semantic_response;
use super::prompts::{build_prompt, system_prompt};
use crate::error::{SemanticError, SemanticResult};
use crate::security::SecretString;
use crate::traits::analyzer::SemanticAnalyzer;
use crate::types::document::ScrapedDocument;
use crate::types::semantic::SemanticDiffResult;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4o";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiAnalyzer {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    max_tokens: u32,
    label: &'static str,
}

impl OpenAiAnalyzer {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            max_tokens: 4096,
            label: "openai",
        }
    }

    /// Same wire protocol, served by OpenRouter.
    pub fn openrouter(api_key: impl Into<SecretString>) -> Self {
        Self {
            base_url: OPENROUTER_BASE_URL.to_string(),
            model: DEFAULT_OPENROUTER_MODEL.to_string(),
            label: "openrouter",
            ..Self::new(api_key)
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

    /// Hard ceiling on a single request; the pipeline applies a tighter one.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        self
    }

    async fn complete(&self, system: &str, user: &str) -> SemanticResult<String> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: 0.2,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(backend = self.label, error = %e, "LLM request failed");
                if e.is_timeout() {
                    SemanticError::Timeout
                } else {
                    SemanticError::Api(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(backend = self.label, status = %status, error = %error_text, "LLM API error");
            return Err(SemanticError::Api(format!("{} returned {}: {}", self.label, status, error_text)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| SemanticError::Api(format!("malformed {} response: {}", self.label, e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SemanticError::Api(format!("no choices in {} response", self.label)))?;

        debug!(
            backend = self.label,
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "LLM completion"
        );
        Ok(content)
    }
}

#[async_trait]
impl SemanticAnalyzer for OpenAiAnalyzer {
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
            return Err(SemanticError::Unavailable(format!("{} API key not configured", self.label)));
        }
        let raw = self
            .complete(&system_prompt(locale), &build_prompt(keyword, own_doc, competitor_docs, locale))
            .await?;
        Ok(parse_semantic_response(&raw, keyword, competitor_docs))
    }

    fn name(&self) -> &str {
        self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn docs() -> (ScrapedDocument, Vec<ScrapedDocument>) {
        (
            ScrapedDocument::new("https://mine.com/"),
            vec![ScrapedDocument::new("https://a.com/")],
        )
    }

    #[tokio::test]
    async fn test_chat_completion_is_parsed() {
        let server = MockServer::start().await;
        let content = r#"{"whyCompetitorsRankHigher": "They explain pricing", "recommendedAdditions": [{"section": "Pricing", "reason": "r", "content": "c", "competitorUrls": ["https://a.com/"]}]}"#;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": content}}]
            })))
            .mount(&server)
            .await;

        let analyzer = OpenAiAnalyzer::new("sk-test").with_base_url(server.uri());
        let (own, competitors) = docs();
        let result = analyzer
            .analyze_semantic_diff("rust async", &own, &competitors, "en")
            .await
            .unwrap();

        assert_eq!(result.why_competitors_rank_higher, "They explain pricing");
        assert_eq!(result.recommended_additions.len(), 1);
    }

    #[tokio::test]
    async fn test_api_error_is_err() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let analyzer = OpenAiAnalyzer::openrouter("key").with_base_url(server.uri());
        let (own, competitors) = docs();
        let err = analyzer
            .analyze_semantic_diff("k", &own, &competitors, "en")
            .await
            .unwrap_err();
        assert!(matches!(err, SemanticError::Api(_)));
        assert_eq!(analyzer.name(), "openrouter");
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let analyzer = OpenAiAnalyzer::new("");
        assert!(!analyzer.is_available());
        let (own, competitors) = docs();
        let err = analyzer
            .analyze_semantic_diff("k", &own, &competitors, "en")
            .await
            .unwrap_err();
        assert!(matches!(err, SemanticError::Unavailable(_)));
    }
}
