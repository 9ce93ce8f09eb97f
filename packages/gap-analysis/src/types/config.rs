//! Configuration types for every stage of the pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub detection: DetectionConfig,
    pub keywords: KeywordConfig,
    pub discovery: DiscoveryConfig,
    pub fetch: FetchConfig,
    pub semantic: SemanticConfig,

    /// Wall-clock budget for the content stage.
    ///
    /// Default: 58s (just under a 60s serverless execution limit).
    pub budget: Duration,

    /// Competitor documents fetched alongside the subject. Default: 3.
    pub max_competitor_documents: usize,

    /// Keywords given a semantic analysis; the rest are marked skipped. Default: 3.
    pub max_semantic_keywords: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            keywords: KeywordConfig::default(),
            discovery: DiscoveryConfig::default(),
            fetch: FetchConfig::default(),
            semantic: SemanticConfig::default(),
            budget: Duration::from_secs(58),
            max_competitor_documents: 3,
            max_semantic_keywords: 3,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_max_semantic_keywords(mut self, max: usize) -> Self {
        self.max_semantic_keywords = max;
        self
    }

    pub fn with_max_competitor_documents(mut self, max: usize) -> Self {
        self.max_competitor_documents = max;
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_semantic(mut self, semantic: SemanticConfig) -> Self {
        self.semantic = semantic;
        self
    }
}

/// Rank-change detection thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Days in the baseline window. Default: 7.
    pub comparison_days: u32,
    /// Average-position worsening that counts as a drop. Default: 3.0.
    pub drop_threshold: f64,
    /// A keyword ranked here or worse is a drop candidate. Default: 10.0.
    pub keyword_drop_threshold: f64,
    /// Average-position improvement that counts as a rise. Default: 3.0.
    pub rise_threshold: f64,
    /// A keyword ranked here or better is a rise candidate. Default: 5.0.
    pub keyword_rise_threshold: f64,
    /// Days of history requested from telemetry. Default: 28.
    pub lookback_days: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            comparison_days: 7,
            drop_threshold: 3.0,
            keyword_drop_threshold: 10.0,
            rise_threshold: 3.0,
            keyword_rise_threshold: 5.0,
            lookback_days: 28,
        }
    }
}

/// Keyword selection limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Default: 5.
    pub max_keywords: usize,
    /// Keywords with fewer impressions are excluded. Default: 10.
    pub min_impressions: f64,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            max_keywords: 5,
            min_impressions: 10.0,
        }
    }
}

/// Competitor discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Default: 10.
    pub max_competitors: usize,
    /// CAPTCHA retries after the first attempt. Default: 2.
    pub retry_count: u32,
    /// Go straight to the search API. Default: false.
    pub api_preferred: bool,
    /// Pause range after a CAPTCHA. Default: 10-20s.
    pub captcha_backoff: (Duration, Duration),
    /// Pause range before each subsequent keyword in browser mode. Default: 10-20s.
    pub browser_keyword_delay: (Duration, Duration),
    /// Pause range before each subsequent keyword in API mode. Default: 1-3s.
    pub api_keyword_delay: (Duration, Duration),
    /// Settle time after a results page loads. Default: 1-3s.
    pub settle_delay: (Duration, Duration),
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_competitors: 10,
            retry_count: 2,
            api_preferred: false,
            captcha_backoff: (Duration::from_secs(10), Duration::from_secs(20)),
            browser_keyword_delay: (Duration::from_secs(10), Duration::from_secs(20)),
            api_keyword_delay: (Duration::from_secs(1), Duration::from_secs(3)),
            settle_delay: (Duration::from_secs(1), Duration::from_secs(3)),
        }
    }
}

impl DiscoveryConfig {
    pub fn with_max_competitors(mut self, max: usize) -> Self {
        self.max_competitors = max;
        self
    }

    pub fn with_api_preferred(mut self, preferred: bool) -> Self {
        self.api_preferred = preferred;
        self
    }

    pub fn with_retry_count(mut self, retries: u32) -> Self {
        self.retry_count = retries;
        self
    }

    /// Zero every delay. For tests and local debugging only.
    pub fn without_delays(mut self) -> Self {
        let zero = (Duration::ZERO, Duration::ZERO);
        self.captcha_backoff = zero;
        self.browser_keyword_delay = zero;
        self.api_keyword_delay = zero;
        self.settle_delay = zero;
        self
    }

    /// Backoff policy between CAPTCHA retries.
    pub fn captcha_policy(&self) -> RetryPolicy {
        let (min, max) = self.captcha_backoff;
        RetryPolicy::constant(self.retry_count + 1, min).with_jitter(max.saturating_sub(min))
    }
}

/// Document fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout. Default: 30s.
    pub timeout: Duration,
    /// Default: 3 attempts, 2s x attempt.
    pub retry: RetryPolicy,
    /// Re-fetch through the browser when the static HTML looks like a JS shell.
    pub render_fallback: bool,
    /// Word count under which a page is treated as a JS shell. Default: 50.
    pub render_threshold_words: usize,
    /// Fixed wait after network idle in rendered mode. Default: 2s.
    pub render_settle: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::linear(3, Duration::from_secs(2)),
            render_fallback: true,
            render_threshold_words: 50,
            render_settle: Duration::from_secs(2),
        }
    }
}

/// LLM backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[default]
    OpenAi,
    OpenRouter,
    Anthropic,
    Disabled,
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "openrouter" => Ok(Self::OpenRouter),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "none" | "disabled" | "off" => Ok(Self::Disabled),
            other => Err(format!("unknown LLM provider: {}", other)),
        }
    }
}

/// Semantic analysis settings. API keys are supplied separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    pub provider: LlmProvider,
    /// Provider default when None
    pub model: Option<String>,
    /// Per-keyword timeout. Default: 15s.
    pub timeout: Duration,
    /// Default: 4096.
    pub max_tokens: u32,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: None,
            timeout: Duration::from_secs(15),
            max_tokens: 4096,
        }
    }
}

impl SemanticConfig {
    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captcha_policy_from_config() {
        let config = DiscoveryConfig::default().with_retry_count(3);
        let policy = config.captcha_policy();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.base_delay, Duration::from_secs(10));
        assert_eq!(policy.jitter, Duration::from_secs(10));
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("OpenAI".parse::<LlmProvider>(), Ok(LlmProvider::OpenAi));
        assert_eq!("claude".parse::<LlmProvider>(), Ok(LlmProvider::Anthropic));
        assert!("gemini".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.budget, Duration::from_secs(58));
        assert_eq!(config.semantic.timeout, Duration::from_secs(15));
        assert_eq!(config.fetch.timeout, Duration::from_secs(30));
    }
}
