use anyhow::{Context, Result};
use dotenvy::dotenv;
use gap_analysis::security::SecretString;
use gap_analysis::{LlmKeys, LlmProvider, PipelineConfig, SemanticConfig};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runner configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub gsc_access_token: SecretString,
    pub serpapi_api_key: Option<SecretString>,
    pub llm_keys: LlmKeys,
    pub llm_provider: LlmProvider,
    pub llm_model: Option<String>,
    pub chrome_path: Option<PathBuf>,
    pub budget: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let secret = |name: &str| var(name).map(SecretString::from);

        Ok(Self {
            gsc_access_token: secret("GSC_ACCESS_TOKEN")
                .context("GSC_ACCESS_TOKEN must be set")?,
            serpapi_api_key: secret("SERPAPI_API_KEY"),
            llm_keys: LlmKeys {
                openai: secret("OPENAI_API_KEY"),
                openrouter: secret("OPENROUTER_API_KEY"),
                anthropic: secret("ANTHROPIC_API_KEY"),
            },
            llm_provider: var("LLM_PROVIDER")
                .map(|p| p.parse::<LlmProvider>())
                .transpose()
                .map_err(anyhow::Error::msg)
                .context("LLM_PROVIDER must be openai, openrouter, anthropic or disabled")?
                .unwrap_or_default(),
            llm_model: var("LLM_MODEL"),
            chrome_path: var("CHROME_PATH").map(PathBuf::from),
            budget: var("GAPSCAN_BUDGET_SECS")
                .map(|s| s.trim().parse::<u64>())
                .transpose()
                .context("GAPSCAN_BUDGET_SECS must be a whole number of seconds")?
                .map(Duration::from_secs),
        })
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut semantic = SemanticConfig::default().with_provider(self.llm_provider);
        if let Some(model) = &self.llm_model {
            semantic = semantic.with_model(model.clone());
        }

        let mut config = PipelineConfig::default().with_semantic(semantic);
        if let Some(budget) = self.budget {
            config = config.with_budget(budget);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_access_token_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("GSC_ACCESS_TOKEN"));
    }

    #[test]
    fn test_optional_values() {
        let config = Config::from_lookup(lookup(&[
            ("GSC_ACCESS_TOKEN", "ya29.token"),
            ("SERPAPI_API_KEY", ""),
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("LLM_PROVIDER", "anthropic"),
            ("GAPSCAN_BUDGET_SECS", "45"),
        ]))
        .unwrap();

        assert!(config.serpapi_api_key.is_none());
        assert!(config.llm_keys.anthropic.is_some());
        assert_eq!(config.llm_provider, LlmProvider::Anthropic);

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.budget, Duration::from_secs(45));
        assert_eq!(pipeline.semantic.provider, LlmProvider::Anthropic);
    }

    #[test]
    fn test_invalid_provider_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("GSC_ACCESS_TOKEN", "ya29.token"),
            ("LLM_PROVIDER", "gemini"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("LLM_PROVIDER"));
    }
}
