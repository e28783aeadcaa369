use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Function key required on every request. `None` disables the check.
    pub function_key: Option<String>,
    /// Instruction prompt sent as the first system message of every completion
    pub system_prompt: String,
    /// Vector search index configuration
    pub search: SearchConfig,
    /// Embedding and chat model configuration
    pub llm: LlmConfig,
    /// Retry policy for the embedding call
    pub retry: RetryConfig,
    /// Pause after each successful embedding call, in milliseconds
    pub embed_pacing_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the search service (e.g. "https://my-search.search.windows.net")
    pub endpoint: String,
    /// Admin or query key, sent as the `api-key` header
    pub api_key: Option<String>,
    /// REST API version query parameter
    pub api_version: String,
    pub index_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "azure" or "openai"
    pub provider: String,
    /// Base URL for the model API
    pub base_url: String,
    pub api_key: Option<String>,
    /// Only used by the Azure provider
    pub api_version: String,
    /// Deployment (Azure) or model name (OpenAI) for embeddings
    pub embeddings_deployment: String,
    /// Deployment (Azure) or model name (OpenAI) for chat completions
    pub completions_deployment: String,
}

/// Randomized exponential backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Ceiling of the first backoff; doubles after every failure
    pub base_delay_ms: u64,
    /// Lower bound of every backoff delay
    pub min_delay_ms: u64,
    /// Upper bound of every backoff delay
    pub max_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7071".to_string(),
            function_key: None,
            system_prompt: String::new(),
            search: SearchConfig::default(),
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
            embed_pacing_ms: 500,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            api_version: "2023-11-01".to_string(),
            index_name: "project-generator-index".to_string(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "azure".to_string(),
            base_url: String::new(),
            api_key: None,
            api_version: "2023-05-15".to_string(),
            embeddings_deployment: "text-embedding-ada-002".to_string(),
            completions_deployment: "gpt-35-turbo".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay_ms: 1_000,
            min_delay_ms: 1_000,
            max_delay_ms: 20_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("PROJECT_GEN_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(key) = std::env::var("PROJECT_GEN_FUNCTION_KEY") {
            if !key.is_empty() {
                config.function_key = Some(key);
            }
        }
        if let Ok(prompt) = std::env::var("SYSTEM_PROMPT") {
            config.system_prompt = prompt;
        }

        // Search index
        if let Ok(endpoint) = std::env::var("SEARCH_ENDPOINT") {
            config.search.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Ok(key) = std::env::var("SEARCH_API_KEY") {
            config.search.api_key = Some(key);
        }
        if let Ok(version) = std::env::var("SEARCH_API_VERSION") {
            config.search.api_version = version;
        }
        if let Ok(name) = std::env::var("SEARCH_INDEX_NAME") {
            config.search.index_name = name;
        }

        // Models
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(version) = std::env::var("LLM_API_VERSION") {
            config.llm.api_version = version;
        }
        if let Ok(deployment) = std::env::var("LLM_EMBEDDINGS_DEPLOYMENT") {
            config.llm.embeddings_deployment = deployment;
        }
        if let Ok(deployment) = std::env::var("LLM_COMPLETIONS_DEPLOYMENT") {
            config.llm.completions_deployment = deployment;
        }

        // Embedding retry and pacing
        if let Ok(val) = std::env::var("EMBED_MAX_ATTEMPTS") {
            if let Ok(v) = val.parse() {
                config.retry.max_attempts = v;
            }
        }
        if let Ok(val) = std::env::var("EMBED_BASE_BACKOFF_MS") {
            if let Ok(v) = val.parse() {
                config.retry.base_delay_ms = v;
            }
        }
        if let Ok(val) = std::env::var("EMBED_MIN_BACKOFF_MS") {
            if let Ok(v) = val.parse() {
                config.retry.min_delay_ms = v;
            }
        }
        if let Ok(val) = std::env::var("EMBED_MAX_BACKOFF_MS") {
            if let Ok(v) = val.parse() {
                config.retry.max_delay_ms = v;
            }
        }
        if let Ok(val) = std::env::var("EMBED_PACING_MS") {
            if let Ok(v) = val.parse() {
                config.embed_pacing_ms = v;
            }
        }

        config
    }

    /// Reject configurations that cannot serve a single request.
    pub fn validate(&self) -> Result<()> {
        if self.system_prompt.trim().is_empty() {
            bail!("SYSTEM_PROMPT is not set");
        }
        if self.search.endpoint.is_empty() {
            bail!("SEARCH_ENDPOINT is not set");
        }
        if self.search.api_key.as_deref().unwrap_or_default().is_empty() {
            bail!("SEARCH_API_KEY is not set");
        }
        if self.llm.base_url.is_empty() {
            bail!("LLM_BASE_URL is not set");
        }
        if self.llm.api_key.as_deref().unwrap_or_default().is_empty() {
            bail!("LLM_API_KEY is not set");
        }
        match self.llm.provider.as_str() {
            "azure" | "openai" => {}
            other => bail!("Unknown LLM provider: {other}"),
        }
        if self.retry.max_attempts == 0 {
            bail!("EMBED_MAX_ATTEMPTS must be at least 1");
        }
        if self.retry.min_delay_ms > self.retry.max_delay_ms {
            bail!(
                "EMBED_MIN_BACKOFF_MS ({}) exceeds EMBED_MAX_BACKOFF_MS ({})",
                self.retry.min_delay_ms,
                self.retry.max_delay_ms
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> Config {
        let mut config = Config::default();
        config.system_prompt = "You design cloud projects. Reply with JSON.".into();
        config.search.endpoint = "https://search.example.net".into();
        config.search.api_key = Some("search-key".into());
        config.llm.base_url = "https://llm.example.net".into();
        config.llm.api_key = Some("llm-key".into());
        config
    }

    #[test]
    fn test_defaults_match_embedding_retry_budget() {
        let config = Config::default();
        assert_eq!(config.retry.max_attempts, 10);
        assert_eq!(config.retry.base_delay_ms, 1_000);
        assert_eq!(config.retry.min_delay_ms, 1_000);
        assert_eq!(config.retry.max_delay_ms, 20_000);
        assert_eq!(config.embed_pacing_ms, 500);
        assert_eq!(config.search.index_name, "project-generator-index");
    }

    #[test]
    fn test_complete_config_validates() {
        assert!(complete_config().validate().is_ok());
    }

    #[test]
    fn test_missing_system_prompt_rejected() {
        let mut config = complete_config();
        config.system_prompt = "  ".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SYSTEM_PROMPT"));
    }

    #[test]
    fn test_missing_search_key_rejected() {
        let mut config = complete_config();
        config.search.api_key = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SEARCH_API_KEY"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = complete_config();
        config.llm.provider = "ollama".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ollama"));
    }

    #[test]
    fn test_inverted_backoff_bounds_rejected() {
        let mut config = complete_config();
        config.retry.min_delay_ms = 5_000;
        config.retry.max_delay_ms = 1_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = complete_config();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
