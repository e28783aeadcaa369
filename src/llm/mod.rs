pub mod completion;
pub mod embeddings;
pub mod retry;

use anyhow::Result;

use crate::config::LlmConfig;

/// Model API called by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Embeddings,
    ChatCompletions,
}

/// Resolve the URL for `endpoint` under the configured provider.
pub fn model_url(config: &LlmConfig, endpoint: Endpoint) -> Result<String> {
    let base = config.base_url.trim_end_matches('/');
    match config.provider.as_str() {
        "azure" => {
            let (deployment, operation) = match endpoint {
                Endpoint::Embeddings => (&config.embeddings_deployment, "embeddings"),
                Endpoint::ChatCompletions => (&config.completions_deployment, "chat/completions"),
            };
            Ok(format!(
                "{base}/openai/deployments/{deployment}/{operation}?api-version={}",
                config.api_version
            ))
        }
        "openai" => {
            let operation = match endpoint {
                Endpoint::Embeddings => "embeddings",
                Endpoint::ChatCompletions => "chat/completions",
            };
            Ok(format!("{base}/v1/{operation}"))
        }
        other => anyhow::bail!("Unknown LLM provider: {other}"),
    }
}

/// Attach the provider's credential header.
pub fn authorize(builder: reqwest::RequestBuilder, config: &LlmConfig) -> reqwest::RequestBuilder {
    let api_key = config.api_key.as_deref().unwrap_or_default();
    if config.provider == "azure" {
        builder.header("api-key", api_key)
    } else {
        builder.header("Authorization", format!("Bearer {api_key}"))
    }
}
