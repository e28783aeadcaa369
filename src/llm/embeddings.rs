use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::llm::retry::retry_with_backoff;
use crate::llm::{authorize, model_url, Endpoint};

/// Generate an embedding for `text`, retrying transient failures.
///
/// Each failed call is retried with randomized exponential backoff until
/// `config.retry.max_attempts` calls have been made. A successful call is
/// followed by a fixed pause (`embed_pacing_ms`) so bursts of requests stay
/// under low-tier rate limits.
pub async fn generate_embeddings(
    client: &reqwest::Client,
    config: &Config,
    text: &str,
) -> Result<Vec<f32>> {
    let embedding = retry_with_backoff(&config.retry, || embed_once(client, config, text)).await?;

    if config.embed_pacing_ms > 0 {
        tokio::time::sleep(Duration::from_millis(config.embed_pacing_ms)).await;
    }

    Ok(embedding)
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a str,
    /// Ignored by Azure, which selects the model from the deployment path
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

async fn embed_once(client: &reqwest::Client, config: &Config, text: &str) -> Result<Vec<f32>> {
    let llm = &config.llm;
    let url = model_url(llm, Endpoint::Embeddings)?;

    let req = EmbedRequest {
        input: text,
        model: (llm.provider == "openai").then_some(llm.embeddings_deployment.as_str()),
    };

    let resp = authorize(client.post(&url), llm)
        .json(&req)
        .send()
        .await
        .context("Failed to call embeddings API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Embeddings API returned {status}: {body}");
    }

    let body: EmbedResponse = resp
        .json()
        .await
        .context("Failed to parse embeddings response")?;

    body.data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .context("No embedding returned")
}
