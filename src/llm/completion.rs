use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::llm::{authorize, model_url, Endpoint};
use crate::models::{ChatMessage, ReferenceRecord};

/// Chat completion response, reduced to the parts the pipeline reads.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResult {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub role: String,
    pub content: Option<String>,
}

impl CompletionResult {
    /// Text content of the first choice, if the model produced any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

/// Build the message sequence sent to the chat model:
/// the system instruction, then the user's prompt, then one system message
/// per retrieved record carrying its service name, in retrieval order.
pub fn build_messages(
    system_prompt: &str,
    user_input: &str,
    records: &[ReferenceRecord],
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(records.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.push(ChatMessage::user(user_input));
    messages.extend(
        records
            .iter()
            .map(|r| ChatMessage::system(r.service_name.as_str())),
    );
    messages
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

/// Ask the chat model for a project description grounded in `records`.
///
/// The response is returned as-is; validating its content is the caller's job.
/// Failures are not retried here.
pub async fn generate_completion(
    client: &reqwest::Client,
    config: &Config,
    records: &[ReferenceRecord],
    user_input: &str,
) -> Result<CompletionResult> {
    let llm = &config.llm;
    let url = model_url(llm, Endpoint::ChatCompletions)?;
    let messages = build_messages(&config.system_prompt, user_input, records);

    let req = ChatRequest {
        messages: &messages,
        model: (llm.provider == "openai").then_some(llm.completions_deployment.as_str()),
    };

    let resp = authorize(client.post(&url), llm)
        .json(&req)
        .send()
        .await
        .context("Failed to call chat completions API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Chat completions API returned {status}: {body}");
    }

    resp.json()
        .await
        .context("Failed to parse chat completions response")
}
