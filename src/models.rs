use serde::{Deserialize, Deserializer, Serialize};

/// Query string accepted by the trigger endpoint. A repeated key keeps its
/// first value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptParams {
    pub prompt: Option<String>,
    /// Function key, when passed as `?code=`
    pub code: Option<String>,
}

/// A document returned by the vector index, limited to the projected fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub certification_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
}

// Index documents may carry explicit nulls for unset fields.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single chat message sent to the completion model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
