use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{Method, Uri};
use axum::Json;
use serde_json::Value;

use crate::error::ApiError;
use crate::llm::completion::{generate_completion, CompletionResult};
use crate::models::PromptParams;
use crate::search::vector::{vector_search, RetrievalError};
use crate::state::AppState;

/// Where the prompt was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSource {
    Query,
    Body,
}

/// GET|POST /api/http_trigger - retrieval-augmented project generation:
///   1. Read `prompt` from the query string, else from the JSON body
///   2. Embed it and fetch the 3 nearest reference records
///   3. Ask the chat model, with the records as context
///   4. Return the model's content if it parses as JSON
#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4(), %method))]
pub async fn http_trigger(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    // ── Step 1: Parse prompt ──────────────────────────────
    let params = query_params(&uri)?;
    let (prompt, source) = extract_prompt(&params, &body)?;
    tracing::info!("Processing prompt from {source:?} ({} chars)", prompt.chars().count());

    // ── Step 2: Retrieve reference records ────────────────
    let records = vector_search(&state.http_client, &state.config, &prompt)
        .await
        .map_err(|e| {
            tracing::error!("Retrieval failed: {e}");
            match e {
                RetrievalError::Embedding(e) => ApiError::UpstreamUnavailable(e),
                RetrievalError::Index(e) => ApiError::Retrieval(e),
            }
        })?;
    tracing::info!("Retrieved {} reference records", records.len());

    // ── Step 3: Complete ──────────────────────────────────
    let completion = generate_completion(&state.http_client, &state.config, &records, &prompt)
        .await
        .map_err(|e| {
            tracing::error!("Completion failed: {e:#}");
            ApiError::Completion(e)
        })?;

    // ── Step 4: Validate output ───────────────────────────
    let project = parse_project(&completion)?;
    Ok(Json(project))
}

/// Read `prompt` and `code` from the query string, keeping the first value
/// of a repeated key.
pub fn query_params(uri: &Uri) -> Result<PromptParams, ApiError> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).map_err(|e| {
        tracing::warn!("Query string could not be parsed: {e}");
        ApiError::InvalidRequestBody
    })?;

    let mut params = PromptParams::default();
    for (key, value) in pairs {
        match key.as_str() {
            "prompt" if params.prompt.is_none() => params.prompt = Some(value),
            "code" if params.code.is_none() => params.code = Some(value),
            _ => {}
        }
    }
    Ok(params)
}

/// Pull a non-empty prompt out of the query string or, failing that, the body.
pub fn extract_prompt(
    params: &PromptParams,
    body: &[u8],
) -> Result<(String, PromptSource), ApiError> {
    if let Some(prompt) = params.prompt.as_deref().filter(|p| !p.is_empty()) {
        return Ok((prompt.to_string(), PromptSource::Query));
    }

    let json: Value = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!("Request body is not valid JSON: {e}");
        ApiError::InvalidRequestBody
    })?;

    json.get("prompt")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .map(|p| (p.to_string(), PromptSource::Body))
        .ok_or(ApiError::MissingPrompt)
}

/// Parse the first choice's content as an arbitrary JSON document.
pub fn parse_project(completion: &CompletionResult) -> Result<Value, ApiError> {
    let Some(content) = completion.first_content() else {
        tracing::warn!("Completion returned no content");
        return Err(ApiError::OutputFormat);
    };

    serde_json::from_str(content).map_err(|e| {
        tracing::warn!("Model output is not valid JSON: {e}");
        ApiError::OutputFormat
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(prompt: &str) -> PromptParams {
        PromptParams {
            prompt: Some(prompt.into()),
            code: None,
        }
    }

    fn completion(content: Option<&str>) -> CompletionResult {
        serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
        .unwrap()
    }

    // ─── Query string ────────────────────────────────────

    #[test]
    fn test_repeated_query_keys_keep_first_value() {
        let uri: Uri = "/api/http_trigger?prompt=a&code=k1&prompt=b&code=k2".parse().unwrap();
        let params = query_params(&uri).unwrap();
        assert_eq!(params.prompt.as_deref(), Some("a"));
        assert_eq!(params.code.as_deref(), Some("k1"));
    }

    #[test]
    fn test_query_values_are_decoded() {
        let uri: Uri = "/api/http_trigger?prompt=web+app%20with%20auth&other=1".parse().unwrap();
        let params = query_params(&uri).unwrap();
        assert_eq!(params.prompt.as_deref(), Some("web app with auth"));
        assert_eq!(params.code, None);
    }

    #[test]
    fn test_missing_query_string() {
        let uri: Uri = "/api/http_trigger".parse().unwrap();
        assert_eq!(query_params(&uri).unwrap(), PromptParams::default());
    }

    // ─── Prompt extraction ───────────────────────────────

    #[test]
    fn test_query_and_body_yield_same_prompt() {
        let (from_query, src_q) = extract_prompt(&query("I need a database service"), b"").unwrap();
        let (from_body, src_b) = extract_prompt(
            &PromptParams::default(),
            br#"{"prompt": "I need a database service"}"#,
        )
        .unwrap();
        assert_eq!(from_query, from_body);
        assert_eq!(src_q, PromptSource::Query);
        assert_eq!(src_b, PromptSource::Body);
    }

    #[test]
    fn test_query_wins_over_body() {
        let (prompt, source) =
            extract_prompt(&query("from query"), br#"{"prompt": "from body"}"#).unwrap();
        assert_eq!(prompt, "from query");
        assert_eq!(source, PromptSource::Query);
    }

    #[test]
    fn test_query_prompt_ignores_broken_body() {
        let (prompt, _) = extract_prompt(&query("ok"), b"not-json").unwrap();
        assert_eq!(prompt, "ok");
    }

    #[test]
    fn test_empty_query_prompt_falls_back_to_body() {
        let (prompt, source) = extract_prompt(&query(""), br#"{"prompt": "body"}"#).unwrap();
        assert_eq!(prompt, "body");
        assert_eq!(source, PromptSource::Body);
    }

    #[test]
    fn test_invalid_body_without_query() {
        let err = extract_prompt(&PromptParams::default(), b"not-json").unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequestBody));
    }

    #[test]
    fn test_empty_body_is_invalid_json() {
        let err = extract_prompt(&PromptParams::default(), b"").unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequestBody));
    }

    #[test]
    fn test_body_without_prompt_is_missing() {
        let bodies: [&[u8]; 4] = [
            br#"{"question": "hi"}"#,
            br#"{"prompt": ""}"#,
            br#"{"prompt": 42}"#,
            br#"["prompt"]"#,
        ];
        for body in bodies {
            let err = extract_prompt(&PromptParams::default(), body).unwrap_err();
            assert!(matches!(err, ApiError::MissingPrompt), "body: {body:?}");
        }
    }

    // ─── Output validation ───────────────────────────────

    #[test]
    fn test_valid_json_passes_through() {
        let project = parse_project(&completion(Some(r#"{"name":"X","services":["Y"]}"#))).unwrap();
        assert_eq!(project, json!({ "name": "X", "services": ["Y"] }));
    }

    #[test]
    fn test_non_object_json_is_accepted() {
        let project = parse_project(&completion(Some("[1, 2, 3]"))).unwrap();
        assert_eq!(project, json!([1, 2, 3]));
    }

    #[test]
    fn test_prose_is_rejected() {
        let err = parse_project(&completion(Some("Sure! Here is your project: ..."))).unwrap_err();
        assert!(matches!(err, ApiError::OutputFormat));
    }

    #[test]
    fn test_missing_content_is_rejected() {
        let err = parse_project(&completion(None)).unwrap_err();
        assert!(matches!(err, ApiError::OutputFormat));

        let empty: CompletionResult = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(parse_project(&empty), Err(ApiError::OutputFormat)));
    }
}
