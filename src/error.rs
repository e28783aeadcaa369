//! Client-facing error taxonomy for the trigger endpoint.
//!
//! Every variant renders as `{"message": "..."}`. Upstream details are logged
//! where the failure happens and never echoed to the caller.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::models::ErrorBody;

/// Seconds suggested to callers after the embedding service gave up.
pub const RETRY_AFTER_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Body is not JSON and the query string carries no prompt.
    #[error("Invalid JSON request body and no prompt in the query string")]
    InvalidRequestBody,

    /// Body is valid JSON but has no usable `prompt` field.
    #[error("Please pass a prompt in the query string or in the request body")]
    MissingPrompt,

    #[error("Missing or invalid function key")]
    Unauthorized,

    /// Embedding generation exhausted its retry budget.
    #[error("Embedding service unavailable, retry later")]
    UpstreamUnavailable(#[source] anyhow::Error),

    #[error("Search index request failed")]
    Retrieval(#[source] anyhow::Error),

    #[error("Completion model request failed")]
    Completion(#[source] anyhow::Error),

    /// Model content is missing or not valid JSON.
    #[error("API was unable to generate proper JSON response")]
    OutputFormat,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody | Self::MissingPrompt | Self::OutputFormat => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Retrieval(_) | Self::Completion(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            message: self.to_string(),
        });

        if matches!(self, Self::UpstreamUnavailable(_)) {
            (
                status,
                [(header::RETRY_AFTER, RETRY_AFTER_SECS.to_string())],
                body,
            )
                .into_response()
        } else {
            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_bad_request() {
        assert_eq!(ApiError::InvalidRequestBody.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingPrompt.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::OutputFormat.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_errors_map_to_gateway_statuses() {
        let err = ApiError::UpstreamUnavailable(anyhow::anyhow!("429"));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        let err = ApiError::Retrieval(anyhow::anyhow!("403"));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        let err = ApiError::Completion(anyhow::anyhow!("timeout"));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_messages_match_wire_contract() {
        assert_eq!(
            ApiError::InvalidRequestBody.to_string(),
            "Invalid JSON request body and no prompt in the query string"
        );
        assert_eq!(
            ApiError::OutputFormat.to_string(),
            "API was unable to generate proper JSON response"
        );
    }

    #[test]
    fn test_upstream_detail_not_in_message() {
        let err = ApiError::Retrieval(anyhow::anyhow!("api-key abc123 rejected"));
        assert!(!err.to_string().contains("abc123"));
    }

    #[test]
    fn test_unavailable_sets_retry_after() {
        let resp = ApiError::UpstreamUnavailable(anyhow::anyhow!("down")).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            resp.headers().get(header::RETRY_AFTER).unwrap(),
            &RETRY_AFTER_SECS.to_string()
        );
    }
}
