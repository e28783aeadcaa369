pub mod generate;

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the function key
pub const FUNCTION_KEY_HEADER: &str = "x-functions-key";

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/http_trigger",
            get(generate::http_trigger).post(generate::http_trigger),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_function_key,
        ))
        .with_state(state)
}

/// Reject requests without the configured function key.
///
/// The key is accepted from the `x-functions-key` header or the `code` query
/// parameter. Without a configured key every request passes.
async fn require_function_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.config.function_key.as_deref() else {
        return Ok(next.run(req).await);
    };

    let from_header = req
        .headers()
        .get(FUNCTION_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let from_query = generate::query_params(req.uri())
        .ok()
        .and_then(|params| params.code);

    let supplied = from_header.or(from_query).unwrap_or_default();
    if keys_match(supplied.as_bytes(), expected.as_bytes()) {
        Ok(next.run(req).await)
    } else {
        tracing::warn!("Rejected request to {} without a valid function key", req.uri().path());
        Err(ApiError::Unauthorized)
    }
}

/// Compare two keys without short-circuiting on the first differing byte.
fn keys_match(supplied: &[u8], expected: &[u8]) -> bool {
    supplied.len() == expected.len()
        && supplied
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
