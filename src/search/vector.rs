use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, SearchConfig};
use crate::llm::embeddings::generate_embeddings;
use crate::models::ReferenceRecord;

/// Number of nearest neighbours requested per query
pub const TOP_K: usize = 3;

/// Index field holding the document embeddings
pub const VECTOR_FIELD: &str = "certificationNameVector";

/// Fields projected from every matching document
pub const SELECT_FIELDS: [&str; 3] = ["certification_name", "service_name", "category"];

/// Failure while looking up reference records.
///
/// Embedding failures are kept apart from index failures so the handler can
/// tell an exhausted embedding budget from a broken index.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("embedding failed: {0:#}")]
    Embedding(anyhow::Error),

    #[error("index query failed: {0:#}")]
    Index(anyhow::Error),
}

/// Embed `query` and return the `TOP_K` closest records, best match first.
pub async fn vector_search(
    client: &reqwest::Client,
    config: &Config,
    query: &str,
) -> std::result::Result<Vec<ReferenceRecord>, RetrievalError> {
    let embedding = generate_embeddings(client, config, query)
        .await
        .map_err(RetrievalError::Embedding)?;

    search_by_vector(client, &config.search, embedding)
        .await
        .map_err(RetrievalError::Index)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Empty: ranking is pure vector similarity, no keyword filter
    pub search: String,
    pub vector_queries: Vec<VectorQuery>,
    pub select: String,
    pub top: usize,
}

#[derive(Debug, Serialize)]
pub struct VectorQuery {
    pub kind: &'static str,
    pub vector: Vec<f32>,
    pub k: usize,
    pub fields: &'static str,
}

#[derive(Deserialize)]
struct SearchResponse {
    value: Vec<ReferenceRecord>,
}

/// Request body for a top-`TOP_K` vector query over `VECTOR_FIELD`.
pub fn build_search_request(embedding: Vec<f32>) -> SearchRequest {
    SearchRequest {
        search: String::new(),
        vector_queries: vec![VectorQuery {
            kind: "vector",
            vector: embedding,
            k: TOP_K,
            fields: VECTOR_FIELD,
        }],
        select: SELECT_FIELDS.join(","),
        top: TOP_K,
    }
}

/// Run a nearest-neighbour query against the configured index.
pub async fn search_by_vector(
    client: &reqwest::Client,
    config: &SearchConfig,
    embedding: Vec<f32>,
) -> Result<Vec<ReferenceRecord>> {
    let url = format!(
        "{}/indexes/{}/docs/search?api-version={}",
        config.endpoint.trim_end_matches('/'),
        config.index_name,
        config.api_version
    );
    let req = build_search_request(embedding);

    let resp = client
        .post(&url)
        .header("api-key", config.api_key.as_deref().unwrap_or_default())
        .json(&req)
        .send()
        .await
        .context("Failed to call search index")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Search index returned {status}: {body}");
    }

    let body: SearchResponse = resp
        .json()
        .await
        .context("Failed to parse search response")?;

    let mut records = body.value;
    records.truncate(TOP_K);
    Ok(records)
}
