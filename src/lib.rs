//! # project-generator
//!
//! An HTTP endpoint that turns a free-text prompt into a structured cloud
//! project description. The prompt is embedded, the nearest reference records
//! are pulled from a vector search index, and a chat model is asked to draft
//! the project with those records as context.
//!
//! ## Architecture
//!
//! The pipeline is strictly linear; one request runs it once, start to end:
//!
//! ```text
//!          ┌──────────────────────┐
//!          │ GET/POST http_trigger │
//!          │  prompt: query|body   │
//!          └──────────┬───────────┘
//!                     │
//!                     ▼
//!          ┌──────────────────────┐
//!          │  Embedding (retry:   │
//!          │  10 tries, 1-20s     │
//!          │  random exp backoff) │
//!          └──────────┬───────────┘
//!                     │ vector
//!                     ▼
//!          ┌──────────────────────┐
//!          │  Vector search, k=3  │
//!          │  certification_name, │
//!          │  service_name,       │
//!          │  category            │
//!          └──────────┬───────────┘
//!                     │ 3 records
//!                     ▼
//!          ┌──────────────────────┐
//!          │  Chat completion     │
//!          │  system, user,       │
//!          │  system × records    │
//!          └──────────┬───────────┘
//!                     │
//!                     ▼
//!          ┌──────────────────────┐
//!          │  Parse content as    │
//!          │  JSON → 200 | 400    │
//!          └──────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for the index, models and retry policy
//! - [`models`] - Shared data types: `ReferenceRecord`, `ChatMessage`, request/error bodies
//! - [`error`] - Client-facing error taxonomy and its HTTP status mapping
//! - [`llm::retry`] - Randomized exponential backoff around a fallible async call
//! - [`llm::embeddings`] - Prompt embedding via Azure OpenAI or OpenAI-compatible APIs
//! - [`llm::completion`] - Message assembly and the chat completion call
//! - [`search::vector`] - Top-3 nearest-neighbour query against the search index
//! - [`api`] - Axum router, function-key check and the trigger handler
//! - [`state`] - Shared application state holding the config and HTTP client

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod search;
pub mod state;
