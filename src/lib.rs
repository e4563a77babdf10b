//! # kinh-thanh-search
//!
//! A query-routing retrieval service over the Vietnamese Bible (1934
//! translation). A language model decides how each free-text question
//! should be answered, and the matching strategy pulls verses from the
//! local corpus or from a vector index of pre-embedded verse chunks.
//!
//! ## Architecture
//!
//! ```text
//!                       ┌──────────────┐
//!                       │  User Query  │
//!                       └──────┬───────┘
//!                              │
//!                              ▼
//!                   ┌─────────────────────┐
//!                   │  LLM Classifier     │──── "Đang phân tích..."
//!                   │  → RoutingDecision  │     (sent concurrently)
//!                   └──────────┬──────────┘
//!          ┌──────────────┬────┴─────────┬──────────────┐
//!          ▼              ▼              ▼              ▼
//!    ┌──────────┐  ┌────────────┐  ┌────────────┐  ┌──────────┐
//!    │  exact   │  │  semantic  │  │   scoped   │  │ invalid  │
//!    │ corpus → │  │ embed →    │  │ embed →    │  │ message, │
//!    │ 3 chunks │  │ top 3 hits │  │ top 3 in   │  │ delay,   │
//!    │          │  │            │  │ book/chap. │  │ reject   │
//!    └────┬─────┘  └─────┬──────┘  └─────┬──────┘  └────┬─────┘
//!         └──────────────┴───────┬───────┴──────────────┘
//!                                ▼
//!                  ┌───────────────────────────┐
//!                  │ SSE: message* (result|error) │
//!                  └───────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, corpus, LLM and Qdrant
//! - [`models`] - Corpus types, routing decisions, retrieval results, wire types
//! - [`error`] - `SearchError` and its user-facing Vietnamese messages
//! - [`corpus`] - Read-only corpus store, canonical book table, reference parser
//! - [`llm::embeddings`] - Query embedding via Ollama or OpenAI-compatible APIs
//! - [`llm::classifier`] - LLM query router producing a validated `RoutingDecision`
//! - [`search::vector`] - Qdrant REST client and an in-memory cosine index
//! - [`search::retrieval`] - Exact, semantic, scoped and plain retrieval strategies
//! - [`api`] - Axum handlers: streaming search, plain search, corpus browsing, config
//! - [`state`] - Shared application state wiring the services together

pub mod api;
pub mod config;
pub mod corpus;
pub mod error;
pub mod llm;
pub mod models;
pub mod search;
pub mod state;
