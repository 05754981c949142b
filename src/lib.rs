//! # arch-search
//!
//! A Rust web service that classifies GitHub repositories by software
//! architecture and ranks them against free-text queries.
//!
//! ## Architecture
//!
//! Classification and search are two independent pipelines sharing the
//! repository catalog:
//!
//! ```text
//!        ┌──────────────┐         ┌──────────────┐
//!        │  File tree   │         │ README text  │
//!        └──────┬───────┘         └──────┬───────┘
//!               │                        │
//!               ▼                        ▼
//!     ┌──────────────────┐     ┌───────────────────┐
//!     │ Heuristic rules  │     │ Generative model  │
//!     │ path substrings  │     │ JSON schema,      │
//!     │ fixed confidence │     │ validated result  │
//!     └────────┬─────────┘     └─────────┬─────────┘
//!              │                         │
//!              └────────────┬────────────┘
//!                           ▼
//!                ┌─────────────────────┐
//!                │   Tag reconciler    │
//!                │  provenance + type  │
//!                └──────────┬──────────┘
//!                           ▼
//!                ┌─────────────────────┐
//!                │  Repository catalog │
//!                │  (repos.json)       │
//!                └──────────┬──────────┘
//!                           │  query terms
//!                           ▼
//!                ┌─────────────────────┐
//!                │  Relevance scorer   │
//!                │  tags ≥ threshold   │
//!                │  language  +0.5     │
//!                │  description +0.2   │
//!                └──────────┬──────────┘
//!                           ▼
//!                ┌─────────────────────┐
//!                │   Ranked results    │
//!                └─────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, data dir, LLM and GitHub settings
//! - [`models`] - Shared data types: `Repository`, `ArchitectureTag`, `AnalysisResult`, request/response types
//! - [`analysis::heuristics`] - File-path rules yielding fixed-confidence pattern candidates
//! - [`analysis::analyzer`] - Schema-constrained generative analysis of README + file tree
//! - [`analysis::reconcile`] - Turns detector output into typed, provenance-marked tags
//! - [`search::relevance`] - Additive relevance scoring over stored repositories
//! - [`search::tags`] - Tag catalogue with usage counts and mean confidence
//! - [`llm::completion`] - JSON-mode chat completions via Ollama or OpenAI-compatible APIs
//! - [`github`] - GitHub REST client for metadata, README text and file trees
//! - [`api`] - Axum HTTP handlers for ingestion, analysis, search and config management
//! - [`state`] - Shared application state holding the catalog, config and persistence

pub mod analysis;
pub mod api;
pub mod config;
pub mod github;
pub mod llm;
pub mod models;
pub mod search;
pub mod state;
