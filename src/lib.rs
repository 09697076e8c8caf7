//! # Project Autoselect - Task-Relevant File Selection for LLM Prompts
//!
//! Given a project root, its flat list of files and a free-text task, picks the
//! minimal set of files a large language model needs to see to do the task.
//!
//! ## Overview
//!
//! Selection runs in two passes. A cheap local pass shortlists candidates by
//! combining lexical matches on paths and per-file summaries with a semantic
//! bonus from an embedding index. A remote LLM then chooses from the shortlist
//! and reports a confidence; below the threshold the caller gets clarification
//! questions and may answer them once.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   MCP Client    │  (Claude, VS Code, etc.)
//! └────────┬────────┘
//!          │ stdio
//! ┌────────▼────────────┐
//! │ AutoselectMcpServer │  (3 tools, 1 prompt)
//! └────────┬────────────┘
//!          │
//! ┌────────▼────────────┐      ┌──────────────────┐
//! │ SelectionOrchestr.  ├─────►│ OpenRouterClient │ (reqwest)
//! └──┬──────┬───────┬───┘      └──────────────────┘
//!    │      │       │
//! ┌──▼───┐ ┌▼─────┐ ┌▼──────────────┐
//! │Ranker│ │Cache │ │EmbeddingIndex │ (FastEmbed)
//! └──────┘ └┬─────┘ └───────────────┘
//!           │
//!    ┌──────▼────────┐
//!    │SymbolExtractor│ (tree-sitter)
//!    └───────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`client`]: `AutoselectClient`, the library entry point
//! - [`mcp_server`]: MCP protocol server exposing the client as tools
//! - [`codemap`]: tree-sitter symbol extraction
//! - [`cache`]: request-scoped file summaries
//! - [`embedding`]: embedding providers (FastEmbed, keyword hashing)
//! - [`index`]: per-project in-memory embedding indexes
//! - [`ranking`]: heuristic shortlist ranking
//! - [`llm`]: chat-completion backend
//! - [`selection`]: prompt building, reply parsing and path resolution
//! - [`config`]: configuration with environment variable overrides
//! - [`error`]: error types and result aliases
//! - [`retry`]: backoff for upstream calls
//!
//! ## Usage Example
//!
//! ```no_run
//! use project_autoselect::mcp_server::AutoselectMcpServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Serve over stdio (MCP protocol)
//!     AutoselectMcpServer::serve_stdio().await?;
//!     Ok(())
//! }
//! ```

/// Request-scoped memo of one-line file summaries
pub mod cache;

/// Library client wiring extraction, indexing and selection together
pub mod client;

/// Symbol extraction with tree-sitter
pub mod codemap;

/// Configuration management with environment variable overrides
pub mod config;

/// Embedding providers
pub mod embedding;

/// Error types and utilities
pub mod error;

/// Per-project embedding indexes
pub mod index;

/// Chat-completion backend for the selection call
pub mod llm;

/// MCP server implementation with tools and prompts
pub mod mcp_server;

/// Platform paths and project-relative path helpers
pub mod paths;

/// Heuristic shortlist ranking
pub mod ranking;

/// Retry with exponential backoff for upstream calls
pub mod retry;

/// LLM-driven file selection
pub mod selection;

/// Request/response types with JSON schema definitions
pub mod types;

pub use client::AutoselectClient;
pub use config::Config;
pub use error::{AutoselectError, ErrorKind, Result};
pub use types::{
    Codemap, ExtractSymbolsRequest, ExtractSymbolsResponse, RefreshFileRequest,
    SelectionRequest, SelectionResult, SelectionStatus, SymbolSummary,
};
