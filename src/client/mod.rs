//! Core library client for project-autoselect
//!
//! This module provides the main client interface for using project-autoselect
//! as a library in your own Rust applications.

use crate::cache::FileSummaryCache;
use crate::codemap::{SymbolExtractor, ensure_directory};
use crate::config::{Config, EmbeddingConfig};
use crate::embedding::{EmbeddingProvider, FastEmbedManager, HASH_EMBEDDER_NAME, HashEmbedder};
use crate::error::{AutoselectError, Result, ValidationError};
use crate::index::IndexRegistry;
use crate::llm::{CompletionBackend, OpenRouterClient};
use crate::paths::resolve_under;
use crate::selection::SelectionOrchestrator;
use crate::types::*;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Main client for selecting the files a task needs
///
/// Holds the grammar registry, the per-project embedding indexes and the
/// upstream LLM backend. Cloning is cheap; clones share the indexes.
///
/// # Example
///
/// ```no_run
/// use project_autoselect::{AutoselectClient, SelectionRequest};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = AutoselectClient::new().await?;
///
///     let request = SelectionRequest::new(
///         "/path/to/project",
///         vec!["auth/login_service.py".to_string(), "utils/email.py".to_string()],
///         "implement password reset with email notifications",
///     );
///     let result = client.select_files(request).await?;
///     println!("{:?} (confidence {:.2})", result.selected, result.confidence);
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct AutoselectClient {
    pub(crate) extractor: SymbolExtractor,
    pub(crate) indexes: Arc<IndexRegistry>,
    pub(crate) orchestrator: Arc<SelectionOrchestrator>,
    // Configuration (for summary limits and accessors)
    pub(crate) config: Arc<Config>,
}

impl AutoselectClient {
    /// Create a new client from the config file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration cannot be loaded or fails validation
    /// - Embedding model cannot be initialized
    /// - The HTTP client cannot be built
    pub async fn new() -> Result<Self> {
        let config = Config::new()?;
        Self::with_config(config).await
    }

    /// Create a new client with custom configuration
    ///
    /// A missing API key is not an error here: symbol extraction works
    /// without one and `select_files` reports it.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use project_autoselect::{AutoselectClient, Config};
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let mut config = Config::default();
    ///     config.embedding.model_name = "BAAI/bge-small-en-v1.5".to_string();
    ///
    ///     let client = AutoselectClient::with_config(config).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn with_config(config: Config) -> Result<Self> {
        tracing::info!("Initializing autoselect client with configuration");
        tracing::debug!("Embedding model: {}", config.embedding.model_name);
        tracing::debug!("LLM model: {}", config.llm.model);

        let provider = embedding_provider(&config.embedding)?;

        let backend: Option<Arc<dyn CompletionBackend>> = match config.llm.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Some(Arc::new(OpenRouterClient::new(&config.llm)?)),
            _ => {
                tracing::warn!("LLM_API_KEY is not set; select_files will be unavailable");
                None
            }
        };

        Ok(Self::with_components(config, provider, backend))
    }

    /// Assemble a client from an explicit encoder and completion backend
    pub fn with_components(
        config: Config,
        provider: Arc<dyn EmbeddingProvider>,
        backend: Option<Arc<dyn CompletionBackend>>,
    ) -> Self {
        let extractor = SymbolExtractor::new(config.codemap.clone());
        let indexes = Arc::new(IndexRegistry::new(provider, config.embedding.clone()));
        let orchestrator = Arc::new(SelectionOrchestrator::new(
            &config,
            extractor.clone(),
            Arc::clone(&indexes),
            backend,
        ));

        Self {
            extractor,
            indexes,
            orchestrator,
            config: Arc::new(config),
        }
    }

    /// Pick the minimal set of files from `tree_paths` that covers the task
    ///
    /// The first call for a project builds its embedding index.
    pub async fn select_files(&self, request: SelectionRequest) -> Result<SelectionResult> {
        let start = Instant::now();
        let result = self.orchestrator.select(request).await?;
        tracing::info!(
            "select_files finished in {} ms ({:?})",
            start.elapsed().as_millis(),
            result.status
        );
        Ok(result)
    }

    /// Extract a codemap for every requested file
    ///
    /// Per-file problems show up as failed summaries; only a bad `base_dir`
    /// fails the whole call.
    pub async fn extract_symbols(
        &self,
        request: ExtractSymbolsRequest,
    ) -> Result<ExtractSymbolsResponse> {
        if request.base_dir.trim().is_empty() {
            return Err(ValidationError::Empty("base_dir".to_string()).into());
        }

        let start = Instant::now();
        let extractor = self.extractor.clone();
        let file_count = request.relative_paths.len();

        // Parsing is CPU-bound; keep it off the async workers
        let summaries = tokio::task::spawn_blocking(move || {
            extractor.extract_many(Path::new(&request.base_dir), &request.relative_paths)
        })
        .await
        .map_err(|e| AutoselectError::Other(format!("Extraction task failed: {}", e)))??;

        tracing::info!(
            "Extracted symbols from {} files in {} ms",
            file_count,
            start.elapsed().as_millis()
        );
        Ok(ExtractSymbolsResponse { summaries })
    }

    /// Recompute one file's summary and replace its vector in the project index
    pub async fn refresh_file(&self, base_dir: &str, relative_path: &str) -> Result<()> {
        let root = Path::new(base_dir);
        ensure_directory(root)?;

        let absolute = resolve_under(root, relative_path);
        if !absolute.is_file() {
            return Err(AutoselectError::ResourceNotFound(
                absolute.display().to_string(),
            ));
        }

        let mut cache = FileSummaryCache::new(
            self.extractor.clone(),
            self.config.selection.summary_max_chars,
        );
        let text = cache.index_text(&absolute, relative_path);
        self.indexes.upsert(root, relative_path, &text).await?;

        tracing::debug!("Refreshed index entry for {}", relative_path);
        Ok(())
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.indexes.provider().dimension()
    }

    /// Number of projects with a live embedding index
    pub async fn indexed_projects(&self) -> usize {
        self.indexes.project_count().await
    }
}

/// The keyword-hash encoder when asked for by name, FastEmbed otherwise
fn embedding_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    if config.model_name == HASH_EMBEDDER_NAME {
        tracing::info!("Using offline keyword-hash embeddings");
        return Ok(Arc::new(HashEmbedder::new()));
    }
    Ok(Arc::new(FastEmbedManager::from_model_name(
        &config.model_name,
    )?))
}

#[cfg(test)]
mod tests;
