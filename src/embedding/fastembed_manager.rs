use std::sync::Mutex;

use super::EmbeddingProvider;
use crate::error::EmbeddingError;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

/// FastEmbed-based embedding provider (all-MiniLM-L6-v2 by default)
pub struct FastEmbedManager {
    // `TextEmbedding::embed` needs `&mut self`
    model: Mutex<TextEmbedding>,
    dimension: usize,
    model_name: String,
}

impl FastEmbedManager {
    /// Create a new FastEmbedManager with the default model (all-MiniLM-L6-v2)
    pub fn new() -> Result<Self, EmbeddingError> {
        Self::from_model_name("all-MiniLM-L6-v2")
    }

    /// Create a manager from a configured model identifier
    pub fn from_model_name(name: &str) -> Result<Self, EmbeddingError> {
        let (model, dimension) = resolve_model(name)?;
        Self::with_model(model, dimension, name)
    }

    fn with_model(
        model: EmbeddingModel,
        dimension: usize,
        name: &str,
    ) -> Result<Self, EmbeddingError> {
        tracing::info!("Initializing FastEmbed model: {:?}", model);

        let mut options = InitOptions::default();
        options.model_name = model;
        options.show_download_progress = false;

        let embedding_model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitializationFailed(e.to_string()))?;

        Ok(Self {
            model: Mutex::new(embedding_model),
            dimension,
            model_name: name.to_string(),
        })
    }
}

/// Map a model identifier onto a fastembed model and its dimension
pub(crate) fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize), EmbeddingError> {
    let short = name.trim().rsplit('/').next().unwrap_or(name).to_lowercase();
    match short.as_str() {
        "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        "all-minilm-l12-v2" => Ok((EmbeddingModel::AllMiniLML12V2, 384)),
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        _ => Err(EmbeddingError::InitializationFailed(format!(
            "unknown embedding model '{}'",
            name
        ))),
    }
}

impl EmbeddingProvider for FastEmbedManager {
    fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        let mut model = self
            .model
            .lock()
            .map_err(|e| EmbeddingError::LockPoisoned(e.to_string()))?;
        model
            .embed(texts, None)
            .map_err(|e| EmbeddingError::GenerationFailed(e.to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
