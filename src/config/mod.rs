/// Configuration system for project-autoselect
///
/// Supports loading from multiple sources with priority:
/// Environment variables > Config file > Defaults
use crate::error::{AutoselectError, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Upstream LLM configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Symbol extraction guards
    #[serde(default)]
    pub codemap: CodemapConfig,

    /// Heuristic ranking configuration
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Prompt building and confidence gate
    #[serde(default)]
    pub selection: SelectionConfig,
}

/// Upstream LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat-completions endpoint (OpenAI-compatible)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Chat model identifier
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Bearer credential. Only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Completion token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Attempts for retryable upstream failures
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name (e.g., "all-MiniLM-L6-v2", "BAAI/bge-small-en-v1.5")
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Similarity floor for `top_k` hits
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,

    /// Batch size for embedding generation
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Symbol extraction guards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodemapConfig {
    /// Files above this size are skipped as too large
    #[serde(default = "default_size_limit")]
    pub size_limit_bytes: u64,

    /// Prefix length inspected by the binary guard
    #[serde(default = "default_binary_sample")]
    pub binary_sample_bytes: usize,

    /// Cap on the reference list of one file
    #[serde(default = "default_max_references")]
    pub max_references: usize,
}

/// Heuristic ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Shortlist length
    #[serde(default = "default_keep_top")]
    pub keep_top: usize,

    /// Upper bound on embedding hits used for the semantic bonus
    #[serde(default = "default_semantic_window")]
    pub semantic_window: usize,

    /// Extensions favoured when the request names no languages
    #[serde(default = "default_language_bias")]
    pub default_language_bias: Vec<String>,
}

/// Prompt building and confidence gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Replies at or above this confidence are final
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Max characters of one file summary
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,

    /// Shortlisted files that get a summary block
    #[serde(default = "default_summary_files")]
    pub summary_files: usize,

    /// Shortlisted files that get a code snippet
    #[serde(default = "default_snippet_files")]
    pub snippet_files: usize,

    /// Total characters of all snippets
    #[serde(default = "default_snippet_char_budget")]
    pub snippet_char_budget: usize,

    /// Estimated-token cap of the summary block
    #[serde(default = "default_token_hard_limit")]
    pub token_hard_limit: usize,
}

// Default value functions
fn default_api_url() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "meta-llama/llama-4-maverick:free".to_string()
}

fn default_timeout_secs() -> u64 {
    25
}

fn default_max_tokens() -> u32 {
    800
}

fn default_max_attempts() -> u32 {
    3
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_min_similarity() -> f32 {
    0.1
}

fn default_batch_size() -> usize {
    32
}

fn default_size_limit() -> u64 {
    4_000_000 // 4 MB
}

fn default_binary_sample() -> usize {
    2048
}

fn default_max_references() -> usize {
    20
}

fn default_keep_top() -> usize {
    120
}

fn default_semantic_window() -> usize {
    500
}

fn default_language_bias() -> Vec<String> {
    [".py", ".cpp", ".cc", ".hpp", ".ts", ".tsx", ".js", ".jsx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_confidence_threshold() -> f64 {
    0.95
}

fn default_summary_max_chars() -> usize {
    10_000
}

fn default_summary_files() -> usize {
    25
}

fn default_snippet_files() -> usize {
    10
}

fn default_snippet_char_budget() -> usize {
    50_000
}

fn default_token_hard_limit() -> usize {
    750_000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_llm_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            min_similarity: default_min_similarity(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for CodemapConfig {
    fn default() -> Self {
        Self {
            size_limit_bytes: default_size_limit(),
            binary_sample_bytes: default_binary_sample(),
            max_references: default_max_references(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            keep_top: default_keep_top(),
            semantic_window: default_semantic_window(),
            default_language_bias: default_language_bias(),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            summary_max_chars: default_summary_max_chars(),
            summary_files: default_summary_files(),
            snippet_files: default_snippet_files(),
            snippet_char_budget: default_snippet_char_budget(),
            token_hard_limit: default_token_hard_limit(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, AutoselectError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or create default
    pub fn load_or_default() -> Result<Self, AutoselectError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::info!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file. The API key is never written.
    pub fn save(&self, path: &Path) -> Result<(), AutoselectError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AutoselectError> {
        fn positive(key: &str, value: usize) -> Result<(), AutoselectError> {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: "must be greater than 0".to_string(),
                }
                .into());
            }
            Ok(())
        }

        if self.llm.api_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "llm.api_url".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        positive("llm.timeout_secs", self.llm.timeout_secs as usize)?;
        positive("llm.max_tokens", self.llm.max_tokens as usize)?;
        positive("llm.max_attempts", self.llm.max_attempts as usize)?;
        positive("embedding.batch_size", self.embedding.batch_size)?;
        positive("codemap.size_limit_bytes", self.codemap.size_limit_bytes as usize)?;
        positive("codemap.binary_sample_bytes", self.codemap.binary_sample_bytes)?;
        positive("codemap.max_references", self.codemap.max_references)?;
        positive("ranking.keep_top", self.ranking.keep_top)?;
        positive("ranking.semantic_window", self.ranking.semantic_window)?;
        positive("selection.summary_max_chars", self.selection.summary_max_chars)?;

        if !(-1.0..=1.0).contains(&self.embedding.min_similarity) {
            return Err(ConfigError::InvalidValue {
                key: "embedding.min_similarity".to_string(),
                reason: format!(
                    "must be between -1.0 and 1.0, got {}",
                    self.embedding.min_similarity
                ),
            }
            .into());
        }

        if !(0.0..=1.0).contains(&self.selection.confidence_threshold) {
            return Err(ConfigError::InvalidValue {
                key: "selection.confidence_threshold".to_string(),
                reason: format!(
                    "must be between 0.0 and 1.0, got {}",
                    self.selection.confidence_threshold
                ),
            }
            .into());
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LLM_API_URL") {
            self.llm.api_url = url;
        }

        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.llm.model = model;
        }

        if let Ok(key) = std::env::var("LLM_API_KEY")
            && !key.trim().is_empty()
        {
            self.llm.api_key = Some(key.trim().to_string());
        }

        if let Ok(timeout) = std::env::var("LLM_TIMEOUT_SECS")
            && let Ok(secs) = timeout.parse()
        {
            self.llm.timeout_secs = secs;
        }

        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            self.embedding.model_name = model;
        }

        if let Ok(limit) = std::env::var("CODEMAP_SIZE_LIMIT_BYTES")
            && let Ok(bytes) = limit.parse()
        {
            self.codemap.size_limit_bytes = bytes;
        }
    }

    /// Create a new Config with defaults and environment overrides
    pub fn new() -> Result<Self, AutoselectError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
