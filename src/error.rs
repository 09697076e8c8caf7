/// Centralized error types for project-autoselect using thiserror
///
/// Every fallible operation of the retrieval pipeline returns one of these types.
/// `AutoselectError::kind()` collapses them onto the small taxonomy callers and
/// the retry policy reason about.
use std::path::Path;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AutoselectError>;

/// Main error type for the autoselect pipeline
#[derive(Error, Debug)]
pub enum AutoselectError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upstream service error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Caller-facing error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    ResourceNotFound,
    PermissionDenied,
    Configuration,
    UpstreamService,
    ExtractionFailure,
}

/// Errors related to input validation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Empty {0}")]
    Empty(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Path is not a directory: {0}")]
    NotADirectory(String),

    #[error("Upstream rejected the request with HTTP {status}: {body}")]
    UpstreamRejected { status: u16, body: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Upstream rejected the credentials with HTTP {status}")]
    Rejected { status: u16 },
}

/// Errors raised while talking to the LLM provider
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Upstream returned HTTP {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Unexpected upstream payload: {0}")]
    UnexpectedPayload(String),

    #[error("Upstream returned unusable output: {0}")]
    MalformedReply(String),

    #[error("Giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<AutoselectError>,
    },
}

/// Errors related to embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Failed to initialize embedding model: {0}")]
    InitializationFailed(String),

    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model lock was poisoned: {0}")]
    LockPoisoned(String),
}

/// Errors raised while extracting symbols from a single file
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to set parser language for {0}")]
    LanguageSetup(String),

    #[error("Parser produced no syntax tree for {0}")]
    ParseFailed(String),

    #[error("Failed to read '{file}': {reason}")]
    ReadFailed { file: String, reason: String },
}

// Conversion from anyhow::Error to AutoselectError
impl From<anyhow::Error> for AutoselectError {
    fn from(err: anyhow::Error) -> Self {
        AutoselectError::Other(format!("{:#}", err))
    }
}

impl AutoselectError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        AutoselectError::Other(msg.into())
    }

    /// Map an IO error on `path` onto the not-found / permission taxonomy
    pub fn from_io(err: std::io::Error, path: &Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => {
                AutoselectError::ResourceNotFound(path.display().to_string())
            }
            std::io::ErrorKind::PermissionDenied => {
                AutoselectError::PermissionDenied(path.display().to_string())
            }
            _ => AutoselectError::Io(err),
        }
    }

    /// Classify this error for callers and the retry policy
    pub fn kind(&self) -> ErrorKind {
        match self {
            AutoselectError::Validation(_) => ErrorKind::InvalidInput,
            AutoselectError::ResourceNotFound(_) => ErrorKind::ResourceNotFound,
            AutoselectError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            AutoselectError::Config(_) => ErrorKind::Configuration,
            AutoselectError::Upstream(_) => ErrorKind::UpstreamService,
            AutoselectError::Embedding(EmbeddingError::InitializationFailed(_)) => {
                ErrorKind::Configuration
            }
            AutoselectError::Embedding(_) => ErrorKind::UpstreamService,
            AutoselectError::Extraction(_) => ErrorKind::ExtractionFailure,
            AutoselectError::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorKind::ResourceNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
                _ => ErrorKind::UpstreamService,
            },
            AutoselectError::Other(_) => ErrorKind::UpstreamService,
        }
    }

    /// Convert to a user-facing error string suitable for MCP responses
    pub fn to_user_string(&self) -> String {
        format!("{}", self)
    }

    /// Check if this is a user error (validation, missing resources) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidInput | ErrorKind::ResourceNotFound
        )
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        crate::retry::policy_for(self.kind()) == crate::retry::RetryPolicy::Retry
    }
}

/// Shorten upstream text before it lands in an error message or a log line
pub(crate) fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push('…');
    }
    out
}
