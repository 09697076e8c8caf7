//! Symbol extraction: one source file in, one [`SymbolSummary`] out.
//!
//! Files go through a binary sniff, an extension lookup and a size guard before
//! being parsed with tree-sitter and walked by the [`collector::SymbolCollector`].
//! Plain-text formats skip the parser and only contribute their headings.

pub mod classify;
pub mod collector;
pub mod edges;
pub mod language;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use rayon::prelude::*;
use regex::Regex;
use tree_sitter::Parser;

use crate::config::CodemapConfig;
use crate::error::{AutoselectError, ExtractionError, Result, ValidationError};
use crate::paths;
use crate::types::{Codemap, FailureKind, SymbolSummary};

pub use language::{GrammarRegistry, Lang};

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#+[ \t]*(.+)$").expect("heading regex is valid"));

/// Headings kept from a plain-text file
const MAX_TEXT_HEADINGS: usize = 10;

/// Extracts classes, functions, references and dependency edges from source files
#[derive(Clone)]
pub struct SymbolExtractor {
    registry: Arc<GrammarRegistry>,
    config: CodemapConfig,
}

impl SymbolExtractor {
    /// Create an extractor with a freshly built grammar registry
    pub fn new(config: CodemapConfig) -> Self {
        Self::with_registry(Arc::new(GrammarRegistry::new()), config)
    }

    /// Create an extractor sharing an existing registry
    pub fn with_registry(registry: Arc<GrammarRegistry>, config: CodemapConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &CodemapConfig {
        &self.config
    }

    /// Extract one file. Never fails: problems become a `Failed` summary.
    pub fn extract(&self, absolute_path: &Path, relative_path: &str) -> SymbolSummary {
        match self.sniff_binary(absolute_path) {
            Ok(true) => {
                tracing::info!("Codemap: {} looks binary, skipped", relative_path);
                return SymbolSummary::failed(FailureKind::Binary, "binary file skipped");
            }
            Ok(false) => {}
            Err(e) => return unreadable(relative_path, e),
        }

        let Some(lang) = Lang::from_path(relative_path) else {
            return SymbolSummary::failed(FailureKind::Unsupported, "unsupported file type");
        };

        let size = match std::fs::metadata(absolute_path) {
            Ok(meta) => meta.len(),
            Err(e) => return unreadable(relative_path, e),
        };
        if size > self.config.size_limit_bytes {
            tracing::info!(
                "Codemap: {} is {} bytes (limit {}), skipped",
                relative_path,
                size,
                self.config.size_limit_bytes
            );
            return SymbolSummary::failed(
                FailureKind::TooLarge,
                format!(
                    "file is {} bytes, limit is {}",
                    size, self.config.size_limit_bytes
                ),
            );
        }

        let bytes = match std::fs::read(absolute_path) {
            Ok(bytes) => bytes,
            Err(e) => return unreadable(relative_path, e),
        };
        let content = String::from_utf8_lossy(&bytes);

        if lang == Lang::Text {
            return SymbolSummary::Map(text_headings(&content));
        }

        match self.extract_source(lang, &content) {
            Ok(map) => SymbolSummary::Map(map),
            Err(e) => {
                tracing::warn!("Codemap: extraction failed for {}: {}", relative_path, e);
                SymbolSummary::failed(FailureKind::ExtractionFailed, e.to_string())
            }
        }
    }

    /// Parse in-memory source text of a known language
    pub fn extract_source(
        &self,
        lang: Lang,
        source: &str,
    ) -> std::result::Result<Codemap, ExtractionError> {
        if lang == Lang::Text {
            return Ok(text_headings(source));
        }
        let grammar = self
            .registry
            .grammar(lang)
            .ok_or_else(|| ExtractionError::LanguageSetup(lang.to_string()))?;

        let mut parser = Parser::new();
        parser
            .set_language(grammar)
            .map_err(|_| ExtractionError::LanguageSetup(lang.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ExtractionError::ParseFailed(lang.to_string()))?;

        let collector = collector::SymbolCollector::new(lang, source.as_bytes());
        Ok(collector.collect(tree.root_node(), self.config.max_references))
    }

    /// Extract every path under `base_dir` in parallel, one result per path
    pub fn extract_many(
        &self,
        base_dir: &Path,
        relative_paths: &[String],
    ) -> Result<BTreeMap<String, SymbolSummary>> {
        ensure_directory(base_dir)?;

        let results = relative_paths
            .par_iter()
            .map(|rel| {
                let absolute = paths::resolve_under(base_dir, rel);
                let summary = if absolute.is_file() {
                    self.extract(&absolute, rel)
                } else {
                    SymbolSummary::failed(FailureKind::Unreadable, "not a regular file")
                };
                (rel.clone(), summary)
            })
            .collect();

        Ok(results)
    }

    /// File content under the same binary and size guards as [`extract`](Self::extract)
    pub fn read_text(&self, absolute_path: &Path) -> Option<String> {
        if !matches!(self.sniff_binary(absolute_path), Ok(false)) {
            return None;
        }
        let meta = std::fs::metadata(absolute_path).ok()?;
        if meta.len() > self.config.size_limit_bytes {
            return None;
        }
        let bytes = std::fs::read(absolute_path).ok()?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Whether the first bytes of the file look binary.
    ///
    /// Valid UTF-8 samples only count control bytes; anything else also counts
    /// high-bit bytes. More than 30% suspicious bytes means binary.
    fn sniff_binary(&self, path: &Path) -> std::io::Result<bool> {
        let mut file = File::open(path)?;
        let mut sample = Vec::with_capacity(self.config.binary_sample_bytes);
        file.by_ref()
            .take(self.config.binary_sample_bytes as u64)
            .read_to_end(&mut sample)?;
        Ok(is_binary_sample(&sample))
    }
}

/// Binary heuristic over a byte prefix
pub fn is_binary_sample(sample: &[u8]) -> bool {
    if sample.is_empty() {
        return false;
    }
    let utf8 = match std::str::from_utf8(sample) {
        Ok(_) => true,
        // A multi-byte char cut by the sample boundary is still text
        Err(e) => e.error_len().is_none(),
    };
    let suspicious = sample
        .iter()
        .filter(|&&b| b < 9 || (!utf8 && b > 126))
        .count();
    suspicious * 10 > sample.len() * 3
}

/// Codemap of a plain-text file: its markdown-style headings as references
fn text_headings(content: &str) -> Codemap {
    let references = HEADING_RE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|heading| !heading.is_empty())
        .take(MAX_TEXT_HEADINGS)
        .collect();
    Codemap {
        references,
        ..Codemap::default()
    }
}

fn unreadable(relative_path: &str, err: std::io::Error) -> SymbolSummary {
    tracing::debug!("Codemap: cannot read {}: {}", relative_path, err);
    let message = match err.kind() {
        std::io::ErrorKind::PermissionDenied => format!("permission denied: {}", err),
        _ => err.to_string(),
    };
    SymbolSummary::failed(FailureKind::Unreadable, message)
}

/// Fail with `ResourceNotFound` / `PermissionDenied` / `NotADirectory` unless `dir` is a directory
pub fn ensure_directory(dir: &Path) -> Result<()> {
    let meta = std::fs::metadata(dir).map_err(|e| AutoselectError::from_io(e, dir))?;
    if !meta.is_dir() {
        return Err(ValidationError::NotADirectory(dir.display().to_string()).into());
    }
    Ok(())
}
