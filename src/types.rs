use std::collections::{BTreeMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Request to pick the files an LLM needs for a task
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SelectionRequest {
    /// Absolute path of the project root
    pub base_dir: String,
    /// Project-relative file paths the selection may draw from
    pub tree_paths: Vec<String>,
    /// Free-text task description
    pub instructions: String,
    /// Optional extensions to favour (e.g., ["py", ".ts"])
    #[serde(default)]
    pub language_bias: Option<Vec<String>>,
    /// Answers to a previous round of clarification questions
    #[serde(default)]
    pub clarifications: Option<BTreeMap<String, String>>,
    /// Attach the decoded upstream reply to the result
    #[serde(default)]
    pub debug: bool,
}

impl SelectionRequest {
    pub fn new(
        base_dir: impl Into<String>,
        tree_paths: Vec<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            tree_paths,
            instructions: instructions.into(),
            language_bias: None,
            clarifications: None,
            debug: false,
        }
    }

    /// Trim fields, drop duplicate paths and check the request invariants
    pub fn normalize(&mut self) -> Result<()> {
        self.instructions = self.instructions.trim().to_string();
        if self.instructions.is_empty() {
            return Err(ValidationError::Empty("instructions".to_string()).into());
        }

        if self.base_dir.trim().is_empty() {
            return Err(ValidationError::Empty("base_dir".to_string()).into());
        }

        if self.tree_paths.is_empty() {
            return Err(ValidationError::Empty("tree_paths".to_string()).into());
        }

        let mut seen = HashSet::new();
        let mut paths = Vec::with_capacity(self.tree_paths.len());
        for (i, raw) in self.tree_paths.iter().enumerate() {
            let path = raw.trim();
            if path.is_empty() {
                return Err(ValidationError::InvalidValue(
                    format!("tree_paths[{}]", i),
                    "blank path".to_string(),
                )
                .into());
            }
            if seen.insert(path.to_string()) {
                paths.push(path.to_string());
            }
        }
        self.tree_paths = paths;

        if let Some(bias) = self.language_bias.take() {
            let normalized: Vec<String> = bias
                .iter()
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .map(|ext| format!(".{}", ext))
                .collect();
            self.language_bias = (!normalized.is_empty()).then_some(normalized);
        }

        if let Some(answers) = &self.clarifications
            && answers.is_empty()
        {
            self.clarifications = None;
        }

        Ok(())
    }

    /// Whether the caller is answering a clarification round
    pub fn has_clarifications(&self) -> bool {
        self.clarifications.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Whether a selection is final or waits on the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStatus {
    Final,
    NeedsClarification,
}

/// Outcome of a selection
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SelectionResult {
    /// Selected paths, each a verbatim member of the request's tree_paths
    pub selected: Vec<String>,
    /// Model-reported confidence clamped to [0, 1]
    pub confidence: f64,
    /// Clarification questions (empty when final)
    #[serde(default)]
    pub ask: Vec<String>,
    pub status: SelectionStatus,
    /// Decoded upstream reply, only when the request asked for debug output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_reply: Option<serde_json::Value>,
}

impl SelectionResult {
    pub fn is_final(&self) -> bool {
        self.status == SelectionStatus::Final
    }
}

/// Request to extract symbols from a list of files
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractSymbolsRequest {
    /// Absolute path of the project root
    pub base_dir: String,
    /// Project-relative file paths
    pub relative_paths: Vec<String>,
}

/// Per-file extraction results keyed by relative path
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractSymbolsResponse {
    pub summaries: BTreeMap<String, SymbolSummary>,
}

/// Request to re-embed one file after it changed on disk
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RefreshFileRequest {
    /// Absolute path of the project root
    pub base_dir: String,
    /// Project-relative path of the changed file
    pub relative_path: String,
}

/// Flavour of a dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import x`, `require`, Go/Java/Swift imports
    Import,
    /// `from x import y`, `import { y } from 'x'`
    From,
    /// `#include "local.h"`
    Include,
    /// `#include <system>`
    SystemInclude,
    /// `#include MACRO`
    MacroInclude,
    /// Rust `use`
    Use,
    /// C++/C# `using`
    Using,
    Typedef,
    Define,
}

/// Flavour of an export edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    Named,
    Default,
}

/// Module a file depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImportEdge {
    pub module: String,
    #[serde(default)]
    pub symbols: Vec<String>,
    pub kind: ImportKind,
    /// Source text of the statement
    pub raw: String,
}

/// Symbols a file exposes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExportEdge {
    pub symbols: Vec<String>,
    pub kind: ExportKind,
    pub raw: String,
}

/// Symbols found in one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Codemap {
    pub classes: Vec<String>,
    pub functions: Vec<String>,
    pub references: Vec<String>,
    pub imports: Vec<ImportEdge>,
    pub exports: Vec<ExportEdge>,
}

impl Codemap {
    /// True when no symbol of any bucket was found
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.functions.is_empty()
            && self.references.is_empty()
            && self.imports.is_empty()
            && self.exports.is_empty()
    }
}

/// Why a file produced no codemap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unsupported,
    Binary,
    TooLarge,
    Unreadable,
    ExtractionFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CodemapFailure {
    pub error: FailureKind,
    #[serde(default)]
    pub message: String,
}

/// Extraction result of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SymbolSummary {
    // Untagged variants are tried in order.
    Failed(CodemapFailure),
    Map(Codemap),
}

impl SymbolSummary {
    pub fn failed(error: FailureKind, message: impl Into<String>) -> Self {
        SymbolSummary::Failed(CodemapFailure {
            error,
            message: message.into(),
        })
    }

    pub fn codemap(&self) -> Option<&Codemap> {
        match self {
            SymbolSummary::Map(map) => Some(map),
            SymbolSummary::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            SymbolSummary::Failed(f) => Some(f.error),
            SymbolSummary::Map(_) => None,
        }
    }
}

#[cfg(test)]
mod tests;
