//! File selection: shortlist, prompt, upstream call, reply parsing and path resolution
//!
//! One call to [`SelectionOrchestrator::select`] walks
//! `Ranking → PromptBuilt → AwaitingUpstream → {Parsed, UpstreamFailed} →
//! {FinalSelection, NeedsClarification}`. A low-confidence answer is handed
//! back with questions; a request that already carries clarifications is
//! always final, so the protocol never takes more than one extra round.

pub mod parse;
pub mod prompt;
pub mod resolve;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::cache::FileSummaryCache;
use crate::codemap::{SymbolExtractor, ensure_directory};
use crate::config::{Config, SelectionConfig};
use crate::error::{ConfigError, Result, UpstreamError, truncate_snippet};
use crate::index::{IndexRegistry, ProjectIndex};
use crate::llm::{ChatRequest, CompletionBackend};
use crate::paths::resolve_under;
use crate::ranking::HeuristicRanker;
use crate::retry::{RetryConfig, with_retry};
use crate::types::{SelectionRequest, SelectionResult, SelectionStatus};

use parse::{ParsedReply, parse_reply};
use prompt::{PromptBudget, PromptParts, build_user_prompt};
use resolve::PathResolver;

/// Question returned when the model is unsure but asked nothing
pub const DEFAULT_CLARIFICATION: &str =
    "Which files, modules or features should the change focus on?";

/// Reply snippets in errors are cut to this many characters
const REPLY_SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStage {
    Ranking,
    PromptBuilt,
    AwaitingUpstream,
    Parsed,
    UpstreamFailed,
    FinalSelection,
    NeedsClarification,
}

impl fmt::Display for SelectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SelectionStage::Ranking => "ranking",
            SelectionStage::PromptBuilt => "prompt_built",
            SelectionStage::AwaitingUpstream => "awaiting_upstream",
            SelectionStage::Parsed => "parsed",
            SelectionStage::UpstreamFailed => "upstream_failed",
            SelectionStage::FinalSelection => "final_selection",
            SelectionStage::NeedsClarification => "needs_clarification",
        };
        f.write_str(name)
    }
}

pub struct SelectionOrchestrator {
    extractor: SymbolExtractor,
    ranker: HeuristicRanker,
    indexes: Arc<IndexRegistry>,
    backend: Option<Arc<dyn CompletionBackend>>,
    config: SelectionConfig,
    max_tokens: u32,
    retry: RetryConfig,
}

impl SelectionOrchestrator {
    /// `backend` is `None` when no credentials are configured; `select` then fails
    pub fn new(
        config: &Config,
        extractor: SymbolExtractor,
        indexes: Arc<IndexRegistry>,
        backend: Option<Arc<dyn CompletionBackend>>,
    ) -> Self {
        Self {
            extractor,
            ranker: HeuristicRanker::new(&config.ranking),
            indexes,
            backend,
            config: config.selection.clone(),
            max_tokens: config.llm.max_tokens,
            retry: RetryConfig::with_max_attempts(config.llm.max_attempts),
        }
    }

    /// Replace the backoff schedule (tests use zero delays)
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub async fn select(&self, mut request: SelectionRequest) -> Result<SelectionResult> {
        request.normalize()?;
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| ConfigError::MissingRequired("LLM_API_KEY".to_string()))?;

        let base_dir = Path::new(&request.base_dir);
        ensure_directory(base_dir)?;

        let mut cache = FileSummaryCache::new(self.extractor.clone(), self.config.summary_max_chars);
        let index = self.indexes.get_or_create(base_dir).await;

        enter(SelectionStage::Ranking);
        if index.is_empty().await {
            build_index(base_dir, &request.tree_paths, &mut cache, &index).await;
        }
        let shortlist = self
            .ranker
            .rank(
                base_dir,
                &request.tree_paths,
                &request.instructions,
                &mut cache,
                &index,
                request.language_bias.as_deref(),
            )
            .await;
        tracing::debug!(
            "Shortlisted {} of {} paths",
            shortlist.len(),
            request.tree_paths.len()
        );

        enter(SelectionStage::PromptBuilt);
        let prompt = self.build_prompt(base_dir, &request, &shortlist, &mut cache);
        let chat = ChatRequest::selection(backend.model(), self.max_tokens, prompt);

        enter(SelectionStage::AwaitingUpstream);
        let chat = &chat;
        let content = match with_retry(&self.retry, "Selection request", move |_| {
            backend.complete(chat)
        })
        .await
        {
            Ok(content) => content,
            Err(e) => {
                enter(SelectionStage::UpstreamFailed);
                return Err(e);
            }
        };

        enter(SelectionStage::Parsed);
        let reply = parse_reply(&content);
        self.finish(&request, reply)
    }

    /// Summary blocks and source snippets for the top of the shortlist
    fn build_prompt(
        &self,
        base_dir: &Path,
        request: &SelectionRequest,
        shortlist: &[String],
        cache: &mut FileSummaryCache,
    ) -> String {
        let summaries: Vec<(String, String)> = shortlist
            .iter()
            .take(self.config.summary_files)
            .filter_map(|rel| {
                let absolute = resolve_under(base_dir, rel);
                absolute
                    .is_file()
                    .then(|| (rel.clone(), cache.summarize(&absolute, rel)))
            })
            .collect();

        let sources: Vec<(String, String)> = shortlist
            .iter()
            .take(self.config.snippet_files)
            .filter_map(|rel| {
                self.extractor
                    .read_text(&resolve_under(base_dir, rel))
                    .map(|text| (rel.clone(), text))
            })
            .collect();

        build_user_prompt(
            &PromptParts {
                instructions: &request.instructions,
                clarifications: request.clarifications.as_ref(),
                summaries: &summaries,
                sources: &sources,
                shortlist,
            },
            PromptBudget {
                token_hard_limit: self.config.token_hard_limit,
                snippet_char_budget: self.config.snippet_char_budget,
            },
        )
    }

    /// Resolve paths and apply the confidence gate
    fn finish(&self, request: &SelectionRequest, reply: ParsedReply) -> Result<SelectionResult> {
        let resolver = PathResolver::new(&request.tree_paths);
        let selected = resolver.resolve_all(reply.candidates());

        let (confidence, questions, raw_reply) = match reply {
            ParsedReply::Structured {
                confidence,
                ask,
                decoded,
                ..
            } => (confidence.unwrap_or(0.0), ask, decoded),
            ParsedReply::Legacy { text, .. } => {
                if selected.is_empty() {
                    return Err(UpstreamError::MalformedReply(truncate_snippet(
                        text.trim(),
                        REPLY_SNIPPET_CHARS,
                    ))
                    .into());
                }
                tracing::warn!("Upstream reply was not JSON; recovered {} paths", selected.len());
                (0.0, Vec::new(), serde_json::Value::String(text))
            }
        };
        let confidence = confidence.clamp(0.0, 1.0);

        let is_final =
            confidence >= self.config.confidence_threshold || request.has_clarifications();
        let (status, ask) = if is_final {
            enter(SelectionStage::FinalSelection);
            (SelectionStatus::Final, Vec::new())
        } else {
            enter(SelectionStage::NeedsClarification);
            let ask = if questions.is_empty() {
                vec![DEFAULT_CLARIFICATION.to_string()]
            } else {
                questions
            };
            (SelectionStatus::NeedsClarification, ask)
        };

        tracing::info!(
            "Selected {} files (confidence {:.2}, {})",
            selected.len(),
            confidence,
            if is_final { "final" } else { "needs clarification" }
        );

        Ok(SelectionResult {
            selected,
            confidence,
            ask,
            status,
            raw_reply: request.debug.then_some(raw_reply),
        })
    }
}

fn enter(stage: SelectionStage) {
    tracing::debug!("Selection stage: {}", stage);
}

/// One-time rebuild from summaries enriched with codemap keywords
async fn build_index(
    base_dir: &Path,
    tree_paths: &[String],
    cache: &mut FileSummaryCache,
    index: &ProjectIndex,
) {
    let texts: BTreeMap<String, String> = tree_paths
        .iter()
        .map(|rel| (rel.clone(), cache.index_text(&resolve_under(base_dir, rel), rel)))
        .collect();

    if let Err(e) = index.index(&texts).await {
        tracing::warn!(
            "Embedding index build failed for {}, ranking without it: {}",
            base_dir.display(),
            e
        );
    }
}
