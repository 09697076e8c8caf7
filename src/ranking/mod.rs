//! Multi-signal shortlist scoring
//!
//! Lexical overlap with the path and summary, language bias and the embedding
//! rank are summed per candidate. The result favours recall: when nothing
//! scores, the first `keep_top` paths come back in their original order.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::cache::FileSummaryCache;
use crate::config::RankingConfig;
use crate::index::ProjectIndex;
use crate::paths::{dotted_extension, resolve_under};

const PATH_TOKEN_POINTS: f64 = 2.0;
const SUMMARY_TOKEN_POINTS: f64 = 3.0;
const LANGUAGE_BIAS_POINTS: f64 = 4.0;
const SUBSTRING_POINTS: f64 = 10.0;
const SEMANTIC_MAX_POINTS: f64 = 100.0;

/// Instruction tokens longer than this also earn the substring bonus
const SUBSTRING_MIN_LEN: usize = 5;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_]{3,}").expect("word regex is valid"));

/// A scored path, only alive while the shortlist is built
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub path: String,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct HeuristicRanker {
    keep_top: usize,
    semantic_window: usize,
    default_bias: Vec<String>,
}

impl HeuristicRanker {
    pub fn new(config: &RankingConfig) -> Self {
        Self {
            keep_top: config.keep_top,
            semantic_window: config.semantic_window,
            default_bias: config.default_language_bias.clone(),
        }
    }

    pub fn keep_top(&self) -> usize {
        self.keep_top
    }

    /// Shortlist of at most `keep_top` paths, best first
    pub async fn rank(
        &self,
        base_dir: &Path,
        tree_paths: &[String],
        instructions: &str,
        cache: &mut FileSummaryCache,
        index: &ProjectIndex,
        language_bias: Option<&[String]>,
    ) -> Vec<String> {
        let window = self.semantic_window.min(tree_paths.len());
        let semantic_hits = match index.top_k(instructions, window).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!("Semantic ranking unavailable, using lexical signals only: {}", e);
                Vec::new()
            }
        };
        tracing::debug!("{} semantic hits for ranking", semantic_hits.len());

        let candidates = self.score_candidates(
            tree_paths,
            instructions,
            |path| cache.summarize(&resolve_under(base_dir, path), path),
            &semantic_hits,
            language_bias,
        );
        self.shortlist(tree_paths, candidates)
    }

    /// Score every path; output order matches `tree_paths`
    pub fn score_candidates(
        &self,
        tree_paths: &[String],
        instructions: &str,
        mut summary_for: impl FnMut(&str) -> String,
        semantic_hits: &[String],
        language_bias: Option<&[String]>,
    ) -> Vec<Candidate> {
        let instruction_tokens = tokens(instructions);
        let bias: HashSet<&str> = language_bias
            .unwrap_or(self.default_bias.as_slice())
            .iter()
            .map(String::as_str)
            .collect();

        let hit_count = semantic_hits.len();
        let mut semantic_bonus: HashMap<&str, f64> = HashMap::with_capacity(hit_count);
        for (rank, path) in semantic_hits.iter().enumerate() {
            let bonus = SEMANTIC_MAX_POINTS * (hit_count - rank) as f64 / hit_count as f64;
            semantic_bonus.entry(path.as_str()).or_insert(bonus);
        }

        tree_paths
            .iter()
            .map(|path| {
                let lowered = path.to_lowercase();
                let path_tokens = tokens(path);
                let summary_tokens = tokens(&summary_for(path));

                let mut score = 0.0;
                for token in &instruction_tokens {
                    if path_tokens.contains(token) {
                        score += PATH_TOKEN_POINTS;
                    }
                    if summary_tokens.contains(token) {
                        score += SUMMARY_TOKEN_POINTS;
                    }
                    if token.len() >= SUBSTRING_MIN_LEN && lowered.contains(token.as_str()) {
                        score += SUBSTRING_POINTS;
                    }
                }
                if bias.contains(dotted_extension(path).as_str()) {
                    score += LANGUAGE_BIAS_POINTS;
                }
                score += semantic_bonus.get(path.as_str()).copied().unwrap_or(0.0);

                Candidate {
                    path: path.clone(),
                    score,
                }
            })
            .collect()
    }

    /// Sort by (score desc, path asc) and cut to `keep_top`
    pub fn shortlist(&self, tree_paths: &[String], mut candidates: Vec<Candidate>) -> Vec<String> {
        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.path.cmp(&b.path))
        });

        if candidates.first().is_none_or(|best| best.score <= 0.0) {
            return tree_paths.iter().take(self.keep_top).cloned().collect();
        }

        candidates
            .into_iter()
            .take(self.keep_top)
            .map(|c| c.path)
            .collect()
    }
}

/// Lowercased words of three or more letters/underscores
fn tokens(text: &str) -> HashSet<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codemap::SymbolExtractor;
    use crate::config::{CodemapConfig, EmbeddingConfig};
    use crate::embedding::HashEmbedder;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn ranker(keep_top: usize) -> HeuristicRanker {
        HeuristicRanker::new(&RankingConfig {
            keep_top,
            ..RankingConfig::default()
        })
    }

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|p| p.to_string()).collect()
    }

    const NO_BIAS: &[String] = &[];

    fn no_summary(_: &str) -> String {
        String::new()
    }

    #[test]
    fn test_tokens() {
        let toks = tokens("Implement password-reset in auth/login_service.py, ok?");
        assert!(toks.contains("implement"));
        assert!(toks.contains("password"));
        assert!(toks.contains("login_service"));
        assert!(!toks.contains("ok"));
    }

    #[test]
    fn test_lexical_scores() {
        let ranker = ranker(120);
        let tree = paths(&["auth/login_service.py", "docs/notes.txt"]);
        let scored = ranker.score_candidates(
            &tree,
            "fix auth login",
            |path| {
                if path == "docs/notes.txt" {
                    "mentions login".to_string()
                } else {
                    String::new()
                }
            },
            &[],
            Some(NO_BIAS),
        );

        // "auth" is a path token (+2); "login" is a substring of the path (+10)
        assert_eq!(scored[0].score, 12.0);
        // "login" appears in the summary (+3)
        assert_eq!(scored[1].score, 3.0);
    }

    #[test]
    fn test_language_bias_and_default() {
        let ranker = ranker(120);
        let tree = paths(&["a.py", "b.rb"]);

        let default = ranker.score_candidates(&tree, "zzz", no_summary, &[], None);
        assert_eq!(default[0].score, 4.0);
        assert_eq!(default[1].score, 0.0);

        let bias = vec![".rb".to_string()];
        let custom = ranker.score_candidates(&tree, "zzz", no_summary, &[], Some(bias.as_slice()));
        assert_eq!(custom[0].score, 0.0);
        assert_eq!(custom[1].score, 4.0);
    }

    #[test]
    fn test_semantic_bonus_is_linear_in_rank() {
        let ranker = ranker(120);
        let tree = paths(&["x.txt", "y.txt", "z.txt", "w.txt"]);
        let hits = paths(&["z.txt", "x.txt"]);
        let scored = ranker.score_candidates(&tree, "qqq", no_summary, &hits, Some(NO_BIAS));

        assert_eq!(scored[2].score, 100.0);
        assert_eq!(scored[0].score, 50.0);
        assert_eq!(scored[1].score, 0.0);
        assert_eq!(scored[3].score, 0.0);
    }

    #[test]
    fn test_shortlist_orders_and_truncates() {
        let ranker = ranker(2);
        let tree = paths(&["c", "b", "a"]);
        let candidates = vec![
            Candidate { path: "c".into(), score: 1.0 },
            Candidate { path: "b".into(), score: 5.0 },
            Candidate { path: "a".into(), score: 5.0 },
        ];
        assert_eq!(ranker.shortlist(&tree, candidates), vec!["a", "b"]);
    }

    #[test]
    fn test_all_zero_keeps_original_order() {
        let ranker = ranker(2);
        let tree = paths(&["zeta.txt", "alpha.txt", "mid.txt"]);
        let scored = ranker.score_candidates(&tree, "qqq", no_summary, &[], Some(NO_BIAS));
        assert_eq!(ranker.shortlist(&tree, scored), vec!["zeta.txt", "alpha.txt"]);
    }

    #[test]
    fn test_shortlist_is_bounded_subset() {
        let ranker = ranker(3);
        let tree: Vec<String> = (0..10).map(|i| format!("src/email_{i}.py")).collect();
        let scored = ranker.score_candidates(&tree, "send email", no_summary, &[], None);
        let shortlist = ranker.shortlist(&tree, scored);

        assert_eq!(shortlist.len(), 3);
        assert!(shortlist.iter().all(|p| tree.contains(p)));
    }

    #[tokio::test]
    async fn test_rank_uses_summaries_and_index() {
        let dir = TempDir::new().unwrap();
        for (rel, body) in [
            ("auth/login_service.py", "def reset_password(email):\n    pass\n"),
            ("utils/email.py", "def send_email(to):\n    pass\n"),
            ("unrelated/data.py", "def parse_csv(rows):\n    pass\n"),
        ] {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, body).unwrap();
        }
        let tree = paths(&["unrelated/data.py", "utils/email.py", "auth/login_service.py"]);

        let index = ProjectIndex::new(
            PathBuf::from(dir.path()),
            Arc::new(HashEmbedder::new()),
            &EmbeddingConfig::default(),
        );
        let mut entries = BTreeMap::new();
        entries.insert("utils/email.py".to_string(), "send email smtp".to_string());
        index.index(&entries).await.unwrap();

        let mut cache =
            FileSummaryCache::new(SymbolExtractor::new(CodemapConfig::default()), 10_000);
        let shortlist = ranker(2)
            .rank(
                dir.path(),
                &tree,
                "password reset with email notifications",
                &mut cache,
                &index,
                None,
            )
            .await;

        assert_eq!(shortlist, vec!["utils/email.py", "auth/login_service.py"]);
    }
}
