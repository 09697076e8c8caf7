use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::codemap::SymbolExtractor;
use crate::types::{Codemap, FailureKind, SymbolSummary};

/// Items per bucket in a rendered summary
const MAX_CLASSES: usize = 10;
const MAX_FUNCTIONS: usize = 15;
const MAX_REFS: usize = 20;

/// Header lines kept by the regex fallback
const MAX_HEADERS: usize = 50;
/// Non-blank lines kept when no header matches
const MAX_LEAD_LINES: usize = 10;

/// Declaration-looking lines: keyword-led, `Type Class::method(` or `Type name(`
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?:class|struct|enum|namespace|def|function|fn|sub|procedure|public|private|protected|static)\b[ \t\w:<>,.*&()]+|^[ \t]*[\w:<>]+[ \t]+[\w:]+::[\w:]+[ \t]*\(|^[ \t]*[\w:<>]+[ \t]+[\w:]+[ \t]*\(",
    )
    .expect("header regex is valid")
});

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Request-scoped memo of one-line file summaries.
///
/// Keys are `(absolute path, relative path)` so the same bytes reached through two
/// relative paths stay separate in debug output.
pub struct FileSummaryCache {
    extractor: SymbolExtractor,
    max_chars: usize,
    summaries: HashMap<(PathBuf, String), String>,
    codemaps: HashMap<String, Codemap>,
}

impl FileSummaryCache {
    pub fn new(extractor: SymbolExtractor, max_chars: usize) -> Self {
        Self {
            extractor,
            max_chars,
            summaries: HashMap::new(),
            codemaps: HashMap::new(),
        }
    }

    /// Bounded one-line summary of a file, computed once per key
    pub fn summarize(&mut self, absolute_path: &Path, relative_path: &str) -> String {
        let key = (absolute_path.to_path_buf(), relative_path.to_string());
        if let Some(summary) = self.summaries.get(&key) {
            return summary.clone();
        }

        let summary = self.compute(absolute_path, relative_path);
        self.summaries.insert(key, summary.clone());
        summary
    }

    /// Summary plus codemap keywords, the text fed to the embedding index
    pub fn index_text(&mut self, absolute_path: &Path, relative_path: &str) -> String {
        let summary = self.summarize(absolute_path, relative_path);
        let mut text = format!("{}\n{}", relative_path, summary);

        if let Some(map) = self.codemaps.get(relative_path) {
            let mut seen = HashSet::new();
            let keywords: Vec<&str> = map
                .classes
                .iter()
                .chain(&map.functions)
                .chain(&map.references)
                .map(String::as_str)
                .filter(|word| seen.insert(*word))
                .collect();
            if !keywords.is_empty() {
                text.push_str("\nKeywords: ");
                text.push_str(&keywords.join(" "));
            }
        }
        text
    }

    /// Codemap recorded while summarizing `relative_path`
    pub fn codemap(&self, relative_path: &str) -> Option<&Codemap> {
        self.codemaps.get(relative_path)
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    fn compute(&mut self, absolute_path: &Path, relative_path: &str) -> String {
        match self.extractor.extract(absolute_path, relative_path) {
            SymbolSummary::Map(map) => {
                let rendered = render_codemap(&map, self.max_chars);
                self.codemaps.insert(relative_path.to_string(), map);
                if !rendered.is_empty() {
                    return rendered;
                }
            }
            SymbolSummary::Failed(failure)
                if matches!(failure.error, FailureKind::Binary | FailureKind::TooLarge) =>
            {
                tracing::debug!("No summary for {}: {}", relative_path, failure.message);
                return String::new();
            }
            SymbolSummary::Failed(_) => {}
        }

        match self.extractor.read_text(absolute_path) {
            Some(text) => cheap_summary(&text, self.max_chars),
            None => {
                tracing::debug!("No readable text for {}", relative_path);
                String::new()
            }
        }
    }
}

/// `Classes: a, b; Functions: c; Refs: d` with per-bucket caps, truncated to `max_chars`
pub fn render_codemap(map: &Codemap, max_chars: usize) -> String {
    let mut parts = Vec::new();
    if !map.classes.is_empty() {
        parts.push(format!("Classes: {}", join_capped(&map.classes, MAX_CLASSES)));
    }
    if !map.functions.is_empty() {
        parts.push(format!(
            "Functions: {}",
            join_capped(&map.functions, MAX_FUNCTIONS)
        ));
    }
    if !map.references.is_empty() {
        parts.push(format!("Refs: {}", join_capped(&map.references, MAX_REFS)));
    }
    truncate_chars(&parts.join("; "), max_chars)
}

/// Regex fallback for files without a usable codemap
pub fn cheap_summary(text: &str, max_chars: usize) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let headers: Vec<&str> = HEADER_RE
        .find_iter(text)
        .take(MAX_HEADERS)
        .map(|m| m.as_str().trim())
        .collect();
    if !headers.is_empty() {
        return truncate_chars(&headers.join(" / "), max_chars);
    }

    let lead: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_LEAD_LINES)
        .collect();
    let collapsed = WHITESPACE_RE.replace_all(&lead.join(" "), " ").into_owned();
    if collapsed.chars().count() > max_chars {
        let mut out: String = collapsed.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('…');
        out
    } else {
        collapsed
    }
}

fn join_capped(items: &[String], cap: usize) -> String {
    items
        .iter()
        .take(cap)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
