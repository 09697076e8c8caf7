//! User-message assembly for the selection call

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::paths::dotted_extension;

/// Import statements and definition headers worth showing the model
static SNIPPET_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:import\b|from\s+\S+\s+import\b|#\s*include\b|using\b|use\b|require\b|package\b|export\b|(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:class|struct|enum|trait|interface|namespace|module|def|fn|func|function|impl|type)\b)",
    )
    .expect("snippet regex is valid")
});

/// Characters per estimated token for the summary budget
const CHARS_PER_TOKEN: usize = 4;

const PREAMBLE: &str = "You are a code-aware assistant.\n\
Select the *minimal* set of candidate files that fully covers the user's task.\n\
If the task is ambiguous, put your questions in \"ask\" and report a low confidence.\n\
Respond ONLY with JSON of the form {\"selected\": [paths], \"confidence\": 0..1, \"ask\": [questions]}.\n\
Only choose paths from the candidate list.";

/// Everything that goes into the user message
pub struct PromptParts<'a> {
    pub instructions: &'a str,
    pub clarifications: Option<&'a BTreeMap<String, String>>,
    /// `(path, summary)` for the top of the shortlist
    pub summaries: &'a [(String, String)],
    /// `(path, file text)` for the files that get code snippets
    pub sources: &'a [(String, String)],
    pub shortlist: &'a [String],
}

/// Limits applied while rendering
#[derive(Debug, Clone, Copy)]
pub struct PromptBudget {
    pub token_hard_limit: usize,
    pub snippet_char_budget: usize,
}

pub fn build_user_prompt(parts: &PromptParts<'_>, budget: PromptBudget) -> String {
    let mut prompt = String::new();
    prompt.push_str(PREAMBLE);
    prompt.push_str("\n\n### Task\n");
    prompt.push_str(parts.instructions);
    prompt.push_str("\n\n");

    if let Some(answers) = parts.clarifications.filter(|a| !a.is_empty()) {
        let pretty = serde_json::to_string_pretty(answers).unwrap_or_default();
        let _ = write!(prompt, "### Clarifications\n{}\n\n", pretty);
    }

    let summaries = summary_block(parts.summaries, budget.token_hard_limit);
    if !summaries.is_empty() {
        let _ = write!(prompt, "### File Summaries\n{}\n\n", summaries);
    }

    let snippets = snippet_block(parts.sources, budget.snippet_char_budget);
    if !snippets.is_empty() {
        let _ = write!(prompt, "### Code Snippets\n{}\n\n", snippets);
    }

    prompt.push_str("### Candidate Files\n");
    let list: Vec<String> = parts.shortlist.iter().map(|p| format!("• {}", p)).collect();
    prompt.push_str(&list.join("\n"));
    prompt
}

/// `<file>` blocks, stopping before the estimated token total passes `token_limit`
pub fn summary_block(entries: &[(String, String)], token_limit: usize) -> String {
    let mut blocks = Vec::new();
    let mut used_tokens = 0;

    for (path, summary) in entries {
        let tokens = summary.len() / CHARS_PER_TOKEN;
        if used_tokens + tokens > token_limit {
            break;
        }
        blocks.push(format!(
            "<file path=\"{}\" lang=\"{}\">\n{}\n</file>",
            path,
            lang_tag(path),
            summary
        ));
        used_tokens += tokens;
    }
    blocks.join("\n\n")
}

/// Fenced import/definition lines per file, within `char_budget` overall
pub fn snippet_block(sources: &[(String, String)], char_budget: usize) -> String {
    let mut out = String::new();
    let mut remaining = char_budget;

    for (path, text) in sources {
        if remaining == 0 {
            break;
        }
        let snippet = snippet_lines(text);
        if snippet.is_empty() {
            continue;
        }
        let snippet: String = snippet.chars().take(remaining).collect();
        remaining -= snippet.chars().count();

        let _ = write!(out, "#### {}\n```{}\n{}\n```\n", path, lang_tag(path), snippet);
    }
    out.trim_end().to_string()
}

/// Lines of `text` that are imports or definition headers
pub fn snippet_lines(text: &str) -> String {
    text.lines()
        .filter(|line| SNIPPET_LINE_RE.is_match(line))
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

fn lang_tag(path: &str) -> String {
    let ext = dotted_extension(path);
    match ext.strip_prefix('.') {
        Some(tag) if !tag.is_empty() => tag.to_string(),
        _ => "txt".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn test_snippet_lines() {
        let text = "import os\nfrom a import b\n\nclass Mailer:\n    x = 1\n    def send(self):\n        pass\n#include <vector>\npub fn run() {}\n";
        assert_eq!(
            snippet_lines(text),
            "import os\nfrom a import b\nclass Mailer:\n    def send(self):\n#include <vector>\npub fn run() {}"
        );
    }

    #[test]
    fn test_summary_block_respects_token_limit() {
        let (xs, ys) = ("x".repeat(40), "y".repeat(40));
        let entries = owned(&[
            ("a.py", xs.as_str()),
            ("b.rs", ys.as_str()),
            ("Makefile", "z"),
        ]);

        let block = summary_block(&entries, 15);
        assert!(block.contains("<file path=\"a.py\" lang=\"py\">"));
        assert!(!block.contains("b.rs"));
        assert!(!block.contains("Makefile"));

        let all = summary_block(&entries, 1_000);
        assert!(all.contains("<file path=\"Makefile\" lang=\"txt\">"));
    }

    #[test]
    fn test_snippet_block_budget() {
        let sources = owned(&[
            ("a.py", "import os\nimport sys\n"),
            ("b.py", "import json\n"),
            ("c.txt", "plain prose\n"),
        ]);

        let block = snippet_block(&sources, 12);
        assert!(block.contains("#### a.py\n```py\nimport os\nim\n```"));
        assert!(!block.contains("b.py"));

        let full = snippet_block(&sources, 10_000);
        assert!(full.contains("#### b.py"));
        assert!(!full.contains("c.txt"));
    }

    #[test]
    fn test_build_user_prompt_sections() {
        let mut answers = BTreeMap::new();
        answers.insert("Which backend?".to_string(), "SMTP".to_string());
        let summaries = owned(&[("utils/email.py", "Functions: send_email")]);
        let sources = owned(&[("utils/email.py", "import smtplib\ndef send_email(): pass\n")]);
        let shortlist = vec!["utils/email.py".to_string(), "auth/login.py".to_string()];

        let prompt = build_user_prompt(
            &PromptParts {
                instructions: "add password reset",
                clarifications: Some(&answers),
                summaries: &summaries,
                sources: &sources,
                shortlist: &shortlist,
            },
            PromptBudget {
                token_hard_limit: 1_000,
                snippet_char_budget: 1_000,
            },
        );

        assert!(prompt.contains("### Task\nadd password reset"));
        assert!(prompt.contains("### Clarifications\n{\n  \"Which backend?\": \"SMTP\"\n}"));
        assert!(prompt.contains("<file path=\"utils/email.py\" lang=\"py\">\nFunctions: send_email\n</file>"));
        assert!(prompt.contains("```py\nimport smtplib\ndef send_email(): pass\n```"));
        assert!(prompt.ends_with("### Candidate Files\n• utils/email.py\n• auth/login.py"));
    }

    #[test]
    fn test_prompt_without_optional_sections() {
        let shortlist = vec!["a.py".to_string()];
        let prompt = build_user_prompt(
            &PromptParts {
                instructions: "task",
                clarifications: None,
                summaries: &[],
                sources: &[],
                shortlist: &shortlist,
            },
            PromptBudget {
                token_hard_limit: 10,
                snippet_char_budget: 10,
            },
        );
        assert!(!prompt.contains("### Clarifications"));
        assert!(!prompt.contains("### File Summaries"));
        assert!(!prompt.contains("### Code Snippets"));
    }
}
