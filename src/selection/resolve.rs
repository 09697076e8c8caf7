//! Map model-returned strings back onto canonical project paths

use std::collections::{HashMap, HashSet};

use crate::paths::{basename, normalize_relative};

/// Longest path suffix (in segments) used for matching
const MAX_SUFFIX_SEGMENTS: usize = 3;

/// Lookup tables over one request's `tree_paths`.
///
/// A candidate resolves only when exactly one canonical path matches, trying in
/// turn: verbatim, normalized case-insensitive, basename (names with a dot),
/// then the last three, two or one segments.
pub struct PathResolver<'a> {
    canonical: &'a [String],
    verbatim: HashMap<&'a str, usize>,
    exact: HashMap<String, Vec<usize>>,
    basenames: HashMap<String, Vec<usize>>,
    suffixes: HashMap<String, Vec<usize>>,
}

impl<'a> PathResolver<'a> {
    pub fn new(canonical: &'a [String]) -> Self {
        let mut verbatim = HashMap::new();
        let mut exact: HashMap<String, Vec<usize>> = HashMap::new();
        let mut basenames: HashMap<String, Vec<usize>> = HashMap::new();
        let mut suffixes: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, path) in canonical.iter().enumerate() {
            verbatim.entry(path.as_str()).or_insert(i);

            let key = normalize_relative(path).to_lowercase();
            let name = basename(&key);
            if name.contains('.') {
                basenames.entry(name.to_string()).or_default().push(i);
            }

            let segments: Vec<&str> = key.split('/').collect();
            for n in 1..=MAX_SUFFIX_SEGMENTS.min(segments.len()) {
                let suffix = segments[segments.len() - n..].join("/");
                suffixes.entry(suffix).or_default().push(i);
            }

            exact.entry(key).or_default().push(i);
        }

        Self {
            canonical,
            verbatim,
            exact,
            basenames,
            suffixes,
        }
    }

    /// The canonical path `candidate` unambiguously names, if any
    pub fn resolve(&self, candidate: &str) -> Option<&'a str> {
        let trimmed = candidate.trim().trim_end_matches([',', ';']).trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(&i) = self.verbatim.get(trimmed) {
            return Some(&self.canonical[i]);
        }

        let key = normalize_relative(trimmed).to_lowercase();
        if key.is_empty() {
            return None;
        }

        if let Some(i) = unique(self.exact.get(&key)) {
            return Some(&self.canonical[i]);
        }

        let name = basename(&key);
        if name.contains('.')
            && let Some(i) = unique(self.basenames.get(name))
        {
            return Some(&self.canonical[i]);
        }

        let segments: Vec<&str> = key.split('/').collect();
        for n in (1..=MAX_SUFFIX_SEGMENTS.min(segments.len())).rev() {
            let suffix = segments[segments.len() - n..].join("/");
            if let Some(i) = unique(self.suffixes.get(&suffix)) {
                return Some(&self.canonical[i]);
            }
        }

        None
    }

    /// Resolve in order, dropping misses and repeats
    pub fn resolve_all<S: AsRef<str>>(&self, candidates: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();
        for candidate in candidates {
            match self.resolve(candidate.as_ref()) {
                Some(path) => {
                    if seen.insert(path) {
                        resolved.push(path.to_string());
                    }
                }
                None => tracing::debug!("Dropping unresolvable path {:?}", candidate.as_ref()),
            }
        }
        resolved
    }
}

fn unique(matches: Option<&Vec<usize>>) -> Option<usize> {
    match matches.map(Vec::as_slice) {
        Some([only]) => Some(*only),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Vec<String> {
        [
            "auth/login_service.py",
            "utils/email.py",
            "unrelated/data.py",
            "web/handlers/email.py",
            "src/lib.rs",
            "Makefile",
        ]
        .iter()
        .map(|p| p.to_string())
        .collect()
    }

    #[test]
    fn test_exact_and_normalized() {
        let tree = tree();
        let resolver = PathResolver::new(&tree);
        assert_eq!(resolver.resolve("utils/email.py"), Some("utils/email.py"));
        assert_eq!(resolver.resolve("./utils\\email.py"), Some("utils/email.py"));
        assert_eq!(resolver.resolve("UTILS/Email.py,"), Some("utils/email.py"));
    }

    #[test]
    fn test_basename_match_is_case_insensitive() {
        let tree = tree();
        let resolver = PathResolver::new(&tree);
        assert_eq!(
            resolver.resolve("Auth/Login_Service.py"),
            Some("auth/login_service.py")
        );
        assert_eq!(
            resolver.resolve("services/login_service.py"),
            Some("auth/login_service.py")
        );
    }

    #[test]
    fn test_ambiguous_basename_falls_to_suffix() {
        let tree = tree();
        let resolver = PathResolver::new(&tree);
        // two files named email.py
        assert_eq!(resolver.resolve("email.py"), None);
        assert_eq!(
            resolver.resolve("backend/web/handlers/email.py"),
            Some("web/handlers/email.py")
        );
        assert_eq!(resolver.resolve("handlers/email.py"), Some("web/handlers/email.py"));
    }

    #[test]
    fn test_dotless_names_use_suffix() {
        let tree = tree();
        let resolver = PathResolver::new(&tree);
        assert_eq!(resolver.resolve("makefile"), Some("Makefile"));
    }

    #[test]
    fn test_unknown_paths_drop() {
        let tree = tree();
        let resolver = PathResolver::new(&tree);
        assert_eq!(resolver.resolve("docs/readme.md"), None);
        assert_eq!(resolver.resolve("   "), None);
        assert_eq!(resolver.resolve("./"), None);
    }

    #[test]
    fn test_resolve_all_keeps_model_order_and_dedupes() {
        let tree = tree();
        let resolver = PathResolver::new(&tree);
        let picked = resolver.resolve_all(&[
            "utils/email.py",
            "ghost.py",
            "auth/login_service.py",
            "UTILS/EMAIL.PY",
        ]);
        assert_eq!(picked, vec!["utils/email.py", "auth/login_service.py"]);
    }

    #[test]
    fn test_case_colliding_tree_prefers_verbatim() {
        let tree = vec!["README.md".to_string(), "readme.md".to_string()];
        let resolver = PathResolver::new(&tree);
        assert_eq!(resolver.resolve("readme.md"), Some("readme.md"));
        assert_eq!(resolver.resolve("Readme.md"), None);
    }
}
