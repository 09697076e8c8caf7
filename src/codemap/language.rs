//! Extension → grammar mapping and the registry of compiled grammars.

use std::collections::HashMap;
use std::fmt;

use tree_sitter::Language;

/// How a file is analysed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    C,
    Cpp,
    Rust,
    Go,
    Java,
    CSharp,
    Ruby,
    Php,
    Swift,
    /// Plain text handled by the heading fallback
    Text,
}

impl Lang {
    /// Every language backed by a tree-sitter grammar
    pub const GRAMMARS: [Lang; 13] = [
        Lang::Python,
        Lang::JavaScript,
        Lang::TypeScript,
        Lang::Tsx,
        Lang::C,
        Lang::Cpp,
        Lang::Rust,
        Lang::Go,
        Lang::Java,
        Lang::CSharp,
        Lang::Ruby,
        Lang::Php,
        Lang::Swift,
    ];

    /// Resolve a lowercase extension without the dot
    pub fn from_extension(extension: &str) -> Option<Lang> {
        match extension {
            "py" | "pyi" => Some(Lang::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Lang::JavaScript),
            "ts" | "mts" | "cts" => Some(Lang::TypeScript),
            "tsx" => Some(Lang::Tsx),
            "c" => Some(Lang::C),
            // Headers are parsed as C++ so class declarations in them are seen.
            "h" | "hh" | "hpp" | "hxx" | "cc" | "cpp" | "cxx" => Some(Lang::Cpp),
            "rs" => Some(Lang::Rust),
            "go" => Some(Lang::Go),
            "java" => Some(Lang::Java),
            "cs" => Some(Lang::CSharp),
            "rb" => Some(Lang::Ruby),
            "php" => Some(Lang::Php),
            "swift" => Some(Lang::Swift),
            "md" | "txt" | "env" | "json" => Some(Lang::Text),
            _ => None,
        }
    }

    /// Resolve the language of a relative path (`.env` has no extension, only a name)
    pub fn from_path(path: &str) -> Option<Lang> {
        let name = crate::paths::basename(path);
        if name.eq_ignore_ascii_case(".env") {
            return Some(Lang::Text);
        }
        let ext = crate::paths::dotted_extension(path);
        Lang::from_extension(ext.trim_start_matches('.'))
    }

    /// Whether the C/C++ primitive-type stop list applies
    pub fn is_c_family(self) -> bool {
        matches!(self, Lang::C | Lang::Cpp)
    }

    /// Tag used in `<file lang="…">` prompt blocks
    pub fn name(self) -> &'static str {
        match self {
            Lang::Python => "python",
            Lang::JavaScript => "javascript",
            Lang::TypeScript | Lang::Tsx => "typescript",
            Lang::C => "c",
            Lang::Cpp => "cpp",
            Lang::Rust => "rust",
            Lang::Go => "go",
            Lang::Java => "java",
            Lang::CSharp => "csharp",
            Lang::Ruby => "ruby",
            Lang::Php => "php",
            Lang::Swift => "swift",
            Lang::Text => "txt",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Owns one compiled grammar per supported language.
///
/// Built once and shared behind an `Arc`; parsers are cheap and created per file.
pub struct GrammarRegistry {
    grammars: HashMap<Lang, Language>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        let grammars = Lang::GRAMMARS
            .iter()
            .filter_map(|&lang| load_grammar(lang).map(|grammar| (lang, grammar)))
            .collect();
        Self { grammars }
    }

    /// Compiled grammar for `lang`, `None` for the text fallback
    pub fn grammar(&self, lang: Lang) -> Option<&Language> {
        self.grammars.get(&lang)
    }

    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn load_grammar(lang: Lang) -> Option<Language> {
    let grammar: Language = match lang {
        Lang::Python => tree_sitter_python::LANGUAGE.into(),
        Lang::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        Lang::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Lang::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Lang::C => tree_sitter_c::LANGUAGE.into(),
        Lang::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        Lang::Rust => tree_sitter_rust::LANGUAGE.into(),
        Lang::Go => tree_sitter_go::LANGUAGE.into(),
        Lang::Java => tree_sitter_java::LANGUAGE.into(),
        Lang::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
        Lang::Ruby => tree_sitter_ruby::LANGUAGE.into(),
        Lang::Php => tree_sitter_php::LANGUAGE_PHP.into(),
        Lang::Swift => tree_sitter_swift::LANGUAGE.into(),
        Lang::Text => return None,
    };
    Some(grammar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        assert_eq!(Lang::from_extension("py"), Some(Lang::Python));
        assert_eq!(Lang::from_extension("jsx"), Some(Lang::JavaScript));
        assert_eq!(Lang::from_extension("tsx"), Some(Lang::Tsx));
        assert_eq!(Lang::from_extension("h"), Some(Lang::Cpp));
        assert_eq!(Lang::from_extension("c"), Some(Lang::C));
        assert_eq!(Lang::from_extension("md"), Some(Lang::Text));
        assert_eq!(Lang::from_extension("png"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Lang::from_path("src/Main.PY"), Some(Lang::Python));
        assert_eq!(Lang::from_path("config/.env"), Some(Lang::Text));
        assert_eq!(Lang::from_path("Makefile"), None);
    }

    #[test]
    fn test_registry_loads_every_grammar() {
        let registry = GrammarRegistry::new();
        assert_eq!(registry.len(), Lang::GRAMMARS.len());
        assert!(registry.grammar(Lang::Text).is_none());
        assert!(registry.grammar(Lang::Rust).is_some());
    }
}
