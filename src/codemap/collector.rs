//! Depth-first walker turning a syntax tree into a [`Codemap`].

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tree_sitter::Node;

use super::classify::{self, FunctionShape, NodeClass};
use super::edges;
use super::language::Lang;
use crate::types::{Codemap, ExportEdge, ImportEdge};

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_]\w+$").expect("identifier regex is valid")
});

/// Reserved words of the supported languages, lowercased
static RESERVED: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // JavaScript / TypeScript
        "break", "case", "catch", "class", "const", "continue", "debugger", "default",
        "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for",
        "function", "if", "import", "in", "instanceof", "new", "null", "return", "super",
        "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with",
        "yield", "await", "let",
        // Python
        "none", "and", "as", "assert", "async", "def", "del", "elif", "except", "from",
        "global", "is", "lambda", "match", "nonlocal", "not", "or", "pass", "raise",
        // C / C++
        "alignas", "alignof", "asm", "auto", "bool", "char", "constexpr", "const_cast",
        "decltype", "double", "dynamic_cast", "explicit", "extern", "float", "friend",
        "goto", "inline", "int", "long", "mutable", "namespace", "noexcept", "nullptr",
        "operator", "private", "protected", "public", "register", "reinterpret_cast",
        "short", "signed", "sizeof", "static", "static_cast", "struct", "template",
        "thread_local", "typedef", "typeid", "typename", "union", "unsigned", "using",
        "virtual", "volatile", "wchar_t",
        // Rust / Go / Java / C# / Ruby / PHP / Swift
        "fn", "impl", "pub", "mut", "self", "crate", "mod", "trait", "func", "package",
        "interface", "final", "nil", "end", "elsif", "unless", "guard",
    ]
    .into_iter()
    .collect()
});

/// UI and framework tokens that say nothing about a file
static NOISE: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "react", "props", "state", "onclick", "onchange", "button", "div", "span", "input",
        "class", "style", "children", "useeffect", "usestate", "usememo", "useref",
        "console", "log",
    ]
    .into_iter()
    .collect()
});

/// C/C++ primitive and standard-library names
static C_FAMILY_NOISE: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "int", "char", "float", "double", "bool", "void", "long", "short", "unsigned",
        "signed", "const", "static", "inline", "extern", "auto", "register", "volatile",
        "mutable", "std", "string", "vector", "map", "set", "list", "deque", "stack",
        "queue", "pair", "shared_ptr", "unique_ptr", "weak_ptr", "nullptr", "true",
        "false", "cout", "cin", "endl", "cerr", "clog", "printf", "scanf", "malloc",
        "free", "size_t", "ptrdiff_t", "wchar_t", "char16_t", "char32_t",
    ]
    .into_iter()
    .collect()
});

/// References with these prefixes survive the frequency filter
const STRUCTURAL_PREFIXES: &[&str] = &[
    "using ",
    "typedef ",
    "#define ",
    "macro_rules! ",
    "template<>",
    "namespace ",
    "struct ",
    "enum ",
];

pub struct SymbolCollector<'src> {
    lang: Lang,
    source: &'src [u8],
    classes: Vec<String>,
    functions: Vec<String>,
    /// (token, weight)
    references: Vec<(String, usize)>,
    imports: Vec<ImportEdge>,
    exports: Vec<ExportEdge>,
    /// Function nodes already recorded through their template wrapper
    claimed: HashSet<usize>,
}

impl<'src> SymbolCollector<'src> {
    pub fn new(lang: Lang, source: &'src [u8]) -> Self {
        Self {
            lang,
            source,
            classes: Vec::new(),
            functions: Vec::new(),
            references: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            claimed: HashSet::new(),
        }
    }

    /// Walk `root` and build the codemap, keeping at most `max_references` references
    pub fn collect(mut self, root: Node<'_>, max_references: usize) -> Codemap {
        self.walk(root);

        let references = self.filter_references(max_references);
        Codemap {
            classes: dedupe_preserve_order(self.classes),
            functions: dedupe_preserve_order(self.functions),
            references,
            imports: self.imports,
            exports: self.exports,
        }
    }

    /// Pre-order traversal on a cursor, so nesting depth never grows the call stack
    fn walk(&mut self, root: Node<'_>) {
        let mut cursor = root.walk();
        loop {
            self.visit(cursor.node());
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return;
                }
            }
        }
    }

    fn visit(&mut self, node: Node<'_>) {
        match classify::classify(self.lang, node, self.source) {
            NodeClass::ClassLike(flavor) => {
                if let Some(name) = self.field_text(node, "name") {
                    self.classes.push(format!("{}{}", flavor.prefix(), name));
                }
            }
            NodeClass::FunctionLike(shape) => self.visit_function(node, shape),
            NodeClass::BoundLambda => {
                let target = node
                    .child_by_field_name("name")
                    .or_else(|| node.child_by_field_name("left"))
                    .or_else(|| node.child_by_field_name("pattern"));
                if let Some(target) = target
                    && target.kind() == "identifier"
                {
                    let name = self.text(target);
                    self.functions.push(name);
                }
            }
            NodeClass::ImportLike => {
                if let Some(edge) = edges::import_edge(self.lang, node, self.source) {
                    self.imports.push(edge);
                }
            }
            NodeClass::ExportLike => {
                if let Some(edge) = edges::export_edge(node, self.source) {
                    self.exports.push(edge);
                }
            }
            NodeClass::StructuralRef(kind) => {
                if let Some((name, edge)) = edges::structural_edge(kind, node, self.source) {
                    self.references.push((format!("{}{}", kind.prefix(), name), 2));
                    self.imports.push(edge);
                }
            }
            NodeClass::Identifier => {
                let ident = self.text(node);
                if IDENTIFIER_RE.is_match(&ident) {
                    self.references.push((ident, 1));
                }
            }
            NodeClass::PrimitiveType => {
                let ident = self.text(node);
                self.references.push((ident, 1));
            }
            NodeClass::Other => {}
        }
    }

    fn visit_function(&mut self, node: Node<'_>, shape: FunctionShape) {
        if self.claimed.contains(&node.id()) {
            return;
        }
        let name = match shape {
            FunctionShape::Named => self.field_text(node, "name"),
            FunctionShape::Declarator => {
                classify::declarator_name(node).map(|name| self.text(name))
            }
            FunctionShape::Constructor => self.field_text(node, "name").map(|n| format!("{}()", n)),
            FunctionShape::Destructor => self.field_text(node, "name").map(|n| format!("~{}()", n)),
            FunctionShape::Template => classify::template_function(node).and_then(|inner| {
                self.claimed.insert(inner.id());
                classify::declarator_name(inner).map(|name| format!("template<> {}", self.text(name)))
            }),
        };
        if let Some(name) = name
            && !name.is_empty()
        {
            self.functions.push(name);
        }
    }

    /// Noise removal, weighted frequency count, keep rule, then top-K by (count desc, name asc)
    fn filter_references(&self, max_references: usize) -> Vec<String> {
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for (ident, weight) in &self.references {
            let lower = ident.to_lowercase();
            let skip = ident.len() < 2
                || RESERVED.contains(lower.as_str())
                || NOISE.contains(lower.as_str())
                || (self.lang.is_c_family() && C_FAMILY_NOISE.contains(lower.as_str()))
                || ident.chars().all(|c| c.is_ascii_digit())
                || (ident.starts_with('_') && ident.len() < 4);
            if skip {
                continue;
            }
            *freq.entry(ident.as_str()).or_insert(0) += weight;
        }

        let mut ranked: Vec<(&str, usize)> = freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        ranked
            .into_iter()
            .filter(|(name, count)| {
                *count > 1
                    || STRUCTURAL_PREFIXES.iter().any(|p| name.starts_with(p))
                    || name.len() > 6
            })
            .take(max_references)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    fn text(&self, node: Node<'_>) -> String {
        node.utf8_text(self.source).unwrap_or_default().trim().to_string()
    }

    fn field_text(&self, node: Node<'_>, field: &str) -> Option<String> {
        node.child_by_field_name(field)
            .map(|n| self.text(n))
            .filter(|name| !name.is_empty())
    }
}

fn dedupe_preserve_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
