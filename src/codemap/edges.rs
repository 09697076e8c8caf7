//! Import and export edge details for `ImportLike` / `ExportLike` nodes.

use tree_sitter::Node;

use super::classify::StructuralKind;
use super::language::Lang;
use crate::types::{ExportEdge, ExportKind, ImportEdge, ImportKind};

fn text(node: Node<'_>, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or_default().trim().to_string()
}

fn unquote(raw: &str) -> String {
    raw.trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

fn named_children<'a>(node: Node<'a>) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn field_children<'a>(node: Node<'a>, field: &str) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Build the import edge of an `ImportLike` node, `None` when nothing usable is named
pub fn import_edge(lang: Lang, node: Node<'_>, source: &[u8]) -> Option<ImportEdge> {
    let raw = text(node, source);
    let (module, symbols, kind) = match (lang, node.kind()) {
        (Lang::Python, "import_statement") => {
            let modules: Vec<String> = field_children(node, "name")
                .into_iter()
                .map(|n| python_import_name(n, source))
                .collect();
            (modules.join(", "), vec!["*".to_string()], ImportKind::Import)
        }
        (Lang::Python, "import_from_statement") => {
            let module = node
                .child_by_field_name("module_name")
                .map(|n| text(n, source))
                .unwrap_or_default();
            let mut symbols: Vec<String> = field_children(node, "name")
                .into_iter()
                .map(|n| python_import_name(n, source))
                .collect();
            if symbols.is_empty() {
                symbols.push("*".to_string());
            }
            (module, symbols, ImportKind::From)
        }
        (Lang::JavaScript | Lang::TypeScript | Lang::Tsx, _) => {
            let module = node
                .child_by_field_name("source")
                .map(|n| unquote(&text(n, source)))
                .unwrap_or_default();
            let symbols = ecmascript_import_symbols(node, source);
            let kind = if symbols.is_empty() {
                ImportKind::Import
            } else {
                ImportKind::From
            };
            (module, symbols, kind)
        }
        (Lang::C | Lang::Cpp, _) => {
            let path = node.child_by_field_name("path")?;
            let raw_path = text(path, source);
            match path.kind() {
                "system_lib_string" => (
                    raw_path.trim_matches(|c| c == '<' || c == '>').to_string(),
                    Vec::new(),
                    ImportKind::SystemInclude,
                ),
                "identifier" => (raw_path, Vec::new(), ImportKind::MacroInclude),
                _ => (unquote(&raw_path), Vec::new(), ImportKind::Include),
            }
        }
        (Lang::Rust, _) => {
            let argument = node.child_by_field_name("argument")?;
            (text(argument, source), Vec::new(), ImportKind::Use)
        }
        (Lang::Go, _) => {
            let path = node.child_by_field_name("path")?;
            (unquote(&text(path, source)), Vec::new(), ImportKind::Import)
        }
        (Lang::Ruby, _) => {
            let argument = node
                .child_by_field_name("arguments")
                .and_then(|args| named_children(args).into_iter().next())?;
            (unquote(&text(argument, source)), Vec::new(), ImportKind::Import)
        }
        (Lang::Php, _) => {
            let clauses: Vec<String> = named_children(node)
                .into_iter()
                .filter(|c| c.kind() == "namespace_use_clause")
                .map(|c| text(c, source))
                .collect();
            (clauses.join(", "), Vec::new(), ImportKind::Use)
        }
        (Lang::CSharp, _) => (
            first_named_text(node, source, &["qualified_name", "identifier"])?,
            Vec::new(),
            ImportKind::Using,
        ),
        (Lang::Java, _) => (
            first_named_text(node, source, &["scoped_identifier", "identifier"])?,
            Vec::new(),
            ImportKind::Import,
        ),
        (Lang::Swift, _) => (
            first_named_text(node, source, &["identifier", "simple_identifier"])?,
            Vec::new(),
            ImportKind::Import,
        ),
        _ => return None,
    };

    if module.is_empty() {
        return None;
    }
    Some(ImportEdge {
        module,
        symbols,
        kind,
        raw,
    })
}

/// Name of a `StructuralRef` node plus its edge
pub fn structural_edge(
    kind: StructuralKind,
    node: Node<'_>,
    source: &[u8],
) -> Option<(String, ImportEdge)> {
    let name_node = match kind {
        StructuralKind::Using => node
            .child_by_field_name("name")
            .or_else(|| {
                named_children(node).into_iter().find(|c| {
                    matches!(c.kind(), "qualified_identifier" | "identifier" | "type_identifier")
                })
            }),
        StructuralKind::Typedef => node.child_by_field_name("declarator"),
        StructuralKind::Define | StructuralKind::MacroRules => node.child_by_field_name("name"),
    }?;

    let name = text(name_node, source);
    if name.is_empty() {
        return None;
    }
    let edge_kind = match kind {
        StructuralKind::Using => ImportKind::Using,
        StructuralKind::Typedef => ImportKind::Typedef,
        StructuralKind::Define | StructuralKind::MacroRules => ImportKind::Define,
    };
    let edge = ImportEdge {
        module: name.clone(),
        symbols: Vec::new(),
        kind: edge_kind,
        raw: text(node, source),
    };
    Some((name, edge))
}

/// Export edge of an ES `export_statement`
pub fn export_edge(node: Node<'_>, source: &[u8]) -> Option<ExportEdge> {
    let raw = text(node, source);
    let mut cursor = node.walk();
    let is_default = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == "default");

    let mut symbols = Vec::new();
    if let Some(declaration) = node.child_by_field_name("declaration") {
        symbols.extend(declared_names(declaration, source));
    }
    for child in named_children(node) {
        if child.kind() == "export_clause" {
            for spec in named_children(child) {
                if spec.kind() == "export_specifier"
                    && let Some(name) = spec.child_by_field_name("name")
                {
                    symbols.push(text(name, source));
                }
            }
        }
    }
    if is_default
        && symbols.is_empty()
        && let Some(value) = node.child_by_field_name("value")
        && let Some(name) = value.child_by_field_name("name")
    {
        symbols.push(text(name, source));
    }
    if node.child_by_field_name("source").is_some() && symbols.is_empty() {
        symbols.push("*".to_string());
    }

    if symbols.is_empty() {
        symbols.push(if is_default { "default" } else { "unknown" }.to_string());
    }

    Some(ExportEdge {
        symbols,
        kind: if is_default {
            ExportKind::Default
        } else {
            ExportKind::Named
        },
        raw,
    })
}

fn declared_names(declaration: Node<'_>, source: &[u8]) -> Vec<String> {
    if let Some(name) = declaration.child_by_field_name("name") {
        return vec![text(name, source)];
    }
    // `export const a = 1, b = () => {}`
    named_children(declaration)
        .into_iter()
        .filter(|c| c.kind() == "variable_declarator")
        .filter_map(|c| c.child_by_field_name("name"))
        .map(|n| text(n, source))
        .collect()
}

fn python_import_name(node: Node<'_>, source: &[u8]) -> String {
    match node.kind() {
        "aliased_import" => node
            .child_by_field_name("name")
            .map(|n| text(n, source))
            .unwrap_or_else(|| text(node, source)),
        _ => text(node, source),
    }
}

fn ecmascript_import_symbols(node: Node<'_>, source: &[u8]) -> Vec<String> {
    let mut symbols = Vec::new();
    let Some(clause) = named_children(node)
        .into_iter()
        .find(|c| c.kind() == "import_clause")
    else {
        return symbols;
    };
    for item in named_children(clause) {
        match item.kind() {
            "identifier" => symbols.push(text(item, source)),
            "namespace_import" => symbols.push(text(item, source)),
            "named_imports" => {
                for spec in named_children(item) {
                    if spec.kind() == "import_specifier"
                        && let Some(name) = spec.child_by_field_name("name")
                    {
                        symbols.push(text(name, source));
                    }
                }
            }
            _ => {}
        }
    }
    symbols
}

fn first_named_text(node: Node<'_>, source: &[u8], kinds: &[&str]) -> Option<String> {
    named_children(node)
        .into_iter()
        .find(|c| kinds.contains(&c.kind()))
        .map(|c| text(c, source))
}
