//! Grammar adapters: map a tree-sitter node onto a grammar-agnostic [`NodeClass`].
//!
//! Only this file knows node-kind strings. The collector matches on the enum.

use tree_sitter::Node;

use super::language::Lang;

/// Flavour of a type-like declaration, rendered as a name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassFlavor {
    Class,
    Struct,
    Union,
    Enum,
    Namespace,
    Interface,
    Trait,
    Module,
}

impl ClassFlavor {
    pub fn prefix(self) -> &'static str {
        match self {
            ClassFlavor::Class => "",
            ClassFlavor::Struct => "struct ",
            ClassFlavor::Union => "union ",
            ClassFlavor::Enum => "enum ",
            ClassFlavor::Namespace => "namespace ",
            ClassFlavor::Interface => "interface ",
            ClassFlavor::Trait => "trait ",
            ClassFlavor::Module => "module ",
        }
    }
}

/// Where a function-like node keeps its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionShape {
    /// `name` field
    Named,
    /// C-family: name at the end of the `declarator` chain
    Declarator,
    /// Rendered as `Name()`
    Constructor,
    /// Rendered as `~Name()`
    Destructor,
    /// C++ template wrapping a function, rendered as `template<> name`
    Template,
}

/// Declarations kept as weighted references and dependency edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralKind {
    Using,
    Typedef,
    Define,
    MacroRules,
}

impl StructuralKind {
    pub fn prefix(self) -> &'static str {
        match self {
            StructuralKind::Using => "using ",
            StructuralKind::Typedef => "typedef ",
            StructuralKind::Define => "#define ",
            StructuralKind::MacroRules => "macro_rules! ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    ClassLike(ClassFlavor),
    FunctionLike(FunctionShape),
    /// Lambda/arrow/closure assigned to a variable
    BoundLambda,
    ImportLike,
    ExportLike,
    StructuralRef(StructuralKind),
    Identifier,
    PrimitiveType,
    Other,
}

/// Classify a named node for `lang`
pub fn classify(lang: Lang, node: Node<'_>, source: &[u8]) -> NodeClass {
    if !node.is_named() {
        return NodeClass::Other;
    }
    match lang {
        Lang::Python => classify_python(node),
        Lang::JavaScript | Lang::TypeScript | Lang::Tsx => classify_ecmascript(node),
        Lang::C | Lang::Cpp => classify_c_family(lang, node),
        Lang::Rust => classify_rust(node),
        Lang::Go => classify_go(node),
        Lang::Java => classify_java(node),
        Lang::CSharp => classify_csharp(node),
        Lang::Ruby => classify_ruby(node, source),
        Lang::Php => classify_php(node),
        Lang::Swift => classify_swift(node, source),
        Lang::Text => NodeClass::Other,
    }
}

fn classify_python(node: Node<'_>) -> NodeClass {
    match node.kind() {
        "class_definition" => NodeClass::ClassLike(ClassFlavor::Class),
        "function_definition" => NodeClass::FunctionLike(FunctionShape::Named),
        "assignment" if field_kind_is(node, "right", &["lambda"]) => NodeClass::BoundLambda,
        "import_statement" | "import_from_statement" => NodeClass::ImportLike,
        "identifier" => NodeClass::Identifier,
        _ => NodeClass::Other,
    }
}

fn classify_ecmascript(node: Node<'_>) -> NodeClass {
    match node.kind() {
        "class_declaration" | "abstract_class_declaration" => {
            NodeClass::ClassLike(ClassFlavor::Class)
        }
        "interface_declaration" => NodeClass::ClassLike(ClassFlavor::Interface),
        "enum_declaration" => NodeClass::ClassLike(ClassFlavor::Enum),
        "internal_module" => NodeClass::ClassLike(ClassFlavor::Namespace),
        "function_declaration" | "generator_function_declaration" | "method_definition" => {
            NodeClass::FunctionLike(FunctionShape::Named)
        }
        "variable_declarator"
            if field_kind_is(node, "value", &["arrow_function", "function_expression"]) =>
        {
            NodeClass::BoundLambda
        }
        "import_statement" => NodeClass::ImportLike,
        "export_statement" => NodeClass::ExportLike,
        "identifier" | "type_identifier" => NodeClass::Identifier,
        _ => NodeClass::Other,
    }
}

fn classify_c_family(lang: Lang, node: Node<'_>) -> NodeClass {
    let kind = node.kind();
    match kind {
        // `struct Foo *p;` names a type without declaring it
        "struct_specifier" | "union_specifier" | "enum_specifier" | "class_specifier"
            if node.child_by_field_name("body").is_none() =>
        {
            NodeClass::Other
        }
        "struct_specifier" => NodeClass::ClassLike(ClassFlavor::Struct),
        "union_specifier" => NodeClass::ClassLike(ClassFlavor::Union),
        "enum_specifier" => NodeClass::ClassLike(ClassFlavor::Enum),
        "function_definition" => NodeClass::FunctionLike(FunctionShape::Declarator),
        "declaration" | "field_declaration" if declares_function(node) => {
            NodeClass::FunctionLike(FunctionShape::Declarator)
        }
        "preproc_include" => NodeClass::ImportLike,
        "preproc_def" | "preproc_function_def" => {
            NodeClass::StructuralRef(StructuralKind::Define)
        }
        "type_definition" => NodeClass::StructuralRef(StructuralKind::Typedef),
        "identifier" | "type_identifier" => NodeClass::Identifier,
        "primitive_type" => NodeClass::PrimitiveType,
        _ if lang == Lang::Cpp => match kind {
            "class_specifier" => NodeClass::ClassLike(ClassFlavor::Class),
            "namespace_definition" => NodeClass::ClassLike(ClassFlavor::Namespace),
            "template_declaration" if template_function(node).is_some() => {
                NodeClass::FunctionLike(FunctionShape::Template)
            }
            "using_declaration" | "alias_declaration" => {
                NodeClass::StructuralRef(StructuralKind::Using)
            }
            _ => NodeClass::Other,
        },
        _ => NodeClass::Other,
    }
}

fn classify_rust(node: Node<'_>) -> NodeClass {
    match node.kind() {
        "struct_item" => NodeClass::ClassLike(ClassFlavor::Struct),
        "enum_item" => NodeClass::ClassLike(ClassFlavor::Enum),
        "union_item" => NodeClass::ClassLike(ClassFlavor::Union),
        "trait_item" => NodeClass::ClassLike(ClassFlavor::Trait),
        "mod_item" => NodeClass::ClassLike(ClassFlavor::Module),
        "function_item" | "function_signature_item" => {
            NodeClass::FunctionLike(FunctionShape::Named)
        }
        "let_declaration" if field_kind_is(node, "value", &["closure_expression"]) => {
            NodeClass::BoundLambda
        }
        "use_declaration" => NodeClass::ImportLike,
        "macro_definition" => NodeClass::StructuralRef(StructuralKind::MacroRules),
        "identifier" | "type_identifier" => NodeClass::Identifier,
        _ => NodeClass::Other,
    }
}

fn classify_go(node: Node<'_>) -> NodeClass {
    match node.kind() {
        "type_spec" => match node.child_by_field_name("type").map(|t| t.kind()) {
            Some("struct_type") => NodeClass::ClassLike(ClassFlavor::Struct),
            Some("interface_type") => NodeClass::ClassLike(ClassFlavor::Interface),
            _ => NodeClass::ClassLike(ClassFlavor::Class),
        },
        "function_declaration" | "method_declaration" => {
            NodeClass::FunctionLike(FunctionShape::Named)
        }
        "import_spec" => NodeClass::ImportLike,
        "identifier" | "type_identifier" => NodeClass::Identifier,
        _ => NodeClass::Other,
    }
}

fn classify_java(node: Node<'_>) -> NodeClass {
    match node.kind() {
        "class_declaration" | "record_declaration" => NodeClass::ClassLike(ClassFlavor::Class),
        "interface_declaration" | "annotation_type_declaration" => {
            NodeClass::ClassLike(ClassFlavor::Interface)
        }
        "enum_declaration" => NodeClass::ClassLike(ClassFlavor::Enum),
        "method_declaration" => NodeClass::FunctionLike(FunctionShape::Named),
        "constructor_declaration" => NodeClass::FunctionLike(FunctionShape::Constructor),
        "import_declaration" => NodeClass::ImportLike,
        "identifier" | "type_identifier" => NodeClass::Identifier,
        _ => NodeClass::Other,
    }
}

fn classify_csharp(node: Node<'_>) -> NodeClass {
    match node.kind() {
        "class_declaration" | "record_declaration" => NodeClass::ClassLike(ClassFlavor::Class),
        "struct_declaration" | "record_struct_declaration" => {
            NodeClass::ClassLike(ClassFlavor::Struct)
        }
        "interface_declaration" => NodeClass::ClassLike(ClassFlavor::Interface),
        "enum_declaration" => NodeClass::ClassLike(ClassFlavor::Enum),
        "namespace_declaration" | "file_scoped_namespace_declaration" => {
            NodeClass::ClassLike(ClassFlavor::Namespace)
        }
        "method_declaration" | "local_function_statement" => {
            NodeClass::FunctionLike(FunctionShape::Named)
        }
        "constructor_declaration" => NodeClass::FunctionLike(FunctionShape::Constructor),
        "destructor_declaration" => NodeClass::FunctionLike(FunctionShape::Destructor),
        "using_directive" => NodeClass::ImportLike,
        "identifier" => NodeClass::Identifier,
        _ => NodeClass::Other,
    }
}

fn classify_ruby(node: Node<'_>, source: &[u8]) -> NodeClass {
    match node.kind() {
        "class" => NodeClass::ClassLike(ClassFlavor::Class),
        "module" => NodeClass::ClassLike(ClassFlavor::Module),
        "method" | "singleton_method" => NodeClass::FunctionLike(FunctionShape::Named),
        "call" if is_ruby_require(node, source) => NodeClass::ImportLike,
        "identifier" | "constant" => NodeClass::Identifier,
        _ => NodeClass::Other,
    }
}

fn classify_php(node: Node<'_>) -> NodeClass {
    match node.kind() {
        "class_declaration" => NodeClass::ClassLike(ClassFlavor::Class),
        "interface_declaration" => NodeClass::ClassLike(ClassFlavor::Interface),
        "trait_declaration" => NodeClass::ClassLike(ClassFlavor::Trait),
        "enum_declaration" => NodeClass::ClassLike(ClassFlavor::Enum),
        "namespace_definition" => NodeClass::ClassLike(ClassFlavor::Namespace),
        "function_definition" | "method_declaration" => {
            NodeClass::FunctionLike(FunctionShape::Named)
        }
        "namespace_use_declaration" => NodeClass::ImportLike,
        "name" => NodeClass::Identifier,
        _ => NodeClass::Other,
    }
}

fn classify_swift(node: Node<'_>, source: &[u8]) -> NodeClass {
    match node.kind() {
        // One node kind covers class/struct/enum/actor/extension
        "class_declaration" => {
            let keyword = node
                .child_by_field_name("declaration_kind")
                .and_then(|k| k.utf8_text(source).ok());
            match keyword {
                Some("struct") => NodeClass::ClassLike(ClassFlavor::Struct),
                Some("enum") => NodeClass::ClassLike(ClassFlavor::Enum),
                Some("extension") => NodeClass::Other,
                _ => NodeClass::ClassLike(ClassFlavor::Class),
            }
        }
        "protocol_declaration" => NodeClass::ClassLike(ClassFlavor::Interface),
        "function_declaration" | "protocol_function_declaration" => {
            NodeClass::FunctionLike(FunctionShape::Named)
        }
        "import_declaration" => NodeClass::ImportLike,
        "simple_identifier" | "type_identifier" => NodeClass::Identifier,
        _ => NodeClass::Other,
    }
}

fn field_kind_is(node: Node<'_>, field: &str, kinds: &[&str]) -> bool {
    node.child_by_field_name(field)
        .is_some_and(|child| kinds.contains(&child.kind()))
}

const DECLARATOR_WRAPPERS: &[&str] = &[
    "pointer_declarator",
    "reference_declarator",
    "parenthesized_declarator",
    "attributed_declarator",
];

/// Whether a C/C++ declaration's declarator chain contains a function declarator
pub fn declares_function(node: Node<'_>) -> bool {
    let mut current = node.child_by_field_name("declarator");
    while let Some(declarator) = current {
        match declarator.kind() {
            "function_declarator" => return true,
            kind if DECLARATOR_WRAPPERS.contains(&kind) => {
                current = declarator
                    .child_by_field_name("declarator")
                    .or_else(|| last_named_child(declarator));
            }
            _ => return false,
        }
    }
    false
}

/// Name node at the end of a C/C++ declarator chain
pub fn declarator_name(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.child_by_field_name("declarator")?;
    // Deeply nested declarators are malformed input; stop rather than loop
    for _ in 0..16 {
        match current.kind() {
            "identifier" | "field_identifier" | "qualified_identifier" | "destructor_name"
            | "operator_name" | "type_identifier" => return Some(current),
            "function_declarator" => current = current.child_by_field_name("declarator")?,
            kind if DECLARATOR_WRAPPERS.contains(&kind) => {
                current = current
                    .child_by_field_name("declarator")
                    .or_else(|| last_named_child(current))?;
            }
            _ => return None,
        }
    }
    None
}

/// The function a C++ template declaration wraps
pub fn template_function(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|child| {
        child.kind() == "function_definition"
            || (matches!(child.kind(), "declaration" | "field_declaration")
                && declares_function(*child))
    });
    found
}

fn last_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let last = node.named_children(&mut cursor).last();
    last
}

fn is_ruby_require(node: Node<'_>, source: &[u8]) -> bool {
    node.child_by_field_name("method")
        .and_then(|m| m.utf8_text(source).ok())
        .is_some_and(|name| matches!(name, "require" | "require_relative" | "load"))
}
