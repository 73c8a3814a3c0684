//! Name resolution within one compilation unit.
//!
//! There is no type checker here: an identifier resolves to the nearest
//! preceding local, parameter or field declaration with the same name, and
//! a static type is only known where the source spells it out.

use super::kinds;
use super::node::AstNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Field,
    Method,
    LocalVariable,
    Parameter,
    Type,
}

impl ElementKind {
    pub fn from_str(s: &str) -> Option<ElementKind> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FIELD" => Some(ElementKind::Field),
            "METHOD" => Some(ElementKind::Method),
            "LOCAL_VARIABLE" => Some(ElementKind::LocalVariable),
            "PARAMETER" => Some(ElementKind::Parameter),
            "TYPE" | "CLASS" | "INTERFACE" | "ENUM" | "RECORD" => Some(ElementKind::Type),
            _ => None,
        }
    }
}

/// Where a name was declared.
#[derive(Debug, Clone, Copy)]
pub struct Declaration<'a> {
    pub kind: ElementKind,
    /// The declaring statement or member (`local_variable_declaration`,
    /// `field_declaration`, `formal_parameter`, `method_declaration`, ...).
    pub node: AstNode<'a>,
    /// Declared type, when written out.
    pub type_node: Option<AstNode<'a>>,
    /// Initializer of a variable, when present.
    pub init: Option<AstNode<'a>>,
}

impl<'a> Declaration<'a> {
    pub fn modifiers(&self) -> Option<AstNode<'a>> {
        modifiers_of(&self.node)
    }
}

pub fn modifiers_of<'a>(node: &AstNode<'a>) -> Option<AstNode<'a>> {
    node.named_children().into_iter().find(|c| c.kind() == "modifiers")
}

/// Whether the modifiers of `decl` contain `keyword` (`static`, `final`).
pub fn has_modifier(decl: &AstNode<'_>, keyword: &str) -> bool {
    modifiers_of(decl).is_some_and(|m| m.tokens().contains(&keyword))
}

/// Annotation names on a declaration, without `@`.
pub fn annotation_names<'a>(decl: &AstNode<'a>) -> Vec<&'a str> {
    modifiers_of(decl)
        .map(|m| {
            m.named_children()
                .into_iter()
                .filter(|a| kinds::is_annotation(a.kind()))
                .filter_map(|a| a.child_by_field("name").map(|n| n.text()))
                .collect()
        })
        .unwrap_or_default()
}

/// Find what `node` refers to. Identifiers resolve through scopes, method
/// calls and field accesses through the members of the enclosing types,
/// and declarations resolve to themselves.
pub fn resolve<'a>(node: &AstNode<'a>) -> Option<Declaration<'a>> {
    match node.kind() {
        "identifier" => {
            let parent = node.parent();
            let field = node.field_name();
            match (parent.map(|p| p.kind()), field) {
                (Some("method_invocation"), Some("name")) => {
                    find_method(node, node.text())
                }
                (Some("method_declaration"), Some("name")) => parent.map(|p| as_declaration(&p)),
                (Some("field_access"), Some("field")) => find_field(node, node.text()),
                (Some("variable_declarator"), Some("name")) => {
                    parent.and_then(|p| p.parent()).map(|d| variable_declaration(&d, node))
                }
                _ => find_variable(node, node.text()),
            }
        }
        "method_invocation" => {
            let name = node.child_by_field("name")?;
            find_method(node, name.text())
        }
        "field_access" => {
            let field = node.child_by_field("field")?;
            find_field(node, field.text())
        }
        "type_identifier" => find_type(node, node.text()),
        "this" => node.enclosing_type().map(|t| as_declaration(&t)),
        k if kinds::is_body_declaration(k)
            || matches!(k, "local_variable_declaration" | "formal_parameter") =>
        {
            Some(as_declaration(node))
        }
        _ => None,
    }
}

fn as_declaration<'a>(node: &AstNode<'a>) -> Declaration<'a> {
    let kind = match node.kind() {
        "method_declaration" | "constructor_declaration" => ElementKind::Method,
        "field_declaration" => ElementKind::Field,
        "local_variable_declaration" => ElementKind::LocalVariable,
        "formal_parameter" | "spread_parameter" | "catch_formal_parameter" => ElementKind::Parameter,
        _ => ElementKind::Type,
    };
    let type_node = node.child_by_field("type");
    let init = node
        .named_children()
        .into_iter()
        .find(|c| c.kind() == "variable_declarator")
        .and_then(|d| d.child_by_field("value"));
    Declaration {
        kind,
        node: *node,
        type_node,
        init,
    }
}

/// Declaration for `name` inside a declaring statement with several
/// declarators (`int a = 1, b = 2;`).
fn variable_declaration<'a>(decl: &AstNode<'a>, name: &AstNode<'a>) -> Declaration<'a> {
    let mut d = as_declaration(decl);
    d.init = name.parent().and_then(|p| p.child_by_field("value"));
    d
}

fn find_variable<'a>(from: &AstNode<'a>, name: &str) -> Option<Declaration<'a>> {
    // Innermost scope first; within a scope the nearest preceding
    // declaration wins.
    for scope in from.ancestors() {
        let mut best: Option<Declaration<'a>> = None;
        for child in scope.named_children() {
            if child.start() > from.start() {
                break;
            }
            if let Some(d) = declares(&child, name) {
                best = Some(d);
            }
        }
        if best.is_some() {
            return best;
        }
        if kinds::is_type_declaration(scope.kind()) {
            if let Some(f) = scope
                .child_by_field("body")
                .and_then(|body| member_field(&body, name))
            {
                return Some(f);
            }
        }
    }
    None
}

/// Declaration of `name` made directly by `node`, if any.
fn declares<'a>(node: &AstNode<'a>, name: &str) -> Option<Declaration<'a>> {
    match node.kind() {
        "local_variable_declaration" | "field_declaration" => node
            .named_children()
            .into_iter()
            .filter(|c| c.kind() == "variable_declarator")
            .find(|d| d.child_by_field("name").is_some_and(|n| n.text() == name))
            .and_then(|d| d.child_by_field("name"))
            .map(|n| variable_declaration(node, &n)),
        "formal_parameter" | "spread_parameter" | "catch_formal_parameter" => {
            let named = node
                .descendants()
                .into_iter()
                .any(|d| d.kind() == "identifier" && d.text() == name && d.field_name() == Some("name"));
            named.then(|| as_declaration(node))
        }
        "formal_parameters" | "inferred_parameters" | "resource_specification" => node
            .named_children()
            .iter()
            .find_map(|p| declares(p, name)),
        "enhanced_for_statement" | "resource" => {
            let declared = node.child_by_field("name").is_some_and(|n| n.text() == name);
            declared.then(|| Declaration {
                kind: ElementKind::LocalVariable,
                node: *node,
                type_node: node.child_by_field("type"),
                init: node.child_by_field("value"),
            })
        }
        "identifier" if node.text() == name => {
            // Untyped lambda parameter.
            let in_lambda = node.parent().is_some_and(|p| {
                p.kind() == "lambda_expression" || p.kind() == "inferred_parameters"
            });
            in_lambda.then(|| Declaration {
                kind: ElementKind::Parameter,
                node: *node,
                type_node: None,
                init: None,
            })
        }
        _ => None,
    }
}

fn member_field<'a>(body: &AstNode<'a>, name: &str) -> Option<Declaration<'a>> {
    body.named_children()
        .into_iter()
        .filter(|m| m.kind() == "field_declaration")
        .find_map(|m| declares(&m, name))
}

fn find_field<'a>(from: &AstNode<'a>, name: &str) -> Option<Declaration<'a>> {
    for ty in from.ancestors().filter(|a| kinds::is_type_declaration(a.kind())) {
        if let Some(f) = ty.child_by_field("body").and_then(|b| member_field(&b, name)) {
            return Some(f);
        }
    }
    None
}

fn find_method<'a>(from: &AstNode<'a>, name: &str) -> Option<Declaration<'a>> {
    for ty in from.ancestors().filter(|a| kinds::is_type_declaration(a.kind())) {
        let Some(body) = ty.child_by_field("body") else {
            continue;
        };
        let method = body.named_children().into_iter().find(|m| {
            m.kind() == "method_declaration"
                && m.child_by_field("name").is_some_and(|n| n.text() == name)
        });
        if let Some(m) = method {
            return Some(as_declaration(&m));
        }
    }
    None
}

fn find_type<'a>(from: &AstNode<'a>, name: &str) -> Option<Declaration<'a>> {
    from.unit()
        .root()
        .descendants()
        .into_iter()
        .filter(|n| kinds::is_type_declaration(n.kind()))
        .find(|n| n.child_by_field("name").is_some_and(|id| id.text() == name))
        .map(|n| as_declaration(&n))
}

/// Static type of an expression where the source states it, without
/// generic arguments.
pub fn static_type(node: &AstNode<'_>) -> Option<String> {
    let ty = match node.kind() {
        "string_literal" | "text_block" => "String".to_string(),
        "character_literal" => "char".to_string(),
        "true" | "false" => "boolean".to_string(),
        "decimal_integer_literal" | "hex_integer_literal" | "octal_integer_literal"
        | "binary_integer_literal" => {
            if node.text().ends_with(['l', 'L']) {
                "long".to_string()
            } else {
                "int".to_string()
            }
        }
        "decimal_floating_point_literal" | "hex_floating_point_literal" => {
            if node.text().ends_with(['f', 'F']) {
                "float".to_string()
            } else {
                "double".to_string()
            }
        }
        "class_literal" => "Class".to_string(),
        "object_creation_expression" | "cast_expression" => {
            erase(node.child_by_field("type")?.text())
        }
        "array_creation_expression" => {
            let base = erase(node.child_by_field("type")?.text());
            let dims = node
                .named_children()
                .iter()
                .filter(|c| matches!(c.kind(), "dimensions_expr" | "dimensions"))
                .map(|c| if c.kind() == "dimensions" { c.text().matches('[').count() } else { 1 })
                .sum::<usize>()
                .max(1);
            format!("{base}{}", "[]".repeat(dims))
        }
        "parenthesized_expression" => return static_type(node.named_children().first()?),
        "binary_expression" => {
            let op = node.tokens().first().copied().unwrap_or("");
            match op {
                "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" => "boolean".to_string(),
                "+" => {
                    let operands = node.named_children();
                    if operands
                        .iter()
                        .any(|o| static_type(o).as_deref() == Some("String"))
                    {
                        "String".to_string()
                    } else {
                        return None;
                    }
                }
                _ => return None,
            }
        }
        "instanceof_expression" => "boolean".to_string(),
        "identifier" | "field_access" | "this" => {
            let decl = resolve(node)?;
            if decl.kind == ElementKind::Type && node.kind() == "this" {
                return decl.node.child_by_field("name").map(|n| n.text().to_string());
            }
            let written = decl.type_node?;
            if written.text() == "var" {
                return static_type(&decl.init?);
            }
            let mut ty = erase(written.text());
            if let Some(dims) = decl
                .node
                .named_children()
                .into_iter()
                .find(|c| c.kind() == "variable_declarator")
                .and_then(|d| d.child_by_field("dimensions"))
            {
                ty.push_str(&"[]".repeat(dims.text().matches('[').count()));
            }
            ty
        }
        _ => return None,
    };
    Some(ty)
}

/// `List<String>` becomes `List`, `Map.Entry<K, V>[]` becomes `Map.Entry[]`.
pub fn erase(type_text: &str) -> String {
    let mut out = String::with_capacity(type_text.len());
    let mut depth = 0usize;
    for ch in type_text.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 && !c.is_whitespace() => out.push(c),
            _ => {}
        }
    }
    out
}

const SUPERTYPES: &[(&str, &[&str])] = &[
    ("String", &["CharSequence", "Comparable", "Serializable"]),
    ("StringBuilder", &["CharSequence"]),
    ("StringBuffer", &["CharSequence"]),
    ("Integer", &["Number", "Comparable"]),
    ("Long", &["Number", "Comparable"]),
    ("Double", &["Number", "Comparable"]),
    ("Float", &["Number", "Comparable"]),
    ("Short", &["Number", "Comparable"]),
    ("Byte", &["Number", "Comparable"]),
    ("BigDecimal", &["Number", "Comparable"]),
    ("BigInteger", &["Number", "Comparable"]),
    ("ArrayList", &["List", "RandomAccess"]),
    ("LinkedList", &["List", "Deque"]),
    ("Vector", &["List", "RandomAccess"]),
    ("CopyOnWriteArrayList", &["List"]),
    ("List", &["Collection"]),
    ("HashSet", &["Set"]),
    ("LinkedHashSet", &["Set"]),
    ("TreeSet", &["SortedSet", "NavigableSet"]),
    ("SortedSet", &["Set"]),
    ("NavigableSet", &["SortedSet"]),
    ("Set", &["Collection"]),
    ("ArrayDeque", &["Deque"]),
    ("Deque", &["Queue"]),
    ("PriorityQueue", &["Queue"]),
    ("Queue", &["Collection"]),
    ("Collection", &["Iterable"]),
    ("HashMap", &["Map"]),
    ("LinkedHashMap", &["HashMap"]),
    ("TreeMap", &["SortedMap", "NavigableMap"]),
    ("NavigableMap", &["SortedMap"]),
    ("SortedMap", &["Map"]),
    ("ConcurrentHashMap", &["ConcurrentMap"]),
    ("ConcurrentMap", &["Map"]),
    ("Hashtable", &["Map"]),
    ("RuntimeException", &["Exception"]),
    ("IllegalArgumentException", &["RuntimeException"]),
    ("IllegalStateException", &["RuntimeException"]),
    ("NullPointerException", &["RuntimeException"]),
    ("IOException", &["Exception"]),
    ("Exception", &["Throwable"]),
    ("Error", &["Throwable"]),
];

const PRIMITIVES: &[&str] = &["int", "long", "short", "byte", "char", "boolean", "float", "double"];

/// Whether a value of static type `actual` is an instance of `expected`,
/// using simple names and a table of well-known JDK supertypes.
pub fn is_subtype(actual: &str, expected: &str) -> bool {
    let actual = simple_name(&erase(actual));
    let expected = simple_name(&erase(expected));
    if let Some(expected_elem) = expected.strip_suffix("[]") {
        return match actual.strip_suffix("[]") {
            Some(actual_elem) => {
                actual_elem == expected_elem
                    || (!PRIMITIVES.contains(&actual_elem) && is_subtype(actual_elem, expected_elem))
            }
            None => false,
        };
    }
    if actual == expected {
        return true;
    }
    if PRIMITIVES.contains(&actual.as_str()) {
        return false;
    }
    if expected == "Object" {
        return true;
    }
    let mut pending = vec![actual];
    let mut seen: Vec<String> = Vec::new();
    while let Some(current) = pending.pop() {
        if current == expected {
            return true;
        }
        if seen.contains(&current) {
            continue;
        }
        if let Some((_, supers)) = SUPERTYPES.iter().find(|(t, _)| *t == current) {
            pending.extend(supers.iter().map(|s| s.to_string()));
        }
        seen.push(current);
    }
    false
}

fn simple_name(type_text: &str) -> String {
    let (base, suffix) = match type_text.find('[') {
        Some(i) => type_text.split_at(i),
        None => (type_text, ""),
    };
    let simple = base.rsplit('.').next().unwrap_or(base);
    format!("{simple}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::CompilationUnit;

    fn find<'a>(unit: &'a CompilationUnit, kind: &str, text: &str) -> AstNode<'a> {
        unit.root()
            .descendants()
            .into_iter()
            .filter(|n| n.kind() == kind && n.text() == text)
            .last()
            .unwrap()
    }

    #[test]
    fn resolves_local_parameter_and_field() {
        let unit = CompilationUnit::parse(
            "class A { static final String NAME = \"a\"; void m(int count) { long total = 0; use(total, count, NAME); } }",
        )
        .unwrap();
        let total = resolve(&find(&unit, "identifier", "total")).unwrap();
        assert_eq!(total.kind, ElementKind::LocalVariable);
        let count = resolve(&find(&unit, "identifier", "count")).unwrap();
        assert_eq!(count.kind, ElementKind::Parameter);
        let name = resolve(&find(&unit, "identifier", "NAME")).unwrap();
        assert_eq!(name.kind, ElementKind::Field);
        assert!(has_modifier(&name.node, "static"));
        assert!(has_modifier(&name.node, "final"));
    }

    #[test]
    fn later_declarations_do_not_leak_backwards() {
        let unit = CompilationUnit::parse(
            "class A { String x; void m() { use(x); int x = 1; } }",
        )
        .unwrap();
        let use_site = unit
            .root()
            .descendants()
            .into_iter()
            .find(|n| n.kind() == "identifier" && n.text() == "x" && n.parent().is_some_and(|p| p.kind() == "argument_list"))
            .unwrap();
        assert_eq!(resolve(&use_site).unwrap().kind, ElementKind::Field);
    }

    #[test]
    fn static_types_from_source() {
        let unit = CompilationUnit::parse(
            "class A { void m(java.util.List<String> items) { var s = \"x\"; int[] arr = null; use(s, items, arr, 3L, 2.0f, new StringBuilder(), (Object) s); } }",
        )
        .unwrap();
        let ty = |kind: &str, text: &str| static_type(&find(&unit, kind, text));
        assert_eq!(ty("identifier", "s").as_deref(), Some("String"));
        assert_eq!(ty("identifier", "items").as_deref(), Some("java.util.List"));
        assert_eq!(ty("identifier", "arr").as_deref(), Some("int[]"));
        assert_eq!(ty("decimal_integer_literal", "3L").as_deref(), Some("long"));
        assert_eq!(ty("decimal_floating_point_literal", "2.0f").as_deref(), Some("float"));
        assert_eq!(
            ty("object_creation_expression", "new StringBuilder()").as_deref(),
            Some("StringBuilder")
        );
        assert_eq!(ty("cast_expression", "(Object) s").as_deref(), Some("Object"));
    }

    #[test]
    fn subtype_table() {
        assert!(is_subtype("String", "CharSequence"));
        assert!(is_subtype("java.lang.String", "String"));
        assert!(is_subtype("ArrayList", "Collection"));
        assert!(is_subtype("ArrayList", "Iterable"));
        assert!(is_subtype("LinkedHashMap", "Map"));
        assert!(is_subtype("Foo", "Object"));
        assert!(!is_subtype("int", "Object"));
        assert!(!is_subtype("String", "Number"));
        assert!(is_subtype("byte[]", "byte[]"));
        assert!(is_subtype("String[]", "Object[]"));
        assert!(!is_subtype("String", "String[]"));
    }

    #[test]
    fn erase_generics() {
        assert_eq!(erase("List<String>"), "List");
        assert_eq!(erase("Map<String, List<Integer>>[]"), "Map[]");
    }

    #[test]
    fn element_kind_names() {
        assert_eq!(ElementKind::from_str("field"), Some(ElementKind::Field));
        assert_eq!(ElementKind::from_str("LOCAL_VARIABLE"), Some(ElementKind::LocalVariable));
        assert_eq!(ElementKind::from_str("CLASS"), Some(ElementKind::Type));
        assert_eq!(ElementKind::from_str("PACKAGE"), None);
    }
}
