//! Turns pattern text into a template syntax tree.
//!
//! Placeholders are ordinary Java identifiers, so each pattern kind only
//! needs a wrapper that puts the fragment in a position where the grammar
//! accepts it. Type constraints (`$y:StringLiteral`) are not Java and are
//! stripped before parsing.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{Pattern, PatternKind};
use crate::error::PatternError;
use crate::parse::{AstNode, CompilationUnit};

static CONSTRAINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\$[A-Za-z_][A-Za-z0-9_]*\$?):([A-Z][A-Za-z0-9_]*)")
        .expect("constraint regex is valid")
});

static VARIADIC_PARAMS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*(\$[A-Za-z_][A-Za-z0-9_]*\$)\s*\)").expect("params regex is valid")
});

const WRAP_CLASS: &str = "class _Pattern { ";

/// A pattern parsed into a template tree.
///
/// Owns the wrapped compilation unit; the template node is located by a
/// path of named-child indices from the root.
#[derive(Debug)]
pub struct ParsedPattern {
    pattern: Pattern,
    unit: CompilationUnit,
    path: Vec<usize>,
    constraints: HashMap<String, String>,
}

impl ParsedPattern {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn kind(&self) -> PatternKind {
        self.pattern.kind()
    }

    pub fn unit(&self) -> &CompilationUnit {
        &self.unit
    }

    /// The node the pattern's fragment parsed to.
    pub fn template(&self) -> AstNode<'_> {
        let mut node = self.unit.root();
        for &idx in &self.path {
            match node.named_children().get(idx) {
                Some(child) => node = *child,
                None => break,
            }
        }
        node
    }

    /// Statements of a statement-sequence or block template.
    pub fn statements(&self) -> Vec<AstNode<'_>> {
        self.template().named_children()
    }

    /// Type constraint declared for a placeholder, e.g. `StringLiteral`.
    pub fn constraint(&self, name: &str) -> Option<&str> {
        self.constraints.get(name).map(String::as_str)
    }

    pub fn constraints(&self) -> &HashMap<String, String> {
        &self.constraints
    }
}

/// Parses [`Pattern`]s into [`ParsedPattern`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternParser;

impl PatternParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, pattern: &Pattern) -> Result<ParsedPattern, PatternError> {
        let raw = pattern.value().trim();
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        let (snippet, constraints) = strip_constraints(raw);
        let kind = pattern.kind();
        let source = wrap(&snippet, kind);

        let unit = CompilationUnit::parse(&source).map_err(|e| malformed(pattern, e.to_string()))?;
        if unit.has_syntax_errors() {
            return Err(malformed(pattern, first_error(&unit)));
        }
        let template = locate(&unit, kind)
            .ok_or_else(|| malformed(pattern, format!("fragment is not a {kind}")))?;
        let path = path_to(&template);

        Ok(ParsedPattern {
            pattern: pattern.clone(),
            unit,
            path,
            constraints,
        })
    }
}

/// Remove `:Constraint` suffixes, returning the cleaned text and the
/// placeholder-to-constraint map.
pub fn strip_constraints(text: &str) -> (String, HashMap<String, String>) {
    let mut constraints = HashMap::new();
    let cleaned = CONSTRAINT_RE.replace_all(text, |caps: &Captures| {
        constraints.insert(caps[1].to_string(), caps[2].to_string());
        caps[1].to_string()
    });
    (cleaned.into_owned(), constraints)
}

fn without_semicolon(text: &str) -> &str {
    text.trim_end().trim_end_matches(';').trim_end()
}

fn wrap(snippet: &str, kind: PatternKind) -> String {
    match kind {
        PatternKind::Expression => {
            format!("{WRAP_CLASS}void _method() {{ _result = {snippet}; }} }}")
        }
        PatternKind::Constructor => {
            format!("{WRAP_CLASS}void _method() {{ Object _result = {}; }} }}", without_semicolon(snippet))
        }
        PatternKind::Statement | PatternKind::StatementSequence => {
            format!("{WRAP_CLASS}void _method() {{ {snippet} }} }}")
        }
        PatternKind::MethodCall => {
            format!("{WRAP_CLASS}void _method() {{ {}; }} }}", without_semicolon(snippet))
        }
        PatternKind::Block => format!("{WRAP_CLASS}void _method() {snippet} }}"),
        PatternKind::Annotation => format!("{snippet} class _Pattern {{}}"),
        PatternKind::Import => format!("{}; class _Pattern {{}}", without_semicolon(snippet)),
        PatternKind::Field => format!("{WRAP_CLASS}{}; }}", without_semicolon(snippet)),
        PatternKind::MethodDeclaration => {
            let normalized = VARIADIC_PARAMS_RE.replace_all(snippet, "(Object... $1)");
            let trimmed = normalized.trim_end();
            let body = if trimmed.ends_with('}') {
                trimmed.to_string()
            } else {
                format!("{} {{}}", without_semicolon(trimmed))
            };
            format!("{WRAP_CLASS}{body} }}")
        }
    }
}

fn locate(unit: &CompilationUnit, kind: PatternKind) -> Option<AstNode<'_>> {
    let root = unit.root();
    match kind {
        PatternKind::Annotation => {
            let class = first_of(&root, "class_declaration")?;
            let modifiers = first_of(&class, "modifiers")?;
            modifiers
                .named_children()
                .into_iter()
                .find(|c| crate::parse::kinds::is_annotation(c.kind()))
        }
        PatternKind::Import => first_of(&root, "import_declaration"),
        PatternKind::Field | PatternKind::MethodDeclaration => {
            let body = class_body(unit)?;
            body.named_children().into_iter().next()
        }
        _ => {
            let method = first_of(&class_body(unit)?, "method_declaration")?;
            let block = method.child_by_field("body")?;
            match kind {
                PatternKind::Block | PatternKind::StatementSequence => Some(block),
                PatternKind::Statement => block.named_children().into_iter().next(),
                PatternKind::MethodCall => {
                    let stmt = block.named_children().into_iter().next()?;
                    stmt.named_children().into_iter().next()
                }
                PatternKind::Constructor => {
                    let decl = block.named_children().into_iter().next()?;
                    let declarator = first_of(&decl, "variable_declarator")?;
                    declarator.child_by_field("value")
                }
                _ => {
                    let stmt = block.named_children().into_iter().next()?;
                    let assign = first_of(&stmt, "assignment_expression")?;
                    assign.child_by_field("right")
                }
            }
        }
    }
}

fn class_body(unit: &CompilationUnit) -> Option<AstNode<'_>> {
    let class = first_of(&unit.root(), "class_declaration")?;
    class.child_by_field("body")
}

fn first_of<'a>(node: &AstNode<'a>, kind: &str) -> Option<AstNode<'a>> {
    node.named_children().into_iter().find(|c| c.kind() == kind)
}

fn path_to(node: &AstNode<'_>) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = *node;
    while let Some(parent) = current.parent() {
        let idx = parent
            .named_children()
            .iter()
            .position(|c| c.same_node(&current))
            .unwrap_or(0);
        path.push(idx);
        current = parent;
    }
    path.reverse();
    path
}

fn first_error(unit: &CompilationUnit) -> String {
    unit.root()
        .descendants()
        .into_iter()
        .find(|n| n.raw().is_error() || n.raw().is_missing())
        .map(|n| format!("syntax error near `{}`", n.text()))
        .unwrap_or_else(|| "syntax error".to_string())
}

fn malformed(pattern: &Pattern, reason: String) -> PatternError {
    PatternError::Malformed {
        pattern: pattern.value().to_string(),
        kind: pattern.kind().to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, kind: PatternKind) -> ParsedPattern {
        PatternParser::new().parse(&Pattern::new(text, kind)).unwrap()
    }

    #[test]
    fn expression_pattern() {
        let p = parse("$x + 0", PatternKind::Expression);
        let t = p.template();
        assert_eq!(t.kind(), "binary_expression");
        assert_eq!(t.text(), "$x + 0");
    }

    #[test]
    fn statement_pattern() {
        let p = parse("return $x;", PatternKind::Statement);
        assert_eq!(p.template().kind(), "return_statement");
    }

    #[test]
    fn method_call_pattern_with_or_without_semicolon() {
        assert_eq!(parse("$s.trim()", PatternKind::MethodCall).template().kind(), "method_invocation");
        assert_eq!(parse("$s.trim();", PatternKind::MethodCall).template().kind(), "method_invocation");
    }

    #[test]
    fn constructor_pattern() {
        let p = parse("new String($bytes, \"UTF-8\")", PatternKind::Constructor);
        assert_eq!(p.template().kind(), "object_creation_expression");
    }

    #[test]
    fn annotation_pattern() {
        let p = parse("@SuppressWarnings($v)", PatternKind::Annotation);
        assert_eq!(p.template().kind(), "annotation");
        let p = parse("@Deprecated", PatternKind::Annotation);
        assert_eq!(p.template().kind(), "marker_annotation");
    }

    #[test]
    fn import_pattern() {
        let p = parse("import java.util.Vector", PatternKind::Import);
        assert_eq!(p.template().kind(), "import_declaration");
    }

    #[test]
    fn field_pattern() {
        let p = parse("private static final $T $name = $init;", PatternKind::Field);
        assert_eq!(p.template().kind(), "field_declaration");
    }

    #[test]
    fn block_and_sequence_patterns() {
        let p = parse("{ $a; $b; }", PatternKind::Block);
        assert_eq!(p.template().kind(), "block");
        let p = parse("$a; $b;", PatternKind::StatementSequence);
        assert_eq!(p.template().kind(), "block");
        assert_eq!(p.statements().len(), 2);
    }

    #[test]
    fn method_declaration_with_variadic_params() {
        let p = parse("void $name($params$)", PatternKind::MethodDeclaration);
        let t = p.template();
        assert_eq!(t.kind(), "method_declaration");
        assert!(t.text().contains("Object... $params$"));
    }

    #[test]
    fn constraints_are_stripped_and_recorded() {
        let p = parse("$x + $y:StringLiteral", PatternKind::Expression);
        assert_eq!(p.template().text(), "$x + $y");
        assert_eq!(p.constraint("$y"), Some("StringLiteral"));
        assert_eq!(p.constraint("$x"), None);
    }

    #[test]
    fn method_reference_is_not_a_constraint() {
        let (cleaned, constraints) = strip_constraints("$list.forEach($x::println)");
        assert_eq!(cleaned, "$list.forEach($x::println)");
        assert!(constraints.is_empty());
    }

    #[test]
    fn malformed_fragment_is_an_error() {
        let err = PatternParser::new()
            .parse(&Pattern::new("$x + + )", PatternKind::Expression))
            .unwrap_err();
        assert!(matches!(err, PatternError::Malformed { .. }));
        assert!(matches!(
            PatternParser::new().parse(&Pattern::new("  ", PatternKind::Expression)),
            Err(PatternError::Empty)
        ));
    }
}
