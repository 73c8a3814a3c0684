//! Placeholder-annotated Java patterns.
//!
//! A pattern is a Java fragment such as `$x + 0` or
//! `assertEquals($expected, $actual)`. Identifiers starting with `$` are
//! placeholders: `$name` captures one node, `$name$` captures a run of zero
//! or more siblings, and `$name:Kind` constrains what the placeholder may
//! capture.

pub mod parser;

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

pub use parser::{ParsedPattern, PatternParser};

/// Grammar entry point used to parse a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternKind {
    Expression,
    Statement,
    StatementSequence,
    Block,
    Annotation,
    MethodCall,
    Import,
    Field,
    Constructor,
    MethodDeclaration,
}

impl PatternKind {
    pub const ALL: [PatternKind; 10] = [
        PatternKind::Expression,
        PatternKind::Statement,
        PatternKind::StatementSequence,
        PatternKind::Block,
        PatternKind::Annotation,
        PatternKind::MethodCall,
        PatternKind::Import,
        PatternKind::Field,
        PatternKind::Constructor,
        PatternKind::MethodDeclaration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Expression => "EXPRESSION",
            PatternKind::Statement => "STATEMENT",
            PatternKind::StatementSequence => "STATEMENT_SEQUENCE",
            PatternKind::Block => "BLOCK",
            PatternKind::Annotation => "ANNOTATION",
            PatternKind::MethodCall => "METHOD_CALL",
            PatternKind::Import => "IMPORT",
            PatternKind::Field => "FIELD",
            PatternKind::Constructor => "CONSTRUCTOR",
            PatternKind::MethodDeclaration => "METHOD_DECLARATION",
        }
    }

    /// Whether a node of the given syntax kind can satisfy a pattern of
    /// this kind.
    pub fn accepts(&self, node_kind: &str) -> bool {
        use crate::parse::kinds;
        match self {
            PatternKind::Expression => kinds::is_expression(node_kind),
            PatternKind::Statement => kinds::is_statement(node_kind),
            PatternKind::StatementSequence | PatternKind::Block => kinds::is_block(node_kind),
            PatternKind::Annotation => kinds::is_annotation(node_kind),
            PatternKind::MethodCall => node_kind == "method_invocation",
            PatternKind::Import => node_kind == "import_declaration",
            PatternKind::Field => node_kind == "field_declaration",
            PatternKind::Constructor => node_kind == "object_creation_expression",
            PatternKind::MethodDeclaration => node_kind == "method_declaration",
        }
    }

    /// Guess the kind from pattern text, the way hint files do when no kind
    /// is declared.
    pub fn infer(text: &str) -> PatternKind {
        let trimmed = text.trim();
        if trimmed.starts_with('@') {
            PatternKind::Annotation
        } else if trimmed.starts_with("import ") {
            PatternKind::Import
        } else if trimmed.starts_with("new ") {
            PatternKind::Constructor
        } else if trimmed.starts_with('{') {
            PatternKind::Block
        } else if METHOD_DECLARATION_RE.is_match(trimmed)
            && !STATEMENT_KEYWORDS
                .iter()
                .any(|kw| trimmed.split_whitespace().next() == Some(*kw))
        {
            PatternKind::MethodDeclaration
        } else if is_call_shape(trimmed.trim_end_matches(';')) && !trimmed.ends_with(';') {
            PatternKind::MethodCall
        } else if trimmed.ends_with(';') {
            PatternKind::Statement
        } else {
            PatternKind::Expression
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        PatternKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| format!("unknown pattern kind: {s}"))
    }
}

/// Immutable pattern text plus the grammar entry point to parse it with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    value: String,
    kind: PatternKind,
    /// Fully qualified type the matched constructor/annotation must name.
    qualified_type: Option<String>,
}

impl Pattern {
    pub fn new(value: impl Into<String>, kind: PatternKind) -> Self {
        Self {
            value: value.into(),
            kind,
            qualified_type: None,
        }
    }

    pub fn with_qualified_type(mut self, qualified_type: impl Into<String>) -> Self {
        self.qualified_type = Some(qualified_type.into());
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn qualified_type(&self) -> Option<&str> {
        self.qualified_type.as_deref()
    }

    /// Placeholder names used in the pattern, in order of first appearance,
    /// without type constraints.
    pub fn placeholders(&self) -> Vec<String> {
        placeholders_in(&self.value)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// `[modifiers] Type name(` at the start of a method declaration.
static METHOD_DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:public|protected|private|static|final|abstract|synchronized|default)\s+)*[\w$.<>\[\]]+\s+[\w$]+\s*\(",
    )
    .expect("valid regex")
});

const STATEMENT_KEYWORDS: &[&str] = &["return", "throw", "yield", "assert", "new"];

/// A call chain such as `$x.trim().isEmpty()`: ends in a call and has no
/// operator or whitespace outside parentheses and literals.
fn is_call_shape(text: &str) -> bool {
    if !text.ends_with(')') || text.starts_with('(') {
        return false;
    }
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in text.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            c if c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | '<' | '>') => {}
            _ => return false,
        }
    }
    true
}

/// Matches `$name`, `$name$` and `$_`.
pub static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$[A-Za-z_][A-Za-z0-9_]*\$?").expect("placeholder regex is valid")
});

pub fn is_placeholder(text: &str) -> bool {
    text.len() > 1 && text.starts_with('$') && PLACEHOLDER_RE.find(text).is_some_and(|m| m.len() == text.len())
}

/// `$name$` form, standing for zero or more siblings.
pub fn is_variadic(text: &str) -> bool {
    text.len() > 2 && text.starts_with('$') && text.ends_with('$') && is_placeholder(text)
}

/// Distinct placeholders in `text`, in order of first appearance.
pub fn placeholders_in(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in PLACEHOLDER_RE.find_iter(text) {
        let name = m.as_str().to_string();
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in PatternKind::ALL {
            assert_eq!(kind.as_str().parse::<PatternKind>().unwrap(), kind);
        }
        assert_eq!(
            "statement-sequence".parse::<PatternKind>().unwrap(),
            PatternKind::StatementSequence
        );
        assert!("bogus".parse::<PatternKind>().is_err());
    }

    #[test]
    fn infers_kind_from_text() {
        assert_eq!(PatternKind::infer("@Deprecated"), PatternKind::Annotation);
        assert_eq!(PatternKind::infer("import java.util.List;"), PatternKind::Import);
        assert_eq!(PatternKind::infer("new String($b)"), PatternKind::Constructor);
        assert_eq!(PatternKind::infer("{ $a; }"), PatternKind::Block);
        assert_eq!(PatternKind::infer("$x.toString()"), PatternKind::MethodCall);
        assert_eq!(PatternKind::infer("return $x;"), PatternKind::Statement);
        assert_eq!(PatternKind::infer("$x + 0"), PatternKind::Expression);
        assert_eq!(PatternKind::infer("$list.size() == 0"), PatternKind::Expression);
        assert_eq!(PatternKind::infer("String.format(\"%s\", $x)"), PatternKind::MethodCall);
        assert_eq!(PatternKind::infer("($a + $b)"), PatternKind::Expression);
        assert_eq!(PatternKind::infer("void dispose()"), PatternKind::MethodDeclaration);
        assert_eq!(PatternKind::infer("return foo($x)"), PatternKind::Expression);
    }

    #[test]
    fn placeholder_shapes() {
        assert!(is_placeholder("$x"));
        assert!(is_placeholder("$_"));
        assert!(is_placeholder("$args$"));
        assert!(!is_placeholder("$"));
        assert!(!is_placeholder("x"));
        assert!(!is_placeholder("$x.y"));
        assert!(is_variadic("$args$"));
        assert!(!is_variadic("$x"));
        assert!(!is_variadic("$$"));
    }

    #[test]
    fn placeholders_in_order_of_appearance() {
        let p = Pattern::new("$b.equals($a) && $b != null && f($rest$)", PatternKind::Expression);
        assert_eq!(p.placeholders(), vec!["$b", "$a", "$rest$"]);
    }

    #[test]
    fn accepts_matches_syntax_kinds() {
        assert!(PatternKind::Expression.accepts("binary_expression"));
        assert!(!PatternKind::Expression.accepts("return_statement"));
        assert!(PatternKind::Annotation.accepts("marker_annotation"));
        assert!(!PatternKind::Annotation.accepts("expression_statement"));
        assert!(PatternKind::StatementSequence.accepts("block"));
        assert!(PatternKind::Block.accepts("constructor_body"));
    }
}
