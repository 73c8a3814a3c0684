//! Finds pattern matches in a compilation unit.
//!
//! One pre-order walk per pattern; [`index::PatternIndex`] shares a single
//! walk between many patterns.

pub mod handlers;
pub mod index;

use crate::error::PatternError;
use crate::matcher::{Binding, Bindings, PlaceholderMatcher};
use crate::parse::{kinds, AstNode, CompilationUnit};
use crate::pattern::{ParsedPattern, Pattern, PatternKind, PatternParser};

pub use handlers::{HandlerRegistry, MatchHandler};
pub use index::PatternIndex;

/// Auto-binding for the whole matched node.
pub const MATCHED_NODE: &str = "$_";
/// Auto-binding for the nearest enclosing type declaration.
pub const ENCLOSING_TYPE: &str = "$this";

/// One successful match.
#[derive(Debug, Clone)]
pub struct Match<'a> {
    node: AstNode<'a>,
    bindings: Bindings<'a>,
    offset: usize,
    length: usize,
}

impl<'a> Match<'a> {
    pub fn new(node: AstNode<'a>, bindings: Bindings<'a>, offset: usize, length: usize) -> Self {
        Self {
            node,
            bindings,
            offset,
            length,
        }
    }

    /// The matched node; the first statement for statement sequences.
    pub fn node(&self) -> AstNode<'a> {
        self.node
    }

    pub fn unit(&self) -> &'a CompilationUnit {
        self.node.unit()
    }

    pub fn bindings(&self) -> &Bindings<'a> {
        &self.bindings
    }

    pub fn binding(&self, name: &str) -> Option<AstNode<'a>> {
        self.bindings.get(name).and_then(Binding::as_node)
    }

    pub fn list_binding(&self, name: &str) -> Option<&[AstNode<'a>]> {
        self.bindings.get(name).and_then(Binding::as_list)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// 1-based line of the match start.
    pub fn line(&self) -> usize {
        self.unit().line_of(self.offset)
    }

    pub fn matched_text(&self) -> &'a str {
        self.unit().slice(self.offset, self.end())
    }
}

/// Entry point for single-pattern matching.
#[derive(Debug, Default)]
pub struct TriggerPatternEngine {
    parser: PatternParser,
}

impl TriggerPatternEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// All matches of `pattern` in `unit`, in source order.
    pub fn find_matches<'a>(
        &self,
        unit: &'a CompilationUnit,
        pattern: &Pattern,
    ) -> Result<Vec<Match<'a>>, PatternError> {
        let parsed = self.parser.parse(pattern)?;
        Ok(self.find_matches_parsed(unit, &parsed))
    }

    pub fn find_matches_parsed<'a>(
        &self,
        unit: &'a CompilationUnit,
        parsed: &ParsedPattern,
    ) -> Vec<Match<'a>> {
        let mut results = Vec::new();
        for node in unit.root().descendants() {
            collect_node_matches(parsed, node, &mut results);
        }
        results
    }

    /// One match per node whose syntax kind is listed, carrying only the
    /// auto-bindings.
    pub fn find_matches_by_node_type<'a>(
        &self,
        unit: &'a CompilationUnit,
        node_kinds: &[&str],
    ) -> Vec<Match<'a>> {
        unit.root()
            .descendants()
            .into_iter()
            .filter(|n| node_kinds.contains(&n.kind()))
            .map(|n| finish_match(n, Bindings::new(), n.start(), n.len(), Binding::Node(n)))
            .collect()
    }
}

/// Try `parsed` at `node`, appending successes. Blocks are also scanned as
/// statement-sequence windows when the pattern asks for that.
pub(crate) fn collect_node_matches<'a>(
    parsed: &ParsedPattern,
    node: AstNode<'a>,
    out: &mut Vec<Match<'a>>,
) {
    if parsed.kind() == PatternKind::StatementSequence {
        if kinds::is_block(node.kind()) {
            out.extend(match_statement_windows(parsed, node));
        }
        return;
    }
    if let Some(m) = match_at(parsed, node) {
        out.push(m);
    }
}

/// Match `parsed` against exactly `node`.
pub fn match_at<'a>(parsed: &ParsedPattern, node: AstNode<'a>) -> Option<Match<'a>> {
    if !parsed.kind().accepts(node.kind()) {
        return None;
    }
    let mut matcher = PlaceholderMatcher::new(parsed);
    if !matcher.matches(node) {
        return None;
    }
    if let Some(qualified) = parsed.pattern().qualified_type() {
        if !names_qualified_type(&node, qualified) {
            return None;
        }
    }
    Some(finish_match(
        node,
        matcher.into_bindings(),
        node.start(),
        node.len(),
        Binding::Node(node),
    ))
}

/// Every window of the pattern's statement count inside `block`, in source
/// order. Windows may overlap.
pub fn match_statement_windows<'a>(parsed: &ParsedPattern, block: AstNode<'a>) -> Vec<Match<'a>> {
    let pattern_statements = parsed.statements();
    let statements = block.named_children();
    let size = pattern_statements.len();
    if size == 0 || size > statements.len() {
        return Vec::new();
    }
    let mut results = Vec::new();
    for window in statements.windows(size) {
        let mut matcher = PlaceholderMatcher::new(parsed);
        let all = pattern_statements
            .iter()
            .zip(window)
            .all(|(t, c)| matcher.match_node(*t, *c));
        if !all {
            continue;
        }
        let first = window[0];
        let last = window[size - 1];
        results.push(finish_match(
            first,
            matcher.into_bindings(),
            first.start(),
            last.end() - first.start(),
            Binding::List(window.to_vec()),
        ));
    }
    results
}

fn finish_match<'a>(
    node: AstNode<'a>,
    mut bindings: Bindings<'a>,
    offset: usize,
    length: usize,
    whole: Binding<'a>,
) -> Match<'a> {
    bindings.insert(MATCHED_NODE.to_string(), whole);
    if let Some(ty) = node.enclosing_type() {
        bindings.insert(ENCLOSING_TYPE.to_string(), Binding::Node(ty));
    }
    Match::new(node, bindings, offset, length)
}

/// Whether the type written at a constructor or annotation resolves to
/// `qualified` through the unit's imports or package.
fn names_qualified_type(node: &AstNode<'_>, qualified: &str) -> bool {
    let written = match node.kind() {
        "object_creation_expression" => node.child_by_field("type"),
        _ => node.child_by_field("name"),
    };
    let Some(written) = written else {
        return false;
    };
    let written = written.text();
    let written = written.split('<').next().unwrap_or(written).trim();
    if written == qualified {
        return true;
    }
    let (package, simple) = match qualified.rsplit_once('.') {
        Some((p, s)) => (p, s),
        None => ("", qualified),
    };
    if written != simple {
        return false;
    }
    let unit = node.unit();
    if package == "java.lang" || unit.package_name().as_deref() == Some(package) {
        return true;
    }
    let on_demand = format!("{package}.*");
    unit.imports()
        .iter()
        .any(|(name, is_static)| !is_static && (name == qualified || *name == on_demand))
}
