//! Narrows line-based diff hunks down to the statements that changed.

use std::ops::Range;

use super::git::FileDiff;
use crate::parse::{AstNode, CompilationUnit, kinds};
use crate::pattern::PatternKind;

/// One changed statement, ready for rule inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeChangePair {
    pub file_path: String,
    /// 1-based line of the statement in the old version.
    pub line: usize,
    pub before_snippet: String,
    pub after_snippet: String,
    pub inferred_kind: PatternKind,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DiffHunkRefiner;

impl DiffHunkRefiner {
    pub fn new() -> Self {
        Self
    }

    /// Statements touched by each hunk, paired by position. Files that are
    /// not Java, added, deleted or unparseable yield nothing.
    pub fn refine_to_statements(&self, diff: &FileDiff) -> Vec<CodeChangePair> {
        let (Some(before), Some(after)) = (&diff.content_before, &diff.content_after) else {
            return Vec::new();
        };
        if !diff.file_path.ends_with(".java") {
            return Vec::new();
        }
        let (Ok(before_cu), Ok(after_cu)) = (CompilationUnit::parse(before), CompilationUnit::parse(after)) else {
            return Vec::new();
        };

        let mut pairs = Vec::new();
        for hunk in &diff.hunks {
            let before_nodes = statements_on_lines(&before_cu, hunk.before_lines());
            let after_nodes = statements_on_lines(&after_cu, hunk.after_lines());
            for (b, a) in before_nodes.iter().zip(&after_nodes) {
                let before_text = b.text().trim();
                let after_text = a.text().trim();
                if before_text == after_text {
                    continue;
                }
                let kind = infer_kind(b);
                let (before_snippet, after_snippet) = match kind {
                    PatternKind::Statement => (before_text, after_text),
                    _ => (strip_semicolon(before_text), strip_semicolon(after_text)),
                };
                pairs.push(CodeChangePair {
                    file_path: diff.file_path.clone(),
                    line: b.line(),
                    before_snippet: before_snippet.to_string(),
                    after_snippet: after_snippet.to_string(),
                    inferred_kind: kind,
                });
            }
        }
        pairs
    }
}

fn strip_semicolon(text: &str) -> &str {
    text.trim_end_matches(';').trim_end()
}

fn is_candidate(node: &AstNode<'_>) -> bool {
    node.is_statement() && node.kind() != "block" && !kinds::is_type_declaration(node.kind())
}

/// Innermost statements overlapping `lines`, in source order.
fn statements_on_lines<'a>(unit: &'a CompilationUnit, lines: Range<usize>) -> Vec<AstNode<'a>> {
    if lines.is_empty() {
        return Vec::new();
    }
    let overlapping: Vec<AstNode<'a>> = unit
        .root()
        .descendants()
        .into_iter()
        .filter(is_candidate)
        .filter(|n| {
            let first = n.line();
            let last = unit.line_of(n.end().saturating_sub(1).max(n.start()));
            first < lines.end && last >= lines.start
        })
        .collect();

    let mut innermost: Vec<AstNode<'a>> = Vec::new();
    for node in &overlapping {
        let encloses_another = overlapping.iter().any(|other| {
            !other.same_node(node)
                && node.start() <= other.start()
                && other.end() <= node.end()
                && (node.start(), node.end()) != (other.start(), other.end())
        });
        let duplicate = innermost
            .iter()
            .any(|kept| (kept.start(), kept.end()) == (node.start(), node.end()));
        if !encloses_another && !duplicate {
            innermost.push(*node);
        }
    }
    innermost
}

fn infer_kind(statement: &AstNode<'_>) -> PatternKind {
    if statement.kind() != "expression_statement" {
        return PatternKind::Statement;
    }
    match statement.named_children().first().map(|e| e.kind()) {
        Some("method_invocation") => PatternKind::MethodCall,
        Some("object_creation_expression") => PatternKind::Constructor,
        _ => PatternKind::Expression,
    }
}
