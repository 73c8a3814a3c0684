//! Turns an aligned before/after pair into a placeholder rule.

use std::collections::{HashMap, HashSet};

use super::InferredRule;
use super::confidence::ConfidenceCalculator;
use super::diff::{AlignmentKind, AstDiff};
use crate::parse::{AstNode, kinds};
use crate::pattern::PatternKind;
use crate::rewrite::{Edit, EditSet};
use crate::rule::ImportDirective;

/// Hands out unique placeholder names. Identifiers keep their own name
/// (`bytes` becomes `$bytes`); anything else is numbered.
#[derive(Debug, Default)]
pub struct PlaceholderNamer {
    used: HashSet<String>,
    counter: usize,
}

impl PlaceholderNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_for(&mut self, node: &AstNode<'_>) -> String {
        if node.kind() == "identifier" {
            let candidate = format!("${}", node.text());
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
        loop {
            self.counter += 1;
            let candidate = format!("$v{}", self.counter);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    pub fn reset(&mut self) {
        self.used.clear();
        self.counter = 0;
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderGeneralizer {
    confidence: ConfidenceCalculator,
}

impl PlaceholderGeneralizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` for an empty diff.
    pub fn generalize(
        &self,
        diff: &AstDiff<'_>,
        before: &str,
        after: &str,
        kind: PatternKind,
    ) -> Option<InferredRule> {
        self.generalize_with_imports(diff, before, after, kind, None)
    }

    pub fn generalize_with_imports(
        &self,
        diff: &AstDiff<'_>,
        before: &str,
        after: &str,
        kind: PatternKind,
        imports: Option<ImportDirective>,
    ) -> Option<InferredRule> {
        if diff.is_empty() {
            return None;
        }

        let mut namer = PlaceholderNamer::new();
        let mut by_text: HashMap<&str, String> = HashMap::new();
        let mut placeholders = Vec::new();
        let mut source_edits = Vec::new();
        let mut replacement_edits = Vec::new();

        for (index, alignment) in diff.alignments.iter().enumerate() {
            if alignment.kind != AlignmentKind::Identical {
                continue;
            }
            let (Some(b), Some(a)) = (alignment.before, alignment.after) else {
                continue;
            };
            if !generalizable(&b) {
                continue;
            }
            let name = by_text
                .entry(b.text())
                .or_insert_with(|| {
                    let name = namer.name_for(&b);
                    placeholders.push(name.clone());
                    name
                })
                .clone();

            if let Some(start) = position_in(before, &b) {
                source_edits.push(Edit::new(start, start + b.len(), name.clone(), index));
            }
            if let Some(start) = position_in(after, &a) {
                replacement_edits.push(Edit::new(start, start + a.len(), name, index));
            }
        }

        let source_pattern = EditSet::from_vec(source_edits).apply(before);
        let replacement_pattern = EditSet::from_vec(replacement_edits).apply(after);
        let confidence = self.confidence.calculate(diff);

        Some(
            InferredRule::new(source_pattern, replacement_pattern, kind, confidence, placeholders)
                .with_imports(imports),
        )
    }
}

/// Unchanged subtrees that stand for "whatever the user wrote there".
///
/// Literals, type names and method names are the part that changes
/// meaning, so they stay literal. Capitalized identifiers are almost
/// always class references such as `Collections`.
fn generalizable(node: &AstNode<'_>) -> bool {
    if node.text().trim().is_empty() || node.is_literal() || kinds::is_type(node.kind()) || !node.is_expression() {
        return false;
    }
    if node.kind() == "identifier" {
        if node.text().starts_with(|c: char| c.is_ascii_uppercase()) {
            return false;
        }
        let is_member_name = node.field_name() == Some("name")
            && node
                .parent()
                .is_some_and(|p| matches!(p.kind(), "method_invocation" | "field_access" | "method_reference"));
        if is_member_name {
            return false;
        }
    }
    true
}

/// Byte offset of `node` inside `snippet`.
///
/// The snippet is usually embedded verbatim in the unit the node comes
/// from; otherwise the first textual occurrence is used.
fn position_in(snippet: &str, node: &AstNode<'_>) -> Option<usize> {
    let anchor = snippet.trim_end().trim_end_matches(';').trim_end();
    let source = node.unit().source();
    if !anchor.is_empty() {
        if let Some(base) = source.find(anchor) {
            if let Some(rel) = node.start().checked_sub(base) {
                if snippet.get(rel..rel + node.len()) == Some(node.text()) {
                    return Some(rel);
                }
            }
        }
    }
    snippet.find(node.text())
}
