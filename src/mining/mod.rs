//! Rule mining: infer rewrite rules from before/after code pairs.
//!
//! The pipeline runs leaf-first:
//!
//! 1. [`hunks::DiffHunkRefiner`] narrows a file diff to changed statements.
//! 2. [`diff::AstDiffAnalyzer`] aligns the before and after trees.
//! 3. [`generalize::PlaceholderGeneralizer`] turns unchanged subtrees into
//!    placeholders and scores the result with
//!    [`confidence::ConfidenceCalculator`].
//! 4. [`validate::InferredRuleValidator`] and [`group::RuleGrouper`] filter
//!    and cluster the rules.
//!
//! [`inference::RuleInferenceEngine`] drives the whole thing and
//! [`analyzer::AsyncCommitAnalyzer`] runs it per commit on a thread pool.

pub mod analyzer;
pub mod confidence;
pub mod diff;
pub mod generalize;
pub mod git;
pub mod group;
pub mod hunks;
pub mod imports;
pub mod inference;
pub mod validate;

pub use analyzer::{AnalysisStatus, AsyncCommitAnalyzer, CommitAnalysisListener, CommitAnalysisResult, CommitHandle};
pub use confidence::ConfidenceCalculator;
pub use diff::{AlignmentKind, AstDiff, AstDiffAnalyzer, NodeAlignment};
pub use generalize::PlaceholderGeneralizer;
pub use git::{CommitInfo, DiffHunk, FileDiff, GitHistoryProvider};
pub use group::{RuleGroup, RuleGrouper};
pub use hunks::{CodeChangePair, DiffHunkRefiner};
pub use imports::ImportDiffAnalyzer;
pub use inference::RuleInferenceEngine;
pub use validate::{InferredRuleValidator, ValidationResult, ValidationStatus};

use crate::pattern::PatternKind;
use crate::rule::ImportDirective;

/// A rewrite rule generalized from one observed change.
#[derive(Debug, Clone, PartialEq)]
pub struct InferredRule {
    pub source_pattern: String,
    pub replacement_pattern: String,
    pub kind: PatternKind,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// Placeholder names introduced by generalization, in order.
    pub placeholders: Vec<String>,
    pub import_directive: Option<ImportDirective>,
}

impl InferredRule {
    pub fn new(
        source_pattern: impl Into<String>,
        replacement_pattern: impl Into<String>,
        kind: PatternKind,
        confidence: f64,
        placeholders: Vec<String>,
    ) -> Self {
        Self {
            source_pattern: source_pattern.into(),
            replacement_pattern: replacement_pattern.into(),
            kind,
            confidence,
            placeholders,
            import_directive: None,
        }
    }

    pub fn with_imports(mut self, imports: Option<ImportDirective>) -> Self {
        self.import_directive = imports.filter(|d| !d.is_empty());
        self
    }
}
