use super::diff::{AlignmentKind, AstDiff};

/// Scores how generalizable a diff is.
///
/// `0.5` baseline, raised by the identical share and lowered by the
/// modified share (weight `0.25`) and the inserted/deleted share (weight
/// `0.5`), clamped to `[0, 1]`. An all-identical diff is exactly `1.0`
/// and an empty one exactly `0.0`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfidenceCalculator;

impl ConfidenceCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate(&self, diff: &AstDiff<'_>) -> f64 {
        let total = diff.alignments.len();
        if total == 0 {
            return 0.0;
        }
        let identical = diff.count(AlignmentKind::Identical);
        if identical == total {
            return 1.0;
        }
        let share = |n: usize| n as f64 / total as f64;
        let modified = share(diff.count(AlignmentKind::Modified));
        let structural = share(diff.count(AlignmentKind::Inserted) + diff.count(AlignmentKind::Deleted));
        (0.5 + 0.5 * share(identical) - 0.25 * modified - 0.5 * structural).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mining::diff::{AstDiffAnalyzer, NodeAlignment};
    use crate::parse::{AstNode, CompilationUnit};

    fn alignments<'a>(node: AstNode<'a>, kinds: &[AlignmentKind]) -> AstDiff<'a> {
        let alignments = kinds
            .iter()
            .map(|&kind| NodeAlignment {
                before: (kind != AlignmentKind::Inserted).then_some(node),
                after: (kind != AlignmentKind::Deleted).then_some(node),
                kind,
            })
            .collect();
        AstDiff::new(true, alignments)
    }

    #[test]
    fn empty_and_identical_are_exact() {
        let calc = ConfidenceCalculator::new();
        assert_eq!(calc.calculate(&AstDiff::empty()), 0.0);

        let unit = CompilationUnit::parse("class A { int x = a + b; }").unwrap();
        let root = unit.root();
        let diff = AstDiffAnalyzer::new().compute_diff(Some(root), Some(root));
        assert_eq!(calc.calculate(&diff), 1.0);
    }

    #[test]
    fn structural_changes_cost_more_than_modifications() {
        let unit = CompilationUnit::parse("class A {}").unwrap();
        let node = unit.root();
        let calc = ConfidenceCalculator::new();
        use AlignmentKind::*;

        let modified = calc.calculate(&alignments(node, &[Identical, Modified]));
        let inserted = calc.calculate(&alignments(node, &[Identical, Inserted]));
        assert!(modified > inserted);

        let all_inserted = calc.calculate(&alignments(node, &[Inserted, Inserted]));
        assert!(all_inserted < 0.5);
        assert!(all_inserted >= 0.0);

        let mostly_identical = calc.calculate(&alignments(node, &[Identical, Identical, Identical, Modified]));
        assert!(mostly_identical > modified);
        assert!(mostly_identical < 1.0);
    }
}
