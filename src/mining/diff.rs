//! Lock-step structural diff of two syntax trees.
//!
//! No move detection and no edit-distance search: nodes are paired by
//! position, and a pair whose kind or arity disagrees is reported as one
//! modified region.

use crate::parse::AstNode;
use crate::parse::node::subtree_eq;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlignmentKind {
    Identical,
    Modified,
    Inserted,
    Deleted,
}

impl AlignmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlignmentKind::Identical => "IDENTICAL",
            AlignmentKind::Modified => "MODIFIED",
            AlignmentKind::Inserted => "INSERTED",
            AlignmentKind::Deleted => "DELETED",
        }
    }
}

/// One paired region. `before` is `None` for insertions, `after` for
/// deletions.
#[derive(Debug, Clone, Copy)]
pub struct NodeAlignment<'a> {
    pub before: Option<AstNode<'a>>,
    pub after: Option<AstNode<'a>>,
    pub kind: AlignmentKind,
}

impl<'a> NodeAlignment<'a> {
    fn pair(before: AstNode<'a>, after: AstNode<'a>, kind: AlignmentKind) -> Self {
        Self {
            before: Some(before),
            after: Some(after),
            kind,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AstDiff<'a> {
    pub structurally_compatible: bool,
    pub alignments: Vec<NodeAlignment<'a>>,
}

impl<'a> AstDiff<'a> {
    pub fn new(structurally_compatible: bool, alignments: Vec<NodeAlignment<'a>>) -> Self {
        Self {
            structurally_compatible,
            alignments,
        }
    }

    /// The diff of two absent trees.
    pub fn empty() -> Self {
        Self::new(true, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.alignments.is_empty()
    }

    pub fn count(&self, kind: AlignmentKind) -> usize {
        self.alignments.iter().filter(|a| a.kind == kind).count()
    }

    /// True when every alignment is identical.
    pub fn is_unchanged(&self) -> bool {
        !self.is_empty() && self.count(AlignmentKind::Identical) == self.alignments.len()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AstDiffAnalyzer;

impl AstDiffAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn compute_diff<'a>(&self, before: Option<AstNode<'a>>, after: Option<AstNode<'a>>) -> AstDiff<'a> {
        let (before, after) = match (before, after) {
            (None, None) => return AstDiff::empty(),
            (None, Some(after)) => {
                return AstDiff::new(
                    false,
                    vec![NodeAlignment {
                        before: None,
                        after: Some(after),
                        kind: AlignmentKind::Inserted,
                    }],
                );
            }
            (Some(before), None) => {
                return AstDiff::new(
                    false,
                    vec![NodeAlignment {
                        before: Some(before),
                        after: None,
                        kind: AlignmentKind::Deleted,
                    }],
                );
            }
            (Some(before), Some(after)) => (before, after),
        };

        if before.kind() != after.kind() {
            return AstDiff::new(false, vec![NodeAlignment::pair(before, after, AlignmentKind::Modified)]);
        }

        let mut alignments = Vec::new();
        align(before, after, &mut alignments);
        let compatible = !alignments
            .iter()
            .any(|a| matches!(a.kind, AlignmentKind::Inserted | AlignmentKind::Deleted));
        AstDiff::new(compatible, alignments)
    }
}

fn align<'a>(before: AstNode<'a>, after: AstNode<'a>, out: &mut Vec<NodeAlignment<'a>>) {
    if subtree_eq(&before, &after) {
        out.push(NodeAlignment::pair(before, after, AlignmentKind::Identical));
        return;
    }
    let before_children = before.named_children();
    let after_children = after.named_children();
    if before.kind() != after.kind()
        || before_children.is_empty()
        || before_children.len() != after_children.len()
    {
        out.push(NodeAlignment::pair(before, after, AlignmentKind::Modified));
        return;
    }
    // Same shape, different operator or keyword: the node itself changed
    // even if every child survives.
    if before.tokens() != after.tokens() {
        out.push(NodeAlignment::pair(before, after, AlignmentKind::Modified));
    }
    for (b, a) in before_children.into_iter().zip(after_children) {
        align(b, a, out);
    }
}
