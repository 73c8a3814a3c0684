use std::fmt;

use tree_sitter::Node;

use super::kinds;
use super::source::CompilationUnit;

/// A syntax node together with the unit that owns its text.
///
/// Cheap to copy. Comments are treated as trivia: they never show up in
/// `children()`/`named_children()`, so structural comparisons ignore them.
#[derive(Clone, Copy)]
pub struct AstNode<'a> {
    node: Node<'a>,
    unit: &'a CompilationUnit,
}

impl<'a> AstNode<'a> {
    pub fn new(node: Node<'a>, unit: &'a CompilationUnit) -> Self {
        Self { node, unit }
    }

    pub fn raw(&self) -> Node<'a> {
        self.node
    }

    pub fn unit(&self) -> &'a CompilationUnit {
        self.unit
    }

    pub fn kind(&self) -> &'static str {
        self.node.kind()
    }

    pub fn is_named(&self) -> bool {
        self.node.is_named()
    }

    pub fn start(&self) -> usize {
        self.node.start_byte()
    }

    pub fn end(&self) -> usize {
        self.node.end_byte()
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 1-based line of the first byte.
    pub fn line(&self) -> usize {
        self.node.start_position().row + 1
    }

    pub fn text(&self) -> &'a str {
        self.unit.slice(self.start(), self.end())
    }

    pub fn parent(&self) -> Option<AstNode<'a>> {
        self.node.parent().map(|p| AstNode::new(p, self.unit))
    }

    /// All non-comment children, named and anonymous.
    pub fn children(&self) -> Vec<AstNode<'a>> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .filter(|c| !is_comment(c))
            .map(|c| AstNode::new(c, self.unit))
            .collect()
    }

    /// Named, non-comment children.
    pub fn named_children(&self) -> Vec<AstNode<'a>> {
        let mut cursor = self.node.walk();
        self.node
            .named_children(&mut cursor)
            .filter(|c| !is_comment(c))
            .map(|c| AstNode::new(c, self.unit))
            .collect()
    }

    /// Text of the anonymous children (keywords, operators, punctuation),
    /// without list separators.
    pub fn tokens(&self) -> Vec<&'a str> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .filter(|c| !c.is_named() && !is_comment(c))
            .map(|c| self.unit.slice(c.start_byte(), c.end_byte()))
            .filter(|t| *t != ",")
            .collect()
    }

    pub fn child_by_field(&self, field: &str) -> Option<AstNode<'a>> {
        self.node
            .child_by_field_name(field)
            .map(|c| AstNode::new(c, self.unit))
    }

    /// Name of the field this node occupies in its parent, if any.
    pub fn field_name(&self) -> Option<&'static str> {
        let parent = self.node.parent()?;
        let mut cursor = parent.walk();
        if !cursor.goto_first_child() {
            return None;
        }
        loop {
            if cursor.node() == self.node {
                return cursor.field_name();
            }
            if !cursor.goto_next_sibling() {
                return None;
            }
        }
    }

    pub fn ancestors(&self) -> impl Iterator<Item = AstNode<'a>> + use<'a> {
        let unit = self.unit;
        std::iter::successors(self.node.parent(), |n| n.parent())
            .map(move |n| AstNode::new(n, unit))
    }

    /// Pre-order list of this node and all named descendants.
    pub fn descendants(&self) -> Vec<AstNode<'a>> {
        let mut out = Vec::new();
        let mut stack = vec![*self];
        while let Some(node) = stack.pop() {
            out.push(node);
            let mut children = node.named_children();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    pub fn is_expression(&self) -> bool {
        kinds::is_expression(self.kind())
    }

    pub fn is_statement(&self) -> bool {
        kinds::is_statement(self.kind())
    }

    pub fn is_literal(&self) -> bool {
        kinds::is_literal(self.kind())
    }

    /// Both handles point at the same node of the same unit.
    pub fn same_node(&self, other: &AstNode<'_>) -> bool {
        self.node.id() == other.node.id() && std::ptr::eq(self.unit, other.unit)
    }

    /// Nearest enclosing type declaration (class, interface, enum, record,
    /// annotation type), excluding the node itself.
    pub fn enclosing_type(&self) -> Option<AstNode<'a>> {
        self.ancestors().find(|a| kinds::is_type_declaration(a.kind()))
    }

    /// Nearest enclosing member declaration (method, constructor, field or
    /// type), including the node itself.
    pub fn enclosing_declaration(&self) -> Option<AstNode<'a>> {
        std::iter::once(*self)
            .chain(self.ancestors())
            .find(|a| kinds::is_body_declaration(a.kind()))
    }

    /// Nearest enclosing method or constructor, including the node itself.
    pub fn enclosing_method(&self) -> Option<AstNode<'a>> {
        std::iter::once(*self).chain(self.ancestors()).find(|a| {
            matches!(
                a.kind(),
                "method_declaration" | "constructor_declaration" | "compact_constructor_declaration"
            )
        })
    }
}

impl fmt::Debug for AstNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..{} {:?}", self.kind(), self.start(), self.end(), self.text())
    }
}

fn is_comment(node: &Node<'_>) -> bool {
    matches!(node.kind(), "line_comment" | "block_comment")
}

/// Structural equality of two subtrees, possibly from different units.
///
/// Kinds, anonymous tokens and named children must agree recursively;
/// leaves compare by text. Comments and whitespace are ignored.
pub fn subtree_eq(a: &AstNode<'_>, b: &AstNode<'_>) -> bool {
    if a.kind() != b.kind() {
        return false;
    }
    let a_children = a.named_children();
    let b_children = b.named_children();
    if a_children.is_empty() && b_children.is_empty() {
        return a.text() == b.text();
    }
    if a_children.len() != b_children.len() || a.tokens() != b.tokens() {
        return false;
    }
    a_children
        .iter()
        .zip(b_children.iter())
        .all(|(x, y)| subtree_eq(x, y))
}
