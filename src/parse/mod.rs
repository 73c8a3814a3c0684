pub mod kinds;
pub mod node;
pub mod scope;
pub mod source;

pub use node::AstNode;
pub use source::{CompilationUnit, CompilerOptions};

use tree_sitter::{Parser, Tree};

use crate::error::PatternError;

/// Parse Java source text with tree-sitter.
///
/// The parser is error tolerant: a tree is produced even for broken input,
/// with `ERROR`/`MISSING` nodes marking the damage. Callers that need
/// clean input check `Tree::root_node().has_error()`.
pub fn parse_java(source: &str) -> Result<Tree, PatternError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|e| PatternError::Language(e.to_string()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| PatternError::Language("parser returned no tree".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_java() {
        let tree = parse_java("class A { void m() { int x = 1; } }").unwrap();
        assert!(!tree.root_node().has_error());
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn parse_empty_source() {
        let tree = parse_java("").unwrap();
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn parse_syntax_error_still_returns() {
        let tree = parse_java("class A { void m( }").unwrap();
        assert!(tree.root_node().has_error());
    }

    #[test]
    fn placeholders_are_identifiers() {
        let tree = parse_java("class A { void m() { x = $a + $rest$; } }").unwrap();
        assert!(!tree.root_node().has_error());
    }
}
