use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tree_sitter::Tree;

use super::node::AstNode;
use super::parse_java;

/// Compiler settings visible to guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Java source level, e.g. `"1.8"`, `"11"`, `"21"`.
    pub source_version: String,
    pub extra: HashMap<String, String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            source_version: "1.8".to_string(),
            extra: HashMap::new(),
        }
    }
}

impl CompilerOptions {
    pub fn with_source_version(version: impl Into<String>) -> Self {
        Self {
            source_version: version.into(),
            extra: HashMap::new(),
        }
    }
}

/// A parsed Java compilation unit: source text, syntax tree and line table.
pub struct CompilationUnit {
    pub path: PathBuf,
    source: String,
    tree: Tree,
    /// Byte offsets where each line starts.
    line_starts: Vec<usize>,
    pub options: CompilerOptions,
}

impl std::fmt::Debug for CompilationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilationUnit")
            .field("path", &self.path)
            .field("len", &self.source.len())
            .field("options", &self.options)
            .finish()
    }
}

impl CompilationUnit {
    pub fn from_path(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_string(path.to_path_buf(), source)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Parse source text, using `path` for display purposes.
    pub fn from_string(path: PathBuf, source: String) -> Result<Self> {
        let tree = parse_java(&source)?;
        let line_starts = compute_line_starts(source.as_bytes());
        Ok(Self {
            path,
            source,
            tree,
            line_starts,
            options: CompilerOptions::default(),
        })
    }

    /// Parse an anonymous snippet (tests, patterns, mined code).
    pub fn parse(source: &str) -> Result<Self> {
        Self::from_string(PathBuf::from("<memory>"), source.to_string())
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> AstNode<'_> {
        AstNode::new(self.tree.root_node(), self)
    }

    pub fn has_syntax_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    pub fn path_str(&self) -> &str {
        self.path.to_str().unwrap_or("<non-utf8 path>")
    }

    /// Text of a byte range, clamped to the source.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.source.len());
        let start = start.min(end);
        self.source.get(start..end).unwrap_or("")
    }

    /// Convert a byte offset into a (1-indexed line, 0-indexed column) pair.
    /// Column is a character offset (UTF-8 codepoint count) within the line.
    pub fn offset_to_line_col(&self, byte_offset: usize) -> (usize, usize) {
        let byte_offset = byte_offset.min(self.source.len());
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_bytes = &self.source.as_bytes()[self.line_starts[line_idx]..byte_offset];
        let col = line_bytes.iter().filter(|&&b| (b & 0xC0) != 0x80).count();
        (line_idx + 1, col)
    }

    /// 1-based line number of a byte offset.
    pub fn line_of(&self, byte_offset: usize) -> usize {
        self.offset_to_line_col(byte_offset).0
    }

    /// Import declarations as `(qualified name, is_static)` pairs, in source
    /// order. On-demand imports keep their `.*` suffix.
    pub fn imports(&self) -> Vec<(String, bool)> {
        self.root()
            .children()
            .into_iter()
            .filter(|n| n.kind() == "import_declaration")
            .map(|n| import_name(&n))
            .collect()
    }

    /// Declared package name, if any.
    pub fn package_name(&self) -> Option<String> {
        self.root()
            .children()
            .into_iter()
            .find(|n| n.kind() == "package_declaration")
            .and_then(|n| {
                n.named_children()
                    .into_iter()
                    .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
                    .map(|c| c.text().to_string())
            })
    }
}

/// `(qualified name, is_static)` for an `import_declaration` node.
pub fn import_name(node: &AstNode<'_>) -> (String, bool) {
    let tokens = node.tokens();
    let is_static = tokens.contains(&"static");
    let mut name = node
        .named_children()
        .into_iter()
        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
        .map(|c| c.text().to_string())
        .unwrap_or_default();
    if node.named_children().iter().any(|c| c.kind() == "asterisk") {
        name.push_str(".*");
    }
    (name, is_static)
}

fn compute_line_starts(source: &[u8]) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, &b) in source.iter().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_conversion() {
        let unit = CompilationUnit::parse("class A {\n  int x;\n}\n").unwrap();
        assert_eq!(unit.offset_to_line_col(0), (1, 0));
        assert_eq!(unit.offset_to_line_col(12), (2, 2));
        assert_eq!(unit.line_of(20), 3);
    }

    #[test]
    fn offset_past_end_is_clamped() {
        let unit = CompilationUnit::parse("class A {}").unwrap();
        assert_eq!(unit.offset_to_line_col(500), (1, 10));
    }

    #[test]
    fn collects_imports_with_static_flag() {
        let unit = CompilationUnit::parse(
            "package a.b;\nimport java.util.List;\nimport static org.junit.Assert.assertEquals;\nimport java.io.*;\nclass A {}",
        )
        .unwrap();
        assert_eq!(
            unit.imports(),
            vec![
                ("java.util.List".to_string(), false),
                ("org.junit.Assert.assertEquals".to_string(), true),
                ("java.io.*".to_string(), false),
            ]
        );
        assert_eq!(unit.package_name().as_deref(), Some("a.b"));
    }

    #[test]
    fn default_source_version() {
        let unit = CompilationUnit::parse("class A {}").unwrap();
        assert_eq!(unit.options.source_version, "1.8");
        let unit = unit.with_options(CompilerOptions::with_source_version("17"));
        assert_eq!(unit.options.source_version, "17");
    }

    #[test]
    fn slice_is_clamped() {
        let unit = CompilationUnit::parse("class A {}").unwrap();
        assert_eq!(unit.slice(0, 5), "class");
        assert_eq!(unit.slice(8, 100), "{}");
        assert_eq!(unit.slice(50, 60), "");
    }
}
