use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// `pkg.sub.Type` with at least two lowercase package segments, so that
/// member accesses like `list.Size` are not taken for type names.
static QUALIFIED_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([a-z][a-z0-9_]*(?:\.[a-z][a-z0-9_]*)+\.[A-Z][A-Za-z0-9_]*)\b")
        .expect("valid regex")
});

/// Import changes that accompany a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportDirective {
    pub add_imports: BTreeSet<String>,
    pub remove_imports: BTreeSet<String>,
    pub add_static_imports: BTreeSet<String>,
    pub remove_static_imports: BTreeSet<String>,
    /// Static imports from one type moved to another, old to new.
    pub replace_static_imports: BTreeMap<String, String>,
}

impl ImportDirective {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_import(&mut self, name: impl Into<String>) {
        self.add_imports.insert(name.into());
    }

    pub fn remove_import(&mut self, name: impl Into<String>) {
        self.remove_imports.insert(name.into());
    }

    pub fn add_static_import(&mut self, name: impl Into<String>) {
        self.add_static_imports.insert(name.into());
    }

    pub fn remove_static_import(&mut self, name: impl Into<String>) {
        self.remove_static_imports.insert(name.into());
    }

    pub fn replace_static_import(&mut self, old_type: impl Into<String>, new_type: impl Into<String>) {
        self.replace_static_imports
            .insert(old_type.into(), new_type.into());
    }

    pub fn is_empty(&self) -> bool {
        self.add_imports.is_empty()
            && self.remove_imports.is_empty()
            && self.add_static_imports.is_empty()
            && self.remove_static_imports.is_empty()
            && self.replace_static_imports.is_empty()
    }

    pub fn merge(&mut self, other: &ImportDirective) {
        self.add_imports.extend(other.add_imports.iter().cloned());
        self.remove_imports.extend(other.remove_imports.iter().cloned());
        self.add_static_imports
            .extend(other.add_static_imports.iter().cloned());
        self.remove_static_imports
            .extend(other.remove_static_imports.iter().cloned());
        self.replace_static_imports.extend(
            other
                .replace_static_imports
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    /// Imports for the fully qualified type names written in `text`,
    /// typically a replacement pattern such as
    /// `java.util.Objects.equals($a, $b)`. Placeholders are never taken
    /// for package names.
    pub fn detect_in(text: &str) -> ImportDirective {
        let mut directive = ImportDirective::new();
        for m in QUALIFIED_NAME_RE.find_iter(text) {
            let preceded_by = text[..m.start()].chars().next_back();
            if matches!(preceded_by, Some('$') | Some('.')) {
                continue;
            }
            directive.add_import(m.as_str());
        }
        directive
    }

    /// One `addImport x` style line per entry, in DSL spelling.
    pub fn directive_lines(&self) -> Vec<String> {
        let groups = [
            ("addImport", &self.add_imports),
            ("removeImport", &self.remove_imports),
            ("addStaticImport", &self.add_static_imports),
            ("removeStaticImport", &self.remove_static_imports),
        ];
        let mut lines: Vec<String> = groups
            .into_iter()
            .flat_map(|(keyword, names)| names.iter().map(move |n| format!("{keyword} {n}")))
            .collect();
        lines.extend(
            self.replace_static_imports
                .iter()
                .map(|(old, new)| format!("replaceStaticImport {old} {new}")),
        );
        lines
    }
}

impl fmt::Display for ImportDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.directive_lines().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_qualified_types() {
        let d = ImportDirective::detect_in("java.util.Objects.equals($a, $b)");
        assert_eq!(d.add_imports.iter().collect::<Vec<_>>(), vec!["java.util.Objects"]);
        assert!(d.remove_imports.is_empty());
    }

    #[test]
    fn ignores_placeholders_and_member_access() {
        assert!(ImportDirective::detect_in("$x.foo.Bar").is_empty());
        assert!(ImportDirective::detect_in("list.Size").is_empty());
        assert!(ImportDirective::detect_in("$s.isEmpty()").is_empty());
    }

    #[test]
    fn detects_several_and_dedups() {
        let d = ImportDirective::detect_in(
            "new String($b, java.nio.charset.StandardCharsets.UTF_8) + java.nio.charset.StandardCharsets.US_ASCII",
        );
        assert_eq!(
            d.add_imports.iter().collect::<Vec<_>>(),
            vec!["java.nio.charset.StandardCharsets"]
        );
    }

    #[test]
    fn merge_unions_all_sets() {
        let mut a = ImportDirective::new();
        a.add_import("java.util.List");
        let mut b = ImportDirective::new();
        b.add_import("java.util.List");
        b.remove_static_import("org.junit.Assert.assertEquals");
        a.merge(&b);
        assert_eq!(a.add_imports.len(), 1);
        assert_eq!(a.remove_static_imports.len(), 1);
        assert!(!a.is_empty());
    }

    #[test]
    fn directive_lines_in_dsl_spelling() {
        let mut d = ImportDirective::new();
        d.add_import("java.util.Objects");
        d.remove_import("com.google.common.base.Objects");
        assert_eq!(
            d.directive_lines(),
            vec![
                "addImport java.util.Objects".to_string(),
                "removeImport com.google.common.base.Objects".to_string(),
            ]
        );
    }
}
