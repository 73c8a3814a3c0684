use std::collections::BTreeSet;

use crate::parse::CompilationUnit;
use crate::rule::ImportDirective;

/// Import changes between two versions of a file.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImportDiffAnalyzer;

impl ImportDiffAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// `None` when both units import the same names.
    pub fn analyze_import_changes(&self, before: &CompilationUnit, after: &CompilationUnit) -> Option<ImportDirective> {
        let old: BTreeSet<(String, bool)> = before.imports().into_iter().collect();
        let new: BTreeSet<(String, bool)> = after.imports().into_iter().collect();
        if old == new {
            return None;
        }

        let mut directive = ImportDirective::new();
        for (name, is_static) in new.difference(&old) {
            if *is_static {
                directive.add_static_import(name.clone());
            } else {
                directive.add_import(name.clone());
            }
        }
        for (name, is_static) in old.difference(&new) {
            if *is_static {
                directive.remove_static_import(name.clone());
            } else {
                directive.remove_import(name.clone());
            }
        }
        Some(directive)
    }
}
