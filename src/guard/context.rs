use crate::engine::Match;
use crate::matcher::Binding;
use crate::parse::{AstNode, CompilationUnit, CompilerOptions};

/// What a guard may look at: the match, its unit and the compiler options.
#[derive(Clone, Copy)]
pub struct GuardContext<'a> {
    matched: &'a Match<'a>,
    options: &'a CompilerOptions,
}

impl<'a> GuardContext<'a> {
    /// Context using the unit's own compiler options.
    pub fn from_match(matched: &'a Match<'a>) -> Self {
        Self {
            matched,
            options: &matched.unit().options,
        }
    }

    pub fn with_options(matched: &'a Match<'a>, options: &'a CompilerOptions) -> Self {
        Self { matched, options }
    }

    pub fn matched(&self) -> &'a Match<'a> {
        self.matched
    }

    pub fn unit(&self) -> &'a CompilationUnit {
        self.matched.unit()
    }

    pub fn options(&self) -> &'a CompilerOptions {
        self.options
    }

    pub fn source_version(&self) -> &'a str {
        &self.options.source_version
    }

    pub fn binding(&self, name: &str) -> Option<AstNode<'a>> {
        self.matched.binding(name)
    }

    pub fn list_binding(&self, name: &str) -> Option<&'a [AstNode<'a>]> {
        self.matched.list_binding(name)
    }

    pub fn raw_binding(&self, name: &str) -> Option<&'a Binding<'a>> {
        self.matched.bindings().get(name)
    }
}
