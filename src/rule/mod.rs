//! Transformation rules: a source pattern, optional guard and an ordered
//! list of rewrite alternatives.

pub mod imports;

use std::fmt;

pub use imports::ImportDirective;

use crate::error::GuardError;
use crate::guard::{GuardContext, GuardExpression, GuardRegistry};
use crate::pattern::Pattern;

/// One way to rewrite a match. `replacement == None` reports without
/// rewriting; `guard == None` is the unconditional "otherwise" case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteAlternative {
    pub replacement: Option<String>,
    pub guard: Option<GuardExpression>,
}

impl RewriteAlternative {
    pub fn new(replacement: impl Into<String>) -> Self {
        Self {
            replacement: Some(replacement.into()),
            guard: None,
        }
    }

    pub fn guarded(replacement: impl Into<String>, guard: GuardExpression) -> Self {
        Self {
            replacement: Some(replacement.into()),
            guard: Some(guard),
        }
    }

    pub fn is_otherwise(&self) -> bool {
        self.guard.is_none()
    }

    pub fn applies(
        &self,
        ctx: &GuardContext<'_>,
        registry: &GuardRegistry,
    ) -> Result<bool, GuardError> {
        match &self.guard {
            Some(guard) => guard.evaluate(ctx, registry),
            None => Ok(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationRule {
    pub description: Option<String>,
    pub source_pattern: Pattern,
    pub source_guard: Option<GuardExpression>,
    pub alternatives: Vec<RewriteAlternative>,
    pub import_directive: Option<ImportDirective>,
}

impl TransformationRule {
    pub fn new(source_pattern: Pattern) -> Self {
        Self {
            description: None,
            source_pattern,
            source_guard: None,
            alternatives: Vec::new(),
            import_directive: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_guard(mut self, guard: GuardExpression) -> Self {
        self.source_guard = Some(guard);
        self
    }

    pub fn with_alternative(mut self, alternative: RewriteAlternative) -> Self {
        self.alternatives.push(alternative);
        self
    }

    pub fn with_imports(mut self, imports: ImportDirective) -> Self {
        self.import_directive = Some(imports);
        self
    }

    /// A rule without alternatives only reports.
    pub fn is_hint_only(&self) -> bool {
        self.alternatives.is_empty()
    }

    pub fn has_import_directive(&self) -> bool {
        self.import_directive.as_ref().is_some_and(|d| !d.is_empty())
    }

    /// Whether the match passes the rule's own guard.
    pub fn source_guard_passes(
        &self,
        ctx: &GuardContext<'_>,
        registry: &GuardRegistry,
    ) -> Result<bool, GuardError> {
        match &self.source_guard {
            Some(guard) => guard.evaluate(ctx, registry),
            None => Ok(true),
        }
    }

    /// First alternative whose guard passes, in declaration order, with its
    /// index.
    pub fn find_matching_alternative(
        &self,
        ctx: &GuardContext<'_>,
        registry: &GuardRegistry,
    ) -> Result<Option<(usize, &RewriteAlternative)>, GuardError> {
        for (i, alternative) in self.alternatives.iter().enumerate() {
            if alternative.applies(ctx, registry)? {
                return Ok(Some((i, alternative)));
            }
        }
        Ok(None)
    }

    /// Description when present, otherwise the pattern text.
    pub fn label(&self) -> &str {
        self.description
            .as_deref()
            .unwrap_or_else(|| self.source_pattern.value())
    }
}

impl fmt::Display for TransformationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source_pattern.value())?;
        if let Some(guard) = &self.source_guard {
            write!(f, " :: {guard}")?;
        }
        for alternative in &self.alternatives {
            if let Some(replacement) = &alternative.replacement {
                write!(f, " => {replacement}")?;
            }
            if let Some(guard) = &alternative.guard {
                write!(f, " :: {guard}")?;
            }
        }
        Ok(())
    }
}
