use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::context::GuardContext;
use crate::error::GuardError;

/// A guard implementation: a pure predicate over the match and the raw
/// argument spellings.
pub type GuardFn = Arc<dyn Fn(&GuardContext<'_>, &[String]) -> Result<bool, GuardError> + Send + Sync>;

/// Name-to-function table for guard calls.
///
/// Each instance is independent: registering a custom guard on one
/// registry does not affect any other.
#[derive(Clone)]
pub struct GuardRegistry {
    guards: HashMap<String, GuardFn>,
}

impl GuardRegistry {
    /// A registry with no guards at all.
    pub fn new() -> Self {
        Self {
            guards: HashMap::new(),
        }
    }

    /// A registry holding every built-in guard.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        super::builtins::register_all(&mut registry);
        registry
    }

    /// Add or replace a guard.
    pub fn register<F>(&mut self, name: impl Into<String>, guard: F)
    where
        F: Fn(&GuardContext<'_>, &[String]) -> Result<bool, GuardError> + Send + Sync + 'static,
    {
        self.guards.insert(name.into(), Arc::new(guard));
    }

    pub fn get(&self, name: &str) -> Option<&GuardFn> {
        self.guards.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.guards.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.guards.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    pub fn call(
        &self,
        name: &str,
        ctx: &GuardContext<'_>,
        args: &[String],
    ) -> Result<bool, GuardError> {
        let guard = self
            .guards
            .get(name)
            .ok_or_else(|| GuardError::UnknownFunction(name.to_string()))?;
        guard(ctx, args)
    }
}

impl Default for GuardRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for GuardRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardRegistry")
            .field("guards", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Match, TriggerPatternEngine};
    use crate::parse::CompilationUnit;
    use crate::pattern::{Pattern, PatternKind};

    fn with_first_match(f: impl FnOnce(&Match<'_>)) {
        let unit = CompilationUnit::parse("class A { int x = a + 0; }").unwrap();
        let matches = TriggerPatternEngine::new()
            .find_matches(&unit, &Pattern::new("$x + 0", PatternKind::Expression))
            .unwrap();
        f(&matches[0]);
    }

    #[test]
    fn builtin_set_is_complete() {
        let registry = GuardRegistry::builtin();
        for name in [
            "instanceof",
            "matchesAny",
            "matchesNone",
            "hasNoSideEffect",
            "sourceVersionGE",
            "sourceVersionLE",
            "sourceVersionBetween",
            "isStatic",
            "isFinal",
            "hasAnnotation",
            "isDeprecated",
            "referencedIn",
            "elementKindMatches",
            "contains",
            "notContains",
        ] {
            assert!(registry.contains(name), "missing built-in {name}");
        }
        assert!(GuardRegistry::new().is_empty());
    }

    #[test]
    fn custom_guards_are_scoped_to_their_registry() {
        let mut custom = GuardRegistry::builtin();
        custom.register("isShort", |ctx, args| {
            Ok(ctx.binding(&args[0]).is_some_and(|n| n.text().len() < 3))
        });
        assert!(custom.contains("isShort"));
        assert!(!GuardRegistry::builtin().contains("isShort"));

        with_first_match(|m| {
            let ctx = GuardContext::from_match(m);
            assert!(custom.call("isShort", &ctx, &["$x".to_string()]).unwrap());
        });
    }

    #[test]
    fn unknown_guard_is_an_error() {
        with_first_match(|m| {
            let ctx = GuardContext::from_match(m);
            let err = GuardRegistry::builtin().call("nope", &ctx, &[]).unwrap_err();
            assert_eq!(err, GuardError::UnknownFunction("nope".to_string()));
        });
    }

    #[test]
    fn guard_errors_propagate() {
        let mut registry = GuardRegistry::new();
        registry.register("boom", |_, _| {
            Err(GuardError::Evaluation {
                name: "boom".to_string(),
                message: "exploded".to_string(),
            })
        });
        with_first_match(|m| {
            let ctx = GuardContext::from_match(m);
            assert!(registry.call("boom", &ctx, &[]).is_err());
        });
    }
}
