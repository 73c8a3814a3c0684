//! Guard expressions: boolean conditions over match bindings.
//!
//! ```text
//! $x instanceof String && !isStatic($m) || sourceVersionGE(11)
//! ```
//!
//! `!` binds tighter than `&&`, which binds tighter than `||`. Leaves are
//! calls into a [`GuardRegistry`].

pub mod builtins;
pub mod context;
pub mod lexer;
pub mod parser;
pub mod registry;

use std::fmt;

pub use context::GuardContext;
pub use parser::GuardParser;
pub use registry::{GuardFn, GuardRegistry};

use crate::error::{GuardError, GuardParseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardExpression {
    /// Guard call. Arguments keep their source spelling: `$x`, `"text"`,
    /// `11`, `java.util.List`.
    FunctionCall { name: String, args: Vec<String> },
    And(Box<GuardExpression>, Box<GuardExpression>),
    Or(Box<GuardExpression>, Box<GuardExpression>),
    Not(Box<GuardExpression>),
}

impl GuardExpression {
    /// Parse against the built-in guard set.
    pub fn parse(text: &str) -> Result<Self, GuardParseError> {
        GuardParser::new(&GuardRegistry::default()).parse(text)
    }

    pub fn call(name: impl Into<String>, args: Vec<String>) -> Self {
        GuardExpression::FunctionCall {
            name: name.into(),
            args,
        }
    }

    /// Evaluate with short-circuiting. Errors from guard functions are
    /// returned, not treated as `false`.
    pub fn evaluate(
        &self,
        ctx: &GuardContext<'_>,
        registry: &GuardRegistry,
    ) -> Result<bool, GuardError> {
        match self {
            GuardExpression::FunctionCall { name, args } => registry.call(name, ctx, args),
            GuardExpression::And(l, r) => {
                Ok(l.evaluate(ctx, registry)? && r.evaluate(ctx, registry)?)
            }
            GuardExpression::Or(l, r) => {
                Ok(l.evaluate(ctx, registry)? || r.evaluate(ctx, registry)?)
            }
            GuardExpression::Not(inner) => Ok(!inner.evaluate(ctx, registry)?),
        }
    }

    /// Names of all guard functions the expression calls.
    pub fn function_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'s>(&'s self, out: &mut Vec<&'s str>) {
        match self {
            GuardExpression::FunctionCall { name, .. } => out.push(name),
            GuardExpression::And(l, r) | GuardExpression::Or(l, r) => {
                l.collect_names(out);
                r.collect_names(out);
            }
            GuardExpression::Not(inner) => inner.collect_names(out),
        }
    }
}

impl fmt::Display for GuardExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardExpression::FunctionCall { name, args } => {
                write!(f, "{name}({})", args.join(", "))
            }
            GuardExpression::And(l, r) => write!(f, "({l} && {r})"),
            GuardExpression::Or(l, r) => write!(f, "({l} || {r})"),
            GuardExpression::Not(inner) => write!(f, "!{inner}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_reparseable() {
        let expr = GuardExpression::parse("!isStatic($m) && (sourceVersionGE(11) || isFinal($x))")
            .unwrap();
        let again = GuardExpression::parse(&expr.to_string()).unwrap();
        assert_eq!(expr, again);
    }

    #[test]
    fn function_names_in_order() {
        let expr = GuardExpression::parse("isStatic($a) || !isFinal($b) && matchesAny($c)").unwrap();
        assert_eq!(expr.function_names(), vec!["isStatic", "isFinal", "matchesAny"]);
    }
}
