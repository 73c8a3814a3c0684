//! The built-in guard functions.
//!
//! Without a type checker these work syntactically: types come from
//! literals, creation and cast expressions or declarations in the same
//! unit, and modifiers from the declaration an identifier resolves to.
//! A guard that cannot decide answers `false`.

use super::context::GuardContext;
use super::registry::GuardRegistry;
use crate::error::GuardError;
use crate::parse::AstNode;
use crate::parse::scope::{self, Declaration, ElementKind};

pub fn register_all(registry: &mut GuardRegistry) {
    registry.register("instanceof", instance_of);
    registry.register("matchesAny", matches_any);
    registry.register("matchesNone", |ctx, args| Ok(!matches_any(ctx, args)?));
    registry.register("hasNoSideEffect", has_no_side_effect);
    registry.register("sourceVersionGE", |ctx, args| {
        expect_args("sourceVersionGE", args, 1)?;
        Ok(source_level(ctx.source_version()) >= source_level(&args[0]))
    });
    registry.register("sourceVersionLE", |ctx, args| {
        expect_args("sourceVersionLE", args, 1)?;
        Ok(source_level(ctx.source_version()) <= source_level(&args[0]))
    });
    registry.register("sourceVersionBetween", |ctx, args| {
        expect_args("sourceVersionBetween", args, 2)?;
        let level = source_level(ctx.source_version());
        Ok(level >= source_level(&args[0]) && level <= source_level(&args[1]))
    });
    registry.register("isStatic", |ctx, args| {
        expect_args("isStatic", args, 1)?;
        Ok(declaration_of(ctx, &args[0]).is_some_and(|d| is_static(&d)))
    });
    registry.register("isFinal", |ctx, args| {
        expect_args("isFinal", args, 1)?;
        Ok(declaration_of(ctx, &args[0]).is_some_and(|d| scope::has_modifier(&d.node, "final")))
    });
    registry.register("hasAnnotation", has_annotation);
    registry.register("isDeprecated", |ctx, args| {
        expect_args("isDeprecated", args, 1)?;
        Ok(declaration_of(ctx, &args[0]).is_some_and(|d| is_deprecated(&d)))
    });
    registry.register("referencedIn", referenced_in);
    registry.register("elementKindMatches", element_kind_matches);
    registry.register("contains", contains);
    registry.register("notContains", |ctx, args| Ok(!contains(ctx, args)?));
}

fn expect_args(name: &str, args: &[String], min: usize) -> Result<(), GuardError> {
    if args.len() < min {
        return Err(GuardError::Evaluation {
            name: name.to_string(),
            message: format!("expected at least {min} argument(s), got {}", args.len()),
        });
    }
    Ok(())
}

/// `"1.8"` and `"8"` both mean Java 8; anything unparsable is level 0.
fn source_level(version: &str) -> f64 {
    let version = version.trim().trim_matches('"');
    let version = version.strip_prefix("1.").unwrap_or(version);
    version.parse().unwrap_or(0.0)
}

fn strip_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

/// Literal value for literals (no quotes), source text otherwise.
fn value_text<'a>(node: &AstNode<'a>) -> &'a str {
    let text = node.text();
    match node.kind() {
        "string_literal" => strip_quotes(text),
        "character_literal" => text
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .unwrap_or(text),
        _ => text.trim(),
    }
}

fn declaration_of<'a>(ctx: &GuardContext<'a>, placeholder: &str) -> Option<Declaration<'a>> {
    let node = ctx.binding(placeholder)?;
    scope::resolve(&node).or_else(|| {
        // A declaration bound through a declaration pattern, or a node
        // nested in one.
        node.enclosing_declaration()
            .filter(|d| d.start() == node.start())
            .and_then(|d| scope::resolve(&d))
    })
}

fn is_static(decl: &Declaration<'_>) -> bool {
    if scope::has_modifier(&decl.node, "static") {
        return true;
    }
    // Interface fields are implicitly static.
    decl.kind == ElementKind::Field
        && decl
            .node
            .enclosing_type()
            .is_some_and(|t| t.kind() == "interface_declaration")
}

fn is_deprecated(decl: &Declaration<'_>) -> bool {
    let annotated = scope::annotation_names(&decl.node)
        .iter()
        .any(|n| *n == "Deprecated" || *n == "java.lang.Deprecated");
    annotated || javadoc_of(&decl.node).is_some_and(|doc| doc.contains("@deprecated"))
}

/// The block comment immediately preceding a declaration, if it is a
/// Javadoc comment.
fn javadoc_of<'a>(node: &AstNode<'a>) -> Option<&'a str> {
    let prev = node.raw().prev_sibling()?;
    if prev.kind() != "block_comment" {
        return None;
    }
    let text = node.unit().slice(prev.start_byte(), prev.end_byte());
    text.starts_with("/**").then_some(text)
}

fn instance_of(ctx: &GuardContext<'_>, args: &[String]) -> Result<bool, GuardError> {
    expect_args("instanceof", args, 2)?;
    let Some(node) = ctx.binding(&args[0]) else {
        return Ok(false);
    };
    Ok(scope::static_type(&node).is_some_and(|ty| scope::is_subtype(&ty, &args[1])))
}

fn matches_any(ctx: &GuardContext<'_>, args: &[String]) -> Result<bool, GuardError> {
    expect_args("matchesAny", args, 1)?;
    let name = &args[0];
    if args.len() == 1 {
        return Ok(ctx.binding(name).is_some()
            || ctx.list_binding(name).is_some_and(|l| !l.is_empty()));
    }
    let Some(node) = ctx.binding(name) else {
        return Ok(false);
    };
    let value = value_text(&node);
    Ok(args[1..].iter().any(|lit| strip_quotes(lit) == value))
}

/// Conservative: calls, assignments, increments and object creation may
/// have effects.
fn has_no_side_effect(ctx: &GuardContext<'_>, args: &[String]) -> Result<bool, GuardError> {
    expect_args("hasNoSideEffect", args, 1)?;
    let Some(node) = ctx.binding(&args[0]) else {
        return Ok(true);
    };
    Ok(!node.descendants().iter().any(|n| {
        matches!(
            n.kind(),
            "method_invocation"
                | "assignment_expression"
                | "update_expression"
                | "object_creation_expression"
        )
    }))
}

fn has_annotation(ctx: &GuardContext<'_>, args: &[String]) -> Result<bool, GuardError> {
    expect_args("hasAnnotation", args, 2)?;
    let Some(node) = ctx.binding(&args[0]) else {
        return Ok(false);
    };
    let wanted = strip_quotes(&args[1]).trim_start_matches('@');
    let wanted_simple = wanted.rsplit('.').next().unwrap_or(wanted);
    let Some(decl) = node.enclosing_declaration() else {
        return Ok(false);
    };
    Ok(scope::annotation_names(&decl).iter().any(|name| {
        *name == wanted || name.rsplit('.').next() == Some(wanted_simple)
    }))
}

fn referenced_in(ctx: &GuardContext<'_>, args: &[String]) -> Result<bool, GuardError> {
    expect_args("referencedIn", args, 2)?;
    let (Some(var), Some(expr)) = (ctx.binding(&args[0]), ctx.binding(&args[1])) else {
        return Ok(false);
    };
    let ident = var.text().trim();
    Ok(expr
        .descendants()
        .iter()
        .any(|n| n.kind() == "identifier" && n.text() == ident))
}

fn element_kind_matches(ctx: &GuardContext<'_>, args: &[String]) -> Result<bool, GuardError> {
    expect_args("elementKindMatches", args, 2)?;
    let Some(wanted) = ElementKind::from_str(strip_quotes(&args[1])) else {
        return Ok(false);
    };
    Ok(declaration_of(ctx, &args[0]).is_some_and(|d| d.kind == wanted))
}

/// `contains("text")` searches the body of the method enclosing the match;
/// `contains($x, "text")` the one enclosing `$x`.
fn contains(ctx: &GuardContext<'_>, args: &[String]) -> Result<bool, GuardError> {
    expect_args("contains", args, 1)?;
    let (anchor, needle) = if args.len() >= 2 {
        (ctx.binding(&args[0]), strip_quotes(&args[1]))
    } else {
        (Some(ctx.matched().node()), strip_quotes(&args[0]))
    };
    let body = anchor
        .and_then(|n| n.enclosing_method())
        .and_then(|m| m.child_by_field("body"));
    Ok(body.is_some_and(|b| b.text().contains(needle)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Match, TriggerPatternEngine};
    use crate::guard::GuardExpression;
    use crate::parse::{CompilationUnit, CompilerOptions};
    use crate::pattern::{Pattern, PatternKind};

    /// Evaluate `guard` against every match of `pattern` in `source`.
    fn eval_all(source: &str, pattern: &str, kind: PatternKind, guard: &str) -> Vec<bool> {
        eval_all_with(source, pattern, kind, guard, &CompilerOptions::default())
    }

    fn eval_all_with(
        source: &str,
        pattern: &str,
        kind: PatternKind,
        guard: &str,
        options: &CompilerOptions,
    ) -> Vec<bool> {
        let unit = CompilationUnit::parse(source).unwrap();
        let matches: Vec<Match<'_>> = TriggerPatternEngine::new()
            .find_matches(&unit, &Pattern::new(pattern, kind))
            .unwrap();
        assert!(!matches.is_empty(), "pattern {pattern} did not match");
        let expr = GuardExpression::parse(guard).unwrap();
        let registry = GuardRegistry::builtin();
        matches
            .iter()
            .map(|m| {
                let ctx = GuardContext::with_options(m, options);
                expr.evaluate(&ctx, &registry).unwrap()
            })
            .collect()
    }

    fn eval(source: &str, pattern: &str, kind: PatternKind, guard: &str) -> bool {
        eval_all(source, pattern, kind, guard)[0]
    }

    #[test]
    fn instanceof_from_literals_and_declarations() {
        let src = "class A { void m(java.util.ArrayList<String> list, int n) { String s = \"x\"; f(s); f(list); f(n); f(\"lit\"); } }";
        let results = eval_all(src, "f($x)", PatternKind::MethodCall, "$x instanceof CharSequence");
        assert_eq!(results, vec![true, false, false, true]);
        let results = eval_all(src, "f($x)", PatternKind::MethodCall, "$x instanceof java.util.Collection");
        assert_eq!(results, vec![false, true, false, false]);
    }

    #[test]
    fn instanceof_array() {
        let src = "class A { void m(byte[] data, String[] names) { f(data); f(names); } }";
        assert_eq!(
            eval_all(src, "f($x)", PatternKind::MethodCall, "$x instanceof byte[]"),
            vec![true, false]
        );
    }

    #[test]
    fn matches_any_and_none_on_literal_values() {
        let src = "class A { void m() { f(\"UTF-8\"); f(\"ASCII\"); } }";
        assert_eq!(
            eval_all(src, "f($x)", PatternKind::MethodCall, "matchesAny($x, \"UTF-8\", \"utf-8\")"),
            vec![true, false]
        );
        assert_eq!(
            eval_all(src, "f($x)", PatternKind::MethodCall, "matchesNone($x, \"UTF-8\")"),
            vec![false, true]
        );
    }

    #[test]
    fn matches_any_single_argument_tests_binding() {
        let src = "class A { void m() { f(1); } }";
        assert!(eval(src, "f($x)", PatternKind::MethodCall, "$x"));
        assert!(!eval(src, "f($x)", PatternKind::MethodCall, "matchesAny($missing)"));
        assert!(eval(src, "f($x)", PatternKind::MethodCall, "matchesNone($missing)"));
    }

    #[test]
    fn side_effects() {
        let src = "class A { void m() { f(a + 1); f(g()); f(i++); } }";
        assert_eq!(
            eval_all(src, "f($x)", PatternKind::MethodCall, "hasNoSideEffect($x)"),
            vec![true, false, false]
        );
    }

    #[test]
    fn source_version_comparisons() {
        let src = "class A { void m() { f(1); } }";
        let java8 = CompilerOptions::default();
        let java17 = CompilerOptions::with_source_version("17");
        let check = |guard: &str, opts: &CompilerOptions| {
            eval_all_with(src, "f($x)", PatternKind::MethodCall, guard, opts)[0]
        };
        assert!(check("sourceVersionGE(1.8)", &java8));
        assert!(!check("sourceVersionGE(11)", &java8));
        assert!(check("sourceVersionGE(11)", &java17));
        assert!(check("sourceVersionLE(11)", &java8));
        assert!(check("sourceVersionBetween(9, 17)", &java17));
        assert!(!check("sourceVersionBetween(9, 11)", &java17));
    }

    #[test]
    fn modifiers_through_declarations() {
        let src = "class A { static final int LIMIT = 3; int count; void m(final int p) { f(LIMIT); f(count); f(p); } }";
        assert_eq!(
            eval_all(src, "f($x)", PatternKind::MethodCall, "isStatic($x)"),
            vec![true, false, false]
        );
        assert_eq!(
            eval_all(src, "f($x)", PatternKind::MethodCall, "isFinal($x)"),
            vec![true, false, true]
        );
    }

    #[test]
    fn element_kinds() {
        let src = "class A { int count; void m(int p) { int local = 0; f(count); f(p); f(local); } }";
        assert_eq!(
            eval_all(src, "f($x)", PatternKind::MethodCall, "elementKindMatches($x, FIELD)"),
            vec![true, false, false]
        );
        assert_eq!(
            eval_all(src, "f($x)", PatternKind::MethodCall, "elementKindMatches($x, PARAMETER)"),
            vec![false, true, false]
        );
        assert_eq!(
            eval_all(src, "f($x)", PatternKind::MethodCall, "elementKindMatches($x, LOCAL_VARIABLE)"),
            vec![false, false, true]
        );
    }

    #[test]
    fn annotations_and_deprecation() {
        let src = "class A {\n  @Deprecated void old() { f(1); }\n  /** @deprecated use m */ void older() { f(2); }\n  @Override public String toString() { f(3); return \"\"; }\n  void m() { old(); older(); toString(); }\n}";
        assert_eq!(
            eval_all(src, "f($x)", PatternKind::MethodCall, "hasAnnotation($x, Override)"),
            vec![false, false, true]
        );
        assert_eq!(
            eval_all(src, "$m()", PatternKind::MethodCall, "isDeprecated($m)")
                .into_iter()
                .rev()
                .take(3)
                .collect::<Vec<_>>(),
            vec![false, true, true]
        );
    }

    #[test]
    fn referenced_in_subtree() {
        let src = "class A { void m() { g(x, x + 1); g(x, y + 1); } }";
        assert_eq!(
            eval_all(src, "g($v, $e)", PatternKind::MethodCall, "referencedIn($v, $e)"),
            vec![true, false]
        );
    }

    #[test]
    fn contains_searches_enclosing_method() {
        let src = "class A { void a() { open(); close(); } void b() { open(); } }";
        assert_eq!(
            eval_all(src, "open()", PatternKind::MethodCall, "contains(\"close()\")"),
            vec![true, false]
        );
        assert_eq!(
            eval_all(src, "open()", PatternKind::MethodCall, "notContains(\"close()\")"),
            vec![false, true]
        );
    }

    #[test]
    fn missing_arguments_are_evaluation_errors() {
        let unit = CompilationUnit::parse("class A { void m() { f(1); } }").unwrap();
        let matches = TriggerPatternEngine::new()
            .find_matches(&unit, &Pattern::new("f($x)", PatternKind::MethodCall))
            .unwrap();
        let ctx = GuardContext::from_match(&matches[0]);
        let registry = GuardRegistry::builtin();
        let err = registry.call("instanceof", &ctx, &["$x".to_string()]).unwrap_err();
        assert!(matches!(err, GuardError::Evaluation { ref name, .. } if name == "instanceof"));
    }

    #[test]
    fn version_normalisation() {
        assert_eq!(source_level("1.8"), 8.0);
        assert_eq!(source_level("11"), 11.0);
        assert_eq!(source_level("\"17\""), 17.0);
        assert_eq!(source_level("junk"), 0.0);
    }
}
