//! Drives the mining pipeline from snippets, commits or whole histories.

use std::path::Path;

use anyhow::Result;
use tracing::{debug, warn};

use super::diff::AstDiffAnalyzer;
use super::generalize::PlaceholderGeneralizer;
use super::git::{FileDiff, GitHistoryProvider};
use super::group::RuleGrouper;
use super::hunks::{CodeChangePair, DiffHunkRefiner};
use super::imports::ImportDiffAnalyzer;
use super::validate::InferredRuleValidator;
use super::InferredRule;
use crate::hintfile::{HintFile, parser::render};
use crate::parse::CompilationUnit;
use crate::pattern::{ParsedPattern, Pattern, PatternKind, PatternParser};
use crate::rule::{ImportDirective, RewriteAlternative, TransformationRule};

pub const INFERRED_HINT_FILE_ID: &str = "inferred-rules";

#[derive(Debug, Default, Clone, Copy)]
pub struct RuleInferenceEngine {
    parser: PatternParser,
    diff: AstDiffAnalyzer,
    generalizer: PlaceholderGeneralizer,
    imports: ImportDiffAnalyzer,
    validator: Option<InferredRuleValidator>,
    refiner: DiffHunkRefiner,
    grouper: RuleGrouper,
}

impl RuleInferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator(mut self, validator: InferredRuleValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// A validated rule rewriting `before` into `after`, if one exists.
    pub fn infer_rule(&self, before: &str, after: &str, kind: PatternKind) -> Option<InferredRule> {
        let before = before.trim();
        let after = after.trim();
        if before.is_empty() || after.is_empty() || before == after {
            return None;
        }
        let before_pattern = self.parse_snippet(before, kind)?;
        let after_pattern = self.parse_snippet(after, kind)?;

        let diff = self
            .diff
            .compute_diff(Some(before_pattern.template()), Some(after_pattern.template()));
        let imports = self
            .imports
            .analyze_import_changes(before_pattern.unit(), after_pattern.unit());
        let rule = self
            .generalizer
            .generalize_with_imports(&diff, before, after, kind, imports)?;

        let validation = self.validator.unwrap_or_default().validate(&rule);
        if !validation.is_valid() {
            debug!(
                source = %rule.source_pattern,
                status = %validation.status,
                "discarding inferred rule: {}",
                validation.message
            );
            return None;
        }
        Some(rule)
    }

    pub fn infer_from_pair(&self, pair: &CodeChangePair) -> Option<InferredRule> {
        self.infer_rule(&pair.before_snippet, &pair.after_snippet, pair.inferred_kind)
    }

    /// Rules from every changed statement of one commit, grouped.
    pub fn infer_from_commit(
        &self,
        git: &dyn GitHistoryProvider,
        repository: &Path,
        commit_id: &str,
    ) -> Result<Vec<InferredRule>> {
        let diffs = git.get_diffs(repository, commit_id)?;
        let rules: Vec<InferredRule> = diffs.iter().flat_map(|d| self.infer_from_file(d)).collect();
        debug!(commit = commit_id, files = diffs.len(), rules = rules.len(), "analyzed commit");
        Ok(self.group(rules))
    }

    /// Rules across the last `max_commits` commits. Commits whose diffs
    /// cannot be read are skipped.
    pub fn infer_from_history(
        &self,
        git: &dyn GitHistoryProvider,
        repository: &Path,
        max_commits: usize,
    ) -> Result<Vec<InferredRule>> {
        let commits = git.get_history(repository, max_commits)?;
        let mut rules = Vec::new();
        for commit in &commits {
            match self.infer_from_commit(git, repository, &commit.id) {
                Ok(found) => rules.extend(found),
                Err(e) => warn!(commit = %commit.short_id, "skipping commit: {e:#}"),
            }
        }
        Ok(self.group(rules))
    }

    /// Rules for one changed file. Import changes of the whole file are
    /// attached to the rules whose patterns mention the imported names.
    pub fn infer_from_file(&self, diff: &FileDiff) -> Vec<InferredRule> {
        let file_imports = match (&diff.content_before, &diff.content_after) {
            (Some(before), Some(after)) => match (CompilationUnit::parse(before), CompilationUnit::parse(after)) {
                (Ok(b), Ok(a)) => self.imports.analyze_import_changes(&b, &a),
                _ => None,
            },
            _ => None,
        };
        self.refiner
            .refine_to_statements(diff)
            .iter()
            .filter_map(|pair| self.infer_from_pair(pair))
            .map(|mut rule| {
                if rule.import_directive.is_none() {
                    if let Some(imports) = &file_imports {
                        rule.import_directive = relevant_imports(imports, &rule);
                    }
                }
                rule
            })
            .collect()
    }

    pub fn to_transformation_rule(&self, rule: &InferredRule) -> TransformationRule {
        let source = single_line(&rule.source_pattern);
        let replacement = single_line(&rule.replacement_pattern);
        let mut transformation = TransformationRule::new(Pattern::new(source.clone(), rule.kind))
            .with_description(format!("Inferred: {source} => {replacement}"))
            .with_alternative(RewriteAlternative::new(replacement));
        if let Some(imports) = &rule.import_directive {
            transformation = transformation.with_imports(imports.clone());
        }
        transformation
    }

    pub fn to_hint_file(&self, rules: &[InferredRule]) -> HintFile {
        HintFile {
            id: Some(INFERRED_HINT_FILE_ID.to_string()),
            description: Some("Rules inferred from code changes".to_string()),
            severity: "info".to_string(),
            tags: vec!["inferred".to_string(), "mining".to_string()],
            rules: rules.iter().map(|r| self.to_transformation_rule(r)).collect(),
            ..HintFile::default()
        }
    }

    /// The hint file in `.sandbox-hint` syntax.
    pub fn to_hint_file_string(&self, rules: &[InferredRule]) -> String {
        render(&self.to_hint_file(rules))
    }

    fn parse_snippet(&self, snippet: &str, kind: PatternKind) -> Option<ParsedPattern> {
        match self.parser.parse(&Pattern::new(snippet, kind)) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!(kind = %kind, "snippet does not parse: {e}");
                None
            }
        }
    }

    fn group(&self, rules: Vec<InferredRule>) -> Vec<InferredRule> {
        if rules.len() < 2 {
            return rules;
        }
        self.grouper
            .group_similar(&rules)
            .into_iter()
            .map(|g| g.generalized_rule)
            .collect()
    }
}

/// Hint file rules are line oriented.
fn single_line(text: &str) -> String {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join(" ")
}

fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

fn mentions(text: &str, name: &str) -> bool {
    text.match_indices(name).any(|(i, _)| {
        let before = text[..i].chars().next_back();
        let after = text[i + name.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
            && !after.is_some_and(|c| c.is_alphanumeric() || c == '_')
    })
}

/// The part of a file's import changes that concerns `rule`: additions
/// used by its replacement and removals used by its source.
fn relevant_imports(imports: &ImportDirective, rule: &InferredRule) -> Option<ImportDirective> {
    let mut relevant = ImportDirective::new();
    let used_after = |name: &String| mentions(&rule.replacement_pattern, simple_name(name));
    let used_before = |name: &String| mentions(&rule.source_pattern, simple_name(name));
    imports
        .add_imports
        .iter()
        .filter(|n| used_after(n))
        .for_each(|n| relevant.add_import(n.clone()));
    imports
        .add_static_imports
        .iter()
        .filter(|n| used_after(n))
        .for_each(|n| relevant.add_static_import(n.clone()));
    imports
        .remove_imports
        .iter()
        .filter(|n| used_before(n))
        .for_each(|n| relevant.remove_import(n.clone()));
    imports
        .remove_static_imports
        .iter()
        .filter(|n| used_before(n))
        .for_each(|n| relevant.remove_static_import(n.clone()));
    (!relevant.is_empty()).then_some(relevant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hintfile::HintFileParser;
    use crate::mining::git::testing::{FakeHistory, statement_change};
    use crate::mining::git::DiffHunk;

    const UTF8_BEFORE: &str = "new String(bytes, \"UTF-8\")";
    const UTF8_AFTER: &str = "new String(bytes, StandardCharsets.UTF_8)";

    #[test]
    fn constructor_rewrite() {
        let rule = RuleInferenceEngine::new()
            .infer_rule(UTF8_BEFORE, UTF8_AFTER, PatternKind::Constructor)
            .unwrap();
        assert!(rule.source_pattern.contains("$bytes"));
        assert!(rule.replacement_pattern.contains("$bytes"));
        assert!(rule.confidence > 0.0);
        assert_eq!(rule.kind, PatternKind::Constructor);
    }

    #[test]
    fn method_call_rewrite() {
        let rule = RuleInferenceEngine::new()
            .infer_rule("s.equals(\"\")", "s.isEmpty()", PatternKind::MethodCall)
            .unwrap();
        assert_eq!(rule.source_pattern, "$s.equals(\"\")");
        assert_eq!(rule.replacement_pattern, "$s.isEmpty()");
    }

    #[test]
    fn rejected_inputs() {
        let engine = RuleInferenceEngine::new();
        assert!(engine.infer_rule("a", "a", PatternKind::Expression).is_none());
        assert!(engine.infer_rule("", "b", PatternKind::Expression).is_none());
        assert!(engine.infer_rule("a + + )", "b", PatternKind::Expression).is_none());
        // Top-level kind change scores below the threshold.
        assert!(engine.infer_rule("x + 0", "x", PatternKind::Expression).is_none());
        let lenient = RuleInferenceEngine::new().with_validator(InferredRuleValidator::with_min_confidence(0.0));
        assert!(lenient.infer_rule("x + 0", "x", PatternKind::Expression).is_some());
    }

    #[test]
    fn hint_file_round_trips() {
        let engine = RuleInferenceEngine::new();
        let rule = engine
            .infer_rule(UTF8_BEFORE, UTF8_AFTER, PatternKind::Constructor)
            .unwrap();
        let text = engine.to_hint_file_string(std::slice::from_ref(&rule));
        assert!(text.starts_with("<!id: inferred-rules>\n"));

        let parsed = HintFileParser::new().parse(&text).unwrap();
        assert_eq!(parsed.id(), INFERRED_HINT_FILE_ID);
        assert!(parsed.has_tag("inferred"));
        assert_eq!(parsed.rules.len(), 1);
        let transformation = &parsed.rules[0];
        assert_eq!(transformation.source_pattern.value(), rule.source_pattern);
        assert_eq!(
            transformation.alternatives[0].replacement.as_deref(),
            Some(rule.replacement_pattern.as_str())
        );
        assert!(transformation.label().starts_with("Inferred: "));
    }

    #[test]
    fn transformation_rule_keeps_imports() {
        let mut imports = ImportDirective::new();
        imports.add_import("java.nio.charset.StandardCharsets");
        let rule = InferredRule::new("a", "b", PatternKind::Expression, 0.9, Vec::new()).with_imports(Some(imports));
        let t = RuleInferenceEngine::new().to_transformation_rule(&rule);
        assert!(t.has_import_directive());
        assert_eq!(t.label(), "Inferred: a => b");
    }

    #[test]
    fn commit_rules_are_grouped_and_get_file_imports() {
        let mut first = statement_change(
            "A.java",
            "String s = new String(bytes, \"UTF-8\");",
            "String s = new String(bytes, StandardCharsets.UTF_8);",
        );
        if let Some(after) = first.content_after.as_mut() {
            *after = format!("import java.nio.charset.StandardCharsets;\n{after}");
        }
        first.hunks = vec![DiffHunk::new(3, 1, 4, 1)];
        let second = statement_change(
            "B.java",
            "String s = new String(data, \"UTF-8\");",
            "String s = new String(data, StandardCharsets.UTF_8);",
        );
        let git = FakeHistory::default().with_commit("c1", vec![first, second]);

        let rules = RuleInferenceEngine::new()
            .infer_from_commit(&git, Path::new("."), "c1")
            .unwrap();
        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(rule.source_pattern, "String $s = new String($bytes, \"UTF-8\");");
        let imports = rule.import_directive.as_ref().unwrap();
        assert!(imports.add_imports.contains("java.nio.charset.StandardCharsets"));
        assert!(rule.confidence > 0.85);
    }

    #[test]
    fn history_skips_failing_commits() {
        let git = FakeHistory::default()
            .with_failing_commit("bad")
            .with_commit("good", vec![statement_change("A.java", "Collections.emptyList();", "Collections.emptySet();")]);
        let engine = RuleInferenceEngine::new().with_validator(InferredRuleValidator::with_min_confidence(0.0));
        let rules = engine.infer_from_history(&git, Path::new("."), 10).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].source_pattern, "Collections.emptyList()");

        assert!(engine.infer_from_commit(&git, Path::new("."), "bad").is_err());
    }

    #[test]
    fn mentions_respects_word_boundaries() {
        assert!(mentions("new String($b, StandardCharsets.UTF_8)", "StandardCharsets"));
        assert!(!mentions("MyStandardCharsets.X", "StandardCharsets"));
        assert!(!mentions("$List", "List"));
    }
}
