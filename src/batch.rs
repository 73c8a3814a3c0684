//! Applies every rule of a hint file to a compilation unit in one walk.

use regex::Captures;
use serde::Serialize;
use tracing::debug;

use crate::diagnostic::Severity;
use crate::engine::{Match, PatternIndex};
use crate::error::{GuardError, PatternError};
use crate::guard::{GuardContext, GuardRegistry};
use crate::hintfile::{HintFile, HintFileRegistry};
use crate::matcher::Bindings;
use crate::parse::{CompilationUnit, CompilerOptions};
use crate::pattern::PLACEHOLDER_RE;
use crate::rewrite::Edit;
use crate::rule::{ImportDirective, TransformationRule};

/// One reported match of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationResult {
    /// Position of the rule in the processor's rule list.
    pub rule_index: usize,
    /// Id of the hint file the processor was built from.
    pub hint_file_id: String,
    pub description: Option<String>,
    pub pattern: String,
    pub offset: usize,
    pub length: usize,
    pub line_number: usize,
    pub matched_text: String,
    /// Replacement with placeholders substituted, when an alternative applied.
    pub replacement: Option<String>,
    /// Index of the alternative that produced `replacement`.
    pub chosen_alternative: Option<usize>,
    #[serde(skip)]
    pub import_directive: Option<ImportDirective>,
}

impl TransformationResult {
    pub fn has_replacement(&self) -> bool {
        self.replacement.is_some()
    }

    /// Description when the rule has one, otherwise its pattern.
    pub fn label(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.pattern)
    }

    /// The text edit this result stands for, if it rewrites anything.
    pub fn to_edit(&self) -> Option<Edit> {
        self.replacement.as_ref().map(|replacement| {
            Edit::new(
                self.offset,
                self.offset + self.length,
                replacement.clone(),
                self.rule_index,
            )
        })
    }
}

/// Substitute `$name` / `$name$` in `template` with the bound source text.
/// Unbound placeholders are left as written.
pub fn substitute(template: &str, bindings: &Bindings<'_>) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            let name = &caps[0];
            match bindings.get(name) {
                Some(binding) => binding.text(),
                // `$x$` written where only `$x` is bound, or the reverse.
                None => match bindings.get(name.trim_end_matches('$')) {
                    Some(binding) if name.ends_with('$') => format!("{}$", binding.text()),
                    _ => name.to_string(),
                },
            }
        })
        .into_owned()
}

/// Rules of a hint file, indexed by pattern kind, ready to run against
/// any number of units.
#[derive(Debug)]
pub struct BatchTransformationProcessor {
    hint_file_id: String,
    severity: Severity,
    rules: Vec<TransformationRule>,
    index: PatternIndex,
    guards: GuardRegistry,
    options: Option<CompilerOptions>,
}

impl BatchTransformationProcessor {
    /// Processor over the file's own rules only.
    pub fn new(hint_file: &HintFile) -> Result<Self, PatternError> {
        Self::from_rules(hint_file, hint_file.rules.clone())
    }

    /// Processor over the file's rules followed by those of its includes.
    pub fn with_includes(hint_file: &HintFile, registry: &HintFileRegistry) -> Result<Self, PatternError> {
        Self::from_rules(hint_file, registry.resolve_includes(hint_file))
    }

    fn from_rules(hint_file: &HintFile, rules: Vec<TransformationRule>) -> Result<Self, PatternError> {
        let index = PatternIndex::new(&rules)?;
        debug!(
            hint_file = hint_file.id(),
            rules = index.size(),
            kinds = index.kind_count(),
            "indexed hint file"
        );
        Ok(Self {
            hint_file_id: hint_file.id().to_string(),
            severity: hint_file.severity_level(),
            rules,
            index,
            guards: GuardRegistry::builtin(),
            options: None,
        })
    }

    /// Evaluate guards with `guards` instead of the built-in set.
    pub fn with_guards(mut self, guards: GuardRegistry) -> Self {
        self.guards = guards;
        self
    }

    /// Evaluate guards against `options` instead of each unit's own.
    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn hint_file_id(&self) -> &str {
        &self.hint_file_id
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn rules(&self) -> &[TransformationRule] {
        &self.rules
    }

    pub fn index(&self) -> &PatternIndex {
        &self.index
    }

    /// Every match that passes its rule's guard, in source order. Results at
    /// the same offset keep rule order. A guard that fails to evaluate
    /// aborts the run.
    pub fn process(&self, unit: &CompilationUnit) -> Result<Vec<TransformationResult>, GuardError> {
        let mut results = Vec::new();
        for (rule_index, matches) in self.index.find_all_matches(unit) {
            let rule = &self.rules[rule_index];
            for m in &matches {
                if let Some(result) = self.evaluate(rule_index, rule, m)? {
                    results.push(result);
                }
            }
        }
        results.sort_by(|a, b| a.offset.cmp(&b.offset).then(a.rule_index.cmp(&b.rule_index)));
        debug!(
            hint_file = %self.hint_file_id,
            path = unit.path_str(),
            results = results.len(),
            "processed unit"
        );
        Ok(results)
    }

    fn evaluate(
        &self,
        rule_index: usize,
        rule: &TransformationRule,
        m: &Match<'_>,
    ) -> Result<Option<TransformationResult>, GuardError> {
        let ctx = match &self.options {
            Some(options) => GuardContext::with_options(m, options),
            None => GuardContext::from_match(m),
        };
        if !rule.source_guard_passes(&ctx, &self.guards)? {
            return Ok(None);
        }

        let chosen = rule.find_matching_alternative(&ctx, &self.guards)?;
        let replacement = chosen
            .and_then(|(_, alt)| alt.replacement.as_deref())
            .map(|template| substitute(template, m.bindings()));

        Ok(Some(TransformationResult {
            rule_index,
            hint_file_id: self.hint_file_id.clone(),
            description: rule.description.clone(),
            pattern: rule.source_pattern.value().to_string(),
            offset: m.offset(),
            length: m.length(),
            line_number: m.line(),
            matched_text: m.matched_text().to_string(),
            chosen_alternative: replacement.as_ref().and(chosen.map(|(i, _)| i)),
            replacement,
            import_directive: rule.import_directive.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TriggerPatternEngine;
    use crate::hintfile::HintFileParser;
    use crate::pattern::{Pattern, PatternKind};

    fn hint(content: &str) -> HintFile {
        HintFileParser::new().parse(content).unwrap()
    }

    fn process(content: &str, source: &str) -> Vec<TransformationResult> {
        let unit = CompilationUnit::parse(source).unwrap();
        BatchTransformationProcessor::new(&hint(content))
            .unwrap()
            .process(&unit)
            .unwrap()
    }

    #[test]
    fn simple_rewrite() {
        let results = process(
            "$x + 0\n=> $x\n;;",
            "class A { void m() { int r = 1 + 0; } }",
        );
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert!(r.has_replacement());
        assert_eq!(r.matched_text, "1 + 0");
        assert_eq!(r.replacement.as_deref(), Some("1"));
        assert_eq!(r.chosen_alternative, Some(0));
        assert_eq!(r.line_number, 1);
    }

    #[test]
    fn hint_only_rule_reports_without_replacement() {
        let results = process("$x + 0\n;;", "class A { int f = 2 + 0; }");
        assert_eq!(results.len(), 1);
        assert!(!results[0].has_replacement());
        assert!(results[0].to_edit().is_none());
    }

    #[test]
    fn failed_source_guard_discards_match() {
        let results = process(
            "$s.length() == 0 :: $s instanceof String\n=> $s.isEmpty()\n;;",
            "class A { void m(java.util.List<String> s, String t) { if (s.length() == 0 || t.length() == 0) {} } }",
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].replacement.as_deref(), Some("t.isEmpty()"));
    }

    #[test]
    fn first_passing_alternative_wins() {
        let rules = "$a.equals($b)\n=> java.util.Objects.equals($a, $b) :: sourceVersionGE(11)\n=> $a == $b :: otherwise\n;;";
        let source = "class A { boolean m(Object a, Object b) { return a.equals(b); } }";

        let old = CompilationUnit::parse(source).unwrap();
        let results = BatchTransformationProcessor::new(&hint(rules))
            .unwrap()
            .process(&old)
            .unwrap();
        assert_eq!(results[0].replacement.as_deref(), Some("a == b"));
        assert_eq!(results[0].chosen_alternative, Some(1));

        let new = CompilationUnit::parse(source)
            .unwrap()
            .with_options(CompilerOptions::with_source_version("17"));
        let results = BatchTransformationProcessor::new(&hint(rules))
            .unwrap()
            .process(&new)
            .unwrap();
        assert_eq!(results[0].replacement.as_deref(), Some("java.util.Objects.equals(a, b)"));
        assert_eq!(results[0].chosen_alternative, Some(0));
        assert!(results[0].import_directive.as_ref().unwrap().add_imports.contains("java.util.Objects"));
    }

    #[test]
    fn no_passing_alternative_is_still_reported() {
        let results = process(
            "$a.equals($b)\n=> java.util.Objects.equals($a, $b) :: sourceVersionGE(11)\n;;",
            "class A { boolean m(Object a, Object b) { return a.equals(b); } }",
        );
        assert_eq!(results.len(), 1);
        assert!(!results[0].has_replacement());
        assert_eq!(results[0].chosen_alternative, None);
    }

    #[test]
    fn options_override_unit_source_level() {
        let unit = CompilationUnit::parse("class A { boolean m(Object a, Object b) { return a.equals(b); } }").unwrap();
        let processor = BatchTransformationProcessor::new(&hint(
            "$a.equals($b)\n=> java.util.Objects.equals($a, $b) :: sourceVersionGE(11)\n;;",
        ))
        .unwrap()
        .with_options(CompilerOptions::with_source_version("17"));
        assert!(processor.process(&unit).unwrap()[0].has_replacement());
    }

    #[test]
    fn results_merge_rules_in_source_order() {
        let results = process(
            "$x * 1\n=> $x\n;;\n$x + 0\n=> $x\n;;",
            "class A { void m() { int a = 1 + 0; int b = 2 * 1; int c = 3 + 0; } }",
        );
        let texts: Vec<_> = results.iter().map(|r| r.matched_text.as_str()).collect();
        assert_eq!(texts, vec!["1 + 0", "2 * 1", "3 + 0"]);
        assert_eq!(results[1].rule_index, 0);
        assert_eq!(results[0].rule_index, 1);
    }

    #[test]
    fn variadic_substitution_joins_arguments() {
        let results = process(
            "Arrays.asList($items$)\n=> List.of($items$)\n;;",
            "class A { Object o = Arrays.asList(1, 2, 3); Object e = Arrays.asList(); }",
        );
        let replacements: Vec<_> = results.iter().map(|r| r.replacement.clone().unwrap()).collect();
        assert_eq!(replacements, vec!["List.of(1, 2, 3)", "List.of()"]);
    }

    #[test]
    fn statement_lists_join_with_spaces() {
        let unit = CompilationUnit::parse("class A { void m() { if (c) { a(); b(); } } }").unwrap();
        let pattern = Pattern::new("if ($c) { $body$; }", PatternKind::Statement);
        let matches = TriggerPatternEngine::new().find_matches(&unit, &pattern).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(
            substitute("while ($c) { $body$ }", matches[0].bindings()),
            "while (c) { a(); b(); }"
        );
    }

    #[test]
    fn unbound_placeholders_are_kept() {
        assert_eq!(substitute("$unknown + 1", &Bindings::new()), "$unknown + 1");
    }

    #[test]
    fn includes_are_processed_after_own_rules() {
        let registry = HintFileRegistry::new();
        registry.load_from_string("base", "$x * 1\n=> $x\n;;").unwrap();
        let top = registry
            .load_from_string("top", "<!include: base>\n$x + 0\n=> $x\n;;")
            .unwrap();
        let processor = BatchTransformationProcessor::with_includes(&top, &registry).unwrap();
        assert_eq!(processor.rules().len(), 2);
        let unit = CompilationUnit::parse("class A { int a = 1 * 1 + 0; }").unwrap();
        assert_eq!(processor.process(&unit).unwrap().len(), 2);
    }

    #[test]
    fn malformed_rule_pattern_fails_at_construction() {
        let file = hint("$x + + )\n;;");
        assert!(BatchTransformationProcessor::new(&file).is_err());
    }
}
