use std::collections::{BTreeMap, HashMap};

use super::{Match, collect_node_matches};
use crate::error::PatternError;
use crate::parse::CompilationUnit;
use crate::pattern::{ParsedPattern, PatternKind, PatternParser};
use crate::rule::TransformationRule;

/// Source patterns of many rules, parsed once and grouped by kind so a
/// single walk of a unit serves all of them.
#[derive(Debug)]
pub struct PatternIndex {
    /// Parsed patterns in rule order, paired with the rule index.
    entries: Vec<(usize, ParsedPattern)>,
    by_kind: HashMap<PatternKind, Vec<usize>>,
}

impl PatternIndex {
    /// Fails on the first rule whose pattern does not parse.
    pub fn new(rules: &[TransformationRule]) -> Result<Self, PatternError> {
        let parser = PatternParser::new();
        let mut entries = Vec::with_capacity(rules.len());
        let mut by_kind: HashMap<PatternKind, Vec<usize>> = HashMap::new();
        for (rule_index, rule) in rules.iter().enumerate() {
            let parsed = parser.parse(&rule.source_pattern)?;
            by_kind
                .entry(parsed.kind())
                .or_default()
                .push(entries.len());
            entries.push((rule_index, parsed));
        }
        Ok(Self { entries, by_kind })
    }

    /// Number of indexed patterns.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Number of distinct pattern kinds.
    pub fn kind_count(&self) -> usize {
        self.by_kind.len()
    }

    /// Rule indices whose pattern has `kind`, in rule order.
    pub fn rules_for_kind(&self, kind: PatternKind) -> Vec<usize> {
        self.by_kind
            .get(&kind)
            .map(|slots| slots.iter().map(|&slot| self.entries[slot].0).collect())
            .unwrap_or_default()
    }

    /// All matches of all patterns, keyed by rule index. Each list is in
    /// source order; rules without matches are absent.
    pub fn find_all_matches<'a>(
        &self,
        unit: &'a CompilationUnit,
    ) -> BTreeMap<usize, Vec<Match<'a>>> {
        let mut results: BTreeMap<usize, Vec<Match<'a>>> = BTreeMap::new();
        let mut found = Vec::new();
        for node in unit.root().descendants() {
            for (kind, slots) in &self.by_kind {
                if !kind.accepts(node.kind()) {
                    continue;
                }
                for &slot in slots {
                    let (rule_index, parsed) = &self.entries[slot];
                    collect_node_matches(parsed, node, &mut found);
                    if !found.is_empty() {
                        results.entry(*rule_index).or_default().append(&mut found);
                    }
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;

    fn rule(text: &str, kind: PatternKind) -> TransformationRule {
        TransformationRule::new(Pattern::new(text, kind))
    }

    #[test]
    fn groups_by_kind() {
        let rules = vec![
            rule("$x + 0", PatternKind::Expression),
            rule("$s.trim()", PatternKind::MethodCall),
            rule("$x * 1", PatternKind::Expression),
        ];
        let index = PatternIndex::new(&rules).unwrap();
        assert_eq!(index.size(), 3);
        assert_eq!(index.kind_count(), 2);
        assert_eq!(index.rules_for_kind(PatternKind::Expression), vec![0, 2]);
        assert_eq!(index.rules_for_kind(PatternKind::MethodCall), vec![1]);
        assert!(index.rules_for_kind(PatternKind::Annotation).is_empty());
    }

    #[test]
    fn one_pass_finds_everything() {
        let rules = vec![
            rule("$x + 0", PatternKind::Expression),
            rule("$s.trim()", PatternKind::MethodCall),
            rule("$a; $b;", PatternKind::StatementSequence),
            rule("@Deprecated", PatternKind::Annotation),
        ];
        let index = PatternIndex::new(&rules).unwrap();
        let unit = CompilationUnit::parse(
            "class A { void m() { int r = a + 0; s.trim(); t.trim(); } }",
        )
        .unwrap();
        let found = index.find_all_matches(&unit);
        assert_eq!(found[&0].len(), 1);
        assert_eq!(found[&1].len(), 2);
        assert!(found[&1][0].offset() < found[&1][1].offset());
        assert_eq!(found[&2].len(), 2);
        assert!(!found.contains_key(&3));
    }

    #[test]
    fn malformed_rule_fails_construction() {
        let rules = vec![rule("(((", PatternKind::Expression)];
        assert!(PatternIndex::new(&rules).is_err());
    }
}
