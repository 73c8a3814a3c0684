//! Clusters inferred rules that describe the same rewrite.

use std::collections::HashMap;

use regex::Captures;

use super::InferredRule;
use crate::pattern::PLACEHOLDER_RE;

/// Each extra occurrence keeps this share of the remaining doubt.
const REPEAT_DISCOUNT: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct RuleGroup {
    /// First instance, carrying the aggregated confidence.
    pub generalized_rule: InferredRule,
    pub instances: Vec<InferredRule>,
    pub occurrence_count: usize,
    pub aggregated_confidence: f64,
}

impl RuleGroup {
    fn new(first: InferredRule) -> Self {
        Self {
            generalized_rule: first.clone(),
            aggregated_confidence: first.confidence,
            instances: vec![first],
            occurrence_count: 1,
        }
    }

    fn push(&mut self, rule: InferredRule) {
        self.instances.push(rule);
        self.occurrence_count = self.instances.len();
        let max = self
            .instances
            .iter()
            .map(|r| r.confidence)
            .fold(0.0_f64, f64::max);
        self.aggregated_confidence = aggregate(max, self.occurrence_count);
        self.generalized_rule.confidence = self.aggregated_confidence;
    }
}

/// `1 - (1 - max) * 0.8^(n - 1)`: never below `max`, approaching 1 as
/// the same rewrite keeps showing up.
pub fn aggregate(max_confidence: f64, occurrences: usize) -> f64 {
    let repeats = occurrences.saturating_sub(1) as i32;
    (1.0 - (1.0 - max_confidence) * REPEAT_DISCOUNT.powi(repeats)).clamp(0.0, 1.0)
}

/// Rename placeholders to `$1`, `$2`, ... by first appearance across the
/// source and then the replacement. Variadic placeholders keep their
/// trailing `$`.
pub fn normalize_placeholders(source: &str, replacement: &str) -> (String, String) {
    let mut names: HashMap<String, usize> = HashMap::new();
    let mut rename = |text: &str| {
        PLACEHOLDER_RE
            .replace_all(text, |caps: &Captures| {
                let raw = &caps[0];
                let base = raw.trim_end_matches('$').to_string();
                let next = names.len() + 1;
                let n = *names.entry(base).or_insert(next);
                if raw.len() > 2 && raw.ends_with('$') {
                    format!("${n}$")
                } else {
                    format!("${n}")
                }
            })
            .into_owned()
    };
    let source = rename(source);
    let replacement = rename(replacement);
    (source, replacement)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RuleGrouper;

impl RuleGrouper {
    pub fn new() -> Self {
        Self
    }

    /// Groups in first-seen order.
    pub fn group_similar(&self, rules: &[InferredRule]) -> Vec<RuleGroup> {
        let mut groups: Vec<RuleGroup> = Vec::new();
        let mut by_key: HashMap<(String, String), usize> = HashMap::new();
        for rule in rules {
            let key = normalize_placeholders(&rule.source_pattern, &rule.replacement_pattern);
            match by_key.get(&key) {
                Some(&idx) => groups[idx].push(rule.clone()),
                None => {
                    by_key.insert(key, groups.len());
                    groups.push(RuleGroup::new(rule.clone()));
                }
            }
        }
        groups
    }
}
