use std::fmt;

use super::InferredRule;
use crate::pattern::placeholders_in;

/// Rules scoring below this are not promoted.
pub const MIN_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationStatus {
    Valid,
    LowConfidence,
    PlaceholderMismatch,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Valid => "VALID",
            ValidationStatus::LowConfidence => "LOW_CONFIDENCE",
            ValidationStatus::PlaceholderMismatch => "PLACEHOLDER_MISMATCH",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    pub message: String,
}

impl ValidationResult {
    fn new(status: ValidationStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }
}

/// Checks an inferred rule before it may enter a hint file.
///
/// Confidence is checked first; [`InferredRuleValidator::placeholder_problem`]
/// exposes the placeholder check on its own.
#[derive(Debug, Clone, Copy)]
pub struct InferredRuleValidator {
    min_confidence: f64,
}

impl Default for InferredRuleValidator {
    fn default() -> Self {
        Self {
            min_confidence: MIN_CONFIDENCE,
        }
    }
}

impl InferredRuleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_confidence(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    pub fn validate(&self, rule: &InferredRule) -> ValidationResult {
        if rule.confidence < self.min_confidence {
            return ValidationResult::new(
                ValidationStatus::LowConfidence,
                format!(
                    "confidence {:.2} is below the threshold {:.2}",
                    rule.confidence, self.min_confidence
                ),
            );
        }
        if let Some(message) = Self::placeholder_problem(rule) {
            return ValidationResult::new(ValidationStatus::PlaceholderMismatch, message);
        }
        ValidationResult::new(ValidationStatus::Valid, "rule is valid")
    }

    /// A placeholder that is declared on the rule or used by the
    /// replacement but never bound by the source pattern.
    pub fn placeholder_problem(rule: &InferredRule) -> Option<String> {
        let bound = placeholders_in(&rule.source_pattern);
        if let Some(missing) = rule.placeholders.iter().find(|p| !bound.contains(p)) {
            return Some(format!("placeholder {missing} does not appear in the source pattern"));
        }
        placeholders_in(&rule.replacement_pattern)
            .into_iter()
            .find(|p| !bound.contains(p))
            .map(|missing| format!("replacement uses {missing}, which the source pattern never binds"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternKind;

    fn rule(source: &str, replacement: &str, confidence: f64, placeholders: &[&str]) -> InferredRule {
        InferredRule::new(
            source,
            replacement,
            PatternKind::Expression,
            confidence,
            placeholders.iter().map(|p| p.to_string()).collect(),
        )
    }

    #[test]
    fn valid_rule() {
        let r = rule("$x + 0", "$x", 0.9, &["$x"]);
        let result = InferredRuleValidator::new().validate(&r);
        assert!(result.is_valid());
        assert_eq!(result.status.to_string(), "VALID");
    }

    #[test]
    fn low_confidence() {
        let r = rule("$x + 0", "$x", 0.3, &["$x"]);
        let result = InferredRuleValidator::new().validate(&r);
        assert_eq!(result.status, ValidationStatus::LowConfidence);
        assert!(result.message.contains("0.30"));
    }

    #[test]
    fn declared_placeholder_missing_from_source() {
        let r = rule("a + 0", "a", 0.9, &["$a"]);
        assert_eq!(
            InferredRuleValidator::new().validate(&r).status,
            ValidationStatus::PlaceholderMismatch
        );
    }

    #[test]
    fn replacement_placeholder_missing_from_source() {
        let r = rule("$x + 0", "$y", 0.9, &["$x"]);
        assert_eq!(
            InferredRuleValidator::new().validate(&r).status,
            ValidationStatus::PlaceholderMismatch
        );
    }

    #[test]
    fn both_problems_are_detectable() {
        let r = rule("$x + 0", "$y", 0.1, &["$x"]);
        assert_eq!(
            InferredRuleValidator::new().validate(&r).status,
            ValidationStatus::LowConfidence
        );
        assert!(InferredRuleValidator::placeholder_problem(&r).is_some());
        let lenient = InferredRuleValidator::with_min_confidence(0.0);
        assert_eq!(lenient.validate(&r).status, ValidationStatus::PlaceholderMismatch);
    }
}
