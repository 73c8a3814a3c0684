//! Hint libraries compiled into the binary.

/// `(id, content)` for every bundled library, in load order.
pub const LIBRARIES: &[(&str, &str)] = &[
    (
        "collections",
        include_str!("../../resources/collections.sandbox-hint"),
    ),
    (
        "modernize-java9",
        include_str!("../../resources/modernize-java9.sandbox-hint"),
    ),
    (
        "modernize-java11",
        include_str!("../../resources/modernize-java11.sandbox-hint"),
    ),
    (
        "performance",
        include_str!("../../resources/performance.sandbox-hint"),
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hintfile::HintFileParser;

    #[test]
    fn every_library_parses_and_declares_its_id() {
        let parser = HintFileParser::new();
        for (id, content) in LIBRARIES {
            let file = parser
                .parse(content)
                .unwrap_or_else(|e| panic!("{id}: {e}"));
            assert_eq!(file.id(), *id);
            assert!(!file.rules.is_empty(), "{id} has no rules");
        }
    }

    #[test]
    fn every_rule_pattern_compiles() {
        let parser = HintFileParser::new();
        for (id, content) in LIBRARIES {
            let file = parser.parse(content).unwrap();
            for rule in &file.rules {
                crate::pattern::PatternParser::new()
                    .parse(&rule.source_pattern)
                    .unwrap_or_else(|e| panic!("{id}: {e}"));
            }
        }
    }

    #[test]
    fn explicit_imports_are_kept() {
        let parser = HintFileParser::new();
        let file = parser.parse(LIBRARIES[1].1).unwrap();
        let rule = &file.rules[0];
        let imports = rule.import_directive.as_ref().unwrap();
        assert!(imports.add_imports.contains("java.util.List"));
    }
}
