/// A single source-level edit: replace byte range [start..end) with replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Byte offset, inclusive.
    pub start: usize,
    /// Byte offset, exclusive.
    pub end: usize,
    /// Replacement text (empty string = deletion).
    pub replacement: String,
    /// Index of the rule that produced this edit (lower wins ties).
    pub rule_index: usize,
}

impl Edit {
    pub fn new(start: usize, end: usize, replacement: impl Into<String>, rule_index: usize) -> Self {
        Self {
            start,
            end,
            replacement: replacement.into(),
            rule_index,
        }
    }
}

/// A set of non-overlapping edits, sorted by start offset.
///
/// Overlapping edits are resolved by dropping the later one, so of two
/// overlapping statement-sequence rewrites only the earliest applies. When
/// two edits start at the same offset, the one from the earlier rule wins.
#[derive(Debug, Default)]
pub struct EditSet {
    edits: Vec<Edit>,
    dropped: usize,
}

impl EditSet {
    /// Sorts by (start, rule_index), then drops any edit whose range
    /// overlaps with the previously accepted edit.
    pub fn from_vec(mut raw: Vec<Edit>) -> Self {
        raw.sort_by(|a, b| a.start.cmp(&b.start).then(a.rule_index.cmp(&b.rule_index)));

        let mut accepted: Vec<Edit> = Vec::with_capacity(raw.len());
        let mut dropped = 0;
        for e in raw {
            if let Some(last) = accepted.last() {
                if e.start < last.end {
                    dropped += 1;
                    continue;
                }
            }
            accepted.push(e);
        }

        Self {
            edits: accepted,
            dropped,
        }
    }

    /// Apply the edits to `source` in one linear pass.
    ///
    /// Edits are built from match offsets on the same text, so every range
    /// falls on a character boundary.
    pub fn apply(&self, source: &str) -> String {
        let mut result = String::with_capacity(source.len());
        let mut cursor = 0;

        for e in &self.edits {
            if e.start > cursor {
                result.push_str(&source[cursor..e.start]);
            }
            result.push_str(&e.replacement);
            cursor = e.end;
        }

        if cursor < source.len() {
            result.push_str(&source[cursor..]);
        }

        result
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Edits discarded because they overlapped an accepted one.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn edit(start: usize, end: usize, replacement: &str, rule_index: usize) -> Edit {
        Edit::new(start, end, replacement, rule_index)
    }

    #[test]
    fn empty_edits_return_source_unchanged() {
        let es = EditSet::from_vec(vec![]);
        assert_eq!(es.apply("int r = 1 + 0;"), "int r = 1 + 0;");
        assert!(es.is_empty());
        assert_eq!(es.len(), 0);
    }

    #[test]
    fn single_replacement() {
        let es = EditSet::from_vec(vec![edit(8, 13, "1", 0)]);
        assert_eq!(es.apply("int r = 1 + 0;"), "int r = 1;");
        assert_eq!(es.len(), 1);
    }

    #[test]
    fn single_deletion_and_insertion() {
        assert_eq!(EditSet::from_vec(vec![edit(5, 6, "", 0)]).apply("hello world"), "helloworld");
        assert_eq!(EditSet::from_vec(vec![edit(5, 5, ",", 0)]).apply("hello world"), "hello, world");
    }

    #[test]
    fn multiple_non_overlapping_in_any_order() {
        let es = EditSet::from_vec(vec![edit(8, 11, "GHI", 0), edit(0, 3, "ABC", 0)]);
        assert_eq!(es.apply("abc def ghi"), "ABC def GHI");
        assert_eq!(es.len(), 2);
    }

    #[test]
    fn overlapping_drops_later() {
        let es = EditSet::from_vec(vec![edit(2, 6, "XX", 0), edit(4, 8, "YY", 1)]);
        assert_eq!(es.apply("abcdefgh"), "abXXgh");
        assert_eq!(es.len(), 1);
        assert_eq!(es.dropped(), 1);
    }

    #[test]
    fn same_start_lower_rule_wins() {
        let es = EditSet::from_vec(vec![edit(0, 3, "LOSE", 5), edit(0, 3, "WIN", 1)]);
        assert_eq!(es.apply("abc"), "WIN");
    }

    #[test]
    fn adjacent_edits_both_apply() {
        let es = EditSet::from_vec(vec![edit(0, 3, "X", 0), edit(3, 6, "Y", 0)]);
        assert_eq!(es.apply("abcdef"), "XY");
        assert_eq!(es.len(), 2);
    }

    #[test]
    fn edits_at_the_edges() {
        assert_eq!(EditSet::from_vec(vec![edit(0, 0, "X", 0)]).apply("abc"), "Xabc");
        assert_eq!(EditSet::from_vec(vec![edit(3, 3, "X", 0)]).apply("abc"), "abcX");
        assert_eq!(EditSet::from_vec(vec![edit(0, 3, "", 0)]).apply("abc"), "");
        assert_eq!(EditSet::from_vec(vec![edit(0, 0, "hello", 0)]).apply(""), "hello");
    }

    #[test]
    fn multibyte_text_is_preserved() {
        let source = "String s = \"é\" + 0;";
        let start = source.find("0").unwrap();
        let es = EditSet::from_vec(vec![edit(start, start + 1, "1", 0)]);
        assert_eq!(es.apply(source), "String s = \"é\" + 1;");
    }

    proptest! {
        #[test]
        fn accepted_edits_never_overlap(ranges in proptest::collection::vec((0usize..40, 0usize..10), 0..12)) {
            let raw = ranges
                .iter()
                .enumerate()
                .map(|(i, &(start, len))| edit(start, start + len, "x", i))
                .collect();
            let es = EditSet::from_vec(raw);
            for pair in es.edits().windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }
            prop_assert_eq!(es.len() + es.dropped(), ranges.len());
        }

        #[test]
        fn identity_edits_keep_source(text in "[a-z ]{0,30}", cut in 0usize..30) {
            let cut = cut.min(text.len());
            let es = EditSet::from_vec(vec![edit(cut, cut, "", 0)]);
            prop_assert_eq!(es.apply(&text), text);
        }
    }
}
