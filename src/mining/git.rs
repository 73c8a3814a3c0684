//! What the mining pipeline needs from version control.
//!
//! No implementation ships here: callers plug in whatever reads their
//! history (a `git` subprocess, libgit2, a fixture in tests).

use std::path::Path;

use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: String,
    pub short_id: String,
    pub message: String,
    pub author: String,
    /// Seconds since the epoch.
    pub timestamp: i64,
    pub changed_file_count: usize,
}

impl CommitInfo {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        let id = id.into();
        let short_id = id.chars().take(7).collect();
        Self {
            id,
            short_id,
            message: message.into(),
            author: String::new(),
            timestamp: 0,
            changed_file_count: 0,
        }
    }
}

/// One changed region. Line numbers are 1-based; a count of zero is a
/// pure insertion or deletion on that side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    pub before_start: usize,
    pub before_count: usize,
    pub after_start: usize,
    pub after_count: usize,
    pub before_text: String,
    pub after_text: String,
}

impl DiffHunk {
    pub fn new(before_start: usize, before_count: usize, after_start: usize, after_count: usize) -> Self {
        Self {
            before_start,
            before_count,
            after_start,
            after_count,
            before_text: String::new(),
            after_text: String::new(),
        }
    }

    pub fn with_text(mut self, before_text: impl Into<String>, after_text: impl Into<String>) -> Self {
        self.before_text = before_text.into();
        self.after_text = after_text.into();
        self
    }

    pub fn before_lines(&self) -> std::ops::Range<usize> {
        self.before_start..self.before_start + self.before_count
    }

    pub fn after_lines(&self) -> std::ops::Range<usize> {
        self.after_start..self.after_start + self.after_count
    }
}

/// A file's content on both sides of a commit. A side is `None` when the
/// file was added or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub file_path: String,
    pub content_before: Option<String>,
    pub content_after: Option<String>,
    pub hunks: Vec<DiffHunk>,
}

impl FileDiff {
    pub fn new(
        file_path: impl Into<String>,
        content_before: Option<String>,
        content_after: Option<String>,
        hunks: Vec<DiffHunk>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            content_before,
            content_after,
            hunks,
        }
    }
}

/// Read access to a repository's history. Errors are ordinary `Err`s.
pub trait GitHistoryProvider: Send + Sync {
    /// Newest first, at most `max_commits`.
    fn get_history(&self, repository: &Path, max_commits: usize) -> Result<Vec<CommitInfo>>;

    fn get_diffs(&self, repository: &Path, commit_id: &str) -> Result<Vec<FileDiff>>;

    /// Content of `file_path` as of `commit_id`.
    fn get_file_content(&self, repository: &Path, commit_id: &str, file_path: &str) -> Result<String>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use anyhow::bail;

    use super::*;

    /// History served from memory. Commits listed in `failing` error out.
    #[derive(Debug, Default)]
    pub struct FakeHistory {
        pub commits: Vec<CommitInfo>,
        pub diffs: HashMap<String, Vec<FileDiff>>,
        pub failing: Vec<String>,
    }

    impl FakeHistory {
        pub fn with_commit(mut self, id: &str, diffs: Vec<FileDiff>) -> Self {
            self.commits.push(CommitInfo::new(id, format!("commit {id}")));
            self.diffs.insert(id.to_string(), diffs);
            self
        }

        pub fn with_failing_commit(mut self, id: &str) -> Self {
            self.commits.push(CommitInfo::new(id, "broken"));
            self.failing.push(id.to_string());
            self
        }
    }

    impl GitHistoryProvider for FakeHistory {
        fn get_history(&self, _repository: &Path, max_commits: usize) -> Result<Vec<CommitInfo>> {
            Ok(self.commits.iter().take(max_commits).cloned().collect())
        }

        fn get_diffs(&self, _repository: &Path, commit_id: &str) -> Result<Vec<FileDiff>> {
            if self.failing.iter().any(|f| f == commit_id) {
                bail!("fatal: bad object {commit_id}");
            }
            Ok(self.diffs.get(commit_id).cloned().unwrap_or_default())
        }

        fn get_file_content(&self, _repository: &Path, commit_id: &str, file_path: &str) -> Result<String> {
            self.diffs
                .get(commit_id)
                .and_then(|diffs| diffs.iter().find(|d| d.file_path == file_path))
                .and_then(|d| d.content_after.clone())
                .ok_or_else(|| anyhow::anyhow!("{file_path} not found in {commit_id}"))
        }
    }

    /// A one-statement change inside `class Test { void method() { ... } }`.
    pub fn statement_change(path: &str, before: &str, after: &str) -> FileDiff {
        let wrap = |stmt: &str| format!("class Test {{\n    void method() {{\n        {stmt}\n    }}\n}}\n");
        FileDiff::new(
            path,
            Some(wrap(before)),
            Some(wrap(after)),
            vec![DiffHunk::new(3, 1, 3, 1).with_text(before, after)],
        )
    }

    #[test]
    fn short_id_is_seven_chars() {
        let c = CommitInfo::new("0123456789abcdef", "msg");
        assert_eq!(c.short_id, "0123456");
        assert_eq!(CommitInfo::new("abc", "m").short_id, "abc");
    }

    #[test]
    fn hunk_line_ranges() {
        let h = DiffHunk::new(3, 2, 5, 0);
        assert_eq!(h.before_lines(), 3..5);
        assert!(h.after_lines().is_empty());
    }
}
