//! Dry-run reports: what would be rewritten, without touching any file.

use std::io::{self, Write};

use serde::Serialize;

use crate::batch::TransformationResult;
use crate::diagnostic::{Finding, Severity};

const CSV_HEADER: &[&str] = &[
    "file",
    "line",
    "offset",
    "length",
    "matchedCode",
    "suggestedReplacement",
    "description",
    "severity",
    "pattern",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunEntry {
    pub file: String,
    pub line: usize,
    pub offset: usize,
    pub length: usize,
    pub matched_code: String,
    pub suggested_replacement: Option<String>,
    pub description: String,
    pub severity: String,
    pub pattern: String,
}

impl From<&Finding> for DryRunEntry {
    fn from(f: &Finding) -> Self {
        Self {
            file: f.path.clone(),
            line: f.location.line,
            offset: f.offset,
            length: f.length,
            matched_code: f.matched.clone(),
            suggested_replacement: f.replacement.clone(),
            description: f.message.clone(),
            severity: f.severity.as_str().to_string(),
            pattern: f.pattern.clone(),
        }
    }
}

/// Collects entries across files and writes them as JSON or CSV.
#[derive(Debug, Default)]
pub struct DryRunReporter {
    entries: Vec<DryRunEntry>,
}

impl DryRunReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_findings(findings: &[Finding]) -> Self {
        Self {
            entries: findings.iter().map(DryRunEntry::from).collect(),
        }
    }

    /// Add the results of one processor run over `file`.
    pub fn add_results(&mut self, file: &str, severity: Severity, results: &[TransformationResult]) {
        self.entries.extend(results.iter().map(|r| DryRunEntry {
            file: file.to_string(),
            line: r.line_number,
            offset: r.offset,
            length: r.length,
            matched_code: r.matched_text.clone(),
            suggested_replacement: r.replacement.clone(),
            description: r.label().to_string(),
            severity: severity.as_str().to_string(),
            pattern: r.pattern.clone(),
        }));
    }

    pub fn entries(&self) -> &[DryRunEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }

    pub fn write_json(&self, out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, &self.entries)?;
        writeln!(out)
    }

    pub fn to_csv(&self) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_csv(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    /// RFC 4180 CSV with a header row and CRLF line endings. The header is
    /// written even when there are no entries.
    pub fn write_csv(&self, out: &mut dyn Write) -> io::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(out);
        writer.write_record(CSV_HEADER)?;
        for entry in &self.entries {
            writer.serialize(entry)?;
        }
        writer.flush()
    }
}
