use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::diagnostic::Finding;
use crate::formatter::Formatter;
use crate::report::DryRunEntry;

pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonOutput {
    metadata: Metadata,
    matches: Vec<JsonMatch>,
}

#[derive(Serialize)]
struct Metadata {
    files_inspected: usize,
    match_count: usize,
    applied_count: usize,
}

#[derive(Serialize)]
struct JsonMatch {
    #[serde(flatten)]
    entry: DryRunEntry,
    column: usize,
    hint_file: String,
    applied: bool,
}

impl Formatter for JsonFormatter {
    fn format_to(&self, findings: &[Finding], files: &[PathBuf], out: &mut dyn Write) {
        let output = JsonOutput {
            metadata: Metadata {
                files_inspected: files.len(),
                match_count: findings.len(),
                applied_count: findings.iter().filter(|f| f.applied).count(),
            },
            matches: findings
                .iter()
                .map(|f| JsonMatch {
                    entry: DryRunEntry::from(f),
                    column: f.location.column,
                    hint_file: f.hint_file.clone(),
                    applied: f.applied,
                })
                .collect(),
        };
        // Our types always serialize successfully
        if let Ok(json) = serde_json::to_string_pretty(&output) {
            let _ = writeln!(out, "{json}");
        }
    }
}
