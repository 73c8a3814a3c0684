use std::io::Write;
use std::path::PathBuf;

use crate::diagnostic::Finding;
use crate::formatter::Formatter;
use crate::report::DryRunReporter;

/// Dry-run report rows, one per finding.
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format_to(&self, findings: &[Finding], _files: &[PathBuf], out: &mut dyn Write) {
        if let Err(e) = DryRunReporter::from_findings(findings).write_csv(out) {
            tracing::warn!(error = %e, "failed to write CSV report");
        }
    }
}
