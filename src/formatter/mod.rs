pub mod csv;
pub mod json;
pub mod text;

use std::io::Write;
use std::path::PathBuf;

use crate::diagnostic::Finding;

pub trait Formatter {
    fn format_to(&self, findings: &[Finding], files: &[PathBuf], out: &mut dyn Write);

    fn print(&self, findings: &[Finding], files: &[PathBuf]) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        self.format_to(findings, files, &mut lock);
    }
}

pub fn create_formatter(format: &str) -> Box<dyn Formatter> {
    match format {
        "json" => Box::new(json::JsonFormatter),
        "csv" => Box::new(csv::CsvFormatter),
        // "text" and any unknown value
        _ => Box::new(text::TextFormatter),
    }
}

#[cfg(test)]
pub(crate) fn sample_finding(path: &str, line: usize, replacement: Option<&str>) -> Finding {
    use crate::diagnostic::{Location, Severity};
    Finding {
        path: path.to_string(),
        location: Location { line, column: 4 },
        offset: 20,
        length: 5,
        severity: Severity::Info,
        hint_file: "collections".to_string(),
        message: "Drop + 0".to_string(),
        matched: "1 + 0".to_string(),
        replacement: replacement.map(str::to_string),
        pattern: "$x + 0".to_string(),
        applied: false,
    }
}
