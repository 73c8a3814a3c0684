use std::io::Write;
use std::path::PathBuf;

use crate::diagnostic::Finding;
use crate::formatter::Formatter;

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_to(&self, findings: &[Finding], files: &[PathBuf], out: &mut dyn Write) {
        for f in findings {
            let _ = writeln!(out, "{f}");
            match (&f.replacement, f.applied) {
                (Some(r), true) => {
                    let _ = writeln!(out, "    {} -> {r} (applied)", f.matched);
                }
                (Some(r), false) => {
                    let _ = writeln!(out, "    {} -> {r}", f.matched);
                }
                (None, _) => {}
            }
        }
        let match_word = if findings.len() == 1 { "match" } else { "matches" };
        let file_count = files.len();
        let file_word = if file_count == 1 { "file" } else { "files" };
        let applied = findings.iter().filter(|f| f.applied).count();
        let _ = write!(
            out,
            "\n{file_count} {file_word} inspected, {} {match_word} found",
            findings.len(),
        );
        if applied > 0 {
            let _ = write!(out, ", {applied} applied");
        }
        let _ = writeln!(out);
    }
}
