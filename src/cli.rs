use std::path::PathBuf;

use clap::Parser;

use crate::pattern::PatternKind;

#[derive(Parser, Debug)]
#[command(
    name = "triggerpattern",
    version,
    about = "Find and rewrite Java code with hint file patterns"
)]
pub struct Args {
    /// Files or directories to scan
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Additional hint file to load (repeatable)
    #[arg(long = "hint-file", value_name = "FILE")]
    pub hint_files: Vec<PathBuf>,

    /// Do not load the bundled hint files
    #[arg(long)]
    pub no_bundled: bool,

    /// Java source level handed to guards (overrides the config file)
    #[arg(long, value_name = "VERSION")]
    pub source_version: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json", "csv"])]
    pub format: String,

    /// Write accepted replacements back to the files
    #[arg(long)]
    pub apply: bool,

    /// List loaded hint files and their rules, then exit
    #[arg(long)]
    pub list_rules: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Read source from stdin, use PATH for display
    #[arg(long, value_name = "PATH")]
    pub stdin: Option<PathBuf>,

    /// Infer a rule from a before/after pair: the old snippet
    #[arg(long, value_name = "FILE", requires = "infer_after")]
    pub infer_before: Option<PathBuf>,

    /// Infer a rule from a before/after pair: the new snippet
    #[arg(long, value_name = "FILE", requires = "infer_before")]
    pub infer_after: Option<PathBuf>,

    /// Pattern kind of the inferred rule
    #[arg(long, value_name = "KIND", default_value = "expression", value_parser = ["expression", "statement", "method-call", "constructor"])]
    pub kind: String,
}

impl Args {
    /// The `--kind` value as a pattern kind.
    pub fn pattern_kind(&self) -> PatternKind {
        match self.kind.as_str() {
            "statement" => PatternKind::Statement,
            "method-call" => PatternKind::MethodCall,
            "constructor" => PatternKind::Constructor,
            _ => PatternKind::Expression,
        }
    }

    /// Both halves of an inference request, when given.
    pub fn infer_pair(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.infer_before.as_ref().zip(self.infer_after.as_ref())
    }
}
