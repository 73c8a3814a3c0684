use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::batch::{BatchTransformationProcessor, TransformationResult};
use crate::config::ResolvedConfig;
use crate::diagnostic::{Finding, Location};
use crate::hintfile::HintFileRegistry;
use crate::parse::{CompilationUnit, CompilerOptions};
use crate::rewrite::{Edit, EditSet};

pub struct RunResult {
    pub findings: Vec<Finding>,
    pub file_count: usize,
    pub applied_count: usize,
}

/// Everything needed to process one file, built once before the parallel
/// loop.
pub struct Runner {
    processors: Vec<BatchTransformationProcessor>,
    options: CompilerOptions,
    apply: bool,
}

impl Runner {
    /// One processor per enabled hint file that applies at `source_version`,
    /// in id order. Includes are resolved through `registry`.
    pub fn new(registry: &HintFileRegistry, config: &ResolvedConfig, source_version: &str) -> Result<Self> {
        let options = CompilerOptions::with_source_version(source_version);
        let mut processors = Vec::new();
        for (id, file) in registry.all() {
            if !config.is_hint_file_enabled(&id) || !config.is_hint_file_enabled(file.id()) {
                debug!(id, "hint file disabled");
                continue;
            }
            if !file.applies_to(source_version) {
                debug!(id, source_version, "hint file needs a newer source level");
                continue;
            }
            let processor = BatchTransformationProcessor::with_includes(&file, registry)
                .with_context(|| format!("failed to compile hint file {id}"))?
                .with_options(options.clone());
            processors.push(processor);
        }
        Ok(Self {
            processors,
            options,
            apply: false,
        })
    }

    /// Write accepted replacements back to the files.
    pub fn with_apply(mut self, apply: bool) -> Self {
        self.apply = apply;
        self
    }

    pub fn processors(&self) -> &[BatchTransformationProcessor] {
        &self.processors
    }

    /// Process every file in parallel. Findings come back sorted by path and
    /// position. A file that cannot be read or whose guards fail aborts the
    /// run.
    pub fn run(&self, files: &[PathBuf]) -> Result<RunResult> {
        let per_file: Vec<(Vec<Finding>, usize)> = files
            .par_iter()
            .map(|path| self.run_file(path))
            .collect::<Result<_>>()?;

        let mut findings = Vec::new();
        let mut applied_count = 0;
        for (file_findings, applied) in per_file {
            findings.extend(file_findings);
            applied_count += applied;
        }
        findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(RunResult {
            findings,
            file_count: files.len(),
            applied_count,
        })
    }

    fn run_file(&self, path: &Path) -> Result<(Vec<Finding>, usize)> {
        let unit = CompilationUnit::from_path(path)?.with_options(self.options.clone());
        let (mut findings, rewritten) = self.process(&unit)?;
        let Some(rewritten) = rewritten else {
            return Ok((findings, 0));
        };
        if let Err(e) = std::fs::write(path, rewritten) {
            warn!(path = %path.display(), error = %e, "failed to write rewritten file");
            findings.iter_mut().for_each(|f| f.applied = false);
            return Ok((findings, 0));
        }
        let applied = findings.iter().filter(|f| f.applied).count();
        Ok((findings, applied))
    }

    /// Source read from memory (`--stdin`). Nothing is written; with apply
    /// enabled the rewritten text is returned instead.
    pub fn run_source(&self, display_path: &Path, source: String) -> Result<(RunResult, Option<String>)> {
        let unit = CompilationUnit::from_string(display_path.to_path_buf(), source)?
            .with_options(self.options.clone());
        let (mut findings, rewritten) = self.process(&unit)?;
        findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        let applied_count = findings.iter().filter(|f| f.applied).count();
        Ok((
            RunResult {
                findings,
                file_count: 1,
                applied_count,
            },
            rewritten,
        ))
    }

    /// Findings for one unit, plus the rewritten source when apply is on
    /// and at least one edit was accepted.
    pub fn process(&self, unit: &CompilationUnit) -> Result<(Vec<Finding>, Option<String>)> {
        let mut findings = Vec::new();
        // An included file's rules also run under their own id.
        let mut seen = HashSet::new();
        for processor in &self.processors {
            let results = processor
                .process(unit)
                .with_context(|| format!("{}: hint file {}", unit.path_str(), processor.hint_file_id()))?;
            for result in results {
                let key = (result.offset, result.length, result.pattern.clone(), result.replacement.clone());
                if seen.insert(key) {
                    findings.push(to_finding(unit, processor, &result));
                }
            }
        }

        if !self.apply {
            return Ok((findings, None));
        }
        let edits: Vec<Edit> = findings
            .iter()
            .enumerate()
            .filter_map(|(i, f)| {
                let replacement = f.replacement.as_ref()?;
                Some(Edit::new(f.offset, f.offset + f.length, replacement.clone(), i))
            })
            .collect();
        if edits.is_empty() {
            return Ok((findings, None));
        }
        let set = EditSet::from_vec(edits);
        let rewritten = set.apply(unit.source());
        if !unit.has_syntax_errors() && CompilationUnit::parse(&rewritten)?.has_syntax_errors() {
            warn!(path = unit.path_str(), "rewrite produced invalid Java, leaving file unchanged");
            return Ok((findings, None));
        }
        for edit in set.edits() {
            findings[edit.rule_index].applied = true;
        }
        debug!(
            path = unit.path_str(),
            applied = set.len(),
            dropped = set.dropped(),
            "applied rewrites"
        );
        Ok((findings, Some(rewritten)))
    }
}

fn to_finding(unit: &CompilationUnit, processor: &BatchTransformationProcessor, result: &TransformationResult) -> Finding {
    let (line, column) = unit.offset_to_line_col(result.offset);
    Finding {
        path: unit.path_str().to_string(),
        location: Location { line, column },
        offset: result.offset,
        length: result.length,
        severity: processor.severity(),
        hint_file: result.hint_file_id.clone(),
        message: result.label().to_string(),
        matched: result.matched_text.clone(),
        replacement: result.replacement.clone(),
        pattern: result.pattern.clone(),
        applied: false,
    }
}
