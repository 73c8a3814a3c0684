use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;

use crate::config::ResolvedConfig;
use crate::hintfile::HINT_FILE_EXTENSION;

/// Build output directories never scanned for project hint files.
const BUILD_DIRS: &[&str] = &["target", "build", "bin", "out", "node_modules"];

/// Discover Java files from the given paths, respecting .gitignore
/// and the configured exclude patterns.
pub fn discover_files(paths: &[PathBuf], config: &ResolvedConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            // Direct file paths bypass extension filtering
            files.push(path.clone());
        } else if path.is_dir() {
            let dir_files = walk_directory(path, config.excludes(), "java")?;
            files.extend(dir_files);
        } else {
            anyhow::bail!("path does not exist: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// `*.sandbox-hint` files below `root`, skipping hidden and build output
/// directories. Sorted.
pub fn discover_hint_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| BUILD_DIRS.contains(&name)))
        });

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry.context("error walking directory")?;
        let path = entry.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == HINT_FILE_EXTENSION)
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn walk_directory(dir: &Path, excludes: &[String], extension: &str) -> Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(dir);
    builder.hidden(true).git_ignore(true).git_global(true);

    if !excludes.is_empty() {
        let mut overrides = OverrideBuilder::new(dir);
        for pattern in excludes {
            // ignore crate overrides: prefix with ! to exclude
            overrides
                .add(&format!("!{pattern}"))
                .with_context(|| format!("invalid exclude pattern: {pattern}"))?;
        }
        let overrides = overrides.build().context("failed to build overrides")?;
        builder.overrides(overrides);
    }

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry.context("error walking directory")?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}
