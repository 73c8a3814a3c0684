pub mod batch;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod formatter;
pub mod fs;
pub mod guard;
pub mod hintfile;
pub mod matcher;
pub mod mining;
pub mod parse;
pub mod pattern;
pub mod report;
pub mod rewrite;
pub mod rule;
pub mod runner;

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use cli::Args;
use config::{ResolvedConfig, load_config};
use formatter::create_formatter;
use fs::discover_files;
use hintfile::HintFileRegistry;
use mining::RuleInferenceEngine;
use mining::validate::InferredRuleValidator;
use runner::Runner;

/// Install the global `tracing` subscriber. `RUST_LOG` wins over `--debug`.
pub fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the tool. Returns the exit code: 0 = no matches, 1 = matches found.
pub fn run(args: Args) -> Result<i32> {
    if let Some((before, after)) = args.infer_pair() {
        return infer(before, after, &args);
    }

    let target_dir = args.paths.first().map(|p| {
        if p.is_file() {
            p.parent().unwrap_or(p)
        } else {
            p.as_path()
        }
    });
    let config = load_config(args.config.as_deref(), target_dir)?;
    let source_version = args
        .source_version
        .clone()
        .unwrap_or_else(|| config.source_version().to_string());

    if args.debug {
        match config.config_dir() {
            Some(dir) => eprintln!("debug: config loaded from: {}", dir.display()),
            None => eprintln!("debug: no config file found"),
        }
        eprintln!("debug: source version: {source_version}");
    }

    let registry = build_registry(&args, &config, target_dir.unwrap_or(Path::new(".")))?;

    if args.list_rules {
        list_rules(&registry, &mut std::io::stdout().lock())?;
        return Ok(0);
    }

    let runner = Runner::new(&registry, &config, &source_version)?.with_apply(args.apply);
    if args.debug {
        eprintln!(
            "debug: {} hint files loaded, {} active",
            registry.len(),
            runner.processors().len()
        );
    }

    // --stdin: read from stdin and process a single file
    if let Some(ref display_path) = args.stdin {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        let (result, rewritten) = runner.run_source(display_path, input)?;
        match rewritten {
            Some(text) => print!("{text}"),
            None => create_formatter(&args.format).print(&result.findings, &[display_path.clone()]),
        }
        return Ok(exit_code(&result.findings));
    }

    let files = discover_files(&args.paths, &config)?;
    if args.debug {
        eprintln!("debug: {} files to scan", files.len());
    }

    let result = runner.run(&files)?;
    create_formatter(&args.format).print(&result.findings, &files);
    if args.debug && args.apply {
        eprintln!("debug: {} rewrites applied", result.applied_count);
    }
    Ok(exit_code(&result.findings))
}

fn exit_code(findings: &[diagnostic::Finding]) -> i32 {
    if findings.is_empty() { 0 } else { 1 }
}

/// Bundled libraries (unless disabled), config and command line hint files,
/// then the project's own `*.sandbox-hint` files.
fn build_registry(args: &Args, config: &ResolvedConfig, project_root: &Path) -> Result<HintFileRegistry> {
    let registry = HintFileRegistry::new();
    if config.bundled && !args.no_bundled {
        registry.load_bundled_libraries();
    }
    for path in config.hint_files.iter().chain(&args.hint_files) {
        load_hint_file(&registry, path)?;
    }
    registry.load_project_hint_files(project_root);
    Ok(registry)
}

fn load_hint_file(registry: &HintFileRegistry, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read hint file {}", path.display()))?;
    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    registry
        .load_from_string(&id, &content)
        .with_context(|| format!("failed to parse hint file {}", path.display()))?;
    Ok(())
}

fn list_rules(registry: &HintFileRegistry, out: &mut dyn Write) -> Result<()> {
    for (id, file) in registry.all() {
        let rules = registry.resolve_includes(&file);
        writeln!(out, "{id} ({} rules)", rules.len())?;
        for rule in &rules {
            writeln!(out, "  {}: {}", rule.source_pattern.kind(), rule.label())?;
        }
    }
    Ok(())
}

/// `--infer-before`/`--infer-after`: print the inferred rule as a hint file.
fn infer(before: &Path, after: &Path, args: &Args) -> Result<i32> {
    let read = |p: &Path| std::fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()));
    let before = read(before)?;
    let after = read(after)?;
    let engine = RuleInferenceEngine::new().with_validator(InferredRuleValidator::new());
    let Some(rule) = engine.infer_rule(&before, &after, args.pattern_kind()) else {
        eprintln!("no rule could be inferred");
        return Ok(0);
    };
    if args.debug {
        eprintln!("debug: inferred rule confidence: {:.2}", rule.confidence);
    }
    print!("{}", engine.to_hint_file_string(&[rule]));
    Ok(0)
}
