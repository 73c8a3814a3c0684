use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_yml::Value;

pub const CONFIG_FILE_NAME: &str = ".sandbox-hint.yml";

/// Resolved configuration from `.sandbox-hint.yml`.
///
/// ```yaml
/// sourceVersion: "11"
/// bundled: true
/// hintFiles:
///   - rules/project.sandbox-hint
/// disabledHintFiles:
///   - performance
/// exclude:
///   - "generated/**"
/// ```
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Source level handed to guards; `None` keeps the `1.8` default.
    pub source_version: Option<String>,
    /// Extra hint files, resolved against the config file's directory.
    pub hint_files: Vec<PathBuf>,
    /// Whether the bundled libraries are loaded.
    pub bundled: bool,
    /// Hint file ids that are loaded but never applied.
    pub disabled_hint_files: Vec<String>,
    /// Glob patterns excluded from Java file discovery.
    pub exclude: Vec<String>,
    pub(crate) config_dir: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            source_version: None,
            hint_files: Vec::new(),
            bundled: true,
            disabled_hint_files: Vec::new(),
            exclude: Vec::new(),
            config_dir: None,
        }
    }
}

/// Load config from the given path, or look for `.sandbox-hint.yml` in the
/// target directory (falling back to the current directory). Returns the
/// default config if the file doesn't exist.
pub fn load_config(path: Option<&Path>, target_dir: Option<&Path>) -> Result<ResolvedConfig> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => target_dir
            .unwrap_or_else(|| Path::new("."))
            .join(CONFIG_FILE_NAME),
    };

    if !config_path.exists() {
        return Ok(ResolvedConfig::default());
    }

    let contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config {}", config_path.display()))?;
    let config_dir = config_path
        .parent()
        .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
        .map(Path::to_path_buf);
    parse_config(&contents, config_dir)
        .with_context(|| format!("failed to parse {}", config_path.display()))
}

fn parse_config(contents: &str, config_dir: Option<PathBuf>) -> Result<ResolvedConfig> {
    let raw: Value = serde_yml::from_str(contents)?;
    let mut config = ResolvedConfig {
        config_dir: config_dir.clone(),
        ..ResolvedConfig::default()
    };

    let Value::Mapping(map) = &raw else {
        // An empty file parses to null.
        if raw.is_null() {
            return Ok(config);
        }
        anyhow::bail!("expected a mapping at the top level");
    };

    for (key, value) in map {
        let Some(key) = key.as_str() else {
            continue;
        };
        match key {
            "sourceVersion" => {
                config.source_version = match value {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Null => None,
                    _ => anyhow::bail!("sourceVersion must be a string or number"),
                };
            }
            "bundled" => {
                config.bundled = value
                    .as_bool()
                    .context("bundled must be true or false")?;
            }
            "hintFiles" => {
                let base = config_dir.clone().unwrap_or_default();
                config.hint_files = string_list(value, key)?
                    .into_iter()
                    .map(|p| base.join(p))
                    .collect();
            }
            "disabledHintFiles" => config.disabled_hint_files = string_list(value, key)?,
            "exclude" => config.exclude = string_list(value, key)?,
            other => {
                tracing::warn!(key = other, "ignoring unknown config key");
            }
        }
    }

    Ok(config)
}

fn string_list(value: &Value, key: &str) -> Result<Vec<String>> {
    let seq = value
        .as_sequence()
        .with_context(|| format!("{key} must be a list"))?;
    Ok(seq
        .iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect())
}

impl ResolvedConfig {
    /// Exclude patterns for file discovery.
    pub fn excludes(&self) -> &[String] {
        &self.exclude
    }

    /// Directory the config file was read from, if one was found.
    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    pub fn is_hint_file_enabled(&self, id: &str) -> bool {
        !self.disabled_hint_files.iter().any(|d| d == id)
    }

    /// Source level to compile against, `1.8` unless configured.
    pub fn source_version(&self) -> &str {
        self.source_version.as_deref().unwrap_or("1.8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_config_returns_defaults() {
        let config = load_config(Some(Path::new("/nonexistent/.sandbox-hint.yml")), None).unwrap();
        assert!(config.excludes().is_empty());
        assert!(config.bundled);
        assert_eq!(config.source_version(), "1.8");
        assert!(config.config_dir().is_none());
    }

    #[test]
    fn reads_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "sourceVersion: 17\nbundled: false\nhintFiles:\n  - rules/a.sandbox-hint\n\
             disabledHintFiles:\n  - performance\nexclude:\n  - 'generated/**'\n",
        );
        let config = load_config(Some(&path), None).unwrap();
        assert_eq!(config.source_version(), "17");
        assert!(!config.bundled);
        assert_eq!(config.hint_files, vec![dir.path().join("rules/a.sandbox-hint")]);
        assert!(!config.is_hint_file_enabled("performance"));
        assert!(config.is_hint_file_enabled("collections"));
        assert_eq!(config.excludes(), &["generated/**".to_string()]);
        assert_eq!(config.config_dir(), Some(dir.path()));
    }

    #[test]
    fn discovered_in_target_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "sourceVersion: '1.8'\n");
        let config = load_config(None, Some(dir.path())).unwrap();
        assert_eq!(config.source_version(), "1.8");
        assert!(config.config_dir().is_some());
    }

    #[test]
    fn empty_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "");
        let config = load_config(Some(&path), None).unwrap();
        assert!(config.bundled);
    }

    #[test]
    fn wrong_types_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "exclude: generated\n");
        let err = load_config(Some(&path), None).unwrap_err();
        assert!(format!("{err:#}").contains("exclude must be a list"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "colour: blue\nbundled: true\n");
        assert!(load_config(Some(&path), None).unwrap().bundled);
    }
}
