use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tracing::{debug, info, warn};

use super::{HintFile, HintFileParser, bundled};
use crate::error::HintParseError;
use crate::rule::TransformationRule;

/// Prefix for hint files produced by rule mining.
pub const INFERRED_PREFIX: &str = "inferred:";
/// Prefix an inferred file gets once a person has accepted it.
pub const MANUAL_PREFIX: &str = "manual:";

/// Thread-safe store of hint files keyed by id.
///
/// Owned by whoever drives a run; independent registries share nothing.
#[derive(Debug, Default)]
pub struct HintFileRegistry {
    files: DashMap<String, Arc<HintFile>>,
    /// `<!id: ...>` declared inside a file, to the key it was stored under.
    declared_ids: DashMap<String, String>,
    parser: HintFileParser,
    bundled_loaded: AtomicBool,
    scanned_projects: DashMap<PathBuf, Arc<AtomicBool>>,
}

impl HintFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose parser accepts the guards of `parser`'s registry.
    pub fn with_parser(parser: HintFileParser) -> Self {
        Self {
            parser,
            ..Self::default()
        }
    }

    /// Parse `content` and store it under `id`. A file without its own
    /// `<!id:>` takes `id`.
    pub fn load_from_string(&self, id: &str, content: &str) -> Result<Arc<HintFile>, HintParseError> {
        let mut file = self.parser.parse(content)?;
        if file.id.is_none() {
            file.id = Some(id.to_string());
        }
        Ok(self.register(id, file))
    }

    /// Store an already built file under `id`, replacing any previous one.
    pub fn register(&self, id: &str, file: HintFile) -> Arc<HintFile> {
        let file = Arc::new(file);
        if let Some(declared) = &file.id {
            if declared != id {
                self.declared_ids.insert(declared.clone(), id.to_string());
            }
        }
        debug!(id, rules = file.rules.len(), "registered hint file");
        self.files.insert(id.to_string(), Arc::clone(&file));
        file
    }

    /// Load the bundled libraries. Only the first call does any work; later
    /// calls return an empty list. A bundled file that fails to parse is
    /// logged and skipped.
    pub fn load_bundled_libraries(&self) -> Vec<String> {
        if self
            .bundled_loaded
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Vec::new();
        }
        let mut loaded = Vec::new();
        for (id, content) in bundled::LIBRARIES {
            match self.load_from_string(id, content) {
                Ok(_) => loaded.push(id.to_string()),
                Err(e) => warn!(id, error = %e, "skipping bundled hint file"),
            }
        }
        info!(count = loaded.len(), "loaded bundled hint files");
        loaded
    }

    /// Load every `*.sandbox-hint` file under `root`, once per project
    /// root. Ids are `project:<root name>:<relative path>`. Files that fail
    /// to read or parse are logged and skipped.
    pub fn load_project_hint_files(&self, root: &Path) -> Vec<String> {
        let key = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let flag = Arc::clone(
            self.scanned_projects
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AtomicBool::new(false)))
                .value(),
        );
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(project = %key.display(), "project already scanned");
            return Vec::new();
        }

        let paths = match crate::fs::discover_hint_files(&key) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(project = %key.display(), error = %e, "failed to scan project for hint files");
                return Vec::new();
            }
        };
        let project = key
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut loaded = Vec::new();
        for path in paths {
            let relative = path.strip_prefix(&key).unwrap_or(&path);
            let id = format!(
                "project:{project}:{}",
                relative.to_string_lossy().replace('\\', "/")
            );
            let content = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read hint file");
                    continue;
                }
            };
            match self.load_from_string(&id, &content) {
                Ok(_) => loaded.push(id),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to load hint file"),
            }
        }
        loaded
    }

    /// Forget that `root` was scanned so the next load rescans it.
    pub fn invalidate_project(&self, root: &Path) {
        let key = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        self.scanned_projects.remove(&key);
    }

    pub fn get(&self, id: &str) -> Option<Arc<HintFile>> {
        self.files.get(id).map(|f| Arc::clone(f.value()))
    }

    /// Lookup by registry key, falling back to a declared `<!id:>`.
    fn find(&self, id: &str) -> Option<Arc<HintFile>> {
        self.get(id).or_else(|| {
            let key = self.declared_ids.get(id)?.value().clone();
            self.get(&key)
        })
    }

    /// All files, sorted by id.
    pub fn all(&self) -> Vec<(String, Arc<HintFile>)> {
        let mut all: Vec<_> = self
            .files
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.files.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn unregister(&self, id: &str) -> Option<Arc<HintFile>> {
        let (_, removed) = self.files.remove(id)?;
        if let Some(declared) = &removed.id {
            self.declared_ids.remove_if(declared, |_, key| key == id);
        }
        Some(removed)
    }

    /// Drop everything, including the bundled and per-project load marks.
    pub fn clear(&self) {
        self.files.clear();
        self.declared_ids.clear();
        self.scanned_projects.clear();
        self.bundled_loaded.store(false, Ordering::Release);
    }

    /// The file's own rules followed by those of its includes, depth first.
    /// An id already visited on the way is skipped, as is an id that is not
    /// registered.
    pub fn resolve_includes(&self, file: &HintFile) -> Vec<TransformationRule> {
        let mut rules = file.rules.clone();
        let mut visited = HashSet::new();
        if let Some(id) = &file.id {
            visited.insert(id.clone());
        }
        self.resolve_into(file, &mut rules, &mut visited);
        rules
    }

    fn resolve_into(
        &self,
        file: &HintFile,
        rules: &mut Vec<TransformationRule>,
        visited: &mut HashSet<String>,
    ) {
        for include in &file.includes {
            if !visited.insert(include.clone()) {
                debug!(include, "include already resolved, skipping");
                continue;
            }
            let Some(included) = self.find(include) else {
                debug!(include, "include not registered, skipping");
                continue;
            };
            if let Some(declared) = &included.id {
                visited.insert(declared.clone());
            }
            rules.extend(included.rules.iter().cloned());
            self.resolve_into(&included, rules, visited);
        }
    }

    /// Register mined rules as `inferred:<commit>`, tagged so they can be
    /// told apart from hand-written files.
    pub fn register_inferred_rules(&self, mut file: HintFile, commit_id: &str) -> String {
        let id = format!("{INFERRED_PREFIX}{commit_id}");
        file.id = Some(id.clone());
        for tag in ["inferred", "mining", "commit"] {
            if !file.has_tag(tag) {
                file.tags.push(tag.to_string());
            }
        }
        self.register(&id, file);
        id
    }

    /// Files registered through [`register_inferred_rules`](Self::register_inferred_rules).
    pub fn inferred_hint_files(&self) -> Vec<(String, Arc<HintFile>)> {
        self.all()
            .into_iter()
            .filter(|(id, _)| id.starts_with(INFERRED_PREFIX))
            .collect()
    }

    /// Move an inferred file to `manual:<commit>`. Returns the new id, or
    /// `None` when `id` is not an inferred file.
    pub fn promote_to_manual(&self, id: &str) -> Option<String> {
        let suffix = id.strip_prefix(INFERRED_PREFIX)?;
        let removed = self.unregister(id)?;
        let new_id = format!("{MANUAL_PREFIX}{suffix}");
        let mut file = Arc::unwrap_or_clone(removed);
        file.id = Some(new_id.clone());
        file.tags.retain(|t| t != "inferred");
        if !file.has_tag("manual") {
            file.tags.push("manual".to_string());
        }
        self.register(&new_id, file);
        Some(new_id)
    }
}
