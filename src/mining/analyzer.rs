//! Per-commit rule mining on a background thread pool.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, TryRecvError, bounded};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::InferredRule;
use super::git::{CommitInfo, GitHistoryProvider};
use super::inference::RuleInferenceEngine;

pub const DEFAULT_MAX_PARALLELISM: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisStatus {
    Pending,
    Analyzing,
    Done,
    NoRules,
    Failed,
}

impl AnalysisStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Done | AnalysisStatus::NoRules | AnalysisStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "PENDING",
            AnalysisStatus::Analyzing => "ANALYZING",
            AnalysisStatus::Done => "DONE",
            AnalysisStatus::NoRules => "NO_RULES",
            AnalysisStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CommitAnalysisResult {
    pub commit_id: String,
    pub status: AnalysisStatus,
    pub rules: Vec<InferredRule>,
    pub elapsed: Duration,
    /// Set when `status` is `Failed`.
    pub error: Option<String>,
}

/// Callbacks for one analyzer. Per commit, `on_analysis_started` fires
/// once, followed by exactly one of the other two.
pub trait CommitAnalysisListener: Send + Sync {
    fn on_analysis_started(&self, _commit_id: &str) {}

    fn on_analysis_complete(&self, _commit_id: &str, _rules: &[InferredRule]) {}

    fn on_analysis_failed(&self, _commit_id: &str, _error: &anyhow::Error) {}
}

/// The pending result of one commit's analysis.
pub struct CommitHandle {
    commit_id: String,
    status: Arc<Mutex<AnalysisStatus>>,
    receiver: Receiver<CommitAnalysisResult>,
}

impl CommitHandle {
    pub fn commit_id(&self) -> &str {
        &self.commit_id
    }

    pub fn status(&self) -> AnalysisStatus {
        *self.status.lock()
    }

    /// Block until the analysis finishes.
    pub fn wait(self) -> CommitAnalysisResult {
        match self.receiver.recv() {
            Ok(result) => result,
            Err(_) => self.abandoned(),
        }
    }

    /// The result, if the analysis has finished.
    pub fn try_result(&self) -> Option<CommitAnalysisResult> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.abandoned()),
        }
    }

    /// The worker went away without reporting.
    fn abandoned(&self) -> CommitAnalysisResult {
        *self.status.lock() = AnalysisStatus::Failed;
        CommitAnalysisResult {
            commit_id: self.commit_id.clone(),
            status: AnalysisStatus::Failed,
            rules: Vec::new(),
            elapsed: Duration::ZERO,
            error: Some("analysis was abandoned".to_string()),
        }
    }
}

impl fmt::Debug for CommitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitHandle")
            .field("commit_id", &self.commit_id)
            .field("status", &self.status())
            .finish()
    }
}

/// Analyzes commits concurrently. A failing or panicking commit is
/// reported as `Failed` and never affects its siblings.
pub struct AsyncCommitAnalyzer {
    git: Arc<dyn GitHistoryProvider>,
    repository: PathBuf,
    listener: Option<Arc<dyn CommitAnalysisListener>>,
    engine: RuleInferenceEngine,
    pool: rayon::ThreadPool,
}

impl AsyncCommitAnalyzer {
    pub fn new(git: Arc<dyn GitHistoryProvider>, repository: impl Into<PathBuf>) -> Result<Self> {
        Self::with_max_parallelism(git, repository, DEFAULT_MAX_PARALLELISM)
    }

    pub fn with_max_parallelism(
        git: Arc<dyn GitHistoryProvider>,
        repository: impl Into<PathBuf>,
        max_parallelism: usize,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_parallelism.max(1))
            .thread_name(|i| format!("commit-analyzer-{i}"))
            .build()
            .context("failed to start commit analysis pool")?;
        Ok(Self {
            git,
            repository: repository.into(),
            listener: None,
            engine: RuleInferenceEngine::new(),
            pool,
        })
    }

    pub fn with_listener(mut self, listener: Arc<dyn CommitAnalysisListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn with_engine(mut self, engine: RuleInferenceEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn analyze_commit(&self, commit: &CommitInfo) -> CommitHandle {
        let status = Arc::new(Mutex::new(AnalysisStatus::Pending));
        let (sender, receiver) = bounded(1);
        let task = AnalysisTask {
            commit_id: commit.id.clone(),
            git: Arc::clone(&self.git),
            repository: self.repository.clone(),
            listener: self.listener.clone(),
            engine: self.engine,
            status: Arc::clone(&status),
        };
        self.pool.spawn(move || {
            let result = task.run();
            // The handle may have been dropped; nobody is waiting then.
            let _ = sender.send(result);
        });
        CommitHandle {
            commit_id: commit.id.clone(),
            status,
            receiver,
        }
    }

    /// One handle per commit, in input order.
    pub fn analyze_all(&self, commits: &[CommitInfo]) -> Vec<CommitHandle> {
        commits.iter().map(|c| self.analyze_commit(c)).collect()
    }
}

impl fmt::Debug for AsyncCommitAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncCommitAnalyzer")
            .field("repository", &self.repository)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

struct AnalysisTask {
    commit_id: String,
    git: Arc<dyn GitHistoryProvider>,
    repository: PathBuf,
    listener: Option<Arc<dyn CommitAnalysisListener>>,
    engine: RuleInferenceEngine,
    status: Arc<Mutex<AnalysisStatus>>,
}

impl AnalysisTask {
    fn run(self) -> CommitAnalysisResult {
        let start = Instant::now();
        *self.status.lock() = AnalysisStatus::Analyzing;
        self.notify("started", |l| l.on_analysis_started(&self.commit_id));

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.engine
                .infer_from_commit(self.git.as_ref(), &self.repository, &self.commit_id)
        }))
        .unwrap_or_else(|panic| Err(anyhow!("analysis panicked: {}", panic_message(panic.as_ref()))));

        let (status, rules, error) = match outcome {
            Ok(rules) => {
                self.notify("complete", |l| l.on_analysis_complete(&self.commit_id, &rules));
                let status = if rules.is_empty() {
                    AnalysisStatus::NoRules
                } else {
                    AnalysisStatus::Done
                };
                debug!(commit = %self.commit_id, rules = rules.len(), "commit analyzed");
                (status, rules, None)
            }
            Err(e) => {
                warn!(commit = %self.commit_id, "commit analysis failed: {e:#}");
                self.notify("failed", |l| l.on_analysis_failed(&self.commit_id, &e));
                (AnalysisStatus::Failed, Vec::new(), Some(format!("{e:#}")))
            }
        };

        *self.status.lock() = status;
        CommitAnalysisResult {
            commit_id: self.commit_id,
            status,
            rules,
            elapsed: start.elapsed(),
            error,
        }
    }
}

impl AnalysisTask {
    /// Call the listener, if any. A panicking listener is logged and does
    /// not stop the task from settling its status and result.
    fn notify(&self, event: &str, call: impl FnOnce(&dyn CommitAnalysisListener)) {
        let Some(listener) = &self.listener else {
            return;
        };
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| call(listener.as_ref()))) {
            warn!(
                commit = %self.commit_id,
                event,
                "analysis listener panicked: {}",
                panic_message(panic.as_ref())
            );
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
