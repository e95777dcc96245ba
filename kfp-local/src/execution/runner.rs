// Task Runner
// Runs a caller-ordered list of pipeline tasks one at a time

use crate::config::RunnerConfig;
use crate::error::{KfpError, KfpResult};
use crate::execution::events::{EventSender, ProgressSender, RunEvent};
use crate::executor::{PayloadBuilder, TaskCommand};
use crate::metadata::{FsMetadataStore, MetadataStore, StorageLayout};
use crate::parser::loader::{SpecParser, SpecValidator};
use crate::parser::models::PipelineSpec;
use crate::resolution::{ParameterResolver, TypedValue};
use crate::runners::{Isolation, LaunchOutcome, NoxWrapper, ProcessLauncher, TaskLauncher};

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of one task in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub task: String,
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

impl TaskResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Outcome of a run in which no task failed
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub tasks: Vec<TaskResult>,
    pub duration: Duration,
}

impl RunSummary {
    /// Whether every task also exited cleanly (relevant when non-zero exits are tolerated)
    pub fn all_exited_cleanly(&self) -> bool {
        self.tasks.iter().all(TaskResult::success)
    }
}

/// A task's command line as it would be launched, or why it can't be built yet
#[derive(Debug)]
pub struct TaskPlan {
    pub task: String,
    pub command: KfpResult<TaskCommand>,
}

/// Drives a local run of a loaded pipeline specification
pub struct TaskRunner {
    spec: PipelineSpec,
    config: RunnerConfig,
    store: Arc<dyn MetadataStore>,
    launcher: Option<Arc<dyn TaskLauncher>>,
    event_tx: Option<ProgressSender>,
}

impl TaskRunner {
    /// Load a specification file and check its schema version
    pub fn load(path: impl AsRef<Path>, config: RunnerConfig) -> KfpResult<Self> {
        let spec = SpecParser::load(path)?;
        Self::new(spec, config)
    }

    /// Create a runner for an already decoded specification.
    ///
    /// Uses a filesystem store rooted at the configured working directory.
    pub fn new(spec: PipelineSpec, config: RunnerConfig) -> KfpResult<Self> {
        SpecValidator::check_schema_version(&spec)?;
        let store: Arc<dyn MetadataStore> = Arc::new(FsMetadataStore::new(
            config.layout(),
            config.working_dir.clone(),
        ));

        Ok(Self {
            spec,
            config,
            store,
            launcher: None,
            event_tx: None,
        })
    }

    /// Replace the metadata store
    pub fn with_store(mut self, store: Arc<dyn MetadataStore>) -> Self {
        self.store = store;
        self
    }

    /// Replace the launcher chosen from the configured isolation
    pub fn with_launcher(mut self, launcher: Arc<dyn TaskLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Set progress event sender
    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    fn layout(&self) -> StorageLayout {
        self.config.layout()
    }

    /// Resolve a task input against the outputs recorded so far
    pub fn resolve(&self, task: &str, param: &str) -> KfpResult<TypedValue> {
        ParameterResolver::new(&self.spec, self.store.as_ref()).resolve(task, param)
    }

    /// Build a task's command line with its executor input filled in
    pub fn prepare_task(&self, task: &str) -> KfpResult<TaskCommand> {
        let container = self.spec.executor_for_task(task)?;
        let layout = self.layout();
        let payload = PayloadBuilder::new(&self.spec, self.store.as_ref(), &layout).build_json(task)?;
        TaskCommand::from_template(task, container, &payload)
    }

    /// Build every requested command line without clearing or launching anything.
    ///
    /// Tasks whose inputs depend on outputs not recorded yet carry the error.
    pub fn plan(&self, tasks: &[String]) -> KfpResult<Vec<TaskPlan>> {
        SpecValidator::check_tasks_declared(&self.spec, tasks)?;
        Ok(tasks
            .iter()
            .map(|task| TaskPlan {
                task: task.clone(),
                command: self.prepare_task(task),
            })
            .collect())
    }

    /// Run tasks strictly in the given order.
    ///
    /// Every name is checked before the local root is cleared; the first
    /// failing task stops the run.
    pub async fn run(&self, tasks: &[String]) -> KfpResult<RunSummary> {
        let start = Instant::now();

        SpecValidator::check_tasks_declared(&self.spec, tasks)?;
        let launcher = self.launcher()?;
        self.store.clear()?;

        tracing::info!(
            pipeline = self.spec.name().unwrap_or("<unnamed>"),
            tasks = tasks.len(),
            "starting local run"
        );
        self.event_tx
            .send_event(RunEvent::run_started(self.spec.name(), tasks));

        let mut results = Vec::with_capacity(tasks.len());
        for (index, task) in tasks.iter().enumerate() {
            match self.run_task(launcher.as_ref(), task, index).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    let error = KfpError::task_failed(task, e);
                    tracing::error!(task = %task, "{}", error);
                    self.event_tx
                        .send_event(RunEvent::task_failed(task, error.to_string()));
                    self.event_tx
                        .send_event(RunEvent::run_completed(false, start.elapsed()));
                    return Err(error);
                }
            }
        }

        let duration = start.elapsed();
        self.event_tx
            .send_event(RunEvent::run_completed(true, duration));

        Ok(RunSummary {
            tasks: results,
            duration,
        })
    }

    async fn run_task(
        &self,
        launcher: &dyn TaskLauncher,
        task: &str,
        index: usize,
    ) -> KfpResult<TaskResult> {
        let command = self.prepare_task(task)?;

        tracing::info!(task, "launching task");
        self.event_tx
            .send_event(RunEvent::task_started(task, index, command.command_line()));

        let outcome = launcher
            .launch(&command, &self.config.working_dir, self.event_tx.as_ref())
            .await?;
        self.check_exit(task, &outcome)?;

        tracing::info!(task, exit_code = ?outcome.exit_code, duration = ?outcome.duration, "task finished");
        self.event_tx.send_event(RunEvent::task_completed(
            task,
            outcome.exit_code,
            outcome.duration,
        ));

        Ok(TaskResult {
            task: task.to_string(),
            exit_code: outcome.exit_code,
            duration: outcome.duration,
        })
    }

    fn check_exit(&self, task: &str, outcome: &LaunchOutcome) -> KfpResult<()> {
        if outcome.success() {
            return Ok(());
        }

        if self.config.fail_on_nonzero_exit {
            return Err(KfpError::ProcessExited {
                code: outcome.exit_code,
            });
        }

        tracing::warn!(task, exit_code = ?outcome.exit_code, "task exited unsuccessfully; continuing");
        Ok(())
    }

    fn launcher(&self) -> KfpResult<Arc<dyn TaskLauncher>> {
        if let Some(launcher) = &self.launcher {
            return Ok(Arc::clone(launcher));
        }

        let launcher: Arc<dyn TaskLauncher> = match self.config.isolation {
            Isolation::None => Arc::new(ProcessLauncher::new()),
            Isolation::Nox => Arc::new(ProcessLauncher::with_nox(NoxWrapper::prepare(
                &self.config.working_dir,
            )?)),
        };
        Ok(launcher)
    }
}
