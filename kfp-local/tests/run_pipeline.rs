// End-to-end runs of the fixture pipeline

use kfp_local::{
    InMemoryMetadataStore, KfpError, KfpResult, LaunchOutcome, MetadataStore, OutputMetadata,
    ProgressSender, RunnerConfig, SpecParser, TaskCommand, TaskLauncher, TaskRunner, TypedValue,
};

use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PIPELINE: &str = include_str!("resources/pipeline.json");

/// Stands in for task processes: records each command and writes the
/// outputs a task would have written
struct FakeLauncher {
    store: Arc<InMemoryMetadataStore>,
    outputs: HashMap<String, OutputMetadata>,
    launched: Mutex<Vec<TaskCommand>>,
}

impl FakeLauncher {
    fn new(store: Arc<InMemoryMetadataStore>) -> Self {
        Self {
            store,
            outputs: HashMap::new(),
            launched: Mutex::new(Vec::new()),
        }
    }

    fn with_output(mut self, task: &str, key: &str, value: Value) -> Self {
        let metadata = self.outputs.remove(task).unwrap_or_default();
        self.outputs
            .insert(task.to_string(), metadata.with_parameter(key, value));
        self
    }

    fn tasks(&self) -> Vec<String> {
        self.launched
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.task.clone())
            .collect()
    }

    /// The executor input each launched task received
    fn payloads(&self) -> Vec<Value> {
        self.launched
            .lock()
            .unwrap()
            .iter()
            .map(|c| {
                let index = c.argv().iter().position(|a| a == "--executor_input").unwrap();
                serde_json::from_str(&c.argv()[index + 1]).unwrap()
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl TaskLauncher for FakeLauncher {
    async fn launch(
        &self,
        command: &TaskCommand,
        _working_dir: &Path,
        _progress: Option<&ProgressSender>,
    ) -> KfpResult<LaunchOutcome> {
        self.launched.lock().unwrap().push(command.clone());
        if let Some(metadata) = self.outputs.get(&command.task) {
            self.store.write(&command.task, metadata)?;
        }
        Ok(LaunchOutcome {
            exit_code: Some(0),
            duration: Duration::ZERO,
        })
    }
}

fn tasks(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn fake_runner(launcher: Arc<FakeLauncher>, store: Arc<InMemoryMetadataStore>) -> TaskRunner {
    let spec = SpecParser::parse(PIPELINE).unwrap();
    TaskRunner::new(spec, RunnerConfig::default())
        .unwrap()
        .with_store(store)
        .with_launcher(launcher)
}

#[tokio::test]
async fn four_task_chain_passes_outputs_downstream() {
    let store = Arc::new(InMemoryMetadataStore::default());
    let launcher = Arc::new(
        FakeLauncher::new(store.clone())
            .with_output("stage-0", "Output", json!(7))
            .with_output("stage-2", "Output", json!({"average": 0.5})),
    );
    let runner = fake_runner(launcher.clone(), store.clone());

    let summary = runner
        .run(&tasks(&["stage-0", "stage-1", "stage-2", "stage-3"]))
        .await
        .unwrap();

    assert_eq!(summary.tasks.len(), 4);
    assert_eq!(launcher.tasks(), tasks(&["stage-0", "stage-1", "stage-2", "stage-3"]));
    assert_eq!(runner.resolve("stage-1", "seed").unwrap(), TypedValue::Integer(7));

    let payloads = launcher.payloads();
    assert_eq!(
        payloads[1]["inputs"]["parameterValues"],
        json!({"n": 1000, "seed": 7})
    );
    assert_eq!(
        payloads[3]["inputs"]["parameterValues"],
        json!({"scale": 2.0, "stats": {"average": 0.5}, "verbose": false})
    );
    assert_eq!(
        payloads[3]["outputs"]["outputFile"],
        json!("object-storage-bucket/stage-3/output_metadata.json")
    );
}

#[tokio::test]
async fn repeated_runs_build_identical_payloads() {
    let store = Arc::new(InMemoryMetadataStore::default());
    let order = tasks(&["stage-0", "stage-1", "stage-2"]);

    let mut runs = Vec::new();
    for _ in 0..2 {
        let launcher = Arc::new(
            FakeLauncher::new(store.clone()).with_output("stage-0", "Output", json!(42)),
        );
        fake_runner(launcher.clone(), store.clone())
            .run(&order)
            .await
            .unwrap();
        let argv: Vec<Vec<String>> = launcher
            .launched
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.argv().to_vec())
            .collect();
        runs.push(argv);
    }

    assert_eq!(runs[0], runs[1]);
}

#[tokio::test]
async fn missing_upstream_output_names_the_failing_task() {
    let store = Arc::new(InMemoryMetadataStore::default());
    let launcher = Arc::new(FakeLauncher::new(store.clone()));
    let runner = fake_runner(launcher.clone(), store);

    let err = runner
        .run(&tasks(&["stage-0", "stage-1", "stage-2"]))
        .await
        .unwrap_err();

    assert_eq!(err.failed_task(), Some("stage-1"));
    assert_eq!(
        err.user_message(),
        "task=stage-1 failed to execute - couldn't find object-storage-bucket/stage-0/output_metadata.json for task=stage-0"
    );
    assert_eq!(launcher.tasks(), tasks(&["stage-0"]));
}

#[tokio::test]
async fn schema_mismatch_stops_before_any_task() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("pipeline.json");
    fs::write(&path, PIPELINE.replace("\"2.1.0\"", "\"3.0.0\"")).unwrap();

    let err = TaskRunner::load(&path, RunnerConfig::default())
        .err()
        .unwrap();

    assert!(matches!(err, KfpError::SchemaVersionMismatch { .. }));
    assert_eq!(
        err.user_message(),
        "schema_version=3.0.0 not supported - please revert to schema_version=2.1.0"
    );
}

#[tokio::test]
async fn undeclared_task_is_reported_and_nothing_launches() {
    let spec: kfp_local::PipelineSpec = serde_json::from_value(json!({
        "schemaVersion": "2.1.0",
        "components": {"comp-stage-0": {"executorLabel": "exec-stage-0"}},
        "deploymentSpec": {"executors": {"exec-stage-0": {"container": {
            "command": ["true"], "args": ["--executor_input", "{{$}}"]
        }}}},
        "root": {"dag": {"tasks": {"stage-0": {"componentRef": {"name": "comp-stage-0"}}}}}
    }))
    .unwrap();
    let store = Arc::new(InMemoryMetadataStore::default());
    let launcher = Arc::new(FakeLauncher::new(store.clone()));
    let runner = TaskRunner::new(spec, RunnerConfig::default())
        .unwrap()
        .with_store(store)
        .with_launcher(launcher.clone());

    let err = runner.run(&tasks(&["ghost-stage"])).await.unwrap_err();

    assert_eq!(
        err.user_message(),
        "missing task defs in pipeline spec: ghost-stage"
    );
    assert!(launcher.tasks().is_empty());
}

#[cfg(unix)]
mod processes {
    use super::*;

    /// Two tasks run by `sh`: `a` writes its output metadata, `b` records the
    /// executor input it received
    fn shell_pipeline(a_script: &str) -> kfp_local::PipelineSpec {
        let executor = |script: &str| {
            json!({"container": {
                "command": ["sh", "-c", script, "sh"],
                "args": ["--executor_input", "{{$}}"]
            }})
        };

        serde_json::from_value(json!({
            "schemaVersion": "2.1.0",
            "components": {
                "comp-a": {"executorLabel": "exec-a"},
                "comp-b": {
                    "executorLabel": "exec-b",
                    "inputDefinitions": {"parameters": {"x": {"parameterType": "NUMBER_INTEGER"}}}
                }
            },
            "deploymentSpec": {"executors": {
                "exec-a": executor(a_script),
                "exec-b": executor("printf '%s' \"$2\" > payload-b.json")
            }},
            "root": {"dag": {"tasks": {
                "a": {"componentRef": {"name": "comp-a"}},
                "b": {
                    "componentRef": {"name": "comp-b"},
                    "dependentTasks": ["a"],
                    "inputs": {"parameters": {"x": {
                        "taskOutputParameter": {"producerTask": "a", "outputParameterKey": "Output"}
                    }}}
                }
            }}}
        }))
        .unwrap()
    }

    const WRITE_OUTPUT: &str = "mkdir -p object-storage-bucket/a && \
        printf '{\"parameterValues\": {\"Output\": 7}}' > object-storage-bucket/a/output_metadata.json";

    #[tokio::test]
    async fn real_processes_exchange_outputs_through_metadata_files() {
        let temp = tempfile::tempdir().unwrap();
        // Left over from an earlier run; must be cleared
        fs::create_dir_all(temp.path().join("object-storage-bucket/stale")).unwrap();

        let runner = TaskRunner::new(
            shell_pipeline(WRITE_OUTPUT),
            RunnerConfig::default().with_working_dir(temp.path()),
        )
        .unwrap();

        runner.run(&tasks(&["a", "b"])).await.unwrap();

        assert!(!temp.path().join("object-storage-bucket/stale").exists());
        assert_eq!(runner.resolve("b", "x").unwrap(), TypedValue::Integer(7));

        let payload: Value =
            serde_json::from_str(&fs::read_to_string(temp.path().join("payload-b.json")).unwrap())
                .unwrap();
        assert_eq!(payload["inputs"]["parameterValues"], json!({"x": 7}));
        assert_eq!(
            payload["outputs"]["outputFile"],
            json!("object-storage-bucket/b/output_metadata.json")
        );
    }

    #[tokio::test]
    async fn nonzero_exit_fails_the_run() {
        let temp = tempfile::tempdir().unwrap();
        let runner = TaskRunner::new(
            shell_pipeline("exit 4"),
            RunnerConfig::default().with_working_dir(temp.path()),
        )
        .unwrap();

        let err = runner.run(&tasks(&["a", "b"])).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "task=a failed to execute - process exited with status 4"
        );
        assert!(!temp.path().join("payload-b.json").exists());
    }

    #[tokio::test]
    async fn nonzero_exit_can_be_tolerated() {
        let temp = tempfile::tempdir().unwrap();
        let script = format!("{}; exit 4", WRITE_OUTPUT);
        let runner = TaskRunner::new(
            shell_pipeline(&script),
            RunnerConfig::default()
                .with_working_dir(temp.path())
                .with_fail_on_nonzero_exit(false),
        )
        .unwrap();

        let summary = runner.run(&tasks(&["a", "b"])).await.unwrap();

        assert_eq!(summary.tasks[0].exit_code, Some(4));
        assert!(!summary.all_exited_cleanly());
        assert!(temp.path().join("payload-b.json").exists());
    }
}
