// Compiled Pipeline Specification Models
// Typed view of the pipeline IR: components, executors and the root task graph

use crate::error::{KfpError, KfpResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The only schema version the runner understands
pub const SCHEMA_VERSION: &str = "2.1.0";

/// Output key used when a task output reference omits one
pub const DEFAULT_OUTPUT_KEY: &str = "Output";

/// Root of a compiled pipeline specification
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSpec {
    /// Schema version of the IR document
    pub schema_version: String,

    /// Version of the SDK that compiled the pipeline
    pub sdk_version: Option<String>,

    /// Pipeline name and description
    pub pipeline_info: Option<PipelineInfo>,

    /// Component definitions keyed by component name
    #[serde(default)]
    pub components: BTreeMap<String, ComponentSpec>,

    /// Executor templates
    #[serde(default)]
    pub deployment_spec: DeploymentSpec,

    /// Root component: pipeline inputs and the task graph
    #[serde(default)]
    pub root: RootSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineInfo {
    pub name: Option<String>,
    pub description: Option<String>,
}

// =============================================================================
// Components
// =============================================================================

/// A reusable stage definition
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    /// Name of the executor in `deploymentSpec.executors`
    pub executor_label: Option<String>,

    #[serde(default)]
    pub input_definitions: InterfaceDefinitions,

    #[serde(default)]
    pub output_definitions: InterfaceDefinitions,
}

/// Declared parameters and artifacts of a component or of the pipeline root
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InterfaceDefinitions {
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterSpec>,

    #[serde(default)]
    pub artifacts: BTreeMap<String, ArtifactSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    #[serde(default)]
    pub parameter_type: ParameterType,

    /// Raw default literal, decoded according to `parameter_type`
    pub default_value: Option<serde_json::Value>,

    #[serde(default)]
    pub is_optional: bool,

    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSpec {
    pub artifact_type: Option<ArtifactType>,

    #[serde(default)]
    pub is_artifact_list: bool,

    #[serde(default)]
    pub is_optional: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactType {
    pub schema_title: Option<String>,
    pub schema_version: Option<String>,
}

/// Primitive type of a parameter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParameterType {
    Integer,
    Double,
    Boolean,
    String,
    List,
    Struct,
    TaskFinalStatus,
    #[default]
    Unspecified,
    /// A type name this runner does not know
    Unknown(String),
}

impl ParameterType {
    /// The IR name of the type
    pub fn as_str(&self) -> &str {
        match self {
            ParameterType::Integer => "NUMBER_INTEGER",
            ParameterType::Double => "NUMBER_DOUBLE",
            ParameterType::Boolean => "BOOLEAN",
            ParameterType::String => "STRING",
            ParameterType::List => "LIST",
            ParameterType::Struct => "STRUCT",
            ParameterType::TaskFinalStatus => "TASK_FINAL_STATUS",
            ParameterType::Unspecified => "PARAMETER_TYPE_ENUM_UNSPECIFIED",
            ParameterType::Unknown(name) => name,
        }
    }
}

impl From<String> for ParameterType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "NUMBER_INTEGER" => ParameterType::Integer,
            "NUMBER_DOUBLE" => ParameterType::Double,
            "BOOLEAN" => ParameterType::Boolean,
            "STRING" => ParameterType::String,
            "LIST" => ParameterType::List,
            "STRUCT" => ParameterType::Struct,
            "TASK_FINAL_STATUS" => ParameterType::TaskFinalStatus,
            "PARAMETER_TYPE_ENUM_UNSPECIFIED" | "" => ParameterType::Unspecified,
            _ => ParameterType::Unknown(name),
        }
    }
}

impl From<ParameterType> for String {
    fn from(param_type: ParameterType) -> Self {
        param_type.as_str().to_string()
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Executors
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeploymentSpec {
    #[serde(default)]
    pub executors: BTreeMap<String, ExecutorSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutorSpec {
    pub container: Option<ContainerSpec>,
}

/// Container invocation template for a component
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContainerSpec {
    pub image: Option<String>,

    #[serde(default)]
    pub command: Vec<String>,

    #[serde(default)]
    pub args: Vec<String>,
}

// =============================================================================
// Task graph
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RootSpec {
    /// Pipeline-level inputs and their defaults
    #[serde(default)]
    pub input_definitions: InterfaceDefinitions,

    #[serde(default)]
    pub dag: DagSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DagSpec {
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskSpec>,
}

/// One instantiation of a component in the root graph
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub component_ref: Option<ComponentRef>,

    pub task_info: Option<TaskInfo>,

    /// Upstream tasks (informational; execution order is caller supplied)
    #[serde(default)]
    pub dependent_tasks: Vec<String>,

    #[serde(default)]
    pub inputs: TaskInputs,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ComponentRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskInfo {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskInputs {
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterBinding>,

    #[serde(default)]
    pub artifacts: BTreeMap<String, ArtifactBinding>,
}

/// Where a task's parameter value comes from at run time.
///
/// The IR marks the source by which field is populated. The variant is picked
/// once while decoding, in the order Constant, TaskOutput, PipelineInput; a
/// binding with none of those fields falls back to the component default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawParameterBinding", into = "RawParameterBinding")]
pub enum ParameterBinding {
    /// Literal embedded in the specification
    Constant(serde_json::Value),
    /// Output of an upstream task, read from its output metadata
    TaskOutput {
        producer_task: String,
        output_key: String,
    },
    /// Default value of a pipeline-level input
    PipelineInput(String),
    /// No binding: use the component's declared default
    ComponentDefault,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParameterBinding {
    #[serde(skip_serializing_if = "Option::is_none")]
    runtime_value: Option<RuntimeValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    task_output_parameter: Option<TaskOutputParameter>,

    #[serde(skip_serializing_if = "Option::is_none")]
    component_input_parameter: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RuntimeValue {
    /// `Some(Null)` for an explicit `"constant": null`, `None` when the key is absent
    #[serde(default, deserialize_with = "present_value")]
    #[serde(skip_serializing_if = "Option::is_none")]
    constant: Option<serde_json::Value>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskOutputParameter {
    #[serde(default)]
    producer_task: String,

    #[serde(default)]
    output_parameter_key: String,
}

impl From<RawParameterBinding> for ParameterBinding {
    fn from(raw: RawParameterBinding) -> Self {
        if let Some(constant) = raw.runtime_value.and_then(|v| v.constant) {
            return ParameterBinding::Constant(constant);
        }

        if let Some(output) = raw.task_output_parameter {
            if !output.producer_task.is_empty() {
                let output_key = if output.output_parameter_key.is_empty() {
                    DEFAULT_OUTPUT_KEY.to_string()
                } else {
                    output.output_parameter_key
                };
                return ParameterBinding::TaskOutput {
                    producer_task: output.producer_task,
                    output_key,
                };
            }
        }

        match raw.component_input_parameter {
            Some(name) if !name.is_empty() => ParameterBinding::PipelineInput(name),
            _ => ParameterBinding::ComponentDefault,
        }
    }
}

impl From<ParameterBinding> for RawParameterBinding {
    fn from(binding: ParameterBinding) -> Self {
        match binding {
            ParameterBinding::Constant(constant) => RawParameterBinding {
                runtime_value: Some(RuntimeValue {
                    constant: Some(constant),
                }),
                ..Default::default()
            },
            ParameterBinding::TaskOutput {
                producer_task,
                output_key,
            } => RawParameterBinding {
                task_output_parameter: Some(TaskOutputParameter {
                    producer_task,
                    output_parameter_key: output_key,
                }),
                ..Default::default()
            },
            ParameterBinding::PipelineInput(name) => RawParameterBinding {
                component_input_parameter: Some(name),
                ..Default::default()
            },
            ParameterBinding::ComponentDefault => RawParameterBinding::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactBinding {
    pub task_output_artifact: Option<TaskOutputArtifact>,
    pub component_input_artifact: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutputArtifact {
    pub producer_task: String,
    pub output_artifact_key: String,
}

// =============================================================================
// Lookups
// =============================================================================

impl PipelineSpec {
    /// Pipeline name, if the compiler recorded one
    pub fn name(&self) -> Option<&str> {
        self.pipeline_info.as_ref()?.name.as_deref()
    }

    /// Task names in the root graph
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.root.dag.tasks.keys().map(String::as_str)
    }

    pub fn task(&self, task_name: &str) -> KfpResult<&TaskSpec> {
        self.root
            .dag
            .tasks
            .get(task_name)
            .ok_or_else(|| KfpError::UnknownTask(task_name.to_string()))
    }

    /// Name of the component a task instantiates
    pub fn component_name(&self, task_name: &str) -> KfpResult<String> {
        let task = self.task(task_name)?;
        Ok(task
            .component_ref
            .as_ref()
            .map(|r| r.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("comp-{}", task_name)))
    }

    pub fn component_for_task(&self, task_name: &str) -> KfpResult<&ComponentSpec> {
        let component = self.component_name(task_name)?;
        self.components
            .get(&component)
            .ok_or_else(|| KfpError::ComponentNotFound {
                task: task_name.to_string(),
                component,
            })
    }

    /// Container template used to launch a task
    pub fn executor_for_task(&self, task_name: &str) -> KfpResult<&ContainerSpec> {
        let component = self.component_for_task(task_name)?;
        let executor = component
            .executor_label
            .clone()
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| format!("exec-{}", task_name));

        self.deployment_spec
            .executors
            .get(&executor)
            .and_then(|e| e.container.as_ref())
            .ok_or_else(|| KfpError::ExecutorNotFound {
                task: task_name.to_string(),
                executor,
            })
    }

    /// Pipeline-level input declaration
    pub fn pipeline_input(&self, name: &str) -> Option<&ParameterSpec> {
        self.root.input_definitions.parameters.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(json: &str) -> ParameterBinding {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parameter_type_names() {
        assert_eq!(
            ParameterType::from("NUMBER_INTEGER".to_string()),
            ParameterType::Integer
        );
        assert_eq!(ParameterType::from("STRUCT".to_string()), ParameterType::Struct);
        assert_eq!(
            ParameterType::from(String::new()),
            ParameterType::Unspecified
        );
        assert_eq!(
            ParameterType::from("INT".to_string()),
            ParameterType::Unknown("INT".to_string())
        );
        assert_eq!(ParameterType::Double.to_string(), "NUMBER_DOUBLE");
    }

    #[test]
    fn test_binding_kinds() {
        assert_eq!(
            binding(r#"{"runtimeValue": {"constant": 1000}}"#),
            ParameterBinding::Constant(serde_json::json!(1000))
        );
        assert_eq!(
            binding(r#"{"taskOutputParameter": {"producerTask": "stage-0", "outputParameterKey": "Output"}}"#),
            ParameterBinding::TaskOutput {
                producer_task: "stage-0".to_string(),
                output_key: "Output".to_string(),
            }
        );
        assert_eq!(
            binding(r#"{"componentInputParameter": "run_id"}"#),
            ParameterBinding::PipelineInput("run_id".to_string())
        );
        assert_eq!(binding("{}"), ParameterBinding::ComponentDefault);
    }

    #[test]
    fn test_binding_output_key_defaults() {
        assert_eq!(
            binding(r#"{"taskOutputParameter": {"producerTask": "stage-0"}}"#),
            ParameterBinding::TaskOutput {
                producer_task: "stage-0".to_string(),
                output_key: DEFAULT_OUTPUT_KEY.to_string(),
            }
        );
    }

    #[test]
    fn test_binding_first_populated_field_wins() {
        let both = binding(
            r#"{
                "componentInputParameter": "run_id",
                "taskOutputParameter": {"producerTask": "stage-0", "outputParameterKey": "Output"},
                "runtimeValue": {"constant": "abc"}
            }"#,
        );
        assert_eq!(both, ParameterBinding::Constant(serde_json::json!("abc")));

        let output_and_input = binding(
            r#"{
                "componentInputParameter": "run_id",
                "taskOutputParameter": {"producerTask": "stage-0"}
            }"#,
        );
        assert!(matches!(output_and_input, ParameterBinding::TaskOutput { .. }));
    }

    #[test]
    fn test_null_constant_is_still_a_constant() {
        assert_eq!(
            binding(r#"{"runtimeValue": {"constant": null}, "componentInputParameter": "run_id"}"#),
            ParameterBinding::Constant(serde_json::Value::Null)
        );
    }

    #[test]
    fn test_empty_fields_are_not_populated() {
        assert_eq!(
            binding(r#"{"componentInputParameter": "", "runtimeValue": {}}"#),
            ParameterBinding::ComponentDefault
        );
    }

    #[test]
    fn test_component_and_executor_fallback_names() {
        let spec: PipelineSpec = serde_json::from_value(serde_json::json!({
            "schemaVersion": "2.1.0",
            "components": {"comp-train": {}},
            "deploymentSpec": {"executors": {"exec-train": {"container": {
                "command": ["python"], "args": ["--executor_input", "{{$}}"]
            }}}},
            "root": {"dag": {"tasks": {"train": {}}}}
        }))
        .unwrap();

        assert_eq!(spec.component_name("train").unwrap(), "comp-train");
        assert_eq!(spec.executor_for_task("train").unwrap().command, vec!["python"]);
        assert!(matches!(
            spec.component_for_task("ghost"),
            Err(KfpError::UnknownTask(_))
        ));
    }

    #[test]
    fn test_missing_executor() {
        let spec: PipelineSpec = serde_json::from_value(serde_json::json!({
            "schemaVersion": "2.1.0",
            "components": {"comp-a": {"executorLabel": "exec-missing"}},
            "root": {"dag": {"tasks": {"a": {"componentRef": {"name": "comp-a"}}}}}
        }))
        .unwrap();

        match spec.executor_for_task("a") {
            Err(KfpError::ExecutorNotFound { executor, .. }) => {
                assert_eq!(executor, "exec-missing")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
