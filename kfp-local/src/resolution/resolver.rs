// Parameter Resolver
// Computes the concrete value of a task input from its binding

use crate::error::{KfpError, KfpResult};
use crate::metadata::MetadataStore;
use crate::parser::models::{ParameterBinding, ParameterSpec, PipelineSpec};
use crate::resolution::value::{extract_typed_value, TypedValue};

/// Resolves task inputs against a specification and the outputs recorded so far
pub struct ParameterResolver<'a> {
    spec: &'a PipelineSpec,
    store: &'a dyn MetadataStore,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(spec: &'a PipelineSpec, store: &'a dyn MetadataStore) -> Self {
        Self { spec, store }
    }

    /// Resolve one input parameter of a task.
    ///
    /// The store is only read for task output bindings.
    pub fn resolve(&self, task_name: &str, param_name: &str) -> KfpResult<TypedValue> {
        let task = self.spec.task(task_name)?;
        let component = self.spec.component_for_task(task_name)?;
        let param_spec = component
            .input_definitions
            .parameters
            .get(param_name)
            .ok_or_else(|| KfpError::ParameterNotFound {
                task: task_name.to_string(),
                param: param_name.to_string(),
            })?;

        match task.inputs.parameters.get(param_name) {
            Some(ParameterBinding::Constant(raw)) => {
                tracing::debug!(task = task_name, param = param_name, "using constant");
                extract_typed_value(raw, &param_spec.parameter_type)
            }
            Some(ParameterBinding::TaskOutput {
                producer_task,
                output_key,
            }) => {
                tracing::debug!(
                    task = task_name,
                    param = param_name,
                    producer = %producer_task,
                    key = %output_key,
                    "reading upstream output"
                );
                let metadata = self.store.read(producer_task)?;
                let raw = metadata.output(producer_task, output_key)?;
                TypedValue::from_output(raw.clone())
            }
            Some(ParameterBinding::PipelineInput(input_name)) => {
                tracing::debug!(
                    task = task_name,
                    param = param_name,
                    input = %input_name,
                    "using pipeline input default"
                );
                let input_spec = self
                    .spec
                    .pipeline_input(input_name)
                    .ok_or_else(|| KfpError::PipelineInputNotFound(input_name.clone()))?;
                decode_default(input_spec)
                    .ok_or_else(|| KfpError::PipelineInputNotFound(input_name.clone()))?
            }
            Some(ParameterBinding::ComponentDefault) | None => {
                tracing::debug!(task = task_name, param = param_name, "using component default");
                decode_default(param_spec).ok_or_else(|| KfpError::UnresolvedParameter {
                    task: task_name.to_string(),
                    param: param_name.to_string(),
                })?
            }
        }
    }
}

fn decode_default(spec: &ParameterSpec) -> Option<KfpResult<TypedValue>> {
    spec.default_value
        .as_ref()
        .map(|raw| extract_typed_value(raw, &spec.parameter_type))
}

/// Resolve one input parameter of a task
pub fn resolve(
    spec: &PipelineSpec,
    store: &dyn MetadataStore,
    task_name: &str,
    param_name: &str,
) -> KfpResult<TypedValue> {
    ParameterResolver::new(spec, store).resolve(task_name, param_name)
}
