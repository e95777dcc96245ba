// Executor Input Payload
// Builds the JSON document a task's process receives on its command line

use crate::error::KfpResult;
use crate::metadata::{MetadataStore, StorageLayout};
use crate::parser::models::PipelineSpec;
use crate::resolution::{ParameterResolver, TypedValue};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolved inputs and output destinations of one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorInput {
    pub inputs: ExecutorInputs,
    pub outputs: ExecutorOutputs,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorInputs {
    pub parameter_values: BTreeMap<String, TypedValue>,
    pub artifacts: BTreeMap<String, InputArtifact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorOutputs {
    pub artifacts: BTreeMap<String, OutputArtifact>,
    /// Where the process must write its output metadata
    pub output_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputArtifact {
    pub name: String,
    pub artifacts: Vec<ArtifactLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactLocation {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputArtifact {
    pub artifacts: Vec<NamedArtifactLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArtifactLocation {
    pub name: String,
    pub uri: String,
}

/// Assembles executor input payloads
pub struct PayloadBuilder<'a> {
    spec: &'a PipelineSpec,
    store: &'a dyn MetadataStore,
    layout: &'a StorageLayout,
}

impl<'a> PayloadBuilder<'a> {
    pub fn new(
        spec: &'a PipelineSpec,
        store: &'a dyn MetadataStore,
        layout: &'a StorageLayout,
    ) -> Self {
        Self {
            spec,
            store,
            layout,
        }
    }

    /// Build the payload for a task, resolving every declared input parameter
    pub fn build(&self, task_name: &str) -> KfpResult<ExecutorInput> {
        let component = self.spec.component_for_task(task_name)?;
        let resolver = ParameterResolver::new(self.spec, self.store);

        let mut parameter_values = BTreeMap::new();
        for param in component.input_definitions.parameters.keys() {
            parameter_values.insert(param.clone(), resolver.resolve(task_name, param)?);
        }

        let artifacts = component
            .input_definitions
            .artifacts
            .keys()
            .map(|name| {
                let artifact = InputArtifact {
                    name: name.clone(),
                    artifacts: vec![ArtifactLocation {
                        uri: self.layout.artifact_uri(name),
                    }],
                };
                (name.clone(), artifact)
            })
            .collect();

        let output_artifacts = component
            .output_definitions
            .artifacts
            .keys()
            .map(|name| {
                let artifact = OutputArtifact {
                    artifacts: vec![NamedArtifactLocation {
                        name: name.clone(),
                        uri: self.layout.artifact_uri(name),
                    }],
                };
                (name.clone(), artifact)
            })
            .collect();

        Ok(ExecutorInput {
            inputs: ExecutorInputs {
                parameter_values,
                artifacts,
            },
            outputs: ExecutorOutputs {
                artifacts: output_artifacts,
                output_file: self.layout.output_file(task_name).display().to_string(),
            },
        })
    }

    /// Build the payload and serialize it compactly
    pub fn build_json(&self, task_name: &str) -> KfpResult<String> {
        let payload = self.build(task_name)?;
        Ok(serde_json::to_string(&payload)?)
    }
}

/// Build the serialized executor input for a task
pub fn build_payload(
    spec: &PipelineSpec,
    store: &dyn MetadataStore,
    layout: &StorageLayout,
    task_name: &str,
) -> KfpResult<String> {
    PayloadBuilder::new(spec, store, layout).build_json(task_name)
}
