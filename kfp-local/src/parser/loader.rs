// Compiled Pipeline Loader
// Decodes JSON/YAML pipeline specifications and validates them before a run

use crate::error::{KfpError, KfpResult};
use crate::parser::error::{ParseError, ParseErrorKind, ParseResult, ValidationError};
use crate::parser::models::{ParameterBinding, PipelineSpec, SCHEMA_VERSION};

use serde::Deserialize;
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// Decoder for compiled pipeline specifications
pub struct SpecParser;

impl SpecParser {
    /// Parse a specification from a string.
    ///
    /// JSON is read as YAML. Only the first document of a multi-document
    /// stream is used.
    pub fn parse(content: &str) -> ParseResult<PipelineSpec> {
        let root = serde_yaml::Value::deserialize(first_document(content)?)
            .map_err(|e| ParseError::from_yaml_error(&e, content))?;

        match root {
            Value::Mapping(_) => {}
            Value::Null => return Err(ParseError::empty_document()),
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidSchema,
                    format!("found {} where a pipeline mapping was expected", yaml_kind(&other)),
                )
                .with_hint("pass the JSON/YAML produced by the pipeline compiler"))
            }
        }

        PipelineSpec::deserialize(first_document(content)?)
            .map_err(|e| ParseError::from_yaml_error(&e, content))
    }

    /// Parse a specification from a file
    pub fn parse_file(path: impl AsRef<Path>) -> KfpResult<PipelineSpec> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(KfpError::SpecificationNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| KfpError::SpecificationInvalid {
            path: path.to_path_buf(),
            error: ParseError::io(&e),
        })?;

        Self::parse(&content).map_err(|error| KfpError::SpecificationInvalid {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse a specification and check that its schema version is supported
    pub fn load(path: impl AsRef<Path>) -> KfpResult<PipelineSpec> {
        let spec = Self::parse_file(path)?;
        SpecValidator::check_schema_version(&spec)?;
        Ok(spec)
    }
}

fn first_document(content: &str) -> ParseResult<serde_yaml::Deserializer<'_>> {
    serde_yaml::Deserializer::from_str(content)
        .next()
        .ok_or_else(ParseError::empty_document)
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "plain text",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Checks run on a decoded specification before any task executes
pub struct SpecValidator;

impl SpecValidator {
    pub fn check_schema_version(spec: &PipelineSpec) -> KfpResult<()> {
        if spec.schema_version != SCHEMA_VERSION {
            return Err(KfpError::SchemaVersionMismatch {
                found: spec.schema_version.clone(),
                supported: SCHEMA_VERSION,
            });
        }
        Ok(())
    }

    /// Fail with every requested task the graph does not declare
    pub fn check_tasks_declared(spec: &PipelineSpec, tasks: &[String]) -> KfpResult<()> {
        let missing: Vec<String> = tasks
            .iter()
            .filter(|task| !spec.root.dag.tasks.contains_key(task.as_str()))
            .cloned()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(KfpError::TaskNotDeclared(missing))
        }
    }

    /// Semantic checks over the task graph.
    ///
    /// These are advisory: the runner only fails on what it touches while
    /// running the requested tasks. Reference cycles are not checked.
    pub fn validate(spec: &PipelineSpec) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (task_name, task) in &spec.root.dag.tasks {
            let path = format!("root.dag.tasks.{}", task_name);

            let component = match spec.component_for_task(task_name) {
                Ok(component) => component,
                Err(e) => {
                    errors.push(ValidationError::new(e.to_string(), &path));
                    continue;
                }
            };

            if let Err(e) = spec.executor_for_task(task_name) {
                errors.push(ValidationError::new(e.to_string(), &path));
            }

            for (param, binding) in &task.inputs.parameters {
                let param_path = format!("{}.inputs.parameters.{}", path, param);
                if !component.input_definitions.parameters.contains_key(param) {
                    errors.push(ValidationError::new(
                        "binding for a parameter the component does not declare",
                        &param_path,
                    ));
                }

                match binding {
                    ParameterBinding::TaskOutput { producer_task, .. }
                        if !spec.root.dag.tasks.contains_key(producer_task) =>
                    {
                        errors.push(
                            ValidationError::new(
                                format!("producer task '{}' is not in the graph", producer_task),
                                &param_path,
                            )
                            .with_hint("check the task name in 'taskOutputParameter'"),
                        );
                    }
                    ParameterBinding::PipelineInput(name) if spec.pipeline_input(name).is_none() => {
                        errors.push(ValidationError::new(
                            format!("pipeline input '{}' is not declared", name),
                            &param_path,
                        ));
                    }
                    _ => {}
                }
            }

            for (param, param_spec) in &component.input_definitions.parameters {
                let bound = task.inputs.parameters.contains_key(param);
                if !bound && param_spec.default_value.is_none() && !param_spec.is_optional {
                    errors.push(
                        ValidationError::new(
                            format!("parameter '{}' has no binding and no default", param),
                            &path,
                        )
                        .with_hint("bind the parameter or give the component a default"),
                    );
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
