// Error Types
// One error enumeration shared by the resolver, the payload builder and the runner

use crate::parser::error::ParseError;
use crate::parser::models::ParameterType;

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a specification or running its tasks
#[derive(Debug, Error)]
pub enum KfpError {
    #[error("can't find {}", .0.display())]
    SpecificationNotFound(PathBuf),

    #[error("{} is not a valid pipeline specification - {}", .path.display(), .error.message)]
    SpecificationInvalid {
        path: PathBuf,
        #[source]
        error: ParseError,
    },

    #[error("schema_version={found} not supported - please revert to schema_version={supported}")]
    SchemaVersionMismatch {
        found: String,
        supported: &'static str,
    },

    /// Every requested task that the graph does not declare
    #[error("missing task defs in pipeline spec: {}", .0.join(", "))]
    TaskNotDeclared(Vec<String>),

    #[error("{0} is not a task in the pipeline specification")]
    UnknownTask(String),

    #[error("component {component} for task={task} not found in pipeline")]
    ComponentNotFound { task: String, component: String },

    #[error("executor {executor} for task={task} not found in pipeline")]
    ExecutorNotFound { task: String, executor: String },

    #[error("cannot find param={param} in task={task}")]
    ParameterNotFound { task: String, param: String },

    #[error("couldn't find parameter {0} in pipeline inputs")]
    PipelineInputNotFound(String),

    #[error("unsupported parameter param={param} in task={task}: no binding and no default")]
    UnresolvedParameter { task: String, param: String },

    #[error("couldn't find {missing} for task={producer}")]
    UpstreamOutputMissing {
        producer: String,
        missing: MissingOutput,
    },

    #[error("output metadata at {} is malformed: {source}", .path.display())]
    MetadataInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("parameter has an unknown type: {0}")]
    UnsupportedParameterType(ParameterType),

    #[error("expected a {expected} value, found {found}")]
    ParameterValueMismatch {
        expected: ParameterType,
        found: &'static str,
    },

    #[error("failed to encode executor input: {0}")]
    PayloadEncoding(#[from] serde_json::Error),

    #[error("executor for task={0} has no executor input placeholder")]
    PlaceholderMissing(String),

    #[error("executor for task={0} has an empty command line")]
    EmptyCommand(String),

    #[error("isolated execution unavailable: {0}")]
    IsolationUnavailable(String),

    #[error("process {}", describe_exit(.code))]
    ProcessExited { code: Option<i32> },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("task={task} failed to execute - {source}")]
    TaskExecutionFailed {
        task: String,
        source: Box<KfpError>,
    },
}

/// What was absent when reading an upstream task's outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingOutput {
    /// The producer never wrote its metadata file
    File(PathBuf),
    /// The metadata file has no value under this key
    Key(String),
}

impl fmt::Display for MissingOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingOutput::File(path) => write!(f, "{}", path.display()),
            MissingOutput::Key(key) => write!(f, "parameter output '{}'", key),
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

impl KfpError {
    /// Wrap an error raised during a task's turn, naming the task
    pub fn task_failed(task: impl Into<String>, source: KfpError) -> Self {
        KfpError::TaskExecutionFailed {
            task: task.into(),
            source: Box::new(source),
        }
    }

    /// The task named by a `TaskExecutionFailed` error
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            KfpError::TaskExecutionFailed { task, .. } => Some(task),
            _ => None,
        }
    }

    /// Single-line message with a lower-case first letter, as shown by the CLI
    pub fn user_message(&self) -> String {
        user_message(&self.to_string())
    }
}

/// First line of `message` with its first letter lower-cased
pub fn user_message(message: &str) -> String {
    let line = message.lines().next().unwrap_or_default();
    let mut chars = line.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Result type for runner operations
pub type KfpResult<T> = Result<T, KfpError>;
