// KFP Local Runner Library
// Runs tasks of a compiled Kubeflow pipeline specification on the local machine

pub mod config;
pub mod error;
pub mod execution;
pub mod executor;
pub mod metadata;
pub mod parser;
pub mod resolution;
pub mod runners;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::RunnerConfig;
pub use error::{user_message, KfpError, KfpResult, MissingOutput};

// Re-export parser types
pub use parser::{
    ParameterBinding, ParameterType, ParseError, ParseErrorKind, ParseResult, PipelineSpec,
    SpecParser, SpecValidator, ValidationError, DEFAULT_OUTPUT_KEY, SCHEMA_VERSION,
};

// Re-export resolution and payload types
pub use executor::{build_payload, ExecutorInput, PayloadBuilder, TaskCommand, EXECUTOR_INPUT_PLACEHOLDER};
pub use resolution::{extract_typed_value, resolve, ParameterResolver, TypedValue};

// Re-export metadata types
pub use metadata::{
    FsMetadataStore, InMemoryMetadataStore, MetadataStore, OutputMetadata, StorageLayout,
    LOCAL_FOLDER, OUTPUT_METADATA_FILE,
};

// Re-export execution and runner types
pub use execution::{
    progress_channel, EventSender, ProgressReceiver, ProgressSender, RunEvent, RunSummary,
    TaskPlan, TaskResult, TaskRunner,
};
pub use runners::{Isolation, LaunchOutcome, NoxWrapper, ProcessLauncher, TaskLauncher};
