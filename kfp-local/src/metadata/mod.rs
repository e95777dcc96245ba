// Metadata Store Module
// Per-task output metadata documents and the local storage layout they live in

pub mod fs;
pub mod memory;

pub use fs::FsMetadataStore;
pub use memory::InMemoryMetadataStore;

use crate::error::{KfpError, KfpResult, MissingOutput};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default local root for artifacts and metadata
pub const LOCAL_FOLDER: &str = "object-storage-bucket";

/// File each task process writes its outputs to
pub const OUTPUT_METADATA_FILE: &str = "output_metadata.json";

/// Default scheme for artifact URIs
pub const DEFAULT_URI_SCHEME: &str = "gs";

/// Outputs recorded by a task's process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputMetadata {
    /// Produced parameter values keyed by output name
    #[serde(default)]
    pub parameter_values: BTreeMap<String, serde_json::Value>,

    /// Artifact records, kept verbatim
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub artifacts: BTreeMap<String, serde_json::Value>,
}

impl OutputMetadata {
    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameter_values.insert(key.into(), value);
        self
    }

    /// Look up an output, failing with `UpstreamOutputMissing` if absent
    pub fn output(&self, producer: &str, key: &str) -> KfpResult<&serde_json::Value> {
        self.parameter_values
            .get(key)
            .ok_or_else(|| KfpError::UpstreamOutputMissing {
                producer: producer.to_string(),
                missing: MissingOutput::Key(key.to_string()),
            })
    }
}

/// Read/write access to task output metadata.
///
/// Tasks run one at a time, so implementations need no coordination beyond
/// being shareable across the runner's await points.
pub trait MetadataStore: Send + Sync {
    /// Load a task's output metadata
    fn read(&self, task: &str) -> KfpResult<OutputMetadata>;

    /// Record a task's output metadata
    fn write(&self, task: &str, metadata: &OutputMetadata) -> KfpResult<()>;

    /// Drop everything recorded so far
    fn clear(&self) -> KfpResult<()>;
}

/// Naming conventions for the local root: where metadata files go and what
/// artifact URIs look like
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
    scheme: String,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            scheme: DEFAULT_URI_SCHEME.to_string(),
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// `<root>/<task>/output_metadata.json`
    pub fn output_file(&self, task: &str) -> PathBuf {
        self.root.join(task).join(OUTPUT_METADATA_FILE)
    }

    /// `<scheme>://<root>/<artifact>`
    pub fn artifact_uri(&self, artifact: &str) -> String {
        format!(
            "{}://{}",
            self.scheme,
            self.root.join(artifact).display()
        )
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::new(LOCAL_FOLDER)
    }
}
