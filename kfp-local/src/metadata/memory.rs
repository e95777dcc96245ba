// In-Memory Metadata Store
// Keeps output metadata in a map; used by tests and dry runs

use crate::error::{KfpError, KfpResult, MissingOutput};
use crate::metadata::{MetadataStore, OutputMetadata, StorageLayout};

use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    layout: StorageLayout,
    documents: RwLock<HashMap<String, OutputMetadata>>,
}

impl InMemoryMetadataStore {
    pub fn new(layout: StorageLayout) -> Self {
        Self {
            layout,
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Whether a task has recorded metadata
    pub fn contains(&self, task: &str) -> bool {
        self.documents
            .read()
            .map(|docs| docs.contains_key(task))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn read(&self, task: &str) -> KfpResult<OutputMetadata> {
        let docs = self
            .documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        docs.get(task)
            .cloned()
            .ok_or_else(|| KfpError::UpstreamOutputMissing {
                producer: task.to_string(),
                missing: MissingOutput::File(self.layout.output_file(task)),
            })
    }

    fn write(&self, task: &str, metadata: &OutputMetadata) -> KfpResult<()> {
        let mut docs = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        docs.insert(task.to_string(), metadata.clone());
        Ok(())
    }

    fn clear(&self) -> KfpResult<()> {
        let mut docs = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        docs.clear();
        Ok(())
    }
}
