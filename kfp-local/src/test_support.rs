// Shared fixtures for unit tests

use crate::error::KfpResult;
use crate::metadata::{InMemoryMetadataStore, MetadataStore, OutputMetadata};
use crate::parser::loader::SpecParser;
use crate::parser::models::PipelineSpec;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Four-stage pipeline: stage-0 -> stage-1 -> stage-2 -> stage-3
pub const FIXTURE_PIPELINE: &str = include_str!("../tests/resources/pipeline.json");

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("resources")
        .join(name)
}

pub fn fixture_spec() -> PipelineSpec {
    SpecParser::parse(FIXTURE_PIPELINE).unwrap()
}

/// Store wrapper that counts reads
#[derive(Default)]
pub struct CountingStore {
    pub inner: InMemoryMetadataStore,
    reads: AtomicUsize,
}

impl CountingStore {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl MetadataStore for CountingStore {
    fn read(&self, task: &str) -> KfpResult<OutputMetadata> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(task)
    }

    fn write(&self, task: &str, metadata: &OutputMetadata) -> KfpResult<()> {
        self.inner.write(task, metadata)
    }

    fn clear(&self) -> KfpResult<()> {
        self.inner.clear()
    }
}
