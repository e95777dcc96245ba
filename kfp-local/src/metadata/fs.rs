// Filesystem Metadata Store
// Reads and writes output metadata under the local root on disk

use crate::error::{KfpError, KfpResult, MissingOutput};
use crate::metadata::{MetadataStore, OutputMetadata, StorageLayout};

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Metadata store backed by `<base_dir>/<root>/<task>/output_metadata.json`
#[derive(Debug, Clone)]
pub struct FsMetadataStore {
    layout: StorageLayout,
    /// Directory a relative root is resolved against
    base_dir: PathBuf,
}

impl FsMetadataStore {
    pub fn new(layout: StorageLayout, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            layout,
            base_dir: base_dir.into(),
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Absolute (or base-relative) location of the local root
    pub fn root_dir(&self) -> PathBuf {
        self.base_dir.join(self.layout.root())
    }

    /// On-disk location of a task's metadata file
    pub fn metadata_path(&self, task: &str) -> PathBuf {
        self.base_dir.join(self.layout.output_file(task))
    }
}

impl MetadataStore for FsMetadataStore {
    fn read(&self, task: &str) -> KfpResult<OutputMetadata> {
        let path = self.metadata_path(task);
        if !path.exists() {
            return Err(KfpError::UpstreamOutputMissing {
                producer: task.to_string(),
                missing: MissingOutput::File(path),
            });
        }

        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|source| KfpError::MetadataInvalid { path, source })
    }

    fn write(&self, task: &str, metadata: &OutputMetadata) -> KfpResult<()> {
        let path = self.metadata_path(task);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string(metadata).map_err(|source| {
            KfpError::MetadataInvalid {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn clear(&self) -> KfpResult<()> {
        if !is_clearable(self.layout.root()) {
            return Err(KfpError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "refusing to clear local root '{}'",
                    self.layout.root().display()
                ),
            )));
        }

        match fs::remove_dir_all(self.root_dir()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// A root is clearable when it names at least one real directory below its
/// anchor: not empty, not `.`/`..` only, not a filesystem root.
fn is_clearable(root: &Path) -> bool {
    root.components()
        .any(|c| matches!(c, Component::Normal(_)))
}
