// Runner Configuration
// Where metadata lives, how tasks are launched and what counts as failure

use crate::metadata::{StorageLayout, DEFAULT_URI_SCHEME, LOCAL_FOLDER};
use crate::runners::Isolation;

use std::path::PathBuf;

/// Configuration for a local run
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Root for output metadata and artifacts, relative to `working_dir` unless absolute
    pub local_root: PathBuf,
    /// Scheme used in artifact URIs
    pub uri_scheme: String,
    /// Directory task processes run in
    pub working_dir: PathBuf,
    pub isolation: Isolation,
    /// Treat a non-zero exit (or a signal) as a task failure
    pub fail_on_nonzero_exit: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            local_root: PathBuf::from(LOCAL_FOLDER),
            uri_scheme: DEFAULT_URI_SCHEME.to_string(),
            working_dir: PathBuf::from("."),
            isolation: Isolation::None,
            fail_on_nonzero_exit: true,
        }
    }
}

impl RunnerConfig {
    pub fn with_local_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.local_root = root.into();
        self
    }

    pub fn with_uri_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.uri_scheme = scheme.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn with_fail_on_nonzero_exit(mut self, fail: bool) -> Self {
        self.fail_on_nonzero_exit = fail;
        self
    }

    /// Storage layout as the task processes see it
    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.local_root).with_scheme(&self.uri_scheme)
    }
}
