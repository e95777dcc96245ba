// Runners Module
// Launches task processes, directly or through an isolation wrapper

pub mod isolation;
pub mod process;

// Re-export key types
pub use isolation::{Isolation, NoxWrapper, NOXFILE};
pub use process::ProcessLauncher;

use crate::error::KfpResult;
use crate::execution::events::ProgressSender;
use crate::executor::TaskCommand;

use std::path::Path;
use std::time::Duration;

/// How a launched task process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOutcome {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

impl LaunchOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait for task launchers
#[async_trait::async_trait]
pub trait TaskLauncher: Send + Sync {
    /// Run a task's command to completion.
    ///
    /// Errors are reserved for failing to start or wait on the process; a
    /// process that ran and exited non-zero is reported through the outcome.
    async fn launch(
        &self,
        command: &TaskCommand,
        working_dir: &Path,
        progress: Option<&ProgressSender>,
    ) -> KfpResult<LaunchOutcome>;
}
