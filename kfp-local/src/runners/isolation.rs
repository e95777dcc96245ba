// Isolated Execution
// Routes task commands through a nox session that provides the KFP SDK

use crate::error::{KfpError, KfpResult};
use crate::executor::TaskCommand;

use std::fs;
use std::path::{Path, PathBuf};

/// Bundled nox session definition
pub const NOXFILE: &str = include_str!("../../resources/kfp_noxfile.py");

/// Nox session that runs a single task
const NOX_SESSION: &str = "run_pipeline_task";

/// Directory nox keeps its environments in, relative to the working directory
const NOX_ENV_DIR: &str = ".nox";

const NOXFILE_NAME: &str = "kfp_noxfile.py";

/// How task processes are launched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Isolation {
    /// Run `command ++ args` directly
    #[default]
    None,
    /// Run inside a nox-managed virtualenv
    Nox,
}

/// Wraps task command lines in `nox -s run_pipeline_task ... -- <argv>`
#[derive(Debug, Clone)]
pub struct NoxWrapper {
    nox: PathBuf,
    noxfile: PathBuf,
    env_dir: PathBuf,
}

impl NoxWrapper {
    /// Locate `nox` on `PATH` and write the bundled noxfile under the working directory
    pub fn prepare(working_dir: &Path) -> KfpResult<Self> {
        let nox = which::which("nox").map_err(|e| {
            KfpError::IsolationUnavailable(format!("nox not found on PATH ({})", e))
        })?;
        Self::with_executable(nox, working_dir)
    }

    /// Use a known nox executable
    pub fn with_executable(nox: impl Into<PathBuf>, working_dir: &Path) -> KfpResult<Self> {
        let env_dir = working_dir.join(NOX_ENV_DIR);
        fs::create_dir_all(&env_dir)?;

        let noxfile = env_dir.join(NOXFILE_NAME);
        fs::write(&noxfile, NOXFILE)?;
        tracing::debug!(noxfile = %noxfile.display(), "wrote nox session file");

        Ok(Self {
            nox: nox.into(),
            noxfile,
            env_dir,
        })
    }

    pub fn noxfile(&self) -> &Path {
        &self.noxfile
    }

    pub fn wrap(&self, command: &TaskCommand) -> KfpResult<TaskCommand> {
        let mut argv = vec![
            self.nox.display().to_string(),
            "-s".to_string(),
            NOX_SESSION.to_string(),
            "-f".to_string(),
            self.noxfile.display().to_string(),
            "--envdir".to_string(),
            self.env_dir.display().to_string(),
            "--".to_string(),
        ];
        argv.extend(command.argv().iter().cloned());
        TaskCommand::with_argv(command.task.clone(), argv)
    }
}
