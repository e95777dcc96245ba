pub mod plan;
pub mod run;

use std::path::PathBuf;

use clap::Args;
use color_eyre::Result;

use kfp_local::{Isolation, RunnerConfig, LOCAL_FOLDER};

/// Run tasks of a compiled Kubeflow pipeline locally
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Tasks to run, in order
    #[arg(value_name = "TASK", required = true)]
    pub tasks: Vec<String>,

    /// Path to the compiled pipeline (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub pipeline: PathBuf,

    /// Use nox for environment isolation
    #[arg(long)]
    pub nox: bool,

    /// Directory for output metadata and artifacts
    #[arg(long, value_name = "DIR", env = "KFP_LOCAL_ROOT", default_value = LOCAL_FOLDER)]
    pub local_root: PathBuf,

    /// Don't fail the run when a task exits non-zero
    #[arg(long)]
    pub allow_nonzero_exit: bool,

    /// Print each task's command line without running anything
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Runner configuration for the current directory
    pub fn config(&self) -> Result<RunnerConfig> {
        let isolation = if self.nox {
            Isolation::Nox
        } else {
            Isolation::None
        };

        Ok(RunnerConfig::default()
            .with_local_root(&self.local_root)
            .with_working_dir(std::env::current_dir()?)
            .with_isolation(isolation)
            .with_fail_on_nonzero_exit(!self.allow_nonzero_exit))
    }
}
