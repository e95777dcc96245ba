// Task Command Line
// Fills an executor's container template with the executor input payload

use crate::error::{KfpError, KfpResult};
use crate::parser::models::ContainerSpec;

use std::fmt;

/// Argument token replaced by the serialized executor input
pub const EXECUTOR_INPUT_PLACEHOLDER: &str = "{{$}}";

/// Position of the payload when the template carries no placeholder
/// (`--executor_input <payload>`)
const CONVENTIONAL_PAYLOAD_INDEX: usize = 1;

/// A ready-to-launch command line for one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCommand {
    pub task: String,
    argv: Vec<String>,
}

impl TaskCommand {
    /// Build `command ++ args` with the payload substituted into `args`
    pub fn from_template(task: &str, container: &ContainerSpec, payload: &str) -> KfpResult<Self> {
        // Without a command the first argument would be run as the program
        if container.command.is_empty() {
            return Err(KfpError::EmptyCommand(task.to_string()));
        }

        let mut args = container.args.clone();

        let mut substituted = false;
        for arg in args.iter_mut().filter(|a| a.as_str() == EXECUTOR_INPUT_PLACEHOLDER) {
            *arg = payload.to_string();
            substituted = true;
        }

        if !substituted {
            match args.get_mut(CONVENTIONAL_PAYLOAD_INDEX) {
                Some(arg) => *arg = payload.to_string(),
                None => return Err(KfpError::PlaceholderMissing(task.to_string())),
            }
        }

        Ok(Self {
            task: task.to_string(),
            argv: container.command.iter().cloned().chain(args).collect(),
        })
    }

    /// Wrap an existing command line, e.g. for isolation
    pub fn with_argv(task: impl Into<String>, argv: Vec<String>) -> KfpResult<Self> {
        let task = task.into();
        if argv.is_empty() {
            return Err(KfpError::EmptyCommand(task));
        }
        Ok(Self { task, argv })
    }

    pub fn program(&self) -> &str {
        // argv is never empty
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Shell-style rendering for logs and dry runs
    pub fn command_line(&self) -> String {
        self.argv
            .iter()
            .map(|arg| quote(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for TaskCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@%+".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
