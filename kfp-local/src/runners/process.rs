// Process Launcher
// Spawns a task's command line and streams its output until it exits

use crate::error::KfpResult;
use crate::execution::events::{EventSender, ProgressSender, RunEvent};
use crate::executor::TaskCommand;
use crate::runners::{LaunchOutcome, NoxWrapper, TaskLauncher};

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Launches task processes on the local machine
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    wrapper: Option<NoxWrapper>,
}

impl ProcessLauncher {
    /// Launch commands as given
    pub fn new() -> Self {
        Self { wrapper: None }
    }

    /// Launch commands inside a nox session
    pub fn with_nox(wrapper: NoxWrapper) -> Self {
        Self {
            wrapper: Some(wrapper),
        }
    }

    fn final_command(&self, command: &TaskCommand) -> KfpResult<TaskCommand> {
        match &self.wrapper {
            Some(wrapper) => wrapper.wrap(command),
            None => Ok(command.clone()),
        }
    }
}

#[async_trait::async_trait]
impl TaskLauncher for ProcessLauncher {
    async fn launch(
        &self,
        command: &TaskCommand,
        working_dir: &Path,
        progress: Option<&ProgressSender>,
    ) -> KfpResult<LaunchOutcome> {
        let command = self.final_command(command)?;
        let start = Instant::now();

        let mut cmd = Command::new(command.program());
        cmd.args(command.args());
        cmd.current_dir(working_dir);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(task = %command.task, program = command.program(), "spawning task process");
        let mut child = cmd.spawn()?;

        // Read output streams concurrently
        let stdout_handle = child
            .stdout
            .take()
            .map(|out| forward_lines(out, &command.task, false, progress.cloned()));
        let stderr_handle = child
            .stderr
            .take()
            .map(|err| forward_lines(err, &command.task, true, progress.cloned()));

        let status = child.wait().await?;

        for handle in [stdout_handle, stderr_handle].into_iter().flatten() {
            let _ = handle.await;
        }

        Ok(LaunchOutcome {
            exit_code: status.code(),
            duration: start.elapsed(),
        })
    }
}

fn forward_lines<R>(
    reader: R,
    task: &str,
    is_error: bool,
    progress: Option<ProgressSender>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let task = task.to_string();
    tokio::spawn(async move {
        // Lines are split on raw bytes; a non-UTF-8 line must not stop the
        // drain or the child dies on a closed pipe
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = String::from_utf8_lossy(&buf)
                .trim_end_matches(['\n', '\r'])
                .to_string();
            tracing::trace!(task = %task, stderr = is_error, "{}", line);
            progress.send_event(RunEvent::task_output(&task, line, is_error));
        }
    })
}
