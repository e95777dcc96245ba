use crate::commands::RunArgs;
use crate::output;

use color_eyre::Result;

use kfp_local::{progress_channel, RunEvent, TaskRunner};

pub async fn execute(args: RunArgs) -> Result<()> {
    let config = args.config()?;

    output::status("Loading", &format!("{}", args.pipeline.display()));
    let runner = TaskRunner::load(&args.pipeline, config)?;

    let (tx, mut rx) = progress_channel();
    let runner = runner.with_progress(tx);
    let total = args.tasks.len();

    // Spawn execution in background
    let tasks = args.tasks;
    let exec_handle = tokio::spawn(async move { runner.run(&tasks).await });

    // Process events in the foreground
    while let Some(event) = rx.recv().await {
        match &event {
            RunEvent::RunStarted { pipeline_name, .. } => {
                let name = pipeline_name.as_deref().unwrap_or("pipeline");
                output::header(&format!("Running {} task(s) of '{}'", total, name));
            }

            RunEvent::TaskStarted {
                task,
                index,
                command_line,
            } => {
                output::task_header(*index, total, task);
                tracing::debug!(task = %task, "{}", command_line);
            }

            RunEvent::TaskOutput { line, is_error, .. } => {
                if *is_error {
                    output::task_error(line);
                } else {
                    output::task_output(line);
                }
            }

            RunEvent::TaskCompleted {
                task,
                exit_code,
                duration,
            } => match exit_code {
                Some(0) => output::success(&format!(
                    "{} ({:.2}s)",
                    task,
                    duration.as_secs_f64()
                )),
                Some(code) => output::warning(&format!(
                    "{} exited with status {} ({:.2}s)",
                    task,
                    code,
                    duration.as_secs_f64()
                )),
                None => output::warning(&format!("{} was terminated by a signal", task)),
            },

            RunEvent::TaskFailed { task, .. } => {
                output::failure(task);
            }

            RunEvent::RunCompleted { success, duration } => {
                if *success {
                    output::dim(&format!("Completed in {:.2}s", duration.as_secs_f64()));
                }
            }
        }
    }

    // Surface the run's own error, which carries the failing task
    exec_handle.await??;
    Ok(())
}
