// Run Events
// Progress reporting for a local pipeline run

use std::time::Duration;
use tokio::sync::mpsc;

/// Sender for run progress events
pub type ProgressSender = mpsc::UnboundedSender<RunEvent>;

/// Receiver for run progress events
pub type ProgressReceiver = mpsc::UnboundedReceiver<RunEvent>;

/// Create a new progress channel
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// Events emitted while running tasks
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// The run passed validation and is about to launch its first task
    RunStarted {
        pipeline_name: Option<String>,
        tasks: Vec<String>,
    },

    /// All tasks ran, or the run stopped at a failure
    RunCompleted { success: bool, duration: Duration },

    TaskStarted {
        task: String,
        index: usize,
        command_line: String,
    },

    /// A line the task's process wrote to stdout or stderr
    TaskOutput {
        task: String,
        line: String,
        is_error: bool,
    },

    TaskCompleted {
        task: String,
        exit_code: Option<i32>,
        duration: Duration,
    },

    TaskFailed { task: String, message: String },
}

impl RunEvent {
    pub fn run_started(pipeline_name: Option<&str>, tasks: &[String]) -> Self {
        Self::RunStarted {
            pipeline_name: pipeline_name.map(str::to_string),
            tasks: tasks.to_vec(),
        }
    }

    pub fn run_completed(success: bool, duration: Duration) -> Self {
        Self::RunCompleted { success, duration }
    }

    pub fn task_started(task: impl Into<String>, index: usize, command_line: impl Into<String>) -> Self {
        Self::TaskStarted {
            task: task.into(),
            index,
            command_line: command_line.into(),
        }
    }

    pub fn task_output(task: impl Into<String>, line: impl Into<String>, is_error: bool) -> Self {
        Self::TaskOutput {
            task: task.into(),
            line: line.into(),
            is_error,
        }
    }

    pub fn task_completed(task: impl Into<String>, exit_code: Option<i32>, duration: Duration) -> Self {
        Self::TaskCompleted {
            task: task.into(),
            exit_code,
            duration,
        }
    }

    pub fn task_failed(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TaskFailed {
            task: task.into(),
            message: message.into(),
        }
    }
}

/// Helper trait for sending events, ignoring errors (fire-and-forget)
pub trait EventSender {
    fn send_event(&self, event: RunEvent);
}

impl EventSender for ProgressSender {
    fn send_event(&self, event: RunEvent) {
        let _ = self.send(event);
    }
}

impl EventSender for Option<ProgressSender> {
    fn send_event(&self, event: RunEvent) {
        if let Some(sender) = self {
            let _ = sender.send(event);
        }
    }
}

impl EventSender for Option<&ProgressSender> {
    fn send_event(&self, event: RunEvent) {
        if let Some(sender) = self {
            let _ = sender.send(event);
        }
    }
}
