// Execution Module
// Task orchestration and progress reporting

pub mod events;
pub mod runner;

// Re-export key types
pub use events::{progress_channel, EventSender, ProgressReceiver, ProgressSender, RunEvent};
pub use runner::{RunSummary, TaskPlan, TaskResult, TaskRunner};
