// Executor Invocation Module
// Executor input payloads and the command lines that carry them

pub mod command;
pub mod payload;

pub use command::{TaskCommand, EXECUTOR_INPUT_PLACEHOLDER};
pub use payload::{build_payload, ExecutorInput, PayloadBuilder};
