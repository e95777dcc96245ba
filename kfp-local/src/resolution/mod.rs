// Parameter Resolution Module
// Turns task input bindings into typed values

pub mod resolver;
pub mod value;

pub use resolver::{resolve, ParameterResolver};
pub use value::{extract_typed_value, TypedValue};
