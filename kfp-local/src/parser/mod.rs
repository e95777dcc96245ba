// Parser module for compiled pipeline specifications
// Provides JSON/YAML decoding, the typed IR model, and pre-run validation

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ParseError, ParseErrorKind, ParseResult, ValidationError};
pub use loader::{SpecParser, SpecValidator};
pub use models::*;
