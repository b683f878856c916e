//! Common types and errors shared across the crate.

pub mod error;
pub mod types;

pub use error::{ConfigError, FieldError, PipelineError, SessionError};
pub use types::{DecodedMessage, PlayerRef};
