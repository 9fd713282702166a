//! Error types for the response parser

use rapport_domain::RecordKind;
use thiserror::Error;

/// Errors that can cross the public `parse` boundary
///
/// Only error descriptions are carried, never raw decoder state. The three
/// canonical record kinds cannot fail at all (the default-value tier always
/// succeeds); `UnsupportedTarget` and `InvalidFormat` cover the inputs that
/// are rejected before recovery begins.
#[derive(Error, Debug)]
pub enum ParserError {
    /// Target kind cannot be recovered through this entry point
    #[error("Unsupported target type: {0}")]
    UnsupportedTarget(RecordKind),

    /// No structured content could be recovered for an open-ended target
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    /// JSON decoding error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ParserError {
    fn from(e: serde_json::Error) -> Self {
        ParserError::JsonParse(e.to_string())
    }
}
