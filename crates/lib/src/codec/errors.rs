//! Error types for page import and export.

use thiserror::Error;

/// Errors raised while reading an import document.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CodecError {
    /// The document is not JSON, or not shaped like an exported page.
    #[error("Invalid JSON format: {reason}")]
    InvalidFormat {
        /// Parser message, including line and column where available
        reason: String,
        /// The underlying parse error
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl CodecError {
    /// Check if this error indicates a malformed document.
    pub fn is_invalid_format(&self) -> bool {
        matches!(self, CodecError::InvalidFormat { .. })
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::InvalidFormat {
            reason: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<CodecError> for crate::Error {
    fn from(err: CodecError) -> Self {
        crate::Error::Codec(err)
    }
}
