//! Storage error types for the Startpage backend.
//!
//! Ownership failures are reported with the same `*NotFound` variants as
//! missing rows, so callers cannot probe for ids that belong to someone else.

use thiserror::Error;

use crate::model::{ColorSchemeId, LinkId, PageId, SectionId, UserId};

/// Errors that can occur during storage operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// Account not found by id.
    #[error("User not found: {id}")]
    UserNotFound {
        /// The id that did not resolve
        id: UserId,
    },

    /// Page absent or not owned by the caller.
    #[error("Page not found: {id}")]
    PageNotFound {
        /// The id that did not resolve
        id: PageId,
    },

    /// Section absent or not owned by the caller.
    #[error("Section not found: {id}")]
    SectionNotFound {
        /// The id that did not resolve
        id: SectionId,
    },

    /// Link absent or not owned by the caller.
    #[error("Link not found: {id}")]
    LinkNotFound {
        /// The id that did not resolve
        id: LinkId,
    },

    /// Color scheme not found by id.
    #[error("Color scheme not found: {id}")]
    ColorSchemeNotFound {
        /// The id that did not resolve
        id: ColorSchemeId,
    },

    /// The owner already has a page with this title.
    #[error("A page titled '{title}' already exists")]
    TitleTaken {
        /// The conflicting title
        title: String,
    },

    /// Another page, possibly of another owner, already uses this slug.
    #[error("The page address '{slug}' is already in use")]
    SlugTaken {
        /// The conflicting slug
        slug: String,
    },

    /// Username already registered (compared case-insensitively).
    #[error("This username is already taken: {username}")]
    UsernameTaken {
        /// The conflicting username
        username: String,
    },

    /// SQL driver error, with context.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// What was being attempted, plus the driver message
        reason: String,
        /// The underlying driver error, if any
        #[source]
        source: Option<sqlx::Error>,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Stored data contradicts itself.
    #[error("Storage state inconsistency: {reason}")]
    StateInconsistency {
        /// Description of the inconsistency
        reason: String,
    },
}

impl BackendError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BackendError::UserNotFound { .. }
                | BackendError::PageNotFound { .. }
                | BackendError::SectionNotFound { .. }
                | BackendError::LinkNotFound { .. }
                | BackendError::ColorSchemeNotFound { .. }
        )
    }

    /// Check if this error indicates a uniqueness violation.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            BackendError::TitleTaken { .. }
                | BackendError::SlugTaken { .. }
                | BackendError::UsernameTaken { .. }
        )
    }

    /// Check if this error is related to I/O operations.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            BackendError::FileIo { .. }
                | BackendError::SerializationFailed { .. }
                | BackendError::DeserializationFailed { .. }
        )
    }
}

impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
