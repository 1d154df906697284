//! Error types for page, section and link operations.
//!
//! Missing or foreign rows are reported by the backend as `*NotFound`; the
//! variants here cover page resolution, field validation and the link cap.

use thiserror::Error;

use crate::model::SectionId;

/// Errors raised by the page composition and item operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PageError {
    /// An explicit page address named another account.
    #[error("Pages of '{username}' are not accessible")]
    Forbidden {
        /// The username from the requested address
        username: String,
    },

    /// The owner has no pages to show.
    #[error("No startpage found")]
    NoPages,

    /// No page of the owner has this slug.
    #[error("No startpage at '{slug}'")]
    UnknownSlug {
        /// The requested slug
        slug: String,
    },

    /// A field is empty, too long or malformed.
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// An item type other than `section` or `link`.
    #[error("Invalid type: {item_type}")]
    InvalidItemType {
        /// The type as submitted
        item_type: String,
    },

    /// A section would hold more links than allowed.
    #[error("Section cannot contain more than {limit} links")]
    CapacityExceeded {
        /// The section that is full; `None` when the request itself was too large
        section_id: Option<SectionId>,
        /// How many links the operation asked for
        requested: usize,
        /// The per-section cap
        limit: usize,
    },
}

impl PageError {
    /// Check if this error indicates there was nothing to resolve.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PageError::NoPages | PageError::UnknownSlug { .. })
    }

    /// Check if this error indicates access to another account's page.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, PageError::Forbidden { .. })
    }

    /// Check if this error indicates the per-section link cap was hit.
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, PageError::CapacityExceeded { .. })
    }

    /// Check if this error is validation-related.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PageError::InvalidField { .. } | PageError::InvalidItemType { .. }
        )
    }
}

impl From<PageError> for crate::Error {
    fn from(err: PageError) -> Self {
        crate::Error::Page(err)
    }
}
