//!
//! Startpage: personal start pages built from ordered sections of links.
//!
//! ## Core Concepts
//!
//! * **Owner (`model::UserId`)**: the account that exclusively controls a set of pages.
//! * **Pages (`model::Page`)**: named, sluggable collections of sections. At most one page
//!   per owner is the default page.
//! * **Sections (`model::Section`)**: ordered, named groups of links within one page.
//! * **Links (`model::Link`)**: named URLs within one section, capped at
//!   [`constants::MAX_LINKS_PER_SECTION`] per section.
//! * **Backends (`backend::BackendImpl`)**: owner-scoped persistence. Every read and write
//!   re-verifies ownership through the Link → Section → Page chain.
//! * **Ordering (`ordering`)**: pure planning of drag-and-drop reorders, including moving
//!   links across sections.
//! * **Startpages (`Startpages`)**: the cheap-to-clone service handle tying a backend to
//!   the settings cache, domain event dispatch and the clock.

pub mod backend;
pub mod clock;
pub mod codec;
pub mod constants;
pub mod digest;
pub mod events;
pub mod model;
pub mod ordering;
pub mod page;
pub mod settings;
pub mod slug;
pub mod startpages;
pub mod user;

pub use clock::{Clock, FixedClock, SystemClock};
pub use model::{ColorSchemeId, ItemKind, Link, LinkId, Page, PageId, Section, SectionId, User, UserId};
pub use startpages::Startpages;

/// Result type used throughout the Startpage library.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of failures, independent of the module that raised them.
///
/// Request handlers map these onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Entity absent, or present but owned by someone else.
    NotFound,
    /// Explicit access to another account's page.
    Forbidden,
    /// A section would hold more links than allowed.
    CapacityExceeded,
    /// A required field is missing or out of range.
    InvalidInput,
    /// An import document could not be parsed.
    InvalidFormat,
    /// A uniqueness constraint was violated.
    Conflict,
    /// Storage, I/O or delivery failure.
    Internal,
}

/// Common error type for the Startpage library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured storage errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Structured page, section and link errors
    #[error(transparent)]
    Page(page::PageError),

    /// Structured account errors from the user module
    #[error(transparent)]
    User(user::UserError),

    /// Structured import/export errors
    #[error(transparent)]
    Codec(codec::CodecError),

    /// Structured notification delivery errors
    #[error(transparent)]
    Notify(events::NotifyError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Backend(_) => "backend",
            Error::Page(_) => "page",
            Error::User(_) => "user",
            Error::Codec(_) => "codec",
            Error::Notify(_) => "events",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        if self.is_not_found() {
            ErrorKind::NotFound
        } else if self.is_forbidden() {
            ErrorKind::Forbidden
        } else if self.is_capacity_exceeded() {
            ErrorKind::CapacityExceeded
        } else if self.is_invalid_format() {
            ErrorKind::InvalidFormat
        } else if self.is_invalid_input() {
            ErrorKind::InvalidInput
        } else if self.is_conflict() {
            ErrorKind::Conflict
        } else {
            ErrorKind::Internal
        }
    }

    /// Check if this error indicates a resource was not found (or is not owned by the caller).
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Backend(err) => err.is_not_found(),
            Error::Page(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates explicit access to another account's data.
    pub fn is_forbidden(&self) -> bool {
        match self {
            Error::Page(err) => err.is_forbidden(),
            _ => false,
        }
    }

    /// Check if this error indicates the per-section link cap was hit.
    pub fn is_capacity_exceeded(&self) -> bool {
        match self {
            Error::Page(err) => err.is_capacity_exceeded(),
            _ => false,
        }
    }

    /// Check if this error is validation-related.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Error::Page(err) => err.is_invalid_input(),
            Error::User(err) => err.is_invalid_input(),
            _ => false,
        }
    }

    /// Check if this error indicates a malformed import document.
    pub fn is_invalid_format(&self) -> bool {
        matches!(self, Error::Codec(_))
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Backend(err) => err.is_conflict(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Backend(err) => err.is_io_error(),
            _ => false,
        }
    }
}
