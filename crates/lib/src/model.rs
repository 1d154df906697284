//! Domain records: accounts, pages, sections and links.
//!
//! Identifiers are thin newtypes over the storage row id so a section id can
//! never be passed where a link id is expected.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// The raw storage row id.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

row_id!(
    /// Account id. Every page, section and link is transitively owned by one.
    UserId
);
row_id!(
    /// Page id.
    PageId
);
row_id!(
    /// Section id.
    SectionId
);
row_id!(
    /// Link id.
    LinkId
);
row_id!(
    /// Color scheme id.
    ColorSchemeId
);

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    /// Opaque reference into the external avatar store.
    pub avatar: Option<String>,
    pub color_scheme: Option<ColorSchemeId>,
    /// Argon2 PHC string; `None` for accounts that cannot log in with a password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

/// Fields for creating an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    pub password_hash: Option<String>,
}

/// A start page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub owner: UserId,
    pub title: String,
    /// Derived from `title` on every save; unique across all owners.
    pub slug: String,
    pub is_default: bool,
}

/// A named group of links within one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub page: PageId,
    pub name: String,
    /// Lower values appear first. Not necessarily contiguous at rest.
    pub order: u32,
}

/// A named URL within one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub section: SectionId,
    pub name: String,
    pub url: String,
    pub order: u32,
}

/// The two kinds of page items that can be edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Section,
    Link,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Section => "section",
            ItemKind::Link => "link",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "section" => Ok(ItemKind::Section),
            "link" => Ok(ItemKind::Link),
            other => Err(crate::page::PageError::InvalidItemType {
                item_type: other.to_string(),
            }
            .into()),
        }
    }
}
