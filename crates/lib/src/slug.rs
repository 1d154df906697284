//! URL-safe page slugs.
//!
//! A page's slug is a pure function of its title. It is recomputed on every
//! save and never accepted from a client.

use crate::Result;
use crate::page::PageError;

/// Maximum stored slug length.
pub const MAX_SLUG_LEN: usize = 255;

/// Derive the slug for a page title.
///
/// Non-ASCII characters are transliterated; anything that is not an ASCII
/// letter or digit collapses into a single hyphen.
pub fn slugify(title: &str) -> String {
    let mut slug = ::slug::slugify(title);
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// Derive a slug and reject titles that produce an empty one.
pub fn slug_for_title(title: &str) -> Result<String> {
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(PageError::InvalidField {
            field: "title",
            reason: "title must contain at least one letter or digit".to_string(),
        }
        .into());
    }
    Ok(slug)
}
