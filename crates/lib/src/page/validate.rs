//! Field validation for live edits.
//!
//! Values are trimmed before checking; the trimmed value is what gets stored.
//! Import documents only go through the length checks (see `codec`).

use url::Url;

use crate::Result;
use crate::constants::{MAX_NAME_LEN, MAX_TITLE_LEN, MAX_URL_LEN};
use crate::page::PageError;

/// URL schemes accepted for links added or edited in place.
const LINK_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps"];

fn bounded(field: &'static str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PageError::InvalidField {
            field,
            reason: format!("{field} is required"),
        }
        .into());
    }
    if value.chars().count() > max {
        return Err(PageError::InvalidField {
            field,
            reason: format!("at most {max} characters allowed"),
        }
        .into());
    }
    Ok(value.to_string())
}

/// A page title, 1..=100 characters.
pub fn title(value: &str) -> Result<String> {
    bounded("title", value, MAX_TITLE_LEN)
}

/// A section or link name, 1..=100 characters.
pub fn name(value: &str) -> Result<String> {
    bounded("name", value, MAX_NAME_LEN)
}

/// A link URL: 1..=500 characters, absolute, with a web scheme.
pub fn url(value: &str) -> Result<String> {
    let value = url_length(value)?;
    let parsed = Url::parse(&value).map_err(|e| PageError::InvalidField {
        field: "url",
        reason: format!("not a valid URL: {e}"),
    })?;
    if !LINK_SCHEMES.contains(&parsed.scheme()) {
        return Err(PageError::InvalidField {
            field: "url",
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        }
        .into());
    }
    Ok(value)
}

/// Length-only URL check, used where placeholders such as `#` are allowed.
pub fn url_length(value: &str) -> Result<String> {
    bounded("url", value, MAX_URL_LEN)
}
