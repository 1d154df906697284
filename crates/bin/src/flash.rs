//! One-shot flash messages carried across a redirect in a cookie.

use serde::Serialize;
use tower_cookies::{Cookie, Cookies};

const FLASH_COOKIE: &str = "startpage_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    /// Form-encoded so the value stays a valid cookie value.
    fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("level", self.level.as_str())
            .append_pair("message", &self.message)
            .finish()
    }

    fn decode(value: &str) -> Option<Self> {
        let mut level = None;
        let mut message = None;
        for (key, val) in url::form_urlencoded::parse(value.as_bytes()) {
            match key.as_ref() {
                "level" => {
                    level = match val.as_ref() {
                        "success" => Some(Level::Success),
                        "error" => Some(Level::Error),
                        _ => None,
                    }
                }
                "message" => message = Some(val.into_owned()),
                _ => {}
            }
        }
        Some(Self {
            level: level?,
            message: message?,
        })
    }
}

pub fn success(cookies: &Cookies, message: impl Into<String>) {
    set(cookies, Level::Success, message.into());
}

pub fn error(cookies: &Cookies, message: impl Into<String>) {
    set(cookies, Level::Error, message.into());
}

fn set(cookies: &Cookies, level: Level, message: String) {
    let mut cookie = Cookie::new(FLASH_COOKIE, Flash { level, message }.encode());
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookies.add(cookie);
}

/// Read and clear the pending flash message, if any.
pub fn take(cookies: &Cookies) -> Option<Flash> {
    let value = cookies.get(FLASH_COOKIE)?.value().to_string();
    let mut removal = Cookie::from(FLASH_COOKIE);
    removal.set_path("/");
    cookies.remove(removal);
    Flash::decode(&value)
}

/// Decode the flash message set by a `Set-Cookie` header.
#[cfg(test)]
pub(crate) fn from_set_cookie(header: &str) -> Option<Flash> {
    let cookie = Cookie::parse_encoded(header.to_string()).ok()?;
    if cookie.name() != FLASH_COOKIE {
        return None;
    }
    Flash::decode(cookie.value())
}
