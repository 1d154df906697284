//! Persistence operations for the InMemory backend
//!
//! This module handles serialization and file I/O for saving/loading
//! the in-memory state to/from JSON files.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::InMemory;
use super::storage::{Counters, State};
use crate::{
    Error, Result,
    backend::errors::BackendError,
    model::{Link, Page, Section, User},
    settings::{ColorScheme, GlobalSettings},
};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the persistence version during deserialization.
fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// Last ids handed out, so deleted ids are never reused after a reload.
#[derive(Serialize, Deserialize, Default)]
struct SerializableCounters {
    #[serde(default)]
    user: i64,
    #[serde(default)]
    page: i64,
    #[serde(default)]
    section: i64,
    #[serde(default)]
    link: i64,
    #[serde(default)]
    color_scheme: i64,
}

/// Serializable snapshot of the InMemory backend.
///
/// Rows are stored as lists; the maps are rebuilt on load.
#[derive(Serialize, Deserialize)]
struct SerializableState {
    /// File format version for compatibility checking
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    pages: Vec<Page>,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    links: Vec<Link>,
    #[serde(default)]
    color_schemes: Vec<ColorScheme>,
    #[serde(default)]
    settings: Option<GlobalSettings>,
    #[serde(default)]
    counters: SerializableCounters,
}

fn highest<T>(rows: &[T], id: impl Fn(&T) -> i64, counter: i64) -> i64 {
    rows.iter().map(id).fold(counter, i64::max)
}

impl SerializableState {
    fn capture(state: &State) -> Self {
        Self {
            version: PERSISTENCE_VERSION,
            users: state.users.values().cloned().collect(),
            pages: state.pages.values().cloned().collect(),
            sections: state.sections.values().cloned().collect(),
            links: state.links.values().cloned().collect(),
            color_schemes: state.color_schemes.values().cloned().collect(),
            settings: state.settings,
            counters: SerializableCounters {
                user: state.counters.user,
                page: state.counters.page,
                section: state.counters.section,
                link: state.counters.link,
                color_scheme: state.counters.color_scheme,
            },
        }
    }

    fn restore(self) -> State {
        // Counters never fall behind the highest stored id, even for hand-edited files.
        let counters = Counters {
            user: highest(&self.users, |r| r.id.get(), self.counters.user),
            page: highest(&self.pages, |r| r.id.get(), self.counters.page),
            section: highest(&self.sections, |r| r.id.get(), self.counters.section),
            link: highest(&self.links, |r| r.id.get(), self.counters.link),
            color_scheme: highest(
                &self.color_schemes,
                |r| r.id.get(),
                self.counters.color_scheme,
            ),
        };
        State {
            users: self.users.into_iter().map(|r| (r.id, r)).collect(),
            pages: self.pages.into_iter().map(|r| (r.id, r)).collect(),
            sections: self.sections.into_iter().map(|r| (r.id, r)).collect(),
            links: self.links.into_iter().map(|r| (r.id, r)).collect(),
            color_schemes: self.color_schemes.into_iter().map(|r| (r.id, r)).collect(),
            settings: self.settings,
            counters,
        }
    }
}

/// Saves the entire backend state to a specified file as JSON.
pub(crate) async fn save_to_file<P: AsRef<Path>>(backend: &InMemory, path: P) -> Result<()> {
    let serializable = {
        let state = backend.state.read().await;
        SerializableState::capture(&state)
    };

    let json = serde_json::to_string_pretty(&serializable)
        .map_err(|e| -> Error { BackendError::SerializationFailed { source: e }.into() })?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| -> Error { BackendError::FileIo { source: e }.into() })
}

/// Loads the backend state from a specified JSON file.
///
/// If the file does not exist, a new, empty `InMemory` backend is returned.
pub(crate) async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<InMemory> {
    match tokio::fs::read_to_string(path).await {
        Ok(json) => {
            let serializable: SerializableState = serde_json::from_str(&json).map_err(|e| -> Error {
                BackendError::DeserializationFailed { source: e }.into()
            })?;
            Ok(InMemory::from_state(serializable.restore()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(InMemory::new()),
        Err(e) => Err(BackendError::FileIo { source: e }.into()),
    }
}
