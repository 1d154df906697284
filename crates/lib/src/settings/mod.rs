//! Site-wide settings singleton and color schemes.
//!
//! [`GlobalSettings`] is read on nearly every side effect (notifications,
//! digest) and written rarely by an administrator. It is held in a
//! [`SettingsCache`] that is lazily populated on first read and replaced on
//! every write through [`Startpages::update_settings`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{ColorSchemeId, Result, Startpages, UserId, backend::BackendImpl, page::validate};

/// Administrator-controlled switches.
///
/// All switches default to off, which is also what an unset singleton reads as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Send push notifications for domain events.
    #[serde(default)]
    pub ntfy_active: bool,
    /// Send the daily digest mail.
    #[serde(default)]
    pub daily_mail_active: bool,
    /// List the previous day's registrations in the digest.
    #[serde(default)]
    pub daily_mail_include_registrations: bool,
}

/// A selectable visual theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub id: ColorSchemeId,
    pub name: String,
    pub is_dark: bool,
    /// A few CSS colors shown as swatches in the theme picker.
    pub preview_colors: Vec<String>,
    /// CSS custom property declarations injected into rendered pages.
    pub css_variables: String,
}

/// Fields for adding a color scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewColorScheme {
    pub name: String,
    #[serde(default)]
    pub is_dark: bool,
    #[serde(default)]
    pub preview_colors: Vec<String>,
    #[serde(default)]
    pub css_variables: String,
}

/// Process-wide holder for the settings singleton.
///
/// Stale-until-next-write: readers get the last loaded value; a write through
/// this cache replaces it. Concurrent writers are last-write-wins.
#[derive(Debug, Default)]
pub struct SettingsCache {
    current: RwLock<Option<Arc<GlobalSettings>>>,
}

impl SettingsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached settings, loading them from `backend` on first use.
    pub async fn get(&self, backend: &dyn BackendImpl) -> Result<Arc<GlobalSettings>> {
        if let Some(settings) = self.current.read().await.as_ref() {
            return Ok(Arc::clone(settings));
        }

        let mut slot = self.current.write().await;
        // Another reader may have loaded it while we waited for the lock.
        if let Some(settings) = slot.as_ref() {
            return Ok(Arc::clone(settings));
        }
        let loaded = Arc::new(backend.load_settings().await?.unwrap_or_default());
        tracing::debug!(settings = ?loaded, "Loaded site settings");
        *slot = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Persist `settings` and replace the cached value.
    pub async fn store(
        &self,
        backend: &dyn BackendImpl,
        settings: GlobalSettings,
    ) -> Result<Arc<GlobalSettings>> {
        let mut slot = self.current.write().await;
        backend.store_settings(&settings).await?;
        let stored = Arc::new(settings);
        *slot = Some(Arc::clone(&stored));
        Ok(stored)
    }
}

impl Startpages {
    /// Current site settings.
    pub async fn global_settings(&self) -> Result<Arc<GlobalSettings>> {
        self.settings_cache().get(self.backend()).await
    }

    /// Replace the site settings.
    pub async fn update_settings(&self, settings: GlobalSettings) -> Result<Arc<GlobalSettings>> {
        let stored = self
            .settings_cache()
            .store(self.backend(), settings)
            .await?;
        tracing::info!(settings = ?stored, "Site settings updated");
        Ok(stored)
    }

    /// All color schemes, ordered by id.
    pub async fn list_color_schemes(&self) -> Result<Vec<ColorScheme>> {
        self.backend().list_color_schemes().await
    }

    /// Add a color scheme.
    pub async fn add_color_scheme(&self, scheme: NewColorScheme) -> Result<ColorScheme> {
        let scheme = NewColorScheme {
            name: validate::name(&scheme.name)?,
            ..scheme
        };
        let created = self.backend().add_color_scheme(&scheme).await?;
        tracing::info!(scheme_id = %created.id, name = %created.name, "Color scheme added");
        Ok(created)
    }

    /// Delete a color scheme. Accounts that selected it fall back to none.
    pub async fn delete_color_scheme(&self, id: ColorSchemeId) -> Result<()> {
        self.backend().delete_color_scheme(id).await?;
        tracing::info!(scheme_id = %id, "Color scheme deleted");
        Ok(())
    }

    /// The scheme an account selected, if it still exists.
    pub async fn theme_for(&self, user: UserId) -> Result<Option<ColorScheme>> {
        let user = self.backend().get_user(user).await?;
        match user.color_scheme {
            Some(id) => match self.backend().get_color_scheme(id).await {
                Ok(scheme) => Ok(Some(scheme)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            },
            None => Ok(None),
        }
    }
}
