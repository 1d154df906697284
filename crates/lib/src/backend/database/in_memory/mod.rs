//! In-memory database backend implementation
//!
//! This module provides an in-memory implementation of the `BackendImpl`
//! trait, suitable for testing, development, or single-process deployments
//! that snapshot their state to a JSON file on shutdown.

mod persistence;
mod storage;

use std::any::Any;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Result;
use crate::backend::BackendImpl;
use crate::codec::PageDocument;
use crate::model::{
    ColorSchemeId, Link, LinkId, NewUser, Page, PageId, Section, SectionId, User, UserId,
};
use crate::settings::{ColorScheme, GlobalSettings, NewColorScheme};

use storage::State;

/// A simple in-memory backend keeping every row in ordered maps.
///
/// All rows sit behind a single `RwLock`. Each repository operation holds the
/// lock for its whole duration, so multi-row operations (reorders, default
/// switches, cascading deletes, imports) are all-or-nothing and never
/// observed half-applied.
///
/// It provides basic persistence capabilities via `save_to_file` and
/// `load_from_file`, serializing the rows to JSON.
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) state: RwLock<State>,
}

impl InMemory {
    /// Creates a new, empty `InMemory` backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn from_state(state: State) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Saves the entire backend state to a specified file as JSON.
    ///
    /// # Arguments
    /// * `path` - The path to the file where the state should be saved.
    ///
    /// # Returns
    /// A `Result` indicating success or an I/O or serialization error.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads the backend state from a specified JSON file.
    ///
    /// If the file does not exist, a new, empty `InMemory` backend is returned.
    ///
    /// # Arguments
    /// * `path` - The path to the file from which to load the state.
    ///
    /// # Returns
    /// A `Result` containing the loaded `InMemory` backend or an I/O or deserialization error.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }

    /// Number of stored pages across all owners.
    pub async fn page_count(&self) -> usize {
        self.state.read().await.pages.len()
    }
}

#[async_trait]
impl BackendImpl for InMemory {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        self.state.write().await.create_user(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User> {
        self.state.read().await.get_user(id)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.state.read().await.find_user_by_username(username))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.state.read().await.list_users())
    }

    async fn rename_user(&self, id: UserId, username: &str) -> Result<()> {
        self.state.write().await.rename_user(id, username)
    }

    async fn set_avatar(&self, id: UserId, avatar: Option<&str>) -> Result<()> {
        self.state.write().await.set_avatar(id, avatar)
    }

    async fn set_color_scheme(&self, id: UserId, scheme: Option<ColorSchemeId>) -> Result<()> {
        self.state.write().await.set_color_scheme(id, scheme)
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        self.state.write().await.delete_user(id)
    }

    async fn create_page(&self, owner: UserId, title: &str, make_default: bool) -> Result<Page> {
        self.state
            .write()
            .await
            .create_page(owner, title, make_default)
    }

    async fn get_page(&self, owner: UserId, id: PageId) -> Result<Page> {
        self.state.read().await.get_page(owner, id)
    }

    async fn list_pages(&self, owner: UserId) -> Result<Vec<Page>> {
        Ok(self.state.read().await.list_pages(owner))
    }

    async fn update_page(
        &self,
        owner: UserId,
        id: PageId,
        title: &str,
        make_default: bool,
    ) -> Result<Page> {
        self.state
            .write()
            .await
            .update_page(owner, id, title, make_default)
    }

    async fn set_default_page(&self, owner: UserId, id: PageId) -> Result<()> {
        self.state.write().await.set_default_page(owner, id)
    }

    async fn delete_page(&self, owner: UserId, id: PageId) -> Result<()> {
        self.state.write().await.delete_page(owner, id)
    }

    async fn create_section(&self, owner: UserId, page: PageId, name: &str) -> Result<Section> {
        self.state.write().await.create_section(owner, page, name)
    }

    async fn get_section(&self, owner: UserId, id: SectionId) -> Result<Section> {
        self.state.read().await.get_section(owner, id)
    }

    async fn list_sections(&self, owner: UserId, page: PageId) -> Result<Vec<Section>> {
        self.state.read().await.list_sections(owner, page)
    }

    async fn rename_section(&self, owner: UserId, id: SectionId, name: &str) -> Result<()> {
        self.state.write().await.rename_section(owner, id, name)
    }

    async fn delete_section(&self, owner: UserId, id: SectionId) -> Result<()> {
        self.state.write().await.delete_section(owner, id)
    }

    async fn reorder_sections(&self, owner: UserId, ids: &[SectionId]) -> Result<()> {
        self.state.write().await.reorder_sections(owner, ids)
    }

    async fn create_link(
        &self,
        owner: UserId,
        section: SectionId,
        name: &str,
        url: &str,
    ) -> Result<Link> {
        self.state
            .write()
            .await
            .create_link(owner, section, name, url)
    }

    async fn get_link(&self, owner: UserId, id: LinkId) -> Result<Link> {
        self.state.read().await.get_link(owner, id)
    }

    async fn list_page_links(&self, owner: UserId, page: PageId) -> Result<Vec<Link>> {
        self.state.read().await.list_page_links(owner, page)
    }

    async fn update_link(&self, owner: UserId, id: LinkId, name: &str, url: &str) -> Result<()> {
        self.state.write().await.update_link(owner, id, name, url)
    }

    async fn delete_link(&self, owner: UserId, id: LinkId) -> Result<()> {
        self.state.write().await.delete_link(owner, id)
    }

    async fn reorder_links(&self, owner: UserId, target: SectionId, ids: &[LinkId]) -> Result<()> {
        self.state.write().await.reorder_links(owner, target, ids)
    }

    async fn import_page(&self, owner: UserId, document: &PageDocument) -> Result<Page> {
        self.state.write().await.import_page(owner, document)
    }

    async fn load_settings(&self) -> Result<Option<GlobalSettings>> {
        Ok(self.state.read().await.settings)
    }

    async fn store_settings(&self, settings: &GlobalSettings) -> Result<()> {
        self.state.write().await.settings = Some(*settings);
        Ok(())
    }

    async fn list_color_schemes(&self) -> Result<Vec<ColorScheme>> {
        Ok(self.state.read().await.list_color_schemes())
    }

    async fn get_color_scheme(&self, id: ColorSchemeId) -> Result<ColorScheme> {
        self.state.read().await.get_color_scheme(id)
    }

    async fn add_color_scheme(&self, scheme: &NewColorScheme) -> Result<ColorScheme> {
        Ok(self.state.write().await.add_color_scheme(scheme))
    }

    async fn delete_color_scheme(&self, id: ColorSchemeId) -> Result<()> {
        self.state.write().await.delete_color_scheme(id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn alice() -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            is_staff: false,
            date_joined: Utc::now(),
            password_hash: None,
        }
    }

    #[tokio::test]
    async fn failed_reorder_changes_nothing() {
        let backend = InMemory::new();
        let owner = backend.create_user(alice()).await.unwrap().id;
        let page = backend.create_page(owner, "Home", false).await.unwrap();
        let full = backend.create_section(owner, page.id, "Full").await.unwrap();
        let other = backend.create_section(owner, page.id, "Other").await.unwrap();
        for i in 0..10 {
            backend
                .create_link(owner, full.id, &format!("l{i}"), "https://example.com")
                .await
                .unwrap();
        }
        let mover = backend
            .create_link(owner, other.id, "mover", "https://example.com")
            .await
            .unwrap();

        let before = backend.state.read().await.links.clone();
        let err = backend
            .reorder_links(owner, full.id, &[mover.id])
            .await
            .unwrap_err();
        assert!(err.is_capacity_exceeded());
        assert_eq!(backend.state.read().await.links, before);
    }

    #[tokio::test]
    async fn snapshot_keeps_id_counters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("startpage.json");

        let backend = InMemory::new();
        let owner = backend.create_user(alice()).await.unwrap().id;
        let first = backend.create_page(owner, "One", false).await.unwrap();
        let second = backend.create_page(owner, "Two", false).await.unwrap();
        backend.delete_page(owner, second.id).await.unwrap();
        backend.save_to_file(&path).await.unwrap();

        let loaded = InMemory::load_from_file(&path).await.unwrap();
        assert_eq!(loaded.page_count().await, 1);
        assert!(loaded.get_page(owner, first.id).await.unwrap().is_default);
        let third = loaded.create_page(owner, "Three", false).await.unwrap();
        assert!(third.id > second.id);
    }

    #[tokio::test]
    async fn missing_snapshot_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = InMemory::load_from_file(dir.path().join("absent.json"))
            .await
            .unwrap();
        assert_eq!(loaded.page_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_snapshot_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("startpage.json");
        tokio::fs::write(&path, r#"{"_v": 7}"#).await.unwrap();
        let err = InMemory::load_from_file(&path).await.unwrap_err();
        assert!(err.is_io_error());
    }
}
