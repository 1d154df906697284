//! Storage backends for Startpage data.
//!
//! The [`BackendImpl`] trait is the Repository: owner-scoped persistence for
//! pages, sections and links, plus the account rows and the site-wide settings
//! singleton.
//!
//! ## Ownership
//!
//! Every method taking an `owner` re-verifies ownership on its own: a page
//! directly through `Page.owner`, a section through its page, a link through
//! its section's page. There is no "already authorized" shortcut between calls.
//! Failed checks surface as the matching `*NotFound` error.
//!
//! ## Atomicity
//!
//! The multi-row operations (`reorder_sections`, `reorder_links`,
//! `set_default_page`, `update_page`, `delete_page`, `import_page` and the
//! cascading deletes) are all-or-nothing. SQL backends run them in one
//! transaction; the in-memory backend holds its write lock for the whole call.
//! A link move writes `section` and `order` in the same row update.

use std::any::Any;

use async_trait::async_trait;

use crate::Result;
use crate::codec::PageDocument;
use crate::model::{
    ColorSchemeId, Link, LinkId, NewUser, Page, PageId, Section, SectionId, User, UserId,
};
use crate::settings::{ColorScheme, GlobalSettings, NewColorScheme};

pub mod database;
pub mod errors;

pub use errors::BackendError;

/// Owner-scoped persistence for start pages.
///
/// All implementations must be `Send` and `Sync` to be shared across request
/// handlers, and implement `Any` to allow downcasting (e.g. to snapshot an
/// in-memory backend on shutdown).
#[async_trait]
pub trait BackendImpl: Send + Sync + Any {
    // ----- accounts -----

    /// Insert a new account. Usernames are unique case-insensitively.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Fetch an account by id.
    async fn get_user(&self, id: UserId) -> Result<User>;

    /// Case-insensitive username lookup.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// All accounts, ordered by id.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Change a username, keeping case-insensitive uniqueness (the account itself excluded).
    async fn rename_user(&self, id: UserId, username: &str) -> Result<()>;

    /// Replace the avatar reference.
    async fn set_avatar(&self, id: UserId, avatar: Option<&str>) -> Result<()>;

    /// Select a color scheme (or none). The scheme must exist.
    async fn set_color_scheme(&self, id: UserId, scheme: Option<ColorSchemeId>) -> Result<()>;

    /// Delete an account and, transitively, all of its pages.
    async fn delete_user(&self, id: UserId) -> Result<()>;

    // ----- pages -----

    /// Create a page for `owner`.
    ///
    /// The slug is derived from `title`. The owner's first page is always the
    /// default; otherwise `make_default` clears the flag on the owner's other
    /// pages before it is set on the new one.
    async fn create_page(&self, owner: UserId, title: &str, make_default: bool) -> Result<Page>;

    /// Fetch one of `owner`'s pages.
    async fn get_page(&self, owner: UserId, id: PageId) -> Result<Page>;

    /// All of `owner`'s pages, ordered by id.
    async fn list_pages(&self, owner: UserId) -> Result<Vec<Page>>;

    /// Retitle a page (recomputing its slug) and optionally make it the default.
    ///
    /// `make_default = false` never clears the flag: an owner with pages always keeps one default.
    async fn update_page(
        &self,
        owner: UserId,
        id: PageId,
        title: &str,
        make_default: bool,
    ) -> Result<Page>;

    /// Make `id` the owner's only default page.
    async fn set_default_page(&self, owner: UserId, id: PageId) -> Result<()>;

    /// Delete a page with its sections and links.
    ///
    /// If it was the default, the owner's lowest-id remaining page is promoted.
    async fn delete_page(&self, owner: UserId, id: PageId) -> Result<()>;

    // ----- sections -----

    /// Append a section after the page's current last section.
    async fn create_section(&self, owner: UserId, page: PageId, name: &str) -> Result<Section>;

    /// Fetch a section owned (through its page) by `owner`.
    async fn get_section(&self, owner: UserId, id: SectionId) -> Result<Section>;

    /// A page's sections ordered by `order`, then id.
    async fn list_sections(&self, owner: UserId, page: PageId) -> Result<Vec<Section>>;

    /// Rename a section.
    async fn rename_section(&self, owner: UserId, id: SectionId, name: &str) -> Result<()>;

    /// Delete a section and its links.
    async fn delete_section(&self, owner: UserId, id: SectionId) -> Result<()>;

    /// Rewrite section order from a client-submitted sequence.
    ///
    /// Ids not owned by `owner` are skipped; see [`crate::ordering::plan_sections`].
    async fn reorder_sections(&self, owner: UserId, ids: &[SectionId]) -> Result<()>;

    // ----- links -----

    /// Append a link to a section, failing when the section is full.
    async fn create_link(
        &self,
        owner: UserId,
        section: SectionId,
        name: &str,
        url: &str,
    ) -> Result<Link>;

    /// Fetch a link owned (through section and page) by `owner`.
    async fn get_link(&self, owner: UserId, id: LinkId) -> Result<Link>;

    /// All links of a page ordered by section, then `order`, then id.
    async fn list_page_links(&self, owner: UserId, page: PageId) -> Result<Vec<Link>>;

    /// Replace a link's name and URL.
    async fn update_link(&self, owner: UserId, id: LinkId, name: &str, url: &str) -> Result<()>;

    /// Delete a link.
    async fn delete_link(&self, owner: UserId, id: LinkId) -> Result<()>;

    /// Rewrite link order under `target`, moving links into it as needed.
    ///
    /// The target must be owned (else `SectionNotFound`). Requests naming more
    /// than the per-section cap, or leaving the target over the cap, change
    /// nothing. Unowned link ids are skipped.
    async fn reorder_links(&self, owner: UserId, target: SectionId, ids: &[LinkId]) -> Result<()>;

    // ----- import -----

    /// Create a page with all its sections and links in one atomic unit.
    ///
    /// The page becomes the default only if the owner had no pages before.
    /// The per-section link cap is not applied here.
    async fn import_page(&self, owner: UserId, document: &PageDocument) -> Result<Page>;

    // ----- site settings -----

    /// Load the settings singleton, if it was ever stored.
    async fn load_settings(&self) -> Result<Option<GlobalSettings>>;

    /// Store the settings singleton, replacing any previous row.
    async fn store_settings(&self, settings: &GlobalSettings) -> Result<()>;

    /// All color schemes, ordered by id.
    async fn list_color_schemes(&self) -> Result<Vec<ColorScheme>>;

    /// Fetch a color scheme.
    async fn get_color_scheme(&self, id: ColorSchemeId) -> Result<ColorScheme>;

    /// Add a color scheme.
    async fn add_color_scheme(&self, scheme: &NewColorScheme) -> Result<ColorScheme>;

    /// Delete a color scheme; accounts that selected it fall back to none.
    async fn delete_color_scheme(&self, id: ColorSchemeId) -> Result<()>;

    /// Returns a reference to the backend as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}
