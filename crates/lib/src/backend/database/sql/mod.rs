//! SQL-based backend implementations for Startpage storage.
//!
//! This module provides SQL database backends that implement the `BackendImpl` trait,
//! storing accounts, pages, sections and links in relational tables.
//!
//! ## Available Backends
//!
//! - **SQLite** (feature: `sqlite`): Embedded database
//! - **PostgreSQL** (feature: `postgres`): PostgreSQL database
//!
//! ## Architecture
//!
//! The SQL backend uses sqlx with `AnyPool` for multi-database support.
//! Every multi-row write (reorders, default switches, cascading deletes,
//! imports) runs in a single transaction, and every query that touches a
//! page, section or link joins back to `pages.owner_id` so ownership is
//! re-checked at the row level.
//!
//! ## Schema and Migrations
//!
//! The database schema is defined in the [`schema`] module and automatically
//! initialized when connecting. Migrations are handled via code-based functions
//! rather than SQL files to support dialect differences between SQLite and PostgreSQL.

mod pages;
mod storage;

/// Schema definition and migration system.
pub mod schema;

use std::any::Any;
#[cfg(feature = "postgres")]
use std::time::Duration;

use async_trait::async_trait;
use sqlx::AnyPool;
#[cfg(feature = "postgres")]
use sqlx::Executor;
use sqlx::any::AnyPoolOptions;

use crate::Result;
use crate::backend::BackendImpl;
use crate::backend::errors::BackendError;
use crate::codec::PageDocument;
use crate::model::{
    ColorSchemeId, Link, LinkId, NewUser, Page, PageId, Section, SectionId, User, UserId,
};
use crate::settings::{ColorScheme, GlobalSettings, NewColorScheme};

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Similar to `anyhow::Context`, this trait adds a method to convert
/// sqlx errors to `BackendError::SqlxError` with a context message.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to BackendError with context message.
    fn sql_context(self, context: &str) -> Result<T>;

    /// Like `sql_context`, but a unique-constraint violation becomes `conflict()`.
    fn unique_or(self, conflict: impl FnOnce() -> BackendError, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            BackendError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }

    fn unique_or(self, conflict: impl FnOnce() -> BackendError, context: &str) -> Result<T> {
        match self {
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(conflict().into()),
            other => other.sql_context(context),
        }
    }
}

/// Database backend kind for SQL dialect selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// SQLite database
    Sqlite,
    /// PostgreSQL database
    Postgres,
}

/// SQL-based backend implementing `BackendImpl` using sqlx.
///
/// This backend supports both SQLite and PostgreSQL through sqlx's `AnyPool`.
///
/// # Thread Safety
///
/// `SqlxBackend` is `Send + Sync` as required by `BackendImpl`. The underlying
/// sqlx pool handles connection pooling and thread safety.
///
/// # Test Isolation
///
/// For PostgreSQL, each backend instance can use its own schema for test isolation.
/// Use `connect_postgres_isolated()` to create an isolated backend for testing.
#[derive(Debug)]
pub struct SqlxBackend {
    pool: AnyPool,
    kind: DbKind,
}

impl SqlxBackend {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Get the database kind.
    pub fn kind(&self) -> DbKind {
        self.kind
    }

    /// Check if this backend is using SQLite.
    pub fn is_sqlite(&self) -> bool {
        self.kind == DbKind::Sqlite
    }

    /// Check if this backend is using PostgreSQL.
    pub fn is_postgres(&self) -> bool {
        self.kind == DbKind::Postgres
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// SQLite-specific implementations
#[cfg(feature = "sqlite")]
impl SqlxBackend {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use startpage::backend::database::SqlxBackend;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let backend = SqlxBackend::open_sqlite("startpage.db").await.unwrap();
    /// }
    /// ```
    pub async fn open_sqlite<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        // mode=rwc: read-write-create (create file if it doesn't exist)
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_sqlite(&url).await
    }

    /// Connect to a SQLite database using a connection URL.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite connection URL (e.g., "sqlite:./startpage.db")
    pub async fn connect_sqlite(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let is_in_memory = url.contains("mode=memory");

        // The last closed connection destroys a shared in-memory database,
        // so keep one open for the lifetime of the pool.
        let pool = if is_in_memory {
            AnyPoolOptions::new()
                .max_connections(5)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(url)
                .await
                .sql_context("Failed to connect to SQLite")?
        } else {
            AnyPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .sql_context("Failed to connect to SQLite")?
        };

        if is_in_memory {
            sqlx::query("PRAGMA busy_timeout = 5000;")
                .execute(&pool)
                .await
                .sql_context("Failed to configure SQLite")?;
        } else {
            // WAL for concurrent readers; NORMAL durability is safe with WAL.
            sqlx::query(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )
            .execute(&pool)
            .await
            .sql_context("Failed to configure SQLite")?;
        }

        let backend = Self {
            pool,
            kind: DbKind::Sqlite,
        };

        schema::initialize(&backend).await?;

        Ok(backend)
    }

    /// Create an in-memory SQLite database.
    ///
    /// The database exists only for the lifetime of this backend instance.
    /// Useful for testing.
    pub async fn sqlite_in_memory() -> Result<Self> {
        // Shared cache so every pooled connection sees the same database;
        // a unique name keeps instances apart.
        let unique_id = uuid::Uuid::new_v4();
        let url = format!("sqlite:file:mem_{unique_id}?mode=memory&cache=shared");
        Self::connect_sqlite(&url).await
    }
}

// PostgreSQL-specific implementations
#[cfg(feature = "postgres")]
impl SqlxBackend {
    /// Connect to a PostgreSQL database using a connection URL.
    ///
    /// This connects to the default (public) schema. For test isolation,
    /// use `connect_postgres_isolated()` instead.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use startpage::backend::database::SqlxBackend;
    ///
    /// let backend = SqlxBackend::connect_postgres("postgres://localhost/startpage").await.unwrap();
    /// ```
    pub async fn connect_postgres(url: &str) -> Result<Self> {
        Self::connect_postgres_with_schema(url, None).await
    }

    /// Connect to a PostgreSQL database, optionally inside a dedicated schema.
    async fn connect_postgres_with_schema(url: &str, schema_name: Option<String>) -> Result<Self> {
        sqlx::any::install_default_drivers();

        if let Some(ref schema) = schema_name {
            let temp_pool = AnyPoolOptions::new()
                .max_connections(1)
                .connect(url)
                .await
                .sql_context("Failed to connect to PostgreSQL")?;

            let create_schema = format!("CREATE SCHEMA IF NOT EXISTS {schema}");
            sqlx::query(&create_schema)
                .execute(&temp_pool)
                .await
                .sql_context(&format!("Failed to create schema {schema}"))?;

            temp_pool.close().await;
        }

        // Isolated (test) pools stay small so parallel tests do not exhaust
        // the server's max_connections.
        let schema_for_hook = schema_name.clone();
        let mut pool_options = AnyPoolOptions::new();
        if schema_name.is_some() {
            pool_options = pool_options
                .max_connections(2)
                .acquire_timeout(Duration::from_secs(30));
        } else {
            pool_options = pool_options.max_connections(5);
        }

        let pool = pool_options
            .after_connect(move |conn, _meta| {
                let schema = schema_for_hook.clone();
                Box::pin(async move {
                    if let Some(ref s) = schema {
                        let set_path = format!("SET search_path TO {s}");
                        conn.execute(set_path.as_str()).await?;
                    }
                    Ok(())
                })
            })
            .connect(url)
            .await
            .sql_context("Failed to connect to PostgreSQL")?;

        let backend = Self {
            pool,
            kind: DbKind::Postgres,
        };

        schema::initialize(&backend).await?;

        Ok(backend)
    }

    /// Connect to a PostgreSQL database with test isolation.
    ///
    /// Creates a unique schema for this backend instance, ensuring tests
    /// don't interfere with each other when run in parallel.
    pub async fn connect_postgres_isolated(url: &str) -> Result<Self> {
        // Schema names must start with a letter and be lowercase.
        let unique_id = uuid::Uuid::new_v4().simple().to_string();
        let schema_name = format!("test_{unique_id}");
        Self::connect_postgres_with_schema(url, Some(schema_name)).await
    }
}

#[async_trait]
impl BackendImpl for SqlxBackend {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        storage::create_user(self, user).await
    }

    async fn get_user(&self, id: UserId) -> Result<User> {
        storage::get_user(self, id).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        storage::find_user_by_username(self, username).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        storage::list_users(self).await
    }

    async fn rename_user(&self, id: UserId, username: &str) -> Result<()> {
        storage::rename_user(self, id, username).await
    }

    async fn set_avatar(&self, id: UserId, avatar: Option<&str>) -> Result<()> {
        storage::set_avatar(self, id, avatar).await
    }

    async fn set_color_scheme(&self, id: UserId, scheme: Option<ColorSchemeId>) -> Result<()> {
        storage::set_color_scheme(self, id, scheme).await
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        pages::delete_user(self, id).await
    }

    async fn create_page(&self, owner: UserId, title: &str, make_default: bool) -> Result<Page> {
        pages::create_page(self, owner, title, make_default).await
    }

    async fn get_page(&self, owner: UserId, id: PageId) -> Result<Page> {
        pages::get_page(self, owner, id).await
    }

    async fn list_pages(&self, owner: UserId) -> Result<Vec<Page>> {
        pages::list_pages(self, owner).await
    }

    async fn update_page(
        &self,
        owner: UserId,
        id: PageId,
        title: &str,
        make_default: bool,
    ) -> Result<Page> {
        pages::update_page(self, owner, id, title, make_default).await
    }

    async fn set_default_page(&self, owner: UserId, id: PageId) -> Result<()> {
        pages::set_default_page(self, owner, id).await
    }

    async fn delete_page(&self, owner: UserId, id: PageId) -> Result<()> {
        pages::delete_page(self, owner, id).await
    }

    async fn create_section(&self, owner: UserId, page: PageId, name: &str) -> Result<Section> {
        pages::create_section(self, owner, page, name).await
    }

    async fn get_section(&self, owner: UserId, id: SectionId) -> Result<Section> {
        pages::get_section(self, owner, id).await
    }

    async fn list_sections(&self, owner: UserId, page: PageId) -> Result<Vec<Section>> {
        pages::list_sections(self, owner, page).await
    }

    async fn rename_section(&self, owner: UserId, id: SectionId, name: &str) -> Result<()> {
        pages::rename_section(self, owner, id, name).await
    }

    async fn delete_section(&self, owner: UserId, id: SectionId) -> Result<()> {
        pages::delete_section(self, owner, id).await
    }

    async fn reorder_sections(&self, owner: UserId, ids: &[SectionId]) -> Result<()> {
        pages::reorder_sections(self, owner, ids).await
    }

    async fn create_link(
        &self,
        owner: UserId,
        section: SectionId,
        name: &str,
        url: &str,
    ) -> Result<Link> {
        pages::create_link(self, owner, section, name, url).await
    }

    async fn get_link(&self, owner: UserId, id: LinkId) -> Result<Link> {
        pages::get_link(self, owner, id).await
    }

    async fn list_page_links(&self, owner: UserId, page: PageId) -> Result<Vec<Link>> {
        pages::list_page_links(self, owner, page).await
    }

    async fn update_link(&self, owner: UserId, id: LinkId, name: &str, url: &str) -> Result<()> {
        pages::update_link(self, owner, id, name, url).await
    }

    async fn delete_link(&self, owner: UserId, id: LinkId) -> Result<()> {
        pages::delete_link(self, owner, id).await
    }

    async fn reorder_links(&self, owner: UserId, target: SectionId, ids: &[LinkId]) -> Result<()> {
        pages::reorder_links(self, owner, target, ids).await
    }

    async fn import_page(&self, owner: UserId, document: &PageDocument) -> Result<Page> {
        pages::import_page(self, owner, document).await
    }

    async fn load_settings(&self) -> Result<Option<GlobalSettings>> {
        storage::load_settings(self).await
    }

    async fn store_settings(&self, settings: &GlobalSettings) -> Result<()> {
        storage::store_settings(self, settings).await
    }

    async fn list_color_schemes(&self) -> Result<Vec<ColorScheme>> {
        storage::list_color_schemes(self).await
    }

    async fn get_color_scheme(&self, id: ColorSchemeId) -> Result<ColorScheme> {
        storage::get_color_scheme(self, id).await
    }

    async fn add_color_scheme(&self, scheme: &NewColorScheme) -> Result<ColorScheme> {
        storage::add_color_scheme(self, scheme).await
    }

    async fn delete_color_scheme(&self, id: ColorSchemeId) -> Result<()> {
        storage::delete_color_scheme(self, id).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(feature = "sqlite")]
/// Convenience type alias for SQLite backend using sqlx.
pub type Sqlite = SqlxBackend;

#[cfg(feature = "postgres")]
/// Convenience type alias for PostgreSQL backend using sqlx.
pub type Postgres = SqlxBackend;
