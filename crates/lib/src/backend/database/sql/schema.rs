//! SQL schema definitions and migrations.
//!
//! This module contains the database schema used by SQL backends.
//! The schema is portable between SQLite and Postgres except for row id
//! columns, written as `{ID}` and expanded per dialect by [`id_column`].
//!
//! Booleans are stored as `BIGINT` 0/1 and timestamps as `BIGINT`
//! milliseconds since the Unix epoch, both of which sqlx's `Any` driver
//! decodes the same way on every database.
//!
//! # Migration System
//!
//! The migration system uses code-based migrations rather than SQL files to handle
//! dialect differences between SQLite and PostgreSQL. Each migration is a function
//! that receives the backend and can execute database-specific SQL as needed.
//!
//! ## Adding a New Migration
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a new `migrate_vN_to_vM` async function
//! 3. Add the migration to the match statement in `run_migration`
//! 4. Document what the migration does

use crate::Result;
use crate::backend::errors::BackendError;

use super::{DbKind, SqlxBackend};

/// Current schema version.
///
/// Increment this when making schema changes that require migration.
pub const SCHEMA_VERSION: i64 = 1;

/// SQL statements to create the schema tables, in dependency order.
pub const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY
    )",
    // preview_colors is a JSON array of CSS colors
    "CREATE TABLE IF NOT EXISTS color_schemes (
        id {ID},
        name TEXT NOT NULL,
        is_dark BIGINT NOT NULL DEFAULT 0,
        preview_colors TEXT NOT NULL DEFAULT '[]',
        css_variables TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id {ID},
        username TEXT NOT NULL,
        email TEXT NOT NULL DEFAULT '',
        is_staff BIGINT NOT NULL DEFAULT 0,
        date_joined BIGINT NOT NULL,
        avatar TEXT,
        color_scheme_id BIGINT REFERENCES color_schemes(id),
        password_hash TEXT
    )",
    "CREATE TABLE IF NOT EXISTS pages (
        id {ID},
        owner_id BIGINT NOT NULL REFERENCES users(id),
        title TEXT NOT NULL,
        slug TEXT NOT NULL,
        is_default BIGINT NOT NULL DEFAULT 0,
        UNIQUE (owner_id, title),
        UNIQUE (slug)
    )",
    // sort_order: ORDER is a reserved word
    "CREATE TABLE IF NOT EXISTS sections (
        id {ID},
        page_id BIGINT NOT NULL REFERENCES pages(id),
        name TEXT NOT NULL,
        sort_order BIGINT NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS links (
        id {ID},
        section_id BIGINT NOT NULL REFERENCES sections(id),
        name TEXT NOT NULL,
        url TEXT NOT NULL,
        sort_order BIGINT NOT NULL DEFAULT 0
    )",
    // Singleton row, always id = 1
    "CREATE TABLE IF NOT EXISTS global_settings (
        id BIGINT PRIMARY KEY,
        ntfy_active BIGINT NOT NULL DEFAULT 0,
        daily_mail_active BIGINT NOT NULL DEFAULT 0,
        daily_mail_include_registrations BIGINT NOT NULL DEFAULT 0
    )",
];

/// SQL statements to create indexes.
pub const CREATE_INDEXES: &[&str] = &[
    // Usernames are unique regardless of case
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username_lower ON users(LOWER(username))",
    "CREATE INDEX IF NOT EXISTS idx_pages_owner ON pages(owner_id, id)",
    "CREATE INDEX IF NOT EXISTS idx_sections_page ON sections(page_id, sort_order)",
    "CREATE INDEX IF NOT EXISTS idx_links_section ON links(section_id, sort_order)",
];

/// Auto-incrementing primary key column for `kind`.
pub fn id_column(kind: DbKind) -> &'static str {
    match kind {
        DbKind::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
        DbKind::Postgres => "BIGSERIAL PRIMARY KEY",
    }
}

/// Initialize the database schema.
///
/// Creates tables and indexes if they don't exist, and handles migrations
/// if the schema version has changed.
pub async fn initialize(backend: &SqlxBackend) -> Result<()> {
    let pool = backend.pool();
    let id = id_column(backend.kind());

    for statement in CREATE_TABLES {
        let statement = statement.replace("{ID}", id);
        sqlx::query(&statement)
            .execute(pool)
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Schema creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .map_err(|e| BackendError::SqlxError {
            reason: format!("Failed to check schema version: {e}"),
            source: Some(e),
        })?;

    if row.is_none() {
        sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
            .bind(SCHEMA_VERSION)
            .execute(pool)
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Failed to initialize schema version: {e}"),
                source: Some(e),
            })?;
    } else if let Some((current_version,)) = row {
        if current_version > SCHEMA_VERSION {
            return Err(BackendError::SqlxError {
                reason: format!(
                    "Database schema v{current_version} is newer than this build supports (v{SCHEMA_VERSION})"
                ),
                source: None,
            }
            .into());
        }
        if current_version < SCHEMA_VERSION {
            migrate(backend, current_version, SCHEMA_VERSION).await?;
        }
    }

    for statement in CREATE_INDEXES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Index creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    Ok(())
}

/// Run migrations sequentially from one schema version to another.
async fn migrate(backend: &SqlxBackend, from: i64, to: i64) -> Result<()> {
    tracing::info!(from, to, "Starting SQL schema migration");

    let mut current = from;
    while current < to {
        let next = current + 1;
        tracing::info!(from = current, to = next, "Running migration");

        run_migration(backend, current, next).await?;

        sqlx::query("UPDATE schema_version SET version = $1")
            .bind(next)
            .execute(backend.pool())
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Failed to update schema version to {next}: {e}"),
                source: Some(e),
            })?;

        tracing::info!(version = next, "Migration completed");
        current = next;
    }

    tracing::info!(from, to, "All migrations completed successfully");
    Ok(())
}

/// Execute a single migration step.
///
/// There are no migrations yet; version 1 is the first schema.
async fn run_migration(backend: &SqlxBackend, from: i64, to: i64) -> Result<()> {
    let _ = backend;

    Err(BackendError::SqlxError {
        reason: format!(
            "Unknown migration path: v{from} to v{to}. \
             This likely means SCHEMA_VERSION was incremented without adding a migration."
        ),
        source: None,
    }
    .into())
}
