/*! Integration tests for Startpage.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * Modules:
 * - reorder: drag-and-drop section and link reorders, including moves
 * - ownership: cross-owner isolation of every single-item operation
 * - concurrency: racing writers against default pages and link caps
 * - pages: page lifecycle, default-page policy and composition
 * - codec: export/import documents
 * - settings: the settings singleton cache and color schemes
 * - users: registration, login and profile changes
 * - events: domain event dispatch
 * - digest: the daily summary mail
 * - backend: backend-specific persistence (SQLite files, JSON snapshots)
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("startpage=info")),
        )
        .with_test_writer()
        .try_init();
}

mod backend;
mod codec;
mod concurrency;
mod digest;
mod events;
mod helpers;
mod ownership;
mod pages;
mod reorder;
mod settings;
mod users;
