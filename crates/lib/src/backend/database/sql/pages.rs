//! Page, section and link storage for SQL backends.
//!
//! Reads and writes of sections and links join up to `pages.owner_id`, so a
//! row that belongs to someone else is indistinguishable from a missing one.
//! Multi-row changes run in one transaction; an early return drops the
//! transaction, which rolls it back.

use std::collections::HashSet;

use sqlx::AnyConnection;

use crate::Result;
use crate::backend::errors::BackendError;
use crate::codec::PageDocument;
use crate::constants::MAX_LINKS_PER_SECTION;
use crate::model::{Link, LinkId, Page, PageId, Section, SectionId, UserId};
use crate::ordering;
use crate::page::PageError;
use crate::slug::slug_for_title;

use super::storage::{flag, require_user};
use super::{DbKind, SqlxBackend, SqlxResultExt};

type PageRow = (i64, i64, String, String, i64);
type SectionRow = (i64, i64, String, i64);
type LinkRow = (i64, i64, String, String, i64);

fn order_of(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn page_from_row((id, owner, title, slug, is_default): PageRow) -> Page {
    Page {
        id: PageId(id),
        owner: UserId(owner),
        title,
        slug,
        is_default: is_default != 0,
    }
}

fn section_from_row((id, page, name, order): SectionRow) -> Section {
    Section {
        id: SectionId(id),
        page: PageId(page),
        name,
        order: order_of(order),
    }
}

fn link_from_row((id, section, name, url, order): LinkRow) -> Link {
    Link {
        id: LinkId(id),
        section: SectionId(section),
        name,
        url,
        order: order_of(order),
    }
}

// ----- write serialization -----

/// A row whose lock orders competing writers for the rest of a transaction.
#[derive(Clone, Copy)]
enum Guard {
    /// Default-page switches and page counts of one owner.
    Owner(UserId),
    /// Link count of one section.
    Section(SectionId),
}

/// Lock `guard` as the first statement of a transaction.
///
/// PostgreSQL locks the row itself. SQLite admits one writer, so any write
/// statement takes the database lock (waiting out the busy timeout); it has
/// to come before the first read, or a stale snapshot fails the commit.
async fn serialize(backend: &SqlxBackend, conn: &mut AnyConnection, guard: Guard) -> Result<()> {
    let (table, id) = match guard {
        Guard::Owner(owner) => ("users", owner.get()),
        Guard::Section(section) => ("sections", section.get()),
    };
    let statement = match backend.kind() {
        DbKind::Postgres => format!("SELECT id FROM {table} WHERE id = $1 FOR UPDATE"),
        DbKind::Sqlite => format!("UPDATE {table} SET id = id WHERE id = $1"),
    };
    sqlx::query(&statement)
        .bind(id)
        .execute(&mut *conn)
        .await
        .sql_context("Failed to lock row")?;
    Ok(())
}

// ----- ownership-scoped lookups -----

async fn owned_page(conn: &mut AnyConnection, owner: UserId, id: PageId) -> Result<Page> {
    let row: Option<PageRow> = sqlx::query_as(
        "SELECT id, owner_id, title, slug, is_default FROM pages
         WHERE id = $1 AND owner_id = $2",
    )
    .bind(id.get())
    .bind(owner.get())
    .fetch_optional(&mut *conn)
    .await
    .sql_context("Failed to get page")?;
    row.map(page_from_row)
        .ok_or_else(|| BackendError::PageNotFound { id }.into())
}

async fn owned_section(conn: &mut AnyConnection, owner: UserId, id: SectionId) -> Result<Section> {
    let row: Option<SectionRow> = sqlx::query_as(
        "SELECT s.id, s.page_id, s.name, s.sort_order FROM sections s
         JOIN pages p ON p.id = s.page_id
         WHERE s.id = $1 AND p.owner_id = $2",
    )
    .bind(id.get())
    .bind(owner.get())
    .fetch_optional(&mut *conn)
    .await
    .sql_context("Failed to get section")?;
    row.map(section_from_row)
        .ok_or_else(|| BackendError::SectionNotFound { id }.into())
}

async fn owned_link(conn: &mut AnyConnection, owner: UserId, id: LinkId) -> Result<Link> {
    let row: Option<LinkRow> = sqlx::query_as(
        "SELECT l.id, l.section_id, l.name, l.url, l.sort_order FROM links l
         JOIN sections s ON s.id = l.section_id
         JOIN pages p ON p.id = s.page_id
         WHERE l.id = $1 AND p.owner_id = $2",
    )
    .bind(id.get())
    .bind(owner.get())
    .fetch_optional(&mut *conn)
    .await
    .sql_context("Failed to get link")?;
    row.map(link_from_row)
        .ok_or_else(|| BackendError::LinkNotFound { id }.into())
}

// ----- pages -----

/// Title and slug checks for a page being created (`id = None`) or retitled.
async fn check_page_identity(
    conn: &mut AnyConnection,
    owner: UserId,
    id: Option<PageId>,
    title: &str,
    slug: &str,
) -> Result<()> {
    let except = id.map_or(0, PageId::get);

    let title_row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM pages WHERE owner_id = $1 AND title = $2 AND id <> $3")
            .bind(owner.get())
            .bind(title)
            .bind(except)
            .fetch_optional(&mut *conn)
            .await
            .sql_context("Failed to check page title")?;
    if title_row.is_some() {
        return Err(BackendError::TitleTaken {
            title: title.to_string(),
        }
        .into());
    }

    let slug_row: Option<(i64,)> = sqlx::query_as("SELECT id FROM pages WHERE slug = $1 AND id <> $2")
        .bind(slug)
        .bind(except)
        .fetch_optional(&mut *conn)
        .await
        .sql_context("Failed to check page slug")?;
    if slug_row.is_some() {
        return Err(BackendError::SlugTaken {
            slug: slug.to_string(),
        }
        .into());
    }
    Ok(())
}

async fn owner_has_pages(conn: &mut AnyConnection, owner: UserId) -> Result<bool> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pages WHERE owner_id = $1")
        .bind(owner.get())
        .fetch_one(&mut *conn)
        .await
        .sql_context("Failed to count pages")?;
    Ok(count > 0)
}

async fn clear_default(conn: &mut AnyConnection, owner: UserId) -> Result<()> {
    sqlx::query("UPDATE pages SET is_default = 0 WHERE owner_id = $1 AND is_default <> 0")
        .bind(owner.get())
        .execute(&mut *conn)
        .await
        .sql_context("Failed to clear default page")?;
    Ok(())
}

async fn mark_default(conn: &mut AnyConnection, id: PageId) -> Result<()> {
    sqlx::query("UPDATE pages SET is_default = 1 WHERE id = $1")
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .sql_context("Failed to set default page")?;
    Ok(())
}

async fn insert_page(
    conn: &mut AnyConnection,
    owner: UserId,
    title: &str,
    slug: String,
    is_default: bool,
) -> Result<Page> {
    if is_default {
        clear_default(conn, owner).await?;
    }
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO pages (owner_id, title, slug, is_default)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(owner.get())
    .bind(title)
    .bind(&slug)
    .bind(flag(is_default))
    .fetch_one(&mut *conn)
    .await
    .unique_or(
        || BackendError::SlugTaken { slug: slug.clone() },
        "Failed to insert page",
    )?;

    Ok(Page {
        id: PageId(id),
        owner,
        title: title.to_string(),
        slug,
        is_default,
    })
}

pub async fn create_page(
    backend: &SqlxBackend,
    owner: UserId,
    title: &str,
    make_default: bool,
) -> Result<Page> {
    let slug = slug_for_title(title)?;
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;
    serialize(backend, &mut tx, Guard::Owner(owner)).await?;

    require_user(&mut tx, owner).await?;
    check_page_identity(&mut tx, owner, None, title, &slug).await?;
    let is_default = make_default || !owner_has_pages(&mut tx, owner).await?;
    let page = insert_page(&mut tx, owner, title, slug, is_default).await?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(page)
}

pub async fn get_page(backend: &SqlxBackend, owner: UserId, id: PageId) -> Result<Page> {
    let mut conn = backend
        .pool()
        .acquire()
        .await
        .sql_context("Failed to acquire connection")?;
    owned_page(&mut conn, owner, id).await
}

/// The owner's pages, ordered by id.
pub async fn list_pages(backend: &SqlxBackend, owner: UserId) -> Result<Vec<Page>> {
    let rows: Vec<PageRow> = sqlx::query_as(
        "SELECT id, owner_id, title, slug, is_default FROM pages
         WHERE owner_id = $1 ORDER BY id",
    )
    .bind(owner.get())
    .fetch_all(backend.pool())
    .await
    .sql_context("Failed to list pages")?;
    Ok(rows.into_iter().map(page_from_row).collect())
}

pub async fn update_page(
    backend: &SqlxBackend,
    owner: UserId,
    id: PageId,
    title: &str,
    make_default: bool,
) -> Result<Page> {
    let slug = slug_for_title(title)?;
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;
    if make_default {
        serialize(backend, &mut tx, Guard::Owner(owner)).await?;
    }

    let mut page = owned_page(&mut tx, owner, id).await?;
    check_page_identity(&mut tx, owner, Some(id), title, &slug).await?;

    sqlx::query("UPDATE pages SET title = $1, slug = $2 WHERE id = $3")
        .bind(title)
        .bind(&slug)
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .unique_or(
            || BackendError::SlugTaken { slug: slug.clone() },
            "Failed to update page",
        )?;
    if make_default {
        clear_default(&mut tx, owner).await?;
        mark_default(&mut tx, id).await?;
        page.is_default = true;
    }

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;

    page.title = title.to_string();
    page.slug = slug;
    Ok(page)
}

pub async fn set_default_page(backend: &SqlxBackend, owner: UserId, id: PageId) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;
    serialize(backend, &mut tx, Guard::Owner(owner)).await?;

    owned_page(&mut tx, owner, id).await?;
    clear_default(&mut tx, owner).await?;
    mark_default(&mut tx, id).await?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(())
}

/// Delete a page's links, sections and the page row itself.
async fn remove_page_tree(conn: &mut AnyConnection, id: PageId) -> Result<()> {
    sqlx::query(
        "DELETE FROM links WHERE section_id IN (SELECT id FROM sections WHERE page_id = $1)",
    )
    .bind(id.get())
    .execute(&mut *conn)
    .await
    .sql_context("Failed to delete page links")?;

    sqlx::query("DELETE FROM sections WHERE page_id = $1")
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .sql_context("Failed to delete page sections")?;

    sqlx::query("DELETE FROM pages WHERE id = $1")
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .sql_context("Failed to delete page")?;
    Ok(())
}

pub async fn delete_page(backend: &SqlxBackend, owner: UserId, id: PageId) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;
    serialize(backend, &mut tx, Guard::Owner(owner)).await?;

    let page = owned_page(&mut tx, owner, id).await?;
    remove_page_tree(&mut tx, id).await?;

    if page.is_default {
        let next: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM pages WHERE owner_id = $1 ORDER BY id LIMIT 1")
                .bind(owner.get())
                .fetch_optional(&mut *tx)
                .await
                .sql_context("Failed to find remaining page")?;
        if let Some((next,)) = next {
            mark_default(&mut tx, PageId(next)).await?;
            tracing::debug!(page_id = next, "Promoted page to default");
        }
    }

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(())
}

/// Delete an account together with every page it owns.
pub async fn delete_user(backend: &SqlxBackend, id: UserId) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    require_user(&mut tx, id).await?;
    let pages: Vec<(i64,)> = sqlx::query_as("SELECT id FROM pages WHERE owner_id = $1")
        .bind(id.get())
        .fetch_all(&mut *tx)
        .await
        .sql_context("Failed to list pages")?;
    for (page,) in pages {
        remove_page_tree(&mut tx, PageId(page)).await?;
    }
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to delete user")?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(())
}

// ----- sections -----

async fn next_section_order(conn: &mut AnyConnection, page: PageId) -> Result<u32> {
    let (max,): (Option<i64>,) =
        sqlx::query_as("SELECT MAX(sort_order) FROM sections WHERE page_id = $1")
            .bind(page.get())
            .fetch_one(&mut *conn)
            .await
            .sql_context("Failed to read section order")?;
    Ok(ordering::next_order(max.map(order_of)))
}

async fn insert_section(
    conn: &mut AnyConnection,
    page: PageId,
    name: &str,
    order: u32,
) -> Result<Section> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO sections (page_id, name, sort_order) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(page.get())
    .bind(name)
    .bind(i64::from(order))
    .fetch_one(&mut *conn)
    .await
    .sql_context("Failed to insert section")?;
    Ok(Section {
        id: SectionId(id),
        page,
        name: name.to_string(),
        order,
    })
}

pub async fn create_section(
    backend: &SqlxBackend,
    owner: UserId,
    page: PageId,
    name: &str,
) -> Result<Section> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    owned_page(&mut tx, owner, page).await?;
    let order = next_section_order(&mut tx, page).await?;
    let section = insert_section(&mut tx, page, name, order).await?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(section)
}

pub async fn get_section(backend: &SqlxBackend, owner: UserId, id: SectionId) -> Result<Section> {
    let mut conn = backend
        .pool()
        .acquire()
        .await
        .sql_context("Failed to acquire connection")?;
    owned_section(&mut conn, owner, id).await
}

/// Sections of one page in display order.
pub async fn list_sections(
    backend: &SqlxBackend,
    owner: UserId,
    page: PageId,
) -> Result<Vec<Section>> {
    let mut conn = backend
        .pool()
        .acquire()
        .await
        .sql_context("Failed to acquire connection")?;
    owned_page(&mut conn, owner, page).await?;

    let rows: Vec<SectionRow> = sqlx::query_as(
        "SELECT id, page_id, name, sort_order FROM sections
         WHERE page_id = $1 ORDER BY sort_order, id",
    )
    .bind(page.get())
    .fetch_all(&mut *conn)
    .await
    .sql_context("Failed to list sections")?;
    Ok(rows.into_iter().map(section_from_row).collect())
}

pub async fn rename_section(
    backend: &SqlxBackend,
    owner: UserId,
    id: SectionId,
    name: &str,
) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    owned_section(&mut tx, owner, id).await?;
    sqlx::query("UPDATE sections SET name = $1 WHERE id = $2")
        .bind(name)
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to rename section")?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(())
}

pub async fn delete_section(backend: &SqlxBackend, owner: UserId, id: SectionId) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    owned_section(&mut tx, owner, id).await?;
    sqlx::query("DELETE FROM links WHERE section_id = $1")
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to delete section links")?;
    sqlx::query("DELETE FROM sections WHERE id = $1")
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to delete section")?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(())
}

/// Apply a tolerant-skip section reorder in one transaction.
pub async fn reorder_sections(
    backend: &SqlxBackend,
    owner: UserId,
    ids: &[SectionId],
) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    let mut owned: HashSet<SectionId> = HashSet::with_capacity(ids.len());
    for id in ids {
        if owned.contains(id) {
            continue;
        }
        match owned_section(&mut tx, owner, *id).await {
            Ok(_) => {
                owned.insert(*id);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
    }

    for placement in ordering::plan_sections(ids, &owned) {
        sqlx::query("UPDATE sections SET sort_order = $1 WHERE id = $2")
            .bind(i64::from(placement.order))
            .bind(placement.id.get())
            .execute(&mut *tx)
            .await
            .sql_context("Failed to reorder section")?;
    }

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(())
}

// ----- links -----

async fn resident_links(conn: &mut AnyConnection, section: SectionId) -> Result<Vec<LinkId>> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT id FROM links WHERE section_id = $1")
        .bind(section.get())
        .fetch_all(&mut *conn)
        .await
        .sql_context("Failed to list section links")?;
    Ok(rows.into_iter().map(|(id,)| LinkId(id)).collect())
}

async fn insert_link(
    conn: &mut AnyConnection,
    section: SectionId,
    name: &str,
    url: &str,
    order: u32,
) -> Result<Link> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO links (section_id, name, url, sort_order)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(section.get())
    .bind(name)
    .bind(url)
    .bind(i64::from(order))
    .fetch_one(&mut *conn)
    .await
    .sql_context("Failed to insert link")?;
    Ok(Link {
        id: LinkId(id),
        section,
        name: name.to_string(),
        url: url.to_string(),
        order,
    })
}

/// Append a link, enforcing the per-section cap inside the transaction.
pub async fn create_link(
    backend: &SqlxBackend,
    owner: UserId,
    section: SectionId,
    name: &str,
    url: &str,
) -> Result<Link> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;
    serialize(backend, &mut tx, Guard::Section(section)).await?;

    owned_section(&mut tx, owner, section).await?;
    let (count, max): (i64, Option<i64>) =
        sqlx::query_as("SELECT COUNT(*), MAX(sort_order) FROM links WHERE section_id = $1")
            .bind(section.get())
            .fetch_one(&mut *tx)
            .await
            .sql_context("Failed to count links")?;
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    if count >= MAX_LINKS_PER_SECTION {
        return Err(PageError::CapacityExceeded {
            section_id: Some(section),
            requested: count.saturating_add(1),
            limit: MAX_LINKS_PER_SECTION,
        }
        .into());
    }
    let order = ordering::next_order(max.map(order_of));
    let link = insert_link(&mut tx, section, name, url, order).await?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(link)
}

pub async fn get_link(backend: &SqlxBackend, owner: UserId, id: LinkId) -> Result<Link> {
    let mut conn = backend
        .pool()
        .acquire()
        .await
        .sql_context("Failed to acquire connection")?;
    owned_link(&mut conn, owner, id).await
}

/// All links on one page, ordered by section id, then display order.
pub async fn list_page_links(
    backend: &SqlxBackend,
    owner: UserId,
    page: PageId,
) -> Result<Vec<Link>> {
    let mut conn = backend
        .pool()
        .acquire()
        .await
        .sql_context("Failed to acquire connection")?;
    owned_page(&mut conn, owner, page).await?;

    let rows: Vec<LinkRow> = sqlx::query_as(
        "SELECT l.id, l.section_id, l.name, l.url, l.sort_order FROM links l
         JOIN sections s ON s.id = l.section_id
         WHERE s.page_id = $1
         ORDER BY l.section_id, l.sort_order, l.id",
    )
    .bind(page.get())
    .fetch_all(&mut *conn)
    .await
    .sql_context("Failed to list links")?;
    Ok(rows.into_iter().map(link_from_row).collect())
}

pub async fn update_link(
    backend: &SqlxBackend,
    owner: UserId,
    id: LinkId,
    name: &str,
    url: &str,
) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    owned_link(&mut tx, owner, id).await?;
    sqlx::query("UPDATE links SET name = $1, url = $2 WHERE id = $3")
        .bind(name)
        .bind(url)
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to update link")?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(())
}

pub async fn delete_link(backend: &SqlxBackend, owner: UserId, id: LinkId) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    owned_link(&mut tx, owner, id).await?;
    sqlx::query("DELETE FROM links WHERE id = $1")
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to delete link")?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(())
}

/// Move and reorder links into `target`, all or nothing.
///
/// Checks run in a fixed order: request size, target ownership, then the
/// resulting occupancy of `target`. Nothing is written until all pass.
pub async fn reorder_links(
    backend: &SqlxBackend,
    owner: UserId,
    target: SectionId,
    ids: &[LinkId],
) -> Result<()> {
    ordering::check_link_request(ids.len())?;

    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;
    serialize(backend, &mut tx, Guard::Section(target)).await?;

    owned_section(&mut tx, owner, target).await?;

    let mut owned: HashSet<LinkId> = HashSet::with_capacity(ids.len());
    for id in ids {
        if owned.contains(id) {
            continue;
        }
        match owned_link(&mut tx, owner, *id).await {
            Ok(_) => {
                owned.insert(*id);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
    }
    let plan = ordering::plan_links(target, ids, &owned)?;
    let resident = resident_links(&mut tx, target).await?;
    ordering::check_occupancy(target, &plan, &resident)?;

    for placement in plan {
        sqlx::query("UPDATE links SET section_id = $1, sort_order = $2 WHERE id = $3")
            .bind(placement.section.get())
            .bind(i64::from(placement.order))
            .bind(placement.id.get())
            .execute(&mut *tx)
            .await
            .sql_context("Failed to move link")?;
    }

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(())
}

// ----- import -----

/// Create a page from a validated document in one transaction.
pub async fn import_page(
    backend: &SqlxBackend,
    owner: UserId,
    document: &PageDocument,
) -> Result<Page> {
    let slug = slug_for_title(&document.title)?;
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;
    serialize(backend, &mut tx, Guard::Owner(owner)).await?;

    require_user(&mut tx, owner).await?;
    check_page_identity(&mut tx, owner, None, &document.title, &slug).await?;
    let is_default = !owner_has_pages(&mut tx, owner).await?;
    let page = insert_page(&mut tx, owner, &document.title, slug, is_default).await?;

    for entry in &document.sections {
        let section = insert_section(&mut tx, page.id, &entry.name, entry.order).await?;
        for link in &entry.links {
            insert_link(&mut tx, section.id, &link.name, &link.url, link.order).await?;
        }
    }

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(page)
}
