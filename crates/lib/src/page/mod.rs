//! Page composition and page-level operations.
//!
//! A [`PageView`] is a page with its sections in display order, each carrying
//! its links in display order. [`Startpages::resolve_page`] implements the
//! default-page policy used by the start page itself; the item-level
//! operations used by the in-place editor live in [`items`].

use std::collections::HashMap;

use serde::Serialize;

use crate::{Link, Page, PageId, Result, Section, SectionId, Startpages, UserId};

pub mod errors;
pub mod items;
pub mod validate;

pub use errors::PageError;
pub use items::ItemDetail;

/// A page with its full, ordered contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub page: Page,
    pub sections: Vec<SectionView>,
}

/// One section with its links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionView {
    #[serde(flatten)]
    pub section: Section,
    pub links: Vec<Link>,
}

impl PageView {
    /// Number of links across all sections.
    pub fn link_count(&self) -> usize {
        self.sections.iter().map(|s| s.links.len()).sum()
    }
}

/// Pick the page shown when no explicit page is requested.
///
/// The default page wins; otherwise the first page in `pages`' order.
pub fn pick_current(pages: &[Page]) -> Option<&Page> {
    pages.iter().find(|p| p.is_default).or_else(|| pages.first())
}

impl Startpages {
    /// Assemble one of `owner`'s pages with its sections and links.
    pub async fn page_view(&self, owner: UserId, id: PageId) -> Result<PageView> {
        let page = self.backend().get_page(owner, id).await?;
        let sections = self.backend().list_sections(owner, page.id).await?;
        let links = self.backend().list_page_links(owner, page.id).await?;

        // Links arrive ordered; grouping keeps that order per section.
        let mut by_section: HashMap<SectionId, Vec<Link>> = HashMap::new();
        for link in links {
            by_section.entry(link.section).or_default().push(link);
        }
        let sections = sections
            .into_iter()
            .map(|section| SectionView {
                links: by_section.remove(&section.id).unwrap_or_default(),
                section,
            })
            .collect();
        Ok(PageView { page, sections })
    }

    /// Resolve the page to display for `owner`.
    ///
    /// With an explicit `(username, slug)` address, the username must name
    /// `owner` (case-insensitively) or the request is forbidden. Without one,
    /// the owner's default page is shown, falling back to their first page.
    pub async fn resolve_page(
        &self,
        owner: UserId,
        address: Option<(&str, &str)>,
    ) -> Result<PageView> {
        let page = match address {
            Some((username, slug)) => {
                let user = self.backend().get_user(owner).await?;
                if user.username.to_lowercase() != username.to_lowercase() {
                    return Err(PageError::Forbidden {
                        username: username.to_string(),
                    }
                    .into());
                }
                self.backend()
                    .list_pages(owner)
                    .await?
                    .into_iter()
                    .find(|p| p.slug == slug)
                    .ok_or_else(|| PageError::UnknownSlug {
                        slug: slug.to_string(),
                    })?
            }
            None => self.current_page(owner).await?,
        };
        self.page_view(owner, page.id).await
    }

    /// The page new sections go to: the default page, or the first page.
    pub async fn current_page(&self, owner: UserId) -> Result<Page> {
        let pages = self.backend().list_pages(owner).await?;
        pick_current(&pages)
            .cloned()
            .ok_or_else(|| PageError::NoPages.into())
    }

    /// All of `owner`'s pages, ordered by id.
    pub async fn list_pages(&self, owner: UserId) -> Result<Vec<Page>> {
        self.backend().list_pages(owner).await
    }

    /// Create a page. An owner's first page is always the default.
    pub async fn create_page(&self, owner: UserId, title: &str, is_default: bool) -> Result<Page> {
        let title = validate::title(title)?;
        crate::slug::slug_for_title(&title)?;
        let page = self.backend().create_page(owner, &title, is_default).await?;
        tracing::info!(owner = %owner, page_id = %page.id, slug = %page.slug, is_default = page.is_default, "Created page");
        Ok(page)
    }

    /// Retitle a page and optionally make it the default.
    ///
    /// Un-setting the default flag is ignored: the owner keeps exactly one default.
    pub async fn edit_page(
        &self,
        owner: UserId,
        id: PageId,
        title: &str,
        is_default: bool,
    ) -> Result<Page> {
        let title = validate::title(title)?;
        crate::slug::slug_for_title(&title)?;
        let page = self
            .backend()
            .update_page(owner, id, &title, is_default)
            .await?;
        tracing::info!(owner = %owner, page_id = %page.id, slug = %page.slug, "Updated page");
        Ok(page)
    }

    /// Make a page the owner's only default.
    pub async fn set_default_page(&self, owner: UserId, id: PageId) -> Result<Page> {
        self.backend().set_default_page(owner, id).await?;
        tracing::info!(owner = %owner, page_id = %id, "Default page changed");
        self.backend().get_page(owner, id).await
    }

    /// Delete a page with everything on it, promoting another page to default if needed.
    pub async fn delete_page(&self, owner: UserId, id: PageId) -> Result<()> {
        self.backend().delete_page(owner, id).await?;
        tracing::info!(owner = %owner, page_id = %id, "Deleted page");
        Ok(())
    }
}
