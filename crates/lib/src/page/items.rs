//! Item-level editing: add, inspect, save, delete and reorder sections and links.
//!
//! Every call re-checks ownership in the backend. Ids that do not resolve
//! under the acting owner surface as not-found, whether they exist or not.

use serde::Serialize;

use super::{PageError, validate};
use crate::{ItemKind, Link, LinkId, PageId, Result, Section, SectionId, Startpages, UserId};

/// The editable fields of one item, as shown in the edit dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemDetail {
    pub id: i64,
    pub name: String,
    /// Only present for links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

impl Startpages {
    /// Append a section to the owner's current page (default, else first).
    pub async fn add_section(&self, owner: UserId, name: &str) -> Result<Section> {
        let name = validate::name(name)?;
        let page = self.current_page(owner).await?;
        self.insert_section(owner, page.id, &name).await
    }

    /// Append a section to a specific page.
    pub async fn add_section_to(&self, owner: UserId, page: PageId, name: &str) -> Result<Section> {
        let name = validate::name(name)?;
        self.insert_section(owner, page, &name).await
    }

    async fn insert_section(&self, owner: UserId, page: PageId, name: &str) -> Result<Section> {
        let section = self.backend().create_section(owner, page, name).await?;
        tracing::info!(owner = %owner, page_id = %page, section_id = %section.id, "Added section");
        Ok(section)
    }

    /// Append a link to a section. Fails when the section already holds the maximum.
    pub async fn add_link(
        &self,
        owner: UserId,
        section: SectionId,
        name: &str,
        url: &str,
    ) -> Result<Link> {
        let name = validate::name(name)?;
        let url = validate::url(url)?;
        let link = self
            .backend()
            .create_link(owner, section, &name, &url)
            .await?;
        tracing::info!(owner = %owner, section_id = %section, link_id = %link.id, "Added link");
        Ok(link)
    }

    /// Fetch the editable fields of a section or link.
    pub async fn item_detail(&self, owner: UserId, kind: ItemKind, id: i64) -> Result<ItemDetail> {
        Ok(match kind {
            ItemKind::Section => {
                let section = self.backend().get_section(owner, SectionId(id)).await?;
                ItemDetail {
                    id: section.id.get(),
                    name: section.name,
                    url: None,
                    kind,
                }
            }
            ItemKind::Link => {
                let link = self.backend().get_link(owner, LinkId(id)).await?;
                ItemDetail {
                    id: link.id.get(),
                    name: link.name,
                    url: Some(link.url),
                    kind,
                }
            }
        })
    }

    /// Save edited fields. Links require a URL; sections ignore it.
    pub async fn save_item(
        &self,
        owner: UserId,
        kind: ItemKind,
        id: i64,
        name: &str,
        url: Option<&str>,
    ) -> Result<()> {
        let name = validate::name(name)?;
        match kind {
            ItemKind::Section => {
                self.backend()
                    .rename_section(owner, SectionId(id), &name)
                    .await?;
            }
            ItemKind::Link => {
                let url = url.ok_or_else(|| PageError::InvalidField {
                    field: "url",
                    reason: "url is required".to_string(),
                })?;
                let url = validate::url(url)?;
                self.backend()
                    .update_link(owner, LinkId(id), &name, &url)
                    .await?;
            }
        }
        tracing::info!(owner = %owner, item = %kind, id, "Saved item");
        Ok(())
    }

    /// Delete a section (with its links) or a link.
    pub async fn delete_item(&self, owner: UserId, kind: ItemKind, id: i64) -> Result<()> {
        match kind {
            ItemKind::Section => self.backend().delete_section(owner, SectionId(id)).await?,
            ItemKind::Link => self.backend().delete_link(owner, LinkId(id)).await?,
        }
        tracing::info!(owner = %owner, item = %kind, id, "Deleted item");
        Ok(())
    }

    /// Rewrite section order from a drag-and-drop result.
    ///
    /// Ids the owner does not control are skipped; the rest get positions
    /// `0..n` in submitted order.
    pub async fn reorder_sections(&self, owner: UserId, ids: &[SectionId]) -> Result<()> {
        self.backend().reorder_sections(owner, ids).await?;
        tracing::info!(owner = %owner, submitted = ids.len(), "Reordered sections");
        Ok(())
    }

    /// Rewrite link order under `target`, moving links into it from other sections.
    ///
    /// Fails without changing anything when the request names more links
    /// than a section may hold, when `target` is not the owner's, or when the
    /// target would end up over capacity.
    pub async fn reorder_links(
        &self,
        owner: UserId,
        target: SectionId,
        ids: &[LinkId],
    ) -> Result<()> {
        self.backend().reorder_links(owner, target, ids).await?;
        tracing::info!(owner = %owner, section_id = %target, submitted = ids.len(), "Reordered links");
        Ok(())
    }
}
