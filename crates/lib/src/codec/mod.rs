//! Import/export of pages as portable JSON documents.
//!
//! The document mirrors a page's tree without internal ids:
//!
//! ```json
//! {
//!   "title": "Work",
//!   "sections": [
//!     { "name": "Docs", "order": 0, "links": [
//!       { "name": "Rust", "url": "https://doc.rust-lang.org", "order": 0 }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Missing fields take the defaults in [`crate::constants`]. A field that is
//! present but `null` or of the wrong type makes the whole document invalid.
//! Imports do not apply the per-section link cap, and link URLs are only
//! length-checked so placeholders such as `#` survive a round trip.

use serde::{Deserialize, Serialize};

use crate::{
    Page, PageId, Result, Startpages, UserId,
    constants::{DEFAULT_IMPORT_TITLE, DEFAULT_LINK_NAME, DEFAULT_LINK_URL, DEFAULT_SECTION_NAME},
    events::DomainEvent,
    page::validate,
};

pub mod errors;

pub use errors::CodecError;

fn default_title() -> String {
    DEFAULT_IMPORT_TITLE.to_string()
}

fn default_section_name() -> String {
    DEFAULT_SECTION_NAME.to_string()
}

fn default_link_name() -> String {
    DEFAULT_LINK_NAME.to_string()
}

fn default_link_url() -> String {
    DEFAULT_LINK_URL.to_string()
}

/// A page as exported, or as submitted for import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDocument {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub sections: Vec<SectionDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDocument {
    #[serde(default = "default_section_name")]
    pub name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub links: Vec<LinkDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDocument {
    #[serde(default = "default_link_name")]
    pub name: String,
    #[serde(default = "default_link_url")]
    pub url: String,
    #[serde(default)]
    pub order: u32,
}

impl PageDocument {
    /// Parse an import document.
    pub fn parse(json: &str) -> Result<Self> {
        let document: PageDocument = serde_json::from_str(json).map_err(CodecError::from)?;
        Ok(document)
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Trim every field and check its length.
    ///
    /// Returns the normalized document; the original is left untouched.
    pub fn validated(&self) -> Result<Self> {
        let sections = self
            .sections
            .iter()
            .map(|section| -> Result<SectionDocument> {
                let links = section
                    .links
                    .iter()
                    .map(|link| -> Result<LinkDocument> {
                        Ok(LinkDocument {
                            name: validate::name(&link.name)?,
                            url: validate::url_length(&link.url)?,
                            order: link.order,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(SectionDocument {
                    name: validate::name(&section.name)?,
                    order: section.order,
                    links,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PageDocument {
            title: validate::title(&self.title)?,
            sections,
        })
    }

    /// Total number of links across all sections.
    pub fn link_count(&self) -> usize {
        self.sections.iter().map(|s| s.links.len()).sum()
    }
}

impl Startpages {
    /// Export one of `owner`'s pages.
    ///
    /// Sections and links appear in their persisted order.
    pub async fn export_page(&self, owner: UserId, page: PageId) -> Result<PageDocument> {
        let view = self.page_view(owner, page).await?;
        Ok(PageDocument {
            title: view.page.title,
            sections: view
                .sections
                .into_iter()
                .map(|entry| SectionDocument {
                    name: entry.section.name,
                    order: entry.section.order,
                    links: entry
                        .links
                        .into_iter()
                        .map(|link| LinkDocument {
                            name: link.name,
                            url: link.url,
                            order: link.order,
                        })
                        .collect(),
                })
                .collect(),
        })
    }

    /// Import a page document for `owner` as one atomic unit.
    ///
    /// The new page becomes the default only if `owner` had no pages.
    pub async fn import_page(&self, owner: UserId, document: &PageDocument) -> Result<Page> {
        let document = document.validated()?;
        let page = self.backend().import_page(owner, &document).await?;
        tracing::info!(
            owner = %owner,
            page_id = %page.id,
            sections = document.sections.len(),
            links = document.link_count(),
            "Imported page"
        );
        self.emit(DomainEvent::PageImported {
            owner,
            page: page.id,
            title: page.title.clone(),
        })
        .await;
        Ok(page)
    }

    /// Parse and import a JSON document.
    pub async fn import_json(&self, owner: UserId, json: &str) -> Result<Page> {
        let document = PageDocument::parse(json)?;
        self.import_page(owner, &document).await
    }
}
