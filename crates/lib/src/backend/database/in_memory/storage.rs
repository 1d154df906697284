//! Row storage and repository operations for the InMemory backend.
//!
//! Every method runs against a `State` the caller has locked for the whole
//! operation. Fallible checks happen before the first mutation, so an error
//! never leaves a half-applied change behind.

use std::collections::{BTreeMap, HashSet};

use crate::Result;
use crate::backend::errors::BackendError;
use crate::codec::PageDocument;
use crate::constants::MAX_LINKS_PER_SECTION;
use crate::model::{
    ColorSchemeId, Link, LinkId, NewUser, Page, PageId, Section, SectionId, User, UserId,
};
use crate::ordering;
use crate::page::PageError;
use crate::settings::{ColorScheme, GlobalSettings, NewColorScheme};
use crate::slug::slug_for_title;

/// Last id handed out per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    pub(crate) user: i64,
    pub(crate) page: i64,
    pub(crate) section: i64,
    pub(crate) link: i64,
    pub(crate) color_scheme: i64,
}

/// All rows of the in-memory backend.
#[derive(Debug, Clone, Default)]
pub(crate) struct State {
    pub(crate) users: BTreeMap<UserId, User>,
    pub(crate) pages: BTreeMap<PageId, Page>,
    pub(crate) sections: BTreeMap<SectionId, Section>,
    pub(crate) links: BTreeMap<LinkId, Link>,
    pub(crate) color_schemes: BTreeMap<ColorSchemeId, ColorScheme>,
    pub(crate) settings: Option<GlobalSettings>,
    pub(crate) counters: Counters,
}

fn bump(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl State {
    // ----- ownership -----

    fn page_owned(&self, owner: UserId, page: PageId) -> bool {
        self.pages.get(&page).is_some_and(|p| p.owner == owner)
    }

    fn section_owned(&self, owner: UserId, section: &Section) -> bool {
        self.page_owned(owner, section.page)
    }

    fn link_owned(&self, owner: UserId, link: &Link) -> bool {
        self.sections
            .get(&link.section)
            .is_some_and(|s| self.section_owned(owner, s))
    }

    fn owned_page(&self, owner: UserId, id: PageId) -> Result<&Page> {
        self.pages
            .get(&id)
            .filter(|p| p.owner == owner)
            .ok_or_else(|| BackendError::PageNotFound { id }.into())
    }

    fn owned_section(&self, owner: UserId, id: SectionId) -> Result<&Section> {
        self.sections
            .get(&id)
            .filter(|s| self.section_owned(owner, s))
            .ok_or_else(|| BackendError::SectionNotFound { id }.into())
    }

    fn owned_link(&self, owner: UserId, id: LinkId) -> Result<&Link> {
        self.links
            .get(&id)
            .filter(|l| self.link_owned(owner, l))
            .ok_or_else(|| BackendError::LinkNotFound { id }.into())
    }

    fn require_user(&self, id: UserId) -> Result<&User> {
        self.users
            .get(&id)
            .ok_or_else(|| BackendError::UserNotFound { id }.into())
    }

    // ----- accounts -----

    fn username_taken(&self, username: &str, except: Option<UserId>) -> bool {
        let wanted = username.to_lowercase();
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.username.to_lowercase() == wanted)
    }

    pub(crate) fn create_user(&mut self, new: NewUser) -> Result<User> {
        if self.username_taken(&new.username, None) {
            return Err(BackendError::UsernameTaken {
                username: new.username,
            }
            .into());
        }
        let user = User {
            id: UserId(bump(&mut self.counters.user)),
            username: new.username,
            email: new.email,
            is_staff: new.is_staff,
            date_joined: new.date_joined,
            avatar: None,
            color_scheme: None,
            password_hash: new.password_hash,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub(crate) fn get_user(&self, id: UserId) -> Result<User> {
        self.require_user(id).cloned()
    }

    pub(crate) fn find_user_by_username(&self, username: &str) -> Option<User> {
        let wanted = username.to_lowercase();
        self.users
            .values()
            .find(|u| u.username.to_lowercase() == wanted)
            .cloned()
    }

    pub(crate) fn list_users(&self) -> Vec<User> {
        self.users.values().cloned().collect()
    }

    fn user_mut(&mut self, id: UserId) -> Result<&mut User> {
        self.users
            .get_mut(&id)
            .ok_or_else(|| BackendError::UserNotFound { id }.into())
    }

    pub(crate) fn rename_user(&mut self, id: UserId, username: &str) -> Result<()> {
        self.require_user(id)?;
        if self.username_taken(username, Some(id)) {
            return Err(BackendError::UsernameTaken {
                username: username.to_string(),
            }
            .into());
        }
        self.user_mut(id)?.username = username.to_string();
        Ok(())
    }

    pub(crate) fn set_avatar(&mut self, id: UserId, avatar: Option<&str>) -> Result<()> {
        self.user_mut(id)?.avatar = avatar.map(str::to_string);
        Ok(())
    }

    pub(crate) fn set_color_scheme(
        &mut self,
        id: UserId,
        scheme: Option<ColorSchemeId>,
    ) -> Result<()> {
        self.require_user(id)?;
        if let Some(scheme) = scheme
            && !self.color_schemes.contains_key(&scheme)
        {
            return Err(BackendError::ColorSchemeNotFound { id: scheme }.into());
        }
        self.user_mut(id)?.color_scheme = scheme;
        Ok(())
    }

    pub(crate) fn delete_user(&mut self, id: UserId) -> Result<()> {
        self.require_user(id)?;
        let pages: Vec<PageId> = self
            .pages
            .values()
            .filter(|p| p.owner == id)
            .map(|p| p.id)
            .collect();
        for page in pages {
            self.remove_page_tree(page);
        }
        self.users.remove(&id);
        Ok(())
    }

    // ----- pages -----

    /// Title and slug checks for a page being created (`id = None`) or retitled.
    fn check_page_identity(
        &self,
        owner: UserId,
        id: Option<PageId>,
        title: &str,
        slug: &str,
    ) -> Result<()> {
        let others = || self.pages.values().filter(move |p| Some(p.id) != id);
        if others().any(|p| p.owner == owner && p.title == title) {
            return Err(BackendError::TitleTaken {
                title: title.to_string(),
            }
            .into());
        }
        if others().any(|p| p.slug == slug) {
            return Err(BackendError::SlugTaken {
                slug: slug.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn owner_has_pages(&self, owner: UserId) -> bool {
        self.pages.values().any(|p| p.owner == owner)
    }

    fn clear_default(&mut self, owner: UserId) {
        for page in self.pages.values_mut().filter(|p| p.owner == owner) {
            page.is_default = false;
        }
    }

    fn insert_page(&mut self, owner: UserId, title: &str, slug: String, is_default: bool) -> Page {
        if is_default {
            self.clear_default(owner);
        }
        let page = Page {
            id: PageId(bump(&mut self.counters.page)),
            owner,
            title: title.to_string(),
            slug,
            is_default,
        };
        self.pages.insert(page.id, page.clone());
        page
    }

    pub(crate) fn create_page(
        &mut self,
        owner: UserId,
        title: &str,
        make_default: bool,
    ) -> Result<Page> {
        self.require_user(owner)?;
        let slug = slug_for_title(title)?;
        self.check_page_identity(owner, None, title, &slug)?;
        let is_default = make_default || !self.owner_has_pages(owner);
        Ok(self.insert_page(owner, title, slug, is_default))
    }

    pub(crate) fn get_page(&self, owner: UserId, id: PageId) -> Result<Page> {
        self.owned_page(owner, id).cloned()
    }

    pub(crate) fn list_pages(&self, owner: UserId) -> Vec<Page> {
        self.pages
            .values()
            .filter(|p| p.owner == owner)
            .cloned()
            .collect()
    }

    pub(crate) fn update_page(
        &mut self,
        owner: UserId,
        id: PageId,
        title: &str,
        make_default: bool,
    ) -> Result<Page> {
        self.owned_page(owner, id)?;
        let slug = slug_for_title(title)?;
        self.check_page_identity(owner, Some(id), title, &slug)?;
        if make_default {
            self.clear_default(owner);
        }
        let page = self
            .pages
            .get_mut(&id)
            .ok_or(BackendError::PageNotFound { id })?;
        page.title = title.to_string();
        page.slug = slug;
        if make_default {
            page.is_default = true;
        }
        Ok(page.clone())
    }

    pub(crate) fn set_default_page(&mut self, owner: UserId, id: PageId) -> Result<()> {
        self.owned_page(owner, id)?;
        self.clear_default(owner);
        if let Some(page) = self.pages.get_mut(&id) {
            page.is_default = true;
        }
        Ok(())
    }

    /// Remove a page with its sections and links. Ownership must be checked by the caller.
    fn remove_page_tree(&mut self, id: PageId) -> Option<Page> {
        let sections: HashSet<SectionId> = self
            .sections
            .values()
            .filter(|s| s.page == id)
            .map(|s| s.id)
            .collect();
        self.links.retain(|_, l| !sections.contains(&l.section));
        self.sections.retain(|_, s| s.page != id);
        self.pages.remove(&id)
    }

    pub(crate) fn delete_page(&mut self, owner: UserId, id: PageId) -> Result<()> {
        self.owned_page(owner, id)?;
        let removed = self.remove_page_tree(id);
        if removed.is_some_and(|p| p.is_default)
            && let Some(next) = self.pages.values_mut().find(|p| p.owner == owner)
        {
            // BTreeMap iterates by id, so this is the lowest remaining id.
            next.is_default = true;
            tracing::debug!(page_id = %next.id, "Promoted page to default");
        }
        Ok(())
    }

    // ----- sections -----

    pub(crate) fn create_section(
        &mut self,
        owner: UserId,
        page: PageId,
        name: &str,
    ) -> Result<Section> {
        self.owned_page(owner, page)?;
        let order = ordering::next_order(
            self.sections
                .values()
                .filter(|s| s.page == page)
                .map(|s| s.order),
        );
        let section = Section {
            id: SectionId(bump(&mut self.counters.section)),
            page,
            name: name.to_string(),
            order,
        };
        self.sections.insert(section.id, section.clone());
        Ok(section)
    }

    pub(crate) fn get_section(&self, owner: UserId, id: SectionId) -> Result<Section> {
        self.owned_section(owner, id).cloned()
    }

    pub(crate) fn list_sections(&self, owner: UserId, page: PageId) -> Result<Vec<Section>> {
        self.owned_page(owner, page)?;
        let mut sections: Vec<Section> = self
            .sections
            .values()
            .filter(|s| s.page == page)
            .cloned()
            .collect();
        sections.sort_by_key(|s| (s.order, s.id));
        Ok(sections)
    }

    pub(crate) fn rename_section(&mut self, owner: UserId, id: SectionId, name: &str) -> Result<()> {
        self.owned_section(owner, id)?;
        if let Some(section) = self.sections.get_mut(&id) {
            section.name = name.to_string();
        }
        Ok(())
    }

    pub(crate) fn delete_section(&mut self, owner: UserId, id: SectionId) -> Result<()> {
        self.owned_section(owner, id)?;
        self.links.retain(|_, l| l.section != id);
        self.sections.remove(&id);
        Ok(())
    }

    pub(crate) fn reorder_sections(&mut self, owner: UserId, ids: &[SectionId]) -> Result<()> {
        let owned: HashSet<SectionId> = ids
            .iter()
            .copied()
            .filter(|id| {
                self.sections
                    .get(id)
                    .is_some_and(|s| self.section_owned(owner, s))
            })
            .collect();
        for placement in ordering::plan_sections(ids, &owned) {
            if let Some(section) = self.sections.get_mut(&placement.id) {
                section.order = placement.order;
            }
        }
        Ok(())
    }

    // ----- links -----

    fn links_in(&self, section: SectionId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.section == section)
    }

    pub(crate) fn create_link(
        &mut self,
        owner: UserId,
        section: SectionId,
        name: &str,
        url: &str,
    ) -> Result<Link> {
        self.owned_section(owner, section)?;
        let count = self.links_in(section).count();
        if count >= MAX_LINKS_PER_SECTION {
            return Err(PageError::CapacityExceeded {
                section_id: Some(section),
                requested: count + 1,
                limit: MAX_LINKS_PER_SECTION,
            }
            .into());
        }
        let order = ordering::next_order(self.links_in(section).map(|l| l.order));
        let link = Link {
            id: LinkId(bump(&mut self.counters.link)),
            section,
            name: name.to_string(),
            url: url.to_string(),
            order,
        };
        self.links.insert(link.id, link.clone());
        Ok(link)
    }

    pub(crate) fn get_link(&self, owner: UserId, id: LinkId) -> Result<Link> {
        self.owned_link(owner, id).cloned()
    }

    pub(crate) fn list_page_links(&self, owner: UserId, page: PageId) -> Result<Vec<Link>> {
        self.owned_page(owner, page)?;
        let mut links: Vec<Link> = self
            .links
            .values()
            .filter(|l| self.sections.get(&l.section).is_some_and(|s| s.page == page))
            .cloned()
            .collect();
        links.sort_by_key(|l| (l.section, l.order, l.id));
        Ok(links)
    }

    pub(crate) fn update_link(
        &mut self,
        owner: UserId,
        id: LinkId,
        name: &str,
        url: &str,
    ) -> Result<()> {
        self.owned_link(owner, id)?;
        if let Some(link) = self.links.get_mut(&id) {
            link.name = name.to_string();
            link.url = url.to_string();
        }
        Ok(())
    }

    pub(crate) fn delete_link(&mut self, owner: UserId, id: LinkId) -> Result<()> {
        self.owned_link(owner, id)?;
        self.links.remove(&id);
        Ok(())
    }

    pub(crate) fn reorder_links(
        &mut self,
        owner: UserId,
        target: SectionId,
        ids: &[LinkId],
    ) -> Result<()> {
        ordering::check_link_request(ids.len())?;
        self.owned_section(owner, target)?;

        let owned: HashSet<LinkId> = ids
            .iter()
            .copied()
            .filter(|id| self.links.get(id).is_some_and(|l| self.link_owned(owner, l)))
            .collect();
        let plan = ordering::plan_links(target, ids, &owned)?;
        let resident: Vec<LinkId> = self.links_in(target).map(|l| l.id).collect();
        ordering::check_occupancy(target, &plan, &resident)?;

        for placement in plan {
            if let Some(link) = self.links.get_mut(&placement.id) {
                link.section = placement.section;
                link.order = placement.order;
            }
        }
        Ok(())
    }

    // ----- import -----

    pub(crate) fn import_page(&mut self, owner: UserId, document: &PageDocument) -> Result<Page> {
        self.require_user(owner)?;
        let slug = slug_for_title(&document.title)?;
        self.check_page_identity(owner, None, &document.title, &slug)?;

        // Nothing below can fail.
        let is_default = !self.owner_has_pages(owner);
        let page = self.insert_page(owner, &document.title, slug, is_default);
        for entry in &document.sections {
            let section = Section {
                id: SectionId(bump(&mut self.counters.section)),
                page: page.id,
                name: entry.name.clone(),
                order: entry.order,
            };
            for link in &entry.links {
                let link = Link {
                    id: LinkId(bump(&mut self.counters.link)),
                    section: section.id,
                    name: link.name.clone(),
                    url: link.url.clone(),
                    order: link.order,
                };
                self.links.insert(link.id, link);
            }
            self.sections.insert(section.id, section);
        }
        Ok(page)
    }

    // ----- site settings -----

    pub(crate) fn list_color_schemes(&self) -> Vec<ColorScheme> {
        self.color_schemes.values().cloned().collect()
    }

    pub(crate) fn get_color_scheme(&self, id: ColorSchemeId) -> Result<ColorScheme> {
        self.color_schemes
            .get(&id)
            .cloned()
            .ok_or_else(|| BackendError::ColorSchemeNotFound { id }.into())
    }

    pub(crate) fn add_color_scheme(&mut self, scheme: &NewColorScheme) -> ColorScheme {
        let scheme = ColorScheme {
            id: ColorSchemeId(bump(&mut self.counters.color_scheme)),
            name: scheme.name.clone(),
            is_dark: scheme.is_dark,
            preview_colors: scheme.preview_colors.clone(),
            css_variables: scheme.css_variables.clone(),
        };
        self.color_schemes.insert(scheme.id, scheme.clone());
        scheme
    }

    pub(crate) fn delete_color_scheme(&mut self, id: ColorSchemeId) -> Result<()> {
        if self.color_schemes.remove(&id).is_none() {
            return Err(BackendError::ColorSchemeNotFound { id }.into());
        }
        for user in self
            .users
            .values_mut()
            .filter(|u| u.color_scheme == Some(id))
        {
            user.color_scheme = None;
        }
        Ok(())
    }
}
