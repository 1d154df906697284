//! Ordering engine for drag-and-drop reorders.
//!
//! Everything here is pure: backends hand in the ids the client submitted
//! together with the set of ids the acting owner actually controls, and get
//! back the rows to rewrite. No I/O happens in this module.
//!
//! Both planners follow the tolerant-skip policy: ids outside the owner's
//! universe are dropped without failing the request, and positions are
//! assigned over the surviving sequence only, so `[5, 2, 9]` with a foreign
//! `9` yields `5 → 0, 2 → 1`. Duplicate ids keep their first position.
//!
//! Link planning is additionally bounded by [`MAX_LINKS_PER_SECTION`], checked
//! on the raw request before anything is resolved.

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

use crate::Result;
use crate::constants::MAX_LINKS_PER_SECTION;
use crate::model::{LinkId, SectionId};
use crate::page::PageError;

/// New position for one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionPlacement {
    pub id: SectionId,
    pub order: u32,
}

/// New parent and position for one link.
///
/// Both fields are always written together so a link is never observed with
/// a new order under its old section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPlacement {
    pub id: LinkId,
    pub section: SectionId,
    pub order: u32,
}

/// Keep the requested ids that belong to the owner, in request order, first occurrence only.
fn surviving<T>(requested: &[T], owned: &HashSet<T>) -> Vec<T>
where
    T: Copy + Eq + Hash + Display,
{
    let mut seen = HashSet::with_capacity(requested.len());
    let mut kept = Vec::with_capacity(requested.len());
    for id in requested {
        if !owned.contains(id) {
            tracing::debug!(%id, "Skipping id outside the owner's scope");
            continue;
        }
        if seen.insert(*id) {
            kept.push(*id);
        }
    }
    kept
}

fn position(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

/// Plan a section reorder.
///
/// Sections not mentioned keep whatever order they had.
pub fn plan_sections(requested: &[SectionId], owned: &HashSet<SectionId>) -> Vec<SectionPlacement> {
    surviving(requested, owned)
        .into_iter()
        .enumerate()
        .map(|(index, id)| SectionPlacement {
            id,
            order: position(index),
        })
        .collect()
}

/// Reject a link reorder request that names more links than a section may hold.
pub fn check_link_request(requested: usize) -> Result<()> {
    if requested > MAX_LINKS_PER_SECTION {
        return Err(PageError::CapacityExceeded {
            section_id: None,
            requested,
            limit: MAX_LINKS_PER_SECTION,
        }
        .into());
    }
    Ok(())
}

/// Plan a link reorder into `target`, moving any surviving link that lives elsewhere.
///
/// `owned` is the set of links the owner controls, resolved through each link's
/// *current* section.
pub fn plan_links(
    target: SectionId,
    requested: &[LinkId],
    owned: &HashSet<LinkId>,
) -> Result<Vec<LinkPlacement>> {
    check_link_request(requested.len())?;
    Ok(surviving(requested, owned)
        .into_iter()
        .enumerate()
        .map(|(index, id)| LinkPlacement {
            id,
            section: target,
            order: position(index),
        })
        .collect())
}

/// Verify the target section stays within capacity once the plan is applied.
///
/// `resident` are the links currently under `target`; the ones the plan does
/// not mention stay there.
pub fn check_occupancy(
    target: SectionId,
    plan: &[LinkPlacement],
    resident: &[LinkId],
) -> Result<()> {
    let moved: HashSet<LinkId> = plan.iter().map(|p| p.id).collect();
    let staying = resident.iter().filter(|id| !moved.contains(id)).count();
    let total = staying + moved.len();
    if total > MAX_LINKS_PER_SECTION {
        return Err(PageError::CapacityExceeded {
            section_id: Some(target),
            requested: total,
            limit: MAX_LINKS_PER_SECTION,
        }
        .into());
    }
    Ok(())
}

/// Order value for an item appended after `existing`.
pub fn next_order<I>(existing: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    existing
        .into_iter()
        .max()
        .map_or(0, |max| max.saturating_add(1))
}
