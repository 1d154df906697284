//! Drag-and-drop reorders: tolerant skips, the link cap and cross-section moves.

use startpage::{LinkId, SectionId, constants::MAX_LINKS_PER_SECTION};

use crate::helpers::*;

#[tokio::test]
async fn section_reorder_skips_foreign_ids() {
    let sp = test_startpages().await;
    let (owner, page, first) = owner_with_section(&sp, "alice").await;
    let second = sp.add_section_to(owner, page.id, "Second").await.unwrap();
    let third = sp.add_section_to(owner, page.id, "Third").await.unwrap();
    let (bob, _, foreign) = owner_with_section(&sp, "bob").await;

    sp.reorder_sections(owner, &[third.id, foreign.id, first.id])
        .await
        .unwrap();

    let sections = sp.backend().list_sections(owner, page.id).await.unwrap();
    let orders: Vec<_> = sections.iter().map(|s| (s.id, s.order)).collect();
    assert!(orders.contains(&(third.id, 0)));
    assert!(orders.contains(&(first.id, 1)));
    // Not mentioned: keeps the order it had.
    assert!(orders.contains(&(second.id, second.order)));

    let untouched = sp.backend().get_section(bob, foreign.id).await.unwrap();
    assert_eq!(untouched.order, foreign.order);
}

#[tokio::test]
async fn section_reorder_with_only_unknown_ids_is_a_no_op() {
    let sp = test_startpages().await;
    let (owner, page, section) = owner_with_section(&sp, "alice").await;

    sp.reorder_sections(owner, &[SectionId(9_999), SectionId(-1)])
        .await
        .unwrap();
    sp.reorder_sections(owner, &[]).await.unwrap();

    let sections = sp.backend().list_sections(owner, page.id).await.unwrap();
    assert_eq!(sections, vec![section]);
}

#[tokio::test]
async fn duplicate_ids_keep_their_first_position() {
    let sp = test_startpages().await;
    let (owner, page, a) = owner_with_section(&sp, "alice").await;
    let b = sp.add_section_to(owner, page.id, "B").await.unwrap();

    sp.reorder_sections(owner, &[b.id, a.id, b.id]).await.unwrap();

    let view = sp.page_view(owner, page.id).await.unwrap();
    let ids: Vec<_> = view.sections.iter().map(|s| s.section.id).collect();
    assert_eq!(ids, vec![b.id, a.id]);
    assert_eq!(view.sections[1].section.order, 1);
}

#[tokio::test]
async fn link_reorder_within_a_section() {
    let sp = test_startpages().await;
    let (owner, page, section) = owner_with_section(&sp, "alice").await;
    let links = fill_section(&sp, owner, &section, 3).await;

    sp.reorder_links(owner, section.id, &[links[2].id, links[0].id, links[1].id])
        .await
        .unwrap();

    assert_eq!(
        link_names(&sp, owner, &page, &section).await,
        vec!["L2", "L0", "L1"]
    );
}

#[tokio::test]
async fn oversized_link_request_changes_nothing() {
    let sp = test_startpages().await;
    let (owner, page, section) = owner_with_section(&sp, "alice").await;
    let links = fill_section(&sp, owner, &section, 3).await;
    let before = sp.page_view(owner, page.id).await.unwrap();

    let mut ids: Vec<LinkId> = links.iter().rev().map(|l| l.id).collect();
    ids.extend((0..8).map(|i| LinkId(10_000 + i)));
    assert_eq!(ids.len(), MAX_LINKS_PER_SECTION + 1);

    let err = sp.reorder_links(owner, section.id, &ids).await.unwrap_err();
    assert!(err.is_capacity_exceeded());
    assert_eq!(sp.page_view(owner, page.id).await.unwrap(), before);
}

#[tokio::test]
async fn move_link_across_sections_updates_parent_and_order_together() {
    let sp = test_startpages().await;
    let (owner, page, source) = owner_with_section(&sp, "alice").await;
    let target = sp.add_section_to(owner, page.id, "Target").await.unwrap();
    let moving = fill_section(&sp, owner, &source, 2).await;
    let resident = sp
        .add_link(owner, target.id, "Resident", "https://example.org")
        .await
        .unwrap();

    sp.reorder_links(owner, target.id, &[resident.id, moving[1].id])
        .await
        .unwrap();

    let moved = sp.backend().get_link(owner, moving[1].id).await.unwrap();
    assert_eq!(moved.section, target.id);
    assert_eq!(moved.order, 1);
    assert_eq!(
        link_names(&sp, owner, &page, &target).await,
        vec!["Resident", "L1"]
    );
    assert_eq!(link_names(&sp, owner, &page, &source).await, vec!["L0"]);
}

#[tokio::test]
async fn move_into_full_section_is_rejected() {
    let sp = test_startpages().await;
    let (owner, page, source) = owner_with_section(&sp, "alice").await;
    let full = sp.add_section_to(owner, page.id, "Full").await.unwrap();
    fill_section(&sp, owner, &full, MAX_LINKS_PER_SECTION).await;
    let extra = sp
        .add_link(owner, source.id, "Extra", "https://example.org")
        .await
        .unwrap();

    let err = sp
        .reorder_links(owner, full.id, &[extra.id])
        .await
        .unwrap_err();
    assert!(err.is_capacity_exceeded());

    let still = sp.backend().get_link(owner, extra.id).await.unwrap();
    assert_eq!(still.section, source.id);
}

#[tokio::test]
async fn foreign_links_are_not_pulled_in() {
    let sp = test_startpages().await;
    let (owner, page, section) = owner_with_section(&sp, "alice").await;
    let own = fill_section(&sp, owner, &section, 1).await;
    let (bob, _, bobs_section) = owner_with_section(&sp, "bob").await;
    let foreign = fill_section(&sp, bob, &bobs_section, 1).await;

    sp.reorder_links(owner, section.id, &[foreign[0].id, own[0].id])
        .await
        .unwrap();

    let foreign_after = sp.backend().get_link(bob, foreign[0].id).await.unwrap();
    assert_eq!(foreign_after.section, bobs_section.id);
    let own_after = sp.backend().get_link(owner, own[0].id).await.unwrap();
    assert_eq!(own_after.order, 0);
    assert_eq!(link_names(&sp, owner, &page, &section).await, vec!["L0"]);
}

#[tokio::test]
async fn reorder_into_foreign_section_is_not_found() {
    let sp = test_startpages().await;
    let (owner, _, section) = owner_with_section(&sp, "alice").await;
    let own = fill_section(&sp, owner, &section, 1).await;
    let (_, _, bobs_section) = owner_with_section(&sp, "bob").await;

    let err = sp
        .reorder_links(owner, bobs_section.id, &[own[0].id])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    let link = sp.backend().get_link(owner, own[0].id).await.unwrap();
    assert_eq!(link.section, section.id);
}
