//! Every single-item operation on another owner's rows looks like a missing row.

use startpage::{ItemKind, LinkId, SectionId};

use crate::helpers::*;

#[tokio::test]
async fn foreign_sections_and_links_are_not_found() {
    let sp = test_startpages().await;
    let (alice, _, _) = owner_with_section(&sp, "alice").await;
    let (bob, bobs_page, bobs_section) = owner_with_section(&sp, "bob").await;
    let bobs_link = fill_section(&sp, bob, &bobs_section, 1).await.remove(0);

    let section_id = bobs_section.id.get();
    let link_id = bobs_link.id.get();

    assert!(sp.item_detail(alice, ItemKind::Section, section_id).await.unwrap_err().is_not_found());
    assert!(sp.item_detail(alice, ItemKind::Link, link_id).await.unwrap_err().is_not_found());
    assert!(
        sp.save_item(alice, ItemKind::Section, section_id, "Taken", None)
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(
        sp.save_item(alice, ItemKind::Link, link_id, "Taken", Some("https://evil.example"))
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(
        sp.add_link(alice, bobs_section.id, "Sneaky", "https://evil.example")
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(sp.delete_item(alice, ItemKind::Link, link_id).await.unwrap_err().is_not_found());
    assert!(sp.delete_item(alice, ItemKind::Section, section_id).await.unwrap_err().is_not_found());
    assert!(sp.page_view(alice, bobs_page.id).await.unwrap_err().is_not_found());
    assert!(sp.delete_page(alice, bobs_page.id).await.unwrap_err().is_not_found());
    assert!(sp.set_default_page(alice, bobs_page.id).await.unwrap_err().is_not_found());
    assert!(sp.export_page(alice, bobs_page.id).await.unwrap_err().is_not_found());

    // Bob's data is intact.
    let view = sp.page_view(bob, bobs_page.id).await.unwrap();
    assert_eq!(view.sections[0].section.name, "Links");
    assert_eq!(view.sections[0].links[0].name, "L0");
}

#[tokio::test]
async fn missing_and_foreign_ids_fail_the_same_way() {
    let sp = test_startpages().await;
    let (alice, _, _) = owner_with_section(&sp, "alice").await;
    let (_, _, bobs_section) = owner_with_section(&sp, "bob").await;

    let foreign = sp
        .backend()
        .get_section(alice, bobs_section.id)
        .await
        .unwrap_err();
    let missing = sp
        .backend()
        .get_section(alice, SectionId(424_242))
        .await
        .unwrap_err();
    assert_eq!(foreign.kind(), missing.kind());
    assert!(sp.backend().get_link(alice, LinkId(424_242)).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn explicit_address_of_another_account_is_forbidden() {
    let sp = test_startpages().await;
    let (alice, _, _) = owner_with_section(&sp, "alice").await;
    let (_, bobs_page, _) = owner_with_section(&sp, "bob").await;

    let err = sp
        .resolve_page(alice, Some(("bob", &bobs_page.slug)))
        .await
        .unwrap_err();
    assert!(err.is_forbidden());
}
