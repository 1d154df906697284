//! Page lifecycle: creation, default-page policy, deletion and composition.

use startpage::{ErrorKind, Page, PageId, UserId, constants::MAX_LINKS_PER_SECTION};

use crate::helpers::*;

async fn defaults(sp: &startpage::Startpages, owner: UserId) -> Vec<PageId> {
    sp.list_pages(owner)
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.is_default)
        .map(|p| p.id)
        .collect()
}

#[tokio::test]
async fn first_page_is_always_default() {
    let sp = test_startpages().await;
    let owner = register(&sp, "alice").await;

    let first = sp.create_page(owner, "Home", false).await.unwrap();
    assert!(first.is_default);
    assert_eq!(first.slug, "home");

    let second = sp.create_page(owner, "Work", false).await.unwrap();
    assert!(!second.is_default);
    assert_eq!(defaults(&sp, owner).await, vec![first.id]);
}

#[tokio::test]
async fn default_stays_exclusive() {
    let sp = test_startpages().await;
    let owner = register(&sp, "alice").await;
    let a = sp.create_page(owner, "A", false).await.unwrap();
    let b = sp.create_page(owner, "B", true).await.unwrap();
    assert_eq!(defaults(&sp, owner).await, vec![b.id]);

    let c = sp.create_page(owner, "C", false).await.unwrap();
    sp.set_default_page(owner, c.id).await.unwrap();
    assert_eq!(defaults(&sp, owner).await, vec![c.id]);

    sp.edit_page(owner, a.id, "A", true).await.unwrap();
    assert_eq!(defaults(&sp, owner).await, vec![a.id]);

    // Switching the flag off on the current default is ignored.
    sp.edit_page(owner, a.id, "A renamed", false).await.unwrap();
    assert_eq!(defaults(&sp, owner).await, vec![a.id]);
}

#[tokio::test]
async fn defaults_are_per_owner() {
    let sp = test_startpages().await;
    let alice = register(&sp, "alice").await;
    let bob = register(&sp, "bob").await;
    let alices = sp.create_page(alice, "Alice", false).await.unwrap();
    let bobs = sp.create_page(bob, "Bob", false).await.unwrap();
    let bobs_other = sp.create_page(bob, "Bob two", false).await.unwrap();

    sp.set_default_page(bob, bobs_other.id).await.unwrap();
    assert_eq!(defaults(&sp, alice).await, vec![alices.id]);
    assert_eq!(defaults(&sp, bob).await, vec![bobs_other.id]);
    assert!(!sp.backend().get_page(bob, bobs.id).await.unwrap().is_default);
}

#[tokio::test]
async fn deleting_the_default_promotes_the_lowest_id() {
    let sp = test_startpages().await;
    let owner = register(&sp, "alice").await;
    let a = sp.create_page(owner, "A", false).await.unwrap();
    let b = sp.create_page(owner, "B", false).await.unwrap();
    let c = sp.create_page(owner, "C", true).await.unwrap();

    sp.delete_page(owner, c.id).await.unwrap();
    assert_eq!(defaults(&sp, owner).await, vec![a.id]);

    // Deleting a non-default page leaves the default alone.
    sp.delete_page(owner, b.id).await.unwrap();
    assert_eq!(defaults(&sp, owner).await, vec![a.id]);

    sp.delete_page(owner, a.id).await.unwrap();
    assert!(sp.list_pages(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_page_removes_its_tree() {
    let sp = test_startpages().await;
    let (owner, page, section) = owner_with_section(&sp, "alice").await;
    let links = fill_section(&sp, owner, &section, 2).await;

    sp.delete_page(owner, page.id).await.unwrap();

    assert!(sp.backend().get_section(owner, section.id).await.unwrap_err().is_not_found());
    for link in links {
        assert!(sp.backend().get_link(owner, link.id).await.unwrap_err().is_not_found());
    }
}

#[tokio::test]
async fn titles_and_slugs_must_be_unique() {
    let sp = test_startpages().await;
    let alice = register(&sp, "alice").await;
    let bob = register(&sp, "bob").await;
    sp.create_page(alice, "Home", false).await.unwrap();

    let err = sp.create_page(alice, "Home", false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Different owner, same slug: surfaced, not suffixed.
    let err = sp.create_page(bob, "Home", false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(sp.list_pages(bob).await.unwrap().is_empty());

    // Titles that slugify to nothing are rejected.
    let err = sp.create_page(alice, "!!!", false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let err = sp.create_page(alice, "   ", false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn retitling_recomputes_the_slug() {
    let sp = test_startpages().await;
    let owner = register(&sp, "alice").await;
    let page = sp.create_page(owner, "My Links", false).await.unwrap();
    assert_eq!(page.slug, "my-links");

    let page = sp.edit_page(owner, page.id, "Daily Reading", false).await.unwrap();
    assert_eq!(page.slug, "daily-reading");

    // Keeping one's own title is not a conflict.
    let same = sp.edit_page(owner, page.id, "Daily Reading", false).await.unwrap();
    assert_eq!(same.slug, "daily-reading");
}

#[tokio::test]
async fn resolve_prefers_default_then_first() {
    let sp = test_startpages().await;
    let owner = register(&sp, "alice").await;
    assert!(sp.resolve_page(owner, None).await.unwrap_err().is_not_found());

    let first = sp.create_page(owner, "First", false).await.unwrap();
    let second = sp.create_page(owner, "Second", true).await.unwrap();
    assert_eq!(sp.resolve_page(owner, None).await.unwrap().page.id, second.id);

    let view = sp.resolve_page(owner, Some(("ALICE", "first"))).await.unwrap();
    assert_eq!(view.page.id, first.id);

    let err = sp.resolve_page(owner, Some(("alice", "nope"))).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn new_sections_go_to_the_current_page() {
    let sp = test_startpages().await;
    let owner = register(&sp, "alice").await;
    let err = sp.add_section(owner, "Orphan").await.unwrap_err();
    assert!(err.is_not_found());

    sp.create_page(owner, "First", false).await.unwrap();
    let current: Page = sp.create_page(owner, "Second", true).await.unwrap();
    let a = sp.add_section(owner, "A").await.unwrap();
    let b = sp.add_section(owner, "B").await.unwrap();
    assert_eq!(a.page, current.id);
    assert_eq!((a.order, b.order), (0, 1));

    let err = sp.add_section(owner, "").await.unwrap_err();
    assert!(err.is_invalid_input());
}

#[tokio::test]
async fn composition_orders_sections_and_links() {
    let sp = test_startpages().await;
    let (owner, page, first) = owner_with_section(&sp, "alice").await;
    let second = sp.add_section_to(owner, page.id, "Second").await.unwrap();
    fill_section(&sp, owner, &second, 2).await;
    fill_section(&sp, owner, &first, 1).await;
    sp.reorder_sections(owner, &[second.id, first.id]).await.unwrap();

    let view = sp.page_view(owner, page.id).await.unwrap();
    let names: Vec<_> = view.sections.iter().map(|s| s.section.name.as_str()).collect();
    assert_eq!(names, vec!["Second", "Links"]);
    assert_eq!(view.sections[0].links.len(), 2);
    assert_eq!(view.link_count(), 3);
}

#[tokio::test]
async fn eleventh_link_is_rejected() {
    let sp = test_startpages().await;
    let (owner, page, section) = owner_with_section(&sp, "alice").await;
    fill_section(&sp, owner, &section, MAX_LINKS_PER_SECTION).await;

    let err = sp
        .add_link(owner, section.id, "Eleven", "https://example.com/11")
        .await
        .unwrap_err();
    assert!(err.is_capacity_exceeded());
    assert_eq!(
        link_names(&sp, owner, &page, &section).await.len(),
        MAX_LINKS_PER_SECTION
    );
}

#[tokio::test]
async fn live_links_need_a_web_url() {
    let sp = test_startpages().await;
    let (owner, _, section) = owner_with_section(&sp, "alice").await;

    for bad in ["", "not a url", "javascript:alert(1)", "#"] {
        let err = sp.add_link(owner, section.id, "Bad", bad).await.unwrap_err();
        assert!(err.is_invalid_input(), "{bad}: {err}");
    }
    let link = sp
        .add_link(owner, section.id, "  Padded  ", "  https://example.com  ")
        .await
        .unwrap();
    assert_eq!(link.name, "Padded");
    assert_eq!(link.url, "https://example.com");
}

#[tokio::test]
async fn save_item_validates_and_updates() {
    let sp = test_startpages().await;
    let (owner, _, section) = owner_with_section(&sp, "alice").await;
    let link = fill_section(&sp, owner, &section, 1).await.remove(0);

    let err = sp
        .save_item(owner, startpage::ItemKind::Link, link.id.get(), "Name", None)
        .await
        .unwrap_err();
    assert!(err.is_invalid_input());

    sp.save_item(
        owner,
        startpage::ItemKind::Section,
        section.id.get(),
        "Renamed",
        Some("ignored"),
    )
    .await
    .unwrap();
    let detail = sp
        .item_detail(owner, startpage::ItemKind::Section, section.id.get())
        .await
        .unwrap();
    assert_eq!(detail.name, "Renamed");
    assert_eq!(detail.url, None);
}
