//! Competing writers against one owner or one section.
//!
//! Individual calls may lose a race and fail; the invariants must hold
//! whatever the interleaving.

use startpage::{ErrorKind, Result, constants::MAX_LINKS_PER_SECTION};
use tokio::task::JoinHandle;

use crate::helpers::*;

async fn join_all<T>(handles: Vec<JoinHandle<Result<T>>>) -> Vec<Result<T>> {
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.expect("task panicked"));
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_default_switches_leave_one_default() {
    let sp = test_startpages().await;
    let owner = register(&sp, "alice").await;
    let mut pages = Vec::new();
    for i in 0..6 {
        pages.push(sp.create_page(owner, &format!("Page {i}"), false).await.unwrap());
    }

    let handles = pages
        .iter()
        .map(|page| {
            let sp = sp.clone();
            let id = page.id;
            tokio::spawn(async move { sp.set_default_page(owner, id).await })
        })
        .collect();
    let results = join_all(handles).await;
    assert!(results.iter().any(|r| r.is_ok()));

    let defaults = sp
        .list_pages(owner)
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.is_default)
        .count();
    assert_eq!(defaults, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_deletes_and_switches_leave_one_default() {
    let sp = test_startpages().await;
    let owner = register(&sp, "alice").await;
    let first = sp.create_page(owner, "First", false).await.unwrap();
    let second = sp.create_page(owner, "Second", false).await.unwrap();
    let third = sp.create_page(owner, "Third", false).await.unwrap();

    let deleting = {
        let sp = sp.clone();
        tokio::spawn(async move { sp.delete_page(owner, first.id).await })
    };
    let switching = {
        let sp = sp.clone();
        tokio::spawn(async move { sp.set_default_page(owner, third.id).await.map(|_| ()) })
    };
    join_all(vec![deleting, switching]).await;

    let remaining = sp.list_pages(owner).await.unwrap();
    assert!(remaining.iter().any(|p| p.id == second.id));
    assert_eq!(remaining.iter().filter(|p| p.is_default).count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_link_inserts_respect_the_cap() {
    let sp = test_startpages().await;
    let (owner, page, section) = owner_with_section(&sp, "alice").await;
    fill_section(&sp, owner, &section, MAX_LINKS_PER_SECTION - 2).await;

    let handles = (0..6)
        .map(|i| {
            let sp = sp.clone();
            let section = section.id;
            tokio::spawn(async move {
                sp.add_link(owner, section, &format!("Extra {i}"), "https://example.com/extra")
                    .await
                    .map(|_| ())
            })
        })
        .collect();
    let results = join_all(handles).await;

    let added = results.iter().filter(|r| r.is_ok()).count();
    assert!(added <= 2, "{added} links added past the cap");
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        if !err.is_capacity_exceeded() {
            // Losing a lock race on SQLite surfaces as a database error.
            assert_eq!(err.kind(), ErrorKind::Internal, "unexpected error: {err}");
        }
    }
    assert_eq!(
        link_names(&sp, owner, &page, &section).await.len(),
        MAX_LINKS_PER_SECTION - 2 + added
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_moves_into_one_section_respect_the_cap() {
    let sp = test_startpages().await;
    let (owner, page, target) = owner_with_section(&sp, "alice").await;
    let left = sp.add_section_to(owner, page.id, "Left").await.unwrap();
    let right = sp.add_section_to(owner, page.id, "Right").await.unwrap();
    let resident = fill_section(&sp, owner, &target, MAX_LINKS_PER_SECTION - 3).await;
    let from_left = fill_section(&sp, owner, &left, 3).await;
    let from_right = fill_section(&sp, owner, &right, 3).await;

    let handles = [from_left, from_right]
        .into_iter()
        .map(|incoming| {
            let sp = sp.clone();
            let mut ids: Vec<_> = resident.iter().map(|l| l.id).collect();
            ids.extend(incoming.iter().map(|l| l.id));
            let target = target.id;
            tokio::spawn(async move { sp.reorder_links(owner, target, &ids).await })
        })
        .collect();
    let results = join_all(handles).await;

    // Each move fills the section on its own; both cannot land.
    assert!(results.iter().filter(|r| r.is_ok()).count() <= 1);
    assert!(link_names(&sp, owner, &page, &target).await.len() <= MAX_LINKS_PER_SECTION);
}
