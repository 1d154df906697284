//! Export and import of page documents.

use startpage::codec::PageDocument;

use crate::helpers::*;

#[tokio::test]
async fn export_then_import_reproduces_the_page() {
    let sp = test_startpages().await;
    let (owner, page, section) = owner_with_section(&sp, "alice").await;
    fill_section(&sp, owner, &section, 3).await;
    sp.add_section_to(owner, page.id, "Empty").await.unwrap();

    let exported = sp.export_page(owner, page.id).await.unwrap();
    assert_eq!(exported.title, "alice home");
    assert_eq!(exported.sections.len(), 2);
    assert_eq!(exported.sections[0].name, "Links");
    assert_eq!(exported.link_count(), 3);

    // Slugs are global, so the unchanged title collides for any account.
    let bob = register(&sp, "bob").await;
    let err = sp.import_json(bob, &exported.to_json().unwrap()).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(sp.list_pages(bob).await.unwrap().is_empty());

    // Under a new title the copy lands next to the source page.
    let mut copy = exported.clone();
    copy.title = "alice home copy".to_string();
    let imported = sp.import_json(owner, &copy.to_json().unwrap()).await.unwrap();
    assert_eq!(imported.slug, "alice-home-copy");
    assert!(!imported.is_default);
    assert_ne!(imported.id, page.id);

    let reexported = sp.export_page(owner, imported.id).await.unwrap();
    assert_eq!(reexported.sections, exported.sections);
    assert_eq!(reexported, copy);

    // The first page of an account is its default.
    let mut first = exported.clone();
    first.title = "bob home".to_string();
    let imported = sp.import_json(bob, &first.to_json().unwrap()).await.unwrap();
    assert!(imported.is_default);
    assert_eq!(sp.export_page(bob, imported.id).await.unwrap().sections, exported.sections);
}

#[tokio::test]
async fn malformed_documents_are_rejected() {
    let sp = test_startpages().await;
    let owner = register(&sp, "alice").await;

    for json in [
        "not json",
        "42",
        r#"{"title": null}"#,
        r#"{"sections": {"name": "x"}}"#,
        r#"{"sections": [{"links": [{"url": 5}]}]}"#,
    ] {
        let err = sp.import_json(owner, json).await.unwrap_err();
        assert!(err.is_invalid_format(), "{json}: {err}");
    }
    assert!(sp.list_pages(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_fields_import_with_defaults() {
    let sp = test_startpages().await;
    let owner = register(&sp, "alice").await;

    let page = sp
        .import_json(owner, r#"{"sections":[{"links":[{}]}]}"#)
        .await
        .unwrap();
    assert_eq!(page.title, "Imported Page");

    let doc = sp.export_page(owner, page.id).await.unwrap();
    assert_eq!(doc.sections[0].name, "Untitled Section");
    assert_eq!(doc.sections[0].links[0].name, "Link");
    assert_eq!(doc.sections[0].links[0].url, "#");
}

#[tokio::test]
async fn import_is_not_capped() {
    let sp = test_startpages().await;
    let owner = register(&sp, "alice").await;

    let links: Vec<String> = (0..15)
        .map(|i| format!(r#"{{"name":"L{i}","url":"https://example.com/{i}","order":{i}}}"#))
        .collect();
    let json = format!(
        r#"{{"title":"Big","sections":[{{"name":"All","order":0,"links":[{}]}}]}}"#,
        links.join(",")
    );
    let page = sp.import_json(owner, &json).await.unwrap();
    let doc = sp.export_page(owner, page.id).await.unwrap();
    assert_eq!(doc.link_count(), 15);
    assert_eq!(doc.sections[0].links[14].name, "L14");
}

#[tokio::test]
async fn import_keeps_existing_default() {
    let sp = test_startpages().await;
    let (owner, page, _) = owner_with_section(&sp, "alice").await;
    assert!(page.is_default);

    let imported = sp
        .import_page(
            owner,
            &PageDocument {
                title: "Work".to_string(),
                sections: Vec::new(),
            },
        )
        .await
        .unwrap();
    assert!(!imported.is_default);

    let defaults: Vec<_> = sp
        .list_pages(owner)
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.is_default)
        .collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, page.id);
}

#[tokio::test]
async fn import_title_collision_leaves_nothing_behind() {
    let sp = test_startpages().await;
    let (owner, _, _) = owner_with_section(&sp, "alice").await;

    let err = sp
        .import_json(
            owner,
            r#"{"title":"alice home","sections":[{"name":"S","links":[{"name":"a","url":"https://a.example"}]}]}"#,
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(sp.list_pages(owner).await.unwrap().len(), 1);
}

#[tokio::test]
async fn overlong_fields_are_invalid_input() {
    let sp = test_startpages().await;
    let owner = register(&sp, "alice").await;

    let json = format!(r#"{{"title":"{}"}}"#, "t".repeat(101));
    let err = sp.import_json(owner, &json).await.unwrap_err();
    assert!(err.is_invalid_input());

    let json = format!(
        r#"{{"sections":[{{"links":[{{"url":"https://{}.example"}}]}}]}}"#,
        "u".repeat(500)
    );
    let err = sp.import_json(owner, &json).await.unwrap_err();
    assert!(err.is_invalid_input());
}

#[tokio::test]
async fn export_of_foreign_page_is_not_found() {
    let sp = test_startpages().await;
    let (_, page, _) = owner_with_section(&sp, "alice").await;
    let bob = register(&sp, "bob").await;

    let err = sp.export_page(bob, page.id).await.unwrap_err();
    assert!(err.is_not_found());
}
