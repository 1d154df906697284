//! JSON snapshots of the InMemory backend.

use startpage::{
    Startpages,
    backend::database::InMemory,
    settings::{GlobalSettings, NewColorScheme},
};

use crate::helpers::*;

async fn reopen(path: &std::path::Path) -> Startpages {
    let backend = InMemory::load_from_file(path).await.unwrap();
    Startpages::open(Box::new(backend)).await.unwrap()
}

#[tokio::test]
async fn snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("startpage.json");

    let backend = InMemory::new();
    let sp = Startpages::open(Box::new(backend)).await.unwrap();
    let (owner, page, section) = owner_with_section(&sp, "alice").await;
    fill_section(&sp, owner, &section, 3).await;
    let scheme = sp
        .add_color_scheme(NewColorScheme {
            name: "Dark".to_string(),
            is_dark: true,
            preview_colors: vec!["#111".to_string()],
            css_variables: String::new(),
        })
        .await
        .unwrap();
    sp.select_theme(owner, Some(scheme.id)).await.unwrap();
    sp.update_settings(GlobalSettings {
        daily_mail_active: true,
        ..GlobalSettings::default()
    })
    .await
    .unwrap();

    let in_memory = sp.backend().as_any().downcast_ref::<InMemory>().unwrap();
    in_memory.save_to_file(&path).await.unwrap();

    let restored = reopen(&path).await;
    assert_eq!(
        restored.page_view(owner, page.id).await.unwrap(),
        sp.page_view(owner, page.id).await.unwrap()
    );
    assert_eq!(restored.theme_for(owner).await.unwrap(), Some(scheme));
    assert!(restored.global_settings().await.unwrap().daily_mail_active);
    assert!(restored.authenticate("alice", "password123").await.is_ok());
}

#[tokio::test]
async fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let backend = InMemory::load_from_file(dir.path().join("absent.json"))
        .await
        .unwrap();
    assert_eq!(backend.page_count().await, 0);
}

#[tokio::test]
async fn corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("startpage.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(InMemory::load_from_file(&path).await.is_err());

    std::fs::write(&path, r#"{"_v": 7}"#).unwrap();
    assert!(InMemory::load_from_file(&path).await.is_err());
}

#[tokio::test]
async fn deleted_ids_are_not_reused_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("startpage.json");

    let sp = Startpages::open(Box::new(InMemory::new())).await.unwrap();
    let (owner, _, section) = owner_with_section(&sp, "alice").await;
    let links = fill_section(&sp, owner, &section, 2).await;
    sp.delete_item(owner, startpage::ItemKind::Link, links[1].id.get())
        .await
        .unwrap();
    sp.backend()
        .as_any()
        .downcast_ref::<InMemory>()
        .unwrap()
        .save_to_file(&path)
        .await
        .unwrap();

    let restored = reopen(&path).await;
    let added = restored
        .add_link(owner, section.id, "New", "https://example.com/new")
        .await
        .unwrap();
    assert!(added.id > links[1].id);
}
