//! On-disk SQLite databases.

use startpage::{Startpages, backend::database::SqlxBackend};

use crate::helpers::*;

#[tokio::test]
async fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("startpage.db");

    let (owner, page) = {
        let backend = SqlxBackend::open_sqlite(&path).await.unwrap();
        let sp = Startpages::open(Box::new(backend)).await.unwrap();
        let (owner, page, section) = owner_with_section(&sp, "alice").await;
        fill_section(&sp, owner, &section, 2).await;
        (owner, page)
    };

    let backend = SqlxBackend::open_sqlite(&path).await.unwrap();
    let sp = Startpages::open(Box::new(backend)).await.unwrap();
    let view = sp.resolve_page(owner, None).await.unwrap();
    assert_eq!(view.page, page);
    assert_eq!(view.sections[0].links.len(), 2);
    assert!(sp.authenticate("alice", "password123").await.is_ok());
}

#[tokio::test]
async fn schema_initialization_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("startpage.db");

    for _ in 0..2 {
        let backend = SqlxBackend::open_sqlite(&path).await.unwrap();
        assert!(backend.is_sqlite());
        backend.close().await;
    }
}
