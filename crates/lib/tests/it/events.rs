//! Domain event dispatch to subscribers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use startpage::{
    Result,
    events::{DomainEvent, EventSink, NotifyError},
    settings::GlobalSettings,
};

use crate::helpers::*;

#[derive(Debug, Default)]
struct Recorder {
    seen: Mutex<Vec<(DomainEvent, GlobalSettings)>>,
}

impl Recorder {
    fn events(&self) -> Vec<DomainEvent> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|(event, _)| event.clone())
            .collect()
    }
}

#[async_trait]
impl EventSink for Recorder {
    async fn handle(&self, event: &DomainEvent, settings: &GlobalSettings) -> Result<()> {
        self.seen.lock().unwrap().push((event.clone(), *settings));
        Ok(())
    }
}

#[derive(Debug)]
struct Failing;

#[async_trait]
impl EventSink for Failing {
    async fn handle(&self, _event: &DomainEvent, _settings: &GlobalSettings) -> Result<()> {
        Err(NotifyError::Status { status: 503 }.into())
    }
}

#[tokio::test]
async fn registration_is_announced() {
    let sp = test_startpages().await;
    let recorder = Arc::new(Recorder::default());
    sp.subscribe(recorder.clone());

    let alice = register(&sp, "alice").await;
    assert_eq!(
        recorder.events(),
        vec![DomainEvent::UserRegistered {
            user: alice,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
        }]
    );
}

#[tokio::test]
async fn import_is_announced_but_plain_edits_are_not() {
    let sp = test_startpages().await;
    let alice = register(&sp, "alice").await;
    let recorder = Arc::new(Recorder::default());
    sp.subscribe(recorder.clone());

    let page = sp.create_page(alice, "Home", false).await.unwrap();
    let section = sp.add_section_to(alice, page.id, "Links").await.unwrap();
    sp.add_link(alice, section.id, "Rust", "https://www.rust-lang.org")
        .await
        .unwrap();
    assert!(recorder.events().is_empty());

    let imported = sp.import_json(alice, r#"{"title":"Work"}"#).await.unwrap();
    assert_eq!(
        recorder.events(),
        vec![DomainEvent::PageImported {
            owner: alice,
            page: imported.id,
            title: "Work".to_string(),
        }]
    );
}

#[tokio::test]
async fn failed_writes_emit_nothing() {
    let sp = test_startpages().await;
    register(&sp, "alice").await;
    let recorder = Arc::new(Recorder::default());
    sp.subscribe(recorder.clone());

    assert!(sp.register("ALICE", "", "password123").await.is_err());
    assert!(recorder.events().is_empty());
}

#[tokio::test]
async fn failing_subscriber_does_not_fail_the_write() {
    let sp = test_startpages().await;
    let recorder = Arc::new(Recorder::default());
    sp.subscribe(Arc::new(Failing));
    sp.subscribe(recorder.clone());

    register(&sp, "alice").await;
    // Later subscribers still run.
    assert_eq!(recorder.events().len(), 1);
}

#[tokio::test]
async fn subscribers_see_current_settings() {
    let sp = test_startpages().await;
    let recorder = Arc::new(Recorder::default());
    sp.subscribe(recorder.clone());

    register(&sp, "alice").await;
    let active = GlobalSettings {
        ntfy_active: true,
        ..GlobalSettings::default()
    };
    sp.update_settings(active).await.unwrap();
    register(&sp, "bob").await;

    let seen = recorder.seen.lock().unwrap();
    assert!(!seen[0].1.ntfy_active);
    assert_eq!(seen[1].1, active);
}
