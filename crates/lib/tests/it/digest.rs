//! The daily summary mail.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use startpage::{
    FixedClock, Result, Startpages,
    digest::{DigestOutcome, MailMessage, Mailer},
    events::NotifyError,
    settings::GlobalSettings,
};

use crate::helpers::*;

#[derive(Debug, Default)]
struct Outbox {
    sent: Mutex<Vec<MailMessage>>,
}

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[derive(Debug)]
struct Bouncing;

#[async_trait]
impl Mailer for Bouncing {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        Err(NotifyError::Mail {
            recipient: message.to.clone(),
            reason: "mailbox full".to_string(),
        }
        .into())
    }
}

fn millis(rfc3339: &str) -> i64 {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .timestamp_millis()
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

async fn enable(sp: &Startpages, include_registrations: bool) {
    sp.update_settings(GlobalSettings {
        ntfy_active: false,
        daily_mail_active: true,
        daily_mail_include_registrations: include_registrations,
    })
    .await
    .unwrap();
}

/// Staff registered on Jan 1st, alice late on Jan 1st, bob on Jan 2nd.
/// The clock ends on Jan 2nd, so the digest reports Jan 1st.
async fn populated() -> Startpages {
    let clock = Arc::new(FixedClock::default());
    let sp = test_startpages_with_clock(clock.clone()).await;

    clock.set(millis("2024-01-01T09:00:00Z"));
    sp.register_staff("admin", "admin@example.com", "password123")
        .await
        .unwrap();
    sp.register_staff("nomail", "", "password123").await.unwrap();
    clock.set(millis("2024-01-01T23:59:00Z"));
    register(&sp, "alice").await;
    clock.set(millis("2024-01-02T00:00:00Z"));
    register(&sp, "bob").await;

    clock.set(millis("2024-01-02T08:00:00Z"));
    sp
}

#[tokio::test]
async fn reports_the_previous_day_to_staff() {
    let sp = populated().await;
    enable(&sp, true).await;
    let outbox = Outbox::default();

    let outcome = sp
        .send_digest(&outbox, "noreply@example.com", utc())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        DigestOutcome::Sent {
            delivered: 1,
            failed: 0
        }
    );

    let sent = outbox.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let mail = &sent[0];
    assert_eq!(mail.from, "noreply@example.com");
    assert_eq!(mail.to, "admin@example.com");
    assert_eq!(mail.subject, "Daily summary for 01 January");
    assert!(mail.body.contains("New registrations: 3"));
    assert!(mail.body.contains("- alice (alice@example.com) at 23:59 UTC"));
    assert!(mail.body.contains("- nomail (no email)"));
    // Bob joined at midnight, outside the window.
    assert!(!mail.body.contains("bob"));
    // Newest first.
    let alice = mail.body.find("alice").unwrap();
    let admin = mail.body.find("- admin").unwrap();
    assert!(alice < admin);
}

#[tokio::test]
async fn local_offset_shifts_the_window() {
    let sp = populated().await;
    enable(&sp, true).await;
    let outbox = Outbox::default();

    // In UTC+1 alice joined at 00:59 on Jan 2nd, and it is 09:00 on Jan 2nd.
    let plus_one = FixedOffset::east_opt(3600).unwrap();
    sp.send_digest(&outbox, "noreply@example.com", plus_one)
        .await
        .unwrap();

    let sent = outbox.sent.lock().unwrap();
    assert!(sent[0].body.contains("New registrations: 2"));
    assert!(!sent[0].body.contains("alice"));
}

#[tokio::test]
async fn disabled_digest_sends_nothing() {
    let sp = populated().await;
    let outbox = Outbox::default();

    let outcome = sp
        .send_digest(&outbox, "noreply@example.com", utc())
        .await
        .unwrap();
    assert_eq!(outcome, DigestOutcome::Disabled);
    assert_eq!(outcome.delivered(), 0);
    assert!(outbox.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn nothing_to_report_without_registrations_section() {
    let sp = populated().await;
    enable(&sp, false).await;
    let outbox = Outbox::default();

    let outcome = sp
        .send_digest(&outbox, "noreply@example.com", utc())
        .await
        .unwrap();
    assert_eq!(outcome, DigestOutcome::NothingToReport);
    assert!(outbox.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn quiet_day_sends_nothing() {
    let clock = Arc::new(FixedClock::default());
    let sp = test_startpages_with_clock(clock.clone()).await;
    sp.register_staff("admin", "admin@example.com", "password123")
        .await
        .unwrap();
    enable(&sp, true).await;

    clock.advance_days(3);
    let outcome = sp
        .send_digest(&Outbox::default(), "noreply@example.com", utc())
        .await
        .unwrap();
    assert_eq!(outcome, DigestOutcome::NothingToReport);
}

#[tokio::test]
async fn no_staff_addresses_means_no_recipients() {
    let clock = Arc::new(FixedClock::default());
    let sp = test_startpages_with_clock(clock.clone()).await;
    register(&sp, "alice").await;
    sp.register_staff("nomail", "", "password123").await.unwrap();
    enable(&sp, true).await;

    clock.advance_days(1);
    let outcome = sp
        .send_digest(&Outbox::default(), "noreply@example.com", utc())
        .await
        .unwrap();
    assert_eq!(outcome, DigestOutcome::NoRecipients);
}

#[tokio::test]
async fn delivery_failures_are_counted() {
    let sp = populated().await;
    enable(&sp, true).await;
    sp.register_staff("second", "second@example.com", "password123")
        .await
        .unwrap();

    let outcome = sp
        .send_digest(&Bouncing, "noreply@example.com", utc())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        DigestOutcome::Sent {
            delivered: 0,
            failed: 2
        }
    );
}
