//! Daily summary mail for staff.
//!
//! Reports the previous local calendar day. The run is externally scheduled
//! (see the `digest` command of the binary); nothing here runs in the
//! background.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};

use crate::{Result, Startpages, User, settings::GlobalSettings};

/// A half-open UTC interval covering one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestWindow {
    /// The local date being reported.
    pub day: NaiveDate,
    /// Local midnight starting `day`, in UTC. Inclusive.
    pub start: DateTime<Utc>,
    /// Local midnight ending `day`, in UTC. Exclusive.
    pub end: DateTime<Utc>,
}

impl DigestWindow {
    /// The full local day before `now`: `[yesterday 00:00, today 00:00)`.
    pub fn previous_day(now: DateTime<Utc>, utc_offset: FixedOffset) -> Self {
        let today = now.with_timezone(&utc_offset).date_naive();
        let offset = Duration::seconds(i64::from(utc_offset.local_minus_utc()));
        let today_midnight = today.and_time(NaiveTime::MIN) - offset;
        let end = DateTime::from_naive_utc_and_offset(today_midnight, Utc);
        let start = end - Duration::days(1);
        Self {
            day: today.pred_opt().unwrap_or(today),
            start,
            end,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// Day label used in the subject, e.g. `12 January`.
    pub fn label(&self) -> String {
        self.day.format("%d %B").to_string()
    }
}

/// One registration line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub date_joined: DateTime<Utc>,
}

/// A rendered digest, ready to mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub window: DigestWindow,
    pub subject: String,
    pub body: String,
    /// Newest first.
    pub registrations: Vec<Registration>,
}

/// Build the digest for `window`, or `None` when it is disabled or empty.
pub fn build_digest(
    settings: &GlobalSettings,
    users: &[User],
    window: &DigestWindow,
) -> Option<Digest> {
    if !settings.daily_mail_active {
        return None;
    }

    let mut registrations = Vec::new();
    if settings.daily_mail_include_registrations {
        registrations = users
            .iter()
            .filter(|u| window.contains(u.date_joined))
            .map(|u| Registration {
                username: u.username.clone(),
                email: u.email.clone(),
                date_joined: u.date_joined,
            })
            .collect();
        registrations.sort_by(|a, b| b.date_joined.cmp(&a.date_joined));
        tracing::info!(
            day = %window.label(),
            count = registrations.len(),
            start = %window.start,
            end = %window.end,
            "Collected registrations"
        );
    }

    if registrations.is_empty() {
        return None;
    }

    let subject = format!("Daily summary for {}", window.label());
    let mut body = format!("{subject}\n\nNew registrations: {}\n", registrations.len());
    for r in &registrations {
        let email = if r.email.is_empty() { "no email" } else { &r.email };
        body.push_str(&format!(
            "- {} ({}) at {} UTC\n",
            r.username,
            email,
            r.date_joined.format("%H:%M")
        ));
    }

    Some(Digest {
        window: *window,
        subject,
        body,
        registrations,
    })
}

/// An outgoing plain-text mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound mail delivery.
#[async_trait]
pub trait Mailer: Send + Sync + Debug {
    async fn send(&self, message: &MailMessage) -> Result<()>;
}

/// What a digest run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestOutcome {
    /// `daily_mail_active` is off.
    Disabled,
    /// Nothing happened in the window.
    NothingToReport,
    /// There was news but no staff account has an email address.
    NoRecipients,
    /// Mails were attempted, one per recipient.
    Sent { delivered: usize, failed: usize },
}

impl DigestOutcome {
    /// Number of mails actually delivered.
    pub fn delivered(&self) -> usize {
        match self {
            DigestOutcome::Sent { delivered, .. } => *delivered,
            _ => 0,
        }
    }
}

impl Startpages {
    /// Build and send the digest for the day before now.
    ///
    /// One mail per staff account with an email address, so recipients do
    /// not see each other. Per-recipient failures are logged and counted.
    pub async fn send_digest(
        &self,
        mailer: &dyn Mailer,
        from: &str,
        utc_offset: FixedOffset,
    ) -> Result<DigestOutcome> {
        let settings = self.global_settings().await?;
        if !settings.daily_mail_active {
            tracing::warn!("Daily mail is disabled in site settings, skipping");
            return Ok(DigestOutcome::Disabled);
        }

        let window = DigestWindow::previous_day(self.clock().now(), utc_offset);
        let users = self.list_users().await?;
        let Some(digest) = build_digest(&settings, &users, &window) else {
            tracing::info!(day = %window.label(), "No updates for the period, no mail sent");
            return Ok(DigestOutcome::NothingToReport);
        };

        let recipients: Vec<&str> = users
            .iter()
            .filter(|u| u.is_staff && !u.email.is_empty())
            .map(|u| u.email.as_str())
            .collect();
        if recipients.is_empty() {
            tracing::warn!("No staff accounts with email addresses found");
            return Ok(DigestOutcome::NoRecipients);
        }

        let (mut delivered, mut failed) = (0, 0);
        for to in recipients {
            let message = MailMessage {
                from: from.to_string(),
                to: to.to_string(),
                subject: digest.subject.clone(),
                body: digest.body.clone(),
            };
            match mailer.send(&message).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    tracing::error!(recipient = to, error = %e, "Failed to send daily mail");
                }
            }
        }
        tracing::info!(delivered, failed, "Daily mail sent");
        Ok(DigestOutcome::Sent { delivered, failed })
    }
}
