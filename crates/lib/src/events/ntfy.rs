//! Push notifications through an ntfy server.
//!
//! Messages are POSTed as plain text to `<base_url>/<topic>` with the
//! `Title`, `Priority` and `Tags` headers ntfy understands.

use std::time::Duration;

use async_trait::async_trait;

use super::{DomainEvent, EventSink, NotifyError};
use crate::{Result, settings::GlobalSettings};

/// Request timeout for a single notification.
pub const NTFY_TIMEOUT: Duration = Duration::from_secs(5);

/// ntfy message priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Priority {
    Min,
    Low,
    #[default]
    Default,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Min => "min",
            Priority::Low => "low",
            Priority::Default => "default",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

/// One push message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub priority: Priority,
    /// ntfy tags; emoji short codes render as icons.
    pub tags: Vec<String>,
}

impl Notification {
    /// The message sent for a domain event.
    pub fn for_event(event: &DomainEvent) -> Self {
        match event {
            DomainEvent::UserRegistered {
                username, email, ..
            } => Notification {
                title: "New registration".to_string(),
                message: format!("New user registered: {username} ({email})"),
                priority: Priority::Default,
                tags: vec!["tada".to_string()],
            },
            DomainEvent::PageImported { owner, title, .. } => Notification {
                title: "Page imported".to_string(),
                message: format!("User {owner} imported page '{title}'"),
                priority: Priority::Low,
                tags: vec!["inbox_tray".to_string()],
            },
        }
    }
}

/// Event subscriber that forwards events to ntfy.
///
/// Sends nothing unless [`GlobalSettings::ntfy_active`] is set and both the
/// base URL and the topic are configured.
#[derive(Debug, Clone)]
pub struct NtfyNotifier {
    client: reqwest::Client,
    base_url: Option<String>,
    topic: Option<String>,
}

impl NtfyNotifier {
    pub fn new(base_url: Option<String>, topic: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(NTFY_TIMEOUT)
            .build()
            .map_err(|source| NotifyError::Request { source })?;
        Ok(Self {
            client,
            base_url: base_url.filter(|s| !s.trim().is_empty()),
            topic: topic.filter(|s| !s.trim().is_empty()),
        })
    }

    /// The topic URL, when fully configured.
    pub fn endpoint(&self) -> Option<String> {
        let base = self.base_url.as_deref()?;
        let topic = self.topic.as_deref()?;
        Some(format!("{}/{}", base.trim_end_matches('/'), topic))
    }

    /// Deliver one notification.
    pub async fn send(&self, endpoint: &str, notification: &Notification) -> Result<()> {
        let mut request = self
            .client
            .post(endpoint)
            .header("Title", &notification.title)
            .header("Priority", notification.priority.as_str())
            .body(notification.message.clone());
        if !notification.tags.is_empty() {
            request = request.header("Tags", notification.tags.join(","));
        }

        let response = request
            .send()
            .await
            .map_err(|source| NotifyError::Request { source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
            }
            .into());
        }
        tracing::debug!(endpoint, title = %notification.title, "Notification sent");
        Ok(())
    }
}

#[async_trait]
impl EventSink for NtfyNotifier {
    async fn handle(&self, event: &DomainEvent, settings: &GlobalSettings) -> Result<()> {
        if !settings.ntfy_active {
            return Ok(());
        }
        let Some(endpoint) = self.endpoint() else {
            tracing::warn!("NTFY: configuration missing (NTFY_BASE_URL or NTFY_TOPIC)");
            return Ok(());
        };
        self.send(&endpoint, &Notification::for_event(event)).await
    }
}
