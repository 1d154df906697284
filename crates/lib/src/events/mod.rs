//! Domain events and their side-effect subscribers.
//!
//! Write paths call [`crate::Startpages`]'s internal `emit` after their
//! storage work committed. Each registered [`EventSink`] is invoked in
//! registration order; a failing sink is logged at `warn` and skipped, so a
//! notification outage never fails a registration or an import.

use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;

use crate::{PageId, Result, UserId, settings::GlobalSettings};

pub mod ntfy;

pub use ntfy::{Notification, NtfyNotifier, Priority};

/// Something that happened in the write path and may interest a side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// A new account was created.
    UserRegistered {
        user: UserId,
        username: String,
        email: String,
    },
    /// A page was created from an import document.
    PageImported {
        owner: UserId,
        page: PageId,
        title: String,
    },
}

impl DomainEvent {
    /// Short stable name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::UserRegistered { .. } => "user_registered",
            DomainEvent::PageImported { .. } => "page_imported",
        }
    }
}

/// A subscriber to domain events.
#[async_trait]
pub trait EventSink: Send + Sync + Debug {
    /// React to `event`. `settings` is the current site settings snapshot.
    async fn handle(&self, event: &DomainEvent, settings: &GlobalSettings) -> Result<()>;
}

/// Ordered list of subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    sinks: Mutex<Vec<Arc<dyn EventSink>>>,
}

impl EventBus {
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every subscriber, logging failures.
    pub async fn dispatch(&self, event: &DomainEvent, settings: &GlobalSettings) {
        // Snapshot so no lock is held across an await.
        let sinks: Vec<Arc<dyn EventSink>> = self
            .sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for sink in sinks {
            if let Err(e) = sink.handle(event, settings).await {
                tracing::warn!(event = event.name(), sink = ?sink, error = %e, "Event subscriber failed");
            }
        }
    }
}

/// Errors from notification delivery.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The HTTP client could not be built or the request did not complete.
    #[error("Notification request failed: {source}")]
    Request {
        #[source]
        source: reqwest::Error,
    },

    /// The notification server answered with a non-success status.
    #[error("Notification server returned HTTP {status}")]
    Status { status: u16 },

    /// Mail delivery to one recipient failed.
    #[error("Mail delivery to {recipient} failed: {reason}")]
    Mail { recipient: String, reason: String },
}

impl From<NotifyError> for crate::Error {
    fn from(err: NotifyError) -> Self {
        crate::Error::Notify(err)
    }
}
