//!
//! Provides [`Startpages`], the service handle over a storage backend.
//!
//! `Startpages` ties together the Repository (`backend::BackendImpl`), the
//! site settings cache, domain event dispatch and the clock. Operations are
//! spread across the modules they belong to (`page`, `codec`, `user`,
//! `settings`, `digest`) as `impl Startpages` blocks.

use std::sync::Arc;

use handle_trait::Handle;

use crate::{
    Clock, Result, SystemClock,
    backend::BackendImpl,
    events::{DomainEvent, EventBus, EventSink},
    settings::SettingsCache,
};

/// Internal state for Startpages
///
/// `Startpages` itself is just a cheap-to-clone handle wrapping `Arc<StartpagesInternal>`.
pub(crate) struct StartpagesInternal {
    /// The storage backend
    backend: Arc<dyn BackendImpl>,
    /// Time provider for timestamps
    clock: Arc<dyn Clock>,
    /// Process-wide site settings holder
    settings: SettingsCache,
    /// Side-effect subscribers for domain events
    events: EventBus,
}

impl std::fmt::Debug for StartpagesInternal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartpagesInternal")
            .field("backend", &"<BackendImpl>")
            .field("clock", &self.clock)
            .field("settings", &self.settings)
            .field("events", &self.events)
            .finish()
    }
}

/// Service handle for start pages.
///
/// Cheap to clone; every clone shares the same backend, settings cache and
/// event subscribers.
///
/// ## Example
///
/// ```
/// # use startpage::{backend::database::InMemory, Startpages, UserId};
/// # #[tokio::main]
/// # async fn main() -> startpage::Result<()> {
/// let startpages = Startpages::open(Box::new(InMemory::new())).await?;
///
/// let alice = startpages.register("alice", "alice@example.com", "hunter22").await?;
/// let page = startpages.create_page(alice.id, "Work", false).await?;
/// let section = startpages.add_section(alice.id, "Docs").await?;
/// startpages.add_link(alice.id, section.id, "Rust", "https://doc.rust-lang.org").await?;
///
/// let view = startpages.resolve_page(alice.id, None).await?;
/// assert_eq!(view.page.id, page.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Handle)]
pub struct Startpages {
    inner: Arc<StartpagesInternal>,
}

impl Startpages {
    /// Open a service handle over `backend` using the system clock.
    pub async fn open(backend: Box<dyn BackendImpl>) -> Result<Self> {
        Self::open_with_clock(backend, Arc::new(SystemClock)).await
    }

    /// Open a service handle with an explicit time source.
    ///
    /// Tests pass a [`crate::FixedClock`] here to control registration
    /// timestamps and digest windows.
    pub async fn open_with_clock(
        backend: Box<dyn BackendImpl>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let backend: Arc<dyn BackendImpl> = Arc::from(backend);
        let settings = SettingsCache::new();
        // Warm the cache so a broken settings row fails at startup, not mid-request.
        settings.get(backend.as_ref()).await?;
        tracing::debug!("Startpages service opened");
        Ok(Self {
            inner: Arc::new(StartpagesInternal {
                backend,
                clock,
                settings,
                events: EventBus::default(),
            }),
        })
    }

    /// The storage backend.
    pub fn backend(&self) -> &dyn BackendImpl {
        self.inner.backend.as_ref()
    }

    /// The time source.
    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    pub(crate) fn settings_cache(&self) -> &SettingsCache {
        &self.inner.settings
    }

    /// Register a side-effect subscriber for domain events.
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        self.inner.events.subscribe(sink);
    }

    /// Dispatch an event to every subscriber.
    ///
    /// Called after the originating write committed. Subscriber failures are
    /// logged and never reach the caller.
    pub(crate) async fn emit(&self, event: DomainEvent) {
        let settings = match self.global_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, event = event.name(), "Cannot load settings for event dispatch");
                return;
            }
        };
        self.inner.events.dispatch(&event, &settings).await;
    }
}
