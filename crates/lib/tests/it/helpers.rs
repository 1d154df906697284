use std::sync::Arc;

use startpage::{
    FixedClock, Link, Page, Section, Startpages, UserId, backend::BackendImpl,
    backend::database::InMemory,
};

/// Creates a test backend based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
/// - "postgres": PostgreSQL backend (requires `postgres` feature and TEST_POSTGRES_URL)
///
/// # Example
/// ```bash
/// # Run tests with InMemory (default)
/// cargo test
///
/// # Run tests with SQLite
/// TEST_BACKEND=sqlite cargo test --features sqlite
///
/// # Run tests with PostgreSQL
/// TEST_BACKEND=postgres TEST_POSTGRES_URL="postgres://localhost/startpage_test" \
///   cargo test --features postgres
/// ```
pub async fn test_backend() -> Box<dyn BackendImpl> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use startpage::backend::database::Sqlite;
                Box::new(
                    Sqlite::sqlite_in_memory()
                        .await
                        .expect("Failed to create SQLite backend"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("postgres") => {
            #[cfg(feature = "postgres")]
            {
                use startpage::backend::database::Postgres;
                let url = std::env::var("TEST_POSTGRES_URL")
                    .unwrap_or_else(|_| "postgres://localhost/startpage_test".to_string());
                Box::new(
                    Postgres::connect_postgres_isolated(&url)
                        .await
                        .expect("Failed to connect to PostgreSQL"),
                )
            }
            #[cfg(not(feature = "postgres"))]
            {
                panic!("TEST_BACKEND=postgres requires the 'postgres' feature to be enabled")
            }
        }
        Ok("inmemory") | Ok("") | Err(_) => Box::new(InMemory::new()),
        Ok(other) => {
            panic!("Unknown TEST_BACKEND value: {other}. Supported: inmemory, sqlite, postgres")
        }
    }
}

/// Opens a service over the test backend with a [`FixedClock`].
pub async fn test_startpages() -> Startpages {
    test_startpages_with_clock(Arc::new(FixedClock::default())).await
}

pub async fn test_startpages_with_clock(clock: Arc<FixedClock>) -> Startpages {
    Startpages::open_with_clock(test_backend().await, clock)
        .await
        .expect("Failed to open test service")
}

/// Registers an account with a throwaway password.
pub async fn register(startpages: &Startpages, username: &str) -> UserId {
    startpages
        .register(username, &format!("{username}@example.com"), "password123")
        .await
        .expect("Failed to register user")
        .id
}

/// An account with one page holding one section.
pub async fn owner_with_section(
    startpages: &Startpages,
    username: &str,
) -> (UserId, Page, Section) {
    let owner = register(startpages, username).await;
    let page = startpages
        .create_page(owner, &format!("{username} home"), false)
        .await
        .expect("Failed to create page");
    let section = startpages
        .add_section_to(owner, page.id, "Links")
        .await
        .expect("Failed to add section");
    (owner, page, section)
}

/// Adds `count` links named `L0..` to a section.
pub async fn fill_section(
    startpages: &Startpages,
    owner: UserId,
    section: &Section,
    count: usize,
) -> Vec<Link> {
    let mut links = Vec::with_capacity(count);
    for i in 0..count {
        links.push(
            startpages
                .add_link(owner, section.id, &format!("L{i}"), &format!("https://example.com/{i}"))
                .await
                .expect("Failed to add link"),
        );
    }
    links
}

/// Link names of one section, in display order.
pub async fn link_names(startpages: &Startpages, owner: UserId, page: &Page, section: &Section) -> Vec<String> {
    let view = startpages
        .page_view(owner, page.id)
        .await
        .expect("Failed to load page");
    view.sections
        .into_iter()
        .find(|s| s.section.id == section.id)
        .map(|s| s.links.into_iter().map(|l| l.name).collect())
        .unwrap_or_default()
}
