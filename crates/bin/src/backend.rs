//! Backend creation and utility functions.

use std::path::PathBuf;

use startpage::{
    Startpages,
    backend::{
        BackendImpl,
        database::{InMemory, Postgres, Sqlite},
    },
};

use crate::cli::{Backend, BackendConfig};

const SQLITE_FILE: &str = "startpage.db";
const SNAPSHOT_FILE: &str = "startpage.json";

/// Redact credentials from a PostgreSQL connection URL for safe logging
pub fn redact_postgres_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut redacted = parsed.clone();
        if !parsed.username().is_empty() {
            let _ = redacted.set_username("***");
        }
        if parsed.password().is_some() {
            let _ = redacted.set_password(Some("***"));
        }
        redacted.to_string()
    } else {
        "postgres://***@<unparsable-url>".to_string()
    }
}

/// Path of the JSON snapshot used by the in-memory backend.
pub fn snapshot_path(config: &BackendConfig) -> PathBuf {
    config.data_dir().join(SNAPSHOT_FILE)
}

/// Write the in-memory backend's state to its snapshot file.
///
/// Returns `false` for the SQL backends, which persist every write.
pub async fn save_snapshot(
    startpages: &Startpages,
    config: &BackendConfig,
) -> startpage::Result<bool> {
    let Some(in_memory) = startpages.backend().as_any().downcast_ref::<InMemory>() else {
        return Ok(false);
    };
    let path = snapshot_path(config);
    in_memory.save_to_file(&path).await?;
    tracing::info!("Snapshot saved to {}", path.display());
    Ok(true)
}

/// Create the appropriate backend based on configuration
pub async fn create_backend(
    config: &BackendConfig,
) -> Result<Box<dyn BackendImpl>, Box<dyn std::error::Error>> {
    let data_dir = config.data_dir();
    tokio::fs::create_dir_all(&data_dir).await?;

    match config.backend {
        Backend::Sqlite => {
            let db_path = data_dir.join(SQLITE_FILE);
            tracing::info!("Using SQLite backend at {}", db_path.display());
            Ok(Box::new(Sqlite::open_sqlite(&db_path).await?))
        }
        Backend::Postgres => {
            let url = config
                .postgres_url
                .as_ref()
                .ok_or("PostgreSQL backend requires --postgres-url or STARTPAGE_POSTGRES_URL")?;

            let display_url = redact_postgres_url(url);
            tracing::info!("Connecting to PostgreSQL backend at {}", display_url);

            match Postgres::connect_postgres(url).await {
                Ok(backend) => {
                    tracing::info!("Connected to PostgreSQL successfully");
                    Ok(Box::new(backend))
                }
                Err(e) => {
                    Err(format!("Failed to connect to PostgreSQL at {display_url}: {e}").into())
                }
            }
        }
        Backend::Inmemory => {
            let json_path = snapshot_path(config);
            tracing::info!(
                "Using in-memory backend with persistence at {}",
                json_path.display()
            );
            match InMemory::load_from_file(&json_path).await {
                Ok(backend) => {
                    tracing::info!("Loaded existing data from {}", json_path.display());
                    Ok(Box::new(backend))
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {e}. Starting with fresh data", json_path.display());
                    Ok(Box::new(InMemory::new()))
                }
            }
        }
    }
}
