//! Backend-specific persistence.

mod in_memory;
#[cfg(feature = "sqlite")]
mod sqlite;
