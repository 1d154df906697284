//! Session management for the web interface
//!
//! Provides in-memory session storage mapping session tokens to account ids.

use std::{collections::HashMap, sync::Arc};

use startpage::UserId;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Session token (UUID stored in cookie)
pub type SessionToken = String;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "startpage_session";

/// In-memory session store
///
/// Sessions are ephemeral and lost on server restart. The account itself is
/// re-read on every request, so a deleted account loses access immediately.
#[derive(Clone, Debug, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionToken, UserId>>>,
}

impl SessionStore {
    /// Create a new empty session store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session for an account and return its token.
    pub async fn create_session(&self, user: UserId) -> SessionToken {
        let token = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(token.clone(), user);
        token
    }

    /// Get the account behind a session token
    pub async fn get_user(&self, token: &str) -> Option<UserId> {
        self.sessions.read().await.get(token).copied()
    }

    /// Destroy a session
    pub async fn destroy_session(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    /// Get the number of active sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
