//! Accounts and profiles.
//!
//! Accounts own pages. Registration emits [`DomainEvent::UserRegistered`];
//! deleting an account removes all of its pages with them.

pub mod crypto;
pub mod errors;

pub use errors::UserError;

use crate::{
    ColorSchemeId, Result, Startpages, User, UserId, constants::MAX_USERNAME_LEN,
    events::DomainEvent, model::NewUser,
};

/// Minimum password length for built-in logins.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Check a username: 1..=150 characters of letters, digits and `@.+-_`.
///
/// Returns the trimmed username.
pub fn validate_username(username: &str) -> Result<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(UserError::InvalidUsername {
            reason: "username is required".to_string(),
        }
        .into());
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(UserError::InvalidUsername {
            reason: format!("at most {MAX_USERNAME_LEN} characters allowed"),
        }
        .into());
    }
    if let Some(c) = username
        .chars()
        .find(|c| !(c.is_alphanumeric() || "@.+-_".contains(*c)))
    {
        return Err(UserError::InvalidUsername {
            reason: format!("character '{c}' is not allowed"),
        }
        .into());
    }
    Ok(username.to_string())
}

/// Check an email address. Empty means "no address".
fn validate_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() {
        return Ok(String::new());
    }
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
        && !email.chars().any(char::is_whitespace);
    if !well_formed {
        return Err(UserError::InvalidEmail {
            email: email.to_string(),
        }
        .into());
    }
    Ok(email.to_string())
}

impl Startpages {
    /// Create an account with a password login.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        self.create_account(username, email, password, false).await
    }

    /// Create a staff account. Staff with an email address receive the daily digest.
    pub async fn register_staff(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User> {
        self.create_account(username, email, password, true).await
    }

    async fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_staff: bool,
    ) -> Result<User> {
        let username = validate_username(username)?;
        let email = validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(UserError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            }
            .into());
        }
        let password_hash = crypto::hash_password(password)?;

        let user = self
            .backend()
            .create_user(NewUser {
                username,
                email,
                is_staff,
                date_joined: self.clock().now(),
                password_hash: Some(password_hash),
            })
            .await?;
        tracing::info!(user_id = %user.id, username = %user.username, is_staff, "Registered account");

        self.emit(DomainEvent::UserRegistered {
            user: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        })
        .await;
        Ok(user)
    }

    /// Check a username/password pair.
    ///
    /// Unknown usernames and wrong passwords fail the same way.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let user = self
            .backend()
            .find_user_by_username(username.trim())
            .await?
            .ok_or(UserError::InvalidCredentials)?;
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(UserError::InvalidCredentials)?;
        crypto::verify_password(password, hash)?;
        tracing::debug!(user_id = %user.id, "Authenticated");
        Ok(user)
    }

    /// Fetch an account.
    pub async fn user(&self, id: UserId) -> Result<User> {
        self.backend().get_user(id).await
    }

    /// All accounts, ordered by id.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.backend().list_users().await
    }

    /// Change an account's username.
    ///
    /// Uniqueness is case-insensitive and ignores the account itself, so
    /// changing only the case of one's own name succeeds.
    pub async fn change_username(&self, id: UserId, username: &str) -> Result<User> {
        let username = validate_username(username)?;
        self.backend().rename_user(id, &username).await?;
        tracing::info!(user_id = %id, username = %username, "Username changed");
        self.backend().get_user(id).await
    }

    /// Replace the avatar reference produced by the external file store.
    pub async fn set_avatar(&self, id: UserId, avatar: Option<&str>) -> Result<()> {
        let avatar = avatar.map(str::trim).filter(|a| !a.is_empty());
        self.backend().set_avatar(id, avatar).await?;
        tracing::info!(user_id = %id, has_avatar = avatar.is_some(), "Avatar updated");
        Ok(())
    }

    /// Select a color scheme, or clear the selection with `None`.
    pub async fn select_theme(&self, id: UserId, scheme: Option<ColorSchemeId>) -> Result<()> {
        self.backend().set_color_scheme(id, scheme).await?;
        tracing::info!(user_id = %id, scheme = ?scheme, "Theme selected");
        Ok(())
    }

    /// Delete an account and everything it owns.
    pub async fn delete_user(&self, id: UserId) -> Result<()> {
        self.backend().delete_user(id).await?;
        tracing::info!(user_id = %id, "Deleted account");
        Ok(())
    }
}
