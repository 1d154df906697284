//! Error types for the user system
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UserError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid username: {reason}")]
    InvalidUsername { reason: String },

    #[error("Invalid email address: {email}")]
    InvalidEmail { email: String },

    #[error("Password too short: at least {min} characters required")]
    PasswordTooShort { min: usize },

    #[error("Password hashing failed: {reason}")]
    PasswordHashFailed { reason: String },
}

impl UserError {
    /// Check if this error is caused by the submitted values.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            UserError::InvalidCredentials
                | UserError::InvalidUsername { .. }
                | UserError::InvalidEmail { .. }
                | UserError::PasswordTooShort { .. }
        )
    }
}

impl From<UserError> for crate::Error {
    fn from(err: UserError) -> Self {
        crate::Error::User(err)
    }
}
