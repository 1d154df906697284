//! Password hashing for account logins, using Argon2id.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core},
};

use super::errors::UserError;
use crate::Result;

/// Hash a password using Argon2id
///
/// Returns the hash in PHC string format, salt included.
pub fn hash_password(password: impl AsRef<str>) -> Result<String> {
    let salt = SaltString::generate(&mut rand_core::OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_ref().as_bytes(), &salt)
        .map_err(|e| UserError::PasswordHashFailed {
            reason: e.to_string(),
        })?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its PHC hash
///
/// Any mismatch, including an unparseable hash, is reported as invalid credentials.
pub fn verify_password(password: impl AsRef<str>, password_hash: impl AsRef<str>) -> Result<()> {
    let parsed_hash =
        PasswordHash::new(password_hash.as_ref()).map_err(|_| UserError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_ref().as_bytes(), &parsed_hash)
        .map_err(|_| UserError::InvalidCredentials.into())
}
