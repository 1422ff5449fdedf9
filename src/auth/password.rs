use anyhow::Result;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use rand::rngs::OsRng;

use crate::domain::KanbanError;

pub const MIN_PASSWORD_CHARS: usize = 8;

/// Rules for a password chosen at registration.
pub fn check_new_password(password: &str) -> Result<(), KanbanError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(KanbanError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    if password.trim().is_empty() {
        return Err(KanbanError::BadRequest(
            "Password cannot be only whitespace".into(),
        ));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
