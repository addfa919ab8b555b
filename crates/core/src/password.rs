//! Argon2id password hashing and the password length policy.

use argon2::password_hash::{PasswordHash, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::config::PasswordConfig;
use crate::error::{HubError, HubResult};

/// Hash a plaintext password with Argon2id using a random salt.
pub fn hash_password(password: &str) -> HubResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| HubError::PasswordHash(format!("Failed to hash password: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against an Argon2 hash string.
pub fn verify_password(password: &str, hash: &str) -> HubResult<()> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| HubError::PasswordHash(format!("Invalid password hash: {}", e)))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| HubError::InvalidCredentials)?;

    Ok(())
}

pub fn validate_password(password: &str, policy: &PasswordConfig) -> HubResult<()> {
    let length = password.chars().count();
    if length < policy.min_length {
        return Err(HubError::bad_request(format!(
            "Password must be at least {} characters long",
            policy.min_length
        )));
    }
    if length > policy.max_length {
        return Err(HubError::bad_request(format!(
            "Password must be at most {} characters long",
            policy.max_length
        )));
    }
    Ok(())
}
