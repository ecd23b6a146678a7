//! Password hashing for self-registered accounts.
//!
//! Registrants redeeming an invitation choose their own password. Only the
//! Argon2id PHC string is ever stored.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;
use validator::ValidationError;

/// Error type for password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),
}

// OWASP (2024) Argon2id parameters: 19 MiB, 2 iterations, 1 lane.
const MEMORY_COST: u32 = 19456;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;
const OUTPUT_LEN: usize = 32;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

fn argon2() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST, TIME_COST, PARALLELISM, Some(OUTPUT_LEN))
        .map_err(|e| PasswordError::HashError(format!("Failed to create Argon2 params: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password into a PHC-formatted Argon2id string.
///
/// ```
/// use shared::password::hash_password;
///
/// let hash = hash_password("correct horse 1").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Validator hook: at least 8 characters with one letter and one digit.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LENGTH;
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_letter && has_digit {
        Ok(())
    } else {
        let mut err = ValidationError::new("password_strength");
        err.message = Some(
            "كلمة المرور يجب أن تكون 8 أحرف على الأقل وتحتوي على حرف ورقم".into(),
        );
        Err(err)
    }
}
