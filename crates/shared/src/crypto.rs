//! Cryptographic utilities for invitation tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Prefix carried by every invitation token.
pub const LINK_TOKEN_PREFIX: &str = "inv_";

/// Number of random bytes behind each invitation token.
const LINK_TOKEN_RANDOM_BYTES: usize = 32;

/// Length of the hex fingerprint written to logs.
const FINGERPRINT_LEN: usize = 12;

/// Generates an opaque, URL-safe invitation token.
///
/// 32 bytes from the thread-local CSPRNG, base64url encoded without padding,
/// prefixed with `inv_`.
pub fn generate_link_token() -> String {
    let mut bytes = [0u8; LINK_TOKEN_RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", LINK_TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(bytes))
}

/// Returns true if the value has the shape of an invitation token.
pub fn looks_like_link_token(value: &str) -> bool {
    value
        .strip_prefix(LINK_TOKEN_PREFIX)
        .map(|rest| {
            !rest.is_empty()
                && rest
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
        .unwrap_or(false)
}

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Short, non-reversible identifier for a token, safe to put in logs.
pub fn token_fingerprint(token: &str) -> String {
    let mut digest = sha256_hex(token);
    digest.truncate(FINGERPRINT_LEN);
    digest
}
