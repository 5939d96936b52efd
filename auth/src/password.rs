//! Salted password hashing.
//!
//! Each user gets a fresh random salt; the stored hash is
//! `base64(sha256(salt_bytes || password_bytes))`. Verification decodes
//! both stored strings and compares digests in constant time, so a
//! mismatch takes as long as a match.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const SALT_BYTES: usize = 16;

/// Generate a fresh base64-encoded random salt.
#[must_use]
pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);
    BASE64.encode(salt)
}

/// Hash `password` under the given base64 `salt`.
///
/// A salt that fails to decode is folded in as raw bytes rather than
/// rejected; salts produced by [`generate_salt`] always decode.
#[must_use]
pub fn hash_password(password: &str, salt: &str) -> String {
    let salt_bytes = BASE64
        .decode(salt)
        .unwrap_or_else(|_| salt.as_bytes().to_vec());
    let mut hasher = Sha256::new();
    hasher.update(&salt_bytes);
    hasher.update(password.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Check `password` against a stored hash and salt, in constant time.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str, salt: &str) -> bool {
    let candidate = hash_password(password, salt);
    constant_time_eq::constant_time_eq(candidate.as_bytes(), stored_hash.as_bytes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let salt = generate_salt();
        let hash = hash_password("hunter2hunter2", &salt);
        assert!(verify_password("hunter2hunter2", &hash, &salt));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let salt = generate_salt();
        let hash = hash_password("hunter2hunter2", &salt);
        assert!(!verify_password("hunter3hunter3", &hash, &salt));
    }

    #[test]
    fn same_password_different_salts_different_hashes() {
        let hash_a = hash_password("hunter2hunter2", &generate_salt());
        let hash_b = hash_password("hunter2hunter2", &generate_salt());
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn hashing_is_deterministic_under_a_fixed_salt() {
        let salt = generate_salt();
        assert_eq!(
            hash_password("hunter2hunter2", &salt),
            hash_password("hunter2hunter2", &salt)
        );
    }
}
