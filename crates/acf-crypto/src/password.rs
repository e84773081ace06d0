use argon2::password_hash::{self, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;

use crate::error::CryptoError;

/// Argon2id cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Argon2Cost {
    /// Memory in KiB.
    pub memory_kib: u32,
    /// Iterations.
    pub time: u32,
    /// Lanes.
    pub parallelism: u32,
}

impl Argon2Cost {
    /// 64 MiB, 3 passes, 4 lanes.
    pub const PRODUCTION: Self = Self {
        memory_kib: 65_536,
        time: 3,
        parallelism: 4,
    };

    /// Cheap parameters for tests.
    pub const TESTING: Self = Self {
        memory_kib: 1_024,
        time: 1,
        parallelism: 1,
    };
}

impl Default for Argon2Cost {
    fn default() -> Self {
        Self::PRODUCTION
    }
}

/// Hash a secret with argon2id at production cost, returning a PHC string.
pub fn hash_password(secret: &str) -> Result<String, CryptoError> {
    hash_password_with(secret, Argon2Cost::PRODUCTION)
}

/// Hash a secret with argon2id at the given cost, returning a PHC string.
pub fn hash_password_with(secret: &str, cost: Argon2Cost) -> Result<String, CryptoError> {
    let params = Params::new(cost.memory_kib, cost.time, cost.parallelism, None)
        .map_err(|e| CryptoError::Hashing(e.to_string()))?;
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    argon
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CryptoError::Hashing(e.to_string()))
}

/// Check a secret against a stored PHC hash string.
///
/// The cost parameters are read from the hash itself. Returns `Ok(false)` on
/// a wrong secret and `Err(MalformedHash)` when the stored hash cannot be
/// used at all.
pub fn verify_password(secret: &str, stored_hash: &str) -> Result<bool, CryptoError> {
    let parsed = PasswordHash::new(stored_hash.trim())
        .map_err(|e| CryptoError::MalformedHash(e.to_string()))?;
    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CryptoError::MalformedHash(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password_with("open sesame", Argon2Cost::TESTING).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("open sesame", &hash).unwrap());
        assert!(!verify_password("open sesame!", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password_with("same", Argon2Cost::TESTING).unwrap();
        let b = hash_password_with("same", Argon2Cost::TESTING).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn embedded_cost_is_used_for_verification() {
        let hash = hash_password_with("pw", Argon2Cost::TESTING).unwrap();
        assert!(hash.contains("m=1024,t=1,p=1"));
        assert!(verify_password("pw", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("pw", "plaintext-password"),
            Err(CryptoError::MalformedHash(_))
        ));
    }
}
