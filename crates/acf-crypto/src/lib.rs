//! Cryptographic primitives for festival passes.
//!
//! Provides the keyed BLAKE3 digest that makes a pass tamper-evident, argon2id
//! hashing for the shared admin secret, and OS-backed random tokens.
//!
//! All crypto operations wrap established libraries — no custom cryptography.

pub mod error;
pub mod hasher;
pub mod password;
pub mod random;

pub use error::CryptoError;
pub use hasher::{PassHasher, TokenFingerprint};
pub use password::{hash_password, hash_password_with, verify_password, Argon2Cost};
pub use random::{random_hex, random_in_range, session_token};
