use std::ops::RangeInclusive;

use rand::rngs::OsRng;
use rand::{Rng, RngCore};

/// `len` random bytes from the OS CSPRNG, hex-encoded.
pub fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// An opaque 256-bit session token (64 hex characters).
pub fn session_token() -> String {
    random_hex(32)
}

/// A uniformly random integer in `range`, drawn from the OS CSPRNG.
pub fn random_in_range(range: RangeInclusive<u64>) -> u64 {
    OsRng.gen_range(range)
}
