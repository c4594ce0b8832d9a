//! Deterministic seed derivation.
//!
//! Child seeds are derived by hashing so a whole run (spawn jitter included)
//! reproduces from a single root seed.

use std::hash::{DefaultHasher, Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Derive a child seed from a parent seed and a string key.
///
/// Uses `DefaultHasher` (SipHash-1-3) for fast, deterministic mixing.
#[must_use]
pub fn derive_seed(parent: u64, key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    key.hash(&mut hasher);
    hasher.finish()
}

/// Derive a child seed from a parent seed and a numeric index.
#[must_use]
pub fn derive_seed_indexed(parent: u64, index: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    index.hash(&mut hasher);
    hasher.finish()
}

/// RNG for a specific episode, derived from the root seed.
#[must_use]
pub fn episode_rng(root: u64, episode: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_seed_indexed(root, episode))
}
