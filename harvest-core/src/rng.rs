//! Deterministic per-key RNG derivation.
//!
//! A master seed is expanded into one sub-seed per key (a prompt, a ticker)
//! by BLAKE3 hashing, so a given key always gets the same stream regardless
//! of the order in which keys are processed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SeedDeriver {
    master_seed: u64,
}

impl SeedDeriver {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Master seed drawn from the thread RNG, for unseeded runs.
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive the sub-seed for `key`.
    pub fn sub_seed(&self, key: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(key.as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng_for(&self, key: &str) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_seeds_are_deterministic() {
        let a = SeedDeriver::new(42);
        let b = SeedDeriver::new(42);
        assert_eq!(a.sub_seed("FOO"), b.sub_seed("FOO"));
    }

    #[test]
    fn keys_and_masters_separate_streams() {
        let d = SeedDeriver::new(42);
        assert_ne!(d.sub_seed("FOO"), d.sub_seed("BAR"));
        assert_ne!(d.sub_seed("FOO"), SeedDeriver::new(43).sub_seed("FOO"));
    }

    #[test]
    fn derivation_ignores_call_order() {
        let d = SeedDeriver::new(7);
        let first = d.sub_seed("FOO");
        let _ = d.sub_seed("BAR");
        assert_eq!(d.sub_seed("FOO"), first);
    }
}
