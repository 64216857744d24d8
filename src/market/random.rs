//! Uniform randomness for the simulator.
//!
//! The engine only ever needs "a float in [0, 1)"; bet sizes, sides,
//! withdrawal decisions, and the match winner are all derived from that.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A source of uniform samples in `[0, 1)`.
#[cfg_attr(test, mockall::automock)]
pub trait UniformSource {
    /// Next sample in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// ChaCha8-backed source, reproducible from a `u64` seed.
#[derive(Debug, Clone)]
pub struct SeededSource {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seed this source was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl UniformSource for SeededSource {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Derive an independent seed for run `index` of stream `stream`.
///
/// Sweep points use distinct streams so parallel runs never share a
/// random sequence. Two rounds of the splitmix64 finalizer.
pub fn derive_seed(base: u64, stream: u64, index: u64) -> u64 {
    let stream_seed = splitmix64(base.wrapping_add(stream.wrapping_mul(GOLDEN_GAMMA)));
    splitmix64(stream_seed ^ index.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA))
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
