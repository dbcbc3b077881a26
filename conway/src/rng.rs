// rng.rs - Cell samplers for randomized fills

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const LCG_MULTIPLIER: u64 = 1103515245;
const LCG_INCREMENT: u64 = 12345;
const LCG_MODULUS: u64 = 1 << 31;

/// Linear-congruential generator `x' = (a*x + c) mod 2^31`.
///
/// Owned by a single fill call; the same seed always yields the same sequence.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed % LCG_MODULUS,
        }
    }

    /// Next value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.state = (self.state * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
        self.state as f64 / LCG_MODULUS as f64
    }
}

/// Source of uniform samples for density fills.
pub enum Sampler {
    Seeded(Lcg),
    Entropy(SmallRng),
}

impl Sampler {
    /// Seeded when a seed is given, otherwise backed by OS entropy.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Sampler::Seeded(Lcg::new(seed)),
            None => Sampler::Entropy(SmallRng::from_entropy()),
        }
    }

    pub fn next_unit(&mut self) -> f64 {
        match self {
            Sampler::Seeded(lcg) => lcg.next_unit(),
            Sampler::Entropy(rng) => rng.r#gen::<f64>(),
        }
    }

    /// `true` with probability `density`.
    pub fn chance(&mut self, density: f64) -> bool {
        self.next_unit() < density
    }
}
