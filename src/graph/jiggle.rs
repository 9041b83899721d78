//! Randomness for breaking exact ties between coincident nodes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Half-width of the jitter interval.
const JIGGLE_SCALE: f64 = 1e-6;

/// A source of uniform samples in `[0, 1)`.
///
/// Any `FnMut() -> f64` closure qualifies, so tests can script exact values.
pub trait JitterSource {
    fn next_unit(&mut self) -> f64;

    /// A tiny signed offset, `(random - 0.5) * 1e-6`.
    fn jiggle(&mut self) -> f64 {
        (self.next_unit() - 0.5) * JIGGLE_SCALE
    }
}

impl<F: FnMut() -> f64> JitterSource for F {
    fn next_unit(&mut self) -> f64 {
        self()
    }
}

/// Jitter drawn from a `rand` generator.
#[derive(Debug, Clone)]
pub struct RngJitter<R> {
    rng: R,
}

impl<R: Rng> RngJitter<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngJitter<StdRng> {
    /// Deterministic jitter for reproducible layouts.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> JitterSource for RngJitter<R> {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}
