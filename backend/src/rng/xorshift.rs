//! xorshift64* random source
//!
//! Fast, deterministic PRNG with 64-bit state. Same seed gives the same
//! sequence of variates, which is what makes a replication replayable.
//!
//! On top of the raw generator this module provides the primitive variates
//! the distribution families are built from: uniform `[0, 1)`, standard
//! normal (Box-Muller) and gamma (Marsaglia-Tsang).

use serde::{Deserialize, Serialize};

/// Seeded uniform-variate generator shared by all stage logic of one
/// replication.
///
/// # Example
/// ```
/// use hpath_sim_core::RandomSource;
///
/// let mut random = RandomSource::new(12345);
/// let r = random.u01();
/// assert!((0.0..1.0).contains(&r));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomSource {
    state: u64,
}

impl RandomSource {
    /// Create a new source with the given seed.
    ///
    /// A zero seed is replaced by 1 (xorshift state must be non-zero).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Current internal state, usable as the seed of an identical source.
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Uniform variate in `[0.0, 1.0)`.
    pub fn u01(&mut self) -> f64 {
        let value = self.next_u64();
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Uniform variate in `(0.0, 1.0]`, safe to take the logarithm of.
    fn u01_open_low(&mut self) -> f64 {
        1.0 - self.u01()
    }

    /// Standard normal variate via the Box-Muller transform.
    pub fn standard_normal(&mut self) -> f64 {
        let u1 = self.u01_open_low();
        let u2 = self.u01();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Exponential variate with the given mean.
    pub fn exponential(&mut self, mean: f64) -> f64 {
        -mean * self.u01_open_low().ln()
    }

    /// Gamma variate with unit scale (Marsaglia-Tsang).
    ///
    /// Shapes below 1 use the boost `G(a) = G(a + 1) * U^(1/a)`.
    pub fn gamma(&mut self, shape: f64) -> f64 {
        if shape < 1.0 {
            let boost = self.u01_open_low().powf(1.0 / shape);
            return self.gamma(shape + 1.0) * boost;
        }

        let d = shape - 1.0 / 3.0;
        let c = 1.0 / (9.0 * d).sqrt();
        loop {
            let x = self.standard_normal();
            let v = 1.0 + c * x;
            if v <= 0.0 {
                continue;
            }
            let v = v * v * v;
            let u = self.u01_open_low();
            if u.ln() < 0.5 * x * x + d - d * v + d * v.ln() {
                return d * v;
            }
        }
    }

    /// Beta variate built from two gamma variates.
    pub fn beta(&mut self, alpha: f64, beta: f64) -> f64 {
        let x = self.gamma(alpha);
        let y = self.gamma(beta);
        x / (x + y)
    }
}
