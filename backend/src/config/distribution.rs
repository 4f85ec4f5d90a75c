//! Duration and count distributions
//!
//! Each configured distribution is a named family plus parameters, e.g.
//! `{"type": "pert", "low": 0.1, "mode": 0.25, "high": 0.5}`. Durations are
//! in hours. Counts are drawn from the same families and rounded to the
//! nearest integer.

use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while drawing from a distribution
///
/// These are configuration defects surfaced at the point of sampling; the
/// engine never clamps or redraws.
#[derive(Debug, Error, PartialEq)]
pub enum SamplingError {
    #[error("Distribution for {what} produced invalid duration {value}")]
    InvalidDuration { what: String, value: f64 },

    #[error("Distribution for {what} produced invalid count {value} (must be >= 1)")]
    InvalidCount { what: String, value: f64 },
}

/// A named distribution family with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Distribution {
    /// Always `value` (zero variance)
    Constant { value: f64 },

    /// Uniform on `[low, high]`
    Uniform { low: f64, high: f64 },

    /// Triangular with the given bounds and mode
    Triangular { low: f64, mode: f64, high: f64 },

    /// Beta-PERT with the given bounds and mode
    Pert { low: f64, mode: f64, high: f64 },

    /// Exponential with the given mean
    Exponential { mean: f64 },

    /// Normal; may yield negative values, which fail at sampling time
    Normal { mean: f64, std_dev: f64 },
}

impl Distribution {
    /// Shorthand for a zero-variance distribution.
    pub fn constant(value: f64) -> Self {
        Distribution::Constant { value }
    }

    /// Draw one raw value.
    pub fn sample(&self, random: &mut RandomSource) -> f64 {
        match *self {
            Distribution::Constant { value } => value,
            Distribution::Uniform { low, high } => low + (high - low) * random.u01(),
            Distribution::Triangular { low, mode, high } => {
                if high <= low {
                    return low;
                }
                let u = random.u01();
                let split = (mode - low) / (high - low);
                if u < split {
                    low + (u * (high - low) * (mode - low)).sqrt()
                } else {
                    high - ((1.0 - u) * (high - low) * (high - mode)).sqrt()
                }
            }
            Distribution::Pert { low, mode, high } => {
                if high <= low {
                    return low;
                }
                let range = high - low;
                let alpha = 1.0 + 4.0 * (mode - low) / range;
                let beta = 1.0 + 4.0 * (high - mode) / range;
                low + random.beta(alpha, beta) * range
            }
            Distribution::Exponential { mean } => random.exponential(mean),
            Distribution::Normal { mean, std_dev } => mean + std_dev * random.standard_normal(),
        }
    }

    /// Draw a duration; negative or non-finite values are errors.
    pub fn sample_duration(
        &self,
        random: &mut RandomSource,
        what: impl FnOnce() -> String,
    ) -> Result<f64, SamplingError> {
        let value = self.sample(random);
        if !value.is_finite() || value < 0.0 {
            return Err(SamplingError::InvalidDuration { what: what(), value });
        }
        Ok(value)
    }

    /// Draw a child count, rounded to the nearest integer; must be at least 1.
    pub fn sample_count(
        &self,
        random: &mut RandomSource,
        what: impl FnOnce() -> String,
    ) -> Result<usize, SamplingError> {
        let value = self.sample(random);
        let rounded = value.round();
        if !rounded.is_finite() || rounded < 1.0 {
            return Err(SamplingError::InvalidCount { what: what(), value });
        }
        Ok(rounded as usize)
    }

    /// Check parameters are usable; returns a human-readable reason if not.
    pub fn check(&self) -> Result<(), String> {
        let params: Vec<f64> = match *self {
            Distribution::Constant { value } => vec![value],
            Distribution::Uniform { low, high } => vec![low, high],
            Distribution::Triangular { low, mode, high }
            | Distribution::Pert { low, mode, high } => vec![low, mode, high],
            Distribution::Exponential { mean } => vec![mean],
            Distribution::Normal { mean, std_dev } => vec![mean, std_dev],
        };
        if params.iter().any(|p| !p.is_finite()) {
            return Err("parameters must be finite".to_string());
        }

        match *self {
            Distribution::Constant { value } if value < 0.0 => {
                Err(format!("constant value {} is negative", value))
            }
            Distribution::Uniform { low, high } if low < 0.0 || low > high => {
                Err(format!("need 0 <= low <= high, got [{}, {}]", low, high))
            }
            Distribution::Triangular { low, mode, high } | Distribution::Pert { low, mode, high }
                if low < 0.0 || low > mode || mode > high =>
            {
                Err(format!(
                    "need 0 <= low <= mode <= high, got ({}, {}, {})",
                    low, mode, high
                ))
            }
            Distribution::Exponential { mean } if mean <= 0.0 => {
                Err(format!("mean must be positive, got {}", mean))
            }
            Distribution::Normal { std_dev, .. } if std_dev < 0.0 => {
                Err(format!("std_dev must be non-negative, got {}", std_dev))
            }
            _ => Ok(()),
        }
    }
}
