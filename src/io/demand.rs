// src/io/demand.rs

use crate::error::ConfigError;
use rand::Rng;
use rand_distr::{Distribution, Poisson};

/// Draws one period of demand from a Poisson distribution with mean `rate`.
///
/// A zero (or invalid) rate yields zero demand; samples saturate at `u32::MAX`.
/// Rates are checked by [`check_rate`] when the simulation is configured, so
/// in practice only the zero case is hit here.
pub fn sample_poisson<R: Rng + ?Sized>(rng: &mut R, rate: f64) -> u32 {
    if !(rate.is_finite() && rate > 0.0) {
        return 0;
    }
    match Poisson::new(rate) {
        Ok(poisson) => {
            let draw: f64 = poisson.sample(rng);
            if draw >= u32::MAX as f64 {
                u32::MAX
            } else {
                draw.max(0.0) as u32
            }
        }
        Err(_) => 0,
    }
}

pub fn check_rate(what: impl Into<String>, rate: f64) -> Result<(), ConfigError> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate {
            what: what.into(),
            value: rate,
        })
    }
}

/// Inclusive range of lead times, sampled uniformly per order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadTimeRange {
    pub min: u32,
    pub max: u32,
}

impl LeadTimeRange {
    pub fn new(min: u32, max: u32) -> Result<Self, ConfigError> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    /// Deterministic lead time.
    pub fn fixed(periods: u32) -> Result<Self, ConfigError> {
        Self::new(periods, periods)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min == 0 || self.min > self.max {
            return Err(ConfigError::InvalidLeadTime {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

impl Default for LeadTimeRange {
    fn default() -> Self {
        Self { min: 1, max: 3 }
    }
}
