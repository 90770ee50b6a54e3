//! # Ramp-Rate Scaler
//!
//! Limits how far the primary domain's commanded frequency may move per
//! evaluation, as a configured fraction of the delta between the new raw
//! solver output and the previously applied output. Up and down moves are
//! scaled independently.
//!
//! The scale multiply runs in fixed point (UFxp4.12 factor against a
//! 32-bit kHz magnitude, into a UFxp52.12 intermediate). Unlike the model
//! paths, overflow of the final narrowing here is a hard failure: a delta
//! that cannot be scaled back into 32 bits means the configuration or the
//! telemetry is inconsistent, and silently producing a wrong ramp is worse
//! than failing the cycle.

use magma_pmu_core::error::{Error, Result};
use magma_pmu_core::fxp::{UFxp4_12, UFxp52_12};
use magma_pmu_core::types::KiloHertz;

use crate::config::RampConfig;

// =============================================================================
// RAMP SCALER
// =============================================================================

/// Ramp-rate limiter for the primary domain output
#[derive(Debug, Clone)]
pub struct RampScaler {
    factor_up: UFxp4_12,
    factor_down: UFxp4_12,
    /// Previously applied output; the disabled sentinel until the first
    /// applied cycle
    prev: KiloHertz,
}

impl RampScaler {
    /// Create a scaler from the policy's ramp configuration
    pub fn new(cfg: &RampConfig) -> Self {
        Self {
            factor_up: cfg.factor_up,
            factor_down: cfg.factor_down,
            prev: KiloHertz::INVALID,
        }
    }

    /// Previously applied output
    pub fn prev(&self) -> KiloHertz {
        self.prev
    }

    /// Record the output actually handed to the arbiter this cycle
    pub fn note_applied(&mut self, applied: KiloHertz) {
        self.prev = applied;
    }

    /// Reset the cached output to the disabled sentinel
    pub fn reset(&mut self) {
        self.prev = KiloHertz::INVALID;
    }

    /// Scale a new raw limit against the previously applied one
    ///
    /// Returns the ramp-limited frequency; the caller still requantizes it
    /// to a supported point and re-propagates. Skipped entirely (raw value
    /// passes through) when either side is the disabled sentinel.
    pub fn scale(&self, new: KiloHertz) -> Result<KiloHertz> {
        if self.prev.is_invalid() || new.is_invalid() {
            return Ok(new);
        }
        if new == self.prev {
            return Ok(new);
        }

        let (factor, delta) = if new > self.prev {
            (self.factor_up, new.as_khz() - self.prev.as_khz())
        } else {
            (self.factor_down, self.prev.as_khz() - new.as_khz())
        };

        let scaled: UFxp52_12 = factor.saturating_mul(UFxp52_12::from_int(u64::from(delta)));
        let step = scaled.to_u32_round_checked().ok_or_else(|| {
            log::error!(
                "ramp delta {} kHz x factor {:?} overflows 32 bits",
                delta,
                factor
            );
            Error::ArithmeticOverflow
        })?;

        if step >= delta {
            return Ok(new);
        }
        let khz = if new > self.prev {
            self.prev.as_khz() + step
        } else {
            self.prev.as_khz() - step
        };
        Ok(KiloHertz::new(khz))
    }
}

// =============================================================================
// TESTS
// =============================================================================
