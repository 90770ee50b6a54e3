//! # Single-Rail Power Model
//!
//! Maintains the multiplicative power model for one rail:
//!
//! ```text
//! P(f) = workload * V(f)^exp * f + leakage(V(f))
//! ```
//!
//! `observe` factors the dimensionless workload coefficient out of the
//! latest telemetry; `estimate` plugs a hypothetical frequency back into
//! the equation. Both run in unsigned fixed point: the workload numerator
//! stage is UFxp40.24, the final division rounds to nearest, and every
//! overflow saturates to the format maximum. Saturation is reported, never
//! a fault - power capping is a soft control problem and a clamp is safe.

use magma_pmu_core::error::Result;
use magma_pmu_core::fxp::{UFxp20_12, UFxp40_24, UFxp52_12};
use magma_pmu_core::status::PolicyInputs;
use magma_pmu_core::traits::Services;
use magma_pmu_core::types::{KiloHertz, Microvolts, PwrValue};

use crate::config::{PolicyFeatures, RailConfig};
use crate::metrics::{EstimatedMetrics, ObservedMetrics};

// =============================================================================
// MODEL TRAIT
// =============================================================================

/// Capability surface of a per-rail power model
///
/// The combined solver stores concrete [`RailModel`]s; the trait is the
/// seam for future model variants (and for test doubles).
pub trait RailPwrModel {
    /// Derive workload and floor data from one evaluation's telemetry
    fn observe(&mut self, services: &Services<'_>, inputs: &PolicyInputs<'_>)
        -> Result<&ObservedMetrics>;

    /// Estimate power/current at a hypothetical frequency
    ///
    /// Only meaningful after [`observe`](Self::observe) has run this cycle.
    fn estimate(&self, services: &Services<'_>, freq: KiloHertz) -> Result<EstimatedMetrics>;
}

// =============================================================================
// RAIL MODEL
// =============================================================================

/// Power model state for one rail
#[derive(Debug, Clone)]
pub struct RailModel {
    cfg: RailConfig,
    features: PolicyFeatures,
    observed: ObservedMetrics,
}

impl RailModel {
    /// Create a model from a validated rail descriptor
    pub fn new(cfg: RailConfig, features: PolicyFeatures) -> Self {
        Self {
            cfg,
            features,
            observed: ObservedMetrics::default(),
        }
    }

    /// Rail descriptor this model was built from
    pub fn config(&self) -> &RailConfig {
        &self.cfg
    }

    /// Metrics derived by the last observe
    pub fn observed(&self) -> &ObservedMetrics {
        &self.observed
    }

    /// Voltage floor imposed by sibling domains and the rail minimum
    pub fn voltage_floor(&self) -> Microvolts {
        self.observed.voltage_floor
    }

    /// Highest frequency supportable at the floor voltage
    pub fn fmax_at_vmin(&self) -> KiloHertz {
        self.observed.fmax_at_vmin
    }

    /// Voltage term `V^exp` in UFxp20.12
    fn volt_pow(&self, voltage: Microvolts) -> UFxp20_12 {
        let v = volts_fxp(voltage);
        let mut pow = v;
        for _ in 1..self.cfg.volt_exponent {
            pow = pow.saturating_mul(v);
        }
        pow
    }
}

impl RailPwrModel for RailModel {
    fn observe(
        &mut self,
        services: &Services<'_>,
        inputs: &PolicyInputs<'_>,
    ) -> Result<&ObservedMetrics> {
        let rail_entry = inputs.volt.get(self.cfg.volt_rail);
        let voltage = rail_entry.map_or(Microvolts::ZERO, |e| e.sensed);
        let rail_min = rail_entry.map_or(Microvolts::ZERO, |e| e.min);

        let freq = inputs
            .clk
            .get(self.cfg.clk_dom)
            .map_or(KiloHertz::ZERO, |e| e.sensed);

        // A missing channel snapshot (or an unmonitored rail) is legal:
        // the reading stays at zero and so does the workload.
        let reading = if self.cfg.pwr_channel.is_invalid() {
            None
        } else {
            inputs
                .channels
                .and_then(|ch| ch.reading(self.cfg.pwr_channel))
        };

        let leakage = services.leakage.leakage(self.cfg.volt_rail, voltage)?;

        let residency = if self.features.contains(PolicyFeatures::CLK_GATING_AWARE) {
            inputs
                .lpwr
                .and_then(|lp| lp.residency(self.cfg.clk_dom))
                .unwrap_or(UFxp20_12::ZERO)
        } else {
            UFxp20_12::ZERO
        };

        // workload = (reading - leakage) / f_MHz / V^exp
        //
        // Degenerate telemetry pins the workload at exactly zero: the loop
        // keeps running with a conservative zero-dynamic-power model.
        let workload = match reading {
            Some(r)
                if r > leakage
                    && freq != KiloHertz::ZERO
                    && !freq.is_invalid()
                    && voltage != Microvolts::ZERO =>
            {
                let dynamic = r.saturating_sub(leakage);
                let num = UFxp40_24::from_int(dynamic.raw() as u64);
                let denom: UFxp52_12 = freq_mhz_fxp(freq).saturating_mul(self.volt_pow(voltage));
                num.div_round(denom)
            }
            _ => UFxp20_12::ZERO,
        };

        // Voltage floor: the rail must stay high enough for every sibling
        // domain at its last-scheduled frequency, and never below the rail
        // minimum.
        let mut floor = rail_min;
        for dom in self.cfg.dependent_doms.iter() {
            if dom == self.cfg.clk_dom {
                continue;
            }
            let Some(entry) = inputs.clk.get(dom) else {
                continue;
            };
            if entry.target == KiloHertz::ZERO || entry.target.is_invalid() {
                continue;
            }
            let required = services.vf.voltage_for_freq(dom, entry.target)?;
            floor = floor.max(required);
        }

        let fmax_at_vmin = services.vf.freq_for_voltage(self.cfg.clk_dom, floor)?;

        self.observed = ObservedMetrics {
            voltage,
            freq,
            reading: reading.unwrap_or(PwrValue::ZERO),
            leakage,
            workload,
            residency,
            voltage_floor: floor,
            fmax_at_vmin,
        };
        Ok(&self.observed)
    }

    fn estimate(&self, services: &Services<'_>, freq: KiloHertz) -> Result<EstimatedMetrics> {
        let obs = &self.observed;

        // Zero frequency collapses the dynamic term; the rail still sits
        // at its floor voltage and pays leakage there.
        let required = if freq == KiloHertz::ZERO {
            obs.voltage_floor
        } else {
            services.vf.voltage_for_freq(self.cfg.clk_dom, freq)?
        };
        let voltage = required.max(obs.voltage_floor).offset(self.cfg.volt_offset_uv);
        let leakage = services.leakage.leakage(self.cfg.volt_rail, voltage)?;

        // Clock-gating awareness: the domain only burns dynamic power for
        // the un-gated fraction of the window.
        let f_eff = if obs.residency.is_zero() {
            freq_mhz_fxp(freq)
        } else {
            let active = UFxp20_12::ONE.saturating_sub(obs.residency);
            freq_mhz_fxp(freq).saturating_mul(active)
        };

        let dynamic: UFxp52_12 = obs
            .workload
            .saturating_mul::<20, 12, 52, 12>(self.volt_pow(voltage))
            .saturating_mul(f_eff);

        let dyn_int = dynamic.to_int_round();
        let total = dyn_int.saturating_add(leakage.raw() as u64);
        let saturated = dynamic == UFxp52_12::MAX || total > u32::MAX as u64;
        let value = if total > u32::MAX as u64 {
            PwrValue::MAX
        } else {
            PwrValue::new(total as u32)
        };

        Ok(EstimatedMetrics {
            freq,
            voltage,
            leakage,
            value,
            saturated,
        })
    }
}

// =============================================================================
// FIXED-POINT CONVERSIONS
// =============================================================================

/// Microvolts to volts in UFxp20.12
fn volts_fxp(v: Microvolts) -> UFxp20_12 {
    UFxp20_12::from_raw(v.as_uv() as u64 * 4096 / 1_000_000)
}

/// Kilohertz to megahertz in UFxp20.12, fraction preserved
fn freq_mhz_fxp(f: KiloHertz) -> UFxp20_12 {
    UFxp20_12::from_raw(f.as_khz() as u64 * 4096 / 1000)
}

// =============================================================================
// TESTS
// =============================================================================
