//! # Powercap Policy Configuration
//!
//! Construction-time descriptors for a power-capping policy.
//!
//! A [`PowercapConfig`] is produced by the board-object framework from the
//! VBIOS tables and handed to [`CombinedPolicy::new`]; nothing in it
//! changes after construction. Validation happens once, up front, so the
//! per-cycle paths can index registries without re-checking.
//!
//! [`CombinedPolicy::new`]: crate::policy::CombinedPolicy::new

use arrayvec::ArrayVec;
use magma_pmu_core::error::{Error, RegistryKind, Result};
use magma_pmu_core::fxp::UFxp4_12;
use magma_pmu_core::types::{
    ClkDomIdx, ClkDomMask, LimitUnit, PwrChannelIdx, VoltRailIdx, MAX_RAILS,
};

// =============================================================================
// POLICY FEATURES
// =============================================================================

bitflags::bitflags! {
    /// Optional capabilities of a power-capping policy
    ///
    /// Flags mirror the VBIOS capability bits; a regime that depends on a
    /// disabled feature is pruned from the search graph for every cycle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PolicyFeatures: u32 {
        /// Search the multi-regime tuple space instead of the primary
        /// domain's raw VF points
        const MULTI_REGIME = 1 << 0;
        /// Honor the perf controller's secondary-rail soft floor
        const SEC_SOFT_FLOOR = 1 << 1;
        /// Bound the primary:secondary ratio with the min/max topologies
        const RATIO_BOUNDS = 1 << 2;
        /// Scale effective frequency by measured low-power residency
        const CLK_GATING_AWARE = 1 << 3;
    }
}

// =============================================================================
// RAIL CONFIGURATION
// =============================================================================

/// Static description of one rail participating in a policy
#[derive(Debug, Clone, Copy)]
pub struct RailConfig {
    /// Clock domain driven by this rail model
    pub clk_dom: ClkDomIdx,
    /// Voltage rail supplying the domain
    pub volt_rail: VoltRailIdx,
    /// Power channel monitoring the rail
    pub pwr_channel: PwrChannelIdx,
    /// Other clock domains that depend on the same voltage rail
    ///
    /// Their required voltages at their last-scheduled frequencies feed
    /// the rail's voltage floor.
    pub dependent_doms: ClkDomMask,
    /// Exponent of the voltage term in the power equation
    pub volt_exponent: u8,
    /// Signed delta applied to every estimated voltage, in microvolts
    pub volt_offset_uv: i32,
}

impl Default for RailConfig {
    fn default() -> Self {
        Self {
            clk_dom: ClkDomIdx::INVALID,
            volt_rail: VoltRailIdx::INVALID,
            pwr_channel: PwrChannelIdx::INVALID,
            dependent_doms: ClkDomMask::EMPTY,
            volt_exponent: 2,
            volt_offset_uv: 0,
        }
    }
}

// =============================================================================
// RAMP CONFIGURATION
// =============================================================================

/// Ramp-rate scale factors, independently configurable per direction
///
/// A factor of 1.0 (or larger) disables limiting for that direction.
#[derive(Debug, Clone, Copy)]
pub struct RampConfig {
    /// Fraction of the delta applied when the limit increases
    pub factor_up: UFxp4_12,
    /// Fraction of the delta applied when the limit decreases
    pub factor_down: UFxp4_12,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            factor_up: UFxp4_12::ONE,
            factor_down: UFxp4_12::ONE,
        }
    }
}

// =============================================================================
// POLICY CONFIGURATION
// =============================================================================

/// Construction descriptor for a combined-rail power-capping policy
#[derive(Debug, Clone)]
pub struct PowercapConfig {
    /// Participating rails; index 0 is the primary domain
    pub rails: ArrayVec<RailConfig, MAX_RAILS>,
    /// Enabled optional capabilities
    pub features: PolicyFeatures,
    /// Ramp-rate limiting factors
    pub ramp: RampConfig,
    /// Unit of every budget and reading in this policy
    pub unit: LimitUnit,
}

impl PowercapConfig {
    /// Check the descriptor for construction-time contract violations
    ///
    /// Multi-regime mode needs exactly one primary and one secondary rail:
    /// the regime space is defined over a single coupled domain pair, and
    /// a rail without a slot in it would escape budget enforcement. Every
    /// board-object index must address a registry slot. The power channel
    /// may be left invalid (the rail then observes zero workload), the
    /// rest may not.
    pub fn validate(&self) -> Result<()> {
        if self.rails.is_empty() {
            return Err(Error::InvalidArgument);
        }
        if self.features.contains(PolicyFeatures::MULTI_REGIME) && self.rails.len() != 2 {
            return Err(Error::InvalidArgument);
        }
        for rail in &self.rails {
            if !rail.clk_dom.is_in_range() {
                return Err(Error::IndexOutOfRange(RegistryKind::ClkDomain));
            }
            if !rail.volt_rail.is_in_range() {
                return Err(Error::IndexOutOfRange(RegistryKind::VoltRail));
            }
            if !rail.pwr_channel.is_invalid() && !rail.pwr_channel.is_in_range() {
                return Err(Error::IndexOutOfRange(RegistryKind::PwrChannel));
            }
            if !rail.dependent_doms.is_in_range() {
                return Err(Error::IndexOutOfRange(RegistryKind::ClkDomain));
            }
            if rail.volt_exponent == 0 {
                return Err(Error::InvalidArgument);
            }
        }
        if self.ramp.factor_up.is_zero() || self.ramp.factor_down.is_zero() {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
