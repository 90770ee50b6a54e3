//! # MAGMA PMU Collaborator Traits
//!
//! Seams to the services the power policies consume but do not own: the
//! clock-domain VF curves, cross-domain frequency propagation, and the
//! leakage model.
//!
//! All three traits are object safe. A policy receives them bundled in a
//! [`Services`] reference whose lifetime covers exactly one evaluation;
//! nothing is retained across cycles.

use crate::error::Result;
use crate::types::{ClkDomIdx, KiloHertz, Microvolts, PwrValue, VfPointIdx, VoltRailIdx};

// =============================================================================
// PROPAGATION TOPOLOGY
// =============================================================================

/// Coupling rule used when propagating a frequency between clock domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropTopology {
    /// Nominal coupling between the domains
    Default,
    /// Coupling with the primary:secondary ratio at its maximum bound
    RatioMax,
    /// Coupling with the primary:secondary ratio at its minimum bound
    RatioMin,
}

// =============================================================================
// VF CURVE SERVICE
// =============================================================================

/// Frequency/voltage curve queries for one clock domain
///
/// Every method is constrained to the active pstate/VF range: frequencies
/// and discrete points outside that range do not exist from the caller's
/// point of view. Point indices ascend with frequency.
pub trait VfCurve {
    /// Voltage required to run the domain at the given frequency
    fn voltage_for_freq(&self, dom: ClkDomIdx, freq: KiloHertz) -> Result<Microvolts>;

    /// Highest frequency the domain supports at the given voltage
    fn freq_for_voltage(&self, dom: ClkDomIdx, voltage: Microvolts) -> Result<KiloHertz>;

    /// Number of discrete frequency points in the active range
    fn point_count(&self, dom: ClkDomIdx) -> Result<u16>;

    /// Frequency of a discrete point
    fn freq_at_point(&self, dom: ClkDomIdx, point: VfPointIdx) -> Result<KiloHertz>;

    /// Highest point whose frequency is at most the given frequency
    ///
    /// Fails with a lookup error when the frequency lies below the lowest
    /// point.
    fn point_floor(&self, dom: ClkDomIdx, freq: KiloHertz) -> Result<VfPointIdx>;

    /// Lowest point whose frequency is at least the given frequency
    ///
    /// Fails with a lookup error when the frequency lies above the highest
    /// point.
    fn point_ceil(&self, dom: ClkDomIdx, freq: KiloHertz) -> Result<VfPointIdx>;

    /// Active range as (lowest, highest) supported frequency
    fn freq_range(&self, dom: ClkDomIdx) -> Result<(KiloHertz, KiloHertz)>;
}

// =============================================================================
// CLOCK PROPAGATION SERVICE
// =============================================================================

/// Cross-domain frequency propagation
///
/// Implementations own the coupling ratios; policies only name the
/// topology. Propagation must be monotonic in the input frequency and
/// invertible by swapping `from` and `to`.
pub trait ClkPropagator {
    /// Frequency of `to` implied by running `from` at `freq`
    fn propagate(
        &self,
        from: ClkDomIdx,
        to: ClkDomIdx,
        freq: KiloHertz,
        topology: PropTopology,
    ) -> Result<KiloHertz>;
}

// =============================================================================
// LEAKAGE SERVICE
// =============================================================================

/// Static leakage as a function of rail voltage
pub trait LeakageModel {
    /// Leakage draw of the rail at the given voltage
    ///
    /// The unit (mW or mA) matches the owning policy's limit unit.
    fn leakage(&self, rail: VoltRailIdx, voltage: Microvolts) -> Result<PwrValue>;
}

// =============================================================================
// SERVICE BUNDLE
// =============================================================================

/// Collaborator references valid for one evaluation cycle
#[derive(Clone, Copy)]
pub struct Services<'a> {
    /// VF curve service
    pub vf: &'a dyn VfCurve,
    /// Clock propagation service
    pub prop: &'a dyn ClkPropagator,
    /// Leakage model service
    pub leakage: &'a dyn LeakageModel,
}

// =============================================================================
// STATIC ASSERTIONS
// =============================================================================

static_assertions::assert_obj_safe!(VfCurve, ClkPropagator, LeakageModel);
static_assertions::assert_impl_all!(PropTopology: Send, Sync, Copy);
