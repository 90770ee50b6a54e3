//! # Solver Metrics & Diagnostics
//!
//! Per-rail metric snapshots and the query-style diagnostic state the
//! policy exposes to the RM status path after every evaluation.

use arrayvec::ArrayVec;
use magma_pmu_core::fxp::UFxp20_12;
use magma_pmu_core::types::{KiloHertz, Microvolts, PwrValue, TupleIdx, MAX_RAILS};

use crate::regime::RegimeId;

// =============================================================================
// OBSERVED METRICS
// =============================================================================

/// What one rail model derived from the latest telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObservedMetrics {
    /// Sensed rail voltage
    pub voltage: Microvolts,
    /// Sensed domain frequency
    pub freq: KiloHertz,
    /// Filtered power/current reading, zero when the channel was absent
    pub reading: PwrValue,
    /// Modeled leakage at the sensed voltage
    pub leakage: PwrValue,
    /// Dimensionless workload coefficient (mW or mA per MHz per V^exp)
    ///
    /// Exactly zero for degenerate telemetry: zero voltage, zero
    /// frequency, or a reading at or below leakage.
    pub workload: UFxp20_12,
    /// Low-power residency captured for clock-gating correction
    pub residency: UFxp20_12,
    /// Voltage floor imposed by sibling domains and the rail minimum
    pub voltage_floor: Microvolts,
    /// Highest frequency supportable at the floor voltage
    pub fmax_at_vmin: KiloHertz,
}

// =============================================================================
// ESTIMATED METRICS
// =============================================================================

/// Model output for one rail at a hypothetical frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EstimatedMetrics {
    /// Frequency the estimate was evaluated at
    pub freq: KiloHertz,
    /// Voltage the rail would run at (after floor and offset)
    pub voltage: Microvolts,
    /// Modeled leakage at that voltage
    pub leakage: PwrValue,
    /// Estimated total power/current
    pub value: PwrValue,
    /// Estimate clamped to the representable maximum
    pub saturated: bool,
}

// =============================================================================
// POLICY STATUS
// =============================================================================

/// Diagnostic snapshot of the last evaluation
///
/// Refreshed in place every cycle; readable between evaluations through
/// [`CombinedPolicy::status`].
///
/// [`CombinedPolicy::status`]: crate::policy::CombinedPolicy::status
#[derive(Debug, Clone, Default)]
pub struct PolicyStatus {
    /// Regime owning the selected tuple, `None` in legacy mode
    pub regime: Option<RegimeId>,
    /// Selected search index (tuple index, or VF point in legacy mode)
    pub tuple: Option<TupleIdx>,
    /// Step-back count of the last search
    pub steps_back: u8,
    /// Search floor accepted with the budget still violated
    pub best_effort: bool,
    /// Primary output was ramp-rate limited this cycle
    pub ramp_limited: bool,
    /// Observed metrics per rail, primary first
    pub observed: ArrayVec<ObservedMetrics, MAX_RAILS>,
    /// Estimated metrics per rail at the selected point, primary first
    pub estimated: ArrayVec<EstimatedMetrics, MAX_RAILS>,
}

// =============================================================================
// SOLVER STATISTICS
// =============================================================================

/// Cumulative counters across the policy's lifetime
#[derive(Debug, Clone, Copy, Default)]
pub struct SolverStats {
    /// Completed evaluations
    pub evaluations: u64,
    /// Evaluations that returned an error
    pub failed_evaluations: u64,
    /// Binary-search probes issued
    pub probes: u64,
    /// Step-back corrections taken after convergence
    pub steps_back: u64,
    /// Regime spaces built
    pub regime_builds: u64,
    /// Cycles where the ramp scaler limited the output
    pub ramp_limited: u64,
    /// Estimates that saturated to the representable maximum
    pub saturated_estimates: u64,
}

// =============================================================================
// TESTS
// =============================================================================
