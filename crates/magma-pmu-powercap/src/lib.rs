//! # MAGMA PMU Powercap
//!
//! Closed-loop power-capping solver for the PMU.
//!
//! Given per-policy power or current budgets and one evaluation's worth of
//! telemetry, the solver computes the highest frequency tuple for a set of
//! coupled clock domains that keeps every monitored rail under budget,
//! then ramp-rate limits the result before it reaches the frequency
//! arbiter.
//!
//! ## Pipeline
//!
//! ```text
//! telemetry ──► RailModel::observe (workload, voltage floor, Fmax@Vmin)
//!                      │
//!                      ▼
//!           RegimeSpace::build (piecewise search space, per cycle)
//!                      │
//!                      ▼
//!           search::highest_satisfying (biased binary search + step-back)
//!                      │
//!                      ▼
//!           RampScaler::scale + requantize + re-propagate
//!                      │
//!                      ▼
//!           DomainCeilings (kHz, per clock domain) ──► arbiter
//! ```
//!
//! ## Rules
//!
//! 1. **One evaluation in flight**: single-threaded, run-to-completion
//! 2. **No allocation**: every buffer is sized at construction
//! 3. **Saturate in the model, fail hard in the ramp**: estimate overflow
//!    clamps; ramp-scaling overflow is a configuration bug and errors out

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]

#[cfg(feature = "std")]
extern crate std;

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod arbiter;
pub mod config;
pub mod metrics;
pub mod policy;
pub mod rail;
pub mod ramp;
pub mod regime;
pub mod search;

#[cfg(test)]
mod testutil;

// Re-exports for convenience
pub use arbiter::{Budgets, DomainCeilings, LimitArbiter};
pub use config::{PolicyFeatures, PowercapConfig, RailConfig, RampConfig};
pub use metrics::{EstimatedMetrics, ObservedMetrics, PolicyStatus, SolverStats};
pub use policy::{CombinedPolicy, PwrModel};
pub use rail::{RailModel, RailPwrModel};
pub use ramp::RampScaler;
pub use regime::{RegimeId, RegimeSpace};
