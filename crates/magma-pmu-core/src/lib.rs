//! # MAGMA PMU Core
//!
//! Foundational types and abstractions for the PMU power-management stack.
//!
//! This crate carries everything the power-capping policies share: unit
//! newtypes, board-object indices, fixed-point numerics, the unified error
//! type, telemetry snapshot structures, and the collaborator traits through
//! which policies reach the clock/voltage/leakage services.
//!
//! ## Design Principles
//!
//! 1. **Bit-Exact Numerics**: All math is unsigned fixed point, no floats
//! 2. **Saturate, Never Wrap**: Overflow in model math clamps to format max
//! 3. **Snapshot Inputs**: Telemetry is read-only data valid for one cycle
//! 4. **No Allocation**: Every buffer is sized by a compile-time maximum
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      magma-pmu-core                         │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌─────────────┐  │
//! │  │  Types   │  │   Fxp    │  │  Traits  │  │   Status    │  │
//! │  │ (units,  │  │ (UFxp    │  │ (VfCurve,│  │ (telemetry  │  │
//! │  │  indices)│  │  formats)│  │  leakage)│  │  snapshots) │  │
//! │  └──────────┘  └──────────┘  └──────────┘  └─────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

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

pub mod error;
pub mod fxp;
pub mod status;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use error::{Error, Result};
pub use fxp::{UFxp, UFxp4_12, UFxp20_12, UFxp40_24, UFxp52_12};
pub use status::*;
pub use traits::*;
pub use types::*;
