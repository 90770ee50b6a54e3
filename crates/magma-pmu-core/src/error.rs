//! # MAGMA PMU Error Handling
//!
//! Error types shared by the PMU power-management crates.
//!
//! Error handling here follows the same rules as the rest of the driver:
//! - Errors are typed and categorized
//! - No panics in production code paths
//! - Errors are `no_std` compatible
//!
//! Degenerate telemetry (zero voltage, zero frequency, readings below
//! leakage) is deliberately NOT an error: the power model defines those
//! cases as zero workload and keeps running.

use core::fmt;

// =============================================================================
// RESULT TYPE
// =============================================================================

/// MAGMA PMU Result type alias
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// Unified error type for the PMU power stack
///
/// Covers call-contract violations, internal-state corruption, missing
/// capabilities, hard numeric failures, and collaborator lookup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Call Contract Errors
    // =========================================================================
    /// Required input missing or malformed
    InvalidArgument,
    /// Board-object index outside the registry bounds
    IndexOutOfRange(RegistryKind),

    // =========================================================================
    // Internal State Errors
    // =========================================================================
    /// Internal invariant violated; logged at the detection site
    InvalidState(StateError),

    // =========================================================================
    // Capability Errors
    // =========================================================================
    /// Named optional capability is absent on this board
    NotSupported,

    // =========================================================================
    // Numeric Errors
    // =========================================================================
    /// Fixed-point narrowing overflowed on a must-not-truncate path
    ArithmeticOverflow,

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    /// Frequency/voltage conversion failed in the VF curve service
    VfLookupFailed,
    /// Clock-domain propagation failed in the topology service
    PropagationFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::IndexOutOfRange(kind) => write!(f, "index out of range: {:?}", kind),
            Self::InvalidState(e) => write!(f, "invalid state: {:?}", e),
            Self::NotSupported => write!(f, "operation not supported"),
            Self::ArithmeticOverflow => write!(f, "arithmetic overflow"),
            Self::VfLookupFailed => write!(f, "VF curve lookup failed"),
            Self::PropagationFailed => write!(f, "clock propagation failed"),
        }
    }
}

// =============================================================================
// SUB-ERROR TYPES
// =============================================================================

/// Registries addressable by board-object index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    /// Clock-domain registry
    ClkDomain,
    /// Voltage-rail registry
    VoltRail,
    /// Power-channel registry
    PwrChannel,
    /// Rail slot inside a policy
    RailSlot,
    /// Discrete frequency point on a VF curve
    VfPoint,
    /// Tuple index in a solver search space
    Tuple,
}

/// Internal invariant violations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// Regime frequencies not monotonic across a boundary
    RegimeMonotonicity,
    /// Regime graph walk could not reach the terminal regime
    RegimeWalkStuck,
    /// Per-rail metric buffers no longer congruent in length
    MetricsMismatch,
    /// Search space built with zero tuples
    EmptySearchSpace,
}

// =============================================================================
// ERROR CONVERSION
// =============================================================================

impl From<StateError> for Error {
    fn from(e: StateError) -> Self {
        Error::InvalidState(e)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", Error::InvalidArgument), "invalid argument");
        assert_eq!(format!("{}", Error::ArithmeticOverflow), "arithmetic overflow");
        assert_eq!(
            format!("{}", Error::IndexOutOfRange(RegistryKind::VoltRail)),
            "index out of range: VoltRail"
        );
    }

    #[test]
    fn test_from_state_error() {
        let e: Error = StateError::RegimeMonotonicity.into();
        assert_eq!(e, Error::InvalidState(StateError::RegimeMonotonicity));
    }

    #[test]
    fn test_error_is_copy() {
        let e = Error::NotSupported;
        let f = e;
        assert_eq!(e, f);
    }
}
