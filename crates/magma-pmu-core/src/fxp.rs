//! # MAGMA PMU Fixed-Point Math
//!
//! Unsigned fixed-point numerics for the power model and the solvers.
//!
//! All model math runs on these types; there is no float path anywhere in
//! the PMU stack. The rules are:
//! - Construction and addition saturate to the format maximum
//! - Multiplication truncates excess fraction bits (floor)
//! - Division rounds half-up to the nearest representable value
//! - Division by zero saturates; callers pre-guard degenerate telemetry
//! - Narrowing to u32 on the ramp path is checked, never silent
//!
//! The backing store is always u64; a format uses the low
//! `INT_BITS + FRAC_BITS` bits of it. Cross-format multiply and divide go
//! through u128 intermediates so no value is lost before the final
//! saturation.

use core::fmt;

// =============================================================================
// FORMAT ALIASES
// =============================================================================

/// Unsigned 4.12: ramp-rate scale factors, max ~16.0
pub type UFxp4_12 = UFxp<4, 12>;
/// Unsigned 20.12: workloads, voltages, MHz values (32-bit formats)
pub type UFxp20_12 = UFxp<20, 12>;
/// Unsigned 40.24: wide workload numerator stage
pub type UFxp40_24 = UFxp<40, 24>;
/// Unsigned 52.12: wide products on the estimate and ramp paths
pub type UFxp52_12 = UFxp<52, 12>;

// =============================================================================
// GENERIC FIXED-POINT VALUE
// =============================================================================

/// Unsigned fixed-point value with `INT_BITS` integer and `FRAC_BITS`
/// fraction bits
///
/// `INT_BITS + FRAC_BITS` must be at most 64. Values compare and order by
/// magnitude within one format.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct UFxp<const INT_BITS: u32, const FRAC_BITS: u32>(u64);

impl<const INT_BITS: u32, const FRAC_BITS: u32> UFxp<INT_BITS, FRAC_BITS> {
    /// Largest raw value representable in this format
    pub const MAX_RAW: u64 = if INT_BITS + FRAC_BITS >= 64 {
        u64::MAX
    } else {
        (1u64 << (INT_BITS + FRAC_BITS)) - 1
    };

    /// Zero
    pub const ZERO: Self = Self(0);
    /// One
    pub const ONE: Self = Self(1 << FRAC_BITS);
    /// Format maximum
    pub const MAX: Self = Self(Self::MAX_RAW);

    /// Create from a raw fixed-point bit pattern, saturating to the format
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        if raw > Self::MAX_RAW {
            Self(Self::MAX_RAW)
        } else {
            Self(raw)
        }
    }

    /// Create from an integer, saturating to the format
    #[inline]
    pub const fn from_int(value: u64) -> Self {
        if value > (Self::MAX_RAW >> FRAC_BITS) {
            Self(Self::MAX_RAW)
        } else {
            Self(value << FRAC_BITS)
        }
    }

    /// Get the raw fixed-point bit pattern
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Check for zero
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Integer part, fraction truncated
    #[inline]
    pub const fn to_int_floor(self) -> u64 {
        self.0 >> FRAC_BITS
    }

    /// Nearest integer, half rounds up
    #[inline]
    pub const fn to_int_round(self) -> u64 {
        if FRAC_BITS == 0 {
            return self.0;
        }
        let int = self.0 >> FRAC_BITS;
        let frac = self.0 & ((1u64 << FRAC_BITS) - 1);
        if frac >= 1u64 << (FRAC_BITS - 1) {
            int + 1
        } else {
            int
        }
    }

    /// Nearest integer narrowed to u32, `None` on overflow
    ///
    /// The ramp-rate path uses this; overflow there is a hard failure and
    /// must never truncate silently.
    #[inline]
    pub const fn to_u32_round_checked(self) -> Option<u32> {
        let v = self.to_int_round();
        if v > u32::MAX as u64 {
            None
        } else {
            Some(v as u32)
        }
    }

    /// Saturating add within the format
    #[inline]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self::from_raw(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtract within the format
    #[inline]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Cross-format multiply, saturating into the requested output format
    ///
    /// The product is formed in u128 and shifted to the output fraction
    /// width, truncating excess fraction bits.
    #[inline]
    pub const fn saturating_mul<
        const RHS_INT: u32,
        const RHS_FRAC: u32,
        const OUT_INT: u32,
        const OUT_FRAC: u32,
    >(
        self,
        rhs: UFxp<RHS_INT, RHS_FRAC>,
    ) -> UFxp<OUT_INT, OUT_FRAC> {
        let wide = self.0 as u128 * rhs.0 as u128;
        let shifted = rescale_frac(wide, FRAC_BITS + RHS_FRAC, OUT_FRAC);
        saturate128::<OUT_INT, OUT_FRAC>(shifted)
    }

    /// Cross-format divide, rounding half-up to the nearest value in the
    /// requested output format
    ///
    /// Division by zero saturates to the output format maximum.
    #[inline]
    pub const fn div_round<
        const RHS_INT: u32,
        const RHS_FRAC: u32,
        const OUT_INT: u32,
        const OUT_FRAC: u32,
    >(
        self,
        rhs: UFxp<RHS_INT, RHS_FRAC>,
    ) -> UFxp<OUT_INT, OUT_FRAC> {
        if rhs.0 == 0 {
            return UFxp::<OUT_INT, OUT_FRAC>::MAX;
        }
        // Pre-shift so the quotient lands on OUT_FRAC fraction bits, then
        // round once at the division itself.
        let (num_up, den_up) = if OUT_FRAC + RHS_FRAC >= FRAC_BITS {
            (OUT_FRAC + RHS_FRAC - FRAC_BITS, 0)
        } else {
            (0, FRAC_BITS - OUT_FRAC - RHS_FRAC)
        };
        let num = shl_sat128(self.0 as u128, num_up);
        let den = shl_sat128(rhs.0 as u128, den_up);
        let q = (num + den / 2) / den;
        saturate128::<OUT_INT, OUT_FRAC>(q)
    }
}

// =============================================================================
// RAW HELPERS
// =============================================================================

/// Move a u128 raw value from one fraction width to another
///
/// Shifting down truncates; shifting up saturates at u128::MAX.
const fn rescale_frac(value: u128, from_frac: u32, to_frac: u32) -> u128 {
    if from_frac >= to_frac {
        value >> (from_frac - to_frac)
    } else {
        shl_sat128(value, to_frac - from_frac)
    }
}

/// Left shift saturating at u128::MAX
const fn shl_sat128(value: u128, shift: u32) -> u128 {
    if shift == 0 {
        value
    } else if shift >= 128 || value > (u128::MAX >> shift) {
        u128::MAX
    } else {
        value << shift
    }
}

/// Clamp a u128 raw value into the given format
const fn saturate128<const INT_BITS: u32, const FRAC_BITS: u32>(
    raw: u128,
) -> UFxp<INT_BITS, FRAC_BITS> {
    let max = UFxp::<INT_BITS, FRAC_BITS>::MAX_RAW;
    if raw > max as u128 {
        UFxp::<INT_BITS, FRAC_BITS>::MAX
    } else {
        UFxp::<INT_BITS, FRAC_BITS>::from_raw(raw as u64)
    }
}

// =============================================================================
// FORMATTING
// =============================================================================

impl<const INT_BITS: u32, const FRAC_BITS: u32> fmt::Debug for UFxp<INT_BITS, FRAC_BITS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = self.to_int_floor();
        let frac_mask = if FRAC_BITS >= 64 {
            u64::MAX
        } else {
            (1u64 << FRAC_BITS) - 1
        };
        let milli = ((self.0 & frac_mask) as u128 * 1000) >> FRAC_BITS;
        write!(
            f,
            "UFxp<{},{}>({}.{:03})",
            INT_BITS, FRAC_BITS, int, milli
        )
    }
}

// =============================================================================
// STATIC ASSERTIONS
// =============================================================================

static_assertions::assert_impl_all!(UFxp20_12: Send, Sync, Copy);
static_assertions::assert_eq_size!(UFxp52_12, u64);

// =============================================================================
// TESTS
// =============================================================================
