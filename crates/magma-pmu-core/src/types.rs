//! # MAGMA PMU Core Types
//!
//! Fundamental type definitions for the PMU power stack.
//!
//! These types provide:
//! - Strong typing for electrical units (kHz, microvolts, milliwatts)
//! - Board-object indices with invalid sentinels
//! - Compile-time sizing constants for the dense registries

use core::fmt;

// =============================================================================
// REGISTRY MAXIMA
// =============================================================================

/// Maximum rails a single policy can aggregate
pub const MAX_RAILS: usize = 4;
/// Maximum clock domains in the board-object registry
pub const MAX_CLK_DOMAINS: usize = 8;
/// Maximum voltage rails in the board-object registry
pub const MAX_VOLT_RAILS: usize = 4;
/// Maximum power channels in the board-object registry
pub const MAX_PWR_CHANNELS: usize = 16;

// =============================================================================
// FREQUENCY
// =============================================================================

/// Clock frequency in kilohertz
///
/// kHz is the native unit of the frequency arbiter. `INVALID` doubles as
/// the "uncapped/disabled" limit sentinel.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct KiloHertz(u32);

impl KiloHertz {
    /// Zero frequency
    pub const ZERO: Self = Self(0);
    /// Invalid/uncapped sentinel
    pub const INVALID: Self = Self(u32::MAX);

    /// Create from a kHz value
    #[inline]
    pub const fn new(khz: u32) -> Self {
        Self(khz)
    }

    /// Create from a MHz value
    #[inline]
    pub const fn from_mhz(mhz: u32) -> Self {
        Self(mhz.saturating_mul(1000))
    }

    /// Get the raw kHz value
    #[inline]
    pub const fn as_khz(self) -> u32 {
        self.0
    }

    /// Get the value in whole MHz, fraction truncated
    #[inline]
    pub const fn as_mhz(self) -> u32 {
        self.0 / 1000
    }

    /// Check for the invalid/uncapped sentinel
    #[inline]
    pub const fn is_invalid(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Debug for KiloHertz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invalid() {
            write!(f, "KiloHertz(invalid)")
        } else {
            write!(f, "KiloHertz({} kHz)", self.0)
        }
    }
}

impl fmt::Display for KiloHertz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kHz", self.0)
    }
}

// =============================================================================
// VOLTAGE
// =============================================================================

/// Rail voltage in microvolts
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Microvolts(u32);

impl Microvolts {
    /// Zero volts
    pub const ZERO: Self = Self(0);

    /// Create from a microvolt value
    #[inline]
    pub const fn new(uv: u32) -> Self {
        Self(uv)
    }

    /// Create from a millivolt value
    #[inline]
    pub const fn from_mv(mv: u32) -> Self {
        Self(mv.saturating_mul(1000))
    }

    /// Get the raw microvolt value
    #[inline]
    pub const fn as_uv(self) -> u32 {
        self.0
    }

    /// Apply a signed microvolt delta, clamped to the u32 range
    #[inline]
    pub const fn offset(self, delta_uv: i32) -> Self {
        let v = self.0 as i64 + delta_uv as i64;
        if v < 0 {
            Self(0)
        } else if v > u32::MAX as i64 {
            Self(u32::MAX)
        } else {
            Self(v as u32)
        }
    }

    /// Return the larger of two voltages
    #[inline]
    pub const fn max(self, other: Self) -> Self {
        if self.0 >= other.0 { self } else { other }
    }
}

impl fmt::Debug for Microvolts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Microvolts({} uV)", self.0)
    }
}

impl fmt::Display for Microvolts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} uV", self.0)
    }
}

// =============================================================================
// POWER / CURRENT
// =============================================================================

/// A power or current magnitude
///
/// The unit is fixed per policy by [`LimitUnit`]: milliwatts for
/// power-based policies, milliamps for current-based ones. The model math
/// is identical either way.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct PwrValue(u32);

impl PwrValue {
    /// Zero power/current
    pub const ZERO: Self = Self(0);
    /// Saturated maximum, also the "no request" sentinel for arbitration
    pub const MAX: Self = Self(u32::MAX);

    /// Create from a raw mW/mA value
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw mW/mA value
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Saturating add
    #[inline]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtract
    #[inline]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Return the smaller of two magnitudes
    #[inline]
    pub const fn min(self, other: Self) -> Self {
        if self.0 <= other.0 { self } else { other }
    }
}

impl fmt::Debug for PwrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PwrValue({})", self.0)
    }
}

/// Unit carried by every [`PwrValue`] of a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LimitUnit {
    /// Budgets and readings are power in milliwatts
    #[default]
    MilliWatts,
    /// Budgets and readings are current in milliamps
    MilliAmps,
}

impl fmt::Display for LimitUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MilliWatts => write!(f, "mW"),
            Self::MilliAmps => write!(f, "mA"),
        }
    }
}

// =============================================================================
// BOARD-OBJECT INDICES
// =============================================================================

/// Index into the clock-domain registry
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ClkDomIdx(u8);

/// Index into the voltage-rail registry
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct VoltRailIdx(u8);

/// Index into the power-channel registry
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PwrChannelIdx(u8);

macro_rules! boardobj_idx_impl {
    ($name:ident, $max:expr) => {
        impl $name {
            /// Invalid-index sentinel
            pub const INVALID: Self = Self(0xFF);

            /// Create from a raw index
            #[inline]
            pub const fn new(idx: u8) -> Self {
                Self(idx)
            }

            /// Get the raw index
            #[inline]
            pub const fn raw(self) -> u8 {
                self.0
            }

            /// Get the index widened for array access
            #[inline]
            pub const fn as_usize(self) -> usize {
                self.0 as usize
            }

            /// Check for the invalid sentinel
            #[inline]
            pub const fn is_invalid(self) -> bool {
                self.0 == 0xFF
            }

            /// Check that the index addresses a registry slot
            #[inline]
            pub const fn is_in_range(self) -> bool {
                (self.0 as usize) < $max
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_invalid() {
                    write!(f, concat!(stringify!($name), "(invalid)"))
                } else {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                }
            }
        }
    };
}

boardobj_idx_impl!(ClkDomIdx, MAX_CLK_DOMAINS);
boardobj_idx_impl!(VoltRailIdx, MAX_VOLT_RAILS);
boardobj_idx_impl!(PwrChannelIdx, MAX_PWR_CHANNELS);

// =============================================================================
// SOLVER INDICES
// =============================================================================

/// Discrete frequency point on a VF curve, ascending with frequency
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct VfPointIdx(u16);

impl VfPointIdx {
    /// Create from a raw point index
    #[inline]
    pub const fn new(idx: u16) -> Self {
        Self(idx)
    }

    /// Get the raw point index
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Get the index widened for array access
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for VfPointIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VfPointIdx({})", self.0)
    }
}

/// Global index into a solver search space, ascending with frequency
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct TupleIdx(u16);

impl TupleIdx {
    /// Create from a raw tuple index
    #[inline]
    pub const fn new(idx: u16) -> Self {
        Self(idx)
    }

    /// Get the raw tuple index
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for TupleIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TupleIdx({})", self.0)
    }
}

// =============================================================================
// CLOCK-DOMAIN MASK
// =============================================================================

/// Dense bitmask over clock-domain indices
///
/// Used for sibling-domain sets on a shared voltage rail. Bits at or above
/// [`MAX_CLK_DOMAINS`] are never set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct ClkDomMask(u32);

impl ClkDomMask {
    /// Empty mask
    pub const EMPTY: Self = Self(0);

    /// Create from raw mask bits
    #[inline]
    pub const fn from_raw(bits: u32) -> Self {
        Self(bits)
    }

    /// Get the raw mask bits
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Set a domain bit
    ///
    /// Out-of-range indices (the invalid sentinel included) are ignored;
    /// shifting by them would overflow the mask word.
    #[inline]
    pub const fn with(self, dom: ClkDomIdx) -> Self {
        if !dom.is_in_range() {
            return self;
        }
        Self(self.0 | (1 << dom.raw()))
    }

    /// Clear a domain bit
    ///
    /// Out-of-range indices are ignored.
    #[inline]
    pub const fn without(self, dom: ClkDomIdx) -> Self {
        if !dom.is_in_range() {
            return self;
        }
        Self(self.0 & !(1 << dom.raw()))
    }

    /// Test a domain bit
    #[inline]
    pub const fn contains(self, dom: ClkDomIdx) -> bool {
        dom.is_in_range() && (self.0 >> dom.raw()) & 1 == 1
    }

    /// Check for the empty mask
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of domains in the mask
    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Check that every bit addresses a registry slot
    #[inline]
    pub const fn is_in_range(self) -> bool {
        self.0 >> MAX_CLK_DOMAINS == 0
    }

    /// Iterate the domains in the mask, lowest index first
    pub fn iter(self) -> impl Iterator<Item = ClkDomIdx> {
        (0..MAX_CLK_DOMAINS as u8)
            .filter(move |bit| (self.0 >> bit) & 1 == 1)
            .map(ClkDomIdx::new)
    }
}

impl fmt::Debug for ClkDomMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClkDomMask(0b{:08b})", self.0)
    }
}

// =============================================================================
// STATIC ASSERTIONS
// =============================================================================

// Ensure key types stay small, copyable, and thread-safe
static_assertions::assert_impl_all!(KiloHertz: Send, Sync, Copy);
static_assertions::assert_impl_all!(Microvolts: Send, Sync, Copy);
static_assertions::assert_impl_all!(PwrValue: Send, Sync, Copy);
static_assertions::assert_impl_all!(ClkDomIdx: Send, Sync, Copy);
static_assertions::assert_impl_all!(ClkDomMask: Send, Sync, Copy);
static_assertions::assert_eq_size!(KiloHertz, u32);
static_assertions::assert_eq_size!(ClkDomIdx, u8);

// =============================================================================
// TESTS
// =============================================================================
