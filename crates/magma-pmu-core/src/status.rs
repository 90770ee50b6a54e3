//! # MAGMA PMU Telemetry Snapshots
//!
//! Read-only input structures handed to a policy for one evaluation.
//!
//! Each snapshot is a dense array indexed by board-object index plus a
//! validity mask; entries the producer did not populate read back as
//! `None`. The channel and low-power snapshots are optional end to end: a
//! policy evaluated without them treats the affected readings as absent.

use crate::error::{Error, RegistryKind, Result};
use crate::fxp::UFxp20_12;
use crate::types::{
    ClkDomIdx, KiloHertz, Microvolts, PwrChannelIdx, PwrValue, VoltRailIdx, MAX_CLK_DOMAINS,
    MAX_PWR_CHANNELS, MAX_VOLT_RAILS,
};

// =============================================================================
// CLOCK DOMAIN STATUS
// =============================================================================

/// Per-domain frequency telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClkDomainEntry {
    /// Sensed (measured) frequency
    pub sensed: KiloHertz,
    /// Last frequency scheduled by the arbiter
    pub target: KiloHertz,
}

/// Frequency telemetry for the clock-domain registry
#[derive(Debug, Clone)]
pub struct ClkDomainsStatus {
    mask: u32,
    entries: [ClkDomainEntry; MAX_CLK_DOMAINS],
}

impl ClkDomainsStatus {
    /// Create an empty snapshot
    pub const fn new() -> Self {
        Self {
            mask: 0,
            entries: [ClkDomainEntry {
                sensed: KiloHertz::ZERO,
                target: KiloHertz::ZERO,
            }; MAX_CLK_DOMAINS],
        }
    }

    /// Populate one domain entry
    pub fn set(&mut self, dom: ClkDomIdx, entry: ClkDomainEntry) -> Result<()> {
        if !dom.is_in_range() {
            return Err(Error::IndexOutOfRange(RegistryKind::ClkDomain));
        }
        self.entries[dom.as_usize()] = entry;
        self.mask |= 1 << dom.raw();
        Ok(())
    }

    /// Entry for one domain, `None` when not populated
    pub fn get(&self, dom: ClkDomIdx) -> Option<&ClkDomainEntry> {
        if dom.is_in_range() && (self.mask >> dom.raw()) & 1 == 1 {
            Some(&self.entries[dom.as_usize()])
        } else {
            None
        }
    }
}

// =============================================================================
// VOLTAGE RAIL STATUS
// =============================================================================

/// Per-rail voltage telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoltRailEntry {
    /// Sensed rail voltage
    pub sensed: Microvolts,
    /// Rail-level minimum voltage bound
    pub min: Microvolts,
}

/// Voltage telemetry for the voltage-rail registry
#[derive(Debug, Clone)]
pub struct VoltRailsStatus {
    mask: u32,
    entries: [VoltRailEntry; MAX_VOLT_RAILS],
}

impl VoltRailsStatus {
    /// Create an empty snapshot
    pub const fn new() -> Self {
        Self {
            mask: 0,
            entries: [VoltRailEntry {
                sensed: Microvolts::ZERO,
                min: Microvolts::ZERO,
            }; MAX_VOLT_RAILS],
        }
    }

    /// Populate one rail entry
    pub fn set(&mut self, rail: VoltRailIdx, entry: VoltRailEntry) -> Result<()> {
        if !rail.is_in_range() {
            return Err(Error::IndexOutOfRange(RegistryKind::VoltRail));
        }
        self.entries[rail.as_usize()] = entry;
        self.mask |= 1 << rail.raw();
        Ok(())
    }

    /// Entry for one rail, `None` when not populated
    pub fn get(&self, rail: VoltRailIdx) -> Option<&VoltRailEntry> {
        if rail.is_in_range() && (self.mask >> rail.raw()) & 1 == 1 {
            Some(&self.entries[rail.as_usize()])
        } else {
            None
        }
    }
}

// =============================================================================
// POWER CHANNEL STATUS
// =============================================================================

/// Filtered readings from the power-monitor channels
///
/// Values are mW or mA according to the consuming policy's limit unit.
#[derive(Debug, Clone)]
pub struct PwrChannelsStatus {
    mask: u32,
    readings: [PwrValue; MAX_PWR_CHANNELS],
}

impl PwrChannelsStatus {
    /// Create an empty snapshot
    pub const fn new() -> Self {
        Self {
            mask: 0,
            readings: [PwrValue::ZERO; MAX_PWR_CHANNELS],
        }
    }

    /// Populate one channel reading
    pub fn set(&mut self, ch: PwrChannelIdx, reading: PwrValue) -> Result<()> {
        if !ch.is_in_range() {
            return Err(Error::IndexOutOfRange(RegistryKind::PwrChannel));
        }
        self.readings[ch.as_usize()] = reading;
        self.mask |= 1 << ch.raw();
        Ok(())
    }

    /// Reading for one channel, `None` when not populated
    pub fn reading(&self, ch: PwrChannelIdx) -> Option<PwrValue> {
        if ch.is_in_range() && (self.mask >> ch.raw()) & 1 == 1 {
            Some(self.readings[ch.as_usize()])
        } else {
            None
        }
    }
}

// =============================================================================
// LOW-POWER RESIDENCY STATUS
// =============================================================================

/// Low-power (clock-gated) residency per clock domain
///
/// Residency is the fraction of the sample window the domain spent gated,
/// stored as UFxp20.12 and clamped to 1.0 on the way in.
#[derive(Debug, Clone)]
pub struct LpwrStatus {
    mask: u32,
    residency: [UFxp20_12; MAX_CLK_DOMAINS],
}

impl LpwrStatus {
    /// Create an empty snapshot
    pub const fn new() -> Self {
        Self {
            mask: 0,
            residency: [UFxp20_12::ZERO; MAX_CLK_DOMAINS],
        }
    }

    /// Populate one domain's residency fraction
    pub fn set(&mut self, dom: ClkDomIdx, residency: UFxp20_12) -> Result<()> {
        if !dom.is_in_range() {
            return Err(Error::IndexOutOfRange(RegistryKind::ClkDomain));
        }
        let clamped = if residency.raw() > UFxp20_12::ONE.raw() {
            UFxp20_12::ONE
        } else {
            residency
        };
        self.residency[dom.as_usize()] = clamped;
        self.mask |= 1 << dom.raw();
        Ok(())
    }

    /// Residency for one domain, `None` when not populated
    pub fn residency(&self, dom: ClkDomIdx) -> Option<UFxp20_12> {
        if dom.is_in_range() && (self.mask >> dom.raw()) & 1 == 1 {
            Some(self.residency[dom.as_usize()])
        } else {
            None
        }
    }
}

// =============================================================================
// POLICY INPUT BUNDLE
// =============================================================================

/// Everything a policy reads during one evaluation
#[derive(Clone, Copy)]
pub struct PolicyInputs<'a> {
    /// Clock-domain telemetry (required)
    pub clk: &'a ClkDomainsStatus,
    /// Voltage-rail telemetry (required)
    pub volt: &'a VoltRailsStatus,
    /// Power-channel readings, absent when the monitor has no fresh data
    pub channels: Option<&'a PwrChannelsStatus>,
    /// Low-power residency, absent when the tracker is idle
    pub lpwr: Option<&'a LpwrStatus>,
    /// Secondary-rail soft floor requested by the perf controller
    pub soft_floor: Option<KiloHertz>,
}

// =============================================================================
// TESTS
// =============================================================================
