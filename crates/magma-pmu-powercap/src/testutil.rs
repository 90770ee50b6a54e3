//! Deterministic collaborator fakes shared by the solver tests.
//!
//! The VF curve is linear (fixed step, linear voltage), propagation is a
//! per-mille ratio per topology, leakage is constant or linear in voltage.

use magma_pmu_core::error::{Error, RegistryKind, Result};
use magma_pmu_core::traits::{ClkPropagator, LeakageModel, PropTopology, Services, VfCurve};
use magma_pmu_core::types::{
    ClkDomIdx, KiloHertz, Microvolts, PwrValue, VfPointIdx, VoltRailIdx, MAX_CLK_DOMAINS,
};

// =============================================================================
// VF CURVE FAKE
// =============================================================================

/// Linear VF curve for one domain
#[derive(Debug, Clone, Copy)]
pub struct FakeDomVf {
    pub min_khz: u32,
    pub step_khz: u32,
    pub count: u16,
    pub uv_base: u32,
    pub uv_per_mhz: u32,
}

impl FakeDomVf {
    fn max_khz(&self) -> u32 {
        self.min_khz + u32::from(self.count - 1) * self.step_khz
    }
}

/// Table of linear VF curves, indexed by clock domain
#[derive(Debug, Clone)]
pub struct FakeVf {
    doms: [Option<FakeDomVf>; MAX_CLK_DOMAINS],
}

impl FakeVf {
    pub fn new() -> Self {
        Self {
            doms: [None; MAX_CLK_DOMAINS],
        }
    }

    pub fn with_dom(mut self, dom: ClkDomIdx, curve: FakeDomVf) -> Self {
        self.doms[dom.as_usize()] = Some(curve);
        self
    }

    fn dom(&self, dom: ClkDomIdx) -> Result<&FakeDomVf> {
        if !dom.is_in_range() {
            return Err(Error::IndexOutOfRange(RegistryKind::ClkDomain));
        }
        self.doms[dom.as_usize()].as_ref().ok_or(Error::VfLookupFailed)
    }
}

impl VfCurve for FakeVf {
    fn voltage_for_freq(&self, dom: ClkDomIdx, freq: KiloHertz) -> Result<Microvolts> {
        let d = self.dom(dom)?;
        let uv = d.uv_base as u64 + d.uv_per_mhz as u64 * freq.as_mhz() as u64;
        Ok(Microvolts::new(uv.min(u32::MAX as u64) as u32))
    }

    fn freq_for_voltage(&self, dom: ClkDomIdx, voltage: Microvolts) -> Result<KiloHertz> {
        let d = self.dom(dom)?;
        if voltage.as_uv() <= d.uv_base || d.uv_per_mhz == 0 {
            let khz = if d.uv_per_mhz == 0 && voltage.as_uv() >= d.uv_base {
                d.max_khz()
            } else {
                d.min_khz
            };
            return Ok(KiloHertz::new(khz));
        }
        let mhz = (voltage.as_uv() - d.uv_base) / d.uv_per_mhz;
        let khz = (mhz * 1000).clamp(d.min_khz, d.max_khz());
        Ok(KiloHertz::new(khz))
    }

    fn point_count(&self, dom: ClkDomIdx) -> Result<u16> {
        Ok(self.dom(dom)?.count)
    }

    fn freq_at_point(&self, dom: ClkDomIdx, point: VfPointIdx) -> Result<KiloHertz> {
        let d = self.dom(dom)?;
        if point.raw() >= d.count {
            return Err(Error::IndexOutOfRange(RegistryKind::VfPoint));
        }
        Ok(KiloHertz::new(d.min_khz + u32::from(point.raw()) * d.step_khz))
    }

    fn point_floor(&self, dom: ClkDomIdx, freq: KiloHertz) -> Result<VfPointIdx> {
        let d = self.dom(dom)?;
        if freq.as_khz() < d.min_khz {
            return Err(Error::VfLookupFailed);
        }
        let idx = ((freq.as_khz() - d.min_khz) / d.step_khz).min(u32::from(d.count - 1));
        Ok(VfPointIdx::new(idx as u16))
    }

    fn point_ceil(&self, dom: ClkDomIdx, freq: KiloHertz) -> Result<VfPointIdx> {
        let d = self.dom(dom)?;
        if freq.as_khz() > d.max_khz() {
            return Err(Error::VfLookupFailed);
        }
        let over = freq.as_khz().saturating_sub(d.min_khz);
        let idx = over.div_ceil(d.step_khz);
        Ok(VfPointIdx::new(idx as u16))
    }

    fn freq_range(&self, dom: ClkDomIdx) -> Result<(KiloHertz, KiloHertz)> {
        let d = self.dom(dom)?;
        Ok((KiloHertz::new(d.min_khz), KiloHertz::new(d.max_khz())))
    }
}

// =============================================================================
// PROPAGATION FAKE
// =============================================================================

/// Fixed-ratio propagation between one primary/secondary pair
///
/// Ratios are secondary-per-primary in per-mille, one per topology.
#[derive(Debug, Clone, Copy)]
pub struct FakeProp {
    pub pri: ClkDomIdx,
    pub sec: ClkDomIdx,
    pub def_pm: u64,
    pub min_ratio_pm: u64,
    pub max_ratio_pm: u64,
}

impl FakeProp {
    /// Domains 0/1 with a 0.5x default ratio and no real ratio bounds
    pub fn default_pair() -> Self {
        Self {
            pri: ClkDomIdx::new(0),
            sec: ClkDomIdx::new(1),
            def_pm: 500,
            min_ratio_pm: 500,
            max_ratio_pm: 500,
        }
    }

    fn per_mille(&self, topology: PropTopology) -> u64 {
        match topology {
            PropTopology::Default => self.def_pm,
            // min primary:secondary ratio = max secondary-per-primary
            PropTopology::RatioMin => self.min_ratio_pm,
            PropTopology::RatioMax => self.max_ratio_pm,
        }
    }
}

impl ClkPropagator for FakeProp {
    fn propagate(
        &self,
        from: ClkDomIdx,
        to: ClkDomIdx,
        freq: KiloHertz,
        topology: PropTopology,
    ) -> Result<KiloHertz> {
        let pm = self.per_mille(topology);
        let khz = if from == self.pri && to == self.sec {
            freq.as_khz() as u64 * pm / 1000
        } else if from == self.sec && to == self.pri {
            freq.as_khz() as u64 * 1000 / pm
        } else {
            return Err(Error::PropagationFailed);
        };
        Ok(KiloHertz::new(khz.min(u32::MAX as u64) as u32))
    }
}

// =============================================================================
// LEAKAGE FAKE
// =============================================================================

/// Constant-plus-linear leakage model
///
/// `leak = base + uv / uv_div`, with `uv_div == 0` meaning constant.
#[derive(Debug, Clone, Copy)]
pub struct FakeLeak {
    pub base: u32,
    pub uv_div: u32,
}

impl LeakageModel for FakeLeak {
    fn leakage(&self, _rail: VoltRailIdx, voltage: Microvolts) -> Result<PwrValue> {
        let linear = if self.uv_div == 0 {
            0
        } else {
            voltage.as_uv() / self.uv_div
        };
        Ok(PwrValue::new(self.base.saturating_add(linear)))
    }
}

// =============================================================================
// BUNDLING
// =============================================================================

/// Bundle the three fakes into a per-call service reference
pub fn services<'a>(vf: &'a FakeVf, prop: &'a FakeProp, leak: &'a FakeLeak) -> Services<'a> {
    Services {
        vf,
        prop,
        leakage: leak,
    }
}
