//! # Combined-Rail Power-Capping Policy
//!
//! The policy object that owns the per-rail models, the regime scratch
//! state, the ramp scaler and the diagnostic counters, and runs the whole
//! pipeline once per control-loop cycle:
//!
//! observe every rail, build (or select) the search space, binary-search
//! for the highest frequency tuple under every budget, ramp-rate limit
//! the primary output, requantize and re-propagate, and emit per-domain
//! ceilings.
//!
//! One policy instance exists per power policy board object; it is
//! constructed once and re-evaluated every cycle on the control loop's
//! own execution context. Nothing here allocates after construction.

use arrayvec::ArrayVec;
use magma_pmu_core::error::{Error, Result, StateError};
use magma_pmu_core::status::PolicyInputs;
use magma_pmu_core::traits::{PropTopology, Services};
use magma_pmu_core::types::{KiloHertz, PwrValue, TupleIdx, VfPointIdx, MAX_RAILS};

use crate::arbiter::{Budgets, DomainCeilings};
use crate::config::{PolicyFeatures, PowercapConfig};
use crate::metrics::{EstimatedMetrics, PolicyStatus, SolverStats};
use crate::rail::{RailModel, RailPwrModel};
use crate::ramp::RampScaler;
use crate::regime::{RegimeInputs, RegimeSpace, SnapDir};
use crate::search::{highest_satisfying, SearchOutcome};

// =============================================================================
// AGGREGATE MODEL TRAIT
// =============================================================================

/// Aggregate power-model capability of a policy
///
/// The seam for future policy variants; [`CombinedPolicy`] is the one
/// concrete implementation today.
pub trait PwrModel {
    /// Refresh every rail model from one evaluation's telemetry
    fn observe(&mut self, services: &Services<'_>, inputs: &PolicyInputs<'_>) -> Result<()>;

    /// Estimate the summed power/current at a per-rail frequency vector
    fn estimate(&self, services: &Services<'_>, freqs: &[KiloHertz]) -> Result<PwrValue>;

    /// Ramp-rate limit a raw primary output against the previous cycle
    fn scale(&self, raw: KiloHertz) -> Result<KiloHertz>;
}

// =============================================================================
// COMBINED POLICY
// =============================================================================

/// Combined-rail power-capping policy
#[derive(Debug)]
pub struct CombinedPolicy {
    cfg: PowercapConfig,
    rails: ArrayVec<RailModel, MAX_RAILS>,
    ramp: RampScaler,
    status: PolicyStatus,
    stats: SolverStats,
}

impl CombinedPolicy {
    /// Construct from a validated descriptor
    pub fn new(cfg: PowercapConfig) -> Result<Self> {
        cfg.validate()?;
        let mut rails = ArrayVec::new();
        for rail_cfg in &cfg.rails {
            rails.push(RailModel::new(*rail_cfg, cfg.features));
        }
        let ramp = RampScaler::new(&cfg.ramp);
        Ok(Self {
            cfg,
            rails,
            ramp,
            status: PolicyStatus::default(),
            stats: SolverStats::default(),
        })
    }

    /// Per-rail models, primary first
    pub fn rails(&self) -> &[RailModel] {
        &self.rails
    }

    /// Diagnostic snapshot of the last evaluation
    pub fn status(&self) -> &PolicyStatus {
        &self.status
    }

    /// Cumulative solver counters
    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    /// Run one evaluation cycle
    ///
    /// A failed cycle leaves the previous cycle's limits in force; that
    /// fallback is the caller's responsibility.
    pub fn evaluate(
        &mut self,
        services: &Services<'_>,
        inputs: &PolicyInputs<'_>,
        budgets: &Budgets,
    ) -> Result<DomainCeilings> {
        match self.evaluate_inner(services, inputs, budgets) {
            Ok(out) => {
                self.stats.evaluations += 1;
                Ok(out)
            }
            Err(e) => {
                self.stats.failed_evaluations += 1;
                Err(e)
            }
        }
    }

    fn evaluate_inner(
        &mut self,
        services: &Services<'_>,
        inputs: &PolicyInputs<'_>,
        budgets: &Budgets,
    ) -> Result<DomainCeilings> {
        if budgets.rail.len() != self.rails.len() {
            log::error!(
                "budget count {} does not match rail count {}",
                budgets.rail.len(),
                self.rails.len()
            );
            return Err(StateError::MetricsMismatch.into());
        }

        for rail in &mut self.rails {
            rail.observe(services, inputs)?;
        }

        let multi = self.cfg.features.contains(PolicyFeatures::MULTI_REGIME);
        let (mut freqs, outcome, space) = if multi {
            let (freqs, outcome, space) = self.solve_multi(services, inputs, budgets)?;
            (freqs, outcome, Some(space))
        } else {
            let (freqs, outcome) = self.solve_legacy(services, budgets)?;
            (freqs, outcome, None)
        };

        // Ramp-rate limit the primary, then requantize and re-propagate
        // the whole tuple around the limited value.
        let raw_pri = freqs[0];
        let scaled = self.ramp.scale(raw_pri)?;
        let ramp_limited = scaled != raw_pri;
        let mut tuple = TupleIdx::new(outcome.idx);
        if ramp_limited {
            let dir = if raw_pri < self.ramp.prev() {
                SnapDir::Down
            } else {
                SnapDir::Up
            };
            freqs = match &space {
                Some(space) => {
                    tuple = space.tuple_by_primary(services, scaled, dir)?;
                    let resolved = space.freq_by_tuple(services, tuple)?;
                    let mut out = ArrayVec::new();
                    out.push(resolved[0]);
                    out.push(resolved[1]);
                    out
                }
                None => {
                    let (point, out) =
                        self.requantize_legacy(services, budgets, scaled, dir)?;
                    tuple = TupleIdx::new(point.raw());
                    out
                }
            };
            self.stats.ramp_limited += 1;
            log::debug!(
                "ramp limited primary {} -> {} kHz",
                raw_pri.as_khz(),
                freqs[0].as_khz()
            );
        }
        self.ramp.note_applied(freqs[0]);

        // Final estimates at the applied point, for the status snapshot.
        let mut estimated = ArrayVec::new();
        limits_ok(&self.rails, services, &freqs, budgets, &mut estimated)?;
        for est in &estimated {
            if est.saturated {
                self.stats.saturated_estimates += 1;
            }
        }

        self.stats.probes += u64::from(outcome.probes);
        self.stats.steps_back += u64::from(outcome.steps_back);

        self.status = PolicyStatus {
            regime: match &space {
                Some(space) => Some(space.regime_by_tuple(tuple)?),
                None => None,
            },
            tuple: Some(tuple),
            steps_back: outcome.steps_back,
            best_effort: !outcome.satisfied,
            ramp_limited,
            observed: self.rails.iter().map(|r| *r.observed()).collect(),
            estimated,
        };

        let mut ceilings = DomainCeilings::new();
        for (rail, freq) in self.rails.iter().zip(freqs.iter()) {
            ceilings.set(rail.config().clk_dom, *freq)?;
        }
        Ok(ceilings)
    }

    /// Multi-regime solve: build the space and search the tuple index
    fn solve_multi(
        &mut self,
        services: &Services<'_>,
        inputs: &PolicyInputs<'_>,
        budgets: &Budgets,
    ) -> Result<(ArrayVec<KiloHertz, MAX_RAILS>, SearchOutcome, RegimeSpace)> {
        let regime_inputs = RegimeInputs {
            pri_dom: self.rails[0].config().clk_dom,
            sec_dom: self.rails[1].config().clk_dom,
            pri_fmax_vmin: self.rails[0].fmax_at_vmin(),
            sec_fmax_vmin: self.rails[1].fmax_at_vmin(),
            soft_floor: inputs.soft_floor,
        };
        let space = RegimeSpace::build(services, self.cfg.features, &regime_inputs)?;
        self.stats.regime_builds += 1;

        let rails = &self.rails;
        let outcome = highest_satisfying(0, space.tuple_count() - 1, |idx| {
            let resolved = space.freq_by_tuple(services, TupleIdx::new(idx))?;
            let mut scratch = ArrayVec::new();
            limits_ok(rails, services, &resolved, budgets, &mut scratch)
        })?;

        let resolved = space.freq_by_tuple(services, TupleIdx::new(outcome.idx))?;
        let mut freqs = ArrayVec::new();
        freqs.push(resolved[0]);
        freqs.push(resolved[1]);
        Ok((freqs, outcome, space))
    }

    /// Legacy single-region solve over the primary domain's VF points
    fn solve_legacy(
        &mut self,
        services: &Services<'_>,
        budgets: &Budgets,
    ) -> Result<(ArrayVec<KiloHertz, MAX_RAILS>, SearchOutcome)> {
        let pri_dom = self.rails[0].config().clk_dom;
        let count = services.vf.point_count(pri_dom)?;
        if count == 0 {
            return Err(StateError::EmptySearchSpace.into());
        }

        let rails = &self.rails;
        let cfg = &self.cfg;
        let resolve = |idx: u16| -> Result<ArrayVec<KiloHertz, MAX_RAILS>> {
            let pri = services.vf.freq_at_point(pri_dom, VfPointIdx::new(idx))?;
            let mut freqs = ArrayVec::new();
            freqs.push(pri);
            for rail_cfg in cfg.rails.iter().skip(1) {
                let sec = services.prop.propagate(
                    pri_dom,
                    rail_cfg.clk_dom,
                    pri,
                    PropTopology::Default,
                )?;
                freqs.push(sec);
            }
            Ok(freqs)
        };

        let outcome = highest_satisfying(0, count - 1, |idx| {
            let freqs = resolve(idx)?;
            let mut scratch = ArrayVec::new();
            limits_ok(rails, services, &freqs, budgets, &mut scratch)
        })?;

        Ok((resolve(outcome.idx)?, outcome))
    }

    /// Legacy requantization of a ramp-limited primary frequency
    ///
    /// Each secondary resolves floor-vs-propagate: the Vmin floor is taken
    /// when the rail can afford it under its individual budget, otherwise
    /// plain propagation.
    fn requantize_legacy(
        &self,
        services: &Services<'_>,
        budgets: &Budgets,
        target: KiloHertz,
        dir: SnapDir,
    ) -> Result<(VfPointIdx, ArrayVec<KiloHertz, MAX_RAILS>)> {
        let pri_dom = self.rails[0].config().clk_dom;
        let point = match dir {
            SnapDir::Down => services.vf.point_floor(pri_dom, target)?,
            SnapDir::Up => services.vf.point_ceil(pri_dom, target)?,
        };
        let pri = services.vf.freq_at_point(pri_dom, point)?;

        let mut freqs = ArrayVec::new();
        freqs.push(pri);
        for (i, rail) in self.rails.iter().enumerate().skip(1) {
            let dom = rail.config().clk_dom;
            let prop = services
                .prop
                .propagate(pri_dom, dom, pri, PropTopology::Default)?;
            let floor = rail.fmax_at_vmin();
            let at_floor = rail.estimate(services, floor)?;
            let freq = if at_floor.value <= budgets.rail[i] {
                floor.max(prop)
            } else {
                prop
            };
            freqs.push(freq);
        }
        Ok((point, freqs))
    }
}

impl PwrModel for CombinedPolicy {
    fn observe(&mut self, services: &Services<'_>, inputs: &PolicyInputs<'_>) -> Result<()> {
        for rail in &mut self.rails {
            rail.observe(services, inputs)?;
        }
        Ok(())
    }

    fn estimate(&self, services: &Services<'_>, freqs: &[KiloHertz]) -> Result<PwrValue> {
        if freqs.len() != self.rails.len() {
            return Err(Error::InvalidArgument);
        }
        let mut total = PwrValue::ZERO;
        for (rail, freq) in self.rails.iter().zip(freqs.iter()) {
            total = total.saturating_add(rail.estimate(services, *freq)?.value);
        }
        Ok(total)
    }

    fn scale(&self, raw: KiloHertz) -> Result<KiloHertz> {
        self.ramp.scale(raw)
    }
}

// =============================================================================
// LIMIT PREDICATE
// =============================================================================

/// Evaluate every rail at a frequency vector and test all budgets
///
/// The predicate is the AND of every individual rail test and the
/// aggregate test; `estimates` receives the per-rail metrics either way.
fn limits_ok(
    rails: &[RailModel],
    services: &Services<'_>,
    freqs: &[KiloHertz],
    budgets: &Budgets,
    estimates: &mut ArrayVec<EstimatedMetrics, MAX_RAILS>,
) -> Result<bool> {
    let mut total = PwrValue::ZERO;
    let mut ok = true;
    estimates.clear();
    for (i, (rail, freq)) in rails.iter().zip(freqs.iter()).enumerate() {
        let est = rail.estimate(services, *freq)?;
        total = total.saturating_add(est.value);
        ok &= est.value <= budgets.rail[i];
        estimates.push(est);
    }
    ok &= total <= budgets.total;
    Ok(ok)
}

// =============================================================================
// STATIC ASSERTIONS
// =============================================================================

static_assertions::assert_obj_safe!(PwrModel);
static_assertions::assert_impl_all!(CombinedPolicy: Send, Sync);

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RailConfig, RampConfig};
    use crate::regime::RegimeId;
    use crate::testutil::{services, FakeDomVf, FakeLeak, FakeProp, FakeVf};
    use magma_pmu_core::fxp::UFxp4_12;
    use magma_pmu_core::status::{
        ClkDomainEntry, ClkDomainsStatus, PwrChannelsStatus, VoltRailEntry, VoltRailsStatus,
    };
    use magma_pmu_core::types::{
        ClkDomIdx, LimitUnit, Microvolts, PwrChannelIdx, VoltRailIdx,
    };

    const PRI: ClkDomIdx = ClkDomIdx::new(0);
    const SEC: ClkDomIdx = ClkDomIdx::new(1);

    fn two_rail_cfg(features: PolicyFeatures, ramp: RampConfig) -> PowercapConfig {
        let mut rails = ArrayVec::new();
        rails.push(RailConfig {
            clk_dom: PRI,
            volt_rail: VoltRailIdx::new(0),
            pwr_channel: PwrChannelIdx::new(0),
            ..RailConfig::default()
        });
        rails.push(RailConfig {
            clk_dom: SEC,
            volt_rail: VoltRailIdx::new(1),
            pwr_channel: PwrChannelIdx::new(1),
            ..RailConfig::default()
        });
        PowercapConfig {
            rails,
            features,
            ramp,
            unit: LimitUnit::MilliWatts,
        }
    }

    /// 40 primary points, 200..2000 MHz, flat 1.0 V curves on both domains
    fn legacy_vf() -> FakeVf {
        FakeVf::new()
            .with_dom(
                PRI,
                FakeDomVf {
                    min_khz: 200_000,
                    step_khz: 46_154,
                    count: 40,
                    uv_base: 1_000_000,
                    uv_per_mhz: 0,
                },
            )
            .with_dom(
                SEC,
                FakeDomVf {
                    min_khz: 100_000,
                    step_khz: 23_077,
                    count: 40,
                    uv_base: 1_000_000,
                    uv_per_mhz: 0,
                },
            )
    }

    /// Primary at 2000 MHz drawing 180 W at 1.0 V, secondary unmonitored
    fn legacy_telemetry() -> (ClkDomainsStatus, VoltRailsStatus, PwrChannelsStatus) {
        let mut clk = ClkDomainsStatus::new();
        clk.set(
            PRI,
            ClkDomainEntry {
                sensed: KiloHertz::new(2_000_006),
                target: KiloHertz::new(2_000_006),
            },
        )
        .unwrap();
        clk.set(
            SEC,
            ClkDomainEntry {
                sensed: KiloHertz::new(1_000_003),
                target: KiloHertz::new(1_000_003),
            },
        )
        .unwrap();

        let mut volt = VoltRailsStatus::new();
        for rail in [VoltRailIdx::new(0), VoltRailIdx::new(1)] {
            volt.set(
                rail,
                VoltRailEntry {
                    sensed: Microvolts::new(1_000_000),
                    min: Microvolts::new(650_000),
                },
            )
            .unwrap();
        }

        let mut ch = PwrChannelsStatus::new();
        ch.set(PwrChannelIdx::new(0), PwrValue::new(180_000)).unwrap();
        ch.set(PwrChannelIdx::new(1), PwrValue::new(0)).unwrap();
        (clk, volt, ch)
    }

    fn budgets(total: u32, each: u32) -> Budgets {
        Budgets {
            total: PwrValue::new(total),
            rail: [PwrValue::new(each), PwrValue::new(each)]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn test_two_rail_capping_scenario() {
        // 150 W combined / 100 W individual; P = V^2 * f * w anchored to
        // 180 W at 2000 MHz. The individual primary budget binds first:
        // crossing at 1111.1 MHz, highest supported point 1076.926 MHz.
        let vf = legacy_vf();
        let prop = FakeProp::default_pair();
        let leak = FakeLeak { base: 0, uv_div: 0 };
        let svc = services(&vf, &prop, &leak);

        let (clk, volt, ch) = legacy_telemetry();
        let inputs = PolicyInputs {
            clk: &clk,
            volt: &volt,
            channels: Some(&ch),
            lpwr: None,
            soft_floor: None,
        };

        let mut policy =
            CombinedPolicy::new(two_rail_cfg(PolicyFeatures::empty(), RampConfig::default()))
                .unwrap();
        let out = policy
            .evaluate(&svc, &inputs, &budgets(150_000, 100_000))
            .unwrap();

        assert_eq!(out.get(PRI).as_khz(), 1_076_926);
        assert_eq!(out.get(SEC).as_khz(), 538_463);
        assert!(out.get(ClkDomIdx::new(2)).is_invalid());

        let st = policy.status();
        assert!(!st.best_effort);
        assert!(st.regime.is_none());
        // zero individual violations at the chosen point
        assert!(st.estimated[0].value.raw() <= 100_000);
        assert_eq!(st.estimated[1].value, PwrValue::ZERO);
        assert!(st.estimated[0].value.raw() > 90_000);
        assert_eq!(policy.stats().evaluations, 1);
    }

    #[test]
    fn test_unlimited_budget_selects_top() {
        let vf = legacy_vf();
        let prop = FakeProp::default_pair();
        let leak = FakeLeak { base: 0, uv_div: 0 };
        let svc = services(&vf, &prop, &leak);

        let (clk, volt, ch) = legacy_telemetry();
        let inputs = PolicyInputs {
            clk: &clk,
            volt: &volt,
            channels: Some(&ch),
            lpwr: None,
            soft_floor: None,
        };

        let mut policy =
            CombinedPolicy::new(two_rail_cfg(PolicyFeatures::empty(), RampConfig::default()))
                .unwrap();
        let out = policy
            .evaluate(&svc, &inputs, &budgets(u32::MAX, u32::MAX))
            .unwrap();
        assert_eq!(out.get(PRI).as_khz(), 2_000_006);
    }

    #[test]
    fn test_best_effort_at_floor() {
        // budget below the floor's draw: the floor is commanded anyway
        let vf = legacy_vf();
        let prop = FakeProp::default_pair();
        let leak = FakeLeak { base: 0, uv_div: 0 };
        let svc = services(&vf, &prop, &leak);

        let (clk, volt, ch) = legacy_telemetry();
        let inputs = PolicyInputs {
            clk: &clk,
            volt: &volt,
            channels: Some(&ch),
            lpwr: None,
            soft_floor: None,
        };

        let mut policy =
            CombinedPolicy::new(two_rail_cfg(PolicyFeatures::empty(), RampConfig::default()))
                .unwrap();
        let out = policy.evaluate(&svc, &inputs, &budgets(1_000, 1_000)).unwrap();
        assert_eq!(out.get(PRI).as_khz(), 200_000);
        assert!(policy.status().best_effort);
    }

    #[test]
    fn test_ramp_limits_upward_move() {
        let vf = legacy_vf();
        let prop = FakeProp::default_pair();
        let leak = FakeLeak { base: 0, uv_div: 0 };
        let svc = services(&vf, &prop, &leak);

        let (clk, volt, ch) = legacy_telemetry();
        let inputs = PolicyInputs {
            clk: &clk,
            volt: &volt,
            channels: Some(&ch),
            lpwr: None,
            soft_floor: None,
        };

        // 0.25 up factor
        let ramp = RampConfig {
            factor_up: UFxp4_12::from_raw(1024),
            factor_down: UFxp4_12::ONE,
        };
        let mut policy =
            CombinedPolicy::new(two_rail_cfg(PolicyFeatures::empty(), ramp)).unwrap();

        // first cycle: no previous output, ramp skipped
        let out = policy
            .evaluate(&svc, &inputs, &budgets(150_000, 100_000))
            .unwrap();
        assert_eq!(out.get(PRI).as_khz(), 1_076_926);
        assert!(!policy.status().ramp_limited);

        // second cycle: budget lifted, raw answer jumps to the top but the
        // applied output moves only a quarter of the way, snapped up
        let out = policy
            .evaluate(&svc, &inputs, &budgets(u32::MAX, u32::MAX))
            .unwrap();
        assert!(policy.status().ramp_limited);
        let pri = out.get(PRI).as_khz();
        // scaled target: 1076926 + (2000006 - 1076926) / 4 = 1307696
        assert!(pri >= 1_307_696, "snap-up must not undershoot the target");
        assert!(pri < 1_400_000, "output moved too far for a 0.25 factor");
        assert_eq!(out.get(SEC).as_khz(), pri / 2);
        assert_eq!(policy.stats().ramp_limited, 1);
    }

    #[test]
    fn test_three_rail_multi_regime_rejected() {
        // the regime space only holds a coupled pair; a third rail would
        // never have its individual budget tested or its domain capped,
        // so the descriptor must not construct
        let mut cfg = two_rail_cfg(PolicyFeatures::MULTI_REGIME, RampConfig::default());
        cfg.rails.push(RailConfig {
            clk_dom: ClkDomIdx::new(2),
            volt_rail: VoltRailIdx::new(2),
            pwr_channel: PwrChannelIdx::new(2),
            ..RailConfig::default()
        });
        let err = CombinedPolicy::new(cfg).unwrap_err();
        assert_eq!(err, Error::InvalidArgument);
    }

    #[test]
    fn test_budget_count_mismatch_fails() {
        let vf = legacy_vf();
        let prop = FakeProp::default_pair();
        let leak = FakeLeak { base: 0, uv_div: 0 };
        let svc = services(&vf, &prop, &leak);

        let (clk, volt, ch) = legacy_telemetry();
        let inputs = PolicyInputs {
            clk: &clk,
            volt: &volt,
            channels: Some(&ch),
            lpwr: None,
            soft_floor: None,
        };

        let mut policy =
            CombinedPolicy::new(two_rail_cfg(PolicyFeatures::empty(), RampConfig::default()))
                .unwrap();
        let bad = Budgets {
            total: PwrValue::new(150_000),
            rail: [PwrValue::new(100_000)].into_iter().collect(),
        };
        let err = policy.evaluate(&svc, &inputs, &bad).unwrap_err();
        assert_eq!(err, Error::InvalidState(StateError::MetricsMismatch));
        assert_eq!(policy.stats().failed_evaluations, 1);
    }

    #[test]
    fn test_multi_regime_evaluation() {
        // coupled linear-voltage curves; Vmin floors create real regimes
        let vf = FakeVf::new()
            .with_dom(
                PRI,
                FakeDomVf {
                    min_khz: 200_000,
                    step_khz: 46_154,
                    count: 40,
                    uv_base: 600_000,
                    uv_per_mhz: 250,
                },
            )
            .with_dom(
                SEC,
                FakeDomVf {
                    min_khz: 100_000,
                    step_khz: 23_077,
                    count: 40,
                    uv_base: 550_000,
                    uv_per_mhz: 300,
                },
            );
        let prop = FakeProp {
            pri: PRI,
            sec: SEC,
            def_pm: 500,
            min_ratio_pm: 800,
            max_ratio_pm: 250,
        };
        let leak = FakeLeak { base: 0, uv_div: 0 };
        let svc = services(&vf, &prop, &leak);

        let mut clk = ClkDomainsStatus::new();
        clk.set(
            PRI,
            ClkDomainEntry {
                sensed: KiloHertz::new(2_000_006),
                target: KiloHertz::new(2_000_006),
            },
        )
        .unwrap();
        clk.set(
            SEC,
            ClkDomainEntry {
                sensed: KiloHertz::new(1_000_003),
                target: KiloHertz::new(1_000_003),
            },
        )
        .unwrap();
        let mut volt = VoltRailsStatus::new();
        volt.set(
            VoltRailIdx::new(0),
            VoltRailEntry {
                sensed: Microvolts::new(1_100_000),
                min: Microvolts::new(700_000),
            },
        )
        .unwrap();
        volt.set(
            VoltRailIdx::new(1),
            VoltRailEntry {
                sensed: Microvolts::new(850_000),
                min: Microvolts::new(610_000),
            },
        )
        .unwrap();
        let mut ch = PwrChannelsStatus::new();
        ch.set(PwrChannelIdx::new(0), PwrValue::new(180_000)).unwrap();
        ch.set(PwrChannelIdx::new(1), PwrValue::new(30_000)).unwrap();

        let inputs = PolicyInputs {
            clk: &clk,
            volt: &volt,
            channels: Some(&ch),
            lpwr: None,
            soft_floor: Some(KiloHertz::new(600_000)),
        };

        let features = PolicyFeatures::MULTI_REGIME
            | PolicyFeatures::SEC_SOFT_FLOOR
            | PolicyFeatures::RATIO_BOUNDS;
        let mut policy =
            CombinedPolicy::new(two_rail_cfg(features, RampConfig::default())).unwrap();
        let out = policy
            .evaluate(&svc, &inputs, &budgets(120_000, 110_000))
            .unwrap();

        let st = policy.status();
        assert!(st.regime.is_some());
        assert!(st.tuple.is_some());
        assert!(!st.best_effort);
        assert_eq!(policy.stats().regime_builds, 1);

        // both domains capped within their supported ranges
        let pri = out.get(PRI);
        let sec = out.get(SEC);
        assert!(!pri.is_invalid() && !sec.is_invalid());
        assert!(pri.as_khz() >= 200_000 && pri.as_khz() <= 2_000_006);
        assert!(sec.as_khz() >= 100_000 && sec.as_khz() <= 1_000_003);

        // the selected point holds every budget
        let total: u64 = st
            .estimated
            .iter()
            .map(|e| u64::from(e.value.raw()))
            .sum();
        assert!(total <= 120_000);
        assert!(st.estimated.iter().all(|e| e.value.raw() <= 110_000));

        // the combined budget binds while the default ratio still holds
        assert_eq!(st.regime, Some(RegimeId::DefaultRatio));
    }

    #[test]
    fn test_pwr_model_trait_surface() {
        let vf = legacy_vf();
        let prop = FakeProp::default_pair();
        let leak = FakeLeak { base: 0, uv_div: 0 };
        let svc = services(&vf, &prop, &leak);

        let (clk, volt, ch) = legacy_telemetry();
        let inputs = PolicyInputs {
            clk: &clk,
            volt: &volt,
            channels: Some(&ch),
            lpwr: None,
            soft_floor: None,
        };

        let mut policy =
            CombinedPolicy::new(two_rail_cfg(PolicyFeatures::empty(), RampConfig::default()))
                .unwrap();
        let model: &mut dyn PwrModel = &mut policy;
        model.observe(&svc, &inputs).unwrap();

        // 90 mW/MHz on the primary, zero workload on the secondary
        let total = model
            .estimate(&svc, &[KiloHertz::new(1_000_000), KiloHertz::new(500_000)])
            .unwrap();
        assert!(total.raw() >= 89_000 && total.raw() <= 91_000);

        assert_eq!(
            model.estimate(&svc, &[KiloHertz::new(1_000_000)]),
            Err(Error::InvalidArgument)
        );
    }
}
