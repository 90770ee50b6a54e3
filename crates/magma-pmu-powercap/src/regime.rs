//! # Regime Search Space
//!
//! Piecewise search space over a coupled primary/secondary clock-domain
//! pair.
//!
//! A regime is one physically meaningful pinning/propagation pattern
//! between the two domains (both following the default ratio, the
//! secondary pinned to a soft floor, the primary pinned at its Vmin
//! frequency, ...). The space is rebuilt from telemetry every evaluation:
//! starting at a synthetic root, the build walks a small static graph,
//! computes each candidate regime's entry frequency tuple, and inserts the
//! child with the highest entry on the parent's search rail until the
//! terminal regime is reached. The inserted segments are then flattened
//! into one global tuple-index space, ascending with frequency, so a
//! single 1-D binary search can span all of them.
//!
//! Monotonicity across segment boundaries is asserted after every build;
//! a violation means the VF/propagation configuration is inconsistent and
//! the cycle must not command a frequency from this space.

use arrayvec::ArrayVec;
use magma_pmu_core::error::{Error, RegistryKind, Result, StateError};
use magma_pmu_core::traits::{PropTopology, Services};
use magma_pmu_core::types::{ClkDomIdx, KiloHertz, TupleIdx, VfPointIdx};

use crate::config::PolicyFeatures;

/// Most segments a single build can insert (every node except the root)
pub const MAX_REGIMES: usize = 6;

// =============================================================================
// REGIME IDENTITY
// =============================================================================

/// Nodes of the regime graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegimeId {
    /// Synthetic entry point, no frequency meaning
    DummyRoot,
    /// Both domains follow the default propagation ratio
    DefaultRatio,
    /// Secondary pinned at the perf controller's soft floor
    SecSoftFloor,
    /// Primary descends with the secondary at the minimum-ratio bound
    MinRatio,
    /// Primary pinned at its Fmax@Vmin, secondary descends
    PriVminFloor,
    /// Secondary descends with the primary at the maximum-ratio bound
    MaxRatio,
    /// Secondary pinned at its Fmax@Vmin, terminal regime
    SecVminFloor,
}

impl RegimeId {
    /// Statically defined child regimes, in selection tie-break order
    pub const fn children(self) -> &'static [RegimeId] {
        match self {
            Self::DummyRoot => &[Self::DefaultRatio],
            Self::DefaultRatio => &[Self::SecSoftFloor, Self::PriVminFloor, Self::SecVminFloor],
            Self::SecSoftFloor => &[Self::MinRatio, Self::PriVminFloor, Self::SecVminFloor],
            Self::MinRatio => &[Self::PriVminFloor, Self::SecVminFloor],
            Self::PriVminFloor => &[Self::MaxRatio, Self::SecVminFloor],
            Self::MaxRatio => &[Self::SecVminFloor],
            Self::SecVminFloor => &[],
        }
    }

    /// Check the regime against the policy's capability flags
    fn enabled(self, features: PolicyFeatures) -> bool {
        match self {
            Self::SecSoftFloor => features.contains(PolicyFeatures::SEC_SOFT_FLOOR),
            Self::MinRatio | Self::MaxRatio => features.contains(PolicyFeatures::RATIO_BOUNDS),
            _ => true,
        }
    }
}

// =============================================================================
// SEARCH-RAIL GEOMETRY
// =============================================================================

/// Which rail a segment's discrete points run over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchRail {
    Primary,
    Secondary,
}

impl SearchRail {
    const fn slot(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
        }
    }
}

/// How a segment derives the rail it is not searching over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OtherRail {
    /// Pinned at a fixed frequency for the whole segment
    Held(KiloHertz),
    /// Propagated from the search rail under a topology
    Propagated(PropTopology),
}

/// Quantization direction for primary-frequency tuple lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapDir {
    /// Select the tuple whose primary frequency is at most the target
    Down,
    /// Select the tuple whose primary frequency is at least the target
    Up,
}

// =============================================================================
// BUILD INPUTS
// =============================================================================

/// Per-cycle values the build derives endpoints from
#[derive(Debug, Clone, Copy)]
pub struct RegimeInputs {
    /// Primary clock domain
    pub pri_dom: ClkDomIdx,
    /// Secondary clock domain
    pub sec_dom: ClkDomIdx,
    /// Primary rail's Fmax@Vmin from this cycle's observe
    pub pri_fmax_vmin: KiloHertz,
    /// Secondary rail's Fmax@Vmin from this cycle's observe
    pub sec_fmax_vmin: KiloHertz,
    /// Perf controller's secondary soft floor, when requested
    pub soft_floor: Option<KiloHertz>,
}

/// A regime selected for this cycle, before discrete mapping
#[derive(Debug, Clone, Copy)]
struct WalkNode {
    id: RegimeId,
    /// Entry frequency tuple (primary, secondary) at the segment top
    entry: [KiloHertz; 2],
    search_rail: SearchRail,
    other: OtherRail,
}

// =============================================================================
// REGIME SEGMENT
// =============================================================================

/// One regime mapped onto discrete frequency points and tuple indices
#[derive(Debug, Clone, Copy)]
pub struct RegimeSegment {
    /// Regime identity
    pub id: RegimeId,
    entry: [KiloHertz; 2],
    search_rail: SearchRail,
    other: OtherRail,
    /// Discrete point range on the search rail, ascending with frequency
    point_lo: u16,
    point_hi: u16,
    /// Global tuple range, ascending with frequency
    tuple_lo: u16,
    tuple_hi: u16,
}

impl RegimeSegment {
    /// Global tuple range as (lowest, highest)
    pub fn tuple_range(&self) -> (TupleIdx, TupleIdx) {
        (TupleIdx::new(self.tuple_lo), TupleIdx::new(self.tuple_hi))
    }

    /// Entry frequency tuple at the segment top
    pub fn entry(&self) -> [KiloHertz; 2] {
        self.entry
    }
}

// =============================================================================
// REGIME SPACE
// =============================================================================

/// The flattened search space for one evaluation
///
/// Segments are stored highest-frequency first; tuple index 0 is the
/// global floor.
#[derive(Debug, Clone)]
pub struct RegimeSpace {
    segments: ArrayVec<RegimeSegment, MAX_REGIMES>,
    tuple_count: u16,
    pri_dom: ClkDomIdx,
    sec_dom: ClkDomIdx,
}

impl RegimeSpace {
    /// Build the space for this cycle's telemetry
    ///
    /// Fails with an invalid-state error when the walk cannot reach the
    /// terminal regime, when no segment maps to a discrete point, or when
    /// the monotonicity invariant does not hold across a boundary.
    pub fn build(
        services: &Services<'_>,
        features: PolicyFeatures,
        inputs: &RegimeInputs,
    ) -> Result<Self> {
        let nodes = walk(services, features, inputs)?;
        let mut space = Self {
            segments: ArrayVec::new(),
            tuple_count: 0,
            pri_dom: inputs.pri_dom,
            sec_dom: inputs.sec_dom,
        };
        space.map_points(services, &nodes)?;
        space.assign_tuples()?;
        space.check_monotonic(services)?;

        log::debug!(
            "regime space: {} segments, {} tuples, top {:?}",
            space.segments.len(),
            space.tuple_count,
            space.segments.first().map(|s| s.id)
        );
        Ok(space)
    }

    /// Number of tuples in the space
    pub fn tuple_count(&self) -> u16 {
        self.tuple_count
    }

    /// Built segments, highest frequency first
    pub fn segments(&self) -> &[RegimeSegment] {
        &self.segments
    }

    /// Resolve a tuple index to the (primary, secondary) frequency pair
    pub fn freq_by_tuple(
        &self,
        services: &Services<'_>,
        tuple: TupleIdx,
    ) -> Result<[KiloHertz; 2]> {
        let seg = self.segment_by_tuple(tuple)?;
        self.freq_in_segment(services, seg, tuple)
    }

    /// Regime owning a tuple index
    pub fn regime_by_tuple(&self, tuple: TupleIdx) -> Result<RegimeId> {
        Ok(self.segment_by_tuple(tuple)?.id)
    }

    /// Tuple whose primary frequency best matches a target
    ///
    /// Direction-aware: `Down` returns the highest tuple whose primary
    /// frequency is at most the target (clamped to the space floor),
    /// `Up` the lowest tuple at or above it (clamped to the space top).
    pub fn tuple_by_primary(
        &self,
        services: &Services<'_>,
        target: KiloHertz,
        dir: SnapDir,
    ) -> Result<TupleIdx> {
        match dir {
            SnapDir::Down => {
                for t in (0..self.tuple_count).rev() {
                    let freqs = self.freq_by_tuple(services, TupleIdx::new(t))?;
                    if freqs[0] <= target {
                        return Ok(TupleIdx::new(t));
                    }
                }
                Ok(TupleIdx::new(0))
            }
            SnapDir::Up => {
                for t in 0..self.tuple_count {
                    let freqs = self.freq_by_tuple(services, TupleIdx::new(t))?;
                    if freqs[0] >= target {
                        return Ok(TupleIdx::new(t));
                    }
                }
                Ok(TupleIdx::new(self.tuple_count - 1))
            }
        }
    }

    fn segment_by_tuple(&self, tuple: TupleIdx) -> Result<&RegimeSegment> {
        self.segments
            .iter()
            .find(|s| s.tuple_lo <= tuple.raw() && tuple.raw() <= s.tuple_hi)
            .ok_or(Error::IndexOutOfRange(RegistryKind::Tuple))
    }

    fn freq_in_segment(
        &self,
        services: &Services<'_>,
        seg: &RegimeSegment,
        tuple: TupleIdx,
    ) -> Result<[KiloHertz; 2]> {
        let point = seg.point_lo + (tuple.raw() - seg.tuple_lo);
        let (search_dom, other_dom) = match seg.search_rail {
            SearchRail::Primary => (self.pri_dom, self.sec_dom),
            SearchRail::Secondary => (self.sec_dom, self.pri_dom),
        };
        let freq = services.vf.freq_at_point(search_dom, VfPointIdx::new(point))?;
        let other = match seg.other {
            OtherRail::Held(f) => f,
            OtherRail::Propagated(topo) => {
                services.prop.propagate(search_dom, other_dom, freq, topo)?
            }
        };
        let mut out = [KiloHertz::ZERO; 2];
        out[seg.search_rail.slot()] = freq;
        out[1 - seg.search_rail.slot()] = other;
        Ok(out)
    }

    /// Map each walk node's continuous span onto discrete points
    ///
    /// A node whose span contains no supported point is skipped for this
    /// cycle; its entry still bounds the segment above it.
    fn map_points(&mut self, services: &Services<'_>, nodes: &[WalkNode]) -> Result<()> {
        for (i, node) in nodes.iter().enumerate() {
            let dom = match node.search_rail {
                SearchRail::Primary => self.pri_dom,
                SearchRail::Secondary => self.sec_dom,
            };
            let top = node.entry[node.search_rail.slot()];

            let Ok(point_hi) = services.vf.point_floor(dom, top) else {
                // whole segment below the supported range
                continue;
            };

            let point_lo = if let Some(next) = nodes.get(i + 1) {
                // exclusive of the child's entry: the boundary point
                // belongs to the segment below
                let bottom = next.entry[node.search_rail.slot()];
                match services.vf.point_floor(dom, bottom) {
                    Ok(p) => p.raw() + 1,
                    Err(_) => 0,
                }
            } else {
                // terminal regime reaches the global range floor
                let (range_min, _) = services.vf.freq_range(dom)?;
                services.vf.point_ceil(dom, range_min)?.raw()
            };

            if point_lo > point_hi.raw() {
                continue;
            }

            self.segments.push(RegimeSegment {
                id: node.id,
                entry: node.entry,
                search_rail: node.search_rail,
                other: node.other,
                point_lo,
                point_hi: point_hi.raw(),
                tuple_lo: 0,
                tuple_hi: 0,
            });
        }
        Ok(())
    }

    /// Assign contiguous tuple ranges, ascending from the lowest segment
    fn assign_tuples(&mut self) -> Result<()> {
        if self.segments.is_empty() {
            log::error!("regime build produced no searchable segments");
            return Err(StateError::EmptySearchSpace.into());
        }
        let mut next = 0u16;
        for seg in self.segments.iter_mut().rev() {
            let span = seg.point_hi - seg.point_lo + 1;
            seg.tuple_lo = next;
            seg.tuple_hi = next + span - 1;
            next += span;
        }
        self.tuple_count = next;
        Ok(())
    }

    /// Assert strict frequency ordering across every segment boundary
    ///
    /// For each adjacent (parent, child) pair: the child's top tuple must
    /// not exceed the parent's bottom tuple on either rail, and must be
    /// strictly below it on the parent's search rail. Anything else means
    /// the binary search's monotonicity precondition does not hold.
    fn check_monotonic(&self, services: &Services<'_>) -> Result<()> {
        for pair in self.segments.windows(2) {
            let (parent, child) = (&pair[0], &pair[1]);
            let parent_bot =
                self.freq_in_segment(services, parent, TupleIdx::new(parent.tuple_lo))?;
            let child_top = self.freq_in_segment(services, child, TupleIdx::new(child.tuple_hi))?;

            let pinned = parent.search_rail.slot();
            let ordered = child_top[0] <= parent_bot[0]
                && child_top[1] <= parent_bot[1]
                && child_top[pinned] < parent_bot[pinned];
            if !ordered {
                log::error!(
                    "regime monotonicity violated: {:?} {:?} above {:?} {:?}",
                    child.id,
                    child_top,
                    parent.id,
                    parent_bot
                );
                return Err(StateError::RegimeMonotonicity.into());
            }
        }
        Ok(())
    }
}

// =============================================================================
// GRAPH WALK
// =============================================================================

/// Walk the regime graph from the root to the terminal regime
fn walk(
    services: &Services<'_>,
    features: PolicyFeatures,
    inputs: &RegimeInputs,
) -> Result<ArrayVec<WalkNode, MAX_REGIMES>> {
    let mut out: ArrayVec<WalkNode, MAX_REGIMES> = ArrayVec::new();
    let mut current: Option<WalkNode> = None;

    loop {
        let (children, parent_entry, parent_rail) = match &current {
            None => (RegimeId::DummyRoot.children(), None, SearchRail::Primary),
            Some(node) => (node.id.children(), Some(node.entry), node.search_rail),
        };
        if children.is_empty() {
            break;
        }

        // Highest entry on the parent's search rail wins; ties go to the
        // earlier child in the static list.
        let mut best: Option<WalkNode> = None;
        for &child in children {
            if !child.enabled(features) {
                continue;
            }
            if out.iter().any(|n| n.id == child) {
                continue;
            }
            let Some(node) = endpoint(services, inputs, child, current.as_ref())? else {
                continue;
            };
            let metric = node.entry[parent_rail.slot()];
            if let Some(entry) = parent_entry {
                if metric > entry[parent_rail.slot()] {
                    continue;
                }
            }
            if best.is_none_or(|b| metric > b.entry[parent_rail.slot()]) {
                best = Some(node);
            }
        }

        match best {
            Some(node) => {
                out.push(node);
                current = Some(node);
            }
            None => {
                log::error!(
                    "regime walk stuck at {:?} with no eligible child",
                    current.map(|n| n.id)
                );
                return Err(StateError::RegimeWalkStuck.into());
            }
        }
    }
    Ok(out)
}

/// Compute a candidate regime's entry tuple, `None` when the regime does
/// not apply to this cycle's telemetry
fn endpoint(
    services: &Services<'_>,
    inputs: &RegimeInputs,
    id: RegimeId,
    parent: Option<&WalkNode>,
) -> Result<Option<WalkNode>> {
    let vf = services.vf;
    let prop = services.prop;
    let (pri, sec) = (inputs.pri_dom, inputs.sec_dom);

    let node = match id {
        RegimeId::DummyRoot => return Ok(None),

        RegimeId::DefaultRatio => {
            let (_, top) = vf.freq_range(pri)?;
            let sec_top = prop.propagate(pri, sec, top, PropTopology::Default)?;
            WalkNode {
                id,
                entry: [top, sec_top],
                search_rail: SearchRail::Primary,
                other: OtherRail::Propagated(PropTopology::Default),
            }
        }

        RegimeId::SecSoftFloor => {
            // A soft floor at or below the hard floor carries no meaning.
            let Some(soft) = inputs.soft_floor else {
                return Ok(None);
            };
            if soft <= inputs.sec_fmax_vmin {
                return Ok(None);
            }
            let pri_entry = prop.propagate(sec, pri, soft, PropTopology::Default)?;
            if pri_entry <= inputs.pri_fmax_vmin {
                return Ok(None);
            }
            WalkNode {
                id,
                entry: [pri_entry, soft],
                search_rail: SearchRail::Primary,
                other: OtherRail::Held(soft),
            }
        }

        RegimeId::MinRatio => {
            // Only reachable below a regime that holds the secondary.
            let Some(OtherRail::Held(sec_held)) = parent.map(|p| p.other) else {
                return Ok(None);
            };
            let pri_entry = prop.propagate(sec, pri, sec_held, PropTopology::RatioMin)?;
            WalkNode {
                id,
                entry: [pri_entry, sec_held],
                search_rail: SearchRail::Primary,
                other: OtherRail::Propagated(PropTopology::RatioMin),
            }
        }

        RegimeId::PriVminFloor => {
            let pri_entry = inputs.pri_fmax_vmin;
            let sec_entry = match parent.map(|p| p.other) {
                Some(OtherRail::Propagated(topo)) => {
                    prop.propagate(pri, sec, pri_entry, topo)?
                }
                Some(OtherRail::Held(held)) => held,
                None => return Ok(None),
            };
            WalkNode {
                id,
                entry: [pri_entry, sec_entry],
                search_rail: SearchRail::Secondary,
                other: OtherRail::Held(pri_entry),
            }
        }

        RegimeId::MaxRatio => {
            // Only reachable below a regime that holds the primary.
            let Some(OtherRail::Held(pri_held)) = parent.map(|p| p.other) else {
                return Ok(None);
            };
            let sec_entry = prop.propagate(pri, sec, pri_held, PropTopology::RatioMax)?;
            if sec_entry <= inputs.sec_fmax_vmin {
                return Ok(None);
            }
            WalkNode {
                id,
                entry: [pri_held, sec_entry],
                search_rail: SearchRail::Secondary,
                other: OtherRail::Propagated(PropTopology::RatioMax),
            }
        }

        RegimeId::SecVminFloor => {
            let sec_entry = inputs.sec_fmax_vmin;
            let pri_entry = match parent.map(|p| (p.search_rail, p.other)) {
                Some((_, OtherRail::Propagated(topo))) => {
                    prop.propagate(sec, pri, sec_entry, topo)?
                }
                Some((SearchRail::Secondary, OtherRail::Held(held))) => held,
                // parent pins the secondary: fall back to the default
                // coupling for the primary entry
                Some((SearchRail::Primary, OtherRail::Held(_))) | None => {
                    prop.propagate(sec, pri, sec_entry, PropTopology::Default)?
                }
            };
            WalkNode {
                id,
                entry: [pri_entry, sec_entry],
                search_rail: SearchRail::Primary,
                other: OtherRail::Held(sec_entry),
            }
        }
    };
    Ok(Some(node))
}

// =============================================================================
// STATIC ASSERTIONS
// =============================================================================

static_assertions::assert_impl_all!(RegimeId: Send, Sync, Copy);
static_assertions::assert_impl_all!(RegimeSpace: Send, Sync, Clone);

// =============================================================================
// TESTS
// =============================================================================
