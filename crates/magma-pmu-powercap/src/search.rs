//! # Limit-Satisfying Binary Search
//!
//! Biased binary search over an integer index space in which the limit
//! predicate is monotone: satisfied at low indices, violated at high ones.
//! The caller establishes monotonicity (regime-space invariant, or the VF
//! curve itself in legacy mode); the search does not re-verify it.
//!
//! The midpoint rounds up so the higher index is probed on odd spans,
//! biasing convergence toward the highest satisfying point. After
//! convergence the point is re-tested; if it fails, a bounded step-back
//! walk handles the quantization case where the analytic crossing falls
//! between two discrete points. Exhausting the walk at the space floor is
//! accepted best-effort: the floor is commanded even though the budget is
//! still violated, and the outcome says so.

use magma_pmu_core::error::Result;

/// Bound on the post-convergence step-back walk
pub const MAX_STEPS_BACK: u8 = 4;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result of one search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Selected index
    pub idx: u16,
    /// Predicate held at the selected index
    ///
    /// `false` only in the best-effort-at-floor case.
    pub satisfied: bool,
    /// Step-back corrections taken after convergence
    pub steps_back: u8,
    /// Predicate evaluations issued
    pub probes: u16,
}

// =============================================================================
// SEARCH
// =============================================================================

/// Find the highest index in `[min_idx, max_idx]` satisfying `predicate`
///
/// `predicate(idx)` returns whether every limit holds at `idx`; errors
/// propagate immediately and abort the search.
pub fn highest_satisfying<F>(min_idx: u16, max_idx: u16, mut predicate: F) -> Result<SearchOutcome>
where
    F: FnMut(u16) -> Result<bool>,
{
    debug_assert!(min_idx <= max_idx);

    let mut low = min_idx;
    let mut high = max_idx;
    let mut probes = 0u16;

    while low < high {
        // round up: probe the higher index on odd spans
        let mid = low + (high - low).div_ceil(2);
        probes += 1;
        if predicate(mid)? {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    probes += 1;
    let mut satisfied = predicate(low)?;
    let mut steps_back = 0u8;
    while !satisfied && low > min_idx && steps_back < MAX_STEPS_BACK {
        low -= 1;
        steps_back += 1;
        probes += 1;
        satisfied = predicate(low)?;
    }

    if !satisfied {
        log::debug!(
            "search floor {} accepted best-effort after {} steps back",
            low,
            steps_back
        );
    }

    Ok(SearchOutcome {
        idx: low,
        satisfied,
        steps_back,
        probes,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Step predicate: satisfied strictly below `k`
    fn step(k: u16) -> impl FnMut(u16) -> Result<bool> {
        move |idx| Ok(idx < k)
    }

    #[test]
    fn test_interior_crossing() {
        let out = highest_satisfying(0, 39, step(17)).unwrap();
        assert_eq!(out.idx, 16);
        assert!(out.satisfied);
        assert_eq!(out.steps_back, 0);
    }

    #[test]
    fn test_crossing_at_high_boundary() {
        // everything satisfies: the top index wins
        let out = highest_satisfying(0, 39, step(40)).unwrap();
        assert_eq!(out.idx, 39);
        assert!(out.satisfied);

        // only the top index fails
        let out = highest_satisfying(0, 39, step(39)).unwrap();
        assert_eq!(out.idx, 38);
        assert!(out.satisfied);
    }

    #[test]
    fn test_crossing_at_low_boundary() {
        // only the floor satisfies
        let out = highest_satisfying(0, 39, step(1)).unwrap();
        assert_eq!(out.idx, 0);
        assert!(out.satisfied);
    }

    #[test]
    fn test_best_effort_at_floor() {
        // nothing satisfies: floor accepted, violation reported
        let out = highest_satisfying(0, 39, step(0)).unwrap();
        assert_eq!(out.idx, 0);
        assert!(!out.satisfied);
        assert!(out.steps_back <= MAX_STEPS_BACK);
    }

    #[test]
    fn test_step_back_on_isolated_dip() {
        // boundary quantization case: the converged index passed its probe
        // but fails the re-test; one step back recovers a satisfying point
        let mut seen_10 = 0u32;
        let out = highest_satisfying(0, 15, |idx| {
            if idx == 10 {
                seen_10 += 1;
                return Ok(seen_10 == 1);
            }
            Ok(idx < 10)
        })
        .unwrap();
        assert!(out.satisfied);
        assert_eq!(out.idx, 9);
        assert_eq!(out.steps_back, 1);
    }

    #[test]
    fn test_single_index_space() {
        let out = highest_satisfying(5, 5, step(6)).unwrap();
        assert_eq!(out.idx, 5);
        assert!(out.satisfied);
        assert_eq!(out.probes, 1);
    }

    #[test]
    fn test_predicate_error_propagates() {
        use magma_pmu_core::error::Error;
        let err = highest_satisfying(0, 9, |_| Err(Error::VfLookupFailed)).unwrap_err();
        assert_eq!(err, Error::VfLookupFailed);
    }
}
