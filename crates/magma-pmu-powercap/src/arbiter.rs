//! # Limit Arbitration & Output Bookkeeping
//!
//! Budget side: merges the limit requests of competing clients (RM,
//! thermal, battery, acoustic, ...) into the single active budget a policy
//! solves against - minimum wins. Output side: the per-clock-domain
//! frequency ceilings the solver hands to the frequency arbiter, in kHz.

use arrayvec::ArrayVec;
use magma_pmu_core::error::{Error, Result};
use magma_pmu_core::types::{ClkDomIdx, KiloHertz, PwrValue, MAX_CLK_DOMAINS, MAX_RAILS};

/// Most clients that can hold a limit request against one policy
pub const MAX_LIMIT_CLIENTS: usize = 8;

// =============================================================================
// LIMIT ARBITER
// =============================================================================

/// Min-merge of client limit requests into one active budget
///
/// A slot holding [`PwrValue::MAX`] is "no request". The table is bounded;
/// client identity is the caller's slot assignment.
#[derive(Debug, Clone)]
pub struct LimitArbiter {
    requests: [PwrValue; MAX_LIMIT_CLIENTS],
}

impl LimitArbiter {
    /// Create an arbiter with no requests outstanding
    pub const fn new() -> Self {
        Self {
            requests: [PwrValue::MAX; MAX_LIMIT_CLIENTS],
        }
    }

    /// Set a client's limit request
    pub fn request(&mut self, client: usize, limit: PwrValue) -> Result<()> {
        if client >= MAX_LIMIT_CLIENTS {
            return Err(Error::InvalidArgument);
        }
        self.requests[client] = limit;
        Ok(())
    }

    /// Withdraw a client's limit request
    pub fn clear(&mut self, client: usize) -> Result<()> {
        self.request(client, PwrValue::MAX)
    }

    /// The active budget: the lowest outstanding request
    ///
    /// [`PwrValue::MAX`] (uncapped) when no client has a request in.
    pub fn active(&self) -> PwrValue {
        self.requests
            .iter()
            .fold(PwrValue::MAX, |acc, &r| acc.min(r))
    }
}

// =============================================================================
// BUDGETS
// =============================================================================

/// Budgets one evaluation solves against
#[derive(Debug, Clone)]
pub struct Budgets {
    /// Aggregate budget across all rails
    pub total: PwrValue,
    /// Individual per-rail budgets, congruent with the policy's rails
    pub rail: ArrayVec<PwrValue, MAX_RAILS>,
}

// =============================================================================
// DOMAIN CEILINGS
// =============================================================================

/// Per-clock-domain frequency ceilings for the frequency arbiter
///
/// Domains the policy does not cap carry the uncapped sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainCeilings {
    ceilings: [KiloHertz; MAX_CLK_DOMAINS],
}

impl DomainCeilings {
    /// All domains uncapped
    pub const fn new() -> Self {
        Self {
            ceilings: [KiloHertz::INVALID; MAX_CLK_DOMAINS],
        }
    }

    /// Cap one domain
    pub fn set(&mut self, dom: ClkDomIdx, ceiling: KiloHertz) -> Result<()> {
        if !dom.is_in_range() {
            return Err(Error::InvalidArgument);
        }
        self.ceilings[dom.as_usize()] = ceiling;
        Ok(())
    }

    /// Ceiling for one domain, the uncapped sentinel when not capped
    pub fn get(&self, dom: ClkDomIdx) -> KiloHertz {
        if dom.is_in_range() {
            self.ceilings[dom.as_usize()]
        } else {
            KiloHertz::INVALID
        }
    }

    /// Iterate capped domains with their ceilings
    pub fn iter_capped(&self) -> impl Iterator<Item = (ClkDomIdx, KiloHertz)> + '_ {
        self.ceilings
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_invalid())
            .map(|(i, c)| (ClkDomIdx::new(i as u8), *c))
    }
}

// =============================================================================
// TESTS
// =============================================================================
