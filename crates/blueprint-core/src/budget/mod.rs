//! Daily token budget.
//!
//! Usage is advisory bookkeeping: a remote call is skipped (and the local
//! fallback used) when today's recorded usage plus the estimate for the call
//! would exceed the daily limit.

pub mod ledger;

pub use ledger::{MemoryUsageLedger, PgUsageLedger, UsageLedger};

pub const DEFAULT_DAILY_LIMIT: u64 = 100_000;

const CHARS_PER_TOKEN: usize = 4;

/// Rough token count for `text`: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    text.chars().count().div_ceil(CHARS_PER_TOKEN) as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetDecision {
    Allowed { remaining: u64 },
    Exhausted { used: u64, limit: u64 },
}

impl BudgetDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    pub daily_limit: u64,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            daily_limit: DEFAULT_DAILY_LIMIT,
        }
    }
}

impl TokenBudget {
    pub fn new(daily_limit: u64) -> Self {
        Self { daily_limit }
    }

    /// Whether a call estimated at `estimated` tokens fits after `used`.
    pub fn evaluate(&self, used: u64, estimated: u64) -> BudgetDecision {
        let after = used.saturating_add(estimated);
        if after <= self.daily_limit {
            BudgetDecision::Allowed {
                remaining: self.daily_limit - after,
            }
        } else {
            BudgetDecision::Exhausted {
                used,
                limit: self.daily_limit,
            }
        }
    }

    pub fn remaining(&self, used: u64) -> u64 {
        self.daily_limit.saturating_sub(used)
    }
}
