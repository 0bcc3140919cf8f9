//! Where daily token usage is recorded.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use blueprint_db::queries::token_usage;

/// Daily token counter.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Tokens recorded for `day` (0 when nothing was recorded).
    async fn used_on(&self, day: NaiveDate) -> Result<u64>;

    /// Add `tokens` to the counter for `day`; returns the new total.
    async fn record(&self, day: NaiveDate, tokens: u64) -> Result<u64>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn UsageLedger) {}
};

/// Ledger backed by the `token_usage` table.
#[derive(Debug, Clone)]
pub struct PgUsageLedger {
    pool: PgPool,
}

impl PgUsageLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageLedger for PgUsageLedger {
    async fn used_on(&self, day: NaiveDate) -> Result<u64> {
        let row = token_usage::get_usage(&self.pool, day).await?;
        Ok(row.map_or(0, |r| r.tokens_used.max(0) as u64))
    }

    async fn record(&self, day: NaiveDate, tokens: u64) -> Result<u64> {
        let tokens = i64::try_from(tokens).unwrap_or(i64::MAX);
        let row = token_usage::add_usage(&self.pool, day, tokens).await?;
        Ok(row.tokens_used.max(0) as u64)
    }
}

/// In-process ledger, for tests and database-less runs.
#[derive(Debug, Default)]
pub struct MemoryUsageLedger {
    days: Mutex<HashMap<NaiveDate, u64>>,
}

impl MemoryUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageLedger for MemoryUsageLedger {
    async fn used_on(&self, day: NaiveDate) -> Result<u64> {
        let days = self
            .days
            .lock()
            .map_err(|_| anyhow!("usage ledger lock poisoned"))?;
        Ok(days.get(&day).copied().unwrap_or(0))
    }

    async fn record(&self, day: NaiveDate, tokens: u64) -> Result<u64> {
        let mut days = self
            .days
            .lock()
            .map_err(|_| anyhow!("usage ledger lock poisoned"))?;
        let total = days.entry(day).or_insert(0);
        *total = total.saturating_add(tokens);
        Ok(*total)
    }
}
