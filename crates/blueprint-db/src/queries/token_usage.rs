//! Database query functions for the `token_usage` daily counter.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::TokenUsage;

/// Add `tokens` to the counter for `day`, creating the row on first use.
///
/// Returns the updated row.
pub async fn add_usage(pool: &PgPool, day: NaiveDate, tokens: i64) -> Result<TokenUsage> {
    let row = sqlx::query_as::<_, TokenUsage>(
        "INSERT INTO token_usage (usage_date, tokens_used, request_count) \
         VALUES ($1, $2, 1) \
         ON CONFLICT (usage_date) DO UPDATE SET \
             tokens_used = LEAST(token_usage.tokens_used::numeric + EXCLUDED.tokens_used, 9223372036854775807)::bigint, \
             request_count = token_usage.request_count + 1, \
             updated_at = now() \
         RETURNING *",
    )
    .bind(day)
    .bind(tokens.max(0))
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to record token usage for {day}"))?;

    Ok(row)
}

/// Usage recorded for `day`, if any.
pub async fn get_usage(pool: &PgPool, day: NaiveDate) -> Result<Option<TokenUsage>> {
    let row = sqlx::query_as::<_, TokenUsage>("SELECT * FROM token_usage WHERE usage_date = $1")
        .bind(day)
        .fetch_optional(pool)
        .await
        .context("failed to fetch token usage")?;

    Ok(row)
}

/// The most recent `limit` days with recorded usage, newest first.
pub async fn recent_usage(pool: &PgPool, limit: i64) -> Result<Vec<TokenUsage>> {
    let rows = sqlx::query_as::<_, TokenUsage>(
        "SELECT * FROM token_usage ORDER BY usage_date DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list token usage")?;

    Ok(rows)
}
