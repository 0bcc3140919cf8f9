//! `blueprint usage`: daily token usage against the configured limit.

use anyhow::Result;
use sqlx::PgPool;

use blueprint_core::budget::TokenBudget;
use blueprint_db::models::TokenUsage;
use blueprint_db::queries::token_usage;

pub async fn run_usage(pool: &PgPool, budget: TokenBudget, days: u32) -> Result<()> {
    let rows = token_usage::recent_usage(pool, i64::from(days.max(1))).await?;
    if rows.is_empty() {
        println!("No token usage recorded yet (daily limit {}).", budget.daily_limit);
        return Ok(());
    }
    print!("{}", render_usage(&rows, budget));
    Ok(())
}

pub fn render_usage(rows: &[TokenUsage], budget: TokenBudget) -> String {
    let mut out = format!(
        "{:<10}  {:>10}  {:>8}  {:>10}  (limit {})\n",
        "DATE", "TOKENS", "REQUESTS", "REMAINING", budget.daily_limit
    );
    for row in rows {
        let used = u64::try_from(row.tokens_used).unwrap_or(0);
        out.push_str(&format!(
            "{:<10}  {:>10}  {:>8}  {:>10}\n",
            row.usage_date.format("%Y-%m-%d").to_string(),
            used,
            row.request_count,
            budget.remaining(used),
        ));
    }
    out
}
