//! CLI handlers for `blueprint plan` subcommands.
//!
//! Implements:
//! - `blueprint plan show [plan-id]`    -- show plan details or list all plans
//! - `blueprint plan show --cached`     -- list plans mirrored in the local cache
//! - `blueprint plan approve <plan-id>` -- transition a plan from draft to approved
//! - `blueprint plan refine <plan-id>`  -- store an edited copy as the next version
//! - `blueprint plan export <plan-id>`  -- write the plan document as JSON

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use blueprint_core::plan::{GeneratedPlan, PlanRefinement};
use blueprint_core::service::PlanService;
use blueprint_core::store::StoredPlan;

use crate::PlanCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(command: PlanCommands, service: &PlanService) -> Result<()> {
    match command {
        PlanCommands::Show { plan_id, cached } => match plan_id {
            Some(id) => cmd_show_one(service, &id).await,
            None if cached => cmd_show_cached(service),
            None => cmd_show_all(service).await,
        },
        PlanCommands::Approve { plan_id } => cmd_approve(service, &plan_id).await,
        PlanCommands::Refine {
            plan_id,
            add,
            remove,
        } => {
            let refinement = PlanRefinement {
                add_features: add,
                remove_features: remove,
            };
            cmd_refine(service, &plan_id, &refinement).await
        }
        PlanCommands::Export { plan_id, output } => {
            cmd_export(service, &plan_id, output.as_deref()).await
        }
    }
}

fn parse_plan_id(plan_id_str: &str) -> Result<Uuid> {
    plan_id_str
        .parse()
        .with_context(|| format!("invalid plan ID: {plan_id_str:?}"))
}

// -----------------------------------------------------------------------
// blueprint plan show (list all)
// -----------------------------------------------------------------------

async fn cmd_show_all(service: &PlanService) -> Result<()> {
    let plans = service.list_plans().await?;

    if plans.is_empty() {
        println!("No plans found. Use `blueprint generate` to create one.");
        return Ok(());
    }
    print!("{}", render_table(&plans));
    Ok(())
}

fn cmd_show_cached(service: &PlanService) -> Result<()> {
    let Some(cache) = service.cache() else {
        println!("No local cache configured (set cache.dir or BLUEPRINT_CACHE_DIR).");
        return Ok(());
    };
    let plans = cache.cached_plans(Utc::now());
    if plans.is_empty() {
        println!("No cached plans in {}.", cache.dir().display());
        return Ok(());
    }
    let rows: Vec<_> = plans.iter().map(|p| (p, p.generated_at)).collect();
    print!("{}", render_rows(&rows));
    Ok(())
}

/// One row per plan: id, app name, status, version, feature count, created.
pub fn render_table(plans: &[StoredPlan]) -> String {
    let rows: Vec<_> = plans.iter().map(|s| (&s.plan, s.created_at)).collect();
    render_rows(&rows)
}

fn render_rows(rows: &[(&GeneratedPlan, DateTime<Utc>)]) -> String {
    // ID is always 36 chars (UUID). Status max is 8 (approved).
    let id_w = 36;
    let name_w = rows
        .iter()
        .map(|(plan, _)| plan.app_name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);
    let status_w = 8;

    let mut out = format!(
        "{:<id_w$}  {:<name_w$}  {:<status_w$}  {:>3}  {:>8}  CREATED\n",
        "ID", "NAME", "STATUS", "VER", "FEATURES",
    );
    for (plan, created_at) in rows {
        out.push_str(&format!(
            "{:<id_w$}  {:<name_w$}  {:<status_w$}  {:>3}  {:>8}  {}\n",
            plan.id,
            plan.app_name,
            plan.status.to_string(),
            plan.version,
            plan.features.len(),
            created_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    out
}

// -----------------------------------------------------------------------
// blueprint plan show <plan-id>
// -----------------------------------------------------------------------

async fn cmd_show_one(service: &PlanService, plan_id_str: &str) -> Result<()> {
    let plan_id = parse_plan_id(plan_id_str)?;
    let stored = service.get_plan(plan_id).await?;
    let refinements = service.refinements(plan_id).await?;
    let plan = &stored.plan;

    println!("Plan: {}", plan.app_name);
    println!("  ID:           {}", plan.id);
    println!("  Username:     {}", stored.username);
    println!("  Status:       {}", plan.status);
    println!("  Version:      {}", plan.version);
    if let Some(parent) = plan.parent_id {
        println!("  Refined from: {parent}");
    }
    println!("  Business:     {} ({})", plan.business_name, plan.industry);
    println!("  Model:        {}", plan.model_used);
    println!(
        "  Created:      {}",
        stored.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(approved) = stored.approved_at {
        println!(
            "  Approved:     {}",
            approved.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!(
        "  Cost:         {} {}",
        plan.cost_breakdown.total(),
        plan.cost_breakdown.currency()
    );
    if !refinements.is_empty() {
        println!("  Refinements:");
        for child in &refinements {
            println!(
                "    v{}  {}  {}",
                child.plan.version, child.plan.id, child.plan.status
            );
        }
    }
    println!();
    println!("{}", plan.description);

    println!();
    println!("Features:");
    println!();
    for feature in &plan.features {
        println!("  [{}] {}", feature.priority, feature.name);
        println!("    Complexity:  {}", feature.complexity);
        println!("    Estimate:    {}h", feature.estimated_hours);
        if !feature.dependencies.is_empty() {
            println!("    Depends on:  {}", feature.dependencies.join(", "));
        }
        let desc = feature.description.trim();
        if !desc.is_empty() {
            println!("    Description:");
            for line in desc.lines().take(10) {
                println!("      {line}");
            }
        }
        println!();
    }

    if !plan.development_phases.is_empty() {
        println!("Phases:");
        for phase in &plan.development_phases {
            let names: Vec<&str> = phase
                .features
                .iter()
                .map(|id| {
                    plan.features
                        .iter()
                        .find(|f| &f.id == id)
                        .map_or(id.as_str(), |f| f.name.as_str())
                })
                .collect();
            println!(
                "  {} ({}): {}",
                phase.name,
                phase.estimated_duration,
                names.join(", ")
            );
        }
    }

    Ok(())
}

// -----------------------------------------------------------------------
// blueprint plan approve <plan-id>
// -----------------------------------------------------------------------

async fn cmd_approve(service: &PlanService, plan_id_str: &str) -> Result<()> {
    let stored = service.approve_plan(parse_plan_id(plan_id_str)?).await?;

    println!("Plan approved.");
    println!();
    println!("  Plan ID:     {}", stored.plan.id);
    println!("  Name:        {}", stored.plan.app_name);
    println!("  Status:      {}", stored.plan.status);
    if let Some(approved) = stored.approved_at {
        println!(
            "  Approved at: {}",
            approved.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    Ok(())
}

// -----------------------------------------------------------------------
// blueprint plan refine <plan-id> [--add ...] [--remove ...]
// -----------------------------------------------------------------------

async fn cmd_refine(
    service: &PlanService,
    plan_id_str: &str,
    refinement: &PlanRefinement,
) -> Result<()> {
    let stored = service
        .refine_plan(parse_plan_id(plan_id_str)?, refinement)
        .await?;

    println!("Plan refined.");
    println!();
    println!("  Plan ID:     {}", stored.plan.id);
    println!("  Version:     {}", stored.plan.version);
    println!("  Features:    {}", stored.plan.features.len());
    println!(
        "  Cost:        {} {}",
        stored.plan.cost_breakdown.total(),
        stored.plan.cost_breakdown.currency()
    );

    Ok(())
}

// -----------------------------------------------------------------------
// blueprint plan export <plan-id> [--output <file>]
// -----------------------------------------------------------------------

async fn cmd_export(service: &PlanService, plan_id_str: &str, output: Option<&str>) -> Result<()> {
    let stored = service.get_plan(parse_plan_id(plan_id_str)?).await?;
    let json = serde_json::to_string_pretty(&stored.plan).context("failed to serialize plan")?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write to {path}"))?;
            println!("Plan exported to {path}");
        }
        None => println!("{json}"),
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
