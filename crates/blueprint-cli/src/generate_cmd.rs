//! `blueprint generate`: run the pipeline on the saved onboarding answers.

use std::fmt::Write as _;

use anyhow::{Context, Result, bail};
use sqlx::PgPool;

use blueprint_core::orchestrator::{RawGeneration, TextSource};
use blueprint_core::plan::GeneratedPlan;
use blueprint_core::prompt::{DetailLevel, GenerateOptions};
use blueprint_core::request::{OnboardingSource, PgOnboardingSource, assemble_request};
use blueprint_core::service::PlanService;

pub struct GenerateArgs {
    pub detail: String,
    pub focus: Vec<String>,
    pub no_research: bool,
    pub dry_run: bool,
    pub json: bool,
}

impl GenerateArgs {
    pub fn options(&self) -> Result<GenerateOptions> {
        let detail_level: DetailLevel = self.detail.parse()?;
        let options = GenerateOptions {
            detail_level,
            focus_areas: self.focus.iter().map(|f| f.trim().to_string()).collect(),
            include_research: !self.no_research,
        };
        options.validate()?;
        Ok(options)
    }
}

pub async fn run_generate(service: &PlanService, pool: &PgPool, args: &GenerateArgs) -> Result<()> {
    let options = args.options()?;

    let db_source = PgOnboardingSource::new(pool.clone());
    let mut sources: Vec<&dyn OnboardingSource> = vec![&db_source];
    if let Some(cache) = service.cache() {
        sources.push(cache);
    }
    let Some(request) = assemble_request(&sources).await else {
        bail!("no onboarding answers found; run `blueprint onboard` first");
    };

    let (plan, raw, saved) = if args.dry_run {
        let generation = service.generate_plan(&request, &options).await?;
        (generation.plan, generation.raw, None)
    } else {
        let stored = service.generate_and_store(&request, &options).await?;
        let username = stored.stored.username.clone();
        (stored.stored.plan, stored.raw, Some((username, stored.simplified)))
    };

    if args.json {
        let json = serde_json::to_string_pretty(&plan).context("failed to serialize plan")?;
        println!("{json}");
        return Ok(());
    }

    print!("{}", render_summary(&plan, &raw));
    match saved {
        Some((username, simplified)) => {
            println!();
            println!("Saved as {username}.");
            if simplified {
                println!("Note: the full plan could not be stored; a simplified copy was saved instead.");
            }
        }
        None => {
            println!();
            println!("Dry run: plan not saved.");
        }
    }
    Ok(())
}

/// Human-readable overview of a generated plan.
pub fn render_summary(plan: &GeneratedPlan, raw: &RawGeneration) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Plan: {}", plan.app_name);
    let _ = writeln!(out, "  ID:        {}", plan.id);
    let _ = writeln!(out, "  Business:  {} ({})", plan.business_name, plan.industry);
    let _ = writeln!(out, "  Model:     {}", plan.model_used);
    if let Some(reason) = fallback_reason(raw) {
        let _ = writeln!(out, "  Fallback:  {reason}");
    }
    let _ = writeln!(out, "  Version:   {}", plan.version);
    let _ = writeln!(
        out,
        "  Cost:      {} {} (development {})",
        plan.cost_breakdown.total(),
        plan.cost_breakdown.currency(),
        plan.cost_breakdown.development()
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Features ({}):", plan.features.len());
    for feature in &plan.features {
        let _ = writeln!(
            out,
            "  [{}] {} ({}, {}h)",
            feature.priority, feature.name, feature.complexity, feature.estimated_hours
        );
    }

    if !plan.development_phases.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Phases:");
        for phase in &plan.development_phases {
            let _ = writeln!(
                out,
                "  {}: {} feature(s), {}",
                phase.name,
                phase.features.len(),
                phase.estimated_duration
            );
        }
    }

    let sections = plan.research_results.section_count();
    if sections > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "Research: {sections} section(s)");
    }
    out
}

fn fallback_reason(raw: &RawGeneration) -> Option<String> {
    match &raw.features.source {
        TextSource::Fallback { reason } => Some(reason.to_string()),
        TextSource::Remote { .. } => None,
    }
}
