mod app;
mod config;
mod generate_cmd;
mod onboard_cmd;
mod plan_cmds;
mod serve_cmd;
mod usage_cmd;

#[cfg(test)]
mod test_util;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use blueprint_core::budget::TokenBudget;
use blueprint_db::pool;

use config::BlueprintConfig;

#[derive(Parser)]
#[command(name = "blueprint", about = "Generate and manage AI-assisted app build plans")]
struct Cli {
    /// Database URL (overrides BLUEPRINT_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a blueprint config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/blueprint")]
        db_url: String,
        /// URL of the generate-app-plan edge function
        #[arg(long)]
        endpoint_url: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the blueprint database (requires config file or env vars)
    DbInit,
    /// Record the business onboarding answers
    Onboard {
        #[arg(long)]
        business_name: String,
        /// What the app should do (e.g. "table booking")
        #[arg(long)]
        app_purpose: String,
        #[arg(long)]
        industry: String,
        #[arg(long)]
        target_audience: String,
        #[arg(long)]
        budget: Option<String>,
        #[arg(long)]
        timeline: Option<String>,
        /// Preferred communication channel
        #[arg(long)]
        communication: Option<String>,
        /// Company name for the client profile (defaults to the business name)
        #[arg(long)]
        company_name: Option<String>,
        #[arg(long)]
        contact_email: Option<String>,
    },
    /// Generate an app plan from the saved onboarding answers
    Generate {
        /// Detail level: brief, standard or comprehensive
        #[arg(long, default_value = "standard")]
        detail: String,
        /// Comma-separated focus areas
        #[arg(long, value_delimiter = ',')]
        focus: Vec<String>,
        /// Skip the market research branch
        #[arg(long)]
        no_research: bool,
        /// Generate without saving
        #[arg(long)]
        dry_run: bool,
        /// Print the plan document as JSON
        #[arg(long)]
        json: bool,
    },
    /// Plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Show daily token usage against the limit
    Usage {
        /// Number of most recent days to show
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Serve the generate endpoint and plan API over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Show plan details (or list all plans)
    Show {
        /// Plan ID to show (omit to list all)
        plan_id: Option<String>,
        /// List the plans mirrored in the local cache instead
        #[arg(long, conflicts_with = "plan_id")]
        cached: bool,
    },
    /// Approve a draft plan
    Approve {
        /// Plan ID to approve
        plan_id: String,
    },
    /// Store an edited copy of a plan as its next version
    Refine {
        /// Plan ID to refine
        plan_id: String,
        /// Comma-separated feature names to add
        #[arg(long, value_delimiter = ',')]
        add: Vec<String>,
        /// Comma-separated feature names to remove
        #[arg(long, value_delimiter = ',')]
        remove: Vec<String>,
    },
    /// Export a plan document as JSON
    Export {
        /// Plan ID to export
        plan_id: String,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<String>,
    },
}

/// Execute the `blueprint init` command: write config file.
fn cmd_init(db_url: &str, endpoint_url: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        generation: config::GenerationSection {
            endpoint: endpoint_url.map(|_| config::EndpointKind::Edge),
            url: endpoint_url.map(str::to_string),
            ..Default::default()
        },
        cache: config::CacheSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    match endpoint_url {
        Some(url) => println!("  generation.url = {url}"),
        None => println!("  generation: local templates (set generation.url or ANTHROPIC_API_KEY for AI plans)"),
    }
    println!();
    println!("Next: run `blueprint db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `blueprint db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = BlueprintConfig::resolve(cli_db_url)?;

    println!("Initializing blueprint database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("blueprint db-init complete.");
    Ok(())
}

async fn connect(cli_db_url: Option<&str>) -> anyhow::Result<(BlueprintConfig, PgPool)> {
    let resolved = BlueprintConfig::resolve(cli_db_url)?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    Ok((resolved, db_pool))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let db_url = cli.database_url.as_deref();

    match cli.command {
        Commands::Init {
            db_url,
            endpoint_url,
            force,
        } => {
            cmd_init(&db_url, endpoint_url.as_deref(), force)?;
        }
        Commands::DbInit => {
            cmd_db_init(db_url).await?;
        }
        Commands::Onboard {
            business_name,
            app_purpose,
            industry,
            target_audience,
            budget,
            timeline,
            communication,
            company_name,
            contact_email,
        } => {
            let (resolved, db_pool) = connect(db_url).await?;
            let cache = app::build_cache(&resolved.cache);
            let args = onboard_cmd::OnboardArgs {
                business_name,
                app_purpose,
                industry,
                target_audience,
                budget,
                timeline,
                communication,
                company_name,
                contact_email,
            };
            let result = onboard_cmd::run_onboard(&db_pool, cache.as_ref(), &args).await;
            db_pool.close().await;
            result?;
        }
        Commands::Generate {
            detail,
            focus,
            no_research,
            dry_run,
            json,
        } => {
            let (resolved, db_pool) = connect(db_url).await?;
            let args = generate_cmd::GenerateArgs {
                detail,
                focus,
                no_research,
                dry_run,
                json,
            };
            let result = match app::build_service(&resolved, db_pool.clone()) {
                Ok(service) => generate_cmd::run_generate(&service, &db_pool, &args).await,
                Err(e) => Err(e),
            };
            db_pool.close().await;
            result?;
        }
        Commands::Plan { command } => {
            let (resolved, db_pool) = connect(db_url).await?;
            let result = match app::build_service(&resolved, db_pool.clone()) {
                Ok(service) => plan_cmds::run_plan_command(command, &service).await,
                Err(e) => Err(e),
            };
            db_pool.close().await;
            result?;
        }
        Commands::Usage { days } => {
            let (resolved, db_pool) = connect(db_url).await?;
            let budget = TokenBudget::new(resolved.generation.daily_token_limit);
            let result = usage_cmd::run_usage(&db_pool, budget, days).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let (resolved, db_pool) = connect(db_url).await?;
            let service = Arc::new(app::build_service(&resolved, db_pool.clone())?);

            let shutdown = CancellationToken::new();
            let on_signal = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_signal.cancel();
                }
            });

            let result = serve_cmd::run_serve(service, &bind, port, shutdown).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
