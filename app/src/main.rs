// In app/src/main.rs

use analytics::TradeClassifier;
use anyhow::Result;
use api_client::HttpBridge;
use app_config::{Settings, StoreBackend};
use clap::{Parser, Subcommand};
use core_types::{Credentials, ProgramType};
use engine::{Engine, EvaluationRequest};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use web_server::AppState;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Evaluates funded-trading accounts against program objectives.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the evaluation HTTP service.
    Serve,

    /// Evaluates a single account and prints the result as JSON.
    Evaluate {
        /// The account identifier on the trading platform.
        #[arg(long)]
        account_id: String,

        /// The credential used to reach the account.
        #[arg(long, env = "APP_ACCOUNT_TOKEN", hide_env_values = true)]
        token: String,

        /// The funding program ("standard" or "instant").
        #[arg(long, default_value = "standard")]
        program: ProgramType,

        /// The program's starting balance.
        #[arg(long)]
        starting_balance: Decimal,

        /// Skip the ownership check.
        #[arg(long)]
        admin: bool,
    },

    /// Applies the metrics cache migrations and exits.
    Migrate,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    let settings = app_config::load_settings()?;
    init_tracing(&settings);
    tracing::info!(environment = %settings.app.environment, "Application settings loaded successfully.");

    // Match on the parsed command and call the appropriate handler.
    match cli.command {
        Commands::Serve => {
            handle_serve(settings).await?;
        }
        Commands::Evaluate {
            account_id,
            token,
            program,
            starting_balance,
            admin,
        } => {
            let request = EvaluationRequest::new(
                Credentials::new(account_id, token),
                program,
                starting_balance,
                admin,
            );
            handle_evaluate(settings, request).await?;
        }
        Commands::Migrate => {
            handle_migrate(settings).await?;
        }
    }

    Ok(())
}

fn init_tracing(settings: &Settings) {
    let level = settings
        .app
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_filter(tracing_subscriber::filter::Targets::new()
            .with_target("sqlx::query", tracing::Level::WARN) // Disable sqlx query debug logs
            .with_default(level));
    tracing_subscriber::registry().with(fmt_layer).init();
}

/// Wires the bridge client, the metrics store and the classifier vocabulary into an engine.
async fn build_engine(settings: &Settings) -> Result<Engine> {
    let bridge = HttpBridge::new(&settings.bridge)?;
    let store = database::open_store(&settings.database).await?;
    tracing::info!(store = store.name(), "Metrics store ready.");

    Ok(Engine::new(
        Arc::new(bridge),
        store,
        TradeClassifier::from_settings(&settings.classifier),
        settings.evaluation.clone(),
    ))
}

// --- "Serve" Subcommand Logic ---

/// Starts the web server. It runs until the process is interrupted.
async fn handle_serve(settings: Settings) -> Result<()> {
    let engine = build_engine(&settings).await?;
    web_server::run(settings.server.clone(), AppState::new(engine)).await?;
    Ok(())
}

// --- "Evaluate" Subcommand Logic ---

async fn handle_evaluate(settings: Settings, request: EvaluationRequest) -> Result<()> {
    let engine = build_engine(&settings).await?;
    let response = engine.evaluate(request).await?;

    tracing::info!(
        source = ?response.source,
        status = ?response.account_status,
        all_passed = response.objectives.all_passed(),
        "Evaluation finished."
    );
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

// --- "Migrate" Subcommand Logic ---

async fn handle_migrate(settings: Settings) -> Result<()> {
    if settings.database.backend == StoreBackend::Memory {
        tracing::warn!("The in-memory store has no schema; nothing to migrate.");
        return Ok(());
    }
    // Connecting applies any pending migrations.
    database::connect(&settings.database).await?;
    tracing::info!("Database migrations are up-to-date.");
    Ok(())
}
