use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use orca_broker::select_broker;
use orca_core::{ConfigLoader, SpreadConfig};
use orca_engine::TradeEngine;
use orca_risk::SimplifiedPositionModel;
use orca_store::{MemoryAuditLog, MemoryStore};
use orca_web_api::{ApiServer, AppState};

#[derive(Parser)]
#[command(name = "orca")]
#[command(about = "Paper/live options trading backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the trading backend with the web API
    Serve {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Listen address override (host:port)
        #[arg(short, long)]
        addr: Option<String>,
    },
    /// Validate a spread proposal JSON file against the default rules
    Validate {
        /// Path to a SpreadConfig JSON file
        #[arg(short, long)]
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Serve { config, addr } => serve(&config, addr).await?,
        Commands::Validate { file } => validate(&file).await?,
    }

    Ok(())
}

async fn serve(config_path: &str, addr_override: Option<String>) -> Result<()> {
    let config = ConfigLoader::load_from(config_path).context("Failed to load configuration")?;

    let store = Arc::new(MemoryStore::with_demo_data());
    let audit = Arc::new(MemoryAuditLog::new());
    let (broker, broker_status) =
        select_broker(&config.broker, Arc::clone(&store)).context("Broker selection failed")?;

    tracing::info!(
        provider = ?broker_status.provider,
        env = ?broker_status.env,
        "Broker resolved"
    );

    let engine = Arc::new(TradeEngine::new(
        Arc::clone(&store),
        Arc::clone(&broker),
        audit.clone(),
        Arc::new(SimplifiedPositionModel),
        config.engine.clone(),
    ));

    let state = AppState {
        engine,
        store,
        audit,
        broker,
        broker_status,
        feed_interval: Duration::from_secs(config.server.feed_interval_secs),
    };

    let addr =
        addr_override.unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));
    ApiServer::new(state).serve(&addr).await
}

async fn validate(file: &str) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read proposal file {file}"))?;
    let proposal: SpreadConfig =
        serde_json::from_str(&raw).context("Proposal file is not a valid SpreadConfig")?;

    let store = MemoryStore::new();
    let (account, rules) = store.snapshot().await;
    let outcome = orca_risk::evaluate(&proposal, &rules, &account)?;

    println!(
        "{} against rules '{}' v{}:",
        proposal.display_name(),
        rules.name,
        rules.version
    );
    for result in &outcome.results {
        let mark = if result.passed { "PASS" } else { "FAIL" };
        println!(
            "  [{mark}] {:<15} observed {:>10}  threshold {:>10}  {}",
            result.rule.to_string(),
            result.observed,
            result.threshold,
            result.message
        );
    }
    println!(
        "verdict: {}",
        if outcome.passed() { "PASSED" } else { "FAILED" }
    );

    if !outcome.passed() {
        std::process::exit(1);
    }
    Ok(())
}
