use anyhow::{bail, Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seed_cell::{seed_database, SeedOptions};
use shared_config::{AppConfig, StorageBackend};
use shared_database::AppState;

#[derive(Parser, Debug)]
#[command(name = "clinic-seed")]
#[command(about = "Replace the clinic data with a reproducible demo dataset")]
#[command(version)]
struct Cli {
    /// Confirm that existing clinic data may be deleted
    #[arg(long)]
    yes: bool,

    /// Random seed; the same seed produces the same dataset
    #[arg(long, env = "CLINIC_SEED")]
    seed: Option<u64>,

    /// Number of consultations to generate
    #[arg(long, default_value_t = 10)]
    consultations: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if !cli.yes {
        bail!("refusing to seed without --yes: every consultation, patient, doctor and medication will be deleted");
    }

    let config = AppConfig::from_env();
    if !config.is_configured() {
        bail!("the {} backend is missing its connection settings", config.storage_backend);
    }
    if config.storage_backend == StorageBackend::Memory {
        warn!("Seeding the in-memory store: the data is discarded when this command exits");
    }

    let options = SeedOptions {
        seed: cli.seed.unwrap_or(config.seed),
        consultations: cli.consultations,
        ..SeedOptions::default()
    };
    info!("Seeding with seed {} and {} consultations", options.seed, options.consultations);

    let state = AppState::from_config(config);
    let summary = seed_database(&state, options).await.context("seeding failed")?;

    println!("{}", summary);
    Ok(())
}
