use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod db;
mod notify;

use commands::{
    BatchCommand, CarCommand, CategoryCommand, ConfigCommand, JourneyCommand, NutritionCommand,
    WasteCommand,
};
use config::Config;
use db::{init_db, SqliteGateway};
use herdwise_core::{Persistence, Wizard};
use notify::ConsoleNotifier;

#[derive(Parser)]
#[command(name = "herdwise")]
#[command(version)]
#[command(about = "Herd inventory journey for livestock farms", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Navigate the journey (phases and herd tabs)
    Journey(JourneyCommand),

    /// Manage batches of animals
    Batch(BatchCommand),

    /// Manage the category rows of a batch
    Category(CategoryCommand),

    /// Feed data of a batch
    Nutrition(NutritionCommand),

    /// Manure management split of a batch
    Waste(WasteCommand),

    /// CAR registry allocation of purchased animals
    Car(CarCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herdwise=info,herdwise_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn open_wizard(config: &Config) -> Result<Wizard, Box<dyn std::error::Error>> {
    tracing::debug!(path = %config.database_path.value.display(), "opening database");
    let pool = init_db(&config.database_path.value).await?;
    let gateway = Arc::new(SqliteGateway::new(pool));
    let wizard = Wizard::open(
        Persistence::from_backend(gateway),
        Arc::new(ConsoleNotifier),
        &config.owner.value,
        &config.journey_name.value,
        config.quiet_period(),
    )
    .await?;
    Ok(wizard)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Journey(cmd)) => cmd.run(&mut open_wizard(&config).await?).await?,
        Some(Commands::Batch(cmd)) => cmd.run(&mut open_wizard(&config).await?).await?,
        Some(Commands::Category(cmd)) => cmd.run(&mut open_wizard(&config).await?).await?,
        Some(Commands::Nutrition(cmd)) => cmd.run(&mut open_wizard(&config).await?).await?,
        Some(Commands::Waste(cmd)) => cmd.run(&mut open_wizard(&config).await?).await?,
        Some(Commands::Car(cmd)) => cmd.run(&mut open_wizard(&config).await?).await?,
        Some(Commands::Config(cmd)) => cmd.run(&config)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
