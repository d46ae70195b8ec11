use clap::{Parser, Subcommand};

mod commands;

use commands::{CftcArgs, CsvArgs};

#[derive(Parser)]
#[command(name = "crowded-cot")]
#[command(about = "Crowded positioning signal for ES and NQ from CFTC TFF reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch TFF reports from the CFTC public reporting API
    Cftc(CftcArgs),
    /// Load TFF reports from local CSV files
    Csv(CsvArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries only the summary
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Cftc(args) => commands::run_cftc(args).await?,
        Commands::Csv(args) => commands::run_csv(args).await?,
    }

    Ok(())
}
