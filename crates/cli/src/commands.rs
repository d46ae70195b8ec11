//! Subcommand implementations.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use cot_core::Config;
use cot_features::SignalEngine;
use cot_ingestion::{CftcClient, CftcQuery, CsvLoader, DataSource, RowNormalizer};
use cot_report::{render_summary, write_csv, write_json, DecisionCounts, TableLayout};
use std::path::PathBuf;
use tracing::info;

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// JSON config file (missing fields use defaults)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the full signal table as CSV
    #[arg(long)]
    pub output_csv: Option<PathBuf>,

    /// Write the full signal table as JSON records
    #[arg(long)]
    pub output_json: Option<PathBuf>,

    /// Absolute z-score threshold for crowding
    #[arg(long)]
    pub extreme_threshold: Option<f64>,

    /// Rolling window length in weeks
    #[arg(long)]
    pub lookback_weeks: Option<usize>,

    /// Minimum observations before z-score and percentile are defined
    #[arg(long)]
    pub min_required_weeks: Option<usize>,

    /// Percentile at or above which a category is long-crowded
    #[arg(long)]
    pub long_percentile: Option<f64>,

    /// Percentile at or below which a category is short-crowded
    #[arg(long)]
    pub short_percentile: Option<f64>,

    /// Consecutive crowded weeks required for confirmation
    #[arg(long)]
    pub confirm_weeks: Option<usize>,
}

#[derive(Args, Debug)]
pub struct CftcArgs {
    /// First report date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: NaiveDate,

    /// Last report date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Socrata application token
    #[arg(long, env = "CFTC_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Dataset id or alias (e.g. TFF_COMBINED)
    #[arg(long)]
    pub dataset_id: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct CsvArgs {
    /// CSV file, directory of CSV files or glob pattern (repeatable)
    #[arg(long, required = true, num_args = 1..)]
    pub path: Vec<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn run_cftc(args: CftcArgs) -> Result<()> {
    let mut config = load_config(&args.common)?;
    if let Some(dataset) = args.dataset_id {
        config.source.dataset_id = dataset;
    }
    config.validate().context("invalid configuration")?;

    let query = CftcQuery {
        start_date: args.start_date,
        end_date: args.end_date,
        api_token: args.api_token,
    };
    let client = CftcClient::new(&config.source, &config.categories, query)?;
    run_pipeline(&config, &args.common, &client).await
}

pub async fn run_csv(args: CsvArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    config.validate().context("invalid configuration")?;

    let loader = CsvLoader::new(args.path);
    run_pipeline(&config, &args.common, &loader).await
}

/// Load the config file (if any) and apply flag overrides.
pub fn load_config(args: &CommonArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let signal = &mut config.signal;
    if let Some(v) = args.extreme_threshold {
        signal.extreme_z_threshold = v;
    }
    if let Some(v) = args.lookback_weeks {
        signal.lookback_weeks = v;
    }
    if let Some(v) = args.min_required_weeks {
        signal.min_required_weeks = v;
    }
    if let Some(v) = args.long_percentile {
        signal.long_crowded_percentile = v;
    }
    if let Some(v) = args.short_percentile {
        signal.short_crowded_percentile = v;
    }
    if let Some(v) = args.confirm_weeks {
        signal.confirm_weeks = v;
    }

    Ok(config)
}

async fn run_pipeline(config: &Config, common: &CommonArgs, source: &dyn DataSource) -> Result<()> {
    let engine = SignalEngine::new(config)?;

    let records = source
        .load()
        .await
        .with_context(|| format!("failed to load records from {}", source.describe()))?;

    let batch = RowNormalizer::new(&config.categories).normalize_batch(&records);
    info!(
        records = records.len(),
        rows = batch.rows.len(),
        rejected = batch.rejected,
        duplicates = batch.duplicates,
        "normalized records"
    );

    let rows = engine.compute(&batch.rows);
    let layout = TableLayout::new(&config.categories);

    if let Some(path) = &common.output_csv {
        write_csv(path, &layout, &rows)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &common.output_json {
        write_json(path, &layout, &rows)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    println!("{}", render_summary(&rows).trim_end());
    if !rows.is_empty() {
        println!();
        println!("Decision counts:");
        print!("{}", DecisionCounts::from_rows(&rows).render());
    }

    Ok(())
}
