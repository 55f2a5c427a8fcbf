//! ScreenLab CLI — scan, strategy listing, and universe inspection.
//!
//! Commands:
//! - `scan` — screen a universe file against one strategy and print matches
//! - `strategies` — list the canonical strategy catalog
//! - `universe` — show instrument counts for a universe file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use screenlab_core::data::{BarFetcher, CsvBarFetcher, Universe, YahooFetcher};
use screenlab_core::strategy::catalog;
use screenlab_runner::{
    export_csv, export_json, render_table, scan, CancelToken, ScanSettings, StdoutProgress,
};

#[derive(Parser)]
#[command(
    name = "screenlab",
    about = "ScreenLab CLI — daily-bar technical setup screener"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a universe of instruments against one strategy.
    Scan {
        /// Universe TOML file (instrument ids and names per board tier).
        #[arg(long, default_value = "universe.toml")]
        universe: PathBuf,

        /// Strategy name (see `strategies`).
        #[arg(long)]
        strategy: Option<String>,

        /// Minimum volume floor in board lots; overrides strategy defaults.
        #[arg(long)]
        min_volume: Option<f64>,

        /// Worker threads; 1 means the sequential reference scan.
        #[arg(long)]
        workers: Option<usize>,

        /// Fetch bars from a directory of {id}.csv files instead of Yahoo.
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Scan settings TOML file; command-line flags take precedence.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write output to a file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the canonical strategy catalog.
    Strategies,
    /// Show instrument counts for a universe file.
    Universe {
        /// Universe TOML file.
        #[arg(default_value = "universe.toml")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Scan {
            universe,
            strategy,
            min_volume,
            workers,
            csv_dir,
            config,
            format,
            output,
        } => cmd_scan(
            &universe, strategy, min_volume, workers, csv_dir, config, format, output,
        ),
        Commands::Strategies => cmd_strategies(),
        Commands::Universe { path } => cmd_universe(&path),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_scan(
    universe_path: &Path,
    strategy: Option<String>,
    min_volume: Option<f64>,
    workers: Option<usize>,
    csv_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut settings = match config {
        Some(path) => ScanSettings::from_file(&path)
            .with_context(|| format!("load scan settings from {}", path.display()))?,
        None => ScanSettings::default(),
    };
    if let Some(name) = strategy {
        settings.strategy = name;
    }
    if min_volume.is_some() {
        settings.min_volume_lots = min_volume;
    }
    if let Some(workers) = workers {
        settings.workers = workers;
    }

    let Some(strategy) = catalog::by_name(&settings.strategy) else {
        bail!(
            "unknown strategy '{}'; run `screenlab strategies` for the catalog",
            settings.strategy
        );
    };

    let universe = load_universe(universe_path)?;

    let fetcher: Box<dyn BarFetcher> = match csv_dir {
        Some(dir) => Box::new(CsvBarFetcher::new(dir)),
        None => Box::new(YahooFetcher::new().context("initialize Yahoo fetcher")?),
    };

    println!(
        "Scanning {} instrument(s) with '{}' ({} workers)...",
        universe.len(),
        strategy.name,
        settings.workers.max(1)
    );

    let result = scan(
        &universe,
        fetcher.as_ref(),
        &strategy,
        &settings.engine_config(),
        &settings.scan_config(),
        &StdoutProgress,
        &CancelToken::new(),
    )?;

    let rendered = match format {
        OutputFormat::Table => render_table(&result),
        OutputFormat::Csv => export_csv(&result.matches)?,
        OutputFormat::Json => export_json(&result)?,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("write output to {}", path.display()))?;
            println!("Wrote {} match(es) to {}", result.matched, path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn cmd_strategies() -> Result<()> {
    println!("{:<22} {:>12} {:>11}  {}", "name", "min history", "predicates", "note");
    for strategy in catalog::all() {
        println!(
            "{:<22} {:>12} {:>11}  {}",
            strategy.name,
            strategy.min_history,
            strategy.predicates.len(),
            strategy.note
        );
    }
    Ok(())
}

/// Load a universe file, falling back to the built-in sample when absent.
fn load_universe(path: &Path) -> Result<Universe> {
    if path.exists() {
        Universe::from_file(path).with_context(|| format!("load universe from {}", path.display()))
    } else {
        println!(
            "universe file {} not found; using the built-in sample universe",
            path.display()
        );
        Ok(Universe::default_tw())
    }
}

fn cmd_universe(path: &Path) -> Result<()> {
    let universe = load_universe(path)?;
    println!(
        "{}: {} primary, {} secondary, {} total",
        path.display(),
        universe.primary.len(),
        universe.secondary.len(),
        universe.len()
    );
    Ok(())
}
