use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use report_etl::config::{EnvOverrides, EtlConfig, load_config_path};
use report_etl::etl::{Etl, EtlOptions};
use report_etl::logging::init_logging;
use report_etl::store::{IngestionRepo, IngestionStore, StoreStats};
use tracing::error;

#[derive(Parser)]
#[command(version, about = "Ingest exchange inventory and delivery reports into SQLite")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Directory scanned for report files.
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// SQLite database file.
    #[arg(long, value_name = "FILE")]
    db_path: Option<PathBuf>,
    /// Archive root for processed files.
    #[arg(long, value_name = "DIR")]
    archive_dir: Option<PathBuf>,
    /// Reprocess files the ledger already marks success or skipped.
    #[arg(long)]
    reprocess: bool,
    /// Move successfully processed files into the archive.
    #[arg(long)]
    archive: bool,
    /// Only warnings and errors on the console.
    #[arg(long)]
    quiet: bool,
    /// Print store statistics and exit without processing.
    #[arg(long)]
    stats: bool,
}

fn resolve_config(cli: &Cli) -> Result<EtlConfig> {
    let mut cfg = match &cli.config {
        Some(path) => load_config_path(path)?,
        None => EtlConfig::default(),
    };
    cfg.apply_overrides(EnvOverrides::from_env());
    if let Some(dir) = &cli.data_dir {
        cfg.data_dir = dir.clone();
    }
    if let Some(path) = &cli.db_path {
        cfg.db_path = path.clone();
    }
    if let Some(dir) = &cli.archive_dir {
        cfg.archive_dir = dir.clone();
    }
    Ok(cfg)
}

fn print_stats(stats: &StoreStats) {
    println!("Files processed: {}", stats.total_files);
    for (status, count) in &stats.files_by_status {
        println!("  {status:<8} {count}");
    }
    println!("Inventory rows:  {}", stats.inventory_rows);
    println!("Delivery rows:   {}", stats.delivery_rows);
    match stats.last_processed_at {
        Some(at) => println!("Last processed:  {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("Last processed:  never"),
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let cfg = resolve_config(&cli)?;
    let _guard = init_logging(&cfg.log, cli.quiet)?;

    let mut store = IngestionStore::open(&cfg.db_path, cfg.store.options())
        .context("open ingestion store")?;

    if cli.stats {
        print_stats(&store.stats().context("read store statistics")?);
        return Ok(ExitCode::SUCCESS);
    }

    let options = EtlOptions {
        data_dir: cfg.data_dir.clone(),
        archive_dir: cfg.archive_dir.clone(),
        reprocess: cli.reprocess,
        archive: cli.archive,
    };
    let mut etl = Etl::new(store, options, cfg.inventory.parser_options());
    let summary = etl.run()?;
    if !cli.quiet {
        println!("{summary}");
    }

    Ok(if summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "run aborted");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
