//! CLI entry point: ingests one or more NDJSON dataset files into a
//! paged paper store and author index rooted at a storage directory.
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use citeidx::{AuthorIndex, PaperIndex, StoreConfig, ingest_dataset};

/// Ingest bibliographic dataset files into a citeidx paper store.
#[derive(Debug, Parser)]
#[command(name = "citeidx", about, version)]
struct Cli {
    /// Directory the paged storage files, name mapping and author index
    /// are written into. Created if it does not already exist.
    #[arg(long)]
    storage_dir: PathBuf,

    /// Records held per paged storage file before rolling over.
    #[arg(long, default_value_t = StoreConfig::default().max_records_per_file)]
    max_records_per_file: usize,

    /// Upper bound on the number of decoded records held in the
    /// in-memory cache at once.
    #[arg(long, default_value_t = StoreConfig::default().max_cache_size)]
    max_cache_size: usize,

    /// Fraction of the cache reclaimed in a single clean pass once an
    /// insert would exceed `max_cache_size`.
    #[arg(long, default_value_t = StoreConfig::default().cache_clean_factor)]
    cache_clean_factor: f64,

    /// NDJSON dataset files, processed in the order given.
    #[arg(required = true)]
    datasets: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = StoreConfig {
        max_records_per_file: cli.max_records_per_file,
        max_cache_size: cli.max_cache_size,
        cache_clean_factor: cli.cache_clean_factor,
    };

    let mut paper_index = match PaperIndex::open(cli.storage_dir.clone(), config) {
        Ok(index) => index,
        Err(e) => {
            error!("failed to open paper store at {}: {e}", cli.storage_dir.display());
            return ExitCode::FAILURE;
        }
    };
    let mut author_index = AuthorIndex::new();

    if let Err(e) = ingest_dataset(&cli.storage_dir, &mut paper_index, &mut author_index, &cli.datasets) {
        error!("ingestion failed: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
