use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use engine::builder::{build_index, MAX_THREADS, MIN_THREADS};
use engine::persist::save_index;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build an inverted word index from a crawled page directory", long_about = None)]
struct Cli {
    /// Directory of numbered page files produced by the crawler
    page_dir: PathBuf,
    /// Output index file
    index_file: PathBuf,
    /// Number of indexing workers
    #[arg(long, short = 't', default_value_t = 1, value_parser = parse_threads)]
    threads: usize,
}

fn parse_threads(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a thread count"))?;
    if (MIN_THREADS..=MAX_THREADS).contains(&n) {
        Ok(n)
    } else {
        Err(format!(
            "thread count must be between {MIN_THREADS} and {MAX_THREADS}"
        ))
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let index = build_index(&cli.page_dir, cli.threads)?;
    save_index(&index, &cli.index_file)?;
    tracing::info!(
        words = index.word_count(),
        index_file = %cli.index_file.display(),
        "index saved"
    );
    Ok(())
}
