use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use engine::page::load_url_map;
use engine::persist::load_index;
use engine::query::QueryEngine;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "querier")]
#[command(about = "Answer ranked boolean keyword queries against a saved index", long_about = None)]
struct Cli {
    /// Directory of numbered page files (source of the document → URL map)
    page_dir: PathBuf,
    /// Index file produced by the indexer
    index_file: PathBuf,
    /// Batch mode: read queries from this file instead of the terminal
    #[arg(long, requires = "output")]
    input: Option<PathBuf>,
    /// Batch mode: write results to this file
    #[arg(long, requires = "input")]
    output: Option<PathBuf>,
    /// Also print documents with score 0
    #[arg(long, default_value_t = false)]
    show_unmatched: bool,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let index = load_index(&cli.index_file)?;
    let urls = load_url_map(&cli.page_dir)?;
    tracing::info!(
        words = index.word_count(),
        documents = urls.len(),
        "index loaded"
    );

    let engine = QueryEngine::new(index, urls).include_unmatched(cli.show_unmatched);

    match (&cli.input, &cli.output) {
        (Some(input), Some(output)) => {
            let reader = BufReader::new(File::open(input)?);
            let mut writer = BufWriter::new(File::create(output)?);
            engine.run_session(reader, &mut writer, false)?;
            writer.flush()?;
        }
        _ => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            engine.run_session(stdin.lock(), &mut stdout, true)?;
        }
    }
    Ok(())
}
