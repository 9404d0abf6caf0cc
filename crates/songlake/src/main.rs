use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use songlake_core::{run_pipeline, EtlConfig, RunOptions, Session, StorageLocation};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_INPUT_ROOT: &str = "s3a://udacity-dend/";
const DEFAULT_OUTPUT_ROOT: &str = ".";

#[derive(Parser, Debug)]
#[command(author, version, about = "Builds the songplays star schema from raw song and event logs", long_about = None)]
struct Cli {
    /// INI file holding the [AWS] credentials
    #[arg(long, default_value = "dl.cfg")]
    config: PathBuf,
    /// Root containing song_data/ and log_data/ (s3://, s3a:// or a local path)
    #[arg(long, default_value = DEFAULT_INPUT_ROOT)]
    input_root: String,
    /// Root the parquet tables are written to (s3://, s3a:// or a local path)
    #[arg(long, default_value = DEFAULT_OUTPUT_ROOT)]
    output_root: String,
    /// Rebuild the songs and artists dimensions before the log tables
    #[arg(long)]
    with_songs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    let config = EtlConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    let input = StorageLocation::parse(&cli.input_root).context("invalid --input-root")?;
    let output = StorageLocation::parse(&cli.output_root).context("invalid --output-root")?;

    let session = Session::bootstrap(&config, &input, &output)
        .await
        .context("failed to open storage")?;

    let options = RunOptions {
        refresh_songs: cli.with_songs,
    };
    let summary = run_pipeline(&session, options)
        .await
        .context("pipeline run failed")?;

    info!(
        songs_refreshed = summary.songs_refreshed,
        songplays = summary.log_data.songplays.rows,
        "done"
    );
    Ok(())
}
