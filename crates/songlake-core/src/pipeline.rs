use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::logs::{process_log_data, LogDataReport};
use crate::session::Session;
use crate::songs::{process_song_data, SongDataReport};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Rebuild `song.parquet`/`artists.parquet` before the log tables. Off by default: the log
    /// builder then joins against whatever song dimension a previous run left behind.
    pub refresh_songs: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub songs_refreshed: bool,
    pub song_data: Option<SongDataReport>,
    pub log_data: LogDataReport,
}

/// Runs the builders one after the other. Any failure aborts the run; tables written before the
/// failure stay as they are.
pub async fn run_pipeline(session: &Session, options: RunOptions) -> Result<RunSummary> {
    let song_data = if options.refresh_songs {
        Some(process_song_data(session).await?)
    } else {
        warn!("song dimension refresh skipped; reusing existing song.parquet");
        None
    };

    let log_data = process_log_data(session).await?;

    let summary = RunSummary {
        songs_refreshed: song_data.is_some(),
        song_data,
        log_data,
    };
    info!(summary = %serde_json::to_string(&summary)?, "pipeline finished");
    Ok(summary)
}
