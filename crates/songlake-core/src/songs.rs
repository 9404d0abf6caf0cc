use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::ingest::load_json_records;
use crate::schema::{
    song_record_schema, ARTISTS_TABLE, ARTIST_COLUMNS, SONGS_TABLE, SONG_COLUMNS, SONG_DATA_GLOB,
};
use crate::session::Session;
use crate::tables::{write_table, TableWriteReport};

#[derive(Debug, Clone)]
pub struct SongTables {
    pub songs: DataFrame,
    pub artists: DataFrame,
}

#[derive(Debug, Clone, Serialize)]
pub struct SongDataReport {
    pub records: usize,
    pub songs: TableWriteReport,
    pub artists: TableWriteReport,
}

/// Projects the songs and artists dimensions out of raw song records. Rows pass through
/// unchanged; nothing is filtered or deduplicated.
pub fn build_song_tables(records: &DataFrame) -> PolarsResult<SongTables> {
    let songs = records
        .clone()
        .lazy()
        .select(SONG_COLUMNS.map(col))
        .collect()?;
    let artists = records
        .clone()
        .lazy()
        .select(ARTIST_COLUMNS.map(col))
        .collect()?;
    Ok(SongTables { songs, artists })
}

/// Loads `song_data/` from the input root and rewrites `song.parquet` and `artists.parquet`.
pub async fn process_song_data(session: &Session) -> Result<SongDataReport> {
    info!("processing song data");
    let records = load_json_records(&session.input, SONG_DATA_GLOB, song_record_schema()).await?;
    debug!(preview = %records.head(Some(5)), "song data loaded");

    let tables = build_song_tables(&records)?;
    let songs = write_table(&session.output, &SONGS_TABLE, &tables.songs).await?;
    let artists = write_table(&session.output, &ARTISTS_TABLE, &tables.artists).await?;

    Ok(SongDataReport {
        records: records.height(),
        songs,
        artists,
    })
}
