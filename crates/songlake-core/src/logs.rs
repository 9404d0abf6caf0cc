use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::ingest::load_json_records;
use crate::schema::{
    log_event_schema, LOG_DATA_GLOB, NEXT_SONG_PAGE, SONGPLAYS_TABLE, SONGS_TABLE, TIME_TABLE,
    USERS_TABLE,
};
use crate::session::Session;
use crate::tables::{read_table, write_table, TableWriteReport};
use crate::timestamps::{calendar_columns, month_expr, start_time_expr, year_expr};

#[derive(Debug, Clone)]
pub struct LogTables {
    pub users: DataFrame,
    pub time: DataFrame,
    pub songplays: DataFrame,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogDataReport {
    pub events: usize,
    pub song_plays: usize,
    pub users: TableWriteReport,
    pub time: TableWriteReport,
    pub songplays: TableWriteReport,
}

/// Keeps only `NextSong` events and attaches the derived `start_time`.
pub fn song_plays(events: &DataFrame) -> PolarsResult<DataFrame> {
    events
        .clone()
        .lazy()
        .filter(col("page").eq(lit(NEXT_SONG_PAGE)))
        .with_column(start_time_expr(col("ts")).alias("start_time"))
        .collect()
}

/// One row per play; a user appears as often as they played something.
pub fn users_table(plays: &DataFrame) -> PolarsResult<DataFrame> {
    plays
        .clone()
        .lazy()
        .select([
            col("userId").alias("user_id"),
            col("firstName").alias("first_name"),
            col("lastName").alias("last_name"),
            col("gender"),
            col("level"),
        ])
        .collect()
}

/// One row per distinct `start_time`, first occurrence wins.
pub fn time_table(plays: &DataFrame) -> PolarsResult<DataFrame> {
    let mut columns = vec![col("start_time")];
    columns.extend(calendar_columns(col("start_time")));

    plays
        .clone()
        .lazy()
        .select(columns)
        .unique_stable(Some(vec!["start_time".into()]), UniqueKeepStrategy::First)
        .collect()
}

/// Joins plays to the songs dimension on `song == title`. Plays whose title has no match are
/// dropped; a title shared by several songs yields one row per matching song.
pub fn songplays_table(plays: &DataFrame, songs: &DataFrame) -> PolarsResult<DataFrame> {
    let songs = songs
        .clone()
        .lazy()
        .select([col("title"), col("song_id"), col("artist_id")]);

    plays
        .clone()
        .lazy()
        .join(
            songs,
            [col("song")],
            [col("title")],
            JoinArgs::new(JoinType::Inner),
        )
        .select([
            col("userId").alias("user_id"),
            col("level"),
            col("song_id"),
            col("artist_id"),
            col("sessionId").alias("session_id"),
            col("location"),
            col("userAgent").alias("user_agent"),
            year_expr(col("start_time")),
            month_expr(col("start_time")),
        ])
        .with_row_index("songplay_id", None)
        .with_column(col("songplay_id").cast(DataType::Int64))
        .collect()
}

/// All three log-derived tables from raw events and an already-built songs dimension.
pub fn build_log_tables(events: &DataFrame, songs: &DataFrame) -> PolarsResult<LogTables> {
    let plays = song_plays(events)?;
    Ok(LogTables {
        users: users_table(&plays)?,
        time: time_table(&plays)?,
        songplays: songplays_table(&plays, songs)?,
    })
}

/// Loads `log_data/`, rewrites `user.parquet` and `time.parquet`, then joins against the
/// `song.parquet` already on the output root and rewrites `songplays.parquet`.
pub async fn process_log_data(session: &Session) -> Result<LogDataReport> {
    info!("processing log data");
    let events = load_json_records(&session.input, LOG_DATA_GLOB, log_event_schema()).await?;

    let plays = song_plays(&events)?;
    info!(
        events = events.height(),
        plays = plays.height(),
        "filtered to {NEXT_SONG_PAGE} events"
    );

    let users = users_table(&plays)?;
    let users = write_table(&session.output, &USERS_TABLE, &users).await?;

    let time = time_table(&plays)?;
    let time = write_table(&session.output, &TIME_TABLE, &time).await?;

    let songs = read_table(&session.output, &SONGS_TABLE).await?;
    let songplays = songplays_table(&plays, &songs)?;
    debug!(preview = %songplays.head(Some(5)), "songplays built");
    let songplays = write_table(&session.output, &SONGPLAYS_TABLE, &songplays).await?;

    Ok(LogDataReport {
        events: events.height(),
        song_plays: plays.height(),
        users,
        time,
        songplays,
    })
}
