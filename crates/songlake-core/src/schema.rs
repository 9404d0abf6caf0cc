use polars::prelude::{DataType, Field, Schema, SchemaRef, TimeUnit};
use std::sync::Arc;

pub const SONG_DATA_GLOB: &str = "song_data/*/*/*/*.json";
pub const LOG_DATA_GLOB: &str = "log_data/*/*/*.json";

/// An output table: the directory it is written to, the columns it is partitioned by and the
/// full column layout used when reading it back.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub partition_by: &'static [&'static str],
    pub schema: fn() -> SchemaRef,
}

pub const SONGS_TABLE: TableSpec = TableSpec {
    name: "song.parquet",
    partition_by: &["year", "artist_id"],
    schema: songs_dimension_schema,
};

pub const ARTISTS_TABLE: TableSpec = TableSpec {
    name: "artists.parquet",
    partition_by: &[],
    schema: artists_dimension_schema,
};

pub const USERS_TABLE: TableSpec = TableSpec {
    name: "user.parquet",
    partition_by: &[],
    schema: users_dimension_schema,
};

pub const TIME_TABLE: TableSpec = TableSpec {
    name: "time.parquet",
    partition_by: &["year", "month"],
    schema: time_dimension_schema,
};

pub const SONGPLAYS_TABLE: TableSpec = TableSpec {
    name: "songplays.parquet",
    partition_by: &["year", "month"],
    schema: songplays_fact_schema,
};

pub const SONG_COLUMNS: [&str; 5] = ["song_id", "title", "artist_id", "year", "duration"];

pub const ARTIST_COLUMNS: [&str; 5] = [
    "artist_id",
    "artist_name",
    "artist_location",
    "artist_latitude",
    "artist_longitude",
];

pub const NEXT_SONG_PAGE: &str = "NextSong";

fn schema(fields: Vec<(&str, DataType)>) -> SchemaRef {
    Arc::new(Schema::from_iter(
        fields
            .into_iter()
            .map(|(name, dtype)| Field::new(name.into(), dtype)),
    ))
}

/// Song metadata records; the artist fields ride along in the same object.
pub fn song_record_schema() -> SchemaRef {
    schema(vec![
        ("num_songs", DataType::Int64),
        ("song_id", DataType::String),
        ("title", DataType::String),
        ("artist_id", DataType::String),
        ("year", DataType::Int64),
        ("duration", DataType::Float64),
        ("artist_name", DataType::String),
        ("artist_location", DataType::String),
        ("artist_latitude", DataType::Float64),
        ("artist_longitude", DataType::Float64),
    ])
}

/// App events. Only the columns the star schema uses are read.
pub fn log_event_schema() -> SchemaRef {
    schema(vec![
        ("firstName", DataType::String),
        ("gender", DataType::String),
        ("lastName", DataType::String),
        ("level", DataType::String),
        ("location", DataType::String),
        ("page", DataType::String),
        ("sessionId", DataType::Int64),
        ("song", DataType::String),
        ("ts", DataType::Int64),
        ("userAgent", DataType::String),
        ("userId", DataType::String),
    ])
}

/// The songs dimension as it comes back from storage, partition columns included.
pub fn songs_dimension_schema() -> SchemaRef {
    schema(vec![
        ("song_id", DataType::String),
        ("title", DataType::String),
        ("artist_id", DataType::String),
        ("year", DataType::Int64),
        ("duration", DataType::Float64),
    ])
}

pub fn artists_dimension_schema() -> SchemaRef {
    schema(vec![
        ("artist_id", DataType::String),
        ("artist_name", DataType::String),
        ("artist_location", DataType::String),
        ("artist_latitude", DataType::Float64),
        ("artist_longitude", DataType::Float64),
    ])
}

pub fn users_dimension_schema() -> SchemaRef {
    schema(vec![
        ("user_id", DataType::String),
        ("first_name", DataType::String),
        ("last_name", DataType::String),
        ("gender", DataType::String),
        ("level", DataType::String),
    ])
}

pub fn time_dimension_schema() -> SchemaRef {
    schema(vec![
        ("start_time", start_time_dtype()),
        ("hour", DataType::Int32),
        ("day", DataType::Int32),
        ("week", DataType::Int32),
        ("month", DataType::Int32),
        ("year", DataType::Int32),
        ("weekday", DataType::Int32),
    ])
}

pub fn songplays_fact_schema() -> SchemaRef {
    schema(vec![
        ("songplay_id", DataType::Int64),
        ("user_id", DataType::String),
        ("level", DataType::String),
        ("song_id", DataType::String),
        ("artist_id", DataType::String),
        ("session_id", DataType::Int64),
        ("location", DataType::String),
        ("user_agent", DataType::String),
        ("year", DataType::Int32),
        ("month", DataType::Int32),
    ])
}

pub fn start_time_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, None)
}
