use polars::prelude::*;
use songlake_core::ingest::parse_json_records;
use songlake_core::schema::song_record_schema;
use songlake_core::songs::build_song_tables;

const RECORDS: &str = r#"{"num_songs": 1, "artist_id": "A1", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Test Artist", "song_id": "S1", "title": "Test", "duration": 200.0, "year": 2000}
{"num_songs": 1, "artist_id": "A1", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Test Artist", "song_id": "S3", "title": "Test Again", "duration": 99.5, "year": 0}
"#;

#[test]
fn dimensions_project_record_fields() -> PolarsResult<()> {
    let records = parse_json_records(RECORDS.as_bytes(), song_record_schema())?;
    let tables = build_song_tables(&records)?;

    assert_eq!(
        tables.songs.get_column_names_str(),
        vec!["song_id", "title", "artist_id", "year", "duration"]
    );
    let years: Vec<Option<i64>> = tables.songs.column("year")?.i64()?.into_iter().collect();
    assert_eq!(years, vec![Some(2000), Some(0)]);
    let durations: Vec<Option<f64>> = tables.songs.column("duration")?.f64()?.into_iter().collect();
    assert_eq!(durations, vec![Some(200.0), Some(99.5)]);

    assert_eq!(
        tables.artists.get_column_names_str(),
        vec![
            "artist_id",
            "artist_name",
            "artist_location",
            "artist_latitude",
            "artist_longitude"
        ]
    );
    Ok(())
}

#[test]
fn artists_are_not_deduplicated() -> PolarsResult<()> {
    let records = parse_json_records(RECORDS.as_bytes(), song_record_schema())?;
    let tables = build_song_tables(&records)?;

    assert_eq!(tables.artists.height(), 2);
    let locations = tables.artists.column("artist_location")?.str()?;
    assert_eq!(locations.get(0), Some(""));
    assert_eq!(tables.artists.column("artist_latitude")?.null_count(), 2);
    Ok(())
}
