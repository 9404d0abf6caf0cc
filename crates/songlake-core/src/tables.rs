//! Hive-style partitioned Parquet tables on a [`Dataset`].
//!
//! A table named `time.parquet` partitioned by `(year, month)` is laid out as
//! `time.parquet/year=2018/month=11/part-00000.parquet`. Partition columns are encoded in the
//! path only, not stored inside the files, and are restored when a table is read back.

use std::io::Cursor;

use bytes::Bytes;
use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{EtlError, Result};
use crate::schema::TableSpec;

pub const SUCCESS_MARKER: &str = "_SUCCESS";
pub const NULL_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

const PARQUET_CONTENT_TYPE: &str = "application/vnd.apache.parquet";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableWriteReport {
    pub table: &'static str,
    pub rows: usize,
    pub files: usize,
    pub replaced_objects: usize,
}

/// Replaces whatever is stored under `spec.name` with `df`.
///
/// The previous contents are removed before anything new is written, so a failure part way
/// leaves the table empty or partially written.
pub async fn write_table(dataset: &Dataset, spec: &TableSpec, df: &DataFrame) -> Result<TableWriteReport> {
    let replaced_objects = dataset.remove_dir(spec.name).await?;

    let files = if spec.partition_by.is_empty() {
        let bytes = create_parquet_bytes(df)?;
        dataset
            .put(&part_key(spec, None, 0), bytes, PARQUET_CONTENT_TYPE)
            .await?;
        1
    } else if df.height() == 0 {
        0
    } else {
        let parts = df.partition_by_stable(spec.partition_by.iter().copied(), true)?;
        for (index, part) in parts.iter().enumerate() {
            let directory = partition_directory(part, spec.partition_by)?;
            let payload = part.select(data_columns(part, spec.partition_by))?;
            let bytes = create_parquet_bytes(&payload)?;
            dataset
                .put(&part_key(spec, Some(&directory), index), bytes, PARQUET_CONTENT_TYPE)
                .await?;
        }
        parts.len()
    };

    dataset
        .put(
            &format!("{}/{SUCCESS_MARKER}", spec.name),
            Bytes::new(),
            "application/octet-stream",
        )
        .await?;

    let report = TableWriteReport {
        table: spec.name,
        rows: df.height(),
        files,
        replaced_objects,
    };
    info!(
        table = spec.name,
        rows = report.rows,
        files = report.files,
        replaced = report.replaced_objects,
        "table written"
    );
    Ok(report)
}

/// Reads a table back, restoring partition columns with the types of the table's schema.
/// Columns are returned in schema order.
pub async fn read_table(dataset: &Dataset, spec: &TableSpec) -> Result<DataFrame> {
    let keys = dataset.list_dir(spec.name).await?;
    if keys.is_empty() {
        return Err(EtlError::MissingTable(spec.name.to_string()));
    }

    let schema = (spec.schema)();
    let names: Vec<PlSmallStr> = schema.iter_names().cloned().collect();
    let mut combined = DataFrame::empty_with_schema(&schema);

    for key in keys.iter().filter(|key| key.ends_with(".parquet")) {
        let bytes = dataset.get(key).await?;
        let mut part = ParquetReader::new(Cursor::new(&bytes[..])).finish()?;
        let height = part.height();

        let partition_values = parse_partition_path(spec.name, key);
        for column in spec.partition_by {
            let dtype = schema.get(column).cloned().unwrap_or(DataType::String);
            let value = partition_values
                .iter()
                .find(|(name, _)| name == column)
                .and_then(|(_, value)| value.as_deref());
            let series = match value {
                Some(value) => Series::new((*column).into(), vec![value; height]).strict_cast(&dtype)?,
                None => Series::full_null((*column).into(), height, &dtype),
            };
            part.with_column(series)?;
        }

        let part = part.select(names.clone())?;
        debug!(key = %key, rows = part.height(), "read table part");
        combined.vstack_mut(&part)?;
    }

    info!(table = spec.name, rows = combined.height(), "table read back");
    Ok(combined)
}

fn create_parquet_bytes(df: &DataFrame) -> Result<Bytes> {
    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let mut clone = df.clone();
        ParquetWriter::new(&mut cursor)
            .with_compression(ParquetCompression::Zstd(None))
            .with_statistics(StatisticsOptions::default())
            .finish(&mut clone)?;
    }
    Ok(Bytes::from(buffer))
}

fn part_key(spec: &TableSpec, directory: Option<&str>, index: usize) -> String {
    match directory {
        Some(directory) => format!("{}/{directory}/part-{index:05}.parquet", spec.name),
        None => format!("{}/part-{index:05}.parquet", spec.name),
    }
}

fn data_columns(df: &DataFrame, partition_by: &[&str]) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .filter(|name| !partition_by.contains(&name.as_str()))
        .map(|name| name.to_string())
        .collect()
}

/// `year=2018/month=11` for a frame whose partition columns hold a single value each.
fn partition_directory(part: &DataFrame, partition_by: &[&str]) -> Result<String> {
    let mut segments = Vec::with_capacity(partition_by.len());
    for column in partition_by {
        let value = part.column(column)?.get(0)?;
        let rendered = match value {
            AnyValue::Null => NULL_PARTITION.to_string(),
            AnyValue::String(text) => escape_partition_value(text),
            AnyValue::StringOwned(text) => escape_partition_value(text.as_str()),
            other => escape_partition_value(&other.to_string()),
        };
        segments.push(format!("{column}={rendered}"));
    }
    Ok(segments.join("/"))
}

/// Pulls `(column, value)` pairs out of the directories between the table root and the file.
/// [`NULL_PARTITION`] decodes to `None`.
fn parse_partition_path(table: &str, key: &str) -> Vec<(String, Option<String>)> {
    let relative = key
        .strip_prefix(table)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(key);
    let mut segments: Vec<&str> = relative.split('/').collect();
    segments.pop();

    segments
        .into_iter()
        .filter_map(|segment| segment.split_once('='))
        .map(|(name, value)| {
            let value = if value == NULL_PARTITION {
                None
            } else {
                Some(unescape_partition_value(value))
            };
            (unescape_partition_value(name), value)
        })
        .collect()
}

fn needs_escape(c: char) -> bool {
    c.is_ascii_control()
        || matches!(
            c,
            '"' | '#' | '%' | '\'' | '*' | '/' | ':' | '=' | '?' | '\\' | '{' | '[' | ']' | '^'
        )
}

fn escape_partition_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            escaped.push_str(&format!("%{:02X}", c as u32));
        } else {
            escaped.push(c);
        }
    }
    escaped
}

fn unescape_partition_value(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' && index + 2 < bytes.len() {
            let decoded_byte = std::str::from_utf8(&bytes[index + 1..index + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = decoded_byte {
                decoded.push(byte);
                index += 3;
                continue;
            }
        }
        decoded.push(bytes[index]);
        index += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}
