use std::io::Cursor;

use futures::stream::{self, StreamExt, TryStreamExt};
use polars::prelude::*;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{EtlError, Result};

/// Objects fetched at once while loading.
const CONCURRENT_FETCHES: usize = 32;

/// Reads every object under `dataset` matching `pattern` as newline-delimited JSON with a fixed
/// schema and stacks them into one frame, in key order. Fields missing from a record come back
/// null; a record that is not valid JSON fails the whole load.
pub async fn load_json_records(
    dataset: &Dataset,
    pattern: &str,
    schema: SchemaRef,
) -> Result<DataFrame> {
    let keys = dataset.glob(pattern).await?;
    info!(root = %dataset.location(), pattern, files = keys.len(), "loading JSON records");

    let frames: Vec<DataFrame> = stream::iter(keys)
        .map(|key| {
            let schema = schema.clone();
            async move {
                let bytes = dataset.get(&key).await?;
                let frame = parse_json_records(&bytes, schema)
                    .map_err(|source| EtlError::Load { key: key.clone(), source })?;
                debug!(key = %key, rows = frame.height(), "parsed object");
                Ok::<_, EtlError>(frame)
            }
        })
        .buffered(CONCURRENT_FETCHES)
        .try_collect()
        .await?;

    let mut combined = DataFrame::empty_with_schema(&schema);
    for frame in &frames {
        combined.vstack_mut(frame)?;
    }
    combined.rechunk_mut();

    info!(pattern, rows = combined.height(), "records loaded");
    Ok(combined)
}

/// Parses one object holding one JSON record per line; a file with a single one-line record is
/// the common case for song metadata.
pub fn parse_json_records(bytes: &[u8], schema: SchemaRef) -> PolarsResult<DataFrame> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(DataFrame::empty_with_schema(&schema));
    }

    let names: Vec<PlSmallStr> = schema.iter_names().cloned().collect();
    JsonReader::new(Cursor::new(bytes))
        .with_json_format(JsonFormat::JsonLines)
        .with_schema(schema)
        .finish()?
        .select(names)
}
