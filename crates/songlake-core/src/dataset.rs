use std::sync::Arc;

use bytes::Bytes;
use glob::{MatchOptions, Pattern};
use songlake_bucket::BucketStore;
use tracing::debug;

use crate::config::StorageLocation;
use crate::error::Result;

/// A storage root (bucket + key prefix) that paths inside the pipeline are relative to.
#[derive(Clone)]
pub struct Dataset {
    store: Arc<dyn BucketStore>,
    prefix: String,
    location: StorageLocation,
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("store", &self.store.describe())
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl Dataset {
    pub fn new(store: Arc<dyn BucketStore>, prefix: impl Into<String>, location: StorageLocation) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            location,
        }
    }

    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Absolute store key for a path relative to this root.
    pub fn key(&self, relative: &str) -> String {
        format!("{}{}", self.prefix, relative.trim_start_matches('/'))
    }

    /// Keys under this root matching a glob such as `song_data/*/*/*/*.json`, relative to
    /// the root. `*` never matches across a `/`, so directory depth is matched exactly.
    pub async fn glob(&self, pattern: &str) -> Result<Vec<String>> {
        let compiled = Pattern::new(pattern)?;
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };

        let listing_prefix = self.key(literal_prefix(pattern));
        let keys = self.store.list_objects(&listing_prefix).await?;

        let matched: Vec<String> = keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.prefix).map(str::to_string))
            .filter(|relative| compiled.matches_with(relative, options))
            .collect();

        debug!(
            root = %self.location,
            pattern,
            matched = matched.len(),
            "resolved glob"
        );
        Ok(matched)
    }

    pub async fn get(&self, relative: &str) -> Result<Bytes> {
        Ok(self.store.get_object(&self.key(relative)).await?)
    }

    pub async fn put(&self, relative: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        self.store
            .put_object(&self.key(relative), bytes, content_type)
            .await?;
        Ok(())
    }

    /// Relative keys of every object stored under `dir/`.
    pub async fn list_dir(&self, dir: &str) -> Result<Vec<String>> {
        let prefix = self.key(&format!("{}/", dir.trim_end_matches('/')));
        let keys = self.store.list_objects(&prefix).await?;
        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.prefix).map(str::to_string))
            .collect())
    }

    /// Deletes everything stored under `dir/`. Returns the number of objects removed.
    pub async fn remove_dir(&self, dir: &str) -> Result<usize> {
        let keys = self.list_dir(dir).await?;
        for relative in &keys {
            self.store.delete_object(&self.key(relative)).await?;
        }
        Ok(keys.len())
    }
}

/// The directory part of a glob before its first wildcard, e.g. `song_data/` for
/// `song_data/*/*/*/*.json`.
fn literal_prefix(pattern: &str) -> &str {
    let wildcard = pattern
        .find(['*', '?', '['])
        .unwrap_or(pattern.len());
    match pattern[..wildcard].rfind('/') {
        Some(idx) => &pattern[..=idx],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::literal_prefix;

    #[test]
    fn literal_prefix_stops_at_last_separator_before_wildcard() {
        assert_eq!(literal_prefix("song_data/*/*/*/*.json"), "song_data/");
        assert_eq!(literal_prefix("log_data/2018/*/*.json"), "log_data/2018/");
        assert_eq!(literal_prefix("*.json"), "");
        assert_eq!(literal_prefix("log_data/events.json"), "log_data/");
    }
}
