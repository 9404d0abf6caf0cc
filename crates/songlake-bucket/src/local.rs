use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::{BucketError, BucketStore};

/// Filesystem-backed store rooted at a directory. Keys map to relative paths.
#[derive(Debug, Clone)]
pub struct LocalBucketStore {
    root: PathBuf,
}

impl LocalBucketStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    fn io_error(path: &Path, source: std::io::Error) -> BucketError {
        BucketError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Removes now-empty directories between `dir` and the store root.
    async fn prune_empty_dirs(&self, mut dir: PathBuf) {
        while dir.starts_with(&self.root) && dir != self.root {
            if tokio::fs::remove_dir(&dir).await.is_err() {
                break;
            }
            if !dir.pop() {
                break;
            }
        }
    }
}

#[async_trait]
impl BucketStore for LocalBucketStore {
    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), BucketError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| Self::io_error(parent, err))?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|err| Self::io_error(&path, err))
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, BucketError> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(BucketError::NotFound(key.to_string()))
            }
            Err(err) => Err(Self::io_error(&path, err)),
        }
    }

    async fn delete_object(&self, key: &str) -> Result<(), BucketError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(Self::io_error(&path, err)),
        }
        if let Some(parent) = path.parent() {
            self.prune_empty_dirs(parent.to_path_buf()).await;
        }
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, BucketError> {
        // Walk only the directory that the prefix fully names.
        let base_key = match prefix.rfind('/') {
            Some(idx) => &prefix[..idx],
            None => "",
        };
        let base = self.path_for(base_key);

        let mut keys = Vec::new();
        let mut pending = vec![(base, base_key.trim_matches('/').to_string())];

        while let Some((dir, dir_key)) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(Self::io_error(&dir, err)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|err| Self::io_error(&dir, err))?
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                let key = if dir_key.is_empty() {
                    name
                } else {
                    format!("{dir_key}/{name}")
                };
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|err| Self::io_error(&entry.path(), err))?;

                if file_type.is_dir() {
                    pending.push((entry.path(), key));
                } else if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        debug!(root = %self.root.display(), prefix, count = keys.len(), "listed objects");
        keys.sort();
        Ok(keys)
    }
}
