use std::collections::HashMap;
use std::sync::Arc;

use songlake_bucket::{BucketStore, LocalBucketStore, S3BucketStore, S3Config};
use tracing::info;

use crate::config::{EtlConfig, StorageLocation};
use crate::dataset::Dataset;
use crate::error::Result;

/// Live storage handles for one pipeline run.
#[derive(Debug, Clone)]
pub struct Session {
    pub input: Dataset,
    pub output: Dataset,
}

impl Session {
    /// Connects to the input and output roots. S3 roots share one client per bucket and use the
    /// credentials from `config`; nothing is read from or written to the process environment.
    pub async fn bootstrap(
        config: &EtlConfig,
        input: &StorageLocation,
        output: &StorageLocation,
    ) -> Result<Self> {
        let mut clients: HashMap<String, Arc<dyn BucketStore>> = HashMap::new();

        let input = open_dataset(config, input, &mut clients).await?;
        let output = open_dataset(config, output, &mut clients).await?;

        info!(input = %input.location(), output = %output.location(), "session ready");
        Ok(Self { input, output })
    }

    /// Session over datasets the caller has already opened, e.g. two prefixes of one store.
    pub fn from_datasets(input: Dataset, output: Dataset) -> Self {
        Self { input, output }
    }
}

async fn open_dataset(
    config: &EtlConfig,
    location: &StorageLocation,
    clients: &mut HashMap<String, Arc<dyn BucketStore>>,
) -> Result<Dataset> {
    match location {
        StorageLocation::S3 { bucket, prefix } => {
            let store = match clients.get(bucket) {
                Some(store) => Arc::clone(store),
                None => {
                    let store: Arc<dyn BucketStore> =
                        Arc::new(S3BucketStore::new(s3_config(config, bucket)).await?);
                    clients.insert(bucket.clone(), Arc::clone(&store));
                    store
                }
            };
            Ok(Dataset::new(store, prefix.clone(), location.clone()))
        }
        StorageLocation::Local(path) => {
            let store: Arc<dyn BucketStore> = Arc::new(LocalBucketStore::new(path.clone()));
            Ok(Dataset::new(store, String::new(), location.clone()))
        }
    }
}

fn s3_config(config: &EtlConfig, bucket: &str) -> S3Config {
    S3Config {
        bucket: bucket.to_string(),
        region: config.s3.region.clone(),
        endpoint: config.s3.endpoint.clone(),
        access_key_id: Some(config.credentials.access_key_id.clone()),
        secret_access_key: Some(config.credentials.secret_access_key.clone()),
        session_token: config.credentials.session_token.clone(),
        force_path_style: config.s3.force_path_style,
    }
}
