use bytes::Bytes;
use songlake_bucket::{BucketError, BucketStore, S3BucketStore, S3Config};
use uuid::Uuid;

const REQUIRED_VARS: &[&str] = &[
    "SONGLAKE_TEST_S3_BUCKET",
    "SONGLAKE_TEST_S3_ENDPOINT",
    "SONGLAKE_TEST_S3_ACCESS_KEY_ID",
    "SONGLAKE_TEST_S3_SECRET_ACCESS_KEY",
];

fn config_from_env() -> Option<S3Config> {
    for &var in REQUIRED_VARS {
        if std::env::var(var)
            .ok()
            .filter(|value| !value.is_empty())
            .is_none()
        {
            return None;
        }
    }

    let mut config = S3Config {
        bucket: std::env::var("SONGLAKE_TEST_S3_BUCKET").ok()?,
        endpoint: std::env::var("SONGLAKE_TEST_S3_ENDPOINT").ok(),
        access_key_id: std::env::var("SONGLAKE_TEST_S3_ACCESS_KEY_ID").ok(),
        secret_access_key: std::env::var("SONGLAKE_TEST_S3_SECRET_ACCESS_KEY").ok(),
        force_path_style: true,
        ..S3Config::default()
    };
    if let Ok(region) = std::env::var("SONGLAKE_TEST_S3_REGION") {
        config.region = region;
    }
    Some(config)
}

#[tokio::test]
async fn s3_store_round_trips_objects() -> Result<(), BucketError> {
    let Some(config) = config_from_env() else {
        eprintln!(
            "Skipping S3 bucket store test; set {} to enable",
            REQUIRED_VARS.join(", ")
        );
        return Ok(());
    };

    let store = S3BucketStore::new(config).await?;
    let prefix = format!("songlake-test/{}/", Uuid::new_v4());
    let key = format!("{prefix}year=2018/part-00000.parquet");

    store
        .put_object(&key, Bytes::from_static(b"songlake"), "application/octet-stream")
        .await?;

    let listed = store.list_objects(&prefix).await?;
    assert_eq!(listed, vec![key.clone()]);

    let body = store.get_object(&key).await?;
    assert_eq!(body.as_ref(), b"songlake");

    store.delete_object(&key).await?;
    assert!(store.list_objects(&prefix).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn empty_bucket_name_is_rejected() {
    let result = S3BucketStore::new(S3Config::default()).await;
    assert!(matches!(result, Err(BucketError::Configuration(_))));
}
