use std::io::Write;

use songlake_core::config::{EtlConfig, S3Settings, DEFAULT_REGION};
use songlake_core::EtlError;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_credentials_from_aws_section() {
    let file = config_file("[AWS]\nAWS_ACCESS_KEY_ID=AKIAEXAMPLE\nAWS_SECRET_ACCESS_KEY=wJalrXUtnFEMI\n");

    let config = EtlConfig::from_file(file.path()).expect("config should load");
    assert_eq!(config.credentials.access_key_id, "AKIAEXAMPLE");
    assert_eq!(config.credentials.secret_access_key, "wJalrXUtnFEMI");
    assert_eq!(config.credentials.session_token, None);
    assert_eq!(config.s3, S3Settings::default());
    assert_eq!(config.s3.region, DEFAULT_REGION);
}

#[test]
fn optional_keys_override_s3_settings() {
    let config = EtlConfig::from_ini_str(
        "[AWS]\n\
         AWS_ACCESS_KEY_ID = minio\n\
         AWS_SECRET_ACCESS_KEY = minio123\n\
         AWS_SESSION_TOKEN = token\n\
         AWS_REGION = eu-central-1\n\
         AWS_ENDPOINT_URL = http://localhost:9000\n\
         AWS_FORCE_PATH_STYLE = true\n",
    )
    .expect("config should parse");

    assert_eq!(config.credentials.access_key_id, "minio");
    assert_eq!(config.credentials.session_token.as_deref(), Some("token"));
    assert_eq!(
        config.s3,
        S3Settings {
            region: "eu-central-1".into(),
            endpoint: Some("http://localhost:9000".into()),
            force_path_style: true,
        }
    );
}

#[test]
fn missing_file_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = EtlConfig::from_file(dir.path().join("dl.cfg")).unwrap_err();
    assert!(matches!(err, EtlError::Config(message) if message.contains("does not exist")));
}

#[test]
fn missing_section_is_fatal() {
    let err = EtlConfig::from_ini_str("[S3]\nAWS_ACCESS_KEY_ID=a\nAWS_SECRET_ACCESS_KEY=b\n")
        .unwrap_err();
    assert!(matches!(err, EtlError::Config(message) if message.contains("[AWS]")));
}

#[test]
fn partial_credentials_are_rejected() {
    let err = EtlConfig::from_ini_str("[AWS]\nAWS_ACCESS_KEY_ID=a\n").unwrap_err();
    assert!(
        matches!(err, EtlError::Config(ref message) if message.contains("AWS_SECRET_ACCESS_KEY")),
        "unexpected error: {err}"
    );

    let err = EtlConfig::from_ini_str("[AWS]\nAWS_ACCESS_KEY_ID=\nAWS_SECRET_ACCESS_KEY=b\n")
        .unwrap_err();
    assert!(matches!(err, EtlError::Config(ref message) if message.contains("AWS_ACCESS_KEY_ID")));
}

#[test]
fn invalid_path_style_flag_is_rejected() {
    let err = EtlConfig::from_ini_str(
        "[AWS]\nAWS_ACCESS_KEY_ID=a\nAWS_SECRET_ACCESS_KEY=b\nAWS_FORCE_PATH_STYLE=sometimes\n",
    )
    .unwrap_err();
    assert!(matches!(err, EtlError::Config(ref message) if message.contains("AWS_FORCE_PATH_STYLE")));
}
