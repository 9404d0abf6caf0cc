use std::fmt;
use std::path::{Path, PathBuf};

use ini::Ini;

use crate::error::{EtlError, Result};

pub const AWS_SECTION: &str = "AWS";
pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";

const SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
const REGION: &str = "AWS_REGION";
const ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";
const FORCE_PATH_STYLE: &str = "AWS_FORCE_PATH_STYLE";

pub const DEFAULT_REGION: &str = "us-west-2";

#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Connection settings for S3-compatible storage, shared by every bucket the run touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Settings {
    pub region: String,
    pub endpoint: Option<String>,
    pub force_path_style: bool,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            force_path_style: false,
        }
    }
}

/// Everything the bootstrap needs, built once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub credentials: AwsCredentials,
    pub s3: S3Settings,
}

impl EtlConfig {
    /// Reads the `[AWS]` section of an INI file such as `dl.cfg`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(EtlError::Config(format!(
                "configuration file {} does not exist",
                path.display()
            )));
        }
        let ini = Ini::load_from_file(path)?;
        Self::from_ini(&ini)
    }

    pub fn from_ini_str(contents: &str) -> Result<Self> {
        let ini = Ini::load_from_str(contents).map_err(|err| EtlError::Config(err.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self> {
        let section = ini.section(Some(AWS_SECTION)).ok_or_else(|| {
            EtlError::Config(format!("missing [{AWS_SECTION}] section"))
        })?;

        let required = |key: &str| -> Result<String> {
            section
                .get(key)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .ok_or_else(|| EtlError::Config(format!("[{AWS_SECTION}] {key} is not set")))
        };
        let optional = |key: &str| -> Option<String> {
            section
                .get(key)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let credentials = AwsCredentials {
            access_key_id: required(ACCESS_KEY_ID)?,
            secret_access_key: required(SECRET_ACCESS_KEY)?,
            session_token: optional(SESSION_TOKEN),
        };

        let force_path_style = match optional(FORCE_PATH_STYLE) {
            None => false,
            Some(value) => parse_bool(&value).ok_or_else(|| {
                EtlError::Config(format!(
                    "[{AWS_SECTION}] {FORCE_PATH_STYLE} must be true or false, got '{value}'"
                ))
            })?,
        };

        let s3 = S3Settings {
            region: optional(REGION).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint: optional(ENDPOINT_URL),
            force_path_style,
        };

        Ok(Self { credentials, s3 })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Where a dataset root lives: an S3 bucket prefix or a local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    S3 { bucket: String, prefix: String },
    Local(PathBuf),
}

impl StorageLocation {
    /// Accepts `s3://`, `s3a://` (any case) and plain or `file://` paths. An empty string is
    /// the current directory.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();

        for scheme in ["s3a://", "s3://"] {
            if lower.starts_with(scheme) {
                let rest = &trimmed[scheme.len()..];
                let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
                if bucket.is_empty() {
                    return Err(EtlError::InvalidLocation {
                        location: raw.to_string(),
                        reason: "missing bucket name".into(),
                    });
                }
                return Ok(StorageLocation::S3 {
                    bucket: bucket.to_string(),
                    prefix: normalize_prefix(prefix),
                });
            }
        }

        if let Some((scheme, _)) = trimmed.split_once("://") {
            if scheme != "file" {
                return Err(EtlError::InvalidLocation {
                    location: raw.to_string(),
                    reason: format!("unsupported scheme '{scheme}'"),
                });
            }
        }

        let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
        if path.is_empty() {
            Ok(StorageLocation::Local(PathBuf::from(".")))
        } else {
            Ok(StorageLocation::Local(PathBuf::from(path)))
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::S3 { bucket, prefix } => write!(f, "s3://{bucket}/{prefix}"),
            StorageLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Trims leading slashes and guarantees a trailing one on non-empty prefixes.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_s3a_root_with_trailing_slash() {
        let location = StorageLocation::parse("s3a://udacity-dend/").unwrap();
        assert_eq!(
            location,
            StorageLocation::S3 {
                bucket: "udacity-dend".into(),
                prefix: String::new()
            }
        );
    }

    #[test]
    fn parses_s3_prefix() {
        let location = StorageLocation::parse("S3://lake/star/schema").unwrap();
        assert_eq!(
            location,
            StorageLocation::S3 {
                bucket: "lake".into(),
                prefix: "star/schema/".into()
            }
        );
    }

    #[test]
    fn empty_and_file_paths_are_local() {
        assert_eq!(
            StorageLocation::parse("").unwrap(),
            StorageLocation::Local(PathBuf::from("."))
        );
        assert_eq!(
            StorageLocation::parse("file:///tmp/out").unwrap(),
            StorageLocation::Local(PathBuf::from("/tmp/out"))
        );
    }

    #[test]
    fn rejects_unknown_scheme_and_missing_bucket() {
        assert!(matches!(
            StorageLocation::parse("gs://bucket/"),
            Err(EtlError::InvalidLocation { .. })
        ));
        assert!(matches!(
            StorageLocation::parse("s3a:///prefix"),
            Err(EtlError::InvalidLocation { .. })
        ));
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let creds = AwsCredentials {
            access_key_id: "AKIA".into(),
            secret_access_key: "very-secret".into(),
            session_token: None,
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("AKIA"));
        assert!(!rendered.contains("very-secret"));
    }
}
