//! Destination and source URL grammar.
//!
//! Accepted forms:
//! - `s3://bucket/key`
//! - `https://bucket.s3.amazonaws.com/key`, `https://bucket.s3.<region>.amazonaws.com/key`
//!   and the legacy dash form `https://bucket.s3-<region>.amazonaws.com/key`
//! - `gs://bucket/key`
//! - `https://storage.cloud.google.com/bucket/key`
//! - anything else is a local filesystem path

use std::path::{Path, PathBuf};

use crate::config::DEFAULT_AWS_REGION;
use crate::core::error::{T2SError, T2SResult};

const S3_SCHEME: &str = "s3://";
const GCS_SCHEME: &str = "gs://";
const HTTPS_SCHEME: &str = "https://";
const AWS_HOST_SUFFIX: &str = ".amazonaws.com";
const GCS_BROWSER_HOSTS: [&str; 2] = ["storage.cloud.google.com", "storage.googleapis.com"];

/// A parsed storage location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    Aws {
        bucket: String,
        key: String,
        region: String,
    },
    Google {
        bucket: String,
        key: String,
    },
    Local(PathBuf),
}

/// True for `s3://` URLs and virtual-hosted S3 `https://` URLs.
pub fn is_aws_url(url: &str) -> bool {
    if url.starts_with(S3_SCHEME) {
        return true;
    }
    url.strip_prefix(HTTPS_SCHEME)
        .map(host_of)
        .is_some_and(|host| s3_host_parts(host).is_some())
}

/// True for `gs://` URLs and GCS browser `https://` URLs.
pub fn is_google_url(url: &str) -> bool {
    if url.starts_with(GCS_SCHEME) {
        return true;
    }
    url.strip_prefix(HTTPS_SCHEME)
        .map(host_of)
        .is_some_and(|host| GCS_BROWSER_HOSTS.contains(&host))
}

/// True for any cloud storage URL understood by this crate.
pub fn is_cloud_url(url: &str) -> bool {
    is_aws_url(url) || is_google_url(url)
}

fn host_of(rest: &str) -> &str {
    rest.split('/').next().unwrap_or(rest)
}

/// Split an S3 virtual-hosted host into `(bucket, region)`.
fn s3_host_parts(host: &str) -> Option<(&str, Option<&str>)> {
    let host = host.strip_suffix(AWS_HOST_SUFFIX)?;
    let (bucket, rest) = host
        .find(".s3.")
        .map(|idx| (&host[..idx], &host[idx + 4..]))
        .or_else(|| host.find(".s3-").map(|idx| (&host[..idx], &host[idx + 4..])))
        .or_else(|| host.strip_suffix(".s3").map(|bucket| (bucket, "")))?;
    if bucket.is_empty() {
        return None;
    }
    let region = Some(rest).filter(|r| !r.is_empty());
    Some((bucket, region))
}

fn split_bucket_key<'a>(path: &'a str, url: &str) -> T2SResult<(&'a str, &'a str)> {
    let (bucket, key) = path
        .split_once('/')
        .ok_or_else(|| T2SError::Validation(format!("Storage URL has no object key: {url}")))?;
    if bucket.is_empty() {
        return Err(T2SError::Validation(format!(
            "Storage URL has no bucket: {url}"
        )));
    }
    if key.is_empty() {
        return Err(T2SError::Validation(format!(
            "Storage URL has no object key: {url}"
        )));
    }
    Ok((bucket, key))
}

impl StorageLocation {
    /// Parse a destination or source string.
    ///
    /// Cloud URLs without a bucket or key are rejected; any string that is not
    /// a recognised cloud URL is taken as a local path.
    pub fn parse(url: &str) -> T2SResult<Self> {
        if let Some(rest) = url.strip_prefix(S3_SCHEME) {
            let (bucket, key) = split_bucket_key(rest, url)?;
            return Ok(Self::Aws {
                bucket: bucket.to_string(),
                key: key.to_string(),
                region: DEFAULT_AWS_REGION.to_string(),
            });
        }

        if let Some(rest) = url.strip_prefix(GCS_SCHEME) {
            let (bucket, key) = split_bucket_key(rest, url)?;
            return Ok(Self::Google {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        if let Some(rest) = url.strip_prefix(HTTPS_SCHEME) {
            let host = host_of(rest);
            let path = rest[host.len()..].trim_start_matches('/');

            if let Some((bucket, region)) = s3_host_parts(host) {
                if path.is_empty() {
                    return Err(T2SError::Validation(format!(
                        "Storage URL has no object key: {url}"
                    )));
                }
                return Ok(Self::Aws {
                    bucket: bucket.to_string(),
                    key: path.to_string(),
                    region: region.unwrap_or(DEFAULT_AWS_REGION).to_string(),
                });
            }

            if GCS_BROWSER_HOSTS.contains(&host) {
                let (bucket, key) = split_bucket_key(path, url)?;
                return Ok(Self::Google {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                });
            }
        }

        Ok(Self::Local(PathBuf::from(url)))
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// The object key or local path as text.
    pub fn key(&self) -> String {
        match self {
            Self::Aws { key, .. } | Self::Google { key, .. } => key.clone(),
            Self::Local(path) => path.display().to_string(),
        }
    }

    /// The last path segment, used to name staged copies.
    pub fn file_name(&self) -> String {
        let key = self.key();
        Path::new(&key)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or(key)
    }
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aws { bucket, key, .. } => write!(f, "s3://{bucket}/{key}"),
            Self::Google { bucket, key } => write!(f, "gs://{bucket}/{key}"),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}
