use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use tokio::fs;
use tracing::{debug, info};

use receipt_domain::{scratch_path, ObjectFetcher, ScratchFile, StorageConfig};

/// Downloads objects from an S3-compatible store (MinIO by default) into the
/// scratch directory.
pub struct S3ObjectFetcher {
    client: Client,
    scratch_dir: PathBuf,
}

impl S3ObjectFetcher {
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "receipt-hook-static",
        );
        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .retry_config(RetryConfig::standard().with_max_attempts(config.max_attempts));
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(secs))
                    .build(),
            );
        }

        Self::with_client(Client::from_conf(builder.build()), &config.scratch_dir)
    }

    pub fn with_client(client: Client, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            scratch_dir: scratch_dir.into(),
        }
    }
}

#[async_trait]
impl ObjectFetcher for S3ObjectFetcher {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<ScratchFile> {
        let path = scratch_path(&self.scratch_dir, key)?;

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service) if service.is_no_such_key() => {
                    anyhow!("object s3://{}/{} does not exist", bucket, key)
                }
                _ => anyhow!(
                    "download of s3://{}/{} failed: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&err)
                ),
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .with_context(|| format!("reading body of s3://{}/{}", bucket, key))?
            .into_bytes();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating scratch dir {}", parent.display()))?;
        }
        // Guard first so a partial write is cleaned up too.
        let file = ScratchFile::new(path);
        fs::write(file.path(), &bytes)
            .await
            .with_context(|| format!("writing scratch file {}", file.path().display()))?;

        debug!(bytes = bytes.len(), "object body written");
        info!("downloaded s3://{}/{} to {}", bucket, key, file.path().display());
        Ok(file)
    }
}
