use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use aws_sdk_s3::{Client, presigning::PresigningConfig, primitives::ByteStream};
use tokio::fs;
use tracing::{info, warn};

use crate::domain::{
    repositories::storage::VideoStorageClient, value_objects::storage::UploadResult,
};

use super::s3::{S3Config, build_s3_client, is_retryable_s3_error};

const UPLOAD_ATTEMPTS: usize = 3;

/// S3-compatible object storage for task inputs and finished videos.
pub struct S3VideoStorageClient {
    client: Client,
    bucket: String,
}

impl S3VideoStorageClient {
    pub async fn new(config: S3Config) -> Result<Self> {
        let bucket = config.bucket.clone();
        let client = build_s3_client(&config)
            .await
            .context("failed to build video storage s3 client")?;

        Ok(Self { client, bucket })
    }

    async fn put_object(
        &self,
        object_key: &str,
        body: ByteStream,
        content_type: &str,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(object_key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                let retryable = is_retryable_s3_error(&err);
                anyhow::anyhow!(err).context(format!(
                    "put_object failed for {} (retryable: {})",
                    object_key, retryable
                ))
            })?;
        Ok(())
    }
}

#[async_trait]
impl VideoStorageClient for S3VideoStorageClient {
    async fn upload_video(&self, local_path: &Path, object_key: &str) -> Result<UploadResult> {
        let metadata = fs::metadata(local_path)
            .await
            .with_context(|| format!("missing upload source: {}", local_path.display()))?;
        let size_bytes = i64::try_from(metadata.len()).unwrap_or(i64::MAX);

        let content_type = mime_guess::from_path(local_path)
            .first_or_octet_stream()
            .to_string();

        let mut last_err = None;
        for attempt in 1..=UPLOAD_ATTEMPTS {
            let body = ByteStream::from_path(local_path)
                .await
                .with_context(|| format!("failed to open {}", local_path.display()))?;

            match self.put_object(object_key, body, &content_type).await {
                Ok(()) => {
                    info!(object_key, size_bytes, "uploaded video to storage");
                    return Ok(UploadResult {
                        object_key: object_key.to_string(),
                        size_bytes,
                    });
                }
                Err(err) => {
                    warn!(object_key, attempt, error = ?err, "video upload attempt failed");
                    last_err = Some(err);
                    if attempt < UPLOAD_ATTEMPTS {
                        tokio::time::sleep(Duration::from_secs(2 * attempt as u64)).await;
                    }
                }
            }
        }

        match last_err {
            Some(err) => Err(err),
            None => bail!("video upload failed without an error"),
        }
    }

    async fn upload_bytes(
        &self,
        object_key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UploadResult> {
        let size_bytes = bytes.len() as i64;
        self.put_object(object_key, ByteStream::from(bytes), content_type)
            .await?;

        info!(object_key, size_bytes, "uploaded object to storage");
        Ok(UploadResult {
            object_key: object_key.to_string(),
            size_bytes,
        })
    }

    async fn signed_url(&self, object_key: &str, ttl_seconds: u64) -> Result<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(ttl_seconds))
            .context("invalid presigned URL TTL")?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(object_key)
            .presigned(presigning)
            .await
            .with_context(|| format!("failed to presign GET for {}", object_key))?;

        Ok(presigned.uri().to_string())
    }
}
