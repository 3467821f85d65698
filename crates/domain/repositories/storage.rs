use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use std::path::Path;

use crate::domain::value_objects::storage::UploadResult;

#[async_trait]
#[automock]
pub trait VideoStorageClient {
    /// Uploads a finished video from the worker's scratch directory.
    async fn upload_video(&self, local_path: &Path, object_key: &str) -> Result<UploadResult>;
    /// Stores small source material (uploaded input files) as-is.
    async fn upload_bytes(
        &self,
        object_key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UploadResult>;
    /// Short-lived presigned GET URL for an output object.
    async fn signed_url(&self, object_key: &str, ttl_seconds: u64) -> Result<String>;
}
