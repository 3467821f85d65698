use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

/// Content-extraction collaborator: turns an uploaded file or a web page into
/// plain text for the pipeline.
#[async_trait]
#[automock]
pub trait ContentExtractor {
    async fn extract_from_file(&self, filename: &str, bytes: &[u8]) -> Result<String>;
    async fn extract_from_url(&self, url: &str) -> Result<String>;
}
