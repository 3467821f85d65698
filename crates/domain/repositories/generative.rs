use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use std::path::{Path, PathBuf};

/// The text/image/speech generation collaborator. One implementation talks to
/// the real provider; tests substitute mocks.
#[async_trait]
#[automock]
pub trait GenerativeClient {
    async fn count_tokens(&self, text: &str) -> Result<u64>;

    /// Splits source content into 3-8 logically coherent segments.
    async fn split_into_segments(&self, text: &str) -> Result<Vec<String>>;

    /// Narration script for one segment, written in the target language.
    async fn narration_script(&self, segment_text: &str, language_name: &str) -> Result<String>;

    /// Illustrative image for one segment, saved under `out_dir`.
    async fn generate_segment_image(
        &self,
        segment_text: &str,
        index: usize,
        out_dir: &Path,
    ) -> Result<PathBuf>;

    /// Narration audio for one segment, saved under `out_dir` as WAV.
    async fn synthesize_narration(
        &self,
        text: &str,
        voice_name: &str,
        index: usize,
        out_dir: &Path,
    ) -> Result<PathBuf>;
}
