use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use std::path::{Path, PathBuf};

/// Codec-level operations behind one seam: composing a still image with a
/// narration track, concatenating clips, and probing durations.
#[async_trait]
#[automock]
pub trait MediaAssembler {
    async fn compose_clip(
        &self,
        image_path: &Path,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<PathBuf>;

    /// Concatenates clips in the given order into one output file.
    async fn concatenate(&self, clip_paths: &[PathBuf], output_path: &Path) -> Result<PathBuf>;

    async fn clip_duration_seconds(&self, clip_path: &Path) -> Result<f64>;
}
