use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use mp4::Mp4Reader;
use std::fs::File;
use std::io::BufReader;
use tokio::process::Command;
use tracing::{error, info};

use crate::domain::repositories::media::MediaAssembler;

/// Media assembly by shelling out to the ffmpeg binary; durations are read
/// straight from the mp4 container.
pub struct FfmpegAssembler;

impl FfmpegAssembler {
    pub fn new() -> Self {
        Self
    }

    async fn run_ffmpeg(args: Vec<String>, context: &str) -> Result<()> {
        let output = Command::new("ffmpeg")
            .arg("-y")
            .args(&args)
            .output()
            .await
            .with_context(|| format!("failed to run ffmpeg for {}", context))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                status = %output.status,
                stderr = %stderr,
                context,
                "ffmpeg invocation failed"
            );
            bail!("ffmpeg failed: {}", context);
        }

        Ok(())
    }
}

impl Default for FfmpegAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaAssembler for FfmpegAssembler {
    async fn compose_clip(
        &self,
        image_path: &Path,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<PathBuf> {
        // Still image looped for the length of the narration track.
        let args = vec![
            "-loop".to_string(),
            "1".to_string(),
            "-i".to_string(),
            image_path.display().to_string(),
            "-i".to_string(),
            audio_path.display().to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-tune".to_string(),
            "stillimage".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            "192k".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            "24".to_string(),
            "-shortest".to_string(),
            output_path.display().to_string(),
        ];

        Self::run_ffmpeg(args, "compose segment clip").await?;

        if !output_path.exists() {
            bail!("segment clip was not created: {}", output_path.display());
        }

        info!(clip = %output_path.display(), "segment clip composed");
        Ok(output_path.to_path_buf())
    }

    async fn concatenate(&self, clip_paths: &[PathBuf], output_path: &Path) -> Result<PathBuf> {
        for (index, path) in clip_paths.iter().enumerate() {
            if !path.exists() {
                bail!("clip {} not found: {}", index, path.display());
            }
        }

        // ffmpeg concat demuxer wants a list file with one entry per clip.
        let list_path = output_path.with_extension("txt");
        let list_body = clip_paths
            .iter()
            .map(|path| format!("file '{}'", path.display()))
            .collect::<Vec<_>>()
            .join("\n");
        tokio::fs::write(&list_path, list_body)
            .await
            .context("failed to write concat list")?;

        let args = vec![
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list_path.display().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            output_path.display().to_string(),
        ];

        let result = Self::run_ffmpeg(args, "concatenate clips").await;
        if let Err(err) = tokio::fs::remove_file(&list_path).await {
            tracing::warn!(error = ?err, "failed to remove concat list file");
        }
        result?;

        if !output_path.exists() {
            bail!("final video was not created: {}", output_path.display());
        }

        info!(
            clips = clip_paths.len(),
            output = %output_path.display(),
            "clips concatenated"
        );
        Ok(output_path.to_path_buf())
    }

    async fn clip_duration_seconds(&self, clip_path: &Path) -> Result<f64> {
        let path = clip_path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let file = File::open(&path)
                .with_context(|| format!("failed to open clip: {}", path.display()))?;
            let size = file.metadata()?.len();
            let reader = BufReader::new(file);
            let mp4 = Mp4Reader::read_header(reader, size)
                .with_context(|| format!("failed to parse mp4: {}", path.display()))?;

            Ok(mp4.duration().as_secs_f64())
        })
        .await
        .context("failed to join duration reader task")?
    }
}
