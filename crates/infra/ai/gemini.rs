use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::domain::repositories::generative::GenerativeClient;

/// Minimal Gemini REST client built on reqwest.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    text_model: String,
    image_model: String,
    tts_model: String,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
    pub text_model: String,
    pub image_model: String,
    pub tts_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentPart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountTokensResponse {
    total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct SegmentsPayload {
    segments: Vec<String>,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(360))
            .build()
            .context("failed to build gemini http client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            text_model: config.text_model,
            image_model: config.image_model,
            tts_model: config.tts_model,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "gemini api request failed"
        );

        bail!("Gemini API request failed: {} (status {})", context, status);
    }

    async fn generate_content(
        &self,
        model: &str,
        body: serde_json::Value,
        context: &str,
    ) -> Result<GenerateContentResponse> {
        let resp = self
            .http
            .post(self.endpoint(model, "generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, context).await?;

        let parsed: GenerateContentResponse = resp.json().await?;
        Ok(parsed)
    }

    fn first_text(response: &GenerateContentResponse) -> Option<String> {
        response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.iter().find_map(|part| part.text.clone()))
    }

    fn first_inline_data(response: GenerateContentResponse) -> Option<InlineData> {
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| {
                content
                    .parts
                    .into_iter()
                    .find_map(|part| part.inline_data)
            })
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn count_tokens(&self, text: &str) -> Result<u64> {
        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }]
        });

        let resp = self
            .http
            .post(self.endpoint(&self.text_model, "countTokens"))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "count tokens").await?;

        let parsed: CountTokensResponse = resp.json().await?;
        Ok(parsed.total_tokens)
    }

    async fn split_into_segments(&self, text: &str) -> Result<Vec<String>> {
        let prompt = format!(
            "you are a professional video script editor.\n\
             Please decompose the following content into multiple segments suitable for making an introduction video.\n\n\
             Requirements:\n\
             1. Each segment should be an independent scene or theme\n\
             2. Each segment should be medium length (suggested 30-100 words)\n\
             3. The segments should be logically coherent\n\
             4. The number of segments should be between 3-8\n\n\
             Content:\n{text}\n\
             Result format:\n{{\"segments\": [\"segment1\", \"segment2\", ...]}}\n\
             Only return the JSON object, nothing else."
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.7,
                "maxOutputTokens": 16384,
                "responseMimeType": "application/json"
            }
        });

        let response = self
            .generate_content(&self.text_model, body, "split content into segments")
            .await?;
        let raw = Self::first_text(&response)
            .ok_or_else(|| anyhow::anyhow!("segmentation response contained no text"))?;

        let payload: SegmentsPayload =
            serde_json::from_str(raw.trim()).context("segmentation response was not valid JSON")?;

        info!(count = payload.segments.len(), "content split into segments");
        Ok(payload.segments)
    }

    async fn narration_script(&self, segment_text: &str, language_name: &str) -> Result<String> {
        let prompt = format!(
            "you are a professional video script writer.\n\
             Please generate narration script for the following content.\n\n\
             Content: {segment_text}\n\n\
             Requirements:\n\
             1. The narration script should be natural and fluent, suitable for speech synthesis\n\
             2. The narration should use {language_name} language\n\
             3. The narration should be done in one go\n\
             only return the narration script, nothing else."
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .generate_content(&self.text_model, body, "generate narration script")
            .await?;

        Self::first_text(&response)
            .ok_or_else(|| anyhow::anyhow!("narration response contained no text"))
    }

    async fn generate_segment_image(
        &self,
        segment_text: &str,
        index: usize,
        out_dir: &Path,
    ) -> Result<PathBuf> {
        let prompt = format!(
            "content:\n```\n{segment_text}\n```\n\
             1. generate infographic for above content\n\
             2. extract key information\n\
             3. Keep the infographic concise\n\
             4. image word only use english\n\
             5. Plus rich and cute cartoon elements\n"
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "imageConfig": { "aspectRatio": "16:9" }
            }
        });

        let response = self
            .generate_content(&self.image_model, body, "generate segment image")
            .await?;

        let inline = Self::first_inline_data(response)
            .ok_or_else(|| anyhow::anyhow!("no image data in response for segment {}", index))?;

        let extension = inline
            .mime_type
            .as_deref()
            .and_then(|mime| mime.split('/').next_back())
            .unwrap_or("png");
        let image_path = out_dir.join(format!("image_{:03}.{}", index, extension));

        let bytes = BASE64
            .decode(inline.data.as_bytes())
            .context("image payload was not valid base64")?;
        tokio::fs::write(&image_path, bytes)
            .await
            .with_context(|| format!("failed to write image: {}", image_path.display()))?;

        info!(segment = index, path = %image_path.display(), "segment image saved");
        Ok(image_path)
    }

    async fn synthesize_narration(
        &self,
        text: &str,
        voice_name: &str,
        index: usize,
        out_dir: &Path,
    ) -> Result<PathBuf> {
        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": voice_name }
                    }
                }
            }
        });

        let response = self
            .generate_content(&self.tts_model, body, "synthesize narration audio")
            .await?;

        let inline = Self::first_inline_data(response)
            .ok_or_else(|| anyhow::anyhow!("no audio data in response for segment {}", index))?;

        let pcm = BASE64
            .decode(inline.data.as_bytes())
            .context("audio payload was not valid base64")?;

        let wav_path = out_dir.join(format!("audio_{:03}.wav", index));
        write_wav_file(&wav_path, &pcm).await?;

        info!(segment = index, path = %wav_path.display(), "narration audio saved");
        Ok(wav_path)
    }
}

/// Wraps raw 16-bit mono 24 kHz PCM (the TTS output format) in a WAV header.
async fn write_wav_file(path: &Path, pcm: &[u8]) -> Result<()> {
    const CHANNELS: u16 = 1;
    const SAMPLE_RATE: u32 = 24_000;
    const BITS_PER_SAMPLE: u16 = 16;

    let byte_rate = SAMPLE_RATE * u32::from(CHANNELS) * u32::from(BITS_PER_SAMPLE) / 8;
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let data_len = pcm.len() as u32;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&CHANNELS.to_le_bytes());
    wav.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);

    tokio::fs::write(path, wav)
        .await
        .with_context(|| format!("failed to write wav: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wav_header_matches_payload_length() {
        let dir = std::env::temp_dir().join(format!("wav-test-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("out.wav");

        let pcm = vec![0u8; 4800];
        write_wav_file(&path, &pcm).await.unwrap();

        let written = tokio::fs::read(&path).await.unwrap();
        assert_eq!(written.len(), 44 + pcm.len());
        assert_eq!(&written[0..4], b"RIFF");
        assert_eq!(&written[8..12], b"WAVE");
        let data_len = u32::from_le_bytes(written[40..44].try_into().unwrap());
        assert_eq!(data_len as usize, pcm.len());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
