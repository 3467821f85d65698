use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::domain::repositories::content::ContentExtractor;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "text"];

/// Thin extraction layer: UTF-8 text-like uploads and fetched web pages.
pub struct HttpContentExtractor {
    http: reqwest::Client,
}

impl HttpContentExtractor {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build content extractor http client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ContentExtractor for HttpContentExtractor {
    async fn extract_from_file(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        let extension = filename
            .rsplit('.')
            .next()
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
            bail!(
                "unsupported file type: {}. Supported types: .txt, .md, .text",
                filename
            );
        }

        let text = String::from_utf8(bytes.to_vec())
            .with_context(|| format!("file {} is not valid UTF-8", filename))?;

        info!(filename, length = text.len(), "extracted text from file");
        Ok(text)
    }

    async fn extract_from_url(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).with_context(|| format!("invalid URL: {}", url))?;

        let resp = self.http.get(parsed).send().await?;
        if !resp.status().is_success() {
            bail!("URL returned status {}", resp.status());
        }

        let body = resp.text().await?;
        let text = strip_html(&body);
        if text.trim().is_empty() {
            bail!("no readable text at {}", url);
        }

        info!(url, length = text.len(), "extracted text from url");
        Ok(text)
    }
}

/// Drops tags, scripts, and styles; keeps visible text with sane whitespace.
fn strip_html(html: &str) -> String {
    fn starts_with_ignore_case(bytes: &[u8], prefix: &[u8]) -> bool {
        bytes.len() >= prefix.len() && bytes[..prefix.len()].eq_ignore_ascii_case(prefix)
    }

    let bytes = html.as_bytes();
    let mut text = String::with_capacity(html.len() / 2);
    let mut chars = html.char_indices();
    let mut skip_until: Option<&[u8]> = None;

    while let Some((idx, ch)) = chars.next() {
        if let Some(closer) = skip_until {
            if starts_with_ignore_case(&bytes[idx..], closer) {
                skip_until = None;
                // The closer itself is a tag; fall through to tag handling.
            } else {
                continue;
            }
        }

        if ch == '<' {
            let rest = &bytes[idx..];
            if starts_with_ignore_case(rest, b"<script") {
                skip_until = Some(b"</script");
            } else if starts_with_ignore_case(rest, b"<style") {
                skip_until = Some(b"</style");
            }
            // Consume through the closing bracket either way.
            for (_, inner) in chars.by_ref() {
                if inner == '>' {
                    break;
                }
            }
            text.push(' ');
            continue;
        }

        text.push(ch);
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn text_files_pass_through() {
        let extractor = HttpContentExtractor::new().unwrap();
        let text = extractor
            .extract_from_file("notes.md", "# Title\nbody".as_bytes())
            .await
            .unwrap();
        assert_eq!(text, "# Title\nbody");
    }

    #[tokio::test]
    async fn binary_extensions_are_rejected() {
        let extractor = HttpContentExtractor::new().unwrap();
        let result = extractor.extract_from_file("deck.pdf", &[0, 1, 2]).await;
        assert!(result.is_err());
    }

    #[test]
    fn html_is_reduced_to_visible_text() {
        let html =
            "<html><head><style>p{color:red}</style></head><body><p>Hello</p><script>var x=1;</script><p>world</p></body></html>";
        assert_eq!(strip_html(html), "Hello world");
    }
}
