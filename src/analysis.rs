//! Analysis backend client
//!
//! Uploads the frame and the encoded recording as one multipart request and
//! reads the reply text from the JSON response.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::AnalysisConfig;
use crate::frame::ImageFrame;
use crate::{Error, Result};

/// Turns an image plus a spoken question into reply text
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze one frame and one 16-bit PCM WAV recording
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response has no text
    async fn analyze(&self, image: &ImageFrame, wav: &[u8]) -> Result<String>;
}

/// HTTP client for the analysis endpoint
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    client: reqwest::Client,
    endpoint: String,
}

impl AnalysisClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &AnalysisConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Analyzer for AnalysisClient {
    async fn analyze(&self, image: &ImageFrame, wav: &[u8]) -> Result<String> {
        tracing::debug!(
            image_bytes = image.data.len(),
            audio_bytes = wav.len(),
            endpoint = %self.endpoint,
            "uploading frame and recording"
        );

        let form = reqwest::multipart::Form::new()
            .part(
                "image",
                reqwest::multipart::Part::bytes(image.data.clone())
                    .file_name(format!("frame.{}", image.extension()))
                    .mime_str(image.media_type)
                    .map_err(|e| Error::Analysis(e.to_string()))?,
            )
            .part(
                "audio",
                reqwest::multipart::Part::bytes(wav.to_vec())
                    .file_name("recording.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Analysis(e.to_string()))?,
            );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "analysis request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "analysis API error");
            return Err(Error::Analysis(format!("analysis API error {status}: {body}")));
        }

        let body = response.bytes().await?;
        let result: Value = serde_json::from_slice(&body)?;
        let text = result
            .get("text")
            .and_then(Value::as_str)
            .ok_or(Error::MissingText)?
            .to_string();

        tracing::info!(reply = %text, "analysis complete");
        Ok(text)
    }
}
