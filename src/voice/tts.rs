//! Text-to-speech (TTS) over an OpenAI-compatible speech endpoint

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::SpeechConfig;
use crate::{Error, Result};

/// Audio container requested from the speech endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MPEG layer III
    #[default]
    Mp3,
    /// RIFF/WAVE
    Wav,
    /// Ogg Opus
    Opus,
    /// AAC in ADTS
    Aac,
    /// FLAC
    Flac,
}

impl AudioFormat {
    /// Wire name used in `response_format`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
        }
    }

    /// File extension for saved replies
    #[must_use]
    pub const fn extension(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "wav" => Ok(Self::Wav),
            "opus" => Ok(Self::Opus),
            "aac" => Ok(Self::Aac),
            "flac" => Ok(Self::Flac),
            other => Err(Error::Config(format!("unknown audio format: {other}"))),
        }
    }
}

/// Synthesized speech as returned by the endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechAudio {
    /// Raw audio bytes
    pub data: Vec<u8>,
    /// Container of `data`
    pub format: AudioFormat,
}

/// Turns reply text into audio
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text`
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio>;
}

/// Client for a `/v1/audio/speech`-style endpoint
pub struct SpeechClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    model: String,
    voice: String,
    format: AudioFormat,
}

impl fmt::Debug for SpeechClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl SpeechClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the bearer token is missing or the HTTP client cannot be built
    pub fn new(config: &SpeechConfig, timeout: Duration) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.expose_secret().is_empty())
            .ok_or_else(|| Error::Config("API key required for TTS".to_string()))?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            voice: config.voice.clone(),
            format: config.format,
        })
    }
}

#[async_trait]
impl Synthesizer for SpeechClient {
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            voice: &'a str,
            input: &'a str,
            response_format: AudioFormat,
        }

        let request = TtsRequest {
            model: &self.model,
            voice: &self.voice,
            input: text,
            response_format: self.format,
        };

        tracing::debug!(chars = text.len(), voice = %self.voice, "requesting speech");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "TTS API error");
            return Err(Error::Synthesis(format!("TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(audio_bytes = audio.len(), "speech received");

        Ok(SpeechAudio {
            data: audio.to_vec(),
            format: self.format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_format_parse() {
        assert_eq!("MP3".parse::<AudioFormat>().unwrap(), AudioFormat::Mp3);
        assert_eq!(" wav ".parse::<AudioFormat>().unwrap(), AudioFormat::Wav);
        assert!("ogg".parse::<AudioFormat>().is_err());
    }

    #[test]
    fn test_audio_format_serializes_lowercase() {
        let json = serde_json::to_string(&AudioFormat::Flac).unwrap();
        assert_eq!(json, "\"flac\"");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = SpeechConfig {
            api_key: Some(SecretString::from(String::new())),
            ..SpeechConfig::default()
        };
        let err = SpeechClient::new(&config, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
