//! Configuration management for the glimpse client

pub mod file;

use std::time::Duration;

use secrecy::SecretString;

use crate::voice::{AudioFormat, DEFAULT_CHUNK_BYTES, EncoderLimits};
use crate::{Error, Result};

use self::file::GlimpseConfigFile;

/// Default analysis endpoint
pub const DEFAULT_ANALYSIS_URL: &str = "http://127.0.0.1:5000/process";

/// Default speech endpoint
pub const DEFAULT_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Default HTTP request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// glimpse client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Analysis backend
    pub analysis: AnalysisConfig,

    /// Speech synthesis
    pub speech: SpeechConfig,

    /// Recording and encoding
    pub recording: RecordingConfig,

    /// HTTP request timeout
    pub timeout: Duration,
}

/// Analysis backend configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Multipart upload endpoint
    pub endpoint: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ANALYSIS_URL.to_string(),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Speech endpoint
    pub endpoint: String,

    /// Static bearer token
    pub api_key: Option<SecretString>,

    /// TTS model
    pub model: String,

    /// Voice identifier
    pub voice: String,

    /// Requested audio container
    pub format: AudioFormat,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SPEECH_URL.to_string(),
            api_key: None,
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            format: AudioFormat::Mp3,
        }
    }
}

/// Recording configuration
#[derive(Debug, Clone, Copy)]
pub struct RecordingConfig {
    /// Bytes per chunk when slicing recordings
    pub chunk_bytes: usize,

    /// Encoder bounds
    pub limits: EncoderLimits,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            limits: EncoderLimits::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            speech: SpeechConfig::default(),
            recording: RecordingConfig::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn load() -> Result<Self> {
        Self::from_sources(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with an environment lookup (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn from_sources(
        fc: GlimpseConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = Self::default();

        let analysis = AnalysisConfig {
            endpoint: env("GLIMPSE_ANALYSIS_URL")
                .or(fc.analysis.url)
                .unwrap_or(defaults.analysis.endpoint),
        };

        let format = env("GLIMPSE_TTS_FORMAT")
            .or(fc.speech.format)
            .map(|f| f.parse::<AudioFormat>())
            .transpose()?
            .unwrap_or(defaults.speech.format);

        let speech = SpeechConfig {
            endpoint: env("GLIMPSE_SPEECH_URL")
                .or(fc.speech.url)
                .unwrap_or(defaults.speech.endpoint),
            api_key: env("OPENAI_API_KEY")
                .or(fc.speech.api_key)
                .map(SecretString::from),
            model: env("GLIMPSE_TTS_MODEL")
                .or(fc.speech.model)
                .unwrap_or(defaults.speech.model),
            voice: env("GLIMPSE_TTS_VOICE")
                .or(fc.speech.voice)
                .unwrap_or(defaults.speech.voice),
            format,
        };

        let max_secs = parse_env(&env, "GLIMPSE_MAX_RECORDING_SECS")?
            .or(fc.recording.max_secs);
        if max_secs == Some(0) {
            return Err(Error::Config(
                "maximum recording duration must be at least one second".to_string(),
            ));
        }
        let recording = RecordingConfig {
            chunk_bytes: fc
                .recording
                .chunk_bytes
                .filter(|&n| n > 0)
                .unwrap_or(defaults.recording.chunk_bytes),
            limits: max_secs.map_or(defaults.recording.limits, |secs| EncoderLimits {
                max_duration: Duration::from_secs(secs),
            }),
        };

        let timeout = parse_env(&env, "GLIMPSE_HTTP_TIMEOUT")?
            .or(fc.http.timeout_secs)
            .map_or(defaults.timeout, Duration::from_secs);

        Ok(Self {
            analysis,
            speech,
            recording,
            timeout,
        })
    }
}

/// Parse an integer environment variable, rejecting malformed values
fn parse_env(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    env(key)
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("{key}={v}: {e}")))
        })
        .transpose()
}
