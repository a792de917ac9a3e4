//! TOML configuration file loading
//!
//! Supports `~/.config/glimpse/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct GlimpseConfigFile {
    /// Analysis backend
    #[serde(default)]
    pub analysis: AnalysisFileConfig,

    /// Speech synthesis
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// Recording and encoding
    #[serde(default)]
    pub recording: RecordingFileConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpFileConfig,
}

/// Analysis backend configuration
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisFileConfig {
    /// Multipart upload endpoint
    pub url: Option<String>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Speech endpoint (e.g. "https://api.openai.com/v1/audio/speech")
    pub url: Option<String>,

    /// Bearer token
    pub api_key: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub model: Option<String>,

    /// Voice identifier (e.g. "alloy")
    pub voice: Option<String>,

    /// Response format ("mp3", "wav", ...)
    pub format: Option<String>,
}

/// Recording configuration
#[derive(Debug, Default, Deserialize)]
pub struct RecordingFileConfig {
    /// Chunk size in bytes
    pub chunk_bytes: Option<usize>,

    /// Longest accepted recording in seconds
    pub max_secs: Option<u64>,
}

/// HTTP client configuration
#[derive(Debug, Default, Deserialize)]
pub struct HttpFileConfig {
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `GlimpseConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> GlimpseConfigFile {
    config_file_path().map_or_else(GlimpseConfigFile::default, |path| load_from(&path))
}

/// Load a config file from an explicit path, falling back to defaults
pub fn load_from(path: &Path) -> GlimpseConfigFile {
    if !path.exists() {
        return GlimpseConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                GlimpseConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            GlimpseConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/glimpse/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("glimpse").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file() {
        let fc: GlimpseConfigFile = toml::from_str(
            r#"
            [speech]
            voice = "nova"
            format = "wav"

            [recording]
            max_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(fc.speech.voice.as_deref(), Some("nova"));
        assert_eq!(fc.speech.format.as_deref(), Some("wav"));
        assert_eq!(fc.recording.max_secs, Some(30));
        assert!(fc.analysis.url.is_none());
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "speech = [not toml").unwrap();

        let fc = load_from(&path);
        assert!(fc.speech.model.is_none());
    }

    #[test]
    fn test_missing_file_is_default() {
        let fc = load_from(Path::new("/nonexistent/glimpse/config.toml"));
        assert!(fc.http.timeout_secs.is_none());
    }
}
