//! Error types for the glimpse client

use thiserror::Error;

/// Result type alias for glimpse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a voice session
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Recorded audio is empty or could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Decoded audio has a channel layout the encoder does not handle
    #[error("unsupported channel count: {0} (expected 1 or 2)")]
    UnsupportedChannels(usize),

    /// Stereo planes passed to interleaving differ in length
    #[error("channel length mismatch: left has {left} samples, right has {right}")]
    ChannelMismatch {
        /// Left channel sample count
        left: usize,
        /// Right channel sample count
        right: usize,
    },

    /// Recording exceeds the configured sample rate or duration bounds
    #[error("recording rejected: {0}")]
    Limit(String),

    /// Audio device or playback error
    #[error("audio error: {0}")]
    Audio(String),

    /// Analysis endpoint returned a non-success status
    #[error("analysis error: {0}")]
    Analysis(String),

    /// Analysis response did not carry a `text` field
    #[error("analysis response has no text field")]
    MissingText,

    /// Speech endpoint returned a non-success status
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
