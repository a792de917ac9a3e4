//! glimpse - push-to-talk voice and vision client for AI assistants
//!
//! This library provides the pieces of one voice session:
//! - Recording and WAV re-encoding of compressed audio
//! - Upload of a still frame plus the recording to an analysis backend
//! - Speech synthesis of the reply and playback
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     Capture                          │
//! │   Microphone / file recording  │  Frame source       │
//! └────────────────────┬─────────────────────────────────┘
//!                      │ compressed chunks
//! ┌────────────────────▼─────────────────────────────────┐
//! │                 Waveform encoder                     │
//! │   decode  →  interleave  →  quantize + frame (WAV)   │
//! └────────────────────┬─────────────────────────────────┘
//!                      │ 16-bit PCM WAV
//! ┌────────────────────▼─────────────────────────────────┐
//! │   Analysis backend  →  Speech synthesis  →  Sink     │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod analysis;
pub mod assistant;
pub mod config;
pub mod error;
pub mod frame;
pub mod voice;

pub use analysis::{AnalysisClient, Analyzer};
pub use assistant::{Assistant, Reply, SessionState};
pub use config::Config;
pub use error::{Error, Result};
pub use frame::{FileFrameSource, FrameSource, ImageFrame};
pub use voice::{Recording, WaveformEncoder};
