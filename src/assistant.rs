//! Session workflow: record → encode → analyze → speak
//!
//! One linear request chain per recording. Any failure is logged and the
//! assistant drops back to [`SessionState::Idle`]; nothing is retried and
//! no partial reply is surfaced.

use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::frame::FrameSource;
use crate::voice::{AudioSink, Recording, SpeechAudio, Synthesizer, WaveformEncoder};
use crate::Result;

/// What the user-facing affordance should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Waiting for press-and-hold
    #[default]
    Idle,
    /// Capturing audio
    Recording,
    /// Upload, synthesis or playback in flight
    Processing,
}

/// A completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text returned by the analysis backend
    pub text: String,
    /// Synthesized speech for `text`
    pub audio: SpeechAudio,
}

/// Drives one recording at a time through the pipeline
pub struct Assistant {
    encoder: WaveformEncoder,
    frames: Arc<dyn FrameSource>,
    analyzer: Arc<dyn Analyzer>,
    synthesizer: Arc<dyn Synthesizer>,
    sink: Arc<dyn AudioSink>,
    state: SessionState,
}

impl Assistant {
    /// Assemble an assistant from its collaborators
    #[must_use]
    pub fn new(
        encoder: WaveformEncoder,
        frames: Arc<dyn FrameSource>,
        analyzer: Arc<dyn Analyzer>,
        synthesizer: Arc<dyn Synthesizer>,
        sink: Arc<dyn AudioSink>,
    ) -> Self {
        Self {
            encoder,
            frames,
            analyzer,
            synthesizer,
            sink,
            state: SessionState::Idle,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Mark the start of a press-and-hold capture
    pub fn begin_recording(&mut self) {
        tracing::debug!("recording");
        self.state = SessionState::Recording;
    }

    /// Abandon a capture without processing it
    pub fn cancel_recording(&mut self) {
        self.state = SessionState::Idle;
    }

    /// Process a finished recording, logging failures
    ///
    /// Always returns to [`SessionState::Idle`]. Returns the reply on success.
    pub async fn process(&mut self, recording: Recording) -> Option<Reply> {
        self.state = SessionState::Processing;
        let result = self.respond(recording).await;
        self.state = SessionState::Idle;

        match result {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::error!(error = %e, "session aborted");
                None
            }
        }
    }

    /// Run the full chain for one recording
    ///
    /// # Errors
    ///
    /// Returns the first error from encoding, frame capture, analysis,
    /// synthesis or playback
    pub async fn respond(&self, recording: Recording) -> Result<Reply> {
        let wav = self.encoder.encode(recording).await?;
        let image = self.frames.capture().await?;
        let text = self.analyzer.analyze(&image, &wav).await?;
        let audio = self.synthesizer.synthesize(&text).await?;
        self.sink.play(&audio).await?;

        Ok(Reply { text, audio })
    }
}
