//! Recording → 16-bit PCM WAV re-encoding

use std::sync::Arc;
use std::time::Duration;

use super::decode::{AudioDecoder, DecodedAudio, SymphoniaDecoder, decode};
use super::wav::{self, MAX_SAMPLES};
use super::Recording;
use crate::{Error, Result};

/// Lowest accepted source sample rate
pub const MIN_SAMPLE_RATE: u32 = 8_000;

/// Highest accepted source sample rate
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// Default cap on recording length
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(300);

/// Bounds applied to decoded audio before framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderLimits {
    /// Longest accepted recording
    pub max_duration: Duration,
}

impl Default for EncoderLimits {
    fn default() -> Self {
        Self {
            max_duration: DEFAULT_MAX_DURATION,
        }
    }
}

impl EncoderLimits {
    /// Check decoded audio against the limits
    ///
    /// # Errors
    ///
    /// Returns [`Error::Limit`] if the sample rate or duration is out of bounds
    pub fn check(&self, audio: &DecodedAudio) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&audio.sample_rate) {
            return Err(Error::Limit(format!(
                "sample rate {} Hz outside {MIN_SAMPLE_RATE}..={MAX_SAMPLE_RATE} Hz",
                audio.sample_rate
            )));
        }

        let duration = audio.duration_secs();
        if duration > self.max_duration.as_secs_f64() {
            return Err(Error::Limit(format!(
                "recording is {duration:.1}s, limit is {}s",
                self.max_duration.as_secs()
            )));
        }

        if audio.frames() * audio.channel_count() > MAX_SAMPLES {
            return Err(Error::Limit("recording too large for a WAV container".to_string()));
        }

        Ok(())
    }
}

/// Converts recordings into uploadable 16-bit PCM WAV files
///
/// Stateless across calls; each [`encode`](Self::encode) owns its input and
/// returns its own buffer, so one encoder can serve concurrent sessions.
#[derive(Clone)]
pub struct WaveformEncoder {
    decoder: Arc<dyn AudioDecoder>,
    limits: EncoderLimits,
}

impl std::fmt::Debug for WaveformEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaveformEncoder")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl Default for WaveformEncoder {
    fn default() -> Self {
        Self::new(Arc::new(SymphoniaDecoder), EncoderLimits::default())
    }
}

impl WaveformEncoder {
    /// Create an encoder over a decoding backend
    #[must_use]
    pub fn new(decoder: Arc<dyn AudioDecoder>, limits: EncoderLimits) -> Self {
        Self { decoder, limits }
    }

    /// Use different limits
    #[must_use]
    pub const fn with_limits(mut self, limits: EncoderLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Decode, interleave and frame a recording
    ///
    /// Decoding runs on the blocking pool; the caller suspends until it
    /// finishes. There is no cancellation once started.
    ///
    /// # Errors
    ///
    /// Returns a decode, channel or limit error; framing itself cannot fail
    pub async fn encode(&self, recording: Recording) -> Result<Vec<u8>> {
        let decoder = Arc::clone(&self.decoder);
        let decoded = tokio::task::spawn_blocking(move || decode(decoder.as_ref(), recording))
            .await
            .map_err(|e| Error::Decode(format!("decode task failed: {e}")))??;

        self.frame(decoded)
    }

    /// Synchronous variant of [`encode`](Self::encode)
    ///
    /// # Errors
    ///
    /// Same as [`encode`](Self::encode)
    pub fn encode_blocking(&self, recording: Recording) -> Result<Vec<u8>> {
        let decoded = decode(self.decoder.as_ref(), recording)?;
        self.frame(decoded)
    }

    fn frame(&self, decoded: DecodedAudio) -> Result<Vec<u8>> {
        self.limits.check(&decoded)?;

        let sample_rate = decoded.sample_rate;
        let count = decoded.channel_count();
        let mut planes = decoded.channels.into_iter();
        let (samples, channels) = match (planes.next(), planes.next(), planes.next()) {
            (Some(mono), None, None) => (mono, 1),
            (Some(left), Some(right), None) => (wav::interleave(&left, &right)?, 2),
            _ => return Err(Error::UnsupportedChannels(count)),
        };

        let out = wav::quantize_and_frame(&samples, channels, sample_rate);
        tracing::info!(
            sample_rate,
            channels,
            samples = samples.len(),
            wav_bytes = out.len(),
            "recording encoded"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDecoder(DecodedAudio);

    impl AudioDecoder for FixedDecoder {
        fn decode(&self, _data: Vec<u8>, _media_type: &str) -> Result<DecodedAudio> {
            Ok(self.0.clone())
        }
    }

    fn encoder_for(audio: DecodedAudio) -> WaveformEncoder {
        WaveformEncoder::new(Arc::new(FixedDecoder(audio)), EncoderLimits::default())
    }

    fn recording() -> Recording {
        Recording::new("audio/webm", vec![vec![0xAA]])
    }

    #[tokio::test]
    async fn test_encode_stereo_interleaves() {
        let encoder = encoder_for(DecodedAudio {
            sample_rate: 44100,
            channels: vec![vec![1.0, 0.0], vec![-1.0, 0.5]],
        });

        let wav = encoder.encode(recording()).await.unwrap();
        assert_eq!(wav.len(), 44 + 8);
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 2);

        let payload: Vec<i16> = wav[44..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(payload, vec![32767, -32768, 0, 16383]);
    }

    #[tokio::test]
    async fn test_encode_rejects_low_sample_rate() {
        let encoder = encoder_for(DecodedAudio {
            sample_rate: 4000,
            channels: vec![vec![0.0; 10]],
        });
        let err = encoder.encode(recording()).await.unwrap_err();
        assert!(matches!(err, Error::Limit(_)));
    }

    #[test]
    fn test_encode_rejects_long_recording() {
        let encoder = encoder_for(DecodedAudio {
            sample_rate: 8000,
            channels: vec![vec![0.0; 8000 * 3]],
        })
        .with_limits(EncoderLimits {
            max_duration: Duration::from_secs(2),
        });

        let err = encoder.encode_blocking(recording()).unwrap_err();
        assert!(matches!(err, Error::Limit(_)));
    }
}
