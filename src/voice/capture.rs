//! Push-to-talk recording from the microphone

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};

use super::{CaptureSession, Recording};
use crate::{Error, Result};

/// Media type of recordings produced by [`MicrophoneRecorder`]
pub const RECORDING_MEDIA_TYPE: &str = "audio/wav";

/// Records from the default input device at its native configuration
///
/// Samples are buffered while the stream runs and serialized into a float
/// WAV container on [`stop`](Self::stop), then sliced into chunks the same
/// way a streaming recorder would deliver them.
pub struct MicrophoneRecorder {
    config: StreamConfig,
    chunk_bytes: usize,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl MicrophoneRecorder {
    /// Open the default input device
    ///
    /// # Errors
    ///
    /// Returns error if no input device or configuration is available
    pub fn new(chunk_bytes: usize) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let config: StreamConfig = device
            .default_input_config()
            .map_err(|e| Error::Audio(e.to_string()))?
            .into();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            "microphone initialized"
        );

        Ok(Self {
            config,
            chunk_bytes: chunk_bytes.max(1),
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Start recording; a no-op if already recording
    ///
    /// # Errors
    ///
    /// Returns error if the input stream cannot be started
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }

        let buffer = Arc::clone(&self.buffer);
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device".to_string()))?;

        let stream = device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("recording started");
        Ok(())
    }

    /// Stop recording and return the captured audio as chunks
    ///
    /// # Errors
    ///
    /// Returns error if the container cannot be written
    pub fn stop(&mut self) -> Result<Recording> {
        if let Some(stream) = self.stream.take() {
            drop(stream);
        }

        let samples = self
            .buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default();

        tracing::debug!(samples = samples.len(), "recording stopped");

        let container =
            samples_to_float_wav(&samples, self.config.channels, self.config.sample_rate.0)?;
        let mut session = CaptureSession::new(RECORDING_MEDIA_TYPE);
        for chunk in container.chunks(self.chunk_bytes) {
            session.push_chunk(chunk.to_vec());
        }
        Ok(session.finish())
    }

    /// Check if currently recording
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Native sample rate of the input device
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Native channel count of the input device
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.config.channels
    }
}

/// Serialize interleaved f32 frames into a 32-bit float WAV container
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_float_wav(samples: &[f32], channels: u16, sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_wav_readable() {
        let samples = [0.25f32, -0.25, 0.5, -0.5];
        let wav = samples_to_float_wav(&samples, 2, 48000).unwrap();

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 48000);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);

        let read: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }
}
