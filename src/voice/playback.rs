//! Reply playback: speakers or files

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use super::tts::{AudioFormat, SpeechAudio};
use crate::{Error, Result};

/// Mono PCM ready for an output device
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    /// Samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

/// Destination for synthesized replies
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play (or store) one reply
    ///
    /// # Errors
    ///
    /// Returns error if the audio cannot be decoded or output
    async fn play(&self, audio: &SpeechAudio) -> Result<()>;
}

/// Plays replies on the default output device
#[derive(Debug, Default, Clone, Copy)]
pub struct SpeakerSink;

#[async_trait]
impl AudioSink for SpeakerSink {
    async fn play(&self, audio: &SpeechAudio) -> Result<()> {
        let pcm = decode_speech(audio)?;
        tokio::task::spawn_blocking(move || play_blocking(&pcm))
            .await
            .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
    }
}

/// Writes each reply to `<dir>/reply-<n>.<ext>`
#[derive(Debug)]
pub struct FileSink {
    dir: PathBuf,
    counter: AtomicUsize,
}

impl FileSink {
    /// Create a sink writing into `dir` (created on first write)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AudioSink for FileSink {
    async fn play(&self, audio: &SpeechAudio) -> Result<()> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self
            .dir
            .join(format!("reply-{n}.{}", audio.format.extension()));
        tokio::fs::write(&path, &audio.data).await?;

        tracing::info!(path = %path.display(), bytes = audio.data.len(), "reply saved");
        Ok(())
    }
}

/// Decode synthesized speech into mono PCM
///
/// # Errors
///
/// Returns error for undecodable data or formats without a local decoder
pub fn decode_speech(audio: &SpeechAudio) -> Result<PcmAudio> {
    match audio.format {
        AudioFormat::Mp3 => decode_mp3(&audio.data),
        AudioFormat::Wav => decode_wav(&audio.data),
        other => Err(Error::Audio(format!(
            "no local decoder for {other} replies, use an mp3 or wav response format"
        ))),
    }
}

/// Decode MP3 bytes to mono f32 samples
fn decode_mp3(mp3_data: &[u8]) -> Result<PcmAudio> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = None;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                #[allow(clippy::cast_sign_loss)]
                let rate = frame.sample_rate as u32;
                sample_rate.get_or_insert(rate);
                if frame.channels == 2 {
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right =
                            f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    let sample_rate =
        sample_rate.ok_or_else(|| Error::Audio("MP3 contained no frames".to_string()))?;
    Ok(PcmAudio {
        samples,
        sample_rate,
    })
}

/// Decode WAV bytes to mono f32 samples
fn decode_wav(wav_data: &[u8]) -> Result<PcmAudio> {
    let mut reader =
        hound::WavReader::new(Cursor::new(wav_data)).map_err(|e| Error::Audio(e.to_string()))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Audio(e.to_string()))?,
        hound::SampleFormat::Int => {
            #[allow(clippy::cast_precision_loss)]
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Audio(e.to_string()))?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    #[allow(clippy::cast_precision_loss)]
    let samples = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    Ok(PcmAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Play mono samples on the default output device, blocking until done
///
/// # Errors
///
/// Returns error if no output device supports the sample rate
pub fn play_blocking(pcm: &PcmAudio) -> Result<()> {
    if pcm.samples.is_empty() {
        return Ok(());
    }

    let device = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

    let rate = SampleRate(pcm.sample_rate);
    let supported = device
        .supported_output_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .filter(|c| {
            c.sample_format() == cpal::SampleFormat::F32
                && c.min_sample_rate() <= rate
                && c.max_sample_rate() >= rate
        })
        .min_by_key(cpal::SupportedStreamConfigRange::channels)
        .ok_or_else(|| {
            Error::Audio(format!("no output config for {} Hz", pcm.sample_rate))
        })?;

    let config: StreamConfig = supported.with_sample_rate(rate).config();
    let channels = usize::from(config.channels);

    let samples = Arc::new(pcm.samples.clone());
    let position = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicBool::new(false));

    let stream = {
        let samples = Arc::clone(&samples);
        let position = Arc::clone(&position);
        let finished = Arc::clone(&finished);
        device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let pos = position.load(Ordering::Relaxed);
                        let sample = samples.get(pos).copied().unwrap_or_else(|| {
                            finished.store(true, Ordering::Relaxed);
                            0.0
                        });
                        frame.fill(sample);
                        if pos < samples.len() {
                            position.store(pos + 1, Ordering::Relaxed);
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?
    };

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    let duration_ms = (samples.len() as u64 * 1000) / u64::from(pcm.sample_rate.max(1));
    let timeout = Duration::from_millis(duration_ms + 500);
    let start = Instant::now();

    while !finished.load(Ordering::Relaxed) && start.elapsed() < timeout {
        std::thread::sleep(Duration::from_millis(50));
    }

    // let the device drain its last buffer
    std::thread::sleep(Duration::from_millis(100));
    drop(stream);

    tracing::debug!(samples = samples.len(), sample_rate = pcm.sample_rate, "playback complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_decode_wav_downmixes_stereo() {
        let data = wav_bytes(&[16384, 0, -16384, -16384], 2, 24000);
        let pcm = decode_speech(&SpeechAudio {
            data,
            format: AudioFormat::Wav,
        })
        .unwrap();

        assert_eq!(pcm.sample_rate, 24000);
        assert_eq!(pcm.samples.len(), 2);
        assert!((pcm.samples[0] - 0.25).abs() < 1e-4);
        assert!((pcm.samples[1] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_decode_unsupported_format() {
        let err = decode_speech(&SpeechAudio {
            data: vec![0; 8],
            format: AudioFormat::Opus,
        })
        .unwrap_err();
        assert!(matches!(err, Error::Audio(_)));
    }

    #[test]
    fn test_decode_mp3_garbage() {
        let result = decode_speech(&SpeechAudio {
            data: vec![0; 64],
            format: AudioFormat::Mp3,
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_file_sink_numbers_replies() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("out"));
        let audio = SpeechAudio {
            data: vec![1, 2, 3],
            format: AudioFormat::Mp3,
        };

        sink.play(&audio).await.unwrap();
        sink.play(&audio).await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("out/reply-1.mp3")).unwrap(), vec![1, 2, 3]);
        assert!(dir.path().join("out/reply-2.mp3").exists());
    }
}
