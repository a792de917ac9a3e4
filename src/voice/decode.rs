//! Compressed audio decoding
//!
//! Decoding is modeled as a capability ([`AudioDecoder`]) so the encoder can
//! run against any backend. [`SymphoniaDecoder`] is the default.

use std::io::{Cursor, ErrorKind};
use std::sync::OnceLock;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, CodecRegistry, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia_adapter_libopus::OpusDecoder;

use super::Recording;
use crate::{Error, Result};

/// Per-channel float samples at the source's native rate
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// One plane per channel, all the same length, values nominally in [-1.0, 1.0]
    pub channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    /// Number of channels
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    #[must_use]
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Duration in seconds
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Turns a compressed audio blob into per-channel float samples
pub trait AudioDecoder: Send + Sync {
    /// Decode `data` tagged with `media_type`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the content is not decodable audio
    fn decode(&self, data: Vec<u8>, media_type: &str) -> Result<DecodedAudio>;
}

/// Decode a recording through `decoder` and validate the result
///
/// # Errors
///
/// - [`Error::Decode`] if the recording is empty or undecodable
/// - [`Error::UnsupportedChannels`] for anything other than mono or stereo
pub fn decode(decoder: &dyn AudioDecoder, recording: Recording) -> Result<DecodedAudio> {
    if recording.is_empty() {
        return Err(Error::Decode("recording contains no audio data".to_string()));
    }

    let chunk_count = recording.chunks().len();
    let (media_type, blob) = recording.into_blob();
    tracing::debug!(
        chunks = chunk_count,
        audio_bytes = blob.len(),
        media_type = %media_type,
        "decoding recording"
    );

    let decoded = decoder.decode(blob, &media_type)?;

    match decoded.channel_count() {
        1 | 2 => {}
        n => return Err(Error::UnsupportedChannels(n)),
    }
    if decoded.sample_rate == 0 {
        return Err(Error::Decode("decoder reported a zero sample rate".to_string()));
    }
    if let [left, right] = decoded.channels.as_slice()
        && left.len() != right.len()
    {
        return Err(Error::ChannelMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    if decoded.frames() == 0 {
        return Err(Error::Decode("no audio samples decoded".to_string()));
    }

    tracing::debug!(
        sample_rate = decoded.sample_rate,
        channels = decoded.channel_count(),
        frames = decoded.frames(),
        "recording decoded"
    );
    Ok(decoded)
}

/// symphonia's bundled codecs plus libopus for webm/ogg recordings
fn codec_registry() -> &'static CodecRegistry {
    static REGISTRY: OnceLock<CodecRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = CodecRegistry::new();
        symphonia::default::register_enabled_codecs(&mut registry);
        registry.register_all::<OpusDecoder>();
        registry
    })
}

/// Decoder backed by symphonia's probe and codec registry
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, data: Vec<u8>, media_type: &str) -> Result<DecodedAudio> {
        if data.is_empty() {
            return Err(Error::Decode("empty audio input".to_string()));
        }

        let mss = MediaSourceStream::new(
            Box::new(Cursor::new(data)),
            MediaSourceStreamOptions::default(),
        );

        let mut hint = Hint::new();
        hint.mime_type(media_type);
        if let Some(ext) = extension_for(media_type) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Decode(format!("unrecognized container ({media_type}): {e}")))?;

        let mut format = probed.format;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("no audio track found".to_string()))?;

        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut planes: Vec<Vec<f32>> = track
            .codec_params
            .channels
            .map(|c| vec![Vec::new(); c.count()])
            .unwrap_or_default();

        let mut decoder = codec_registry()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("unsupported codec: {e}")))?;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(Error::Decode(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!(error = e, "skipping corrupt packet");
                    continue;
                }
                Err(e) => return Err(Error::Decode(e.to_string())),
            };

            let spec = *decoded.spec();
            let channels = spec.channels.count();
            let frames = decoded.frames();
            if frames == 0 || channels == 0 {
                continue;
            }
            sample_rate.get_or_insert(spec.rate);
            if planes.len() != channels {
                if planes.iter().any(|p| !p.is_empty()) {
                    return Err(Error::Decode(format!(
                        "channel layout changed mid-stream ({} -> {channels})",
                        planes.len()
                    )));
                }
                planes = vec![Vec::new(); channels];
            }

            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_planar_ref(decoded);
            for (plane, samples) in planes.iter_mut().zip(buf.samples().chunks_exact(frames)) {
                plane.extend_from_slice(samples);
            }
        }

        let sample_rate =
            sample_rate.ok_or_else(|| Error::Decode("unknown sample rate".to_string()))?;

        Ok(DecodedAudio {
            sample_rate,
            channels: planes,
        })
    }
}

/// File extension hint for common recorder media types
fn extension_for(media_type: &str) -> Option<&'static str> {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "audio/wav" | "audio/wave" | "audio/x-wav" | "audio/vnd.wave" => Some("wav"),
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/ogg" | "audio/opus" => Some("ogg"),
        "audio/flac" | "audio/x-flac" => Some("flac"),
        "audio/mp4" | "audio/aac" | "audio/x-m4a" => Some("m4a"),
        "audio/webm" | "audio/x-matroska" | "video/webm" => Some("mka"),
        _ => None,
    }
}
