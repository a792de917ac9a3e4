//! Canonical 16-bit PCM WAV framing
//!
//! Produces the classic 44-byte `RIFF`/`fmt `/`data` layout that every PCM
//! reader accepts. All multi-byte fields are little-endian.

use crate::{Error, Result};

/// Size of the canonical header in bytes
pub const HEADER_LEN: usize = 44;

/// Bits per quantized sample
pub const BITS_PER_SAMPLE: u16 = 16;

/// Bytes per quantized sample
const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;

/// `fmt ` chunk body size for plain PCM
const FMT_CHUNK_LEN: u32 = 16;

/// `WAVE_FORMAT_PCM`
const FORMAT_PCM: u16 = 1;

/// Largest sample count whose payload still fits the 32-bit RIFF size field
pub const MAX_SAMPLES: usize = (u32::MAX as usize - 36) / BYTES_PER_SAMPLE as usize;

/// Interleave two equal-length channel planes into `L0, R0, L1, R1, ...`
///
/// # Errors
///
/// Returns [`Error::ChannelMismatch`] if the planes differ in length
pub fn interleave(left: &[f32], right: &[f32]) -> Result<Vec<f32>> {
    if left.len() != right.len() {
        return Err(Error::ChannelMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    let mut out = Vec::with_capacity(left.len() * 2);
    for (&l, &r) in left.iter().zip(right) {
        out.push(l);
        out.push(r);
    }
    Ok(out)
}

/// Quantize a float sample to signed 16-bit
///
/// Out-of-range input is hard-clamped, so `1.5` maps to `32767` and `-2.0`
/// to `-32768`. Negative values scale by 32768 and positive ones by 32767,
/// which keeps both rails reachable. `NaN` maps to silence.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn quantize(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Build the 44-byte header for a payload of `data_bytes`
#[must_use]
pub fn header(channels: u16, sample_rate: u32, data_bytes: u32) -> [u8; HEADER_LEN] {
    let block_align = channels * BYTES_PER_SAMPLE;
    let byte_rate = sample_rate * u32::from(block_align);

    let mut h = [0u8; HEADER_LEN];
    h[0..4].copy_from_slice(b"RIFF");
    h[4..8].copy_from_slice(&(36 + data_bytes).to_le_bytes());
    h[8..12].copy_from_slice(b"WAVE");
    h[12..16].copy_from_slice(b"fmt ");
    h[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    h[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
    h[22..24].copy_from_slice(&channels.to_le_bytes());
    h[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    h[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    h[32..34].copy_from_slice(&block_align.to_le_bytes());
    h[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    h[36..40].copy_from_slice(b"data");
    h[40..44].copy_from_slice(&data_bytes.to_le_bytes());
    h
}

/// Quantize interleaved samples and frame them as a complete WAV file
///
/// The output is exactly `44 + samples.len() * 2` bytes. Callers keep
/// `samples.len()` at or below [`MAX_SAMPLES`]; the encoder enforces this
/// through its duration limit.
#[must_use]
pub fn quantize_and_frame(samples: &[f32], channels: u16, sample_rate: u32) -> Vec<u8> {
    let data_len = samples.len() * usize::from(BYTES_PER_SAMPLE);
    let data_bytes = u32::try_from(data_len).unwrap_or(u32::MAX - 36);

    let mut out = Vec::with_capacity(HEADER_LEN + data_len);
    out.extend_from_slice(&header(channels, sample_rate, data_bytes));
    for &sample in samples {
        out.extend_from_slice(&quantize(sample).to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(buf: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([buf[offset], buf[offset + 1]])
    }

    fn u32_at(buf: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn test_interleave_alternates_channels() {
        let left = [0.1, 0.2, 0.3];
        let right = [-0.1, -0.2, -0.3];
        let out = interleave(&left, &right).unwrap();

        assert_eq!(out.len(), 6);
        for i in 0..3 {
            assert_eq!(out[2 * i], left[i]);
            assert_eq!(out[2 * i + 1], right[i]);
        }
    }

    #[test]
    fn test_interleave_empty() {
        assert!(interleave(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_interleave_length_mismatch() {
        let err = interleave(&[0.0, 0.0], &[0.0]).unwrap_err();
        assert!(matches!(err, Error::ChannelMismatch { left: 2, right: 1 }));
    }

    #[test]
    fn test_quantize_rails() {
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(-1.0), -32768);
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(0.5), 16383);
        assert_eq!(quantize(-0.5), -16384);
    }

    #[test]
    fn test_quantize_clamps_out_of_range() {
        assert_eq!(quantize(1.5), quantize(1.0));
        assert_eq!(quantize(-2.0), quantize(-1.0));
        assert_eq!(quantize(f32::INFINITY), 32767);
        assert_eq!(quantize(f32::NEG_INFINITY), -32768);
    }

    #[test]
    fn test_header_layout_mono() {
        let h = header(1, 48000, 96000);

        assert_eq!(&h[0..4], b"RIFF");
        assert_eq!(u32_at(&h, 4), 36 + 96000);
        assert_eq!(&h[8..12], b"WAVE");
        assert_eq!(&h[12..16], b"fmt ");
        assert_eq!(u32_at(&h, 16), 16);
        assert_eq!(u16_at(&h, 20), 1);
        assert_eq!(u16_at(&h, 22), 1);
        assert_eq!(u32_at(&h, 24), 48000);
        assert_eq!(u32_at(&h, 28), 96000);
        assert_eq!(u16_at(&h, 32), 2);
        assert_eq!(u16_at(&h, 34), 16);
        assert_eq!(&h[36..40], b"data");
        assert_eq!(u32_at(&h, 40), 96000);
    }

    #[test]
    fn test_header_layout_stereo() {
        let h = header(2, 44100, 400);

        assert_eq!(u16_at(&h, 22), 2);
        assert_eq!(u32_at(&h, 28), 44100 * 4);
        assert_eq!(u16_at(&h, 32), 4);
    }

    #[test]
    fn test_frame_length_and_payload() {
        let samples = [0.0, 1.0, -1.0, 1.5, -2.0];
        let wav = quantize_and_frame(&samples, 1, 16000);

        assert_eq!(wav.len(), HEADER_LEN + samples.len() * 2);
        assert_eq!(u32_at(&wav, 40), 10);
        assert_eq!(u16_at(&wav, 22), 1);

        let payload: Vec<i16> = wav[HEADER_LEN..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(payload, vec![0, 32767, -32768, 32767, -32768]);
    }

    #[test]
    fn test_frame_empty_payload() {
        let wav = quantize_and_frame(&[], 1, 8000);
        assert_eq!(wav.len(), HEADER_LEN);
        assert_eq!(u32_at(&wav, 4), 36);
        assert_eq!(u32_at(&wav, 40), 0);
    }
}
