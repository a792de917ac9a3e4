//! Shared test utilities

#![allow(dead_code)]

use std::io::Cursor;

use glimpse::Recording;
use glimpse::voice::wav;

/// Generate sine wave audio samples
pub fn generate_sine_samples(
    frequency: f32,
    sample_rate: u32,
    duration_secs: f32,
    amplitude: f32,
) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Quantize float samples with the encoder's own 16-bit rule
pub fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples.iter().copied().map(wav::quantize).collect()
}

/// Encode interleaved 16-bit samples as a WAV container
pub fn pcm16_container(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("failed to create writer");
    for &s in samples {
        writer.write_sample(s).expect("failed to write sample");
    }
    writer.finalize().expect("failed to finalize wav");
    cursor.into_inner()
}

/// Split a WAV container into `parts` roughly equal chunks, as a recorder would deliver it
pub fn split_into_chunks(container: &[u8], parts: usize) -> Recording {
    split_media(container, parts, "audio/wav")
}

/// Split any container into `parts` roughly equal chunks tagged `media_type`
pub fn split_media(container: &[u8], parts: usize, media_type: &str) -> Recording {
    let size = container.len().div_ceil(parts);
    Recording::new(
        media_type,
        container.chunks(size).map(<[u8]>::to_vec).collect(),
    )
}

/// Read back a WAV file as (spec, samples)
pub fn read_wav(wav: &[u8]) -> (hound::WavSpec, Vec<i16>) {
    let mut reader = hound::WavReader::new(Cursor::new(wav)).expect("invalid wav");
    let spec = reader.spec();
    let samples = reader
        .samples::<i16>()
        .map(|s| s.expect("bad sample"))
        .collect();
    (spec, samples)
}

/// Read a little-endian u32 header field
pub fn u32_at(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

/// Read a little-endian u16 header field
pub fn u16_at(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}
