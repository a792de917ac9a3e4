//! Recorded audio as an ordered sequence of compressed chunks

use std::path::Path;

use crate::Result;

/// Default chunk size when slicing a recording (16 KiB)
pub const DEFAULT_CHUNK_BYTES: usize = 16 * 1024;

/// A finished recording: compressed chunks in capture order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    media_type: String,
    chunks: Vec<Vec<u8>>,
}

impl Recording {
    /// Build a recording from chunks already in capture order
    #[must_use]
    pub fn new(media_type: impl Into<String>, chunks: Vec<Vec<u8>>) -> Self {
        Self {
            media_type: media_type.into(),
            chunks,
        }
    }

    /// Load a recorded file and split it into `chunk_bytes`-sized chunks
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub fn from_file(path: &Path, chunk_bytes: usize) -> Result<Self> {
        let data = std::fs::read(path)?;
        let media_type = media_type_for_path(path);

        tracing::debug!(
            path = %path.display(),
            bytes = data.len(),
            media_type,
            "loaded recording from file"
        );

        let mut session = CaptureSession::new(media_type);
        for chunk in data.chunks(chunk_bytes.max(1)) {
            session.push_chunk(chunk.to_vec());
        }
        Ok(session.finish())
    }

    /// Media type of the compressed container (e.g. `audio/webm`)
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Chunks in capture order
    #[must_use]
    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    /// Total byte length across all chunks
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// True if no audio bytes were captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.byte_len() == 0
    }

    /// Concatenate all chunks into a single blob
    #[must_use]
    pub fn into_blob(self) -> (String, Vec<u8>) {
        (self.media_type, self.chunks.concat())
    }
}

/// One push-to-talk capture in progress
///
/// Owns the chunk buffer for a single recording so nothing about the capture
/// lives in shared state. Consumed by [`CaptureSession::finish`].
#[derive(Debug)]
pub struct CaptureSession {
    media_type: String,
    chunks: Vec<Vec<u8>>,
}

impl CaptureSession {
    /// Start a capture producing chunks of `media_type`
    #[must_use]
    pub fn new(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            chunks: Vec::new(),
        }
    }

    /// Append the next chunk from the recording device
    pub fn push_chunk(&mut self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.chunks.push(chunk);
    }

    /// Number of chunks received so far
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Finish the capture and hand over the chunk sequence
    #[must_use]
    pub fn finish(self) -> Recording {
        tracing::debug!(chunks = self.chunks.len(), "capture session finished");
        Recording::new(self.media_type, self.chunks)
    }
}

/// Guess an audio media type from a file extension
#[must_use]
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg" | "oga" | "opus") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("m4a" | "mp4" | "aac") => "audio/mp4",
        Some("mkv" | "mka") => "audio/x-matroska",
        _ => "audio/webm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_preserves_order_and_skips_empty() {
        let mut session = CaptureSession::new("audio/webm");
        session.push_chunk(vec![1, 2]);
        session.push_chunk(Vec::new());
        session.push_chunk(vec![3]);
        assert_eq!(session.chunk_count(), 2);

        let recording = session.finish();
        assert_eq!(recording.media_type(), "audio/webm");
        assert_eq!(recording.byte_len(), 3);

        let (media_type, blob) = recording.into_blob();
        assert_eq!(media_type, "audio/webm");
        assert_eq!(blob, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_recording() {
        let recording = Recording::new("audio/webm", vec![Vec::new()]);
        assert!(recording.is_empty());
    }

    #[test]
    fn test_from_file_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp3");
        std::fs::write(&path, vec![7u8; 10]).unwrap();

        let recording = Recording::from_file(&path, 4).unwrap();
        assert_eq!(recording.media_type(), "audio/mpeg");
        assert_eq!(recording.chunks().len(), 3);
        assert_eq!(recording.chunks()[2].len(), 2);
    }

    #[test]
    fn test_media_type_for_path() {
        assert_eq!(media_type_for_path(Path::new("a.WAV")), "audio/wav");
        assert_eq!(media_type_for_path(Path::new("a.ogg")), "audio/ogg");
        assert_eq!(media_type_for_path(Path::new("a")), "audio/webm");
    }
}
