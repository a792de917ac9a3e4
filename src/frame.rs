//! Still image frames sent alongside each recording

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::Result;

/// A captured still image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFrame {
    /// Encoded image bytes
    pub data: Vec<u8>,
    /// Media type of `data` (e.g. `image/jpeg`)
    pub media_type: &'static str,
}

impl ImageFrame {
    /// File extension matching the media type
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.media_type {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }
}

/// Yields a still image at call time
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Capture the current frame
    ///
    /// # Errors
    ///
    /// Returns error if no frame can be produced
    async fn capture(&self) -> Result<ImageFrame>;
}

/// Reads the frame from an image file each time it is captured
///
/// Re-reading on every capture lets an external camera tool keep
/// overwriting the same file.
#[derive(Debug, Clone)]
pub struct FileFrameSource {
    path: PathBuf,
}

impl FileFrameSource {
    /// Create a source backed by `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FrameSource for FileFrameSource {
    async fn capture(&self) -> Result<ImageFrame> {
        let data = tokio::fs::read(&self.path).await?;
        let media_type = image_media_type(&self.path);
        tracing::debug!(path = %self.path.display(), bytes = data.len(), media_type, "frame captured");
        Ok(ImageFrame { data, media_type })
    }
}

/// Image media type from a file extension; unknown types default to jpeg
#[must_use]
pub fn image_media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_media_type() {
        assert_eq!(image_media_type(Path::new("shot.PNG")), "image/png");
        assert_eq!(image_media_type(Path::new("shot.jpeg")), "image/jpeg");
        assert_eq!(image_media_type(Path::new("shot")), "image/jpeg");
    }

    #[test]
    fn test_file_source_reads_at_capture_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.webp");
        let source = FileFrameSource::new(&path);

        std::fs::write(&path, b"first").unwrap();
        let frame = tokio_test::block_on(source.capture()).unwrap();
        assert_eq!(frame.data, b"first");
        assert_eq!(frame.media_type, "image/webp");
        assert_eq!(frame.extension(), "webp");

        std::fs::write(&path, b"second").unwrap();
        let frame = tokio_test::block_on(source.capture()).unwrap();
        assert_eq!(frame.data, b"second");
    }

    #[test]
    fn test_missing_file_errors() {
        let source = FileFrameSource::new("/nonexistent/frame.jpg");
        assert!(tokio_test::block_on(source.capture()).is_err());
    }
}
