//! The loaded image backing an annotation session.

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::error::EditorError;

/// A decoded pixel buffer plus the path it came from.
///
/// The buffer is treated as immutable for the lifetime of a session;
/// loading a new image replaces it wholesale.
#[derive(Debug, Clone)]
pub struct ImageRef {
    /// Where the image was loaded from, when it came from disk
    pub path: Option<PathBuf>,
    /// Decoded RGBA pixels
    pub pixels: RgbaImage,
}

impl ImageRef {
    /// Decode an image file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EditorError> {
        let path = path.as_ref();
        let decoded = image::open(path)?;
        let pixels = decoded.to_rgba8();
        log::info!(
            "Loaded image {:?} ({}x{})",
            path,
            pixels.width(),
            pixels.height()
        );
        Ok(Self {
            path: Some(path.to_path_buf()),
            pixels,
        })
    }

    /// Wrap an in-memory buffer. Used by tests and embedding callers
    /// that decode images themselves.
    pub fn from_pixels(pixels: RgbaImage) -> Self {
        Self { path: None, pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Path formatted for export metadata; empty for in-memory buffers.
    pub fn path_string(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pixels_dimensions() {
        let img = ImageRef::from_pixels(RgbaImage::new(64, 48));
        assert_eq!(img.width(), 64);
        assert_eq!(img.height(), 48);
        assert_eq!(img.path_string(), "");
    }

    #[test]
    fn test_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.png");
        RgbaImage::new(32, 16).save(&path).unwrap();

        let img = ImageRef::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (32, 16));
        assert_eq!(img.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_open_missing_file_is_decode_error() {
        let err = ImageRef::open("/nonexistent/image.png").unwrap_err();
        assert!(matches!(err, EditorError::Decode(_)));
    }
}
