use crate::error::DetectionError;
use image::RgbImage;
use std::path::Path;

/// A decoded, cropped minimap screenshot.
#[derive(Debug, Clone)]
pub struct MinimapImage {
    rgb: RgbImage,
}

impl MinimapImage {
    pub fn open(path: &Path) -> Result<Self, DetectionError> {
        let decoded = image::open(path).map_err(|source| DetectionError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_rgb(decoded.to_rgb8())
    }

    /// Decode PNG/JPEG/... bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DetectionError> {
        let decoded = image::load_from_memory(bytes)?;
        Self::from_rgb(decoded.to_rgb8())
    }

    pub fn from_rgb(rgb: RgbImage) -> Result<Self, DetectionError> {
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectionError::EmptyImage { width, height });
        }
        Ok(Self { rgb })
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgb.dimensions()
    }
}
