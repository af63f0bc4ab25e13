use crate::error::AssetError;
use crate::segment::MASK_ON;
use image::{GrayImage, Luma, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};
use tracing::{debug, info};

/// A champion icon resized to the expected marker size, with its circular
/// footprint.
#[derive(Debug, Clone)]
pub struct IconTemplate {
    pub champion: String,
    pub size: u32,
    pub rgb: RgbImage,
    pub mask: GrayImage,
}

impl IconTemplate {
    /// Load `icons_dir/<champion>.png` and resize it to `size`×`size`.
    pub fn load(icons_dir: &Path, champion: &str, size: u32) -> Result<Self, AssetError> {
        let path = icon_path(icons_dir, champion);
        if !path.exists() {
            return Err(AssetError::Missing {
                champion: champion.to_string(),
                path,
            });
        }

        let img = image::open(&path)
            .map_err(|source| AssetError::Unreadable {
                path: path.clone(),
                source,
            })?
            .to_rgb8();
        if img.width() < size || img.height() < size {
            return Err(AssetError::TooSmall {
                path,
                width: img.width(),
                height: img.height(),
                required: size,
            });
        }

        Ok(Self::from_rgb(champion, &img, size))
    }

    pub fn from_rgb(champion: &str, icon: &RgbImage, size: u32) -> Self {
        let rgb = image::imageops::resize(icon, size, size, image::imageops::FilterType::Triangle);
        Self {
            champion: champion.to_string(),
            size,
            rgb,
            mask: circle_mask(size),
        }
    }

    /// The template centered on a `side`×`side` black canvas, with the
    /// matching centered mask.
    pub fn on_canvas(&self, side: u32) -> (RgbImage, GrayImage) {
        let offset = (side.saturating_sub(self.size) / 2) as i64;
        let mut rgb = RgbImage::new(side, side);
        let mut mask = GrayImage::new(side, side);
        image::imageops::replace(&mut rgb, &self.rgb, offset, offset);
        image::imageops::replace(&mut mask, &self.mask, offset, offset);
        (rgb, mask)
    }
}

pub fn icon_path(icons_dir: &Path, champion: &str) -> PathBuf {
    icons_dir.join(format!("{}.png", champion))
}

/// Filled disc of diameter `size`.
fn circle_mask(size: u32) -> GrayImage {
    let r = size as f64 / 2.0;
    let mut mask = GrayImage::new(size, size);
    for (x, y, px) in mask.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - r;
        let dy = y as f64 + 0.5 - r;
        if dx.hypot(dy) <= r {
            *px = Luma([MASK_ON]);
        }
    }
    mask
}

type IconKey = (PathBuf, String, u32);

static GLOBAL_ICON_CACHE: OnceLock<Arc<IconCache>> = OnceLock::new();

/// Load-once, read-many store of icon templates keyed by
/// (icon directory, champion, size). Failed loads are not remembered.
#[derive(Default)]
pub struct IconCache {
    templates: RwLock<HashMap<IconKey, Arc<IconTemplate>>>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> Arc<IconCache> {
        GLOBAL_ICON_CACHE
            .get_or_init(|| Arc::new(IconCache::new()))
            .clone()
    }

    pub fn get_or_load(
        &self,
        icons_dir: &Path,
        champion: &str,
        size: u32,
    ) -> Result<Arc<IconTemplate>, AssetError> {
        let key = (icons_dir.to_path_buf(), champion.to_string(), size);
        {
            let templates = self.templates.read().unwrap_or_else(|e| e.into_inner());
            if let Some(t) = templates.get(&key) {
                return Ok(t.clone());
            }
        }

        let template = Arc::new(IconTemplate::load(icons_dir, champion, size)?);
        let mut templates = self.templates.write().unwrap_or_else(|e| e.into_inner());
        // another worker may have loaded it meanwhile
        let cached = templates.entry(key).or_insert_with(|| template).clone();
        debug!("Cached {}px icon for {}", size, champion);
        Ok(cached)
    }

    pub fn len(&self) -> usize {
        self.templates.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut templates = self.templates.write().unwrap_or_else(|e| e.into_inner());
        info!("Dropping {} cached icon templates", templates.len());
        templates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::count_on;
    use image::Rgb;

    fn write_icon(dir: &Path, champion: &str, side: u32) {
        let img = RgbImage::from_pixel(side, side, Rgb([200, 100, 50]));
        img.save(icon_path(dir, champion)).unwrap();
    }

    #[test]
    fn test_missing_icon() {
        let dir = tempfile::tempdir().unwrap();
        let err = IconTemplate::load(dir.path(), "Nobody", 16).unwrap_err();
        assert!(matches!(err, AssetError::Missing { .. }));
    }

    #[test]
    fn test_unreadable_icon() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(icon_path(dir.path(), "Broken"), b"not a png").unwrap();
        let err = IconTemplate::load(dir.path(), "Broken", 16).unwrap_err();
        assert!(matches!(err, AssetError::Unreadable { .. }));
    }

    #[test]
    fn test_too_small_icon() {
        let dir = tempfile::tempdir().unwrap();
        write_icon(dir.path(), "Tiny", 8);
        let err = IconTemplate::load(dir.path(), "Tiny", 16).unwrap_err();
        assert!(matches!(err, AssetError::TooSmall { required: 16, .. }));
    }

    #[test]
    fn test_template_resized_with_mask() {
        let dir = tempfile::tempdir().unwrap();
        write_icon(dir.path(), "Ahri", 64);
        let t = IconTemplate::load(dir.path(), "Ahri", 20).unwrap();
        assert_eq!(t.rgb.dimensions(), (20, 20));
        assert_eq!(t.mask.get_pixel(10, 10).0[0], MASK_ON);
        assert_eq!(t.mask.get_pixel(0, 0).0[0], 0);

        let (canvas, mask) = t.on_canvas(28);
        assert_eq!(canvas.dimensions(), (28, 28));
        assert_eq!(count_on(&mask), count_on(&t.mask));
        assert_eq!(mask.get_pixel(4, 4).0[0], 0);
        assert!(canvas.get_pixel(14, 14).0[0] > 190);
    }

    #[test]
    fn test_cache_reuses_and_skips_failures() {
        let dir = tempfile::tempdir().unwrap();
        write_icon(dir.path(), "Ahri", 32);
        let cache = IconCache::new();

        let a = cache.get_or_load(dir.path(), "Ahri", 16).unwrap();
        let b = cache.get_or_load(dir.path(), "Ahri", 16).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(cache.get_or_load(dir.path(), "Garen", 16).is_err());
        assert_eq!(cache.len(), 1);

        // a failure is retried once the asset appears
        write_icon(dir.path(), "Garen", 32);
        assert!(cache.get_or_load(dir.path(), "Garen", 16).is_ok());
        assert_eq!(cache.len(), 2);
    }
}
