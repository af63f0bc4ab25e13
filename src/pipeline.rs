use anyhow::{Context, Result};
use map_semantics::MapAnnotations;
use minimap_state::{DetectionReport, Roster};
use minimap_vision::{MinimapDetector, MinimapImage, REGIONS_FILE};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ScoutConfig;

/// Runs minimap detections on blocking worker threads.
pub struct Scout {
    detector: Arc<MinimapDetector>,
    timeout: Option<Duration>,
}

impl Scout {
    /// Build the service from `config`, loading the process-wide region
    /// annotations on first use.
    pub fn new(config: ScoutConfig) -> Result<Self> {
        let regions = config.data_dir.join(REGIONS_FILE);
        let annotations = MapAnnotations::init_global(&regions)
            .with_context(|| format!("Failed to load map regions from {}", regions.display()))?;
        let timeout = config.timeout();
        let detector = MinimapDetector::new(config.detector, &config.data_dir, annotations);

        info!(
            "Scout ready: data dir {}, timeout {:?}",
            config.data_dir.display(),
            timeout
        );
        Ok(Self::with_detector(detector, timeout))
    }

    pub fn with_detector(detector: MinimapDetector, timeout: Option<Duration>) -> Self {
        Self {
            detector: Arc::new(detector),
            timeout,
        }
    }

    pub fn detector(&self) -> &MinimapDetector {
        &self.detector
    }

    /// Detect roster champions on the minimap stored at `path`.
    pub async fn locate(&self, path: PathBuf, roster: Roster) -> Result<DetectionReport> {
        let detector = self.detector.clone();
        let report = tokio::task::spawn_blocking(move || detector.locate_file(&path, &roster))
            .await
            .context("Detection worker panicked")??;
        Ok(report)
    }

    /// Detect roster champions on an already decoded minimap.
    pub async fn locate_image(&self, minimap: MinimapImage, roster: Roster) -> Result<DetectionReport> {
        let detector = self.detector.clone();
        let report = tokio::task::spawn_blocking(move || detector.locate(&minimap, &roster))
            .await
            .context("Detection worker panicked")?;
        Ok(report)
    }

    /// [`locate`](Self::locate) bounded by the configured timeout. A result
    /// arriving after the deadline is discarded and `None` is returned.
    pub async fn locate_with_timeout(&self, path: PathBuf, roster: Roster) -> Result<Option<DetectionReport>> {
        let Some(limit) = self.timeout else {
            return self.locate(path, roster).await.map(Some);
        };

        match tokio::time::timeout(limit, self.locate(path.clone(), roster)).await {
            Ok(report) => report.map(Some),
            Err(_) => {
                warn!(
                    "Detection on {} exceeded {}ms, discarding result",
                    path.display(),
                    limit.as_millis()
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use minimap_state::ChampionLocation;
    use minimap_vision::{DetectorConfig, IconCache};

    fn scout(dir: &std::path::Path, timeout: Option<Duration>) -> Scout {
        let detector = MinimapDetector::load(DetectorConfig::default(), dir)
            .unwrap()
            .with_icon_cache(Arc::new(IconCache::new()));
        Scout::with_detector(detector, timeout)
    }

    /// Writes `icons/<name>.png` for each champion and a 200x200 minimap with
    /// one ally-ringed marker.
    fn write_marker_scene(dir: &std::path::Path, champions: &[&str]) -> PathBuf {
        let icons = dir.join(minimap_vision::ICONS_DIR);
        std::fs::create_dir_all(&icons).unwrap();
        for (i, champion) in champions.iter().enumerate() {
            let shade = 40 + 60 * i as u8;
            let icon = RgbImage::from_fn(64, 64, |x, y| {
                if (x / 8 + y / 8) % 2 == 0 {
                    Rgb([shade, 200, 60])
                } else {
                    Rgb([240, shade, 20])
                }
            });
            icon.save(icons.join(format!("{}.png", champion))).unwrap();
        }

        let mut map = RgbImage::from_pixel(200, 200, Rgb([30, 45, 35]));
        let (cx, cy) = (100.0f64, 100.0f64);
        for y in 80..=120u32 {
            for x in 80..=120u32 {
                let d = (x as f64 - cx).hypot(y as f64 - cy);
                if d <= 7.0 {
                    let on = ((x / 3) + (y / 3)) % 2 == 0;
                    map.put_pixel(x, y, if on { Rgb([40, 200, 60]) } else { Rgb([240, 40, 0]) });
                } else if d <= 9.0 {
                    map.put_pixel(x, y, Rgb([80, 150, 210]));
                }
            }
        }
        let path = dir.join("scene.png");
        map.save(&path).unwrap();
        path
    }

    fn write_blank_minimap(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("minimap.png");
        RgbImage::from_pixel(256, 256, Rgb([30, 45, 35])).save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_locate_blank_minimap() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_blank_minimap(dir.path());
        let scout = scout(dir.path(), None);

        let report = scout
            .locate(path, Roster::new(["Ahri"], ["Zed"]))
            .await
            .unwrap();
        assert_eq!(report.champions.len(), 2);
        assert!(report
            .champions
            .iter()
            .all(|c| c.location == ChampionLocation::NotVisible));
    }

    #[tokio::test]
    async fn test_locate_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let scout = scout(dir.path(), None);
        let result = scout
            .locate(dir.path().join("nope.png"), Roster::new(["Ahri"], ["Zed"]))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_generous_timeout_returns_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_blank_minimap(dir.path());
        let scout = scout(dir.path(), Some(Duration::from_secs(30)));

        let report = scout
            .locate_with_timeout(path, Roster::new(["Ahri"], ["Zed"]))
            .await
            .unwrap();
        assert!(report.is_some());
    }

    #[tokio::test]
    async fn test_locate_image() {
        let dir = tempfile::tempdir().unwrap();
        let scout = scout(dir.path(), None);
        let minimap = MinimapImage::from_rgb(RgbImage::from_pixel(64, 64, Rgb([0, 0, 0]))).unwrap();

        let report = scout
            .locate_image(minimap, Roster::new(["Ahri"], Vec::<String>::new()))
            .await
            .unwrap();
        assert_eq!(report.minimap_size, (64, 64));
        assert_eq!(report.visible_count(), 0);
    }

    #[tokio::test]
    async fn test_late_result_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("large.png");
        RgbImage::from_pixel(2000, 2000, Rgb([80, 150, 210])).save(&path).unwrap();
        let scout = scout(dir.path(), Some(Duration::from_millis(1)));

        let report = scout
            .locate_with_timeout(path, Roster::new(["Ahri"], ["Zed"]))
            .await
            .unwrap();
        assert!(report.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_detector_and_icon_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_marker_scene(dir.path(), &["Ahri", "Garen"]);
        let icons = Arc::new(IconCache::new());
        let detector = MinimapDetector::load(DetectorConfig::default(), dir.path())
            .unwrap()
            .with_icon_cache(icons.clone());
        let scout = Arc::new(Scout::with_detector(detector, None));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let scout = scout.clone();
            let path = path.clone();
            handles.push(tokio::spawn(async move {
                scout
                    .locate(path, Roster::new(["Ahri", "Garen"], Vec::<String>::new()))
                    .await
            }));
        }

        let mut reports = Vec::new();
        for handle in handles {
            reports.push(handle.await.unwrap().unwrap());
        }
        assert!(reports.iter().all(|r| *r == reports[0]));
        assert_eq!(reports[0].champions.len(), 2);
        assert_eq!(icons.len(), 2);
    }
}
