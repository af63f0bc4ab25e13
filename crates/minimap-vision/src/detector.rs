use crate::circles::{detect_circles, CircleCandidate};
use crate::config::{expected_icon_size, DetectorConfig};
use crate::error::{AssetError, DetectionError};
use crate::icons::IconCache;
use crate::inspect::{DetectionInspector, Silent};
use crate::matcher::FeatureScorer;
use crate::minimap::MinimapImage;
use crate::occlusion::classify;
use crate::segment::segment;
use anyhow::Result;
use map_semantics::{CoordinateMapper, MapAnnotations, PixelPoint};
use minimap_state::{ChampionLocation, ChampionPosition, DetectionReport, Roster, Side};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Icon subdirectory of the data directory
pub const ICONS_DIR: &str = "icons";
/// Region annotation file in the data directory
pub const REGIONS_FILE: &str = "map_regions.json";

/// Finds roster champions on minimap screenshots.
///
/// Holds no per-call state; one detector can serve concurrent calls.
pub struct MinimapDetector {
    config: DetectorConfig,
    icons_dir: PathBuf,
    annotations: Arc<MapAnnotations>,
    mapper: CoordinateMapper,
    icons: Arc<IconCache>,
}

impl MinimapDetector {
    /// Detector reading icons from `data_dir/icons`, sharing the global icon
    /// cache.
    pub fn new(config: DetectorConfig, data_dir: &Path, annotations: Arc<MapAnnotations>) -> Self {
        Self {
            config,
            icons_dir: data_dir.join(ICONS_DIR),
            annotations,
            mapper: CoordinateMapper::default(),
            icons: IconCache::global(),
        }
    }

    /// Detector with its own copy of `data_dir/map_regions.json`.
    pub fn load(config: DetectorConfig, data_dir: &Path) -> Result<Self> {
        let annotations = MapAnnotations::load(&data_dir.join(REGIONS_FILE))?;
        Ok(Self::new(config, data_dir, Arc::new(annotations)))
    }

    pub fn with_icon_cache(mut self, icons: Arc<IconCache>) -> Self {
        self.icons = icons;
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn annotations(&self) -> &MapAnnotations {
        &self.annotations
    }

    pub fn icons_dir(&self) -> &Path {
        &self.icons_dir
    }

    pub fn locate(&self, minimap: &MinimapImage, roster: &Roster) -> DetectionReport {
        self.run(minimap, roster, &mut Silent)
    }

    pub fn locate_file(&self, path: &Path, roster: &Roster) -> Result<DetectionReport, DetectionError> {
        let minimap = MinimapImage::open(path)?;
        Ok(self.locate(&minimap, roster))
    }

    pub fn locate_bytes(&self, bytes: &[u8], roster: &Roster) -> Result<DetectionReport, DetectionError> {
        let minimap = MinimapImage::from_bytes(bytes)?;
        Ok(self.locate(&minimap, roster))
    }

    /// [`locate`](Self::locate), reporting masks, candidates and score tables
    /// to `inspector` along the way.
    #[cfg(feature = "inspect")]
    pub fn locate_inspected(
        &self,
        minimap: &MinimapImage,
        roster: &Roster,
        inspector: &mut dyn DetectionInspector,
    ) -> DetectionReport {
        self.run(minimap, roster, inspector)
    }

    fn run(
        &self,
        minimap: &MinimapImage,
        roster: &Roster,
        inspector: &mut dyn DetectionInspector,
    ) -> DetectionReport {
        let size = minimap.dimensions();
        let icon_size = expected_icon_size(size.0, size.1);
        debug!("Minimap {}x{}, expected icon size {}px", size.0, size.1, icon_size);

        let masks = segment(minimap, &self.config.ally_range, &self.config.enemy_range);
        inspector.masks(&masks);

        let mut report = DetectionReport::new(size);
        for side in [Side::Ally, Side::Enemy] {
            let champions = roster.side(side);
            if champions.is_empty() {
                continue;
            }

            let mut candidates = detect_circles(masks.side(side), icon_size, &self.config.hough);
            classify(&mut candidates, &self.config.occlusion);
            inspector.candidates(side, &candidates);
            debug!(
                "{:?}: {} candidates ({} foreground)",
                side,
                candidates.len(),
                candidates.iter().filter(|c| c.is_foreground).count()
            );

            for champion in champions {
                let location =
                    self.locate_champion(minimap, &candidates, champion, side, icon_size, inspector);
                report.push(champion, side, location);
            }
        }

        info!(
            "Located {}/{} champions on {}x{} minimap",
            report.visible_count(),
            roster.len(),
            size.0,
            size.1
        );
        report
    }

    fn locate_champion(
        &self,
        minimap: &MinimapImage,
        candidates: &[CircleCandidate],
        champion: &str,
        side: Side,
        icon_size: u32,
        inspector: &mut dyn DetectionInspector,
    ) -> ChampionLocation {
        if candidates.is_empty() {
            return ChampionLocation::NotVisible;
        }

        let template = match self.icons.get_or_load(&self.icons_dir, champion, icon_size) {
            Ok(t) => t,
            Err(e @ AssetError::Missing { .. }) => {
                debug!("{}", e);
                return ChampionLocation::NotVisible;
            }
            Err(e) => {
                warn!("Skipping {}: {}", champion, e);
                return ChampionLocation::NotVisible;
            }
        };

        let scorer = FeatureScorer::new(
            &self.config.scoring,
            &self.config.occlusion,
            self.config.hough.halo,
        );
        let scores = scorer.score_all(minimap, candidates, &template);
        inspector.scores(champion, side, &scores);

        let Some(best) = scorer.best(&scores) else {
            debug!("{}: no candidate above threshold", champion);
            return ChampionLocation::NotVisible;
        };

        let c = &candidates[best.candidate];
        let pixel = PixelPoint::new(c.x, c.y);
        let canonical = self.mapper.normalize(pixel, minimap.dimensions());
        let description = self.annotations.describe(canonical, self.config.closest_regions);
        debug!(
            "{} at ({:.1}, {:.1}) score {:.3}: {}",
            champion, c.x, c.y, best.combined, description
        );

        ChampionLocation::Visible(ChampionPosition {
            pixel,
            canonical,
            confidence: best.combined,
            description,
        })
    }
}
