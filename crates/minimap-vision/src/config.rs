use serde::{Deserialize, Serialize};

/// Inclusive per-channel RGB bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub min: [u8; 3],
    pub max: [u8; 3],
}

impl ColorRange {
    pub const fn new(min: [u8; 3], max: [u8; 3]) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, rgb: [u8; 3]) -> bool {
        (0..3).all(|c| rgb[c] >= self.min[c] && rgb[c] <= self.max[c])
    }
}

/// Ally marker ring color
pub const ALLY_RANGE: ColorRange = ColorRange::new([50, 130, 170], [120, 170, 255]);
/// Enemy marker ring color
pub const ENEMY_RANGE: ColorRange = ColorRange::new([150, 20, 20], [255, 100, 100]);

/// Icon diameter as a fraction of the minimap's shorter side
pub const ICON_SIZE_FRACTION: f64 = 0.08;
pub const MIN_ICON_SIZE: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughConfig {
    /// Gaussian sigma applied to the mask before edge detection
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Search radii span `[min_radius_factor * r, max_radius_factor * r]`
    pub min_radius_factor: f64,
    pub max_radius_factor: f64,
    /// Required 3×3 vote support as a fraction of the expected circumference
    pub vote_fraction: f64,
    /// Minimum center separation as a fraction of the icon diameter
    pub min_dist_factor: f64,
    /// Ring thickness removed from every detected radius
    pub halo: u32,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.0,
            canny_low: 30.0,
            canny_high: 80.0,
            min_radius_factor: 0.8,
            max_radius_factor: 1.2,
            vote_fraction: 0.4,
            min_dist_factor: 0.3,
            halo: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcclusionConfig {
    /// Overlap (IoU) above which one of the two candidates is demoted
    pub overlap_threshold: f64,
    /// Overlap above which the pair is treated as a near-duplicate
    pub near_total_threshold: f64,
    /// Extra pixels added to the halo when cutting foreground circles
    /// out of a background candidate's mask
    pub mask_margin: u32,
}

impl Default for OcclusionConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.15,
            near_total_threshold: 0.8,
            mask_margin: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub hog_orientations: usize,
    pub hog_signed: bool,
    pub hog_cell_side: usize,
    pub hog_block_side: usize,
    pub hog_block_stride: usize,
    pub histogram_bins: usize,
    /// Hue, saturation, value weights of the color similarity
    pub channel_weights: [f64; 3],
    /// Weight of the shape term; color gets the remainder
    pub shape_weight: f64,
    /// Minimum combined score for a match to be reported
    pub acceptance_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            hog_orientations: 8,
            hog_signed: false,
            hog_cell_side: 4,
            hog_block_side: 2,
            hog_block_stride: 1,
            histogram_bins: 8,
            channel_weights: [0.7, 0.2, 0.1],
            shape_weight: 0.5,
            acceptance_threshold: 0.6,
        }
    }
}

/// Every tunable of the detection pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub ally_range: ColorRange,
    pub enemy_range: ColorRange,
    pub hough: HoughConfig,
    pub occlusion: OcclusionConfig,
    pub scoring: ScoringConfig,
    /// Regions named in "between ..." descriptions
    pub closest_regions: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            ally_range: ALLY_RANGE,
            enemy_range: ENEMY_RANGE,
            hough: HoughConfig::default(),
            occlusion: OcclusionConfig::default(),
            scoring: ScoringConfig::default(),
            closest_regions: map_semantics::DEFAULT_CLOSEST_REGIONS,
        }
    }
}

/// Expected marker diameter for a minimap of the given size, always even.
pub fn expected_icon_size(width: u32, height: u32) -> u32 {
    let side = width.min(height) as f64;
    let size = ((side * ICON_SIZE_FRACTION).floor() as u32).max(MIN_ICON_SIZE);
    size - size % 2
}
