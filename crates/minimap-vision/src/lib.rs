pub mod circles;
pub mod config;
pub mod detector;
pub mod error;
pub mod features;
pub mod icons;
pub mod matcher;
pub mod minimap;
pub mod occlusion;
pub mod segment;

#[cfg(feature = "inspect")]
pub mod inspect;
#[cfg(not(feature = "inspect"))]
mod inspect;

pub use circles::{detect_circles, CircleCandidate};
pub use config::{expected_icon_size, ColorRange, DetectorConfig, HoughConfig, OcclusionConfig, ScoringConfig};
pub use detector::{MinimapDetector, ICONS_DIR, REGIONS_FILE};
pub use error::{AssetError, DetectionError};
pub use icons::{IconCache, IconTemplate};
pub use matcher::{CandidateScore, FeatureScorer};
pub use minimap::MinimapImage;
pub use segment::TeamMasks;

#[cfg(feature = "inspect")]
pub use inspect::{DetectionInspector, InspectionLog};
