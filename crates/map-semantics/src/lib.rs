//! Static map knowledge for the minimap: labeled regions of the canonical
//! 512×512 frame, pixel ⇄ canonical conversion, and game-unit distances.

pub mod annotations;
pub mod coords;
pub mod distance;
pub mod geometry;

pub use annotations::{MapAnnotations, RegionAnnotation, DEFAULT_CLOSEST_REGIONS, UNMAPPED_AREA};
pub use coords::{CoordinateMapper, PixelPoint, CANONICAL_SIZE};
pub use distance::{ChampionPair, GAME_UNITS_PER_CANONICAL_PIXEL};
pub use geometry::{CanonicalPoint, Polygon};
