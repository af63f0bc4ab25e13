use crate::geometry::CanonicalPoint;
use serde::{Deserialize, Serialize};

/// Side length of the canonical minimap frame.
pub const CANONICAL_SIZE: f64 = 512.0;

/// A position in source-minimap pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &PixelPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Linear mapping between a minimap's pixel grid and the canonical frame.
///
/// Both directions are pure functions of the minimap's `(width, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateMapper {
    reference_size: (f64, f64),
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self {
            reference_size: (CANONICAL_SIZE, CANONICAL_SIZE),
        }
    }
}

impl CoordinateMapper {
    pub fn new(reference_width: f64, reference_height: f64) -> Self {
        Self {
            reference_size: (reference_width, reference_height),
        }
    }

    pub fn reference_size(&self) -> (f64, f64) {
        self.reference_size
    }

    /// Pixel coordinates in a `(width, height)` minimap → canonical frame.
    pub fn normalize(&self, point: PixelPoint, size: (u32, u32)) -> CanonicalPoint {
        let (w, h) = dims(size);
        CanonicalPoint::new(
            point.x / w * self.reference_size.0,
            point.y / h * self.reference_size.1,
        )
    }

    /// Inverse of [`normalize`](Self::normalize) for the same minimap size.
    pub fn denormalize(&self, point: CanonicalPoint, size: (u32, u32)) -> PixelPoint {
        let (w, h) = dims(size);
        PixelPoint::new(
            point.x / self.reference_size.0 * w,
            point.y / self.reference_size.1 * h,
        )
    }
}

fn dims(size: (u32, u32)) -> (f64, f64) {
    (size.0.max(1) as f64, size.1.max(1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_many_sizes() {
        let mapper = CoordinateMapper::default();
        let sizes = [(512, 512), (200, 200), (317, 289), (1080, 1080), (13, 900)];
        for &size in &sizes {
            for &(x, y) in &[(0.0, 0.0), (12.5, 7.25), (size.0 as f64 - 1.0, size.1 as f64 / 3.0)] {
                let p = PixelPoint::new(x, y);
                let back = mapper.denormalize(mapper.normalize(p, size), size);
                assert!(
                    p.distance(&back) < 1e-9,
                    "round trip drifted for {:?} at size {:?}: {:?}",
                    p,
                    size,
                    back
                );
            }
        }
    }

    #[test]
    fn test_normalize_scales_to_reference() {
        let mapper = CoordinateMapper::default();
        let c = mapper.normalize(PixelPoint::new(100.0, 50.0), (200, 100));
        assert!((c.x - 256.0).abs() < 1e-9);
        assert!((c.y - 256.0).abs() < 1e-9);
    }
}
