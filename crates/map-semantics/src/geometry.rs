use serde::{Deserialize, Serialize};

/// Number of vertices used to approximate an ellipse region.
pub const ELLIPSE_VERTICES: usize = 32;

/// A point in the canonical minimap frame (0.0-512.0 on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPoint {
    pub x: f64,
    pub y: f64,
}

impl CanonicalPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &CanonicalPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A simple polygon given by its ordered vertices (implicitly closed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<CanonicalPoint>,
}

impl Polygon {
    /// Build a polygon. Returns `None` for fewer than 3 vertices or any
    /// non-finite coordinate.
    pub fn new(vertices: Vec<CanonicalPoint>) -> Option<Self> {
        if vertices.len() < 3 || vertices.iter().any(|v| !v.x.is_finite() || !v.y.is_finite()) {
            return None;
        }
        Some(Self { vertices })
    }

    /// Polygon approximation of a (possibly rotated) ellipse.
    /// `rotation_deg` is measured clockwise in image coordinates.
    pub fn from_ellipse(cx: f64, cy: f64, rx: f64, ry: f64, rotation_deg: f64) -> Option<Self> {
        if rx <= 0.0 || ry <= 0.0 {
            return None;
        }
        let (sin_r, cos_r) = rotation_deg.to_radians().sin_cos();
        let vertices = (0..ELLIPSE_VERTICES)
            .map(|i| {
                let t = i as f64 / ELLIPSE_VERTICES as f64 * std::f64::consts::TAU;
                let (sin_t, cos_t) = t.sin_cos();
                CanonicalPoint::new(
                    cx + rx * cos_t * cos_r - ry * sin_t * sin_r,
                    cy + rx * cos_t * sin_r + ry * sin_t * cos_r,
                )
            })
            .collect();
        Self::new(vertices)
    }

    pub fn vertices(&self) -> &[CanonicalPoint] {
        &self.vertices
    }

    fn edges(&self) -> impl Iterator<Item = (&CanonicalPoint, &CanonicalPoint)> {
        self.vertices
            .iter()
            .zip(self.vertices.iter().cycle().skip(1))
    }

    /// Even-odd containment test. Points on the boundary are not inside.
    pub fn contains_strictly(&self, p: &CanonicalPoint) -> bool {
        if self.boundary_distance(p) < 1e-9 {
            return false;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Shortest distance from `p` to any edge of the polygon.
    pub fn boundary_distance(&self, p: &CanonicalPoint) -> f64 {
        self.edges()
            .map(|(a, b)| segment_distance(p, a, b))
            .fold(f64::INFINITY, f64::min)
    }

    /// Distance from `p` to the polygon as a filled area: 0 inside.
    pub fn distance(&self, p: &CanonicalPoint) -> f64 {
        if self.contains_strictly(p) {
            0.0
        } else {
            self.boundary_distance(p)
        }
    }
}

fn segment_distance(p: &CanonicalPoint, a: &CanonicalPoint, b: &CanonicalPoint) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq < f64::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(&CanonicalPoint::new(a.x + t * dx, a.y + t * dy))
}
