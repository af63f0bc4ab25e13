use crate::circles::CircleCandidate;
use crate::config::OcclusionConfig;
use crate::segment::MASK_ON;
use image::{GrayImage, Luma};
use std::f64::consts::PI;
use tracing::debug;

/// Intersection over union of two circles.
pub fn circle_overlap(a: &CircleCandidate, b: &CircleCandidate) -> f64 {
    let (r1, r2) = (a.radius, b.radius);
    let d = a.distance_to(b);

    if d >= r1 + r2 {
        return 0.0;
    }
    if d <= (r1 - r2).abs() {
        let (small, large) = (r1.min(r2), r1.max(r2));
        if large <= 0.0 {
            return 0.0;
        }
        return (small * small) / (large * large);
    }

    let alpha = ((d * d + r1 * r1 - r2 * r2) / (2.0 * d * r1)).clamp(-1.0, 1.0).acos();
    let beta = ((d * d + r2 * r2 - r1 * r1) / (2.0 * d * r2)).clamp(-1.0, 1.0).acos();
    let kite = ((-d + r1 + r2) * (d + r1 - r2) * (d - r1 + r2) * (d + r1 + r2))
        .max(0.0)
        .sqrt();
    let intersection = r1 * r1 * alpha + r2 * r2 * beta - 0.5 * kite;
    let union = PI * (r1 * r1 + r2 * r2) - intersection;
    if union <= 0.0 {
        return 0.0;
    }
    (intersection / union).clamp(0.0, 1.0)
}

/// Demote candidates that sit behind another one.
///
/// Near-total overlaps lose the lower-scored circle; partial overlaps lose the
/// larger one. Ties go against the later candidate.
pub fn classify(candidates: &mut [CircleCandidate], config: &OcclusionConfig) {
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let ratio = circle_overlap(&candidates[i], &candidates[j]);
            if ratio <= config.overlap_threshold {
                continue;
            }
            let demoted = if ratio > config.near_total_threshold {
                if candidates[j].initial_score <= candidates[i].initial_score {
                    j
                } else {
                    i
                }
            } else if candidates[j].radius >= candidates[i].radius {
                j
            } else {
                i
            };
            debug!(
                "Overlap {:.2} between candidates {} and {}, demoting {}",
                ratio, i, j, demoted
            );
            candidates[demoted].is_foreground = false;
        }
    }
}

/// Visibility mask of `candidates[index]` over a `side`×`side` region whose
/// top-left pixel is `origin`.
///
/// Background candidates exclude every overlapping foreground circle, grown
/// by `halo + margin`.
pub fn occlusion_mask(
    candidates: &[CircleCandidate],
    index: usize,
    origin: (i64, i64),
    side: u32,
    halo: u32,
    margin: u32,
) -> GrayImage {
    let me = &candidates[index];
    let grow = (halo + margin) as f64;
    let occluders: Vec<&CircleCandidate> = if me.is_foreground {
        Vec::new()
    } else {
        candidates
            .iter()
            .enumerate()
            .filter(|&(k, c)| k != index && c.is_foreground && me.distance_to(c) < me.radius + c.radius)
            .map(|(_, c)| c)
            .collect()
    };

    let mut mask = GrayImage::new(side, side);
    for (x, y, px) in mask.enumerate_pixels_mut() {
        let ix = (origin.0 + x as i64) as f64;
        let iy = (origin.1 + y as i64) as f64;
        if !me.contains(ix, iy) {
            continue;
        }
        if occluders
            .iter()
            .any(|c| (ix - c.x).hypot(iy - c.y) <= c.radius + grow)
        {
            continue;
        }
        *px = Luma([MASK_ON]);
    }
    mask
}
