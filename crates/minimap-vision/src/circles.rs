use crate::config::HoughConfig;
use crate::segment::count_on;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Minimum |cos| between an edge gradient and the radial direction for the
/// edge to count towards a center's radius.
const RADIAL_ALIGNMENT: f64 = 0.7;

/// A circular marker hypothesis in minimap pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleCandidate {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub initial_score: f64,
    pub is_foreground: bool,
}

impl CircleCandidate {
    pub fn distance_to(&self, other: &CircleCandidate) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (x - self.x).hypot(y - self.y) <= self.radius
    }
}

struct EdgePoint {
    x: f64,
    y: f64,
    dx: f64,
    dy: f64,
}

struct Hypothesis {
    x: u32,
    y: u32,
    support: u32,
}

/// Find circular markers in a team mask.
///
/// Returns foreground candidates with `initial_score = 1.0`, largest radius
/// first.
pub fn detect_circles(mask: &GrayImage, icon_size: u32, config: &HoughConfig) -> Vec<CircleCandidate> {
    let (w, h) = mask.dimensions();
    if w < 3 || h < 3 || count_on(mask) == 0 {
        return Vec::new();
    }

    let expected_radius = icon_size as f64 / 2.0;
    let r_min = ((expected_radius * config.min_radius_factor).floor() as u32).max(1);
    let r_max = ((expected_radius * config.max_radius_factor).floor() as u32).max(r_min);

    let smoothed = if config.blur_sigma > 0.0 {
        imageproc::filter::gaussian_blur_f32(mask, config.blur_sigma)
    } else {
        mask.clone()
    };
    let edges = imageproc::edges::canny(&smoothed, config.canny_low, config.canny_high);
    let points = edge_points(&smoothed, &edges);
    if points.is_empty() {
        return Vec::new();
    }

    let accumulator = vote(&points, w, h, r_min, r_max);
    let support = window_support(&accumulator, w, h);
    let min_support = config.vote_fraction * 2.0 * PI * expected_radius;
    let min_dist = config.min_dist_factor * icon_size as f64;

    let mut hypotheses = local_maxima(&support, w, h, min_support);
    hypotheses.sort_by(|a, b| b.support.cmp(&a.support).then((a.y, a.x).cmp(&(b.y, b.x))));

    let centers = hypotheses
        .into_iter()
        .map(|hyp| refine_center(&accumulator, w, h, hyp.x, hyp.y));
    let mut candidates: Vec<CircleCandidate> = accept_centers(centers, min_dist, |cx, cy| {
        let radius = estimate_radius(&points, cx, cy, r_min, r_max, config.vote_fraction);
        if radius.is_none() {
            debug!("Dropping center ({:.1}, {:.1}): no radius support", cx, cy);
        }
        radius
    })
    .into_iter()
    .map(|(x, y, radius)| CircleCandidate {
        x,
        y,
        radius: (radius - config.halo as f64).max(1.0),
        initial_score: 1.0,
        is_foreground: true,
    })
    .collect();

    candidates.sort_by(|a, b| b.radius.total_cmp(&a.radius));
    debug!(
        "Circle search r={}..={} found {} candidates",
        r_min,
        r_max,
        candidates.len()
    );
    candidates
}

fn edge_points(smoothed: &GrayImage, edges: &GrayImage) -> Vec<EdgePoint> {
    let gx = imageproc::gradients::horizontal_sobel(smoothed);
    let gy = imageproc::gradients::vertical_sobel(smoothed);

    let mut points = Vec::new();
    for (x, y, px) in edges.enumerate_pixels() {
        if px.0[0] == 0 {
            continue;
        }
        let gxv = gx.get_pixel(x, y).0[0] as f64;
        let gyv = gy.get_pixel(x, y).0[0] as f64;
        let mag = gxv.hypot(gyv);
        if mag < 1e-6 {
            continue;
        }
        points.push(EdgePoint {
            x: x as f64,
            y: y as f64,
            dx: gxv / mag,
            dy: gyv / mag,
        });
    }
    points
}

/// Every edge point votes along both directions of its gradient, once per
/// radius in range.
fn vote(points: &[EdgePoint], w: u32, h: u32, r_min: u32, r_max: u32) -> Vec<u32> {
    let mut accumulator = vec![0u32; (w * h) as usize];
    for p in points {
        for r in r_min..=r_max {
            let r = r as f64;
            for sign in [1.0, -1.0] {
                let vx = (p.x + sign * p.dx * r).round();
                let vy = (p.y + sign * p.dy * r).round();
                if vx >= 0.0 && vy >= 0.0 && vx < w as f64 && vy < h as f64 {
                    accumulator[vy as usize * w as usize + vx as usize] += 1;
                }
            }
        }
    }
    accumulator
}

/// Sum of votes in the 3×3 window around each pixel.
fn window_support(accumulator: &[u32], w: u32, h: u32) -> Vec<u32> {
    let (w, h) = (w as i64, h as i64);
    let mut support = vec![0u32; accumulator.len()];
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0;
            for ny in (y - 1).max(0)..=(y + 1).min(h - 1) {
                for nx in (x - 1).max(0)..=(x + 1).min(w - 1) {
                    sum += accumulator[(ny * w + nx) as usize];
                }
            }
            support[(y * w + x) as usize] = sum;
        }
    }
    support
}

fn local_maxima(support: &[u32], w: u32, h: u32, min_support: f64) -> Vec<Hypothesis> {
    let (wi, hi) = (w as i64, h as i64);
    let mut maxima = Vec::new();
    for y in 0..hi {
        for x in 0..wi {
            let idx = (y * wi + x) as usize;
            let val = support[idx];
            if (val as f64) < min_support {
                continue;
            }
            let mut is_max = true;
            'window: for ny in (y - 1).max(0)..=(y + 1).min(hi - 1) {
                for nx in (x - 1).max(0)..=(x + 1).min(wi - 1) {
                    let nidx = (ny * wi + nx) as usize;
                    if nidx == idx {
                        continue;
                    }
                    // plateaus keep their first pixel only
                    if support[nidx] > val || (support[nidx] == val && nidx < idx) {
                        is_max = false;
                        break 'window;
                    }
                }
            }
            if is_max {
                maxima.push(Hypothesis {
                    x: x as u32,
                    y: y as u32,
                    support: val,
                });
            }
        }
    }
    maxima
}

/// Vote-weighted centroid of the 3×3 window.
fn refine_center(accumulator: &[u32], w: u32, h: u32, x: u32, y: u32) -> (f64, f64) {
    let (wi, hi) = (w as i64, h as i64);
    let (x, y) = (x as i64, y as i64);
    let (mut sx, mut sy, mut total) = (0.0, 0.0, 0.0);
    for ny in (y - 1).max(0)..=(y + 1).min(hi - 1) {
        for nx in (x - 1).max(0)..=(x + 1).min(wi - 1) {
            let v = accumulator[(ny * wi + nx) as usize] as f64;
            sx += v * nx as f64;
            sy += v * ny as f64;
            total += v;
        }
    }
    if total == 0.0 {
        (x as f64, y as f64)
    } else {
        (sx / total, sy / total)
    }
}

/// Most populated integer distance bin of radially aligned edge points,
/// refined by its neighbouring bins.
///
/// Bins are compared by their 3-bin neighbourhood so an edge that straddles
/// two bins is not outvoted by a sharper inner edge. Ties go to the larger
/// radius, which is the outer boundary of a ring.
fn estimate_radius(
    points: &[EdgePoint],
    cx: f64,
    cy: f64,
    r_min: u32,
    r_max: u32,
    vote_fraction: f64,
) -> Option<f64> {
    let mut bins = vec![0u32; (r_max - r_min + 1) as usize];
    for p in points {
        let (vx, vy) = (p.x - cx, p.y - cy);
        let d = vx.hypot(vy);
        if d < 1e-6 {
            continue;
        }
        let alignment = (p.dx * vx + p.dy * vy).abs() / d;
        if alignment < RADIAL_ALIGNMENT {
            continue;
        }
        let bin = d.round() as i64 - r_min as i64;
        if bin >= 0 && (bin as usize) < bins.len() {
            bins[bin as usize] += 1;
        }
    }

    let window = |i: usize| i.saturating_sub(1)..=(i + 1).min(bins.len() - 1);
    let (mode, support) = (0..bins.len())
        .map(|i| (i, window(i).map(|k| bins[k]).sum::<u32>()))
        .max_by_key(|&(i, n)| (n, i))?;
    let radius = (r_min as usize + mode) as f64;
    // an arc of at least half the voting fraction of the circumference
    if support == 0 || (support as f64) < 0.5 * vote_fraction * 2.0 * PI * radius {
        return None;
    }

    let weighted: f64 = window(mode)
        .map(|k| bins[k] as f64 * (r_min as usize + k) as f64)
        .sum();
    Some(weighted / support as f64)
}

/// Walk `centers` strongest first, keeping those with a supported radius and
/// no kept center closer than `min_dist`. Rejected centers suppress nothing.
fn accept_centers<I, F>(centers: I, min_dist: f64, mut radius_of: F) -> Vec<(f64, f64, f64)>
where
    I: IntoIterator<Item = (f64, f64)>,
    F: FnMut(f64, f64) -> Option<f64>,
{
    let mut accepted: Vec<(f64, f64, f64)> = Vec::new();
    for (cx, cy) in centers {
        if accepted
            .iter()
            .any(|&(ax, ay, _)| (ax - cx).hypot(ay - cy) < min_dist)
        {
            continue;
        }
        if let Some(radius) = radius_of(cx, cy) {
            accepted.push((cx, cy, radius));
        }
    }
    accepted
}
