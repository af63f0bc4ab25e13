//! Shape and color descriptors used to compare a minimap region with an icon
//! template. Every similarity is in `[0, 1]` and degenerate inputs score 0.

use crate::config::ScoringConfig;
use crate::segment::MASK_ON;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::hog::{hog, HogOptions};
use tracing::debug;

/// Hue range of the 8-bit HSV representation (degrees / 2)
const HUE_RANGE: f64 = 180.0;

/// 8-bit HSV: hue in `[0, 180)`, saturation and value in `[0, 255]`.
pub fn rgb_to_hsv(px: &Rgb<u8>) -> [f64; 3] {
    let [r, g, b] = px.0.map(|c| c as f64);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta / max * 255.0 } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };
    [h / 2.0, s, max]
}

/// Per-channel H, S, V histograms over the masked pixels.
pub fn hsv_histograms(rgb: &RgbImage, mask: &GrayImage, bins: usize) -> [Vec<f64>; 3] {
    let bins = bins.max(1);
    let mut hist = [vec![0.0; bins], vec![0.0; bins], vec![0.0; bins]];
    let ranges = [HUE_RANGE, 256.0, 256.0];

    for (x, y, px) in rgb.enumerate_pixels() {
        if mask.get_pixel(x, y).0[0] != MASK_ON {
            continue;
        }
        let hsv = rgb_to_hsv(px);
        for c in 0..3 {
            let bin = ((hsv[c] * bins as f64 / ranges[c]) as usize).min(bins - 1);
            hist[c][bin] += 1.0;
        }
    }
    hist
}

/// Rescale to `[0, 1]`. A flat histogram becomes all zeros.
pub fn normalize_min_max(hist: &mut [f64]) {
    let max = hist.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = hist.iter().cloned().fold(f64::INFINITY, f64::min);
    let span = max - min;
    for v in hist.iter_mut() {
        *v = if span > f64::EPSILON { (*v - min) / span } else { 0.0 };
    }
}

/// Bhattacharyya distance in `[0, 1]`, or `None` when either histogram is empty.
pub fn bhattacharyya_distance(a: &[f64], b: &[f64]) -> Option<f64> {
    let sa: f64 = a.iter().sum();
    let sb: f64 = b.iter().sum();
    if sa <= 0.0 || sb <= 0.0 {
        return None;
    }
    let overlap: f64 = a.iter().zip(b).map(|(x, y)| (x * y).sqrt()).sum();
    Some((1.0 - overlap / (sa * sb).sqrt()).max(0.0).sqrt())
}

pub fn histogram_similarity(a: &[f64], b: &[f64]) -> f64 {
    bhattacharyya_distance(a, b).map_or(0.0, |d| 1.0 - d)
}

/// Weighted H/S/V histogram similarity of two equally sized images.
pub fn color_similarity(
    region: &RgbImage,
    template: &RgbImage,
    mask: &GrayImage,
    config: &ScoringConfig,
) -> f64 {
    let mut region_hist = hsv_histograms(region, mask, config.histogram_bins);
    let mut template_hist = hsv_histograms(template, mask, config.histogram_bins);

    let mut similarity = 0.0;
    for c in 0..3 {
        normalize_min_max(&mut region_hist[c]);
        normalize_min_max(&mut template_hist[c]);
        similarity += config.channel_weights[c] * histogram_similarity(&region_hist[c], &template_hist[c]);
    }
    similarity
}

/// Grayscale copy with everything outside `mask` set to black.
pub fn masked_gray(rgb: &RgbImage, mask: &GrayImage) -> GrayImage {
    let mut gray = image::imageops::grayscale(rgb);
    for (x, y, px) in gray.enumerate_pixels_mut() {
        if mask.get_pixel(x, y).0[0] != MASK_ON {
            *px = Luma([0]);
        }
    }
    gray
}

pub fn hog_descriptor(gray: &GrayImage, config: &ScoringConfig) -> Option<Vec<f32>> {
    let options = HogOptions::new(
        config.hog_orientations,
        config.hog_signed,
        config.hog_cell_side,
        config.hog_block_side,
        config.hog_block_stride,
    );
    match hog(gray, options) {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            debug!("HOG unavailable for {}x{} region: {}", gray.width(), gray.height(), e);
            None
        }
    }
}

/// Cosine similarity, 0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        dot += x as f64 * y as f64;
        na += x as f64 * x as f64;
        nb += y as f64 * y as f64;
    }
    if !(na > f64::EPSILON && nb > f64::EPSILON && na.is_finite() && nb.is_finite()) {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

pub fn shape_similarity(region: &GrayImage, template: &GrayImage, config: &ScoringConfig) -> f64 {
    match (hog_descriptor(region, config), hog_descriptor(template, config)) {
        (Some(a), Some(b)) => cosine_similarity(&a, &b),
        _ => 0.0,
    }
}
