use crate::circles::CircleCandidate;
use crate::config::{OcclusionConfig, ScoringConfig};
use crate::features::{color_similarity, masked_gray, shape_similarity};
use crate::icons::IconTemplate;
use crate::minimap::MinimapImage;
use crate::occlusion::occlusion_mask;
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// How well one candidate matches one champion template
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Index into the side's candidate list
    pub candidate: usize,
    pub shape: f64,
    pub color: f64,
    pub combined: f64,
}

/// Scores champion templates against circle candidates.
pub struct FeatureScorer<'a> {
    scoring: &'a ScoringConfig,
    occlusion: &'a OcclusionConfig,
    halo: u32,
}

impl<'a> FeatureScorer<'a> {
    pub fn new(scoring: &'a ScoringConfig, occlusion: &'a OcclusionConfig, halo: u32) -> Self {
        Self {
            scoring,
            occlusion,
            halo,
        }
    }

    /// Template size plus padding, rounded up to a whole number of HOG cells.
    pub fn region_side(&self, template_size: u32) -> u32 {
        let padded = template_size + (template_size / 6).max(4);
        let cell = self.scoring.hog_cell_side.max(1) as u32;
        padded.div_ceil(cell) * cell
    }

    /// Score `template` against every candidate whose region fits inside the
    /// minimap. Candidates too close to the border are left out.
    pub fn score_all(
        &self,
        minimap: &MinimapImage,
        candidates: &[CircleCandidate],
        template: &IconTemplate,
    ) -> Vec<CandidateScore> {
        let side = self.region_side(template.size);
        let (canvas, canvas_mask) = template.on_canvas(side);
        let (w, h) = minimap.dimensions();

        let mut scores = Vec::with_capacity(candidates.len());
        for (index, c) in candidates.iter().enumerate() {
            let x0 = c.x.round() as i64 - (side / 2) as i64;
            let y0 = c.y.round() as i64 - (side / 2) as i64;
            if x0 < 0 || y0 < 0 || x0 + side as i64 > w as i64 || y0 + side as i64 > h as i64 {
                continue;
            }

            let region =
                image::imageops::crop_imm(minimap.rgb(), x0 as u32, y0 as u32, side, side).to_image();
            let visible = occlusion_mask(
                candidates,
                index,
                (x0, y0),
                side,
                self.halo,
                self.occlusion.mask_margin,
            );
            let mask = intersect(&visible, &canvas_mask);

            let shape = shape_similarity(
                &masked_gray(&region, &mask),
                &masked_gray(&canvas, &mask),
                self.scoring,
            );
            let color = color_similarity(&region, &canvas, &mask, self.scoring);
            let w_shape = self.scoring.shape_weight;
            let combined = w_shape * shape + (1.0 - w_shape) * color;

            scores.push(CandidateScore {
                candidate: index,
                shape,
                color,
                combined: if combined.is_finite() { combined } else { 0.0 },
            });
        }
        scores
    }

    /// Highest combined score, if it reaches the acceptance threshold. Ties
    /// keep the earlier candidate.
    pub fn best<'s>(&self, scores: &'s [CandidateScore]) -> Option<&'s CandidateScore> {
        let mut best: Option<&CandidateScore> = None;
        for s in scores {
            if best.map_or(true, |b| s.combined > b.combined) {
                best = Some(s);
            }
        }
        best.filter(|b| b.combined >= self.scoring.acceptance_threshold)
    }
}

fn intersect(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let mut out = a.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        px.0[0] = px.0[0].min(b.get_pixel(x, y).0[0]);
    }
    out
}
