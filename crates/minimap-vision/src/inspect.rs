//! Hooks into the intermediate stages of a detection call.

use crate::circles::CircleCandidate;
use crate::matcher::CandidateScore;
use crate::segment::TeamMasks;
use minimap_state::Side;

/// Receives intermediate results while a minimap is processed. Every method
/// defaults to doing nothing.
pub trait DetectionInspector {
    fn masks(&mut self, _masks: &TeamMasks) {}

    /// Candidates of one side after occlusion classification.
    fn candidates(&mut self, _side: Side, _candidates: &[CircleCandidate]) {}

    /// Per-candidate scores of one champion, in candidate order.
    fn scores(&mut self, _champion: &str, _side: Side, _scores: &[CandidateScore]) {}
}

pub(crate) struct Silent;

impl DetectionInspector for Silent {}

/// Keeps a copy of everything it is shown.
#[cfg(feature = "inspect")]
#[derive(Debug, Default)]
pub struct InspectionLog {
    pub masks: Option<TeamMasks>,
    pub candidates: Vec<(Side, Vec<CircleCandidate>)>,
    pub scores: Vec<(String, Side, Vec<CandidateScore>)>,
}

#[cfg(feature = "inspect")]
impl InspectionLog {
    pub fn candidates_for(&self, side: Side) -> &[CircleCandidate] {
        self.candidates
            .iter()
            .find(|(s, _)| *s == side)
            .map(|(_, c)| c.as_slice())
            .unwrap_or(&[])
    }

    pub fn scores_for(&self, champion: &str) -> &[CandidateScore] {
        self.scores
            .iter()
            .find(|(c, _, _)| c == champion)
            .map(|(_, _, s)| s.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(feature = "inspect")]
impl DetectionInspector for InspectionLog {
    fn masks(&mut self, masks: &TeamMasks) {
        self.masks = Some(masks.clone());
    }

    fn candidates(&mut self, side: Side, candidates: &[CircleCandidate]) {
        self.candidates.push((side, candidates.to_vec()));
    }

    fn scores(&mut self, champion: &str, side: Side, scores: &[CandidateScore]) {
        self.scores.push((champion.to_string(), side, scores.to_vec()));
    }
}
