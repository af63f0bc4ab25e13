use crate::coords::CANONICAL_SIZE;
use crate::geometry::CanonicalPoint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Game units spanned by the full canonical frame (Summoner's Rift is ~15000
/// units across).
pub const MAP_SIZE_GAME_UNITS: f64 = 15000.0;

/// Conversion factor from canonical minimap pixels to game distance units.
pub const GAME_UNITS_PER_CANONICAL_PIXEL: f64 = MAP_SIZE_GAME_UNITS / CANONICAL_SIZE;

/// Unordered pair of champion identifiers. `(a, b)` and `(b, a)` are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChampionPair {
    first: String,
    second: String,
}

impl ChampionPair {
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn members(&self) -> (&str, &str) {
        (&self.first, &self.second)
    }
}

/// Game-unit distance between two located champions, or `None` when either
/// one is absent from `positions`.
pub fn distance(
    positions: &HashMap<String, CanonicalPoint>,
    a: &str,
    b: &str,
) -> Option<f64> {
    let pa = positions.get(a)?;
    let pb = positions.get(b)?;
    Some(pa.distance(pb) * GAME_UNITS_PER_CANONICAL_PIXEL)
}

/// Distances from `reference` to every target. All targets map to `None`
/// when the reference itself is absent.
pub fn distances_from(
    positions: &HashMap<String, CanonicalPoint>,
    reference: &str,
    targets: &[String],
) -> BTreeMap<String, Option<f64>> {
    targets
        .iter()
        .map(|t| (t.clone(), distance(positions, reference, t)))
        .collect()
}

/// Distance for every unordered pair of distinct champions in `champions`.
pub fn pairwise(
    positions: &HashMap<String, CanonicalPoint>,
    champions: &[String],
) -> BTreeMap<ChampionPair, Option<f64>> {
    let mut table = BTreeMap::new();
    for (i, a) in champions.iter().enumerate() {
        for b in &champions[i + 1..] {
            if a == b {
                continue;
            }
            table.insert(ChampionPair::new(a, b), distance(positions, a, b));
        }
    }
    table
}
