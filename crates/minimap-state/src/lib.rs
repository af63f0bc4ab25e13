use map_semantics::{distance, CanonicalPoint, ChampionPair, PixelPoint};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Description reported for a roster champion without an accepted match.
pub const NOT_VISIBLE: &str = "Not visible";

/// Which team a champion plays for, from the viewer's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Ally,
    Enemy,
}

/// The two team rosters of one game. Identifiers are unique across both
/// sides and keep their input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    allies: Vec<String>,
    enemies: Vec<String>,
}

impl Roster {
    /// Build a roster, dropping repeated identifiers (first occurrence wins).
    pub fn new<A, E>(allies: A, enemies: E) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        let mut roster = Self::default();
        for id in allies {
            roster.push(Side::Ally, id.into());
        }
        for id in enemies {
            roster.push(Side::Enemy, id.into());
        }
        roster
    }

    fn push(&mut self, side: Side, id: String) {
        if self.side_of(&id).is_some() {
            warn!("Champion '{}' listed more than once in roster, ignoring repeat", id);
            return;
        }
        match side {
            Side::Ally => self.allies.push(id),
            Side::Enemy => self.enemies.push(id),
        }
    }

    pub fn allies(&self) -> &[String] {
        &self.allies
    }

    pub fn enemies(&self) -> &[String] {
        &self.enemies
    }

    pub fn side(&self, side: Side) -> &[String] {
        match side {
            Side::Ally => &self.allies,
            Side::Enemy => &self.enemies,
        }
    }

    pub fn side_of(&self, champion: &str) -> Option<Side> {
        if self.allies.iter().any(|c| c == champion) {
            Some(Side::Ally)
        } else if self.enemies.iter().any(|c| c == champion) {
            Some(Side::Enemy)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.allies.len() + self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A champion found on the minimap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionPosition {
    /// Marker center in source-minimap pixels
    pub pixel: PixelPoint,
    /// Marker center in the canonical 512×512 frame
    pub canonical: CanonicalPoint,
    pub confidence: f64,
    pub description: String,
}

/// Outcome for one roster champion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChampionLocation {
    Visible(ChampionPosition),
    NotVisible,
}

impl ChampionLocation {
    pub fn is_visible(&self) -> bool {
        matches!(self, ChampionLocation::Visible(_))
    }

    pub fn position(&self) -> Option<&ChampionPosition> {
        match self {
            ChampionLocation::Visible(p) => Some(p),
            ChampionLocation::NotVisible => None,
        }
    }

    /// "inside X" / "near Y" / "between Y and Z", or "Not visible".
    pub fn description(&self) -> &str {
        match self {
            ChampionLocation::Visible(p) => &p.description,
            ChampionLocation::NotVisible => NOT_VISIBLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionReport {
    pub champion: String,
    pub side: Side,
    pub location: ChampionLocation,
}

/// Result of one detection call: exactly one entry per roster champion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub minimap_size: (u32, u32),
    pub champions: Vec<ChampionReport>,
}

impl DetectionReport {
    pub fn new(minimap_size: (u32, u32)) -> Self {
        Self {
            minimap_size,
            champions: Vec::new(),
        }
    }

    pub fn push(&mut self, champion: &str, side: Side, location: ChampionLocation) {
        self.champions.push(ChampionReport {
            champion: champion.to_string(),
            side,
            location,
        });
    }

    pub fn get(&self, champion: &str) -> Option<&ChampionLocation> {
        self.champions
            .iter()
            .find(|c| c.champion == champion)
            .map(|c| &c.location)
    }

    /// Champion → location description (including "Not visible").
    pub fn descriptions(&self) -> BTreeMap<String, String> {
        self.champions
            .iter()
            .map(|c| (c.champion.clone(), c.location.description().to_string()))
            .collect()
    }

    /// Champion → canonical position, visible champions only.
    pub fn positions(&self) -> HashMap<String, CanonicalPoint> {
        self.champions
            .iter()
            .filter_map(|c| c.location.position().map(|p| (c.champion.clone(), p.canonical)))
            .collect()
    }

    pub fn visible_count(&self) -> usize {
        self.champions.iter().filter(|c| c.location.is_visible()).count()
    }

    /// Game-unit distances from `reference` to each target.
    pub fn distances_from(&self, reference: &str, targets: &[String]) -> BTreeMap<String, Option<f64>> {
        distance::distances_from(&self.positions(), reference, targets)
    }

    /// Game-unit distances for every pair of roster champions.
    pub fn pairwise_distances(&self) -> BTreeMap<ChampionPair, Option<f64>> {
        let champions: Vec<String> = self.champions.iter().map(|c| c.champion.clone()).collect();
        distance::pairwise(&self.positions(), &champions)
    }

    /// Plain-text position listing grouped by side.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Ally Positions:".to_string());
        for c in self.champions.iter().filter(|c| c.side == Side::Ally) {
            lines.push(format!("{}: {}", c.champion, c.location.description()));
        }
        lines.push(String::new());
        lines.push("Enemy Positions:".to_string());
        for c in self.champions.iter().filter(|c| c.side == Side::Enemy) {
            lines.push(format!("{}: {}", c.champion, c.location.description()));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible(x: f64, y: f64, description: &str) -> ChampionLocation {
        ChampionLocation::Visible(ChampionPosition {
            pixel: PixelPoint::new(x, y),
            canonical: CanonicalPoint::new(x, y),
            confidence: 0.9,
            description: description.to_string(),
        })
    }

    #[test]
    fn test_roster_drops_duplicates() {
        let roster = Roster::new(["Ahri", "Garen", "Ahri"], ["Zed", "Garen"]);
        assert_eq!(roster.allies(), &["Ahri".to_string(), "Garen".to_string()]);
        assert_eq!(roster.enemies(), &["Zed".to_string()]);
        assert_eq!(roster.side_of("Zed"), Some(Side::Enemy));
        assert_eq!(roster.side_of("Lux"), None);
    }

    #[test]
    fn test_not_visible_description() {
        assert_eq!(ChampionLocation::NotVisible.description(), NOT_VISIBLE);
        assert!(ChampionLocation::NotVisible.position().is_none());
    }

    #[test]
    fn test_report_maps_and_summary() {
        let mut report = DetectionReport::new((256, 256));
        report.push("Ahri", Side::Ally, visible(10.0, 10.0, "inside Baron pit"));
        report.push("Zed", Side::Enemy, ChampionLocation::NotVisible);

        let descriptions = report.descriptions();
        assert_eq!(descriptions["Ahri"], "inside Baron pit");
        assert_eq!(descriptions["Zed"], NOT_VISIBLE);

        let positions = report.positions();
        assert_eq!(positions.len(), 1);
        assert!(positions.contains_key("Ahri"));

        let summary = report.summary();
        assert!(summary.contains("Ahri: inside Baron pit"));
        assert!(summary.contains("Zed: Not visible"));
    }

    #[test]
    fn test_report_distances() {
        let mut report = DetectionReport::new((512, 512));
        report.push("Ahri", Side::Ally, visible(0.0, 0.0, "a"));
        report.push("Garen", Side::Ally, visible(3.0, 4.0, "b"));
        report.push("Zed", Side::Enemy, ChampionLocation::NotVisible);

        let d = report.distances_from("Ahri", &["Garen".to_string(), "Zed".to_string()]);
        assert!((d["Garen"].unwrap() - 5.0 * map_semantics::GAME_UNITS_PER_CANONICAL_PIXEL).abs() < 1e-9);
        assert!(d["Zed"].is_none());
        assert_eq!(report.pairwise_distances().len(), 3);
    }

    #[test]
    fn test_location_serializes_with_status_tag() {
        let json = serde_json::to_value(&ChampionLocation::NotVisible).unwrap();
        assert_eq!(json["status"], "not_visible");
    }
}
