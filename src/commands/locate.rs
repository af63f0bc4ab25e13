use crate::pipeline::Scout;
use minimap_state::{ChampionLocation, DetectionReport, Roster};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared handle for command callers.
#[derive(Clone)]
pub struct ScoutState(pub Arc<Scout>);

/// Locate roster champions on a saved minimap crop.
///
/// Returns `{ champion: { "description", "x", "y", "confidence" } }` with
/// canonical coordinates; `x`, `y` and `confidence` are null for champions
/// that are not visible.
pub async fn locate_champions(
    state: &ScoutState,
    minimap_path: String,
    allies: Vec<String>,
    enemies: Vec<String>,
) -> Result<Value, String> {
    let roster = Roster::new(allies, enemies);
    let report = state
        .0
        .locate_with_timeout(PathBuf::from(&minimap_path), roster)
        .await
        .map_err(|e| format!("{:#}", e))?
        .ok_or_else(|| format!("Detection timed out for {}", minimap_path))?;
    Ok(report_json(&report))
}

pub fn report_json(report: &DetectionReport) -> Value {
    let mut out = Map::new();
    for c in &report.champions {
        let entry = match &c.location {
            ChampionLocation::Visible(p) => json!({
                "side": c.side,
                "description": p.description,
                "x": p.canonical.x,
                "y": p.canonical.y,
                "confidence": p.confidence,
            }),
            ChampionLocation::NotVisible => json!({
                "side": c.side,
                "description": c.location.description(),
                "x": null,
                "y": null,
                "confidence": null,
            }),
        };
        out.insert(c.champion.clone(), entry);
    }
    Value::Object(out)
}

/// Game-unit distances from `reference` to every target, null when either
/// side of a pair is not visible.
pub fn champion_distances(report: &DetectionReport, reference: &str, targets: &[String]) -> Value {
    let distances = report.distances_from(reference, targets);
    Value::Object(
        distances
            .into_iter()
            .map(|(champion, d)| (champion, json!(d)))
            .collect(),
    )
}

/// Every roster pair with its distance.
pub fn distance_table(report: &DetectionReport) -> Value {
    report
        .pairwise_distances()
        .into_iter()
        .map(|(pair, d)| {
            let (a, b) = pair.members();
            json!({ "a": a, "b": b, "distance": d })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_semantics::{CanonicalPoint, PixelPoint, GAME_UNITS_PER_CANONICAL_PIXEL};
    use minimap_state::{ChampionPosition, Side};

    fn report() -> DetectionReport {
        let mut report = DetectionReport::new((512, 512));
        for (name, side, x, y) in [("Ahri", Side::Ally, 100.0, 100.0), ("Garen", Side::Ally, 106.0, 108.0)] {
            report.push(
                name,
                side,
                ChampionLocation::Visible(ChampionPosition {
                    pixel: PixelPoint::new(x, y),
                    canonical: CanonicalPoint::new(x, y),
                    confidence: 0.8,
                    description: "near mid lane".to_string(),
                }),
            );
        }
        report.push("Zed", Side::Enemy, ChampionLocation::NotVisible);
        report
    }

    #[test]
    fn test_report_json_shape() {
        let value = report_json(&report());
        assert_eq!(value["Ahri"]["description"], "near mid lane");
        assert_eq!(value["Ahri"]["x"], 100.0);
        assert_eq!(value["Ahri"]["side"], "ally");
        assert_eq!(value["Zed"]["description"], "Not visible");
        assert!(value["Zed"]["x"].is_null());
        assert!(value["Zed"]["confidence"].is_null());
    }

    #[test]
    fn test_champion_distances_json() {
        let targets = vec!["Garen".to_string(), "Zed".to_string()];
        let value = champion_distances(&report(), "Ahri", &targets);
        let garen = value["Garen"].as_f64().unwrap();
        assert!((garen - 10.0 * GAME_UNITS_PER_CANONICAL_PIXEL).abs() < 1e-9);
        assert!(value["Zed"].is_null());
    }

    #[test]
    fn test_distance_table_lists_pairs() {
        let table = distance_table(&report());
        let rows = table.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows
            .iter()
            .any(|r| r["a"] == "Ahri" && r["b"] == "Zed" && r["distance"].is_null()));
    }

    #[tokio::test]
    async fn test_locate_champions_reports_unreadable_minimap() {
        let dir = tempfile::tempdir().unwrap();
        let detector = minimap_vision::MinimapDetector::load(Default::default(), dir.path()).unwrap();
        let state = ScoutState(Arc::new(Scout::with_detector(detector, None)));

        let missing = dir.path().join("missing.png").to_string_lossy().to_string();
        let err = locate_champions(&state, missing, vec!["Ahri".to_string()], vec![])
            .await
            .unwrap_err();
        assert!(err.contains("missing.png"), "unexpected error: {}", err);
    }
}
