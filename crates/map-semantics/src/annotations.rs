use crate::geometry::{CanonicalPoint, Polygon};
use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Default number of neighbouring regions named when a point lies outside
/// every annotated region.
pub const DEFAULT_CLOSEST_REGIONS: usize = 3;

/// Description used when no annotations are loaded at all.
pub const UNMAPPED_AREA: &str = "unmapped area";

/// A labeled area of the canonical minimap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionAnnotation {
    pub label: String,
    pub polygon: Polygon,
}

/// Region shape as stored in the annotation file
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ShapeEntry {
    Polygon {
        points: Vec<[f64; 2]>,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        #[serde(default)]
        rotation: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct RegionEntry {
    label: String,
    shape: ShapeEntry,
}

/// Raw map_regions.json file format
#[derive(Debug, Deserialize)]
struct AnnotationsFile {
    #[allow(dead_code)]
    #[serde(default)]
    map: Option<String>,
    regions: Vec<RegionEntry>,
}

static GLOBAL_ANNOTATIONS: OnceLock<Arc<MapAnnotations>> = OnceLock::new();

/// Immutable set of labeled map regions.
#[derive(Debug, Clone, Default)]
pub struct MapAnnotations {
    regions: Vec<RegionAnnotation>,
}

impl MapAnnotations {
    pub fn new(regions: Vec<RegionAnnotation>) -> Self {
        Self { regions }
    }

    /// Load region annotations from a JSON file, or from a CVAT XML export
    /// when the file has an `.xml` extension.
    ///
    /// A missing file gives an empty set (with a warning); a malformed file
    /// is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "No region annotations found at {}. Locations will be reported as '{}'",
                path.display(),
                UNMAPPED_AREA
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let is_xml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
        let annotations = if is_xml {
            Self::from_cvat_xml(&content)
        } else {
            Self::from_json_str(&content)
        }
        .with_context(|| format!("Failed to parse {}", path.display()))?;

        info!(
            "Loaded {} map regions from {}",
            annotations.regions.len(),
            path.display()
        );
        Ok(annotations)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: AnnotationsFile = serde_json::from_str(content)?;
        Ok(Self::from_entries(file.regions))
    }

    /// Parse a CVAT XML export. Every `<polygon>` and `<ellipse>` element is
    /// read, wherever it is nested.
    pub fn from_cvat_xml(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content);
        let mut entries = Vec::new();
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                    b"polygon" => entries.push(cvat_polygon(&e)?),
                    b"ellipse" => entries.push(cvat_ellipse(&e)?),
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(Self::from_entries(entries))
    }

    fn from_entries(entries: Vec<RegionEntry>) -> Self {
        let mut regions = Vec::with_capacity(entries.len());
        for entry in entries {
            let polygon = match entry.shape {
                ShapeEntry::Polygon { points } => Polygon::new(
                    points
                        .iter()
                        .map(|&[x, y]| CanonicalPoint::new(x, y))
                        .collect(),
                ),
                ShapeEntry::Ellipse {
                    cx,
                    cy,
                    rx,
                    ry,
                    rotation,
                } => Polygon::from_ellipse(cx, cy, rx, ry, rotation),
            };
            match polygon {
                Some(polygon) => regions.push(RegionAnnotation {
                    label: entry.label,
                    polygon,
                }),
                None => warn!("Skipping degenerate region '{}'", entry.label),
            }
        }
        Self { regions }
    }

    /// Load the process-wide annotation set once. Later calls return the
    /// already-loaded set and ignore `path`.
    pub fn init_global(path: &Path) -> Result<Arc<MapAnnotations>> {
        if let Some(existing) = GLOBAL_ANNOTATIONS.get() {
            debug!("Map annotations already initialized, ignoring {}", path.display());
            return Ok(existing.clone());
        }
        let loaded = Arc::new(Self::load(path)?);
        Ok(GLOBAL_ANNOTATIONS.get_or_init(|| loaded).clone())
    }

    /// The process-wide set, if [`init_global`](Self::init_global) has run.
    pub fn global() -> Option<Arc<MapAnnotations>> {
        GLOBAL_ANNOTATIONS.get().cloned()
    }

    pub fn regions(&self) -> &[RegionAnnotation] {
        &self.regions
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Labels of every region strictly containing `point`, in file order.
    pub fn containing(&self, point: &CanonicalPoint) -> Vec<&str> {
        self.regions
            .iter()
            .filter(|r| r.polygon.contains_strictly(point))
            .map(|r| r.label.as_str())
            .collect()
    }

    /// Labels of the `n` regions closest to `point`, nearest first.
    pub fn closest(&self, point: &CanonicalPoint, n: usize) -> Vec<&str> {
        let mut by_distance: Vec<(f64, &str)> = self
            .regions
            .iter()
            .map(|r| (r.polygon.distance(point), r.label.as_str()))
            .collect();
        by_distance.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        by_distance.into_iter().take(n).map(|(_, l)| l).collect()
    }

    /// Human-readable location of a canonical point:
    /// "inside X", "inside X and Y", "near X" or "between X, Y and Z".
    pub fn describe(&self, point: CanonicalPoint, closest_regions: usize) -> String {
        if self.regions.is_empty() {
            return UNMAPPED_AREA.to_string();
        }

        let inside = self.containing(&point);
        if !inside.is_empty() {
            return format!("inside {}", join_labels(&inside));
        }

        let nearby = self.closest(&point, closest_regions.max(1));
        if nearby.len() == 1 {
            format!("near {}", nearby[0])
        } else {
            format!("between {}", join_labels(&nearby))
        }
    }
}

/// "A", "A and B", "A, B and C"
fn join_labels(labels: &[&str]) -> String {
    match labels {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}


fn xml_attributes(element: &BytesStart) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for attr in element.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        attrs.insert(key, attr.unescape_value()?.into_owned());
    }
    Ok(attrs)
}

fn xml_label(attrs: &HashMap<String, String>) -> Result<String> {
    attrs.get("label").cloned().context("Shape without a label")
}

fn xml_number(attrs: &HashMap<String, String>, key: &str) -> Result<f64> {
    let raw = attrs
        .get(key)
        .with_context(|| format!("Missing '{}' attribute", key))?;
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid '{}' attribute: {}", key, raw))
}

/// `points="x1,y1;x2,y2;..."`
fn cvat_polygon(element: &BytesStart) -> Result<RegionEntry> {
    let attrs = xml_attributes(element)?;
    let label = xml_label(&attrs)?;
    let raw = attrs
        .get("points")
        .with_context(|| format!("Polygon '{}' has no points", label))?;
    let points = raw
        .split(';')
        .filter(|p| !p.trim().is_empty())
        .map(|p| -> Result<[f64; 2]> {
            let (x, y) = p
                .split_once(',')
                .with_context(|| format!("Invalid point '{}' in '{}'", p, label))?;
            Ok([x.trim().parse()?, y.trim().parse()?])
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RegionEntry {
        label,
        shape: ShapeEntry::Polygon { points },
    })
}

fn cvat_ellipse(element: &BytesStart) -> Result<RegionEntry> {
    let attrs = xml_attributes(element)?;
    let rotation = if attrs.contains_key("rotation") {
        xml_number(&attrs, "rotation")?
    } else {
        0.0
    };
    Ok(RegionEntry {
        label: xml_label(&attrs)?,
        shape: ShapeEntry::Ellipse {
            cx: xml_number(&attrs, "cx")?,
            cy: xml_number(&attrs, "cy")?,
            rx: xml_number(&attrs, "rx")?,
            ry: xml_number(&attrs, "ry")?,
            rotation,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "map": "test",
        "regions": [
            { "label": "Baron pit", "shape": { "type": "ellipse", "cx": 100, "cy": 100, "rx": 20, "ry": 20 } },
            { "label": "top-side river", "shape": { "type": "polygon", "points": [[150, 50], [250, 50], [250, 150], [150, 150]] } },
            { "label": "overlap zone", "shape": { "type": "polygon", "points": [[200, 100], [300, 100], [300, 200], [200, 200]] } },
            { "label": "broken", "shape": { "type": "polygon", "points": [[1, 1], [2, 2]] } }
        ]
    }"#;

    #[test]
    fn test_parse_skips_degenerate() {
        let ann = MapAnnotations::from_json_str(SAMPLE).unwrap();
        assert_eq!(ann.regions().len(), 3);
    }

    #[test]
    fn test_inside_single_region() {
        let ann = MapAnnotations::from_json_str(SAMPLE).unwrap();
        let d = ann.describe(CanonicalPoint::new(100.0, 100.0), 3);
        assert_eq!(d, "inside Baron pit");
    }

    #[test]
    fn test_inside_several_regions_joins_labels() {
        let ann = MapAnnotations::from_json_str(SAMPLE).unwrap();
        let d = ann.describe(CanonicalPoint::new(225.0, 125.0), 3);
        assert_eq!(d, "inside top-side river and overlap zone");
    }

    #[test]
    fn test_near_single_closest() {
        let ann = MapAnnotations::from_json_str(SAMPLE).unwrap();
        let d = ann.describe(CanonicalPoint::new(100.0, 60.0), 1);
        assert_eq!(d, "near Baron pit");
    }

    #[test]
    fn test_between_closest_regions() {
        let ann = MapAnnotations::from_json_str(SAMPLE).unwrap();
        // left of the river, right of the pit
        let d = ann.describe(CanonicalPoint::new(137.0, 100.0), 2);
        assert_eq!(d, "between top-side river and Baron pit");
        let d3 = ann.describe(CanonicalPoint::new(137.0, 100.0), 3);
        assert_eq!(d3, "between top-side river, Baron pit and overlap zone");
    }

    #[test]
    fn test_empty_annotations() {
        let ann = MapAnnotations::default();
        assert_eq!(ann.describe(CanonicalPoint::new(1.0, 1.0), 3), UNMAPPED_AREA);
    }

    #[test]
    fn test_load_nonexistent() {
        let ann = MapAnnotations::load(Path::new("/nonexistent/map_regions.json")).unwrap();
        assert!(ann.is_empty());
    }

    #[test]
    fn test_load_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map_regions.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(MapAnnotations::load(&path).is_err());
    }

    const CVAT_SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<annotations>
  <version>1.1</version>
  <image id="0" name="minimap.png" width="512" height="512">
    <polygon label="top-side river" occluded="0" points="150.00,50.00;250.00,50.00;250.00,150.00;150.00,150.00" z_order="0">
    </polygon>
    <ellipse label="Baron pit" occluded="0" cx="100.00" cy="100.00" rx="20.00" ry="20.00" rotation="15.0" z_order="0"></ellipse>
    <ellipse label="Dragon &amp; pit" cx="300" cy="300" rx="10" ry="10"/>
    <polygon label="broken" points="1,1;2,2"/>
  </image>
</annotations>"#;

    #[test]
    fn test_parse_cvat_xml() {
        let ann = MapAnnotations::from_cvat_xml(CVAT_SAMPLE).unwrap();
        let labels: Vec<&str> = ann.regions().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["top-side river", "Baron pit", "Dragon & pit"]);
        assert_eq!(ann.describe(CanonicalPoint::new(100.0, 100.0), 3), "inside Baron pit");
        assert_eq!(ann.describe(CanonicalPoint::new(200.0, 100.0), 3), "inside top-side river");
        assert_eq!(ann.describe(CanonicalPoint::new(300.0, 300.0), 3), "inside Dragon & pit");
    }

    #[test]
    fn test_cvat_bad_points_is_error() {
        let xml = r#"<annotations><polygon label="x" points="1,1;oops;3,3"/></annotations>"#;
        assert!(MapAnnotations::from_cvat_xml(xml).is_err());
    }

    #[test]
    fn test_load_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.xml");
        std::fs::write(&path, CVAT_SAMPLE).unwrap();
        let ann = MapAnnotations::load(&path).unwrap();
        assert_eq!(ann.regions().len(), 3);
    }
}
