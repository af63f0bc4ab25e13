use anyhow::{Context, Result};
use minimap_vision::DetectorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Service configuration, read from an optional JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// Directory holding `icons/` and `map_regions.json`
    pub data_dir: PathBuf,
    /// Upper bound on one detection call; unbounded when absent
    pub timeout_ms: Option<u64>,
    pub detector: DetectorConfig,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            timeout_ms: None,
            detector: DetectorConfig::default(),
        }
    }
}

impl ScoutConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: ScoutConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Defaults when `path` is `None`.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
