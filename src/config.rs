use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PersistenceResult;
use crate::revision::RevisionStrategy;

pub const CONFIG_PATH_ENV: &str = "STUDY_PLANNER_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub group_name: String,
    pub revision_strategy: RevisionStrategy,
    pub heatmap_days: u32,
    pub heatmap_bar_width: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            group_name: "Main Study Group".to_string(),
            revision_strategy: RevisionStrategy::Leitner,
            heatmap_days: 7,
            heatmap_bar_width: 10,
        }
    }
}

impl PlannerConfig {
    /// Missing keys fall back to their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Reads the file named by `STUDY_PLANNER_CONFIG`, or the defaults when unset.
    pub fn from_env() -> PersistenceResult<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_json_file(path),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"revision_strategy": "supermemo", "heatmap_days": 14}}"#).unwrap();
        let config = PlannerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.revision_strategy, RevisionStrategy::Supermemo);
        assert_eq!(config.heatmap_days, 14);
        assert_eq!(config.group_name, "Main Study Group");
        assert_eq!(config.heatmap_bar_width, 10);
    }
}
