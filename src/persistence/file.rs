use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{PersistenceResult, PlannerSnapshot, PlannerStore};

pub fn save_snapshot_to_json<P: AsRef<Path>>(
    snapshot: &PlannerSnapshot,
    path: P,
) -> PersistenceResult<()> {
    super::validate_snapshot(snapshot)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.flush()?;
    Ok(())
}

pub fn load_snapshot_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<PlannerSnapshot> {
    let file = File::open(path)?;
    let snapshot: PlannerSnapshot = serde_json::from_reader(file)?;
    super::validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

/// Pretty-printed JSON snapshot at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PlannerStore for JsonFileStore {
    fn save_planner(&self, snapshot: &PlannerSnapshot) -> PersistenceResult<()> {
        save_snapshot_to_json(snapshot, &self.path)
    }

    fn load_planner(&self) -> PersistenceResult<Option<PlannerSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        load_snapshot_from_json(&self.path).map(Some)
    }
}
