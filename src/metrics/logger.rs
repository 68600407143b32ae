// Per-tick flock metrics on disk, one CSV row per snapshot.

use super::FlockSnapshot;
use anyhow::{Context, Result};
use std::path::Path;

/// Writes a whole run. Ticks must already be in order, nothing is sorted here.
pub fn write_run(path: impl AsRef<Path>, snapshots: &[FlockSnapshot]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create run log: {}", path.display()))?;
    for snapshot in snapshots {
        writer.serialize(snapshot)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a run written by `write_run` back in, for re-analysis.
pub fn read_run(path: impl AsRef<Path>) -> Result<Vec<FlockSnapshot>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open run log: {}", path.display()))?;
    let snapshots = reader
        .deserialize()
        .collect::<Result<Vec<FlockSnapshot>, _>>()
        .with_context(|| format!("Malformed run log: {}", path.display()))?;
    Ok(snapshots)
}
