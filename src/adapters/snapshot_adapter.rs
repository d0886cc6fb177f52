//! Session snapshot persistence as JSON on disk.

use std::fs;
use std::path::Path;

use crate::domain::error::EmasweepError;
use crate::domain::session::SessionSnapshot;

pub fn save_snapshot<P: AsRef<Path>>(
    path: P,
    snapshot: &SessionSnapshot,
) -> Result<(), EmasweepError> {
    let json = serde_json::to_string_pretty(snapshot).map_err(|e| EmasweepError::Snapshot {
        reason: format!("serialize failed: {e}"),
    })?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<SessionSnapshot, EmasweepError> {
    let json = fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|e| EmasweepError::Snapshot {
        reason: format!("deserialize failed: {e}"),
    })
}
