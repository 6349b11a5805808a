use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use super::types::{DataSource, FetchError, Rows};

const SNAPSHOT_VERSION: u32 = 1;

/// Offline copy of spreadsheet ranges, keyed by range text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub ranges: BTreeMap<String, Rows>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            ranges: BTreeMap::new(),
        }
    }
}

/// Load a snapshot from a JSON file
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open snapshot file at {}", path.display()))?;

    let snapshot: Snapshot = serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

    if snapshot.version != SNAPSHOT_VERSION {
        anyhow::bail!("Unsupported snapshot version: {}", snapshot.version);
    }

    Ok(snapshot)
}

/// Save a snapshot atomically so a crash never leaves half a file behind
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, snapshot).context("Failed to serialize snapshot")?;

    file.commit().context("Failed to save snapshot")?;

    Ok(())
}

/// Data source that answers from a snapshot instead of the network.
/// The spreadsheet id is ignored; a snapshot holds a single spreadsheet.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    snapshot: Snapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(load_snapshot(path)?))
    }
}

impl DataSource for SnapshotSource {
    async fn fetch_column(&self, _sheet_id: &str, range: &str) -> Result<Rows, FetchError> {
        self.snapshot
            .ranges
            .get(range)
            .cloned()
            .ok_or_else(|| FetchError::MissingRange(range.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn sample_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::new();
        snapshot.ranges.insert(
            "Individual!Z1:Z57".to_string(),
            vec![vec!["Score".to_string(), "x".to_string()], vec!["14".to_string()]],
        );
        snapshot
    }

    #[tokio::test]
    async fn test_fetch_known_range() {
        let source = SnapshotSource::new(sample_snapshot());
        let rows = source.fetch_column("ignored", "Individual!Z1:Z57").await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_missing_range() {
        let source = SnapshotSource::new(sample_snapshot());
        let err = source.fetch_column("ignored", "Relay!D2:D22").await.unwrap_err();
        assert_eq!(err, FetchError::MissingRange("Relay!D2:D22".to_string()));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_path = env::temp_dir().join("cmwmc_calc_test_snapshot.json");
        let _ = std::fs::remove_file(&temp_path);

        let snapshot = sample_snapshot();
        save_snapshot(&temp_path, &snapshot).unwrap();

        let loaded = load_snapshot(&temp_path).unwrap();
        assert_eq!(loaded, snapshot);

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let temp_path = env::temp_dir().join("cmwmc_calc_test_snapshot_v9.json");
        std::fs::write(&temp_path, r#"{"version":9,"ranges":{}}"#).unwrap();

        let err = load_snapshot(&temp_path).unwrap_err();
        assert!(err.to_string().contains("Unsupported snapshot version"));

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_path = env::temp_dir().join("cmwmc_calc_test_snapshot_missing.json");
        let _ = std::fs::remove_file(&temp_path);
        assert!(load_snapshot(&temp_path).is_err());
    }
}
