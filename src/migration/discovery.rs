//! Discovery of migration entries on disk.

use super::types::{MigrationDirection, MigrationError, MigrationRecord};
use std::path::Path;
use tokio::fs;

/// List every entry of `dir` as a migration candidate.
///
/// No filtering by extension or content happens here; an entry that has no
/// matching unit only fails once the executor tries to resolve it. Entries
/// are sorted by name, ascending for [`MigrationDirection::Up`] and
/// descending for [`MigrationDirection::Down`].
pub async fn discover(
    dir: &Path,
    direction: MigrationDirection,
) -> Result<Vec<MigrationRecord>, MigrationError> {
    let discovery_error = |source| MigrationError::DiscoveryFailed {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir).await.map_err(discovery_error)?;
    let mut records = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(discovery_error)? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name == "." || name == ".." {
            continue;
        }
        records.push(MigrationRecord {
            name,
            path: entry.path(),
        });
    }

    records.sort_by(|a, b| a.name.cmp(&b.name));
    if direction == MigrationDirection::Down {
        records.reverse();
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(records: &[MigrationRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    async fn dir_with(entries: &[&str]) -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        for entry in entries {
            fs::write(temp_dir.path().join(entry), "").await.unwrap();
        }
        temp_dir
    }

    #[tokio::test]
    async fn test_discover_ascending() {
        let temp_dir = dir_with(&["0010_c.rs", "0001_a.rs", "0002_b.rs"]).await;

        let records = discover(temp_dir.path(), MigrationDirection::Up).await.unwrap();
        assert_eq!(names(&records), vec!["0001_a.rs", "0002_b.rs", "0010_c.rs"]);
        assert_eq!(records[0].path, temp_dir.path().join("0001_a.rs"));
    }

    #[tokio::test]
    async fn test_descending_is_reverse_of_ascending() {
        let temp_dir = dir_with(&["0002_b", "0010_c", "0001_a", "notes.txt"]).await;

        let up = discover(temp_dir.path(), MigrationDirection::Up).await.unwrap();
        let mut down = discover(temp_dir.path(), MigrationDirection::Down).await.unwrap();
        down.reverse();
        assert_eq!(up, down);
        assert_eq!(up.len(), 4);
    }

    #[tokio::test]
    async fn test_directories_are_candidates() {
        let temp_dir = dir_with(&["0001_a.rs"]).await;
        fs::create_dir(temp_dir.path().join("0002_nested")).await.unwrap();

        let records = discover(temp_dir.path(), MigrationDirection::Up).await.unwrap();
        assert_eq!(names(&records), vec!["0001_a.rs", "0002_nested"]);
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let records = discover(temp_dir.path(), MigrationDirection::Up).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing");

        let result = discover(&missing, MigrationDirection::Up).await;
        assert!(matches!(
            result,
            Err(MigrationError::DiscoveryFailed { path, .. }) if path == missing
        ));
    }
}
