//! On-disk brain files.
//!
//! One pretty-printed JSON file per channel. Writes go to a temp file in the
//! same directory which then replaces the old file, so a crash mid-save
//! leaves the previous brain intact.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::table::TransitionTable;
use crate::common::error::{StorageError, StorageResult};

/// Locates and reads/writes `markov_brain_<channel>.json` files.
#[derive(Debug, Clone)]
pub struct BrainStore {
    dir: PathBuf,
}

impl BrainStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for a channel. The name is lowercased and reduced to
    /// `[a-z0-9_]` so it can never leave the brain directory.
    pub fn path_for(&self, channel: &str) -> PathBuf {
        let name: String = channel
            .trim()
            .trim_start_matches('#')
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        self.dir.join(format!("markov_brain_{}.json", name))
    }

    /// Read a channel's table. A missing file is an empty table.
    pub fn load(&self, channel: &str) -> StorageResult<TransitionTable> {
        let path = self.path_for(channel);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(channel = %channel, "No brain file at {}, starting empty", path.display());
                return Ok(TransitionTable::new());
            }
            Err(source) => {
                return Err(StorageError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        let mut table: TransitionTable =
            serde_json::from_slice(&content).map_err(|source| StorageError::Json {
                path: path.display().to_string(),
                source,
            })?;
        table.retain_valid();
        Ok(table)
    }

    /// Load, treating every failure as an empty table.
    pub fn load_or_empty(&self, channel: &str) -> TransitionTable {
        self.load(channel).unwrap_or_else(|e| {
            warn!(channel = %channel, "Failed to load brain, starting empty: {}", e);
            TransitionTable::new()
        })
    }

    /// Pretty JSON bytes for a table.
    pub fn encode(table: &TransitionTable) -> StorageResult<Vec<u8>> {
        serde_json::to_vec_pretty(table).map_err(StorageError::Encode)
    }

    /// Write `bytes` to `path` through a temp file in the same directory.
    pub fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let io_err = |source| StorageError::Io {
            path: path.display().to_string(),
            source,
        };

        fs::create_dir_all(parent).map_err(io_err)?;
        let mut temp = NamedTempFile::new_in(parent).map_err(io_err)?;
        temp.write_all(bytes).map_err(io_err)?;
        temp.flush().map_err(io_err)?;
        temp.persist(path).map_err(|source| StorageError::Persist {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    /// Encode and write synchronously.
    pub fn save(&self, channel: &str, table: &TransitionTable) -> StorageResult<()> {
        let bytes = Self::encode(table)?;
        Self::write_atomic(&self.path_for(channel), &bytes)
    }

    /// Write already-encoded bytes on the blocking pool.
    pub async fn save_encoded(&self, channel: &str, bytes: Vec<u8>) -> StorageResult<()> {
        let path = self.path_for(channel);
        tokio::task::spawn_blocking(move || Self::write_atomic(&path, &bytes)).await?
    }

    /// Delete a channel's file. Missing is fine.
    pub fn remove(&self, channel: &str) -> StorageResult<()> {
        let path = self.path_for(channel);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> TransitionTable {
        let mut table = TransitionTable::new();
        let words = ["the", "cat", "sat", "on", "the", "mat"];
        table.learn(&words[..]);
        table
    }

    #[test]
    fn test_path_for_normalizes_channel() {
        let store = BrainStore::new("data");
        assert_eq!(
            store.path_for("#SomeStreamer"),
            PathBuf::from("data/markov_brain_somestreamer.json")
        );
        assert_eq!(
            store.path_for("../../etc/passwd"),
            PathBuf::from("data/markov_brain_etcpasswd.json")
        );
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = BrainStore::new(dir.path());
        assert!(store.load("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = BrainStore::new(dir.path());
        let table = sample_table();

        store.save("chan", &table).unwrap();
        assert_eq!(store.load("chan").unwrap(), table);
    }

    #[test]
    fn test_successor_order_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = BrainStore::new(dir.path());
        let mut table = TransitionTable::new();
        for line in ["a b c", "a b d", "a b c"] {
            let words: Vec<&str> = line.split_whitespace().collect();
            table.learn(&words[..]);
        }

        store.save("chan", &table).unwrap();
        let loaded = store.load("chan").unwrap();
        assert_eq!(
            loaded.successors(&TransitionTable::key("a", "b")),
            Some(&["c".to_string(), "d".to_string(), "c".to_string()][..])
        );
    }

    #[test]
    fn test_file_is_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = BrainStore::new(dir.path());
        store.save("chan", &sample_table()).unwrap();

        let text = fs::read_to_string(store.path_for("chan")).unwrap();
        assert!(text.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["the|cat"], serde_json::json!(["sat"]));
    }

    #[test]
    fn test_corrupt_file_errors_and_load_or_empty_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let store = BrainStore::new(dir.path());
        fs::write(store.path_for("chan"), "{not json").unwrap();

        assert!(matches!(store.load("chan"), Err(StorageError::Json { .. })));
        assert!(store.load_or_empty("chan").is_empty());
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = BrainStore::new(dir.path().join("nested").join("brains"));
        store.save("chan", &sample_table()).unwrap();
        assert!(store.path_for("chan").exists());
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = BrainStore::new(dir.path());
        store.save("chan", &sample_table()).unwrap();

        store.remove("chan").unwrap();
        assert!(!store.path_for("chan").exists());
        store.remove("chan").unwrap();
    }

    #[tokio::test]
    async fn test_save_encoded_on_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        let store = BrainStore::new(dir.path());
        let table = sample_table();

        let bytes = BrainStore::encode(&table).unwrap();
        store.save_encoded("chan", bytes).await.unwrap();
        assert_eq!(store.load("chan").unwrap(), table);
    }
}
