use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

use crate::task::Task;

const STORE_FILE: &str = "tasks.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tasks could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("stored tasks are corrupt: {0}")]
    DataCorruption(#[source] serde_json::Error),

    #[error("no data directory available on this platform")]
    NoDataDir,
}

/// Persists the whole task collection as one JSON document under a fixed
/// file name. Every field round-trips exactly: ids, names, timestamps,
/// block order, iteration counts, and regions in their stored corner order.
#[derive(Debug)]
pub struct TaskStorage {
    path: PathBuf,
}

impl TaskStorage {
    /// Store rooted at an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform data directory, created if needed.
    pub async fn open_default() -> Result<Self, StorageError> {
        let data_dir = dirs::data_dir()
            .ok_or(StorageError::NoDataDir)?
            .join("tapdeck");
        Self::in_dir(data_dir).await
    }

    /// Store under an explicit directory, created if needed.
    pub async fn in_dir(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self::new(dir.join(STORE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as an empty collection. Unparseable content is
    /// reported without touching the file, so the caller's in-memory state
    /// stays whatever it was.
    pub async fn load(&self) -> Result<Vec<Task>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        match serde_json::from_str(&content) {
            Ok(tasks) => Ok(tasks),
            Err(error) => Err(StorageError::DataCorruption(error)),
        }
    }

    /// Atomic save: write a sibling temp file, then rename over the target.
    /// A crash mid-save leaves the previous document intact.
    pub async fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(tasks)?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::block::Block;
    use crate::geometry::Region;
    use crate::task::TaskId;

    fn sample_tasks() -> Vec<Task> {
        let mut first = Task::named(TaskId(1_700_000_000_000), "swipe practice");
        first.blocks.push(Block::tap_in(Region::new(50.0, 60.0, 10.0, 20.0)));
        first.blocks.push(Block::loop_with(
            3,
            vec![Block::tap(), Block::function(vec![Block::tap()])],
        ));

        let second = Task::new(TaskId(1_700_000_000_001));
        vec![first, second]
    }

    #[tokio::test]
    async fn storage_round_trips_every_field() {
        let dir = TempDir::new().expect("temp dir");
        let storage = TaskStorage::new(dir.path().join("tasks.json"));
        let tasks = sample_tasks();

        storage.save(&tasks).await.expect("save");
        let loaded = storage.load().await.expect("load");
        assert_eq!(loaded, tasks);

        // Ids and the unnormalized region corners survive verbatim.
        let region = loaded[0].blocks[0].region().expect("region kept");
        assert_eq!(region.x1, 50.0);
        assert_eq!(region.x2, 10.0);
        assert_eq!(loaded[0].blocks[1].id(), tasks[0].blocks[1].id());
    }

    #[tokio::test]
    async fn storage_missing_file_loads_empty() {
        let dir = TempDir::new().expect("temp dir");
        let storage = TaskStorage::new(dir.path().join("tasks.json"));

        let loaded = storage.load().await.expect("load");
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn storage_corrupt_file_is_reported_not_erased() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "{ definitely not a task list").expect("seed file");

        let storage = TaskStorage::new(&path);
        let result = storage.load().await;
        assert!(matches!(result, Err(StorageError::DataCorruption(_))));

        let content = std::fs::read_to_string(&path).expect("file still there");
        assert_eq!(content, "{ definitely not a task list");
    }

    #[tokio::test]
    async fn storage_save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("tasks.json");
        let storage = TaskStorage::new(&path);

        storage.save(&sample_tasks()).await.expect("save");
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn storage_save_replaces_the_previous_document() {
        let dir = TempDir::new().expect("temp dir");
        let storage = TaskStorage::new(dir.path().join("tasks.json"));

        storage.save(&sample_tasks()).await.expect("first save");
        let shorter = vec![Task::new(TaskId(42))];
        storage.save(&shorter).await.expect("second save");

        let loaded = storage.load().await.expect("load");
        assert_eq!(loaded, shorter);
    }
}
