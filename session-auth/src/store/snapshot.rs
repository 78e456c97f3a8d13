//! Whole-collection JSON persistence.
//!
//! A [`JsonCollection`] owns one JSON array on disk and an in-memory copy of it.
//! Readers get the last committed snapshot without waiting on writers. Writers are
//! serialized: each mutation works on a copy, replaces the file atomically
//! (temp file + rename) and only then publishes the copy as the new snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Outcome of a mutation closure.
pub enum Change<R> {
    /// Persist the modified records and publish them.
    Commit(R),
    /// Nothing changed; skip the write.
    Skip(R),
}

/// A JSON array of records persisted in a single file.
pub struct JsonCollection<T> {
    name: &'static str,
    path: PathBuf,
    committed: RwLock<Arc<Vec<T>>>,
    writer: Mutex<()>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    /// Load the collection from `path`, creating the file (and its directory) if missing.
    ///
    /// A file that is not a JSON array is replaced by an empty collection. Records
    /// that fail to decode are skipped and left in the file until the next write.
    pub async fn load(name: &'static str, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io_path("creating data directory", parent, e))?;
        }

        let records = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
                Ok(values) => decode_records(name, values),
                Err(e) => {
                    warn!(
                        collection = name,
                        path = %path.display(),
                        raw_len = raw.len(),
                        error = %e,
                        "Unparsable collection file; resetting to empty"
                    );
                    write_atomic(&path, &Vec::<T>::new()).await?;
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(collection = name, path = %path.display(), "Creating empty collection file");
                write_atomic(&path, &Vec::<T>::new()).await?;
                Vec::new()
            }
            Err(e) => return Err(Error::io_path("reading collection", &path, e)),
        };

        debug!(collection = name, count = records.len(), "Collection loaded");

        Ok(Self {
            name,
            path,
            committed: RwLock::new(Arc::new(records)),
            writer: Mutex::new(()),
        })
    }

    /// The last committed records.
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        self.committed.read().clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `f` to a copy of the records under the single-writer lock.
    ///
    /// On [`Change::Commit`] the copy is written to disk and then published; if the
    /// write fails the committed snapshot is left as it was.
    pub async fn mutate<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<T>) -> Change<R>,
    {
        let _guard = self.writer.lock().await;

        let mut next: Vec<T> = (*self.snapshot()).clone();
        match f(&mut next) {
            Change::Skip(out) => Ok(out),
            Change::Commit(out) => {
                write_atomic(&self.path, &next).await?;
                debug!(collection = self.name, count = next.len(), "Collection persisted");
                *self.committed.write() = Arc::new(next);
                Ok(out)
            }
        }
    }
}

/// Decode each element on its own so one bad record does not cost the rest.
fn decode_records<T: DeserializeOwned>(
    name: &'static str,
    values: Vec<serde_json::Value>,
) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<T>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(collection = name, index, error = %e, "Skipping undecodable record");
                None
            }
        })
        .collect()
}

/// Serialize `records` next to `path`, flush it to disk and rename over it.
async fn write_atomic<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;

    let temp_path = path.with_extension("json.tmp");
    let mut file = tokio::fs::File::create(&temp_path)
        .await
        .map_err(|e| Error::io_path("creating snapshot", &temp_path, e))?;
    file.write_all(json.as_bytes())
        .await
        .map_err(|e| Error::io_path("writing snapshot", &temp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| Error::io_path("syncing snapshot", &temp_path, e))?;
    drop(file);

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| Error::io_path("replacing snapshot", path, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u32,
    }

    #[tokio::test]
    async fn test_load_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("items.json");

        let items = JsonCollection::<Item>::load("items", &path).await.unwrap();
        assert!(items.snapshot().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(&path, "{not json").unwrap();

        let items = JsonCollection::<Item>::load("items", &path).await.unwrap();
        assert!(items.snapshot().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");
    }

    #[tokio::test]
    async fn test_undecodable_record_is_skipped_not_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.json");
        let raw = r#"[{"id": 1}, {"id": "not a number"}, {"id": 3}]"#;
        std::fs::write(&path, raw).unwrap();

        let items = JsonCollection::<Item>::load("items", &path).await.unwrap();
        assert_eq!(items.snapshot().as_ref(), &vec![Item { id: 1 }, Item { id: 3 }]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), raw);
    }

    #[tokio::test]
    async fn test_non_array_file_is_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(&path, r#"{"id": 1}"#).unwrap();

        let items = JsonCollection::<Item>::load("items", &path).await.unwrap();
        assert!(items.snapshot().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");
    }

    #[tokio::test]
    async fn test_commit_persists_and_publishes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.json");
        let items = JsonCollection::<Item>::load("items", &path).await.unwrap();

        items
            .mutate(|all| {
                all.push(Item { id: 7 });
                Change::Commit(())
            })
            .await
            .unwrap();

        assert_eq!(items.snapshot().as_ref(), &vec![Item { id: 7 }]);
        assert!(!path.with_extension("json.tmp").exists());

        let reloaded = JsonCollection::<Item>::load("items", &path).await.unwrap();
        assert_eq!(reloaded.snapshot().as_ref(), &vec![Item { id: 7 }]);
    }

    #[tokio::test]
    async fn test_skip_does_not_publish_changes() {
        let dir = TempDir::new().unwrap();
        let items = JsonCollection::<Item>::load("items", dir.path().join("items.json"))
            .await
            .unwrap();

        let out = items
            .mutate(|all| {
                all.push(Item { id: 1 });
                Change::Skip(42)
            })
            .await
            .unwrap();

        assert_eq!(out, 42);
        assert!(items.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_writers_do_not_lose_updates() {
        let dir = TempDir::new().unwrap();
        let items = Arc::new(
            JsonCollection::<Item>::load("items", dir.path().join("items.json"))
                .await
                .unwrap(),
        );

        let mut handles = Vec::new();
        for id in 0..20 {
            let items = items.clone();
            handles.push(tokio::spawn(async move {
                items
                    .mutate(|all| {
                        all.push(Item { id });
                        Change::Commit(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(items.snapshot().len(), 20);
        let reloaded = JsonCollection::<Item>::load("items", items.path()).await.unwrap();
        assert_eq!(reloaded.snapshot().len(), 20);
    }
}
