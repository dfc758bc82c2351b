use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store file holds invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flat-file JSON persistence. One file per collection, pretty-printed so the
/// files stay hand-editable. There is deliberately no locking: the service
/// assumes a single writer and last-write-wins on concurrent admin edits.
#[derive(Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Load `name`, seeding it with `default()` when the file does not exist
    /// yet. Anything else (unreadable file, broken JSON) is a real error.
    pub async fn load_or_init<T, F>(&self, name: &str, default: F) -> Result<T, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let path = self.path(name);
        match tokio::fs::read(&path).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let value = default();
                self.save(name, &value).await?;
                debug!(file = name, "store file missing, seeded default");
                Ok(value)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite `name` atomically: write a sibling temp file, then rename it
    /// over the target so readers never observe a half-written file.
    pub async fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let path = self.path(name);
        let tmp = self.dir.join(format!("{name}.json.tmp"));
        let raw = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn missing_file_is_seeded_with_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::open(dir.path()).expect("open store");

        let loaded: BTreeMap<String, u32> = store
            .load_or_init("counts", BTreeMap::new)
            .await
            .expect("load");
        assert!(loaded.is_empty());
        assert!(dir.path().join("counts.json").exists());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::open(dir.path()).expect("open store");

        let mut value = BTreeMap::new();
        value.insert("100269".to_string(), "Admin".to_string());
        store.save("users", &value).await.expect("save");

        let loaded: BTreeMap<String, String> = store
            .load_or_init("users", BTreeMap::new)
            .await
            .expect("load");
        assert_eq!(loaded, value);
        // No temp file left behind after the rename.
        assert!(!dir.path().join("users.json.tmp").exists());
    }

    #[tokio::test]
    async fn broken_json_is_an_error_not_a_reset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::open(dir.path()).expect("open store");
        std::fs::write(dir.path().join("users.json"), b"{ not json").expect("write");

        let result: Result<BTreeMap<String, String>, _> =
            store.load_or_init("users", BTreeMap::new).await;
        assert!(matches!(result, Err(StoreError::Json(_))));
    }
}
