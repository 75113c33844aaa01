//! Key/value storage backends

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::StoreError;

/// String key/value storage scoped to one browser tab or CLI session
#[async_trait::async_trait]
pub trait TabStorage: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Remove a value; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every value
    async fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory storage (one process = one tab)
#[derive(Default)]
pub struct InMemoryTabStorage {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryTabStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TabStorage for InMemoryTabStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self
            .values
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut values = self
            .values
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        values.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut values = self
            .values
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        values.clear();
        Ok(())
    }
}

/// Storage backed by a session directory, one `<key>.json` file per key
pub struct FileTabStorage {
    dir: PathBuf,
}

impl FileTabStorage {
    const EXTENSION: &'static str = "json";

    /// Open (and create if needed) a session directory
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::Storage(format!("invalid key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.{}", key, Self::EXTENSION)))
    }
}

#[async_trait::async_trait]
impl TabStorage for FileTabStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.path_for(key)?).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        // write-then-rename so a crash never leaves a half-written record
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(Self::EXTENSION) {
                tokio::fs::remove_file(path).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exercise(storage: &dyn TabStorage) {
        assert_eq!(storage.get("a").await.unwrap(), None);

        storage.set("a", "1".into()).await.unwrap();
        storage.set("b", "2".into()).await.unwrap();
        assert_eq!(storage.get("a").await.unwrap().as_deref(), Some("1"));

        storage.set("a", "3".into()).await.unwrap();
        assert_eq!(storage.get("a").await.unwrap().as_deref(), Some("3"));

        storage.remove("a").await.unwrap();
        storage.remove("a").await.unwrap();
        assert_eq!(storage.get("a").await.unwrap(), None);

        storage.clear().await.unwrap();
        assert_eq!(storage.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_in_memory_storage() {
        exercise(&InMemoryTabStorage::new()).await;
    }

    #[tokio::test]
    async fn test_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTabStorage::open(dir.path().join("session")).await.unwrap();
        exercise(&storage).await;
    }

    #[tokio::test]
    async fn test_file_storage_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let first = FileTabStorage::open(dir.path()).await.unwrap();
        first.set("zklogin.setup", "{}".into()).await.unwrap();

        let second = FileTabStorage::open(dir.path()).await.unwrap();
        assert_eq!(
            second.get("zklogin.setup").await.unwrap().as_deref(),
            Some("{}")
        );
    }

    #[tokio::test]
    async fn test_file_storage_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTabStorage::open(dir.path()).await.unwrap();
        assert!(matches!(
            storage.set("../escape", "x".into()).await,
            Err(StoreError::Storage(_))
        ));
        assert!(storage.get("").await.is_err());
    }
}
