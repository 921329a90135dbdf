use crate::domain::ports::KeyValueStore;
use crate::utils::error::{EdgeError, Result};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One JSON file per key under `base_path`.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// 鍵以 percent-encoding 轉成檔名，不同的鍵不會對應到同一個檔案
    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(EdgeError::StorageError {
                message: "storage key must not be empty".to_string(),
            });
        }

        // `%` 一律被編碼，所以補上的 %2A 不會與其他鍵相撞
        let name: String = url::form_urlencoded::byte_serialize(key.as_bytes())
            .collect::<String>()
            .replace('*', "%2A");
        Ok(self.base_path.join(format!("{}.json", name)))
    }
}

impl KeyValueStore for FileStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)?).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(path, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_round_trip_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        assert_eq!(store.read("wearsearch.auth").await.unwrap(), None);
        store.write("wearsearch.auth", r#"{"token":"t"}"#).await.unwrap();
        assert_eq!(
            store.read("wearsearch.auth").await.unwrap().as_deref(),
            Some(r#"{"token":"t"}"#)
        );
        assert!(temp_dir.path().join("wearsearch.auth.json").exists());

        store.remove("wearsearch.auth").await.unwrap();
        store.remove("wearsearch.auth").await.unwrap();
        assert_eq!(store.read("wearsearch.auth").await.unwrap(), None);
    }

    #[test]
    fn test_file_store_keys_stay_inside_base() {
        let store = FileStore::new("/tmp/session");
        let path = store.path_for("../../etc/passwd").unwrap();
        assert_eq!(path.parent().unwrap(), Path::new("/tmp/session"));
        assert_eq!(path.file_name().unwrap(), "..%2F..%2Fetc%2Fpasswd.json");
    }

    #[test]
    fn test_file_store_distinct_keys_get_distinct_files() {
        let store = FileStore::new("/tmp/session");
        let keys = ["a/b", "a_b", "a b", "a+b", "a%2Fb", "a*b", "a%2Ab", ".", "..", "..."];

        let paths: std::collections::HashSet<PathBuf> =
            keys.iter().map(|key| store.path_for(key).unwrap()).collect();
        assert_eq!(paths.len(), keys.len());

        assert!(store.path_for("").is_err());
    }

    #[tokio::test]
    async fn test_file_store_similar_keys_do_not_clobber() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        store.write("a/b", "slash").await.unwrap();
        store.write("a_b", "underscore").await.unwrap();

        assert_eq!(store.read("a/b").await.unwrap().as_deref(), Some("slash"));
        assert_eq!(store.read("a_b").await.unwrap().as_deref(), Some("underscore"));
        assert!(store.write("", "x").await.is_err());
    }
}
