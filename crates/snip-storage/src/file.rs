use crate::kv::KeyValueStore;
use async_trait::async_trait;
use snip_core::error::StorageError;
use snip_core::repository::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

const EXTENSION: &str = "json";

/// File-backed implementation of [`KeyValueStore`].
///
/// Each key is stored as `<root>/<key>.json`. Writes go to a sibling
/// temporary file which is then renamed over the target, so a reader in
/// this process never observes a half-written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| io_error(&root, e))?;
        debug!(root = %root.display(), "opened file store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::Io(format!("invalid key '{}'", key)));
        }
        Ok(self.root.join(format!("{key}.{EXTENSION}")))
    }
}

fn io_error(path: &Path, err: std::io::Error) -> StorageError {
    let message = format!("{}: {}", path.display(), err);
    match err.kind() {
        ErrorKind::PermissionDenied | ErrorKind::NotFound => StorageError::Unavailable(message),
        _ => StorageError::Io(message),
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        trace!(path = %path.display(), "reading key");

        match tokio::fs::read(&path).await {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    // handed on as text so decoding fails open upstream
                    warn!(path = %path.display(), error = %e, "stored value is not valid UTF-8");
                    Ok(Some(String::from_utf8_lossy(e.as_bytes()).into_owned()))
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        trace!(path = %path.display(), bytes = value.len(), "writing key");

        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(&path, e))
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("data")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn open_creates_root() {
        let (_dir, store) = store().await;
        assert!(store.root().is_dir());
    }

    #[tokio::test]
    async fn set_and_get() {
        let (_dir, store) = store().await;

        store.set("shortenedUrls", "[]".to_string()).await.unwrap();

        assert_eq!(
            store.get("shortenedUrls").await.unwrap().as_deref(),
            Some("[]")
        );
        assert!(store.root().join("shortenedUrls.json").is_file());
        assert!(!store.root().join("shortenedUrls.json.tmp").exists());
    }

    #[tokio::test]
    async fn get_nonexistent() {
        let (_dir, store) = store().await;
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let (dir, store) = store().await;
        store.set("appLogs", "[1,2]".to_string()).await.unwrap();
        drop(store);

        let reopened = FileStore::open(dir.path().join("data")).await.unwrap();
        assert_eq!(reopened.get("appLogs").await.unwrap().as_deref(), Some("[1,2]"));
    }

    #[tokio::test]
    async fn invalid_utf8_is_returned_lossily() {
        let (_dir, store) = store().await;
        std::fs::write(store.root().join("k.json"), [0xff, 0xfe, b'[', b']']).unwrap();

        assert_eq!(
            store.get("k").await.unwrap().as_deref(),
            Some("\u{fffd}\u{fffd}[]")
        );
    }

    #[tokio::test]
    async fn remove_existing_and_missing() {
        let (_dir, store) = store().await;
        store.set("k", "v".to_string()).await.unwrap();

        assert!(store.remove("k").await.unwrap());
        assert!(!store.remove("k").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_keys_that_escape_the_root() {
        let (_dir, store) = store().await;

        assert!(store.get("../etc/passwd").await.is_err());
        assert!(store.set("a/b", String::new()).await.is_err());
        assert!(store.get("").await.is_err());
    }
}
