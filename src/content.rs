//! Physical storage for uploaded file content.
//!
//! File records only carry an opaque `content_key`; the bytes live in a
//! [`ContentStore`]. Keys are UUID based (`<uuid>.<ext>`) so user supplied
//! names never reach the filesystem.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use uuid::Uuid;

pub type ContentReader = Pin<Box<dyn AsyncRead + Send>>;
pub type ContentWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Storage backend for file content.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Creates empty content under `key` and returns a writer for it.
    async fn create(&self, key: &str) -> io::Result<ContentWriter>;

    /// Opens the content stored under `key` for reading.
    async fn open(&self, key: &str) -> io::Result<ContentReader>;

    /// Releases the content under `key`.
    ///
    /// Returns `false` if there was nothing to release; missing content is
    /// not an error.
    async fn release(&self, key: &str) -> io::Result<bool>;
}

/// Generates a fresh content key, keeping the extension of `original_name`.
pub fn new_content_key(original_name: &str) -> String {
    let id = Uuid::new_v4();
    match extension_of(original_name) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

fn extension_of(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 16 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Content store keeping every upload as one file inside a directory.
#[derive(Debug, Clone)]
pub struct DiskContentStore {
    base_path: PathBuf,
}

impl DiskContentStore {
    /// Creates the store, creating `base_path` if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> io::Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        // Keys are generated by new_content_key; anything path-like is a bug or an attack.
        if key.is_empty() || key.contains(['/', '\\', '\0']) || key.starts_with('.') {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("invalid content key: {key:?}")));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl ContentStore for DiskContentStore {
    async fn create(&self, key: &str) -> io::Result<ContentWriter> {
        let path = self.path_for(key)?;
        let file = tokio::fs::OpenOptions::new().write(true).create_new(true).open(path).await?;
        Ok(Box::pin(file))
    }

    async fn open(&self, key: &str) -> io::Result<ContentReader> {
        let path = self.path_for(key)?;
        let file = tokio::fs::File::open(path).await?;
        Ok(Box::pin(file))
    }

    async fn release(&self, key: &str) -> io::Result<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn test_content_key_keeps_extension() {
        let key = new_content_key("Report.PDF");
        assert!(key.ends_with(".pdf"));
        assert!(Uuid::parse_str(key.trim_end_matches(".pdf")).is_ok());

        let key = new_content_key("no_extension");
        assert!(Uuid::parse_str(&key).is_ok());

        let key = new_content_key("weird.ext/../../etc");
        assert!(!key.contains('/'));
    }

    #[tokio::test]
    async fn test_disk_store_write_read_release() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        let store = DiskContentStore::new(&uploads).unwrap();
        let key = new_content_key("hello.txt");

        let mut writer = store.create(&key).await.unwrap();
        writer.write_all(b"hello world").await.unwrap();
        writer.shutdown().await.unwrap();
        drop(writer);

        assert!(uploads.join(&key).exists());
        let mut reader = store.open(&key).await.unwrap();
        let mut buf = String::new();
        reader.read_to_string(&mut buf).await.unwrap();
        assert_eq!(buf, "hello world");

        assert!(store.release(&key).await.unwrap());
        assert!(!uploads.join(&key).exists());
        // Releasing twice is fine
        assert!(!store.release(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_disk_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskContentStore::new(dir.path()).unwrap();
        assert!(store.create("../escape").await.is_err());
        assert!(store.release("a/b").await.is_err());
        assert!(store.open("").await.is_err());
    }
}
