//! File storage for uploaded images.
//!
//! Recipe images and user avatars arrive as base64 payloads and are written
//! to a local directory served as static files.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Stored file metadata.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Storage key (relative path under the base directory).
    pub key: String,
    /// Public URL of the file, built from the backend's base URL.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store a file under the given key.
    async fn store(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredFile>;

    /// Delete a file.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the URL path for a key.
    fn public_url(&self, key: &str) -> String;

    /// Recover the storage key from a URL produced by [`Self::public_url`].
    /// Returns `None` for URLs this backend did not produce.
    fn key_from_url(&self, url: &str) -> Option<String>;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self { base_path, base_url }
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn store(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredFile> {
        let path = self.base_path.join(key);

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file: {e}")))?;

        Ok(StoredFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
        if path.exists() {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        let base = self.base_url.trim_end_matches('/');
        url.strip_prefix(base)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .filter(|key| !key.is_empty())
    }
}

/// Generate a unique storage key for an uploaded file.
#[must_use]
pub fn generate_storage_key(prefix: &str, extension: &str) -> String {
    use chrono::Utc;

    let date_path = Utc::now().format("%Y/%m/%d").to_string();
    let ext = if extension.is_empty() || extension.len() > 10 {
        "bin"
    } else {
        extension
    };

    format!("{prefix}/{date_path}/{}.{ext}", uuid::Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_storage_key() {
        let key = generate_storage_key("recipes", "jpg");
        assert!(key.starts_with("recipes/"));
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn test_generate_storage_key_bad_extension() {
        let key = generate_storage_key("avatars", "");
        assert!(key.ends_with(".bin"));
    }

    #[test]
    fn test_local_public_url() {
        let storage = LocalStorage::new(PathBuf::from("./media"), "/media".to_string());
        assert_eq!(storage.public_url("a/b.png"), "/media/a/b.png");
    }

    #[test]
    fn test_key_from_url_round_trip() {
        let storage = LocalStorage::new(
            PathBuf::from("./media"),
            "http://localhost:3000/media".to_string(),
        );
        let url = storage.public_url("avatars/x.png");
        assert_eq!(storage.key_from_url(&url).as_deref(), Some("avatars/x.png"));
        assert_eq!(storage.key_from_url("http://elsewhere/a.png"), None);
    }
}
