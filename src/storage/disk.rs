use std::env;
use std::path::PathBuf;

use async_trait::async_trait;
use log::warn;
use tokio::fs;

use crate::storage::StorageBackend;
use crate::utils::error::CustomError;

/// Local-disk storage rooted at STORAGE_ROOT, served under STORAGE_PUBLIC_URL
pub struct DiskStorage {
    root: PathBuf,
    public_url: String,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        DiskStorage {
            root: root.into(),
            public_url: public_url.into(),
        }
    }

    pub fn from_env() -> Self {
        let root = env::var("STORAGE_ROOT").unwrap_or_else(|_| "storage/public".to_string());
        let public_url = env::var("STORAGE_PUBLIC_URL").unwrap_or_else(|_| "/storage".to_string());
        DiskStorage::new(root, public_url)
    }
}

#[async_trait]
impl StorageBackend for DiskStorage {
    async fn store(
        &self,
        namespace: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, CustomError> {
        let namespace = namespace.trim_matches('/');
        if namespace.contains("..") || filename.contains("..") || filename.contains('/') {
            return Err(CustomError::StorageError(
                "Invalid storage path component".to_string(),
            ));
        }

        let dir = self.root.join(namespace);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CustomError::StorageError(format!("Failed to create directory: {}", e)))?;

        let full_path = dir.join(filename);
        fs::write(&full_path, bytes)
            .await
            .map_err(|e| CustomError::StorageError(format!("Failed to write file: {}", e)))?;

        Ok(format!("{}/{}", namespace, filename))
    }

    async fn delete(&self, paths: &[String]) -> Result<(), CustomError> {
        for path in paths {
            match fs::remove_file(self.resolve_local_path(path)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to delete stored file {}: {}", path, e),
            }
        }
        Ok(())
    }

    fn resolve_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_url.trim_end_matches('/'), path)
    }

    fn resolve_local_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_storage() -> DiskStorage {
        let root = std::env::temp_dir().join(format!("feed-backend-test-{}", Uuid::new_v4()));
        DiskStorage::new(root, "/storage")
    }

    #[actix_web::test]
    async fn store_and_read_back() {
        let storage = temp_storage();

        let path = storage
            .store("attachments/abc", "file.jpg", b"image bytes")
            .await
            .unwrap();
        assert_eq!(path, "attachments/abc/file.jpg");

        let on_disk = fs::read(storage.resolve_local_path(&path)).await.unwrap();
        assert_eq!(on_disk, b"image bytes");

        fs::remove_dir_all(&storage.root).await.unwrap();
    }

    #[actix_web::test]
    async fn delete_removes_files_and_tolerates_missing() {
        let storage = temp_storage();

        let path = storage.store("attachments/abc", "a.jpg", b"x").await.unwrap();
        storage
            .delete(&[path.clone(), "attachments/abc/never-stored.jpg".to_string()])
            .await
            .unwrap();

        assert!(!storage.resolve_local_path(&path).exists());

        fs::remove_dir_all(&storage.root).await.unwrap();
    }

    #[actix_web::test]
    async fn rejects_path_traversal() {
        let storage = temp_storage();

        let result = storage.store("attachments/../../etc", "f.jpg", b"x").await;
        assert!(result.is_err());

        let result = storage.store("attachments/abc", "../f.jpg", b"x").await;
        assert!(result.is_err());
    }

    #[test]
    fn resolves_urls_under_the_public_prefix() {
        let storage = DiskStorage::new("/tmp/files", "/storage/");
        assert_eq!(
            storage.resolve_url("attachments/abc/f.jpg"),
            "/storage/attachments/abc/f.jpg"
        );
    }
}
