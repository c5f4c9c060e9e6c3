pub mod disk;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::utils::error::CustomError;

/// Contract for the file store behind post attachments and avatars.
///
/// `store` returns the stable relative path later used for lookups, URL
/// resolution and deletion.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Persist bytes under `namespace/filename`, returning the stored path
    async fn store(
        &self,
        namespace: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, CustomError>;

    /// Remove previously stored files; missing files are not an error
    async fn delete(&self, paths: &[String]) -> Result<(), CustomError>;

    /// Public URL a client can fetch the file from
    fn resolve_url(&self, path: &str) -> String;

    /// Location of the file on the local filesystem
    fn resolve_local_path(&self, path: &str) -> PathBuf;
}
