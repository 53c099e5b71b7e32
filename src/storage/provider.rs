use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::error::Result;

/// Object store trait
///
/// Blob storage keyed by record id: each record owns one directory holding
/// its file. Absence of the target during rename or delete is a no-op, not
/// an error.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write the bytes for a freshly created record; the caller guarantees
    /// the id has never been used before
    async fn save(&self, id: i64, file_name: &str, data: Bytes) -> Result<()>;

    /// Save from a local path
    /// Default implementation reads the file into memory and calls save
    async fn save_file(&self, id: i64, file_name: &str, source: &Path) -> Result<()> {
        let data = tokio::fs::read(source).await?;
        self.save(id, file_name, Bytes::from(data)).await
    }

    /// Give the stored file a new name; a missing source or identical
    /// names are a silent no-op
    async fn rename(&self, id: i64, old_name: &str, new_name: &str) -> Result<()>;

    /// Remove the record's directory and everything in it; absence is a no-op
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check whether a stored file exists
    async fn exists(&self, id: i64, file_name: &str) -> Result<bool>;
}
