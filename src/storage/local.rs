use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::storage::ObjectStore;

/// Local file system object store: one directory per record id
pub struct LocalObjectStore {
    data_dir: PathBuf,
}

impl LocalObjectStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn record_dir(&self, id: i64) -> PathBuf {
        self.data_dir.join(id.to_string())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn save(&self, id: i64, file_name: &str, data: Bytes) -> Result<()> {
        let dir = self.record_dir(id);
        fs::create_dir_all(&dir).await?;

        let path = dir.join(file_name);
        let mut file = fs::File::create(&path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        tracing::debug!("Saved file to {:?}", path);
        Ok(())
    }

    async fn rename(&self, id: i64, old_name: &str, new_name: &str) -> Result<()> {
        if old_name == new_name {
            return Ok(());
        }

        let dir = self.record_dir(id);
        let old_path = dir.join(old_name);
        let new_path = dir.join(new_name);

        if !old_path.is_file() {
            return Ok(());
        }

        // Copy first: an interrupted rename must leave one complete copy
        // under the record directory.
        fs::copy(&old_path, &new_path).await?;
        if let Err(e) = fs::remove_file(&old_path).await {
            tracing::warn!("Could not remove {:?} after rename: {}", old_path, e);
        }

        tracing::debug!("Renamed {:?} to {:?}", old_path, new_path);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let dir = self.record_dir(id);

        if dir.is_dir() {
            fs::remove_dir_all(&dir).await?;
            tracing::debug!("Deleted {:?}", dir);
        }

        Ok(())
    }

    async fn exists(&self, id: i64, file_name: &str) -> Result<bool> {
        Ok(self.record_dir(id).join(file_name).exists())
    }
}
