use std::collections::HashMap;

use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{FileRecordResponse, NewFileRecord};
use crate::services::digest::digest_file;
use crate::services::metadata::MetadataStore;
use crate::services::sniff::sniff_file;
use crate::storage::{LocalObjectStore, ObjectStore};

/// File service
///
/// Coordinates the metadata store and the object store so the two stay in
/// lockstep: a record exists exactly when its `{id}/{file_name}` directory
/// holds the uploaded bytes, apart from the documented in-flight windows.
/// Concurrent renames or deletes against the same id are not serialized.
pub struct FileService {
    meta: MetadataStore,
    store: Box<dyn ObjectStore>,
}

impl FileService {
    pub fn new(db: Database, store: Box<dyn ObjectStore>) -> Self {
        Self {
            meta: MetadataStore::new(db),
            store,
        }
    }

    /// Build a service from configuration: connect the database, run
    /// migrations, and root the object store at the configured data dir
    pub async fn from_config(config: &Config) -> Result<Self> {
        let db = Database::new(&config.database.path).await?;
        db.run_migrations().await?;

        let store = LocalObjectStore::new(config.storage.data_dir.clone());
        Ok(Self::new(db, Box::new(store)))
    }

    /// Ingest an uploaded file: stream it to scratch space, extract its
    /// metadata, insert the record, then persist the bytes.
    ///
    /// The record is committed before the blob is written, so a rejected
    /// insert never leaves stray bytes behind. A blob write that fails
    /// after the commit leaves an orphaned row for external
    /// reconciliation; there is no compensating transaction.
    pub async fn ingest<R>(&self, file_name: &str, mut payload: R) -> Result<FileRecordResponse>
    where
        R: AsyncRead + Unpin,
    {
        if file_name.is_empty() || file_name.contains('/') || file_name.contains('\\') {
            return Err(AppError::Validation("Invalid file name".to_string()));
        }

        let scratch = tempfile::tempdir()?;
        let scratch_path = scratch.path().join(file_name);

        let mut out = tokio::fs::File::create(&scratch_path).await?;
        tokio::io::copy(&mut payload, &mut out).await?;
        out.flush().await?;
        drop(out);

        let digest = digest_file(&scratch_path).await?;
        let file_type = sniff_file(&scratch_path);
        let size = digest.size;

        let record = match self
            .meta
            .create(NewFileRecord {
                size: size.to_string(),
                file_name: file_name.to_string(),
                sha1: digest.sha1,
                md5: digest.md5,
                file_type,
            })
            .await
        {
            Ok(record) => record,
            Err(e) => {
                // Scratch is discarded on drop; the object store was
                // never touched.
                if matches!(e, AppError::Conflict(_)) {
                    tracing::error!("File exists: {} ({} bytes)", file_name, size);
                }
                return Err(e);
            }
        };

        self.store
            .save_file(record.id, &record.file_name, &scratch_path)
            .await?;

        tracing::info!(
            "File uploaded: {} (id {}, {} bytes, {})",
            record.file_name,
            record.id,
            record.size,
            record.file_type
        );

        Ok(record.into())
    }

    /// Metadata for every stored file
    pub async fn list(&self) -> Result<Vec<FileRecordResponse>> {
        let records = self.meta.list_all().await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Metadata for the file matching a digest
    pub async fn get(&self, hash: &str) -> Result<FileRecordResponse> {
        let record = self.meta.find_by_digest(hash).await?;
        Ok(record.into())
    }

    /// Update file_name and/or type for the record matching `hash`
    ///
    /// The metadata update is applied first; the stored file is renamed
    /// only once it has succeeded, so a rejected payload never touches
    /// the filesystem.
    pub async fn update(
        &self,
        hash: &str,
        fields: &HashMap<String, String>,
    ) -> Result<FileRecordResponse> {
        let existing = self.meta.find_by_digest(hash).await?;
        let updated = self.meta.update(hash, fields).await?;

        if let Some(new_name) = fields.get("file_name") {
            self.store
                .rename(existing.id, &existing.file_name, new_name)
                .await?;
        }

        tracing::info!("File updated: {} (id {})", updated.file_name, updated.id);
        Ok(updated.into())
    }

    /// Remove a file's metadata row and its stored bytes
    ///
    /// The row must be gone before the filesystem is touched; an unknown
    /// hash leaves the object store alone.
    pub async fn delete(&self, hash: &str) -> Result<FileRecordResponse> {
        let record = self.meta.find_by_digest(hash).await?;
        self.meta.delete(hash).await?;
        self.store.delete(record.id).await?;

        tracing::warn!("File {} deleted", record.file_name);
        Ok(record.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FILE_CONTENT: &[u8] = b"testingtesting8";
    const FILE_MD5: &str = "2f195ff9fe5b1d22cf752afbde97fac2";
    const FILE_SHA1: &str = "358a09fe9e305ac2f9a2ddd238c97986dab03381";

    async fn test_service() -> (TempDir, FileService) {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("depot.db");
        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        db.run_migrations().await.unwrap();

        let store = LocalObjectStore::new(tmp.path().join("data"));
        (tmp, FileService::new(db, Box::new(store)))
    }

    fn stored_path(tmp: &TempDir, id: i64, name: &str) -> std::path::PathBuf {
        tmp.path().join("data").join(id.to_string()).join(name)
    }

    #[tokio::test]
    async fn test_ingest_creates_record_and_blob() {
        let (tmp, service) = test_service().await;

        let record = service.ingest("testing.jpg", FILE_CONTENT).await.unwrap();

        assert_eq!(record.file_name, "testing.jpg");
        assert_eq!(record.size, "15");
        assert_eq!(record.md5, FILE_MD5);
        assert_eq!(record.sha1, FILE_SHA1);
        // The payload carries no recognizable signature
        assert_eq!(record.file_type, "unknown/unknown");

        let path = stored_path(&tmp, 1, "testing.jpg");
        assert_eq!(std::fs::read(&path).unwrap(), FILE_CONTENT);
    }

    #[tokio::test]
    async fn test_ingest_rejects_bad_file_name() {
        let (_tmp, service) = test_service().await;

        let result = service.ingest("../escape.txt", FILE_CONTENT).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service.ingest("", FILE_CONTENT).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_content_is_rejected_without_blob() {
        let (tmp, service) = test_service().await;

        service.ingest("first.bin", FILE_CONTENT).await.unwrap();
        let result = service.ingest("second.bin", FILE_CONTENT).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(service.list().await.unwrap().len(), 1);

        // The rejected upload never reached the object store
        assert!(!tmp.path().join("data/2").exists());
    }

    #[tokio::test]
    async fn test_distinct_content_both_stored() {
        let (_tmp, service) = test_service().await;

        service.ingest("a.bin", &b"payload one"[..]).await.unwrap();
        service.ingest("b.bin", &b"payload two"[..]).await.unwrap();

        assert_eq!(service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_either_digest() {
        let (_tmp, service) = test_service().await;

        service.ingest("testing.jpg", FILE_CONTENT).await.unwrap();

        let by_md5 = service.get(FILE_MD5).await.unwrap();
        let by_sha1 = service.get(FILE_SHA1).await.unwrap();

        assert_eq!(by_md5.file_name, "testing.jpg");
        assert_eq!(by_sha1.file_name, "testing.jpg");
    }

    #[tokio::test]
    async fn test_update_renames_stored_file() {
        let (tmp, service) = test_service().await;

        service.ingest("testing.jpg", FILE_CONTENT).await.unwrap();

        let mut fields = HashMap::new();
        fields.insert("file_name".to_string(), "new_file".to_string());
        fields.insert("type".to_string(), "unknown/unknown".to_string());

        let updated = service.update(FILE_MD5, &fields).await.unwrap();
        assert_eq!(updated.file_name, "new_file");

        assert!(!stored_path(&tmp, 1, "testing.jpg").exists());
        assert_eq!(
            std::fs::read(stored_path(&tmp, 1, "new_file")).unwrap(),
            FILE_CONTENT
        );
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_filesystem_alone() {
        let (tmp, service) = test_service().await;

        service.ingest("testing.jpg", FILE_CONTENT).await.unwrap();

        let mut fields = HashMap::new();
        fields.insert("file_name".to_string(), "other".to_string());
        fields.insert("type".to_string(), "text/plain".to_string());
        fields.insert("size".to_string(), "0".to_string());

        let result = service.update(FILE_MD5, &fields).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        // Neither the record nor the stored file changed
        let record = service.get(FILE_MD5).await.unwrap();
        assert_eq!(record.file_name, "testing.jpg");
        assert!(stored_path(&tmp, 1, "testing.jpg").exists());
        assert!(!stored_path(&tmp, 1, "other").exists());
    }

    #[tokio::test]
    async fn test_update_type_only_keeps_file_name() {
        let (tmp, service) = test_service().await;

        service.ingest("testing.jpg", FILE_CONTENT).await.unwrap();

        let mut fields = HashMap::new();
        fields.insert("type".to_string(), "image/jpeg".to_string());

        let updated = service.update(FILE_MD5, &fields).await.unwrap();
        assert_eq!(updated.file_name, "testing.jpg");
        assert_eq!(updated.file_type, "image/jpeg");
        assert!(stored_path(&tmp, 1, "testing.jpg").exists());
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_blob() {
        let (tmp, service) = test_service().await;

        service.ingest("testing.jpg", FILE_CONTENT).await.unwrap();
        service.delete(FILE_MD5).await.unwrap();

        assert!(matches!(
            service.get(FILE_MD5).await,
            Err(AppError::NotFound(_))
        ));
        assert!(!tmp.path().join("data/1").exists());
    }

    #[tokio::test]
    async fn test_delete_unknown_hash_leaves_storage_untouched() {
        let (tmp, service) = test_service().await;

        service.ingest("testing.jpg", FILE_CONTENT).await.unwrap();

        let result = service.delete("0000").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(stored_path(&tmp, 1, "testing.jpg").exists());
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (_tmp, service) = test_service().await;

        let created = service.ingest("testing.jpg", FILE_CONTENT).await.unwrap();
        assert_eq!(created.md5, FILE_MD5);

        let fetched = service.get(FILE_MD5).await.unwrap();
        assert_eq!(fetched.file_name, "testing.jpg");

        let mut fields = HashMap::new();
        fields.insert("file_name".to_string(), "new_file".to_string());
        fields.insert("type".to_string(), "unknown/unknown".to_string());
        service.update(FILE_MD5, &fields).await.unwrap();

        let fetched = service.get(FILE_MD5).await.unwrap();
        assert_eq!(fetched.file_name, "new_file");

        let deleted = service.delete(FILE_MD5).await.unwrap();
        assert_eq!(deleted.file_name, "new_file");

        assert!(matches!(
            service.get(FILE_MD5).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.list().await.unwrap().is_empty());
    }
}
