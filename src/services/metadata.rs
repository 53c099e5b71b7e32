use std::collections::HashMap;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{FileRecord, NewFileRecord};

/// Fields an update payload may carry
const UPDATABLE_FIELDS: [&str; 2] = ["file_name", "type"];

/// Durable store of file metadata records
///
/// Uniqueness of sha1 and md5 is enforced by the table's unique indexes,
/// so concurrent creates with colliding digests resolve to exactly one
/// winner and one conflict.
#[derive(Clone)]
pub struct MetadataStore {
    db: Database,
}

impl MetadataStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new record, assigning its id
    ///
    /// A sha1 or md5 already present in the table is a conflict; the
    /// transaction is rolled back before the error is reported, so no
    /// partial row is ever visible.
    pub async fn create(&self, record: NewFileRecord) -> Result<FileRecord> {
        let mut tx = self.db.pool().begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO file_metadata (size, file_name, sha1, md5, type) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.size)
        .bind(&record.file_name)
        .bind(&record.sha1)
        .bind(&record.md5)
        .bind(&record.file_type)
        .execute(&mut *tx)
        .await;

        let id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(e) => {
                tx.rollback().await?;
                if is_unique_violation(&e) {
                    return Err(AppError::Conflict("File already exists".to_string()));
                }
                return Err(e.into());
            }
        };

        tx.commit().await?;

        let created: FileRecord = sqlx::query_as("SELECT * FROM file_metadata WHERE id = ?")
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(created)
    }

    /// All records currently in the store
    pub async fn list_all(&self) -> Result<Vec<FileRecord>> {
        let records = sqlx::query_as("SELECT * FROM file_metadata")
            .fetch_all(self.db.pool())
            .await?;

        Ok(records)
    }

    /// Look a record up by hash, checking both digest columns; the hash is
    /// not validated as being one format or the other
    pub async fn find_by_digest(&self, hash: &str) -> Result<FileRecord> {
        let record: Option<FileRecord> =
            sqlx::query_as("SELECT * FROM file_metadata WHERE sha1 = ? OR md5 = ?")
                .bind(hash)
                .bind(hash)
                .fetch_optional(self.db.pool())
                .await?;

        record.ok_or_else(|| {
            tracing::error!("File with hash {} not found", hash);
            AppError::NotFound(format!("File with hash {} not found", hash))
        })
    }

    /// Apply a partial-field update to the record matching `hash`
    ///
    /// Only file_name and type may change; id, size and the digests are
    /// preserved unconditionally. The payload check is the documented one:
    /// at most two fields, all drawn from the allow-list. Values are not
    /// inspected.
    pub async fn update(&self, hash: &str, fields: &HashMap<String, String>) -> Result<FileRecord> {
        let existing = self.find_by_digest(hash).await?;

        Self::validate_update(fields)?;

        let file_name = fields.get("file_name").unwrap_or(&existing.file_name);
        let file_type = fields.get("type").unwrap_or(&existing.file_type);

        sqlx::query("UPDATE file_metadata SET file_name = ?, type = ? WHERE id = ?")
            .bind(file_name)
            .bind(file_type)
            .bind(existing.id)
            .execute(self.db.pool())
            .await?;

        let updated: FileRecord = sqlx::query_as("SELECT * FROM file_metadata WHERE id = ?")
            .bind(existing.id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(updated)
    }

    /// Remove the record matching `hash`
    pub async fn delete(&self, hash: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM file_metadata WHERE sha1 = ? OR md5 = ?")
            .bind(hash)
            .bind(hash)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            tracing::error!("File with hash {} not found", hash);
            return Err(AppError::NotFound(format!(
                "File with hash {} not found",
                hash
            )));
        }

        Ok(())
    }

    fn validate_update(fields: &HashMap<String, String>) -> Result<()> {
        if fields.len() > UPDATABLE_FIELDS.len() {
            return Err(AppError::Validation(
                "Invalid properties provided".to_string(),
            ));
        }

        for key in fields.keys() {
            if !UPDATABLE_FIELDS.contains(&key.as_str()) {
                return Err(AppError::Validation(format!("Invalid property: {}", key)));
            }
        }

        Ok(())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
