use serde::Serialize;
use sqlx::FromRow;

/// File metadata record
///
/// `sha1` and `md5` are each unique across the table and together identify
/// the stored content; `id` doubles as the object-store directory name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FileRecord {
    pub id: i64,
    pub size: String,
    pub file_name: String,
    pub sha1: String,
    pub md5: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub file_type: String,
}

/// Insert payload for a new record; the store assigns `id`
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub size: String,
    pub file_name: String,
    pub sha1: String,
    pub md5: String,
    pub file_type: String,
}

/// Outward-facing record shape, without the internal id
#[derive(Debug, Clone, Serialize)]
pub struct FileRecordResponse {
    pub size: String,
    pub file_name: String,
    pub sha1: String,
    pub md5: String,
    #[serde(rename = "type")]
    pub file_type: String,
}

impl From<FileRecord> for FileRecordResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            size: record.size,
            file_name: record.file_name,
            sha1: record.sha1,
            md5: record.md5,
            file_type: record.file_type,
        }
    }
}
