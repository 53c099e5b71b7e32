use std::path::Path;

/// Sentinel MIME type used when detection fails
pub const UNKNOWN_TYPE: &str = "unknown/unknown";

/// Classify a file by its content signature, never by extension.
/// Detection failure is not fatal; the sentinel type is returned instead.
pub fn sniff_file(path: &Path) -> String {
    match infer::get_from_path(path) {
        Ok(Some(kind)) => kind.mime_type().to_string(),
        Ok(None) => UNKNOWN_TYPE.to_string(),
        Err(e) => {
            tracing::error!("File type detection failed for {:?}: {}", path, e);
            UNKNOWN_TYPE.to_string()
        }
    }
}
