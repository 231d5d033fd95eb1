//! File boundary: the upload gate, reading a document, writing the export artifact.

use crate::codec;
use crate::error::{EntreeError, Result};
use crate::model::Collection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_EXPORT_FILE_NAME: &str = "entity_hierarchy.json";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// True when the upload declares a JSON content type or its name ends with one of the
/// accepted extensions (compared case-insensitively).
pub fn is_json_upload(
    file_name: &str,
    content_type: Option<&str>,
    accepted_exts: &[String],
) -> bool {
    let declared_json = content_type
        .map(|ct| ct.split(';').next().unwrap_or("").trim())
        .is_some_and(|ct| ct.eq_ignore_ascii_case(JSON_CONTENT_TYPE));
    if declared_json {
        return true;
    }
    let lower = file_name.to_lowercase();
    accepted_exts
        .iter()
        .any(|ext| lower.ends_with(&ext.to_lowercase()))
}

pub fn ensure_json_upload(
    file_name: &str,
    content_type: Option<&str>,
    accepted_exts: &[String],
) -> Result<()> {
    if is_json_upload(file_name, content_type, accepted_exts) {
        Ok(())
    } else {
        Err(EntreeError::InvalidFileType)
    }
}

/// Reads and parses a document from disk. The file type is checked before the file is
/// opened.
pub fn read_collection(path: &Path, accepted_exts: &[String]) -> Result<Collection> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    ensure_json_upload(&name, None, accepted_exts)?;

    let bytes = fs::read(path).map_err(EntreeError::Io)?;
    let collection = codec::parse_bytes(&bytes)?;
    info!(path = %path.display(), entities = collection.len(), "collection read");
    Ok(collection)
}

/// Writes the serialized collection to `path`, creating parent directories as needed.
pub fn write_collection(collection: &Collection, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(EntreeError::Io)?;
    }
    let text = codec::serialize(collection)?;
    fs::write(path, text).map_err(EntreeError::Io)?;
    Ok(())
}

/// Writes the export artifact `file_name` into `dir` and returns its path.
pub fn write_export(collection: &Collection, dir: &Path, file_name: &str) -> Result<PathBuf> {
    let path = dir.join(file_name);
    write_collection(collection, &path)?;
    info!(path = %path.display(), entities = collection.len(), "collection exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entity;
    use tempfile::tempdir;

    fn json_exts() -> Vec<String> {
        vec![".json".to_string()]
    }

    #[test]
    fn upload_gate_accepts_json_by_name_or_type() {
        let exts = json_exts();
        assert!(is_json_upload("model.json", None, &exts));
        assert!(is_json_upload("MODEL.JSON", None, &exts));
        assert!(is_json_upload("blob", Some("application/json"), &exts));
        assert!(is_json_upload("blob", Some("application/json; charset=utf-8"), &exts));
        assert!(!is_json_upload("model.csv", Some("text/csv"), &exts));
        assert!(!is_json_upload("json", None, &exts));
    }

    #[test]
    fn rejected_upload_has_user_message() {
        let err = ensure_json_upload("notes.txt", None, &json_exts()).unwrap_err();
        assert!(matches!(err, EntreeError::InvalidFileType));
        assert_eq!(err.to_string(), "Please upload a JSON file");
    }

    #[test]
    fn read_rejects_wrong_extension_before_reading() {
        let dir = tempdir().unwrap();
        // does not exist: the gate must fail first
        let path = dir.path().join("model.txt");
        let err = read_collection(&path, &json_exts()).unwrap_err();
        assert!(matches!(err, EntreeError::InvalidFileType));
    }

    #[test]
    fn export_then_read_back() {
        let dir = tempdir().unwrap();
        let collection = Collection::new(vec![Entity::new(1, "Asset", None, 1)]);

        let path = write_export(&collection, dir.path(), DEFAULT_EXPORT_FILE_NAME).unwrap();
        assert_eq!(path, dir.path().join("entity_hierarchy.json"));

        let read = read_collection(&path, &json_exts()).unwrap();
        assert!(read.same_content(&collection));
    }

    #[test]
    fn read_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ nope").unwrap();
        let err = read_collection(&path, &json_exts()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON format");
    }

    #[test]
    fn write_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/data.json");
        write_collection(&Collection::default(), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }
}
