//! Persistence of extraction results next to their source images.
//!
//! `dir/receipt.png` produces `dir/receipt.json`. Existing results are
//! overwritten.

use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};

/// Path of the JSON file that holds the extraction result for `image`.
pub fn output_path_for(image: &Path) -> PathBuf {
    image.with_extension("json")
}

/// Write a response body as-is.
///
/// Used by single and individual modes, where the model output is stored
/// without being parsed.
pub fn write_raw(path: &Path, text: &str) -> PipelineResult<()> {
    std::fs::write(path, text).map_err(|e| PipelineError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write a reconciled payload as pretty-printed JSON (non-ASCII kept as-is).
pub fn write_json(path: &Path, value: &Value) -> PipelineResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| PipelineError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    write_raw(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_path_for() {
        assert_eq!(
            output_path_for(Path::new("example/receipt.png")),
            PathBuf::from("example/receipt.json")
        );
        assert_eq!(
            output_path_for(Path::new("scan.2024.JPEG")),
            PathBuf::from("scan.2024.json")
        );
    }

    #[test]
    fn test_write_raw_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.json");
        write_raw(&path, "old").unwrap();
        write_raw(&path, "[{\"type\": \"header\"}]").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[{\"type\": \"header\"}]"
        );
    }

    #[test]
    fn test_write_json_pretty_keeps_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.json");
        write_json(&path, &json!({"merchant": "Potraviny Žižkov", "total": 129.9})).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Potraviny Žižkov"));
        assert!(content.contains("\n  \"merchant\""));
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("r.json");
        let err = write_raw(&path, "{}").unwrap_err();
        assert!(matches!(err, PipelineError::Write { .. }));
    }
}
