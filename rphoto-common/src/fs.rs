//! Scoped atomic file persistence
//!
//! Cache records and the manifest are replaced with a write-to-sibling then
//! rename sequence. The staged file is owned by a [`NamedTempFile`] guard, so
//! it is removed on every exit path that does not reach the final rename:
//! serialization failure, I/O failure, or unwinding.

use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Write bytes to `path` using an atomic replace.
///
/// The staged file is created in the destination directory so the final
/// rename never crosses a filesystem boundary. Its name is dot-prefixed and
/// therefore invisible to the asset tree walker while it exists.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut staged = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(&mut staged);
        writer.write_all(bytes)?;
        writer.flush()?;
    }
    staged.as_file().sync_all()?;

    staged.persist(path).map_err(|e| Error::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Atomically replaced file");
    Ok(())
}

/// Serialize `value` as two-space pretty JSON (with trailing newline) and
/// write it atomically.
///
/// Serialization happens before anything touches the disk, so a value that
/// cannot be encoded leaves the previous file untouched.
pub fn atomic_write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    atomic_write_bytes(path, &bytes)
}

/// Read a JSON document if the file exists.
///
/// Returns `Ok(None)` for a missing file; unreadable or malformed files are
/// errors so callers can decide whether that is recoverable.
pub fn read_json_opt(path: &Path) -> Result<Option<Value>> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&text)?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_atomic_write_creates_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photos_list.json");

        atomic_write_bytes(&path, b"one").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one");

        atomic_write_bytes(&path, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");

        assert_eq!(dir_entries(dir.path()), vec!["photos_list.json"]);
    }

    #[test]
    fn test_atomic_write_creates_missing_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("race").join("source").join("race_info.json");

        atomic_write_json(&path, &json!({"date": "2024-03-10"})).unwrap();

        let back = read_json_opt(&path).unwrap().unwrap();
        assert_eq!(back["date"], "2024-03-10");
    }

    #[test]
    fn test_atomic_write_json_is_pretty_with_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");

        atomic_write_json(&path, &json!({"races": []})).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n  \"races\": []\n}\n");
    }

    #[test]
    fn test_serialization_failure_leaves_target_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photos_list.json");
        atomic_write_bytes(&path, b"[1]").unwrap();

        // Non-string map keys cannot be encoded as JSON
        let mut bad: HashMap<(i32, i32), i32> = HashMap::new();
        bad.insert((1, 2), 3);
        assert!(atomic_write_json(&path, &bad).is_err());

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1]");
        assert_eq!(dir_entries(dir.path()), vec!["photos_list.json"]);
    }

    #[test]
    fn test_read_json_opt_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(read_json_opt(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn test_read_json_opt_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        match read_json_opt(&path) {
            Err(Error::Json(_)) => {}
            other => panic!("Expected Json error, got {:?}", other),
        }
    }
}
