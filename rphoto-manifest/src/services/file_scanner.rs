//! Asset tree scanner
//!
//! Lists race and source directories and the photo/video files inside a
//! source. Every listing is sorted by file name so manifests are
//! reproducible regardless of filesystem enumeration order. Directory names
//! starting with `.` or `_` are reserved for caches and temp state and are
//! skipped, as are dot-prefixed files.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Asset scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Kind of a recognized asset file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Video,
}

impl AssetKind {
    /// Classify a file by its extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "heic" => Some(AssetKind::Image),
            "mp4" | "mov" | "m4v" | "webm" => Some(AssetKind::Video),
            _ => None,
        }
    }
}

/// One asset file found in a source directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedAsset {
    pub path: PathBuf,
    pub name: String,
    pub kind: AssetKind,
}

/// Asset tree scanner
pub struct AssetScanner {
    ignore_names: Vec<String>,
}

impl AssetScanner {
    /// Create new scanner with default ignore names
    ///
    /// Ignores OS litter like `Thumbs.db` on top of the reserved-prefix rule.
    pub fn new() -> Self {
        Self {
            ignore_names: vec!["Thumbs.db".to_string(), "desktop.ini".to_string()],
        }
    }

    /// Visible subdirectories of `root`, sorted by name
    pub fn list_dirs(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let dirs = self
            .walk(root)?
            .filter(|entry| entry.file_type().is_dir())
            .map(|entry| entry.into_path())
            .collect();
        Ok(dirs)
    }

    /// Recognized photo and video files of a source directory, sorted by name
    pub fn list_assets(&self, source_dir: &Path) -> Result<Vec<ScannedAsset>, ScanError> {
        let assets: Vec<ScannedAsset> = self
            .walk(source_dir)?
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let kind = AssetKind::from_path(entry.path())?;
                let name = entry.file_name().to_str()?.to_string();
                Some(ScannedAsset {
                    path: entry.into_path(),
                    name,
                    kind,
                })
            })
            .collect();

        tracing::debug!(
            "Scanned {}: {} asset files",
            source_dir.display(),
            assets.len()
        );

        Ok(assets)
    }

    /// Sorted, filtered direct children of `dir`
    fn walk<'a>(&'a self, dir: &Path) -> Result<impl Iterator<Item = DirEntry> + 'a, ScanError> {
        if !dir.exists() {
            return Err(ScanError::PathNotFound(dir.to_path_buf()));
        }
        if !dir.is_dir() {
            return Err(ScanError::NotADirectory(dir.to_path_buf()));
        }

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| self.should_process_entry(e))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    None
                }
            });

        Ok(walker)
    }

    /// Reserved directories, hidden files and ignored names are never listed.
    ///
    /// Underscore-prefixed files stay: cameras name files `_DSC0001.JPG`.
    fn should_process_entry(&self, entry: &DirEntry) -> bool {
        let file_name = entry.file_name().to_string_lossy();
        let hidden = if entry.file_type().is_dir() {
            is_reserved_name(&file_name)
        } else {
            file_name.starts_with('.')
        };
        if hidden {
            return false;
        }
        !self.ignore_names.iter().any(|name| file_name == name.as_str())
    }
}

impl Default for AssetScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Dot- and underscore-prefixed directories hold caches and temp state
pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_asset_extension_detection() {
        assert_eq!(AssetKind::from_path(Path::new("a.JPG")), Some(AssetKind::Image));
        assert_eq!(AssetKind::from_path(Path::new("a.heic")), Some(AssetKind::Image));
        assert_eq!(AssetKind::from_path(Path::new("a.MOV")), Some(AssetKind::Video));
        assert_eq!(AssetKind::from_path(Path::new("photos_list.json")), None);
        assert_eq!(AssetKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_scan_nonexistent_path() {
        let scanner = AssetScanner::new();
        match scanner.list_dirs(Path::new("/nonexistent/path")) {
            Err(ScanError::PathNotFound(_)) => {}
            other => panic!("Expected PathNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_dirs_sorted_and_reserved_skipped() {
        let temp = TempDir::new().unwrap();
        for name in ["b-race", "a-race", ".cache", "_tmp"] {
            fs::create_dir(temp.path().join(name)).unwrap();
        }
        fs::write(temp.path().join("manifest.json"), "{}").unwrap();

        let dirs = AssetScanner::new().list_dirs(temp.path()).unwrap();
        let names: Vec<_> = dirs
            .iter()
            .map(|d| d.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a-race", "b-race"]);
    }

    #[test]
    fn test_assets_filtered_and_sorted() {
        let temp = TempDir::new().unwrap();
        for name in ["c.mp4", "a.jpg", "b.PNG", ".hidden.jpg", "photos_list.json", "Thumbs.db"] {
            fs::write(temp.path().join(name), b"x").unwrap();
        }
        fs::create_dir(temp.path().join("nested.jpg")).unwrap();

        let assets = AssetScanner::new().list_assets(temp.path()).unwrap();
        let names: Vec<_> = assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG", "c.mp4"]);
        assert_eq!(assets[2].kind, AssetKind::Video);
    }

    #[test]
    fn test_underscore_camera_files_are_listed() {
        let temp = TempDir::new().unwrap();
        for name in ["_DSC0001.JPG", "_MG_1234.jpg", "._DSC0001.JPG"] {
            fs::write(temp.path().join(name), b"x").unwrap();
        }
        fs::create_dir(temp.path().join("_staging")).unwrap();

        let scanner = AssetScanner::new();
        let assets = scanner.list_assets(temp.path()).unwrap();
        let names: Vec<_> = assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["_DSC0001.JPG", "_MG_1234.jpg"]);

        assert!(scanner.list_dirs(temp.path()).unwrap().is_empty());
    }
}
