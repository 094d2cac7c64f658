//! Embedded capture-time extraction
//!
//! Reads the EXIF block of an asset file and returns its capture time in the
//! canonical `YYYY-MM-DD HH:MM:SS` form. EXIF times carry no zone and are
//! passed through as camera local time.

use rphoto_common::time::parse_text_timestamp;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// Tags tried in order; the first parseable one wins
const CAPTURE_TAGS: &[exif::Tag] = &[
    exif::Tag::DateTimeOriginal,
    exif::Tag::DateTimeDigitized,
    exif::Tag::DateTime,
];

/// Metadata extraction errors
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Container could not be parsed
    #[error("Failed to read metadata: {0}")]
    ReadError(String),

    /// File has no EXIF block or no capture-time tag
    #[error("No metadata found")]
    NoMetadata,

    /// I/O error (file open/read)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Source of embedded capture times
///
/// Implemented by the EXIF reader; tests substitute in-memory sources.
pub trait CaptureTimeSource {
    /// Capture time embedded in the file at `path`
    fn capture_time(&self, path: &Path) -> Result<String, MetadataError>;
}

/// EXIF capture-time reader
pub struct ExifCaptureTime {}

impl ExifCaptureTime {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ExifCaptureTime {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureTimeSource for ExifCaptureTime {
    fn capture_time(&self, path: &Path) -> Result<String, MetadataError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let exif = exif::Reader::new()
            .read_from_container(&mut reader)
            .map_err(|e| match e {
                exif::Error::NotFound(_) => MetadataError::NoMetadata,
                exif::Error::Io(io) => MetadataError::IoError(io),
                other => MetadataError::ReadError(other.to_string()),
            })?;

        let timestamp = CAPTURE_TAGS
            .iter()
            .filter_map(|tag| exif.get_field(*tag, exif::In::PRIMARY))
            .find_map(|field| match &field.value {
                exif::Value::Ascii(parts) => parts
                    .first()
                    .and_then(|raw| parse_text_timestamp(&String::from_utf8_lossy(raw))),
                _ => None,
            })
            .ok_or(MetadataError::NoMetadata)?;

        tracing::debug!(
            file = %path.display(),
            timestamp = %timestamp,
            "Extracted capture time"
        );

        Ok(timestamp)
    }
}
