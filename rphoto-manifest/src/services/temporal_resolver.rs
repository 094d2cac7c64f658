//! Capture-time resolution
//!
//! Fallback chain, first success wins:
//! 1. timestamp carried by the normalized vendor stub
//! 2. capture time embedded in the asset file (images only)
//!
//! Failures at any step are logged and skipped; an exhausted chain yields
//! `None` and the manifest omits the field.

use super::file_scanner::{AssetKind, ScannedAsset};
use super::metadata_extractor::{CaptureTimeSource, MetadataError};
use crate::types::PhotoStub;
use rphoto_common::time::parse_text_timestamp;

/// Resolves asset capture times
pub struct TemporalResolver<S> {
    embedded: S,
}

impl<S: CaptureTimeSource> TemporalResolver<S> {
    pub fn new(embedded: S) -> Self {
        Self { embedded }
    }

    /// Capture time for `asset`
    pub fn resolve(&self, stub: Option<&PhotoStub>, asset: &ScannedAsset) -> Option<String> {
        if let Some(ts) = stub
            .and_then(|s| s.timestamp.as_deref())
            .and_then(parse_text_timestamp)
        {
            return Some(ts);
        }

        if asset.kind != AssetKind::Image {
            return None;
        }

        match self.embedded.capture_time(&asset.path) {
            Ok(ts) => Some(ts),
            Err(MetadataError::NoMetadata) => None,
            Err(e) => {
                tracing::debug!(file = %asset.path.display(), error = %e, "No embedded capture time");
                None
            }
        }
    }
}
