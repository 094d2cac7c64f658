//! Core Types for the Manifest Pipeline
//!
//! Two families of types live here:
//! - **Stubs:** the normalized in-memory view of one vendor photo record,
//!   produced by the vendor schema adapters and consumed by the resolvers.
//! - **Manifest documents:** the serialized `manifest.json` schema read by
//!   the static gallery front end. Field order is the wire order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Stubs
// ============================================================================

/// Identity of a photo stub
///
/// Only vendor-provided identities take part in cache merging. Derived keys
/// (file names, content tags) exist so lookups still work, but they are
/// never trusted to be stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StubIdentity {
    /// Explicit identity field carried by the vendor record
    Vendor(String),
    /// Key derived from other record fields
    Derived(String),
}

impl StubIdentity {
    /// Vendor identity, if this stub has one
    pub fn vendor(&self) -> Option<&str> {
        match self {
            StubIdentity::Vendor(id) => Some(id),
            StubIdentity::Derived(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StubIdentity::Vendor(id) | StubIdentity::Derived(id) => id,
        }
    }
}

/// Normalized metadata for one on-disk asset
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoStub {
    pub identity: StubIdentity,
    /// File name the asset is stored under inside its source directory
    pub filename: String,
    /// Remote URL the asset was fetched from, when the vendor exposes one
    pub url: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Capture time, `YYYY-MM-DD HH:MM:SS` local time
    pub timestamp: Option<String>,
    /// Cover image file name (videos only)
    pub video_cover: Option<String>,
}

impl PhotoStub {
    pub fn new(identity: StubIdentity, filename: impl Into<String>) -> Self {
        Self {
            identity,
            filename: filename.into(),
            url: None,
            lat: None,
            lon: None,
            timestamp: None,
            video_cover: None,
        }
    }

    /// GPS point, only when both coordinates are present
    pub fn gps(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Video ↔ cover file name links for one source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverLinks {
    pub video_to_cover: BTreeMap<String, String>,
    pub cover_to_video: BTreeMap<String, String>,
}

impl CoverLinks {
    /// Collect links from every stub carrying a cover reference
    pub fn from_stubs(stubs: &[PhotoStub]) -> Self {
        let mut links = Self::default();
        for stub in stubs {
            if let Some(cover) = &stub.video_cover {
                links.link(&stub.filename, cover);
            }
        }
        links
    }

    /// Record a link; the first cover seen for a video is kept
    pub fn link(&mut self, video: &str, cover: &str) {
        if video == cover {
            return;
        }
        self.video_to_cover
            .entry(video.to_string())
            .or_insert_with(|| cover.to_string());
        self.cover_to_video
            .entry(cover.to_string())
            .or_insert_with(|| video.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.video_to_cover.is_empty()
    }
}

// ============================================================================
// Manifest document
// ============================================================================

/// Top-level `manifest.json` document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub races: Vec<RaceEntry>,
}

impl Manifest {
    pub fn photo_count(&self) -> usize {
        self.races
            .iter()
            .flat_map(|race| race.sources.iter())
            .map(|source| source.photos.len())
            .sum()
    }
}

/// One race (event) directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceEntry {
    pub name: String,
    /// `YYYY-MM-DD`, or empty when unknown
    pub date: String,
    pub city: String,
    pub province: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    pub sources: Vec<SourceEntry>,
}

/// One vendor's contribution to a race
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub name: String,
    pub photos: Vec<PhotoEntry>,
}

/// One photo or video asset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoEntry {
    /// Site-relative path
    pub url: String,
    /// File name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Cover image URL (videos only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

impl PhotoEntry {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}
