//! Identity & Merge Store
//!
//! Owns the per-(race, source) cache record `photos_list.json`. Each fresh
//! vendor fetch is merged into the cached list so photos that disappear
//! from a later API response are never lost.
//!
//! **Merge strategy:**
//! - Records with a vendor identity are keyed by it; fresh wins on collision
//! - Records without one are unioned by exact JSON equality and appended
//!   after the identity-sorted records
//! - The merged list is written back in the fresh document's layout
//!
//! A failed or unrecognizable fetch never touches the cache.

use crate::vendors::{detect, Detected};
use rphoto_common::fs::{atomic_write_json, read_json_opt};
use rphoto_common::{Error, Result};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Raw vendor photo list cached per source
pub const PHOTOS_LIST_FILE: &str = "photos_list.json";

/// Race-level vendor metadata cached per source
pub const RACE_INFO_FILE: &str = "race_info.json";

/// Directory name used when a race name sanitizes to nothing
pub const UNKNOWN_RACE: &str = "unknown_race";

/// Directory name used when a source name sanitizes to nothing
pub const UNKNOWN_SOURCE: &str = "unknown_source";

/// Live fetch failures reported by vendor adapters
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network or HTTP failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Merge identity of one raw record
///
/// Integer identities sort numerically and before text identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityKey {
    Numeric(u64, String),
    Text(String),
}

impl IdentityKey {
    pub fn new(id: &str) -> Self {
        match id.parse::<u64>() {
            Ok(n) => IdentityKey::Numeric(n, id.to_string()),
            Err(_) => IdentityKey::Text(id.to_string()),
        }
    }
}

impl Ord for IdentityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (IdentityKey::Numeric(a, sa), IdentityKey::Numeric(b, sb)) => a.cmp(b).then_with(|| sa.cmp(sb)),
            (IdentityKey::Numeric(..), IdentityKey::Text(_)) => Ordering::Less,
            (IdentityKey::Text(_), IdentityKey::Numeric(..)) => Ordering::Greater,
            (IdentityKey::Text(a), IdentityKey::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for IdentityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Merge a fresh vendor document into the cached one.
///
/// Returns `None` when `fresh` has no known layout; the caller must then
/// keep the cache as is. An unrecognizable `existing` is treated as empty.
pub fn merge_documents(existing: Option<&Value>, fresh: &Value) -> Option<Value> {
    let fresh_shape = detect(fresh)?;

    let mut by_identity: BTreeMap<IdentityKey, Value> = BTreeMap::new();
    let mut anonymous: Vec<Value> = Vec::new();

    let mut absorb = |shape: &Detected, doc: &Value| {
        let schema = shape.schema();
        for entry in shape.entries(doc) {
            match schema.identity(entry) {
                Some(id) => {
                    by_identity.insert(IdentityKey::new(&id), entry.clone());
                }
                None => {
                    if !anonymous.contains(entry) {
                        anonymous.push(entry.clone());
                    }
                }
            }
        }
    };

    if let Some((shape, doc)) = existing.and_then(|doc| detect(doc).map(|shape| (shape, doc))) {
        absorb(&shape, doc);
    }
    absorb(&fresh_shape, fresh);

    let merged: Vec<Value> = by_identity.into_values().chain(anonymous).collect();
    Some(fresh_shape.rewrap(fresh, merged))
}

/// Number of raw records in a vendor document
pub fn entry_count(doc: &Value) -> usize {
    detect(doc).map(|shape| shape.entries(doc).len()).unwrap_or(0)
}

/// Result of refreshing one source's cache
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Fresh data merged and written to disk
    Merged {
        document: Value,
        added: usize,
        total: usize,
    },
    /// Fresh data unusable; cached document returned unchanged
    Cached { document: Value },
}

impl RefreshOutcome {
    pub fn document(&self) -> &Value {
        match self {
            RefreshOutcome::Merged { document, .. } | RefreshOutcome::Cached { document } => document,
        }
    }
}

/// On-disk cache records under the asset base directory
pub struct CacheStore {
    base_dir: PathBuf,
}

impl CacheStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Directory holding one source's assets and cache records
    pub fn source_dir(&self, race: &str, source: &str) -> PathBuf {
        self.base_dir
            .join(sanitize_name(race, UNKNOWN_RACE))
            .join(sanitize_name(source, UNKNOWN_SOURCE))
    }

    /// Cached photo list, if any
    pub fn load(&self, race: &str, source: &str) -> Result<Option<Value>> {
        read_json_opt(&self.source_dir(race, source).join(PHOTOS_LIST_FILE))
    }

    /// Merge a fetch result into the cache.
    ///
    /// **Algorithm:**
    /// 1. Read the cache; a malformed cache is logged and treated as absent
    /// 2. Merge the fresh document when it has a known layout, write atomically
    /// 3. Otherwise return the cache unchanged with a warning
    /// 4. Neither usable: [`Error::NotFound`]
    pub fn refresh(
        &self,
        race: &str,
        source: &str,
        fresh: std::result::Result<Value, FetchError>,
    ) -> Result<RefreshOutcome> {
        let path = self.source_dir(race, source).join(PHOTOS_LIST_FILE);

        let existing = match read_json_opt(&path) {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable photo cache");
                None
            }
        };

        match fresh {
            Ok(doc) => match merge_documents(existing.as_ref(), &doc) {
                Some(merged) => {
                    let before = existing.as_ref().map(entry_count).unwrap_or(0);
                    let total = entry_count(&merged);
                    let added = total.saturating_sub(before);
                    atomic_write_json(&path, &merged)?;

                    tracing::info!(race = %race, source = %source, total, added, "Merged photo list");
                    return Ok(RefreshOutcome::Merged {
                        document: merged,
                        added,
                        total,
                    });
                }
                None => {
                    tracing::warn!(race = %race, source = %source, "Fetched photo list has no known layout, keeping cache");
                }
            },
            Err(e) => {
                tracing::warn!(race = %race, source = %source, error = %e, "Photo list fetch failed, keeping cache");
            }
        }

        existing
            .map(|document| RefreshOutcome::Cached { document })
            .ok_or_else(|| Error::NotFound(format!("No photo list for {race}/{source}: fetch failed and no cache")))
    }

    /// Write a source's race metadata atomically
    pub fn store_race_info(&self, race: &str, source: &str, info: &Value) -> Result<PathBuf> {
        let path = self.source_dir(race, source).join(RACE_INFO_FILE);
        atomic_write_json(&path, info)?;
        Ok(path)
    }
}

/// Filesystem-safe directory name.
///
/// `<>:"/\|?*` and control characters become `_`; surrounding whitespace
/// and dots are trimmed; an empty result becomes `fallback`.
pub fn sanitize_name(name: &str, fallback: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
