//! Asset Tree Walker & Manifest Synthesizer
//!
//! Walks `<base>/<race>/<source>/` and joins every asset file with its
//! resolved metadata.
//!
//! **Algorithm:**
//! 1. Races and sources in name order, reserved names skipped
//! 2. Per source: normalize `photos_list.json`, list assets, resolve
//!    capture times, interleave video covers
//! 3. Per race: date and locality from the first source that has them,
//!    map coordinate from the route file or the city center
//! 4. Drop empty sources and races; sort races by date, newest first
//!
//! Synthesis never aborts on bad metadata. Unreadable caches only lose
//! their enrichment and the raw file listing is still emitted.

use super::cover_linker::link_covers;
use super::file_scanner::{AssetScanner, ScannedAsset};
use super::geo_resolver::{GeoResolver, GeoTable};
use super::merge_store::{IdentityKey, PHOTOS_LIST_FILE};
use super::metadata_extractor::{CaptureTimeSource, ExifCaptureTime};
use super::race_metadata::{load_race_info, RaceFacts};
use super::route_reader::RouteIndex;
use super::temporal_resolver::TemporalResolver;
use crate::types::{Manifest, PhotoEntry, PhotoStub, RaceEntry, SourceEntry};
use crate::vendors::{normalize, NormalizedPhotos};
use rphoto_common::config::Settings;
use rphoto_common::fs::{atomic_write_json, read_json_opt};
use rphoto_common::Result;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Builds the manifest for one asset tree
pub struct ManifestBuilder<S> {
    base_dir: PathBuf,
    /// Site-relative path of `base_dir`
    url_prefix: String,
    scanner: AssetScanner,
    temporal: TemporalResolver<S>,
    geo: GeoTable,
    routes: RouteIndex,
}

impl ManifestBuilder<ExifCaptureTime> {
    /// Builder reading embedded capture times from EXIF
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let geo = GeoTable::from_config(settings.geo.as_ref())?;
        let routes = RouteIndex::new(
            &settings.routes_dir,
            site_relative_path(&settings.site_root, &settings.routes_dir),
        );
        Ok(Self::new(
            &settings.base_dir,
            site_relative_path(&settings.site_root, &settings.base_dir),
            routes,
            geo,
            ExifCaptureTime::new(),
        ))
    }
}

impl<S: CaptureTimeSource> ManifestBuilder<S> {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        url_prefix: impl Into<String>,
        routes: RouteIndex,
        geo: GeoTable,
        embedded: S,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            url_prefix: url_prefix.into(),
            scanner: AssetScanner::new(),
            temporal: TemporalResolver::new(embedded),
            geo,
            routes,
        }
    }

    /// Walk the asset tree and synthesize the manifest
    pub fn build(&self) -> Manifest {
        let race_dirs = match self.scanner.list_dirs(&self.base_dir) {
            Ok(dirs) => dirs,
            Err(e) => {
                tracing::warn!(error = %e, "Asset tree unavailable, writing empty manifest");
                return Manifest::default();
            }
        };

        let mut races: Vec<RaceEntry> = race_dirs
            .iter()
            .filter_map(|dir| self.build_race(dir))
            .collect();

        // Stable: equal dates keep name order, empty dates sort last
        races.sort_by(|a, b| b.date.cmp(&a.date));

        let manifest = Manifest { races };
        tracing::info!(
            races = manifest.races.len(),
            photos = manifest.photo_count(),
            "Manifest synthesized"
        );
        manifest
    }

    fn build_race(&self, race_dir: &Path) -> Option<RaceEntry> {
        let name = dir_name(race_dir)?;
        let source_dirs = match self.scanner.list_dirs(race_dir) {
            Ok(dirs) => dirs,
            Err(e) => {
                tracing::warn!(race = %name, error = %e, "Skipping unreadable race");
                return None;
            }
        };

        let mut facts = RaceFacts::new();
        let mut sources = Vec::new();
        for source_dir in &source_dirs {
            if let Some(info) = load_race_info(source_dir) {
                facts.absorb_info(&info);
            }
            if let Some(source) = self.build_source(&name, source_dir, &mut facts) {
                sources.push(source);
            }
        }

        if sources.is_empty() {
            tracing::debug!(race = %name, "Race has no assets, omitted");
            return None;
        }

        let resolver = GeoResolver::new(&self.geo);
        let locality = facts.locality(&resolver);
        if locality.is_empty() {
            tracing::debug!(race = %name, "Race location unresolved");
        }
        let route = self.routes.lookup(&name);
        let coordinate = route
            .as_ref()
            .and_then(|r| r.start)
            .or_else(|| {
                resolver
                    .city_center(&locality.city)
                    .map(|center| (center.lat, center.lon))
            });

        Some(RaceEntry {
            date: facts.date(),
            city: locality.city,
            province: locality.province,
            country: locality.country,
            route: route.map(|r| r.url),
            lat: coordinate.map(|(lat, _)| lat),
            lon: coordinate.map(|(_, lon)| lon),
            sources,
            name,
        })
    }

    fn build_source(&self, race: &str, source_dir: &Path, facts: &mut RaceFacts) -> Option<SourceEntry> {
        let name = dir_name(source_dir)?;
        let assets = match self.scanner.list_assets(source_dir) {
            Ok(assets) => assets,
            Err(e) => {
                tracing::warn!(race = %race, source = %name, error = %e, "Skipping unreadable source");
                return None;
            }
        };
        if assets.is_empty() {
            return None;
        }

        let normalized = load_stubs(source_dir);
        facts.absorb_stubs(&normalized.stubs);

        let by_name = stubs_by_file(&normalized.stubs);

        let photos: Vec<PhotoEntry> = assets
            .iter()
            .map(|asset| {
                let stub = by_name.get(asset.name.as_str()).copied();
                let entry = self.photo_entry(race, &name, asset, stub);
                if let Some(ts) = &entry.timestamp {
                    facts.observe_capture(ts);
                }
                entry
            })
            .collect();

        let photos = link_covers(photos, &normalized.cover_links());
        tracing::debug!(race = %race, source = %name, photos = photos.len(), "Source listed");

        Some(SourceEntry { name, photos })
    }

    fn photo_entry(&self, race: &str, source: &str, asset: &ScannedAsset, stub: Option<&PhotoStub>) -> PhotoEntry {
        let url = join_url(&[&self.url_prefix, race, source, &asset.name]);
        let mut entry = PhotoEntry::new(url, asset.name.clone());
        if let Some((lat, lon)) = stub.and_then(PhotoStub::gps) {
            entry.lat = Some(lat);
            entry.lon = Some(lon);
        }
        entry.timestamp = self.temporal.resolve(stub, asset);
        entry
    }
}

/// Stub per file name.
///
/// When records collide on a name, a vendor identity beats a derived one
/// and the highest vendor identity wins: vendors number uploads in
/// increasing order, so it is the latest upload of that file. Equal ranks
/// keep list order.
fn stubs_by_file(stubs: &[PhotoStub]) -> HashMap<&str, &PhotoStub> {
    let rank = |stub: &PhotoStub| stub.identity.vendor().map(IdentityKey::new);

    let mut by_name: HashMap<&str, &PhotoStub> = HashMap::new();
    for stub in stubs {
        match by_name.entry(stub.filename.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(stub);
            }
            Entry::Occupied(mut slot) => {
                let kept: &PhotoStub = *slot.get();
                let (winner, loser) = if rank(stub) > rank(kept) { (stub, kept) } else { (kept, stub) };
                tracing::debug!(
                    file = %stub.filename,
                    kept = %winner.identity.as_str(),
                    dropped = %loser.identity.as_str(),
                    "Duplicate photo record"
                );
                slot.insert(winner);
            }
        }
    }
    by_name
}

/// Normalized stubs of a source's cached photo list; empty when missing or
/// unreadable
fn load_stubs(source_dir: &Path) -> NormalizedPhotos {
    let path = source_dir.join(PHOTOS_LIST_FILE);
    match read_json_opt(&path) {
        Ok(Some(doc)) => normalize(&doc),
        Ok(None) => NormalizedPhotos::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable photo list");
            NormalizedPhotos::default()
        }
    }
}

fn dir_name(dir: &Path) -> Option<String> {
    dir.file_name()?.to_str().map(str::to_string)
}

fn join_url(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

/// `dir` relative to `site_root`, `/`-separated.
///
/// Paths outside the site root are used as given, minus root and `.`
/// components.
pub fn site_relative_path(site_root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(site_root).unwrap_or(dir);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Write the manifest atomically as pretty JSON
pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    atomic_write_json(path, manifest)?;
    tracing::info!(path = %path.display(), "Manifest written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_relative_path() {
        assert_eq!(site_relative_path(Path::new("docs"), Path::new("docs/images")), "images");
        assert_eq!(site_relative_path(Path::new(""), Path::new("./images")), "images");
        assert_eq!(site_relative_path(Path::new("docs"), Path::new("docs")), "");
        assert_eq!(site_relative_path(Path::new("/srv/site"), Path::new("/data/img")), "data/img");
    }

    #[test]
    fn test_duplicate_file_name_keeps_highest_vendor_identity() {
        use crate::types::StubIdentity;

        let stub = |identity: StubIdentity, ts: &str| {
            let mut stub = PhotoStub::new(identity, "IMG_1.jpg");
            stub.timestamp = Some(ts.to_string());
            stub
        };
        let stubs = vec![
            stub(StubIdentity::Derived("IMG_1.jpg".into()), "2024-03-10 07:00:00"),
            stub(StubIdentity::Vendor("9".into()), "2024-03-10 08:00:00"),
            stub(StubIdentity::Vendor("120".into()), "2024-03-10 09:00:00"),
            stub(StubIdentity::Vendor("15".into()), "2024-03-10 10:00:00"),
            PhotoStub::new(StubIdentity::Vendor("3".into()), "IMG_2.jpg"),
        ];

        let by_name = stubs_by_file(&stubs);
        assert_eq!(by_name.len(), 2);
        assert_eq!(by_name["IMG_1.jpg"].identity.vendor(), Some("120"));
        assert_eq!(by_name["IMG_1.jpg"].timestamp.as_deref(), Some("2024-03-10 09:00:00"));
        assert_eq!(by_name["IMG_2.jpg"].identity.vendor(), Some("3"));
    }

    #[test]
    fn test_duplicate_file_name_with_equal_rank_keeps_first() {
        use crate::types::StubIdentity;

        let mut first = PhotoStub::new(StubIdentity::Derived("a".into()), "a.jpg");
        first.url = Some("https://x/1".into());
        let second = PhotoStub::new(StubIdentity::Derived("a".into()), "a.jpg");
        let stubs = vec![first, second];

        assert_eq!(stubs_by_file(&stubs)["a.jpg"].url.as_deref(), Some("https://x/1"));
    }

    #[test]
    fn test_join_url_skips_empty_prefix() {
        assert_eq!(join_url(&["", "race", "src", "a.jpg"]), "race/src/a.jpg");
        assert_eq!(join_url(&["images", "race", "src", "a.jpg"]), "images/race/src/a.jpg");
    }
}
