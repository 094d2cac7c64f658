//! Pipeline services

pub mod cover_linker;
pub mod file_scanner;
pub mod geo_resolver;
pub mod manifest_builder;
pub mod merge_store;
pub mod metadata_extractor;
pub mod race_metadata;
pub mod route_reader;
pub mod temporal_resolver;

pub use cover_linker::link_covers;
pub use file_scanner::{AssetKind, AssetScanner, ScanError, ScannedAsset};
pub use geo_resolver::{GeoResolver, GeoTable, Locality};
pub use manifest_builder::{write_manifest, ManifestBuilder};
pub use merge_store::{merge_documents, CacheStore, FetchError, RefreshOutcome};
pub use metadata_extractor::{CaptureTimeSource, ExifCaptureTime, MetadataError};
pub use temporal_resolver::TemporalResolver;
