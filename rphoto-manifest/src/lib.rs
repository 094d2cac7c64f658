//! rphoto-manifest library interface
//!
//! Turns a tree of downloaded race photos (`<base>/<race>/<source>/`) plus
//! the raw vendor JSON cached next to them into the `manifest.json` read by
//! the static gallery.
//!
//! Exposes public APIs for integration testing.

pub mod services;
pub mod types;
pub mod vendors;

use rphoto_common::config::Settings;
use rphoto_common::Result;
use services::{write_manifest, ManifestBuilder};
use types::Manifest;

/// Synthesize the manifest for `settings` and write it to `settings.output`
pub fn generate_manifest(settings: &Settings) -> Result<Manifest> {
    tracing::info!(base_dir = %settings.base_dir.display(), "Scanning asset tree");
    let manifest = ManifestBuilder::from_settings(settings)?.build();
    write_manifest(&settings.output, &manifest)?;
    Ok(manifest)
}
