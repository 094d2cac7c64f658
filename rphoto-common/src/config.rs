//! Configuration loading and directory resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments
//! 2. TOML configuration file (`--config PATH`, `./rphoto.toml`, or
//!    `<config dir>/rphoto/config.toml`)
//! 3. Built-in defaults (code constants)
//!
//! A missing TOML file never prevents startup. An explicitly requested file
//! that cannot be read or parsed is a configuration error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default asset tree root, relative to the working directory
pub const DEFAULT_BASE_DIR: &str = "docs/images";

/// Default manifest file name inside the base directory
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Default route directory name inside the site root
pub const ROUTES_DIR_NAME: &str = "routes";

/// Local config file read before the platform config directory
pub const LOCAL_CONFIG_FILE: &str = "rphoto.toml";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Asset tree root (`<base>/<race>/<source>/...`)
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// Directory that asset URLs are made relative to
    ///
    /// Defaults to the parent of `base_dir`.
    #[serde(default)]
    pub site_root: Option<PathBuf>,

    /// Directory holding `<race name>.gpx` route files
    #[serde(default)]
    pub routes_dir: Option<PathBuf>,

    /// Manifest output path
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Replacement geolocation tables (optional, shape owned by the resolver)
    #[serde(default)]
    pub geo: Option<toml::Value>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Result of configuration discovery
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Parsed (or default) configuration
    pub config: TomlConfig,
    /// File the configuration came from, if any
    pub source: Option<PathBuf>,
    /// Problems with implicitly discovered files, reported once logging is up
    pub warnings: Vec<String>,
}

/// Load the TOML configuration.
///
/// With `explicit` set, that file must exist and parse. Otherwise the local
/// file and the platform config file are tried in order; a malformed
/// implicit file is skipped with a warning.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = read_toml_file(path)?;
        return Ok(LoadedConfig {
            config,
            source: Some(path.to_path_buf()),
            warnings: Vec::new(),
        });
    }

    let mut warnings = Vec::new();
    for candidate in implicit_config_candidates() {
        if !candidate.is_file() {
            continue;
        }
        match read_toml_file(&candidate) {
            Ok(config) => {
                return Ok(LoadedConfig {
                    config,
                    source: Some(candidate),
                    warnings,
                })
            }
            Err(e) => warnings.push(format!("Ignoring {}: {}", candidate.display(), e)),
        }
    }

    Ok(LoadedConfig {
        config: TomlConfig::default(),
        source: None,
        warnings,
    })
}

fn implicit_config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("rphoto").join("config.toml"));
    }
    candidates
}

fn read_toml_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_dir: Option<PathBuf>,
}

/// Fully resolved settings for one pipeline run
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_dir: PathBuf,
    pub site_root: PathBuf,
    pub routes_dir: PathBuf,
    pub output: PathBuf,
    pub log_level: String,
    pub geo: Option<toml::Value>,
}

impl Settings {
    /// Combine TOML values and CLI overrides with built-in defaults.
    pub fn resolve(config: TomlConfig, overrides: ConfigOverrides) -> Self {
        let base_dir = overrides
            .base_dir
            .or(config.base_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_DIR));

        let site_root = config
            .site_root
            .unwrap_or_else(|| base_dir.parent().map(Path::to_path_buf).unwrap_or_default());

        let routes_dir = config
            .routes_dir
            .unwrap_or_else(|| site_root.join(ROUTES_DIR_NAME));

        let output = config
            .output
            .unwrap_or_else(|| base_dir.join(MANIFEST_FILE_NAME));

        Self {
            base_dir,
            site_root,
            routes_dir,
            output,
            log_level: config.logging.level,
            geo: config.geo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        assert_eq!(LoggingConfig::default().level, "info");
    }

    #[test]
    fn test_defaults_follow_docs_layout() {
        let settings = Settings::resolve(TomlConfig::default(), ConfigOverrides::default());
        assert_eq!(settings.base_dir, PathBuf::from("docs/images"));
        assert_eq!(settings.site_root, PathBuf::from("docs"));
        assert_eq!(settings.routes_dir, PathBuf::from("docs/routes"));
        assert_eq!(settings.output, PathBuf::from("docs/images/manifest.json"));
    }

    #[test]
    fn test_cli_beats_toml() {
        let config = TomlConfig {
            base_dir: Some(PathBuf::from("from_toml/images")),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            base_dir: Some(PathBuf::from("cli/images")),
        };
        let settings = Settings::resolve(config, overrides);
        assert_eq!(settings.base_dir, PathBuf::from("cli/images"));
        assert_eq!(settings.site_root, PathBuf::from("cli"));
    }

    #[test]
    fn test_bare_base_dir_has_empty_site_root() {
        let overrides = ConfigOverrides {
            base_dir: Some(PathBuf::from("images")),
        };
        let settings = Settings::resolve(TomlConfig::default(), overrides);
        assert_eq!(settings.site_root, PathBuf::new());
        assert_eq!(settings.routes_dir, PathBuf::from("routes"));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: TomlConfig = toml::from_str("base_dir = \"site/images\"").unwrap();
        assert_eq!(config.base_dir, Some(PathBuf::from("site/images")));
        assert_eq!(config.logging.level, "info");
        assert!(config.geo.is_none());
    }
}
