//! GPX route lookup
//!
//! A race may have a route file `<routes_dir>/<race name>.gpx`. Its first
//! track point becomes the race's map coordinate. An unparseable route is
//! still published; only the coordinate falls back.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

static TRKPT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<trkpt\b([^>]*)>").expect("trkpt regex should compile")
});
static COORD_ATTR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(lat|lon)\s*=\s*["']([-+0-9.eE]+)["']"#)
        .expect("coordinate attribute regex should compile")
});

/// First `<trkpt lat lon>` of a GPX document
pub fn first_trackpoint(gpx: &str) -> Option<(f64, f64)> {
    let attrs = TRKPT_PATTERN.captures(gpx)?.get(1)?.as_str();

    let mut lat = None;
    let mut lon = None;
    for cap in COORD_ATTR_PATTERN.captures_iter(attrs) {
        let value: f64 = cap[2].parse().ok()?;
        match &cap[1] {
            "lat" => lat = Some(value),
            _ => lon = Some(value),
        }
    }
    Some((lat?, lon?))
}

/// A race's published route
#[derive(Debug, Clone, PartialEq)]
pub struct RouteInfo {
    /// Site-relative route URL
    pub url: String,
    /// First track point, when the file parsed
    pub start: Option<(f64, f64)>,
}

/// Route files of one site
pub struct RouteIndex {
    routes_dir: PathBuf,
    url_prefix: String,
}

impl RouteIndex {
    /// `url_prefix` is the site-relative path of `routes_dir`
    pub fn new(routes_dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            routes_dir: routes_dir.into(),
            url_prefix: url_prefix.into(),
        }
    }

    /// Route of the race named `race`, if its GPX file exists
    pub fn lookup(&self, race: &str) -> Option<RouteInfo> {
        let file_name = format!("{race}.gpx");
        let path = self.routes_dir.join(&file_name);
        if !path.is_file() {
            return None;
        }

        let start = match std::fs::read_to_string(&path) {
            Ok(gpx) => first_trackpoint(&gpx),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read route");
                None
            }
        };
        if start.is_none() {
            tracing::warn!(path = %path.display(), "Route has no usable track point");
        }

        let url = if self.url_prefix.is_empty() {
            file_name
        } else {
            format!("{}/{}", self.url_prefix, file_name)
        };
        Some(RouteInfo { url, start })
    }
}
