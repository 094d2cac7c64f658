//! Race-level date and location
//!
//! A race's date and locality come from the first source, in directory
//! order, whose `race_info.json` supplies a parseable value. Location uses
//! the first GPS point found in the race's photo stubs, falling back to the
//! race_info place string. When no source names a date, the earliest photo
//! capture date is used.

use super::geo_resolver::{GeoResolver, Locality};
use super::merge_store::RACE_INFO_FILE;
use crate::types::PhotoStub;
use rphoto_common::fs::read_json_opt;
use rphoto_common::time::{date_of, normalize_date};
use serde_json::Value;
use std::path::Path;

/// Date fields, in priority order
const DATE_PATHS: &[&[&str]] = &[
    &["activity", "start_time"],
    &["date"],
    &["data", "date"],
    &["cutdown"],
    &["data", "cutdown"],
    &["start_date_local"],
];

/// Place-string fields, in priority order
const PLACE_PATHS: &[&[&str]] = &[
    &["place"],
    &["data", "place"],
    &["activity", "city"],
    &["city"],
    &["address"],
];

/// Date and place carried by one `race_info.json`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaceHints {
    pub date: Option<String>,
    pub place: Option<String>,
}

impl RaceHints {
    pub fn from_info(info: &Value) -> Self {
        let date = DATE_PATHS
            .iter()
            .filter_map(|path| lookup(info, path))
            .find_map(normalize_date);
        let place = PLACE_PATHS
            .iter()
            .filter_map(|path| lookup(info, path))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string);
        Self { date, place }
    }
}

fn lookup<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(doc, |node, key| node.get(*key))
}

/// Read a source's `race_info.json`; missing or malformed files yield `None`
pub fn load_race_info(source_dir: &Path) -> Option<Value> {
    let path = source_dir.join(RACE_INFO_FILE);
    match read_json_opt(&path) {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable race info");
            None
        }
    }
}

/// Accumulates race-level facts across sources; first value wins
#[derive(Debug, Clone, Default)]
pub struct RaceFacts {
    date: Option<String>,
    place: Option<String>,
    gps: Option<(f64, f64)>,
    earliest_capture: Option<String>,
}

impl RaceFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb_info(&mut self, info: &Value) {
        let hints = RaceHints::from_info(info);
        if self.date.is_none() {
            self.date = hints.date;
        }
        if self.place.is_none() {
            self.place = hints.place;
        }
    }

    pub fn absorb_stubs(&mut self, stubs: &[PhotoStub]) {
        if self.gps.is_none() {
            self.gps = stubs.iter().find_map(PhotoStub::gps);
        }
    }

    /// Track the earliest canonical capture time seen
    pub fn observe_capture(&mut self, timestamp: &str) {
        if date_of(timestamp).is_none() {
            return;
        }
        match &self.earliest_capture {
            Some(current) if current.as_str() <= timestamp => {}
            _ => self.earliest_capture = Some(timestamp.to_string()),
        }
    }

    /// `YYYY-MM-DD`, or empty when unknown
    pub fn date(&self) -> String {
        self.date
            .clone()
            .or_else(|| self.earliest_capture.as_deref().and_then(date_of))
            .unwrap_or_default()
    }

    pub fn locality(&self, resolver: &GeoResolver<'_>) -> Locality {
        resolver.resolve(self.gps, self.place.as_deref())
    }
}
