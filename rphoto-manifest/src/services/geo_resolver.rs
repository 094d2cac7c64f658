//! Geolocation Resolver
//!
//! Closed, offline lookup over hand-curated tables:
//! 1. GPS point → first bounding box containing it (table order)
//! 2. Place string → verbatim place-name table entry
//! 3. Otherwise empty
//!
//! Unknown points and places resolve to an empty [`Locality`], which is a
//! valid outcome and never an error.
//!
//! The built-in tables can be replaced section by section from the `[geo]`
//! table of `rphoto.toml` (`[[geo.boxes]]`, `[geo.places]`,
//! `[geo.city_centers]`).

use rphoto_common::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

/// City / province / country triple; all empty when unresolved
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Locality {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub country: String,
}

impl Locality {
    pub fn new(city: &str, province: &str, country: &str) -> Self {
        Self {
            city: city.to_string(),
            province: province.to_string(),
            country: country.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.city.is_empty() && self.province.is_empty() && self.country.is_empty()
    }
}

/// Inclusive lat/lon bounding box mapped to a locality
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub country: String,
}

impl GeoBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat) && (self.lon_min..=self.lon_max).contains(&lon)
    }

    fn locality(&self) -> Locality {
        Locality::new(&self.city, &self.province, &self.country)
    }
}

/// Static center coordinate of a city
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CityCenter {
    pub lat: f64,
    pub lon: f64,
}

/// Lookup tables used by [`GeoResolver`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoTable {
    /// Tried in order; the first containing box wins
    pub boxes: Vec<GeoBox>,
    pub places: BTreeMap<String, Locality>,
    pub city_centers: BTreeMap<String, CityCenter>,
}

/// `[geo]` config table; each present section replaces the built-in one
#[derive(Debug, Default, Deserialize)]
struct GeoTableConfig {
    boxes: Option<Vec<GeoBox>>,
    places: Option<BTreeMap<String, Locality>>,
    city_centers: Option<BTreeMap<String, CityCenter>>,
}

const CHINA: &str = "中国";

/// (lat_min, lat_max, lon_min, lon_max, city, province)
const BUILTIN_BOXES: &[(f64, f64, f64, f64, &str, &str)] = &[
    (31.40, 31.75, 120.05, 120.50, "无锡", "江苏"),
    (31.05, 31.55, 120.45, 121.00, "苏州", "江苏"),
    (30.70, 31.90, 121.00, 122.00, "上海", "上海"),
    (29.90, 30.55, 119.70, 120.55, "杭州", "浙江"),
    (31.70, 32.35, 118.50, 119.10, "南京", "江苏"),
    (31.55, 32.05, 119.60, 120.05, "常州", "江苏"),
    (39.70, 40.20, 116.10, 116.75, "北京", "北京"),
    (24.40, 24.60, 117.95, 118.25, "厦门", "福建"),
];

/// (place string, city, province)
const BUILTIN_PLACES: &[(&str, &str, &str)] = &[
    ("江苏苏州", "苏州", "江苏"),
    ("苏州", "苏州", "江苏"),
    ("江苏无锡", "无锡", "江苏"),
    ("无锡", "无锡", "江苏"),
    ("上海", "上海", "上海"),
    ("浙江杭州", "杭州", "浙江"),
    ("杭州", "杭州", "浙江"),
    ("江苏南京", "南京", "江苏"),
    ("南京", "南京", "江苏"),
    ("江苏常州", "常州", "江苏"),
    ("常州", "常州", "江苏"),
    ("北京", "北京", "北京"),
    ("福建厦门", "厦门", "福建"),
    ("厦门", "厦门", "福建"),
];

const BUILTIN_CENTERS: &[(&str, f64, f64)] = &[
    ("苏州", 31.2990, 120.5853),
    ("无锡", 31.4912, 120.3119),
    ("上海", 31.2304, 121.4737),
    ("杭州", 30.2741, 120.1551),
    ("南京", 32.0603, 118.7969),
    ("常州", 31.8107, 119.9741),
    ("北京", 39.9042, 116.4074),
    ("厦门", 24.4798, 118.0894),
];

impl GeoTable {
    /// Built-in tables
    pub fn builtin() -> Self {
        let boxes = BUILTIN_BOXES
            .iter()
            .map(|&(lat_min, lat_max, lon_min, lon_max, city, province)| GeoBox {
                lat_min,
                lat_max,
                lon_min,
                lon_max,
                city: city.to_string(),
                province: province.to_string(),
                country: CHINA.to_string(),
            })
            .collect();
        let places = BUILTIN_PLACES
            .iter()
            .map(|&(place, city, province)| (place.to_string(), Locality::new(city, province, CHINA)))
            .collect();
        let city_centers = BUILTIN_CENTERS
            .iter()
            .map(|&(city, lat, lon)| (city.to_string(), CityCenter { lat, lon }))
            .collect();

        Self {
            boxes,
            places,
            city_centers,
        }
    }

    /// Built-in tables with the sections present in the `[geo]` config table
    /// replaced
    pub fn from_config(geo: Option<&toml::Value>) -> Result<Self> {
        let mut table = Self::builtin();
        let Some(geo) = geo else {
            return Ok(table);
        };

        let config: GeoTableConfig = geo
            .clone()
            .try_into()
            .map_err(|e| Error::Config(format!("Invalid [geo] table: {}", e)))?;

        if let Some(boxes) = config.boxes {
            table.boxes = boxes;
        }
        if let Some(places) = config.places {
            table.places = places;
        }
        if let Some(city_centers) = config.city_centers {
            table.city_centers = city_centers;
        }

        tracing::debug!(
            boxes = table.boxes.len(),
            places = table.places.len(),
            centers = table.city_centers.len(),
            "Loaded geolocation tables"
        );

        Ok(table)
    }
}

/// Resolves localities over a [`GeoTable`]
pub struct GeoResolver<'a> {
    table: &'a GeoTable,
}

impl<'a> GeoResolver<'a> {
    pub fn new(table: &'a GeoTable) -> Self {
        Self { table }
    }

    /// GPS first, then place string, else empty
    pub fn resolve(&self, gps: Option<(f64, f64)>, place: Option<&str>) -> Locality {
        gps.and_then(|(lat, lon)| self.locate(lat, lon))
            .or_else(|| place.and_then(|p| self.lookup_place(p)))
            .unwrap_or_default()
    }

    /// First box containing the point
    pub fn locate(&self, lat: f64, lon: f64) -> Option<Locality> {
        self.table
            .boxes
            .iter()
            .find(|b| b.contains(lat, lon))
            .map(GeoBox::locality)
    }

    /// Verbatim place-name lookup
    pub fn lookup_place(&self, place: &str) -> Option<Locality> {
        self.table.places.get(place).cloned()
    }

    pub fn city_center(&self, city: &str) -> Option<CityCenter> {
        self.table.city_centers.get(city).copied()
    }
}
