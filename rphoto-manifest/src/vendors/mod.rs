//! Vendor Schema Adapters
//!
//! Every photo vendor persists its raw API response in its own JSON shape.
//! This module recognizes the closed set of known shapes by structural
//! signature and hands each one to the matching [`VendorSchema`], which
//! normalizes records into [`PhotoStub`]s.
//!
//! # Detection
//! Keyed signatures (an array at a fixed key path) are tried first, in
//! declaration order. Bare arrays are classified by the fields of their
//! first element. Anything else has no signature and normalizes to an empty
//! stub list, which downstream treats as "no metadata available".
//!
//! # Layouts
//! A [`Detected`] shape remembers where its entry array lives, so the merge
//! store can swap in a merged array while keeping every sibling key of the
//! vendor document.

pub mod generic;
pub mod ihuipao;
pub mod pailixiang;
pub mod photoplus;
pub mod runff;
pub mod runnerbar;
pub mod yipai360;

use crate::types::{CoverLinks, PhotoStub, StubIdentity};
use md5::{Digest, Md5};
use rphoto_common::time::normalize_timestamp;
use serde_json::Value;
use std::fmt;

/// Known photo vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    RunnerBar,
    PhotoPlus,
    Pailixiang,
    Yipai360,
    RunFF,
    IHuiPao,
    /// `{url, id}`-style lists written by the generic downloader
    Generic,
}

impl Vendor {
    /// Schema implementation for this vendor
    pub fn schema(self) -> &'static dyn VendorSchema {
        match self {
            Vendor::RunnerBar => &runnerbar::RunnerBarSchema,
            Vendor::PhotoPlus => &photoplus::PhotoPlusSchema,
            Vendor::Pailixiang => &pailixiang::PailixiangSchema,
            Vendor::Yipai360 => &yipai360::Yipai360Schema,
            Vendor::RunFF => &runff::RunFFSchema,
            Vendor::IHuiPao => &ihuipao::IHuiPaoSchema,
            Vendor::Generic => &generic::GenericSchema,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Vendor::RunnerBar => "runnerbar",
            Vendor::PhotoPlus => "photoplus",
            Vendor::Pailixiang => "pailixiang",
            Vendor::Yipai360 => "yipai360",
            Vendor::RunFF => "runff",
            Vendor::IHuiPao => "ihuipao",
            Vendor::Generic => "generic",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared normalize capability implemented once per vendor
pub trait VendorSchema: Sync {
    /// Explicit vendor identity of a raw record
    fn identity(&self, entry: &Value) -> Option<String>;

    /// Fallback key for records without an explicit identity
    fn derived_key(&self, _entry: &Value) -> Option<String> {
        None
    }

    /// Append the stubs described by one raw record. Records that name no
    /// file append nothing.
    fn normalize_entry(&self, entry: &Value, out: &mut Vec<PhotoStub>);

    /// Identity for a stub built from `entry`
    fn stub_identity(&self, entry: &Value, filename: &str) -> StubIdentity {
        match self.identity(entry) {
            Some(id) => StubIdentity::Vendor(id),
            None => StubIdentity::Derived(
                self.derived_key(entry)
                    .unwrap_or_else(|| filename.to_string()),
            ),
        }
    }
}

// ============================================================================
// Detection
// ============================================================================

/// Keyed signatures, tried in order
const KEYED_SIGNATURES: &[(&[&str], Vendor)] = &[
    (&["result", "topicInfoList"], Vendor::RunnerBar),
    (&["topicInfoList"], Vendor::RunnerBar),
    (&["result", "pics_array"], Vendor::PhotoPlus),
    (&["pics_array"], Vendor::PhotoPlus),
    (&["Data"], Vendor::Pailixiang),
    (&["photos"], Vendor::Generic),
    (&["items"], Vendor::Generic),
    (&["data", "images"], Vendor::Generic),
    (&["data", "photos"], Vendor::Generic),
];

/// First-element field signatures for bare lists, tried in order
const ENTRY_SIGNATURES: &[(&str, Vendor)] = &[
    ("url_hq", Vendor::RunnerBar),
    ("big", Vendor::RunFF),
    ("shoot_at", Vendor::IHuiPao),
    ("etag", Vendor::Yipai360),
    ("pic_name", Vendor::PhotoPlus),
    ("origin_img", Vendor::PhotoPlus),
    ("ShootTime", Vendor::Pailixiang),
    ("url", Vendor::Generic),
    ("image_url", Vendor::Generic),
    ("src", Vendor::Generic),
];

const BARE: &[&str] = &[];

/// A recognized vendor document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detected {
    pub vendor: Vendor,
    /// Key path to the entry array; empty for a bare list
    pub path: &'static [&'static str],
}

impl Detected {
    pub fn schema(&self) -> &'static dyn VendorSchema {
        self.vendor.schema()
    }

    /// Raw entries of `doc` under this layout
    pub fn entries<'a>(&self, doc: &'a Value) -> &'a [Value] {
        lookup(doc, self.path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Copy of `doc` with its entry array replaced by `entries`
    pub fn rewrap(&self, doc: &Value, entries: Vec<Value>) -> Value {
        let mut out = doc.clone();
        let mut slot = &mut out;
        for key in self.path {
            match slot.get_mut(*key) {
                Some(next) => slot = next,
                None => return Value::Array(entries),
            }
        }
        *slot = Value::Array(entries);
        out
    }
}

/// Recognize a vendor document by structural signature
pub fn detect(doc: &Value) -> Option<Detected> {
    for (path, vendor) in KEYED_SIGNATURES {
        if let Some(list) = lookup(doc, path).and_then(Value::as_array) {
            let vendor = match (vendor, list.first()) {
                (Vendor::Generic, Some(first)) if first.get("etag").is_some() => Vendor::Yipai360,
                (vendor, _) => *vendor,
            };
            return Some(Detected {
                vendor,
                path: *path,
            });
        }
    }

    let first = doc.as_array()?.first()?;
    ENTRY_SIGNATURES
        .iter()
        .find(|(field, _)| first.get(*field).is_some())
        .map(|(_, vendor)| Detected {
            vendor: *vendor,
            path: BARE,
        })
}

fn lookup<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(doc, |node, key| node.get(*key))
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalized stub list for one vendor document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedPhotos {
    /// `None` when the document had no known signature
    pub vendor: Option<Vendor>,
    pub stubs: Vec<PhotoStub>,
}

impl NormalizedPhotos {
    pub fn cover_links(&self) -> CoverLinks {
        CoverLinks::from_stubs(&self.stubs)
    }
}

/// Normalize any vendor document. Never fails: unknown shapes yield an
/// empty list.
pub fn normalize(doc: &Value) -> NormalizedPhotos {
    let Some(shape) = detect(doc) else {
        return NormalizedPhotos::default();
    };

    let schema = shape.schema();
    let mut stubs = Vec::new();
    for entry in shape.entries(doc) {
        if !entry.is_object() {
            continue;
        }
        schema.normalize_entry(entry, &mut stubs);
    }
    stubs.retain(|stub| !stub.filename.is_empty());

    tracing::debug!(vendor = %shape.vendor, stubs = stubs.len(), "Normalized vendor photo list");

    NormalizedPhotos {
        vendor: Some(shape.vendor),
        stubs,
    }
}

// ============================================================================
// Field helpers shared by the vendor schemas
// ============================================================================

/// First non-empty string or number among `keys`, as a string
pub(crate) fn field_str(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match entry.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Finite, non-zero coordinate from a number or numeric string
pub(crate) fn field_f64(entry: &Value, key: &str) -> Option<f64> {
    let value = match entry.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (value.is_finite() && value != 0.0).then_some(value)
}

/// GPS pair; both coordinates or neither
pub(crate) fn gps_pair(entry: &Value, lat_key: &str, lon_key: &str) -> (Option<f64>, Option<f64>) {
    match (field_f64(entry, lat_key), field_f64(entry, lon_key)) {
        (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
        _ => (None, None),
    }
}

/// First normalizable timestamp among `keys`.
///
/// Values wrapped as `{"val": ...}` (image-CDN EXIF dumps) are unwrapped.
pub(crate) fn first_timestamp(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let value = entry.get(*key)?;
        let value = value.get("val").unwrap_or(value);
        normalize_timestamp(value)
    })
}

/// Last path segment of a URL, without query or fragment
pub(crate) fn url_tail(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let tail = path.rsplit('/').next()?.trim();
    (!tail.is_empty()).then(|| tail.to_string())
}

/// On-disk name the downloaders gave a URL's file.
///
/// The URL tail when it carries an extension, else `<id>.jpg`, else
/// `photo_<md5(url)[..10]>.jpg`.
pub(crate) fn url_file_name(url: &str, id: Option<&str>) -> String {
    if let Some(tail) = url_tail(url).filter(|tail| tail.contains('.')) {
        return tail;
    }
    match id {
        Some(id) => format!("{id}.jpg"),
        None => {
            let digest = format!("{:x}", Md5::digest(url.as_bytes()));
            format!("photo_{}.jpg", &digest[..10])
        }
    }
}

/// Protocol-relative URLs (`//host/...`) are promoted to https
pub(crate) fn absolute_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_keyed_shapes() {
        let cases = [
            (json!({"result": {"topicInfoList": []}}), Vendor::RunnerBar),
            (json!({"topicInfoList": []}), Vendor::RunnerBar),
            (json!({"pics_array": []}), Vendor::PhotoPlus),
            (json!({"success": true, "result": {"pics_array": []}}), Vendor::PhotoPlus),
            (json!({"Code": 1, "Data": []}), Vendor::Pailixiang),
            (json!({"photos": [{"etag": "Fh1", "id": 1}]}), Vendor::Yipai360),
            (json!({"photos": [{"url": "https://x/a.jpg"}]}), Vendor::Generic),
            (json!({"data": {"images": []}}), Vendor::Generic),
        ];
        for (doc, vendor) in cases {
            assert_eq!(detect(&doc).map(|d| d.vendor), Some(vendor), "doc: {doc}");
        }
    }

    #[test]
    fn test_detect_bare_lists_by_first_element() {
        assert_eq!(detect(&json!([{"big": "/a/b.jpg"}])).unwrap().vendor, Vendor::RunFF);
        assert_eq!(
            detect(&json!([{"shoot_at": "2024-03-10 08:00:00"}])).unwrap().vendor,
            Vendor::IHuiPao
        );
        assert_eq!(detect(&json!([{"url_hq": "https://x/a.jpg"}])).unwrap().vendor, Vendor::RunnerBar);
        assert_eq!(detect(&json!([{"etag": "Fh1"}])).unwrap().vendor, Vendor::Yipai360);
    }

    #[test]
    fn test_unknown_shapes_normalize_to_empty() {
        for doc in [
            json!({}),
            json!({"foo": [1, 2]}),
            json!([]),
            json!([{"unknown": 1}]),
            json!("string"),
            json!(null),
            json!({"topicInfoList": "not a list"}),
        ] {
            let normalized = normalize(&doc);
            assert!(normalized.vendor.is_none(), "doc: {doc}");
            assert!(normalized.stubs.is_empty());
        }
    }

    #[test]
    fn test_every_known_shape_yields_non_empty_file_names() {
        let docs = [
            json!({"result": {"topicInfoList": [{"photoId": 1, "url_hq": "https://cdn/r/1.jpg"}]}}),
            json!({"pics_array": [{"id": 7, "pic_name": "DSC 001.JPG"}]}),
            json!({"Data": [{"Name": "IMG_1.jpg", "ShootTime": "2024-03-10 08:00:00"}]}),
            json!({"photos": [{"id": 3, "etag": "Fh3"}]}),
            json!([{"id": 9, "big": "/photo/big/9.jpg", "ts": 1710028800}]),
            json!([{"id": 5, "shoot_at": "2024-03-10 08:15:00", "origin": "//obs/x/5.jpg"}]),
            json!({"items": [{"image_url": "https://x/y/z.png", "photo_id": "p1"}]}),
        ];
        for doc in docs {
            let normalized = normalize(&doc);
            assert!(!normalized.stubs.is_empty(), "doc: {doc}");
            assert!(normalized.stubs.iter().all(|s| !s.filename.is_empty()));
        }
    }

    #[test]
    fn test_rewrap_keeps_sibling_keys() {
        let doc = json!({"bib": "A1", "orderId": "9", "photos": [{"id": 1}]});
        let shape = detect(&doc).unwrap();
        let out = shape.rewrap(&doc, vec![json!({"id": 1}), json!({"id": 2})]);
        assert_eq!(out["bib"], "A1");
        assert_eq!(out["photos"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_rewrap_nested_and_bare() {
        let nested = json!({"result": {"topicInfoList": [], "total": 0}});
        let shape = detect(&json!({"result": {"topicInfoList": [{"url_hq": "a"}]}})).unwrap();
        let out = shape.rewrap(&nested, vec![json!({"url_hq": "a"})]);
        assert_eq!(out["result"]["total"], 0);
        assert_eq!(out["result"]["topicInfoList"][0]["url_hq"], "a");

        let bare = json!([{"big": "/a.jpg"}]);
        let shape = detect(&bare).unwrap();
        assert_eq!(shape.rewrap(&bare, vec![]), json!([]));
    }

    #[test]
    fn test_field_helpers() {
        let entry = json!({"a": " ", "b": 12, "lat": "31.3", "lon": 0, "u": "https://h/p/x.jpg?sig=1"});
        assert_eq!(field_str(&entry, &["a", "b"]).as_deref(), Some("12"));
        assert_eq!(field_f64(&entry, "lat"), Some(31.3));
        assert_eq!(field_f64(&entry, "lon"), None);
        assert_eq!(gps_pair(&entry, "lat", "lon"), (None, None));
        assert_eq!(url_tail("https://h/p/x.jpg?sig=1").as_deref(), Some("x.jpg"));
        assert_eq!(url_tail("https://h/p/"), None);
        assert_eq!(absolute_url("//h/x.jpg"), "https://h/x.jpg");
    }

    #[test]
    fn test_url_file_name_matches_downloader_naming() {
        assert_eq!(url_file_name("https://h/p/IMG_1.JPG?w=1", Some("7")), "IMG_1.JPG");
        assert_eq!(url_file_name("https://h/p/abcdef", Some("42")), "42.jpg");
        assert_eq!(url_file_name("https://h/p/abcdef", None), "photo_dcc1827bfc.jpg");
    }
}
