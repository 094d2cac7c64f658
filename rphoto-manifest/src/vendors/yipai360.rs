//! Yipai360 photo lists
//!
//! Records are keyed by a content `etag`; the CDN serves the image at
//! `<cdn>/<etag>`.

use super::{field_str, first_timestamp, VendorSchema};
use crate::types::PhotoStub;
use serde_json::Value;

const CDN_URL: &str = "https://c360-o2o.yipai360.com";

pub struct Yipai360Schema;

impl VendorSchema for Yipai360Schema {
    fn identity(&self, entry: &Value) -> Option<String> {
        field_str(entry, &["id"])
    }

    fn derived_key(&self, entry: &Value) -> Option<String> {
        field_str(entry, &["etag"])
    }

    fn normalize_entry(&self, entry: &Value, out: &mut Vec<PhotoStub>) {
        let etag = field_str(entry, &["etag"]);
        let Some(filename) = field_str(entry, &["fname"])
            .or_else(|| etag.as_ref().map(|etag| format!("{etag}.jpg")))
        else {
            return;
        };

        let mut stub = PhotoStub::new(self.stub_identity(entry, &filename), filename);
        stub.url = etag.map(|etag| format!("{CDN_URL}/{etag}"));
        stub.timestamp = first_timestamp(entry, &["shootTime", "shoot_time"]);
        out.push(stub);
    }
}
