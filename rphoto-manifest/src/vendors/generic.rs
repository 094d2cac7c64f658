//! Generic `{url, id}` photo lists
//!
//! Written by the catch-all downloader for vendors without a dedicated
//! adapter. Entries name their image by `url`, `image_url` or `src`.

use super::{field_str, gps_pair, url_file_name, VendorSchema};
use crate::types::PhotoStub;
use serde_json::Value;

const URL_KEYS: &[&str] = &["url", "image_url", "src"];

pub struct GenericSchema;

impl VendorSchema for GenericSchema {
    fn identity(&self, entry: &Value) -> Option<String> {
        field_str(entry, &["id", "photo_id", "identifier"])
    }

    fn normalize_entry(&self, entry: &Value, out: &mut Vec<PhotoStub>) {
        let Some(url) = field_str(entry, URL_KEYS) else {
            return;
        };
        let filename = url_file_name(&url, self.identity(entry).as_deref());

        let (lat, lon) = gps_pair(entry, "lat", "lon");
        let mut stub = PhotoStub::new(self.stub_identity(entry, &filename), filename);
        stub.url = Some(url);
        stub.lat = lat;
        stub.lon = lon;
        out.push(stub);
    }
}
