//! PhotoPlus (`pics_array`) photo lists

use super::{absolute_url, field_str, first_timestamp, url_tail, VendorSchema};
use crate::types::PhotoStub;
use serde_json::Value;

pub struct PhotoPlusSchema;

impl PhotoPlusSchema {
    /// On-disk name: `pic_name` with spaces replaced, else the origin image
    /// tail before its `~` processing suffix, re-labelled as JPEG.
    fn file_name(entry: &Value) -> Option<String> {
        if let Some(name) = field_str(entry, &["pic_name"]) {
            return Some(name.replace(' ', "_"));
        }
        let origin = field_str(entry, &["origin_img"])?;
        let base = origin.split('~').next().unwrap_or(&origin);
        let tail = url_tail(base)?;
        Some(tail.replace(".heic", ".JPG").replace(' ', "_"))
    }
}

impl VendorSchema for PhotoPlusSchema {
    fn identity(&self, entry: &Value) -> Option<String> {
        field_str(entry, &["id"])
    }

    fn normalize_entry(&self, entry: &Value, out: &mut Vec<PhotoStub>) {
        let Some(filename) = Self::file_name(entry) else {
            return;
        };
        let mut stub = PhotoStub::new(self.stub_identity(entry, &filename), filename);
        stub.url = field_str(entry, &["origin_img"]).map(|url| absolute_url(&url));
        stub.timestamp = first_timestamp(entry, &["exif_timestamp", "shoot_time"]);
        out.push(stub);
    }
}
