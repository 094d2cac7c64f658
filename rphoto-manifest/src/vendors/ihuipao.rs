//! iHuiPao photo lists
//!
//! The downloader prefixes each origin file name with the compacted shoot
//! time (`20240310_081500_<name>`) so files sort chronologically.

use super::{absolute_url, field_str, first_timestamp, url_tail, VendorSchema};
use crate::types::PhotoStub;
use serde_json::Value;

pub struct IHuiPaoSchema;

impl IHuiPaoSchema {
    fn file_name(entry: &Value, origin: &str) -> Option<String> {
        let tail = url_tail(origin)?;
        match field_str(entry, &["shoot_at"]) {
            Some(shoot_at) => Some(format!("{}_{tail}", compact_shoot_time(&shoot_at))),
            None => Some(tail),
        }
    }
}

/// `2024-03-10 08:15:00` → `20240310_081500`
fn compact_shoot_time(shoot_at: &str) -> String {
    shoot_at.replace('-', "").replace(' ', "_").replace(':', "")
}

impl VendorSchema for IHuiPaoSchema {
    fn identity(&self, entry: &Value) -> Option<String> {
        field_str(entry, &["id"])
    }

    fn normalize_entry(&self, entry: &Value, out: &mut Vec<PhotoStub>) {
        let Some(origin) = field_str(entry, &["origin", "url"]) else {
            return;
        };
        let Some(filename) = Self::file_name(entry, &origin) else {
            return;
        };

        let mut stub = PhotoStub::new(self.stub_identity(entry, &filename), filename);
        stub.url = Some(absolute_url(&origin));
        stub.timestamp = first_timestamp(entry, &["shoot_at"]);
        out.push(stub);
    }
}
