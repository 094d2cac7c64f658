//! RunFF photo lists: bare arrays of `{id, big, ts}` records

use super::{field_str, first_timestamp, url_tail, VendorSchema};
use crate::types::PhotoStub;
use serde_json::Value;

const CDN_BASE: &str = "https://www.runff.com";

pub struct RunFFSchema;

impl VendorSchema for RunFFSchema {
    fn identity(&self, entry: &Value) -> Option<String> {
        field_str(entry, &["id", "pid"])
    }

    fn normalize_entry(&self, entry: &Value, out: &mut Vec<PhotoStub>) {
        let Some(big) = field_str(entry, &["big"]) else {
            return;
        };
        let Some(filename) = url_tail(&big) else {
            return;
        };

        let mut stub = PhotoStub::new(self.stub_identity(entry, &filename), filename);
        stub.url = Some(if big.starts_with('/') {
            format!("{CDN_BASE}{big}")
        } else {
            big
        });
        stub.timestamp = first_timestamp(entry, &["ts", "time"]);
        out.push(stub);
    }
}
