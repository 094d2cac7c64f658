//! Pailixiang (`Data`) photo lists

use super::{field_str, first_timestamp, VendorSchema};
use crate::types::PhotoStub;
use serde_json::Value;

pub struct PailixiangSchema;

impl VendorSchema for PailixiangSchema {
    fn identity(&self, entry: &Value) -> Option<String> {
        field_str(entry, &["Id", "ID", "PhotoId"])
    }

    fn normalize_entry(&self, entry: &Value, out: &mut Vec<PhotoStub>) {
        // Unnamed photos were saved by list position, which shifts once lists
        // are merged, so they never join an asset
        let Some(filename) = field_str(entry, &["Name", "FileName"]) else {
            return;
        };

        let mut stub = PhotoStub::new(self.stub_identity(entry, &filename), filename);
        stub.url = field_str(entry, &["BigUrl", "Url", "ImgUrl"]);
        stub.timestamp = first_timestamp(entry, &["ShootTime"]);
        out.push(stub);
    }
}
