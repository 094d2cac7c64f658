//! RunnerBar (`topicInfoList`) photo lists
//!
//! Records carry the high-quality image URL in `url_hq`, GPS in
//! `gps_latitude`/`gps_longitude` and an EXIF dump as a JSON string in
//! `meta_info`. Video records reuse `meta_info` for the video URL; the
//! `url_hq` image is then the video's cover.

use super::{
    absolute_url, field_str, first_timestamp, gps_pair, url_file_name, url_tail, VendorSchema,
};
use crate::types::PhotoStub;
use serde_json::Value;

const EXIF_TIME_KEYS: &[&str] = &["DateTimeOriginal", "dateTimeOriginal", "DateTime", "shoot_time"];
const RECORD_TIME_KEYS: &[&str] = &["shoot_time", "create_time", "upload_time"];

pub struct RunnerBarSchema;

/// Interpretation of the `meta_info` field
#[derive(Debug, Clone, PartialEq)]
enum MetaInfo {
    Absent,
    VideoUrl(String),
    Exif(Value),
}

impl MetaInfo {
    fn parse(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(text)) => {
                let text = text.trim();
                if looks_like_url(text) {
                    return MetaInfo::VideoUrl(absolute_url(text));
                }
                match serde_json::from_str::<Value>(text) {
                    Ok(parsed) if parsed.is_object() => MetaInfo::Exif(parsed),
                    _ => MetaInfo::Absent,
                }
            }
            Some(obj @ Value::Object(_)) => MetaInfo::Exif(obj.clone()),
            _ => MetaInfo::Absent,
        }
    }

    fn timestamp(&self) -> Option<String> {
        match self {
            MetaInfo::Exif(exif) => first_timestamp(exif, EXIF_TIME_KEYS),
            _ => None,
        }
    }
}

fn looks_like_url(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://") || text.starts_with("//")
}

impl VendorSchema for RunnerBarSchema {
    fn identity(&self, entry: &Value) -> Option<String> {
        field_str(entry, &["photoId", "id"])
    }

    fn normalize_entry(&self, entry: &Value, out: &mut Vec<PhotoStub>) {
        let Some(image_url) = field_str(entry, &["url_hq", "url"]) else {
            return;
        };
        let image_name = url_file_name(&image_url, self.identity(entry).as_deref());

        let meta = MetaInfo::parse(entry.get("meta_info"));
        let (lat, lon) = gps_pair(entry, "gps_latitude", "gps_longitude");
        let timestamp = meta
            .timestamp()
            .or_else(|| first_timestamp(entry, RECORD_TIME_KEYS));

        let image = PhotoStub {
            identity: self.stub_identity(entry, &image_name),
            filename: image_name.clone(),
            url: Some(absolute_url(&image_url)),
            lat,
            lon,
            timestamp,
            video_cover: None,
        };

        if let MetaInfo::VideoUrl(video_url) = meta {
            if let Some(video_name) = url_tail(&video_url) {
                out.push(PhotoStub {
                    filename: video_name,
                    url: Some(video_url),
                    video_cover: Some(image_name),
                    ..image.clone()
                });
            }
        }
        out.push(image);
    }
}
