//! Cache ingest tests
//!
//! Drive the merge store the way vendor adapters do and check the manifest
//! sees the merged result.

use rphoto_common::config::Settings;
use rphoto_common::Error;
use rphoto_manifest::generate_manifest;
use rphoto_manifest::services::{CacheStore, FetchError, RefreshOutcome};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn photo_ids(doc: &Value) -> Vec<u64> {
    doc["pics_array"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["id"].as_u64())
        .collect()
}

#[test]
fn test_repeated_fetches_accumulate_photos() {
    let temp = TempDir::new().unwrap();
    let store = CacheStore::new(temp.path());

    let first = json!({"pics_array": [
        {"id": 10, "pic_name": "A 10.JPG", "exif_timestamp": 1710029730},
        {"id": 2, "pic_name": "A 2.JPG"}
    ]});
    let second = json!({"pics_array": [
        {"id": 2, "pic_name": "A 2.JPG", "exif_timestamp": 1710028800},
        {"id": 33, "pic_name": "A 33.JPG"}
    ]});

    store.refresh("Spring Run", "photoplus", Ok(first)).unwrap();
    let outcome = store.refresh("Spring Run", "photoplus", Ok(second.clone())).unwrap();
    match &outcome {
        RefreshOutcome::Merged { added, total, .. } => {
            assert_eq!(*added, 1);
            assert_eq!(*total, 3);
        }
        other => panic!("Expected merge, got {:?}", other),
    }

    let cached = store.load("Spring Run", "photoplus").unwrap().unwrap();
    assert_eq!(photo_ids(&cached), vec![2, 10, 33]);
    assert_eq!(cached["pics_array"][0]["exif_timestamp"], 1710028800);

    // Same fetch again changes nothing
    store.refresh("Spring Run", "photoplus", Ok(second)).unwrap();
    assert_eq!(store.load("Spring Run", "photoplus").unwrap().unwrap(), cached);
}

#[test]
fn test_failed_fetch_falls_back_to_cache() {
    let temp = TempDir::new().unwrap();
    let store = CacheStore::new(temp.path());
    let doc = json!([{"id": 1, "big": "/b/1.jpg", "ts": 1710028800}]);
    store.refresh("Race", "runff", Ok(doc.clone())).unwrap();

    let unknown = store.refresh("Race", "runff", Ok(json!({"error": "expired"}))).unwrap();
    assert_eq!(unknown, RefreshOutcome::Cached { document: doc.clone() });

    let failed = store
        .refresh("Race", "runff", Err(FetchError::Transport("connection reset".into())))
        .unwrap();
    assert_eq!(failed.document(), &doc);

    let missing = store.refresh("Other", "runff", Err(FetchError::Parse("eof".into())));
    assert!(matches!(missing, Err(Error::NotFound(_))));
}

#[test]
fn test_race_names_are_sanitized() {
    let temp = TempDir::new().unwrap();
    let store = CacheStore::new(temp.path());
    let path = store
        .store_race_info(" 2024: Wuxi/Marathon. ", "runnerbar", &json!({"date": "2024-03-24"}))
        .unwrap();
    assert_eq!(
        path,
        temp.path()
            .join("2024_ Wuxi_Marathon")
            .join("runnerbar")
            .join("race_info.json")
    );
}

#[test]
fn test_ingested_cache_feeds_manifest() {
    let temp = TempDir::new().unwrap();
    let site_root = temp.path().join("docs");
    let base_dir = site_root.join("images");
    let store = CacheStore::new(&base_dir);

    store
        .refresh(
            "Spring Run",
            "photoplus",
            Ok(json!({"result": {"pics_array": [{"id": 1, "pic_name": "A 1.JPG", "exif_timestamp": 1710029730}]}})),
        )
        .unwrap();
    store
        .store_race_info("Spring Run", "photoplus", &json!({"data": {"date": "2024-03-10", "place": "上海"}}))
        .unwrap();
    fs::write(store.source_dir("Spring Run", "photoplus").join("A_1.JPG"), b"x").unwrap();

    let settings = Settings {
        output: base_dir.join("manifest.json"),
        routes_dir: site_root.join("routes"),
        base_dir,
        site_root,
        log_level: "info".to_string(),
        geo: None,
    };
    let manifest = generate_manifest(&settings).unwrap();

    let race = manifest
        .races
        .iter()
        .find(|race| race.name == "Spring Run")
        .unwrap();
    assert_eq!(race.date, "2024-03-10");
    assert_eq!(race.city, "上海");
    assert_eq!((race.lat, race.lon), (Some(31.2304), Some(121.4737)));

    let photo = &race.sources[0].photos[0];
    assert_eq!(photo.name, "A_1.JPG");
    assert_eq!(photo.timestamp.as_deref(), Some("2024-03-10 08:15:30"));
}
