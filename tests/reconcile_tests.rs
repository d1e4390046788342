//! Integration tests for store persistence and reconciliation
//!
//! Exercises the reconcile step through real files: load, rebuild, save,
//! and the byte-level idempotence of repeated passes.

use citesync::catalog;
use citesync::store::{PaperRecord, Store};
use citesync::time::EPOCH_SENTINEL;
use citesync::workflow::reconcile::reconcile;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("citations.json")
}

#[test]
fn test_load_missing_file_yields_empty_store() {
    let dir = TempDir::new().unwrap();
    let store = Store::load(store_path(&dir)).unwrap();
    assert!(store.is_empty());
}

#[test]
fn test_load_rejects_corrupt_store() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    fs::write(&path, "{\"papers\": \"oops\"}").unwrap();
    assert!(Store::load(&path).is_err());

    fs::write(&path, "not json at all").unwrap();
    assert!(Store::load(&path).is_err());
}

#[test]
fn test_save_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let mut store = Store::new(&path);
    let mut record = PaperRecord::new("A Paper Worth Keeping Around");
    record.citations = 17;
    record.last_updated = "2024-03-04-05:06:07".to_string();
    store.insert("A Paper Worth Keeping Around".to_string(), record.clone());
    store.save().unwrap();

    let loaded = Store::load(&path).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.get("A Paper Worth Keeping Around"), Some(&record));
}

#[test]
fn test_saved_file_shape() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let mut store = Store::new(&path);
    store.insert(
        "Shape Checking Paper Title".to_string(),
        PaperRecord::new("Shape Checking Paper Title"),
    );
    store.save().unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &value["papers"]["Shape Checking Paper Title"];
    assert_eq!(record["title"], "Shape Checking Paper Title");
    assert_eq!(record["citations"], 0);
    assert_eq!(record["last_updated"], EPOCH_SENTINEL);
}

#[test]
fn test_saved_file_preserves_store_order() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let mut store = Store::new(&path);
    for key in ["Zeta Ordering Paper", "Alpha Ordering Paper"] {
        store.insert(key.to_string(), PaperRecord::new(key));
    }
    store.save().unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    let zeta = raw.find("Zeta Ordering Paper").unwrap();
    let alpha = raw.find("Alpha Ordering Paper").unwrap();
    assert!(zeta < alpha, "file order must follow store order, not key order");
}

#[test]
fn test_reconcile_twice_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let document = "\
# Papers\n\n\
- **An Established Paper From Before** [[paper]](u1)\n\
- **A Freshly Added Paper Title** [[paper]](u2)\n";

    let mut seeded = Store::new(&path);
    seeded.insert(
        "An Established Paper From Before".to_string(),
        PaperRecord {
            title: "An Established Paper From Before".to_string(),
            citations: 250,
            last_updated: "2024-01-15-09:30:00".to_string(),
        },
    );
    seeded.save().unwrap();

    let titles = catalog::extract_titles(document);

    let loaded = Store::load(&path).unwrap();
    let (first, _) = reconcile(&titles, &loaded);
    first.save().unwrap();
    let first_bytes = fs::read(&path).unwrap();

    let reloaded = Store::load(&path).unwrap();
    let (second, report) = reconcile(&titles, &reloaded);
    second.save().unwrap();
    let second_bytes = fs::read(&path).unwrap();

    assert_eq!(first_bytes, second_bytes);
    assert!(report.added.is_empty());
    assert!(report.orphaned.is_empty());
}

#[test]
fn test_reconcile_preserves_citation_data_through_files() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let mut seeded = Store::new(&path);
    seeded.insert(
        "A Paper With History Behind It".to_string(),
        PaperRecord {
            title: "A Paper With History Behind It".to_string(),
            citations: 99,
            last_updated: "2023-11-11-11:11:11".to_string(),
        },
    );
    seeded.save().unwrap();

    let titles = vec![
        "A Paper With History Behind It".to_string(),
        "A Paper Nobody Has Seen Yet".to_string(),
    ];
    let loaded = Store::load(&path).unwrap();
    let (next, report) = reconcile(&titles, &loaded);
    next.save().unwrap();

    let reloaded = Store::load(&path).unwrap();
    let kept = reloaded.get("A Paper With History Behind It").unwrap();
    assert_eq!(kept.citations, 99);
    assert_eq!(kept.last_updated, "2023-11-11-11:11:11");

    let added = reloaded.get("A Paper Nobody Has Seen Yet").unwrap();
    assert_eq!(added.citations, 0);
    assert_eq!(added.last_updated, EPOCH_SENTINEL);
    assert_eq!(report.added, vec!["A Paper Nobody Has Seen Yet"]);

    // new record's sentinel sorts before every real timestamp
    assert!(added.last_updated < kept.last_updated);
}

#[test]
fn test_save_replaces_file_without_leaving_temp() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let mut store = Store::new(&path);
    store.insert(
        "Temp File Hygiene Paper".to_string(),
        PaperRecord::new("Temp File Hygiene Paper"),
    );
    store.save().unwrap();
    store.save().unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["citations.json".to_string()]);
}
