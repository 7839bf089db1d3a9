use std::fs;

use mc_core::ResultsRecord;
use mc_driver::{
    open_stores, CsvResults, JsonResults, OutputFormat, OutputLayout, ResultsStore, StorageConfig,
};
use serde_json::{json, Value};
use tempfile::tempdir;

fn row(index: u64, temperature: f64) -> ResultsRecord {
    ResultsRecord::new()
        .with("index", index)
        .with("T", temperature)
        .with("<E>", temperature - 2.0)
}

#[test]
fn json_store_is_column_oriented() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.json");
    let mut store = JsonResults::new(&path);
    assert!(!store.exists());
    assert_eq!(store.len().unwrap(), 0);

    for index in 0..3 {
        store.append(&row(index, index as f64)).unwrap();
    }
    assert_eq!(store.len().unwrap(), 3);

    let contents: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(contents["T"], json!([0.0, 1.0, 2.0]));
    assert_eq!(contents["index"], json!([0, 1, 2]));

    store.truncate(1).unwrap();
    assert_eq!(store.len().unwrap(), 1);
    let contents: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(contents["<E>"], json!([-2.0]));
}

#[test]
fn json_store_pads_columns_that_appear_late() {
    let dir = tempdir().unwrap();
    let mut store = JsonResults::new(dir.path().join("results.json"));
    store.append(&row(0, 1.0)).unwrap();
    store.append(&row(1, 2.0).with("acceptance", 0.25)).unwrap();
    store.append(&row(2, 3.0)).unwrap();
    assert_eq!(store.len().unwrap(), 3);

    let contents: Value =
        serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(contents["acceptance"], json!([null, 0.25, null]));
}

#[test]
fn csv_store_keeps_header_through_truncation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("results.csv");
    let mut store = CsvResults::new(&path);
    for index in 0..4 {
        store.append(&row(index, 0.5 * index as f64)).unwrap();
    }
    assert_eq!(store.len().unwrap(), 4);
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("index,T,<E>\n0,0.0,-2.0\n"));

    store.truncate(2).unwrap();
    assert_eq!(store.len().unwrap(), 2);
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 3);

    store.truncate(0).unwrap();
    assert_eq!(store.len().unwrap(), 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), "index,T,<E>\n");
}

#[test]
fn csv_store_ignores_interrupted_trailing_row() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.csv");
    fs::write(&path, "index,T,<E>\n0,1.0,-1.5\n1,2.0").unwrap();
    let mut store = CsvResults::new(&path);
    assert_eq!(store.len().unwrap(), 1);

    store.append(&row(1, 2.0)).unwrap();
    assert_eq!(store.len().unwrap(), 2);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "index,T,<E>\n0,1.0,-1.5\n1,2.0,0.0\n"
    );
}

#[test]
fn csv_store_rejects_unknown_columns() {
    let dir = tempdir().unwrap();
    let mut store = CsvResults::new(dir.path().join("results.csv"));
    store.append(&row(0, 1.0)).unwrap();
    let err = store.append(&row(1, 2.0).with("extra", 1)).unwrap_err();
    assert_eq!(err.code(), "results-csv-columns");
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn open_stores_follows_enabled_formats() {
    let dir = tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());
    let storage = StorageConfig {
        output_directory: dir.path().to_path_buf(),
        output_format: vec![OutputFormat::Json, OutputFormat::Csv, OutputFormat::Json],
    };
    let stores = open_stores(&layout, &storage);
    let formats: Vec<_> = stores.iter().map(|store| store.format()).collect();
    assert_eq!(formats, vec![OutputFormat::Json, OutputFormat::Csv]);
    assert_eq!(stores[1].path(), layout.results(OutputFormat::Csv));
}

#[test]
fn csv_store_drops_unterminated_row_cut_inside_a_character() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.csv");
    let mut contents = b"index,T,phase\n0,1.0,caf\xC3\xA9\n1,2.0,caf".to_vec();
    contents.push(0xC3);
    fs::write(&path, &contents).unwrap();

    let mut store = CsvResults::new(&path);
    assert_eq!(store.len().unwrap(), 1);

    store
        .append(&ResultsRecord::new().with("index", 1).with("T", 2.0).with("phase", "café"))
        .unwrap();
    assert_eq!(store.len().unwrap(), 2);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "index,T,phase\n0,1.0,café\n1,2.0,café\n"
    );
}

#[test]
fn csv_store_drops_unterminated_row_with_full_field_count() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.csv");
    fs::write(&path, "index,T,<E>\n0,1.0,-1.5\n1,2.0,-0").unwrap();
    let mut store = CsvResults::new(&path);
    assert_eq!(store.len().unwrap(), 1);

    store.truncate(1).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "index,T,<E>\n0,1.0,-1.5\n");
}

#[test]
fn csv_store_replaces_torn_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.csv");
    fs::write(&path, "index,T").unwrap();
    let mut store = CsvResults::new(&path);
    assert!(store.exists());
    assert_eq!(store.len().unwrap(), 0);

    store.append(&row(0, 1.0)).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "index,T,<E>\n0,1.0,-1.0\n");
}
