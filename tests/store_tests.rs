//! Result store round trips through the filesystem backend.

use simcache::{fingerprint, Configuration, ResultStore, Results, Settings, StoreError};
use std::fs;
use std::path::PathBuf;

#[test]
fn test_round_trip_normalizes_directory_only() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ResultStore::fs();
    let cfg = Configuration::new().with_simulation_settings(Settings::new().with("mesh", 3));

    let mut r = Results::new("convergence", "/not/used");
    r.insert("sparams", &vec![0.1, 0.2, 0.3]).unwrap();
    r.insert_path("gds", &tmp.path().join("cell.gds"));
    r.stamp(cfg.snapshot().unwrap(), fingerprint(&cfg).unwrap());

    let written = tmp.path().join("Fdtd_1");
    store.save(&r, &written).unwrap();
    let back = store.load("convergence", &written).unwrap();

    assert_eq!(back.dirpath(), written.as_path());
    assert_eq!(back.get::<Vec<f64>>("sparams"), Some(vec![0.1, 0.2, 0.3]));
    assert_eq!(back.get_path("gds"), Some(tmp.path().join("cell.gds")));
    assert_eq!(back.snapshot(), r.snapshot());
    assert_eq!(back.recorded_fingerprint(), r.recorded_fingerprint());
}

#[test]
fn test_artifact_copied_elsewhere_loads_with_new_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ResultStore::fs();
    let mut r = Results::new("recipe", "");
    r.insert("results1", &vec![5, 4, 3, 2, 1]).unwrap();
    let src = tmp.path().join("A_1");
    let path = store.save(&r, &src).unwrap();

    let dst: PathBuf = tmp.path().join("moved").join("A_1");
    fs::create_dir_all(&dst).unwrap();
    fs::copy(&path, dst.join("recipe_results.json")).unwrap();

    let back = store.load("recipe", &dst).unwrap();
    assert_eq!(back.dirpath(), dst.as_path());
    assert_eq!(back.get::<Vec<i32>>("results1"), Some(vec![5, 4, 3, 2, 1]));
}

#[test]
fn test_truncated_artifact_is_reported_corrupt() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("A_1");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("recipe_results.json"), "{\"prefix\": \"rec").unwrap();

    let store = ResultStore::fs();
    assert!(store.available("recipe", &dir));
    let err = store.load("recipe", &dir).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
}
