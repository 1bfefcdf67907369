//! End-to-end recipe caching against the local filesystem.

use simcache::{
    BoxError, Component, Configuration, EvalContext, LayerLevel, LayerStack, Port, Recipe,
    RecipeError, RecipeState, Settings, MANIFEST_FILE,
};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn configuration(mesh: i64) -> Configuration {
    Configuration::new()
        .with_layer_stack(
            LayerStack::new().with_layer("core", LayerLevel::new((1, 0), 0.22, 0.0, "si")),
        )
        .with_simulation_settings(Settings::new().with("mesh_accuracy", mesh))
}

/// Recipe whose evaluator writes `[5, 4, 3, 2, 1]` and counts invocations.
fn counted(kind: &str, root: &Path, calls: &Arc<AtomicUsize>) -> Recipe {
    let calls = calls.clone();
    Recipe::builder(kind, move |ctx: &mut EvalContext<'_>| -> Result<bool, BoxError> {
        calls.fetch_add(1, Ordering::SeqCst);
        ctx.results.insert("results1", &vec![5, 4, 3, 2, 1])?;
        Ok(true)
    })
    .configuration(configuration(2).with_setup(Settings::new().with("name", kind)))
    .root(root)
    .build()
    .unwrap()
}

fn results_files(dir: &Path) -> Vec<String> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.contains("_results."))
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn test_first_evaluation_writes_results_and_empty_manifest() {
    let tmp = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut a = counted("A", tmp.path(), &calls);

    assert!(a.evaluate(false).unwrap());
    let dir = a.dirpath().unwrap();
    let name = dir.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("A_"));
    assert!(name["A_".len()..].chars().all(|c| c.is_ascii_digit()));

    let stored = fs::read_to_string(dir.join("recipe_results.json")).unwrap();
    assert!(stored.contains("results1"));
    let manifest = fs::read_to_string(dir.join(MANIFEST_FILE)).unwrap();
    assert!(manifest.len() <= 1);
}

#[test]
fn test_cache_hit_does_not_rerun_or_rewrite() {
    let tmp = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut a = counted("A", tmp.path(), &calls);
    a.evaluate(false).unwrap();
    let artifact = a.dirpath().unwrap().join("recipe_results.json");
    let before = fs::metadata(&artifact).unwrap().modified().unwrap();

    assert!(a.evaluate(false).unwrap());
    assert_eq!(a.state(), RecipeState::FreshCached);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(fs::metadata(&artifact).unwrap().modified().unwrap(), before);
    assert_eq!(a.results().get::<Vec<i32>>("results1"), Some(vec![5, 4, 3, 2, 1]));
}

#[test]
fn test_cache_survives_new_process_instance() {
    let tmp = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    counted("A", tmp.path(), &calls).evaluate(false).unwrap();

    let mut again = counted("A", tmp.path(), &calls);
    assert!(again.evaluate(false).unwrap());
    assert_eq!(again.state(), RecipeState::FreshCached);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_mutation_after_evaluation_recomputes() {
    let tmp = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut a = counted("A", tmp.path(), &calls);
    a.evaluate(false).unwrap();
    let first_dir = a.dirpath().unwrap();

    a.configuration_mut()
        .simulation_settings
        .as_mut()
        .unwrap()
        .set("mesh_accuracy", 3);
    assert!(a.evaluate(false).unwrap());
    assert_eq!(a.state(), RecipeState::Recomputed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_ne!(a.dirpath().unwrap(), first_dir);
}

#[test]
fn test_force_recomputes_whole_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut a = counted("A", tmp.path(), &calls);
    a.set_dependencies(vec![counted("B", tmp.path(), &calls)]);
    a.evaluate(false).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    a.evaluate(true).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_manifest_lists_dependencies_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut a = counted("A", tmp.path(), &calls);
    a.set_dependencies(vec![
        counted("B", tmp.path(), &calls),
        counted("C", tmp.path(), &calls),
    ]);
    assert!(a.evaluate(false).unwrap());

    let expected: Vec<String> = a
        .dependencies()
        .iter()
        .map(|d| d.id().unwrap().dir_name())
        .collect();
    let manifest = fs::read_to_string(a.dirpath().unwrap().join(MANIFEST_FILE)).unwrap();
    let entries: Vec<&str> = manifest.lines().collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries, expected);
    assert!(!manifest.ends_with('\n'));

    for dep in a.dependencies() {
        let dir = dep.dirpath().unwrap();
        assert!(dir.is_dir());
        assert!(dir.join("recipe_results.json").is_file());
        assert!(fs::read_to_string(dir.join(MANIFEST_FILE)).unwrap().is_empty());
    }
}

#[test]
fn test_raising_evaluator_leaves_no_results_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let mut r = Recipe::builder("Broken", |ctx: &mut EvalContext<'_>| -> Result<bool, BoxError> {
        ctx.results.insert("half", &[1, 2])?;
        Err("mesh generation failed".into())
    })
    .configuration(configuration(2))
    .root(tmp.path())
    .build()
    .unwrap();

    let err = r.evaluate(false).unwrap_err();
    let dir = r.dirpath().unwrap();
    assert!(matches!(err, RecipeError::Evaluation { .. }));
    assert!(err.to_string().contains("Broken_"));
    assert_eq!(err.dir(), Some(dir.as_path()));
    assert_eq!(r.state(), RecipeState::Failed);
    assert!(results_files(&dir).is_empty());
}

#[test]
fn test_false_evaluator_leaves_no_results_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let mut r = Recipe::builder("Unconverged", |ctx: &mut EvalContext<'_>| -> Result<bool, BoxError> {
        ctx.results.insert("residual", &0.3)?;
        Ok(false)
    })
    .configuration(configuration(2))
    .root(tmp.path())
    .build()
    .unwrap();

    assert!(!r.evaluate(false).unwrap());
    assert_eq!(r.state(), RecipeState::Failed);
    assert!(results_files(&r.dirpath().unwrap()).is_empty());
}

#[test]
fn test_dependency_error_surfaces_through_parent() {
    let tmp = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let broken = Recipe::builder("Child", |_: &mut EvalContext<'_>| -> Result<bool, BoxError> {
        Err("license unavailable".into())
    })
    .root(tmp.path())
    .build()
    .unwrap();
    let mut a = counted("A", tmp.path(), &calls);
    a.set_dependencies(vec![broken]);

    let err = a.evaluate(false).unwrap_err();
    assert!(matches!(err, RecipeError::Dependency { .. }));
    assert!(err.to_string().contains("license unavailable"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(results_files(&a.dirpath().unwrap()).is_empty());
}

#[test]
fn test_cache_hit_rewrites_manifest_with_new_dependencies() {
    let tmp = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut a = counted("A", tmp.path(), &calls);
    a.evaluate(false).unwrap();
    let manifest_path = a.dirpath().unwrap().join(MANIFEST_FILE);
    assert!(fs::read_to_string(&manifest_path).unwrap().is_empty());

    a.set_dependencies(vec![
        counted("B", tmp.path(), &calls),
        counted("C", tmp.path(), &calls),
    ]);
    assert!(a.evaluate(false).unwrap());
    assert_eq!(a.state(), RecipeState::FreshCached);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let expected: Vec<String> = a
        .dependencies()
        .iter()
        .map(|d| d.last_id().unwrap().dir_name())
        .collect();
    let manifest = fs::read_to_string(&manifest_path).unwrap();
    assert_eq!(manifest.lines().collect::<Vec<_>>(), expected);
}

#[test]
fn test_unresolvable_layer_is_fingerprint_error() {
    let tmp = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let geometry =
        Component::new("bad").with_port(Port::new("o1", (0.0, 0.0), 0.5, 0.0, "NOPE"));
    let mut r = Recipe::builder("Bad", move |_: &mut EvalContext<'_>| -> Result<bool, BoxError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    })
    .configuration(configuration(2).with_geometry(geometry))
    .root(tmp.path())
    .build()
    .unwrap();

    let err = r.evaluate(false).unwrap_err();
    assert!(matches!(err, RecipeError::Fingerprint { .. }));
    assert_eq!(r.state(), RecipeState::Failed);
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn test_non_finite_setting_is_fingerprint_error() {
    let tmp = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut r = counted("Nan", tmp.path(), &calls);
    r.configuration_mut()
        .simulation_settings
        .as_mut()
        .unwrap()
        .set("wavelength", f64::NAN);

    let err = r.evaluate(false).unwrap_err();
    assert!(matches!(err, RecipeError::Fingerprint { .. }));
    assert!(err.to_string().contains("wavelength"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}
