//! Fingerprint determinism across independently built configurations.

use simcache::{
    fingerprint, Component, Configuration, LayerLevel, LayerMap, LayerRef, LayerStack, Port,
    Process, ProcessStep, Settings,
};

fn build(symbolic_ports: bool) -> Configuration {
    let layer: LayerRef = if symbolic_ports { "WG".into() } else { (1, 0).into() };
    let geometry = Component::new("mmi1x2")
        .with_layer_map(LayerMap::new().with("WG", (1, 0)))
        .with_polygon((1, 0), vec![(0.0, 0.0), (5.0, 0.0), (5.0, 2.5), (0.0, 2.5)])
        .with_port(Port::new("o1", (0.0, 1.25), 0.5, 180.0, layer));

    Configuration::new()
        .with_geometry(geometry)
        .with_layer_stack(
            LayerStack::new()
                .with_layer("core", LayerLevel::new((1, 0), 0.22, 0.0, "si"))
                .with_layer("clad", LayerLevel::new((111, 0), 3.0, -3.0, "sio2")),
        )
        .with_process(Process::new(vec![ProcessStep::etch("slab", "si", 0.07)]))
        .with_simulation_settings(
            Settings::new()
                .with("wavelength_start", 1.5)
                .with("wavelength_stop", 1.6)
                .with("mesh_accuracy", 2),
        )
        .with_convergence_settings(Settings::new().with("sparam_diff", 0.01))
}

#[test]
fn test_equal_configurations_share_fingerprint() {
    assert_eq!(fingerprint(&build(false)).unwrap(), fingerprint(&build(false)).unwrap());
}

#[test]
fn test_insertion_order_does_not_matter() {
    let a = Configuration::new().with_simulation_settings(
        Settings::new().with("x", 1).with("y", 2).with("z", "fdtd"),
    );
    let b = Configuration::new().with_simulation_settings(
        Settings::new().with("z", "fdtd").with("y", 2).with("x", 1),
    );
    assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
}

#[test]
fn test_symbolic_port_layers_hash_like_numeric() {
    assert_eq!(fingerprint(&build(true)).unwrap(), fingerprint(&build(false)).unwrap());
}

#[test]
fn test_transient_entries_are_not_hashed() {
    let mut c = build(false);
    let before = fingerprint(&c).unwrap();
    c.simulation_settings
        .as_mut()
        .unwrap()
        .set_transient("results_cache", "0x7f3a");
    assert_eq!(fingerprint(&c).unwrap(), before);
}

#[test]
fn test_any_semantic_change_moves_fingerprint() {
    let base = fingerprint(&build(false)).unwrap();

    let mut c = build(false);
    c.convergence_settings.as_mut().unwrap().set("sparam_diff", 0.001);
    assert_ne!(fingerprint(&c).unwrap(), base);

    let c = build(false).with_process(Process::default());
    assert_ne!(fingerprint(&c).unwrap(), base);

    let c = build(false).with_setup(Settings::new().with("sweep", vec![0.5, 1.0]));
    assert_ne!(fingerprint(&c).unwrap(), base);
}

#[test]
fn test_unresolvable_layer_is_an_error() {
    let c = Configuration::new()
        .with_geometry(Component::new("bad").with_port(Port::new("o1", (0.0, 0.0), 0.5, 0.0, "NOPE")));
    assert!(fingerprint(&c).is_err());
}
