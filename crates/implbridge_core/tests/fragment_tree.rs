use implbridge_core::{
    discover_fragments, load_fragment, load_fragments, parse_fragment, render_fragment,
    replay_into, write_fragment, Contribution, ImplementorFragment, LoadError, LoadOrder,
    RegistryBridge, SharedIndex,
};
use std::path::{Path, PathBuf};

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/implementors")
}

fn write_tree(root: &Path) -> Vec<ImplementorFragment> {
    let fragments = vec![
        ImplementorFragment::new(
            "core::clone::Clone",
            Contribution::new()
                .with_group("libc", Vec::<String>::new())
                .with_group("rand", ["impl Clone for StdRng"]),
        ),
        ImplementorFragment::new(
            "core::default::Default",
            Contribution::new().with_group("rand", ["impl Default for ReseedWithDefault"]),
        ),
        ImplementorFragment::new(
            "rand::Rng",
            Contribution::new().with_group("rand_mersenne_twister", ["impl Rng for MTRng64"]),
        ),
    ];
    for fragment in &fragments {
        write_fragment(root, fragment).expect("fragment should be written");
    }
    fragments
}

#[test]
fn parses_generated_default_fragment() {
    let path = fixture_root().join("core/default/trait.Default.js");
    let fragment = load_fragment(&fixture_root(), &path).expect("fixture should load");

    assert_eq!(fragment.trait_path, "core::default::Default");
    let contribution = fragment.contribution;
    assert_eq!(
        contribution.keys().collect::<Vec<_>>(),
        vec!["libc", "rand", "rand_mersenne_twister"]
    );
    assert_eq!(contribution.get("libc"), Some(&[][..]));
    let twister = contribution
        .get("rand_mersenne_twister")
        .expect("twister group should exist");
    assert_eq!(twister.len(), 2);
    assert!(twister[0].ends_with("title='rand_mersenne_twister::mt32::MTRng32'>MTRng32</a>"));
    assert!(twister[1].contains("struct.MTRng64.html"));
}

#[test]
fn written_tree_is_discovered_in_sorted_order() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    std::fs::write(dir.path().join("core/clone/struct.Ignored.js"), "ignored").unwrap();
    std::fs::write(dir.path().join("README.md"), "ignored").unwrap();

    let found = discover_fragments(dir.path()).unwrap();

    let relative: Vec<_> = found
        .iter()
        .map(|path| path.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        relative,
        vec![
            PathBuf::from("core/clone/trait.Clone.js"),
            PathBuf::from("core/default/trait.Default.js"),
            PathBuf::from("rand/trait.Rng.js"),
        ]
    );
}

#[test]
fn written_fragments_load_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let written = write_tree(dir.path());

    let loaded = load_fragments(dir.path()).unwrap();

    assert_eq!(loaded, written);
}

#[test]
fn rendered_fixture_parses_to_same_contribution() {
    let script = std::fs::read_to_string(fixture_root().join("core/default/trait.Default.js"))
        .unwrap();
    let contribution = parse_fragment(&script).unwrap();

    let rerendered = render_fragment(&contribution);

    assert_eq!(parse_fragment(&rerendered).unwrap(), contribution);
    assert!(rerendered.ends_with(&script[script.find("\n\n").unwrap()..]));
}

#[test]
fn collector_first_receives_every_fragment() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    let index = SharedIndex::new();
    let mut bridge = RegistryBridge::new();
    bridge.register_collector(index.clone());

    let report = replay_into(&mut bridge, load_fragments(dir.path()).unwrap(), LoadOrder::Sorted);

    assert_eq!(report.delivered, 3);
    let guard = index.lock();
    assert_eq!(guard.deliveries(), 3);
    assert_eq!(guard.group_keys(), vec!["libc", "rand", "rand_mersenne_twister"]);
    assert_eq!(guard.items("rand").map(<[String]>::len), Some(2));
}

#[test]
fn collector_last_receives_only_last_loaded_fragment() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());

    for (order, expected_key) in [
        (LoadOrder::Sorted, "rand_mersenne_twister"),
        (LoadOrder::Reversed, "libc"),
    ] {
        let index = SharedIndex::new();
        let mut bridge = RegistryBridge::new();
        let report = replay_into(&mut bridge, load_fragments(dir.path()).unwrap(), order);
        assert_eq!(report.dropped, 2);

        let outcome = bridge.register_collector(index.clone());

        assert!(outcome.delivered_pending);
        let guard = index.lock();
        assert_eq!(guard.deliveries(), 1);
        assert!(guard.group_keys().contains(&expected_key));
    }
}

#[test]
fn malformed_fragment_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trait.Broken.js");
    std::fs::write(&path, "(function() {var implementors = {};implementors['a'] = [\"x").unwrap();

    let err = load_fragments(dir.path()).expect_err("broken fragment must fail");

    match err {
        LoadError::Parse { path: failed, .. } => assert_eq!(failed, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_root_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = discover_fragments(&dir.path().join("missing")).expect_err("missing root");
    assert!(matches!(err, LoadError::Io { .. }));
}
