//! Integration tests that verify the shipped example implications file
//! in `data/` loads, sorts and evaluates as documented.

use implied_core::{LabelSet, Node};
use implied_rules::{ImplicationStore, ImpliedLabels, LabelSources, RuleSpec};

/// Resolve the example file relative to the workspace root.
/// Integration tests run from the crate directory, so we go up two levels.
fn example_store() -> ImplicationStore {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    ImplicationStore::new(manifest.join("../../data/implications.example.yml"))
}

#[test]
fn example_file_parses() {
    let specs = example_store().load().expect("load example file");
    assert_eq!(specs.len(), 6);
    assert_eq!(specs[0], RuleSpec::new("rhel || fedora", "linux"));
}

#[test]
fn example_rules_chain_after_sorting() {
    let engine = ImpliedLabels::open(example_store(), LabelSources::new()).unwrap();

    let node = Node::new("build-01", "rhel65 x86_64");
    assert_eq!(
        engine.evaluate(&node),
        LabelSet::parse("build-01 rhel65 rhel6 rhel linux systemd x86_64 64bit")
    );

    let node = Node::new("ci-pod", "fedora18 container aarch64");
    let labels = engine.evaluate(&node);
    assert!(labels.contains_name("linux"));
    assert!(!labels.contains_name("systemd"));
}
