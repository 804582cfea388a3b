use medusa::collapse::{MINIMUM_NODES, collapse};
use medusa::node::{NodeRegistry, ProfileNode, build_registry};

fn profile(id: &str, parent: Option<&str>, children: &[&str], between: f64) -> ProfileNode {
    ProfileNode {
        id: id.to_string(),
        parent_id: parent.map(str::to_string),
        children: children.iter().map(|c| c.to_string()).collect(),
        between_time: between,
        within_time: 0.0,
    }
}

fn registry_of(nodes: &[ProfileNode]) -> NodeRegistry {
    build_registry(nodes, None).unwrap()
}

fn ids(registry: &NodeRegistry) -> Vec<&str> {
    let mut out: Vec<&str> = registry.keys().map(String::as_str).collect();
    out.sort();
    out
}

#[test]
fn consecutive_insignificant_siblings_merge() {
    // a and b are adjacent and tiny; c is long; d is tiny but isolated.
    let nodes = vec![
        profile("r", None, &["a", "b", "c", "d"], 100.0),
        profile("a", Some("r"), &[], 1.0),
        profile("b", Some("r"), &[], 2.0),
        profile("c", Some("r"), &[], 50.0),
        profile("d", Some("r"), &[], 3.0),
    ];
    let out = collapse(&registry_of(&nodes), 1.0);

    assert_eq!(ids(&out), vec!["c", "d", "r", "xa-b"]);
    assert_eq!(out["r"].children, vec!["xa-b", "c", "d"]);
    let merged = &out["xa-b"];
    assert_eq!(merged.between, 3.0);
    assert!(merged.kind.is_collapsed());
    assert_eq!(merged.parent.as_deref(), Some("r"));
}

#[test]
fn merged_constituents_flatten_and_ids_are_deterministic() {
    // Four tiny siblings chain-merge until the three-node floor stops them.
    let nodes = vec![
        profile("r", None, &["a", "b", "c", "d"], 100.0),
        profile("a", Some("r"), &[], 1.0),
        profile("b", Some("r"), &[], 1.0),
        profile("c", Some("r"), &[], 1.0),
        profile("d", Some("r"), &[], 1.0),
    ];
    let out = collapse(&registry_of(&nodes), 1.0);

    assert_eq!(out.len(), MINIMUM_NODES);
    assert_eq!(ids(&out), vec!["d", "r", "xa-b-c"]);
    assert_eq!(out["xa-b-c"].between, 3.0);
}

#[test]
fn vertical_runs_merge_into_their_parent() {
    let nodes = vec![
        profile("r", None, &["m"], 0.5),
        profile("m", Some("r"), &["n"], 1.0),
        profile("n", Some("m"), &["o"], 2.0),
        profile("o", Some("n"), &[], 3.0),
    ];
    let out = collapse(&registry_of(&nodes), 1.0);

    assert_eq!(out.len(), MINIMUM_NODES);
    assert_eq!(ids(&out), vec!["n", "o", "xm-r"]);
    let merged = &out["xm-r"];
    assert!(merged.is_root());
    assert_eq!(merged.children, vec!["n"]);
    assert_eq!(out["n"].parent.as_deref(), Some("xm-r"));
}

#[test]
fn a_long_grandchild_blocks_the_vertical_merge() {
    let nodes = vec![
        profile("r", None, &["c", "z"], 1.0),
        profile("c", Some("r"), &["g"], 1.0),
        profile("g", Some("c"), &[], 1000.0),
        profile("z", Some("r"), &[], 1000.0),
    ];
    let out = collapse(&registry_of(&nodes), 1.0);

    // c is tiny but hides a long grandchild, so nothing merges.
    assert_eq!(ids(&out), vec!["c", "g", "r", "z"]);
}

#[test]
fn node_count_never_drops_below_the_floor() {
    let nodes = vec![
        profile("r", None, &["a"], 0.1),
        profile("a", Some("r"), &["b"], 0.1),
        profile("b", Some("a"), &[], 0.1),
    ];
    let out = collapse(&registry_of(&nodes), 1.0);
    assert_eq!(out.len(), 3);
    assert_eq!(ids(&out), vec!["a", "b", "r"]);
}

#[test]
fn threshold_is_strict() {
    // total_time * scale == 10 is not below the threshold.
    let nodes = vec![
        profile("r", None, &["p", "q", "s"], 100.0),
        profile("p", Some("r"), &[], 10.0),
        profile("q", Some("r"), &[], 10.0),
        profile("s", Some("r"), &[], 100.0),
    ];
    let out = collapse(&registry_of(&nodes), 1.0);
    assert_eq!(out.len(), 4);
}

#[test]
fn collapsing_twice_yields_identical_ids() {
    let nodes = vec![
        profile("r", None, &["a", "b", "c", "d", "e"], 100.0),
        profile("a", Some("r"), &[], 1.0),
        profile("b", Some("r"), &[], 2.0),
        profile("c", Some("r"), &[], 50.0),
        profile("d", Some("r"), &[], 3.0),
        profile("e", Some("r"), &[], 4.0),
    ];
    let once = collapse(&registry_of(&nodes), 1.0);
    let twice = collapse(&once, 1.0);

    assert_eq!(ids(&once), ids(&twice));
    // An already-merged node absorbing nothing new keeps its derived id.
    assert!(once.contains_key("xa-b"));
    assert!(once.contains_key("xd-e"));
}

#[test]
fn stale_layout_state_is_cleared() {
    let nodes = vec![
        profile("r", None, &["a", "b"], 100.0),
        profile("a", Some("r"), &[], 1.0),
        profile("b", Some("r"), &[], 2.0),
    ];
    let mut registry = registry_of(&nodes);
    medusa::stem::build_stems(&mut registry, &medusa::settings::LayoutSettings::default())
        .unwrap();
    let out = collapse(&registry, 1.0);
    assert!(out.values().all(|n| n.stem.is_none() && n.position.is_none()));
}
