use medusa::layout::{Layout, ShortcutOrigin};
use medusa::node::ProfileNode;
use medusa::settings::LayoutSettings;
use medusa::{Error, NodeKind};

fn profile(
    id: &str,
    parent: Option<&str>,
    children: &[&str],
    between: f64,
    within: f64,
) -> ProfileNode {
    ProfileNode {
        id: id.to_string(),
        parent_id: parent.map(str::to_string),
        children: children.iter().map(|c| c.to_string()).collect(),
        between_time: between,
        within_time: within,
    }
}

fn small_tree() -> Vec<ProfileNode> {
    vec![
        profile("r", None, &["x", "y"], 0.0, 50.0),
        profile("x", Some("r"), &["x1", "x2"], 10.0, 20.0),
        profile("y", Some("r"), &["y1"], 5.0, 10.0),
        profile("x1", Some("x"), &[], 30.0, 10.0),
        profile("x2", Some("x"), &[], 40.0, 5.0),
        profile("y1", Some("y"), &[], 20.0, 15.0),
    ]
}

#[test]
fn full_pipeline_positions_every_node() {
    let layout = Layout::generate(&small_tree(), LayoutSettings::default()).unwrap();

    assert_eq!(layout.registry.len(), 6);
    assert_eq!(layout.leaf_order.len(), 3);
    for leaf in ["x1", "x2", "y1"] {
        assert!(layout.leaf_order.iter().any(|id| id == leaf));
    }

    for node in layout.registry.values() {
        let position = node.position.as_ref().unwrap();
        assert!(position.x.is_finite() && position.y.is_finite());
        let stem = node.stem.as_ref().unwrap();
        assert!(stem.scaled.is_some());
    }

    assert_eq!(layout.connections.len(), 5);
    for connection in &layout.connections {
        let target = layout.node(&connection.target).unwrap();
        assert_eq!(target.parent.as_deref(), Some(connection.origin.as_str()));
        assert!(connection.visible_length > 0.0);
    }

    assert!(layout.scale.factor().is_finite());
    assert!(layout.scale.factor() > 0.0);
}

#[test]
fn sibling_units_sum_to_their_parent() {
    let layout = Layout::generate(&small_tree(), LayoutSettings::default()).unwrap();
    for node in layout.registry.values() {
        if node.children.is_empty() {
            continue;
        }
        let own = node.position.as_ref().unwrap().units;
        let child_sum: f64 = node
            .children
            .iter()
            .map(|c| layout.node(c).unwrap().position.as_ref().unwrap().units)
            .sum();
        assert!((child_sum - own).abs() < 1e-8);
    }
}

#[test]
fn empty_tree_is_a_valid_empty_layout() {
    let nodes: Vec<ProfileNode> = Vec::new();
    let layout = Layout::generate(&nodes, LayoutSettings::default()).unwrap();
    assert!(layout.registry.is_empty());
    assert!(layout.leaf_order.is_empty());
    assert!(layout.connections.is_empty());
    assert_eq!(layout.scale.factor(), 1.0);
}

#[test]
fn single_node_sits_at_the_top_center() {
    let nodes = vec![profile("a", None, &[], 5.0, 5.0)];
    let layout = Layout::generate(&nodes, LayoutSettings::default()).unwrap();

    let position = layout.node("a").unwrap().position.unwrap();
    assert_eq!(position.x, 500.0);
    let radius = layout.scale.circle_radius(5.0);
    assert!((position.y - (30.0 + radius)).abs() < 1e-9);
    assert_eq!(layout.leaf_order, vec!["a"]);
}

#[test]
fn sub_layout_hangs_off_a_shortcut() {
    let nodes = vec![
        profile("a", Some("outside"), &["b"], 10.0, 5.0),
        profile("b", Some("a"), &[], 20.0, 5.0),
    ];
    let settings = LayoutSettings::default();
    let layout = Layout::generate_sub(
        &nodes,
        ShortcutOrigin {
            origin: "outside".to_string(),
        },
        settings.clone(),
    )
    .unwrap();

    let shortcut = layout.node("outside").unwrap();
    assert!(shortcut.kind.is_shortcut());
    assert!(shortcut.is_root());
    assert_eq!(shortcut.children, vec!["a"]);

    let inbound = layout.node("a").unwrap().inbound.as_ref().unwrap();
    assert_eq!(inbound.origin, "outside");
    assert_eq!(inbound.visible_length, settings.shortcut_length);

    for node in layout.registry.values() {
        let position = node.position.as_ref().unwrap();
        assert!(position.x.is_finite() && position.y.is_finite());
    }
}

#[test]
fn collapsing_bounds_the_node_count() {
    let mut nodes = vec![profile(
        "root",
        None,
        &["t1", "t2", "t3", "t4", "t5", "t6", "t7", "t8", "t9", "t10", "big"],
        0.0,
        1.0,
    )];
    for i in 1..=10 {
        nodes.push(profile(&format!("t{i}"), Some("root"), &[], 0.001, 0.0));
    }
    nodes.push(profile("big", Some("root"), &[], 1000.0, 0.0));

    let settings = LayoutSettings {
        collapse_nodes: true,
        ..Default::default()
    };
    let layout = Layout::generate(&nodes, settings).unwrap();

    assert_eq!(layout.registry.len(), 3);
    assert!(layout.node("root").is_some());
    assert!(layout.node("big").is_some());
    assert!(layout.registry.keys().any(|id| id.starts_with('x')));
    for node in layout.registry.values() {
        assert!(node.position.is_some());
        match &node.kind {
            NodeKind::Collapsed { members } => assert_eq!(members.len(), 10),
            NodeKind::Aggregate => {}
            NodeKind::Shortcut { .. } => panic!("no shortcuts in this layout"),
        }
    }
}

#[test]
fn repeated_generation_is_deterministic() {
    let a = Layout::generate(&small_tree(), LayoutSettings::default()).unwrap();
    let b = Layout::generate(&small_tree(), LayoutSettings::default()).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn input_permutation_does_not_change_the_result() {
    let forward = small_tree();
    let mut shuffled = forward.clone();
    shuffled.reverse();

    let a = Layout::generate(&forward, LayoutSettings::default()).unwrap();
    let b = Layout::generate(&shuffled, LayoutSettings::default()).unwrap();

    assert_eq!(a.leaf_order, b.leaf_order);
    for (id, node) in a.registry.iter() {
        let other = b.node(id).unwrap();
        assert_eq!(node.position, other.position);
        assert_eq!(node.stem, other.stem);
    }
}

#[test]
fn contract_violations_are_rejected() {
    let negative = vec![profile("a", None, &[], -1.0, 0.0)];
    assert!(matches!(
        Layout::generate(&negative, LayoutSettings::default()),
        Err(Error::InvalidNumber { .. })
    ));

    let orphan = vec![profile("a", Some("ghost"), &[], 1.0, 0.0)];
    assert!(matches!(
        Layout::generate(&orphan, LayoutSettings::default()),
        Err(Error::UnknownParent { .. })
    ));

    let duplicate = vec![
        profile("a", None, &[], 1.0, 0.0),
        profile("a", None, &[], 2.0, 0.0),
    ];
    assert!(matches!(
        Layout::generate(&duplicate, LayoutSettings::default()),
        Err(Error::DuplicateId { .. })
    ));

    let zero_canvas = LayoutSettings {
        svg_width: 0.0,
        svg_height: 0.0,
        ..Default::default()
    };
    let ok = vec![profile("a", None, &[], 1.0, 0.0)];
    assert!(matches!(
        Layout::generate(&ok, zero_canvas),
        Err(Error::InvalidNumber { .. })
    ));
}
