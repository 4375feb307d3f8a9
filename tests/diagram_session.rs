//! End-to-end editor sessions driven through `DiagramState`.

use std::cell::Cell;
use std::rc::Rc;

use diagram_canvas::components::viewport::{
	CaptureGuard, DiagramData, DiagramState, Dimensions, Edge, EdgeId, EditorConfig, LayoutEngine,
	LayoutProgress, NodeId, Point, SceneGraph, Vertex, ViewportError,
};
use float_cmp::assert_approx_eq;

fn id(s: &str) -> NodeId {
	NodeId::new(s)
}

fn session(json: &str) -> DiagramState {
	let data: DiagramData = serde_json::from_str(json).unwrap();
	let mut state = DiagramState::new(&EditorConfig::default(), Dimensions::new(800.0, 600.0));
	state.load(data).unwrap();
	state
}

const DIAGRAM: &str = r#"{
	"nodes": [
		{ "id": "api", "kind": "vertex", "label": "API" },
		{ "id": "db", "kind": "vertex", "label": "Database" },
		{ "id": "cache", "kind": "vertex" },
		{ "id": "lonely", "kind": "vertex" },
		{ "id": "orphan", "kind": "vertex" },
		{ "id": "backend", "kind": "group", "members": ["api", "db"] },
		{ "id": "legacy", "kind": "vertex", "excluded": true }
	],
	"edges": [
		{ "id": "api-db", "from": "api", "to": "db" },
		{ "id": "api-cache", "from": "api", "to": "cache" },
		{ "id": "legacy-db", "from": "legacy", "to": "db" },
		{ "id": "dangling", "from": "api" }
	]
}"#;

fn assert_membership(state: &DiagramState) {
	state.verify_membership().unwrap();
	for node in state.scene().nodes() {
		assert!(!state.sidebar().is_owned(node.id()));
	}
}

#[test]
fn load_places_nodes_and_renders_eligible_edges() {
	let state = session(DIAGRAM);

	assert_eq!(state.component_count(), 7);
	assert_eq!(state.scene().node_count(), 6);
	assert_eq!(state.sidebar().len(), 1);
	assert_eq!(state.scene().edge_count(), 4);
	assert_eq!(
		state.scene().surface().edges(),
		&[EdgeId::new("api-db"), EdgeId::new("api-cache")]
	);
	for node in state.scene().nodes() {
		assert!(node.center().is_finite());
	}
	assert_membership(&state);
}

#[test]
fn include_then_exclude_restores_membership() {
	let mut state = session(DIAGRAM);

	state.include(&id("legacy")).unwrap();
	assert!(state.scene().contains(&id("legacy")));
	assert!(state.scene().surface().has_edge(&EdgeId::new("legacy-db")));
	assert_membership(&state);

	state.exclude(&id("legacy")).unwrap();
	assert!(state.sidebar().is_owned(&id("legacy")));
	assert!(!state.scene().surface().has_edge(&EdgeId::new("legacy-db")));
	assert!(state.scene().edge(&EdgeId::new("legacy-db")).is_some());
	assert_membership(&state);
}

#[test]
fn groups_cannot_be_excluded() {
	let mut state = session(DIAGRAM);
	let err = state.exclude(&id("backend")).unwrap_err();
	assert!(matches!(err, ViewportError::InvalidEntityKind { .. }));
	assert!(!err.is_fatal());
	assert!(state.scene().contains(&id("backend")));
	assert_membership(&state);
}

#[test]
fn exclude_all_moves_exactly_the_unconnected_vertices() {
	let mut state = session(DIAGRAM);

	let moved = state.exclude_all().unwrap();
	assert_eq!(moved, vec![id("lonely"), id("orphan")]);
	for connected in ["api", "db", "cache", "backend"] {
		assert!(state.scene().contains(&id(connected)));
	}
	let labels: Vec<String> = state
		.sidebar_items()
		.into_iter()
		.map(|item| item.label)
		.collect();
	assert_eq!(labels, vec!["legacy", "lonely", "orphan"]);

	// nothing left to sweep
	assert!(state.exclude_all().unwrap().is_empty());
	assert_membership(&state);
}

#[test]
fn include_all_empties_the_sidebar() {
	let mut state = session(DIAGRAM);
	state.exclude_all().unwrap();
	let moved = state.include_all().unwrap();
	assert_eq!(moved.len(), 3);
	assert!(state.sidebar().is_empty());
	assert_eq!(state.scene().node_count(), 7);
	assert_membership(&state);
}

#[test]
fn layout_run_terminates_within_the_cap() {
	let mut scene = SceneGraph::new();
	for i in 0..30 {
		scene
			.add_node(Vertex::new(format!("v{i}"), Point::new(0.0, 0.0)).into())
			.unwrap();
	}
	for i in 0..29 {
		let (a, b) = (format!("v{i}"), format!("v{}", i + 1));
		scene
			.add_edge(Edge::new(format!("e{i}"), Some(a.as_str()), Some(b.as_str())))
			.unwrap();
	}

	let config = EditorConfig::default().layout;
	let engine = LayoutEngine::new(&config);
	match engine.run(&mut scene) {
		LayoutProgress::Converged { iterations } | LayoutProgress::CapReached { iterations } => {
			assert!(iterations <= config.max_iterations);
		}
		other => panic!("unexpected progress {other:?}"),
	}
	for node in scene.nodes() {
		assert!(node.center().is_finite());
	}
}

#[test]
fn layout_is_deterministic() {
	let a = session(DIAGRAM);
	let b = session(DIAGRAM);
	for (x, y) in a.scene().nodes().zip(b.scene().nodes()) {
		assert_eq!(x.id(), y.id());
		assert_eq!(x.center(), y.center());
	}
}

#[test]
fn centering_maps_centroid_to_viewport_midpoint() {
	let mut scene = SceneGraph::new();
	for (name, x, y) in [("a", 0.0, 0.0), ("b", 10.0, 0.0), ("c", 5.0, 10.0)] {
		scene
			.add_node(Vertex::new(name, Point::new(x, y)).into())
			.unwrap();
	}
	let mut state = DiagramState::new(&EditorConfig::default(), Dimensions::new(100.0, 100.0));
	let engine = LayoutEngine::new(&EditorConfig::default().layout);
	let camera = state.camera_mut();
	assert!(engine.center(&scene, camera));

	let screen = camera.world_to_screen(Point::new(5.0, 10.0 / 3.0));
	assert_approx_eq!(f64, screen.x, 50.0, epsilon = 1e-9);
	assert_approx_eq!(f64, screen.y, 50.0, epsilon = 1e-9);
}

#[test]
fn center_on_empty_diagram_is_a_no_op() {
	let mut state = DiagramState::new(&EditorConfig::default(), Dimensions::new(100.0, 100.0));
	let before = state.camera().position();
	assert!(!state.center());
	assert_eq!(state.camera().position(), before);
}

#[test]
fn pan_session_leaves_no_listeners_behind() {
	let mut state = session(DIAGRAM);
	let attached = Rc::new(Cell::new(0));
	let capture = {
		attached.set(attached.get() + 1);
		let attached = attached.clone();
		CaptureGuard::new(move || attached.set(attached.get() - 1))
	};

	let start = state.camera().position();
	state.pointer_down(Point::new(100.0, 100.0), capture);
	for step in 1..=10 {
		state.pointer_move(Point::new(100.0 + step as f64, 100.0));
	}
	assert_eq!(state.camera().position(), start.add(Point::new(10.0, 0.0)));
	assert!(state.pointer_up());
	assert_eq!(attached.get(), 0);

	let after = state.camera().position();
	assert!(!state.pointer_move(Point::new(400.0, 400.0)));
	assert_eq!(state.camera().position(), after);
}

#[test]
fn escape_restores_pre_gesture_position() {
	let mut state = session(DIAGRAM);
	let start = state.camera().position();
	state.pointer_down(Point::new(0.0, 0.0), CaptureGuard::detached());
	state.pointer_move(Point::new(80.0, -20.0));
	assert!(state.cancel_pan());
	assert_eq!(state.camera().position(), start);
	assert!(!state.is_panning());
}

#[test]
fn wheel_zoom_keeps_pointer_anchored() {
	let mut state = session(DIAGRAM);
	let pointer = Point::new(321.0, 123.0);
	let before = state.camera().screen_to_world(pointer);

	assert!(state.wheel(pointer, -1.0, true).suppress_default);
	assert!(!state.wheel(pointer, 1.0, false).suppress_default);

	let after = state.camera().screen_to_world(pointer);
	assert_approx_eq!(f64, before.x, after.x, epsilon = 1e-9);
	assert_approx_eq!(f64, before.y, after.y, epsilon = 1e-9);
}

#[test]
fn reload_replaces_the_session() {
	let mut state = session(DIAGRAM);
	let generation = state.scene().generation();
	state
		.load(serde_json::from_str(r#"{ "nodes": [ { "id": "solo", "kind": "vertex" } ] }"#).unwrap())
		.unwrap();

	assert!(state.scene().generation() > generation);
	assert_eq!(state.component_count(), 1);
	assert!(state.sidebar().is_empty());
	assert_eq!(state.scene().edge_count(), 0);
}

#[test]
fn unknown_kind_is_rejected_before_anything_changes() {
	let mut state = session(DIAGRAM);
	let data: DiagramData = serde_json::from_str(
		r#"{ "nodes": [ { "id": "x", "kind": "interface" } ] }"#,
	)
	.unwrap();
	let err = state.load(data).unwrap_err();
	assert!(matches!(err, ViewportError::InvalidEntityKind { .. }));
	assert_eq!(state.component_count(), 7);
}
