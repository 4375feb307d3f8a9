//! The editor context object.
//!
//! `DiagramState` owns the camera, the scene, the layout engine, the sidebar
//! and the session roster, and is the one place operations are orchestrated:
//! mutate, schedule layout, let the camera refresh floaters, re-render edges.
//! The host component keeps it behind an `Rc<RefCell<_>>` shared by its DOM
//! closures.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexSet;
use log::{debug, error, info};

use super::camera::Camera;
use super::config::EditorConfig;
use super::error::ViewportError;
use super::interaction::{CaptureGuard, InteractionController, WheelOutcome};
use super::layout::{LayoutEngine, LayoutProgress, LayoutTask};
use super::minimap::Minimap;
use super::scene::SceneGraph;
use super::sidebar::{ExclusionOrigin, SidebarReconciler};
use super::types::{DiagramData, Dimensions, Edge, EdgeId, EntityKind, Node, NodeId, Point};

/// One row of a sidebar list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SidebarItem {
	/// Id of the vertex the row stands for.
	pub id: NodeId,
	/// Label, or the id when the vertex has none.
	pub label: String,
	/// How the vertex got into the sidebar; decides which list shows it.
	pub origin: ExclusionOrigin,
}

/// Everything one editing session needs, behind a single owner.
pub struct DiagramState {
	camera: Camera,
	scene: SceneGraph,
	layout: LayoutEngine,
	sidebar: SidebarReconciler,
	interaction: InteractionController,
	/// Every node loaded in the session, on the canvas or in the sidebar.
	roster: IndexSet<NodeId>,
	pending: Option<LayoutTask>,
	minimap: Rc<RefCell<Minimap>>,
}

impl DiagramState {
	/// A fresh session with no diagram loaded.
	pub fn new(config: &EditorConfig, viewport: Dimensions) -> Self {
		let mut camera = Camera::new(&config.zoom, viewport);
		let minimap = Rc::new(RefCell::new(Minimap::new(&config.minimap)));
		camera.floaters_mut().add(&minimap);
		camera.refresh_floaters();

		Self {
			camera,
			scene: SceneGraph::new(),
			layout: LayoutEngine::new(&config.layout),
			sidebar: SidebarReconciler::new(),
			interaction: InteractionController::new(),
			roster: IndexSet::new(),
			pending: None,
			minimap,
		}
	}

	/// The camera.
	pub fn camera(&self) -> &Camera {
		&self.camera
	}

	/// Mutable camera access.
	pub fn camera_mut(&mut self) -> &mut Camera {
		&mut self.camera
	}

	/// The on-canvas scene.
	pub fn scene(&self) -> &SceneGraph {
		&self.scene
	}

	/// The sidebar reconciler.
	pub fn sidebar(&self) -> &SidebarReconciler {
		&self.sidebar
	}

	/// The minimap floater, shared with the camera's registry.
	pub fn minimap(&self) -> &Rc<RefCell<Minimap>> {
		&self.minimap
	}

	/// Number of nodes loaded in the session.
	pub fn component_count(&self) -> usize {
		self.roster.len()
	}

	/// Every sidebar row in the order the vertices left the canvas.
	pub fn sidebar_items(&self) -> Vec<SidebarItem> {
		self.items_where(|_| true)
	}

	/// Rows swept out by [`DiagramState::exclude_all`], shown in the
	/// unconnected-vertices list.
	pub fn unconnected_items(&self) -> Vec<SidebarItem> {
		self.items_where(ExclusionOrigin::is_unconnected_sweep)
	}

	/// Rows excluded on load or by the user, shown in the excluded list.
	pub fn excluded_items(&self) -> Vec<SidebarItem> {
		self.items_where(|origin| !origin.is_unconnected_sweep())
	}

	fn items_where(&self, keep: impl Fn(ExclusionOrigin) -> bool) -> Vec<SidebarItem> {
		self.sidebar
			.entries()
			.filter(|entry| keep(entry.origin))
			.map(|entry| SidebarItem {
				id: entry.vertex.id.clone(),
				label: entry
					.vertex
					.label
					.clone()
					.unwrap_or_else(|| entry.vertex.id.to_string()),
				origin: entry.origin,
			})
			.collect()
	}

	/// The on-canvas vertex closest to a screen point, within `radius` world
	/// units.
	pub fn vertex_at(&self, screen: Point, radius: f64) -> Option<NodeId> {
		let world = self.camera.screen_to_world(screen);
		self.scene
			.vertices()
			.map(|vertex| (vertex, vertex.center.sub(world).hypot()))
			.filter(|(_, dist)| *dist <= radius)
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(vertex, _)| vertex.id.clone())
	}

	/// Whether a chunked layout is waiting for [`DiagramState::tick_layout`].
	pub fn is_layout_pending(&self) -> bool {
		self.pending.is_some()
	}

	/// Replaces the session with `data`. The input is validated as a whole
	/// first; on error the current session is left untouched.
	pub fn load(&mut self, data: DiagramData) -> Result<(), ViewportError> {
		let around = self.camera.screen_to_world(self.camera.viewport().midpoint());
		let unpositioned = data.nodes.iter().filter(|n| n.center.is_none()).count();

		let mut seen = HashSet::new();
		let mut nodes = Vec::with_capacity(data.nodes.len());
		let mut seeded = 0;
		for record in data.nodes {
			let fallback = if record.center.is_none() {
				seeded += 1;
				self.layout.seed_position(seeded - 1, unpositioned, around)
			} else {
				around
			};
			let excluded = record.excluded;
			let node = record.into_node(fallback)?;
			if !seen.insert(node.id().clone()) {
				return Err(ViewportError::DuplicateNode(node.id().clone()));
			}
			if excluded && node.kind() == EntityKind::Group {
				return Err(ViewportError::InvalidEntityKind {
					id: node.id().to_string(),
					expected: EntityKind::Vertex.to_string(),
					found: EntityKind::Group.to_string(),
				});
			}
			nodes.push((node, excluded));
		}

		let mut edge_ids = HashSet::new();
		let mut edges = Vec::with_capacity(data.edges.len());
		for (index, record) in data.edges.into_iter().enumerate() {
			let edge = record.into_edge(index);
			if !edge_ids.insert(edge.id.clone()) {
				return Err(ViewportError::DuplicateEdge(edge.id));
			}
			edges.push(edge);
		}

		self.reset();
		let (node_count, edge_count) = (nodes.len(), edges.len());
		for (node, excluded) in nodes {
			self.roster.insert(node.id().clone());
			if excluded {
				self.sidebar.add_excluded(node, ExclusionOrigin::Loaded)?;
			} else {
				self.scene.add_node(node)?;
			}
		}
		for edge in edges {
			self.scene.add_edge(edge)?;
		}
		self.scene.redraw_edges();
		info!(
			"diagram-canvas: loaded {} nodes ({} in sidebar), {} edges",
			node_count,
			self.sidebar.len(),
			edge_count
		);

		self.verify_membership()?;
		self.schedule_layout();
		self.center();
		Ok(())
	}

	/// Places a node on the canvas, or in the sidebar when it is flagged
	/// excluded.
	pub fn add_node(&mut self, node: Node) -> Result<(), ViewportError> {
		if node.is_excluded() {
			return self.add_excluded(node);
		}
		if self.roster.contains(node.id()) {
			return Err(ViewportError::DuplicateNode(node.id().clone()));
		}
		let id = node.id().clone();
		self.scene.add_node(node)?;
		self.roster.insert(id);
		self.after_membership_change()
	}

	/// Puts a node straight into the sidebar list.
	pub fn add_excluded(&mut self, node: Node) -> Result<(), ViewportError> {
		if self.roster.contains(node.id()) {
			return Err(ViewportError::DuplicateNode(node.id().clone()));
		}
		let id = node.id().clone();
		self.sidebar.add_excluded(node, ExclusionOrigin::Loaded)?;
		self.roster.insert(id);
		self.verify_membership()
	}

	/// Deletes a node from the session wherever it currently lives. Its edges
	/// are kept and stop rendering.
	pub fn remove_node(&mut self, id: &NodeId) -> Result<Node, ViewportError> {
		let node = if self.scene.contains(id) {
			let node = self.scene.remove_node(id)?;
			self.roster.shift_remove(id);
			self.after_membership_change()?;
			node
		} else if let Some(entry) = self.sidebar.forget(id) {
			self.roster.shift_remove(id);
			self.verify_membership()?;
			Node::Vertex(entry.vertex)
		} else {
			return Err(ViewportError::UnknownNode(id.clone()));
		};
		Ok(node)
	}

	/// Tracks a new edge and re-runs the layout.
	pub fn add_edge(&mut self, edge: Edge) -> Result<(), ViewportError> {
		self.scene.add_edge(edge)?;
		self.schedule_layout();
		Ok(())
	}

	/// Forgets an edge and re-runs the layout.
	pub fn remove_edge(&mut self, id: &EdgeId) -> Result<Edge, ViewportError> {
		let edge = self.scene.remove_edge(id)?;
		self.schedule_layout();
		Ok(edge)
	}

	/// Moves a vertex from the sidebar onto the canvas, next to its
	/// neighbours or in the middle of the viewport.
	pub fn include(&mut self, id: &NodeId) -> Result<(), ViewportError> {
		let fallback = self.viewport_center_world();
		let layout = &self.layout;
		self.sidebar.include(&mut self.scene, id, |scene, vertex| {
			layout.placement_for(scene, &vertex.id, fallback)
		})?;
		self.after_membership_change()
	}

	/// Moves an on-canvas vertex into the sidebar. Groups are rejected.
	pub fn exclude(&mut self, id: &NodeId) -> Result<(), ViewportError> {
		self.sidebar
			.exclude(&mut self.scene, id, ExclusionOrigin::User)?;
		self.after_membership_change()
	}

	/// Puts every sidebar vertex back on the canvas.
	pub fn include_all(&mut self) -> Result<Vec<NodeId>, ViewportError> {
		let fallback = self.viewport_center_world();
		let layout = &self.layout;
		let moved = self.sidebar.include_all(&mut self.scene, |scene, vertex| {
			layout.placement_for(scene, &vertex.id, fallback)
		})?;
		if !moved.is_empty() {
			self.after_membership_change()?;
		}
		Ok(moved)
	}

	/// Sends every unconnected on-canvas vertex to the sidebar.
	pub fn exclude_all(&mut self) -> Result<Vec<NodeId>, ViewportError> {
		let moved = self.sidebar.exclude_all(&mut self.scene)?;
		if !moved.is_empty() {
			self.after_membership_change()?;
		}
		Ok(moved)
	}

	/// Centers the on-canvas nodes in the viewport. False when there is nothing
	/// to center.
	pub fn center(&mut self) -> bool {
		self.layout.center(&self.scene, &mut self.camera)
	}

	/// Toolbar zoom in.
	pub fn zoom_in(&mut self) -> bool {
		self.camera.zoom_in()
	}

	/// Toolbar zoom out.
	pub fn zoom_out(&mut self) -> bool {
		self.camera.zoom_out()
	}

	/// User-requested re-layout of the current scene.
	pub fn relayout(&mut self) {
		self.schedule_layout();
	}

	/// Advances a pending chunked layout by one chunk. `None` when no layout
	/// is pending.
	pub fn tick_layout(&mut self) -> Option<LayoutProgress> {
		let task = self.pending.as_mut()?;
		let progress = task.step(&mut self.scene, self.layout.config().chunk_iterations.max(1));
		if progress.is_finished() {
			self.pending = None;
			debug!("diagram-canvas: chunked layout done: {:?}", progress);
		}
		Some(progress)
	}

	/// Drops the whole session and cancels any layout in flight.
	pub fn reset(&mut self) {
		if let Some(mut task) = self.pending.take() {
			task.cancel();
		}
		self.interaction.cancel(&mut self.camera);
		self.scene.reset();
		self.sidebar.reset();
		self.roster.clear();
	}

	/// Follows a resize of the hosting surface.
	pub fn resize(&mut self, viewport: Dimensions) {
		self.camera.resize(viewport);
	}

	/// Shows or hides the minimap. Returns the new visibility.
	pub fn toggle_minimap(&mut self) -> bool {
		self.minimap.borrow_mut().toggle()
	}

	/// Whether a pan is in progress.
	pub fn is_panning(&self) -> bool {
		self.interaction.is_panning()
	}

	/// Starts a pan session holding `capture` until it ends.
	pub fn pointer_down(&mut self, pointer: Point, capture: CaptureGuard) {
		self.interaction
			.pointer_down(&mut self.camera, pointer, capture);
	}

	/// Drags the camera. False when not panning.
	pub fn pointer_move(&mut self, pointer: Point) -> bool {
		self.interaction.pointer_move(&mut self.camera, pointer)
	}

	/// Ends the pan session and releases its listeners.
	pub fn pointer_up(&mut self) -> bool {
		self.interaction.pointer_up(&mut self.scene)
	}

	/// Escape during a pan.
	pub fn cancel_pan(&mut self) -> bool {
		self.interaction.cancel(&mut self.camera)
	}

	/// Wheel zoom; see [`InteractionController::wheel`].
	pub fn wheel(&mut self, pointer: Point, delta_y: f64, ctrl: bool) -> WheelOutcome {
		self.interaction
			.wheel(&mut self.camera, pointer, delta_y, ctrl)
	}

	/// Double-click zoom.
	pub fn double_click(&mut self, pointer: Point) -> bool {
		self.interaction.double_click(&mut self.camera, pointer)
	}

	/// Re-renders edges after the sidebar list scrolled.
	pub fn sidebar_scrolled(&mut self) {
		self.interaction
			.sidebar_scrolled(&mut self.camera, &mut self.scene);
	}

	/// Checks that every node of the session lives in exactly one of the scene
	/// and the sidebar.
	pub fn verify_membership(&self) -> Result<(), ViewportError> {
		let result = self.sidebar.verify(&self.scene).and_then(|()| {
			let misplaced = self.roster.iter().find(|id| {
				self.scene.contains(id) == self.sidebar.is_owned(id)
			});
			if let Some(id) = misplaced {
				return Err(ViewportError::InvariantViolation(format!(
					"node `{}` is neither on the canvas nor in the sidebar",
					id
				)));
			}
			let stray = self
				.scene
				.node_ids()
				.chain(self.sidebar.ids())
				.find(|id| !self.roster.contains(*id));
			match stray {
				Some(id) => Err(ViewportError::InvariantViolation(format!(
					"node `{}` is not part of the loaded diagram",
					id
				))),
				None => Ok(()),
			}
		});
		if let Err(err) = &result {
			error!("diagram-canvas: {}", err);
		}
		result
	}

	fn after_membership_change(&mut self) -> Result<(), ViewportError> {
		self.verify_membership()?;
		self.schedule_layout();
		Ok(())
	}

	fn viewport_center_world(&self) -> Point {
		self.camera.screen_to_world(self.camera.viewport().midpoint())
	}

	/// Small scenes are laid out to completion right away; larger ones get a
	/// pending task advanced by [`DiagramState::tick_layout`].
	fn schedule_layout(&mut self) {
		if let Some(mut task) = self.pending.take() {
			task.cancel();
		}
		let mut task = self.layout.start(&self.scene);
		if self.scene.node_count() <= self.layout.config().sync_node_limit {
			let progress = task.step(&mut self.scene, usize::MAX);
			debug!("diagram-canvas: layout: {:?}", progress);
		} else {
			debug!(
				"diagram-canvas: {} nodes, chunking layout",
				self.scene.node_count()
			);
			self.pending = Some(task);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::viewport::types::{EdgeRecord, NodeRecord, Vertex};

	fn placed(id: &str, x: f64, y: f64) -> NodeRecord {
		NodeRecord {
			center: Some(Point::new(x, y)),
			..record(id, false)
		}
	}

	/// Runs any pending chunked layout to the end.
	fn settle(state: &mut DiagramState) {
		while state.tick_layout().is_some() {}
		assert!(!state.is_layout_pending());
	}

	fn record(id: &str, excluded: bool) -> NodeRecord {
		NodeRecord {
			id: id.into(),
			kind: "vertex".into(),
			label: None,
			center: None,
			excluded,
			members: Vec::new(),
		}
	}

	fn edge(from: &str, to: &str) -> EdgeRecord {
		EdgeRecord {
			id: None,
			from: Some(from.into()),
			to: Some(to.into()),
		}
	}

	fn state() -> DiagramState {
		DiagramState::new(&EditorConfig::default(), Dimensions::new(800.0, 600.0))
	}

	fn id(s: &str) -> NodeId {
		NodeId::new(s)
	}

	#[test]
	fn test_load_routes_excluded_nodes_to_sidebar() {
		let mut state = state();
		state
			.load(DiagramData {
				nodes: vec![record("a", false), record("b", false), record("c", true)],
				edges: vec![edge("a", "b"), edge("a", "c")],
			})
			.unwrap();

		assert_eq!(state.component_count(), 3);
		assert_eq!(state.scene().node_count(), 2);
		assert_eq!(
			state.sidebar_items(),
			vec![SidebarItem {
				id: id("c"),
				label: "c".into(),
				origin: ExclusionOrigin::Loaded,
			}]
		);
		assert_eq!(state.scene().surface().edges().len(), 1);
		state.verify_membership().unwrap();
	}

	#[test]
	fn test_rejected_load_keeps_session() {
		let mut state = state();
		state
			.load(DiagramData {
				nodes: vec![record("a", false)],
				edges: Vec::new(),
			})
			.unwrap();

		let err = state
			.load(DiagramData {
				nodes: vec![record("x", false), record("x", false)],
				edges: Vec::new(),
			})
			.unwrap_err();
		assert_eq!(err, ViewportError::DuplicateNode(id("x")));
		assert!(state.scene().contains(&id("a")));
	}

	#[test]
	fn test_add_node_with_excluded_flag_goes_to_sidebar() {
		let mut state = state();
		let mut vertex = Vertex::new("v", Point::default());
		vertex.is_excluded = true;
		state.add_node(vertex.into()).unwrap();
		assert!(state.sidebar().is_owned(&id("v")));
		assert!(!state.scene().contains(&id("v")));
		assert_eq!(
			state
				.add_node(Vertex::new("v", Point::default()).into())
				.unwrap_err(),
			ViewportError::DuplicateNode(id("v"))
		);
	}

	#[test]
	fn test_remove_node_from_either_side() {
		let mut state = state();
		state
			.load(DiagramData {
				nodes: vec![record("a", false), record("b", true)],
				edges: Vec::new(),
			})
			.unwrap();
		assert!(state.remove_node(&id("a")).is_ok());
		assert!(state.remove_node(&id("b")).unwrap().is_excluded());
		assert_eq!(state.component_count(), 0);
		assert_eq!(
			state.remove_node(&id("a")).unwrap_err(),
			ViewportError::UnknownNode(id("a"))
		);
	}

	#[test]
	fn test_large_scene_layout_is_chunked() {
		let mut config = EditorConfig::default();
		config.layout.sync_node_limit = 2;
		config.layout.chunk_iterations = 5;
		let mut state = DiagramState::new(&config, Dimensions::new(800.0, 600.0));
		state
			.load(DiagramData {
				nodes: vec![record("a", false), record("b", false), record("c", false)],
				edges: vec![edge("a", "b")],
			})
			.unwrap();

		assert!(state.is_layout_pending());
		let mut ticks = 0;
		while let Some(progress) = state.tick_layout() {
			ticks += 1;
			if progress.is_finished() {
				break;
			}
		}
		assert!(ticks >= 1);
		assert!(!state.is_layout_pending());
		assert_eq!(state.tick_layout(), None);
	}

	#[test]
	fn test_reset_cancels_pending_layout() {
		let mut config = EditorConfig::default();
		config.layout.sync_node_limit = 0;
		let mut state = DiagramState::new(&config, Dimensions::new(800.0, 600.0));
		state
			.load(DiagramData {
				nodes: vec![record("a", false)],
				edges: Vec::new(),
			})
			.unwrap();
		assert!(state.is_layout_pending());
		state.reset();
		assert!(!state.is_layout_pending());
		assert_eq!(state.component_count(), 0);
	}

	#[test]
	fn test_vertex_at_uses_world_coordinates() {
		let mut state = state();
		state
			.add_node(Vertex::new("a", Point::new(0.0, 0.0)).into())
			.unwrap();
		state
			.add_node(Vertex::new("b", Point::new(100.0, 0.0)).into())
			.unwrap();
		let a = state.scene().node(&id("a")).unwrap().center();
		let screen = state.camera().world_to_screen(a);

		assert_eq!(state.vertex_at(screen, 5.0), Some(id("a")));
		assert_eq!(
			state.vertex_at(screen.add(Point::new(0.0, 1000.0)), 5.0),
			None
		);
	}

	#[test]
	fn test_minimap_follows_camera() {
		let mut state = state();
		assert!(state.minimap().borrow().view().is_some());
		state.zoom_in();
		assert_eq!(
			state.minimap().borrow().view(),
			Some(state.camera().view())
		);
		assert!(!state.toggle_minimap());
	}

	#[test]
	fn test_edits_schedule_a_layout_pass() {
		let mut config = EditorConfig::default();
		config.layout.sync_node_limit = 0;
		let mut state = DiagramState::new(&config, Dimensions::new(800.0, 600.0));
		state
			.load(DiagramData {
				nodes: vec![record("a", false), record("b", false), record("c", true)],
				edges: Vec::new(),
			})
			.unwrap();
		settle(&mut state);

		state
			.add_edge(Edge::new("ab", Some("a"), Some("b")))
			.unwrap();
		assert!(state.is_layout_pending());
		settle(&mut state);

		state.remove_edge(&EdgeId::new("ab")).unwrap();
		assert!(state.is_layout_pending());
		settle(&mut state);

		state.include(&id("c")).unwrap();
		assert!(state.is_layout_pending());
		state.verify_membership().unwrap();
		settle(&mut state);

		state.exclude(&id("c")).unwrap();
		assert!(state.is_layout_pending());
		state.verify_membership().unwrap();
		settle(&mut state);

		state.relayout();
		assert!(state.is_layout_pending());
		settle(&mut state);

		state
			.add_node(Vertex::new("d", Point::new(10.0, 10.0)).into())
			.unwrap();
		assert!(state.is_layout_pending());
		settle(&mut state);

		state.remove_node(&id("d")).unwrap();
		assert!(state.is_layout_pending());
	}

	#[test]
	fn test_new_edge_pulls_vertices_together() {
		let mut state = state();
		state
			.load(DiagramData {
				nodes: vec![placed("a", -500.0, 0.0), placed("b", 500.0, 0.0)],
				edges: Vec::new(),
			})
			.unwrap();
		assert!(!state.is_layout_pending());
		let gap = |state: &DiagramState| {
			let a = state.scene().node(&id("a")).unwrap().center();
			let b = state.scene().node(&id("b")).unwrap().center();
			b.sub(a).hypot()
		};
		let before = gap(&state);

		state
			.add_edge(Edge::new("ab", Some("a"), Some("b")))
			.unwrap();
		assert!(!state.is_layout_pending());
		let after = gap(&state);
		assert!(after.is_finite());
		assert!(after < before, "gap grew from {before} to {after}");
	}

	#[test]
	fn test_sidebar_lists_split_by_origin() {
		let mut state = state();
		state
			.load(DiagramData {
				nodes: vec![
					record("a", false),
					record("b", false),
					record("lonely", false),
					record("hidden", true),
				],
				edges: vec![edge("a", "b")],
			})
			.unwrap();
		state.exclude(&id("a")).unwrap();
		// `b` still has its tracked edge to `a`, so only `lonely` is swept
		assert_eq!(state.exclude_all().unwrap(), vec![id("lonely")]);

		let ids = |items: Vec<SidebarItem>| items.into_iter().map(|i| i.id).collect::<Vec<_>>();
		assert_eq!(ids(state.excluded_items()), vec![id("hidden"), id("a")]);
		assert_eq!(ids(state.unconnected_items()), vec![id("lonely")]);
		assert_eq!(state.sidebar_items().len(), 3);
		state.verify_membership().unwrap();

		state.include(&id("lonely")).unwrap();
		assert!(state.unconnected_items().is_empty());
		assert_eq!(state.excluded_items().len(), 2);
	}
}
