//! The sidebar list of vertices kept off the canvas, and the moves between it
//! and the scene.
//!
//! The reconciler owns the relation from node id to sidebar entry. A node's own
//! "put me back on the canvas" affordance is answered by looking the id up here
//! rather than through a callback stored on the node.

use indexmap::IndexMap;
use log::{debug, info};

use super::error::ViewportError;
use super::scene::SceneGraph;
use super::types::{EntityKind, Node, NodeId, Point, Vertex};

/// Why a vertex sits in the sidebar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExclusionOrigin {
	/// The diagram source delivered it excluded.
	Loaded,
	/// Excluded individually by the user.
	User,
	/// Swept out by an exclude-all of unconnected vertices.
	UnconnectedSweep,
}

impl ExclusionOrigin {
	/// Whether the vertex belongs to the unconnected-vertices list rather than
	/// the excluded list.
	pub fn is_unconnected_sweep(self) -> bool {
		matches!(self, ExclusionOrigin::UnconnectedSweep)
	}
}

/// A vertex held in the sidebar list.
#[derive(Clone, Debug, PartialEq)]
pub struct SidebarEntry {
	/// The vertex as it left the canvas.
	pub vertex: Vertex,
	/// How it got here.
	pub origin: ExclusionOrigin,
}

/// Excluded-vertex list and the include/exclude operations.
#[derive(Clone, Debug, Default)]
pub struct SidebarReconciler {
	entries: IndexMap<NodeId, SidebarEntry>,
}

fn vertex_only(node: &Node) -> Result<(), ViewportError> {
	match node {
		Node::Vertex(_) => Ok(()),
		Node::Group(g) => Err(ViewportError::InvalidEntityKind {
			id: g.id.to_string(),
			expected: EntityKind::Vertex.to_string(),
			found: EntityKind::Group.to_string(),
		}),
	}
}

impl SidebarReconciler {
	/// An empty sidebar.
	pub fn new() -> Self {
		Self::default()
	}

	/// Whether the sidebar currently owns the node. Node-level actions query
	/// this to decide between include and exclude.
	pub fn is_owned(&self, id: &NodeId) -> bool {
		self.entries.contains_key(id)
	}

	/// The entry for `id`, if the sidebar owns it.
	pub fn entry(&self, id: &NodeId) -> Option<&SidebarEntry> {
		self.entries.get(id)
	}

	/// Entries in the order they entered the sidebar.
	pub fn entries(&self) -> impl Iterator<Item = &SidebarEntry> {
		self.entries.values()
	}

	/// Owned ids in list order.
	pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
		self.entries.keys()
	}

	/// Number of vertices in the sidebar.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Puts a node straight into the sidebar, bypassing the canvas. Used by the
	/// diagram loader for nodes flagged as excluded.
	pub fn add_excluded(&mut self, node: Node, origin: ExclusionOrigin) -> Result<(), ViewportError> {
		vertex_only(&node)?;
		if self.entries.contains_key(node.id()) {
			return Err(ViewportError::DuplicateNode(node.id().clone()));
		}
		if let Node::Vertex(mut vertex) = node {
			vertex.is_excluded = true;
			self.entries
				.insert(vertex.id.clone(), SidebarEntry { vertex, origin });
		}
		Ok(())
	}

	/// Drops a node from the sidebar without placing it anywhere.
	pub fn forget(&mut self, id: &NodeId) -> Option<SidebarEntry> {
		self.entries.shift_remove(id)
	}

	/// Moves a vertex from the sidebar onto the canvas. `place` picks its
	/// position from the scene it is about to join.
	pub fn include<P>(
		&mut self,
		scene: &mut SceneGraph,
		id: &NodeId,
		place: P,
	) -> Result<(), ViewportError>
	where
		P: FnOnce(&SceneGraph, &Vertex) -> Point,
	{
		if let Some(node) = scene.node(id) {
			vertex_only(node)?;
			return Err(if self.is_owned(id) {
				ViewportError::InvariantViolation(format!(
					"node `{}` is both on the canvas and in the sidebar",
					id
				))
			} else {
				ViewportError::NotExcluded(id.clone())
			});
		}
		let Some(entry) = self.entries.get(id) else {
			return Err(ViewportError::NotExcluded(id.clone()));
		};
		let center = place(&*scene, &entry.vertex);

		let Some(entry) = self.entries.shift_remove(id) else {
			return Err(ViewportError::NotExcluded(id.clone()));
		};
		let mut vertex = entry.vertex;
		vertex.is_excluded = false;
		if center.is_finite() {
			vertex.center = center;
		}
		scene.add_node(vertex.into())?;
		scene.redraw_edges();
		debug!("diagram-canvas: {} included from sidebar", id);
		Ok(())
	}

	/// Moves a vertex from the canvas into the sidebar. Its edges stay tracked
	/// but stop rendering.
	pub fn exclude(
		&mut self,
		scene: &mut SceneGraph,
		id: &NodeId,
		origin: ExclusionOrigin,
	) -> Result<(), ViewportError> {
		match scene.node(id) {
			None if self.is_owned(id) => return Err(ViewportError::NotOnCanvas(id.clone())),
			None => return Err(ViewportError::UnknownNode(id.clone())),
			Some(node) => vertex_only(node)?,
		}
		if self.is_owned(id) {
			return Err(ViewportError::InvariantViolation(format!(
				"node `{}` is both on the canvas and in the sidebar",
				id
			)));
		}

		if let Node::Vertex(mut vertex) = scene.remove_node(id)? {
			vertex.is_excluded = true;
			self.entries
				.insert(id.clone(), SidebarEntry { vertex, origin });
		}
		scene.redraw_edges();
		debug!("diagram-canvas: {} excluded to sidebar", id);
		Ok(())
	}

	/// Includes every vertex in the sidebar, iterating over a snapshot of the
	/// list. Returns the ids moved.
	pub fn include_all<P>(
		&mut self,
		scene: &mut SceneGraph,
		mut place: P,
	) -> Result<Vec<NodeId>, ViewportError>
	where
		P: FnMut(&SceneGraph, &Vertex) -> Point,
	{
		let snapshot: Vec<NodeId> = self.entries.keys().cloned().collect();
		for id in &snapshot {
			self.include(scene, id, &mut place)?;
		}
		info!("diagram-canvas: included {} vertices", snapshot.len());
		Ok(snapshot)
	}

	/// Excludes exactly the on-canvas vertices that are unconnected when the
	/// call starts. Returns the ids moved.
	pub fn exclude_all(&mut self, scene: &mut SceneGraph) -> Result<Vec<NodeId>, ViewportError> {
		let snapshot: Vec<NodeId> = scene
			.vertices()
			.filter(|vertex| scene.is_unconnected(&vertex.id))
			.map(|vertex| vertex.id.clone())
			.collect();
		for id in &snapshot {
			self.exclude(scene, id, ExclusionOrigin::UnconnectedSweep)?;
		}
		info!("diagram-canvas: excluded {} unconnected vertices", snapshot.len());
		Ok(snapshot)
	}

	/// Fails if any node is simultaneously on the canvas and in the sidebar.
	pub fn verify(&self, scene: &SceneGraph) -> Result<(), ViewportError> {
		match self.entries.keys().find(|id| scene.contains(id)) {
			Some(id) => Err(ViewportError::InvariantViolation(format!(
				"node `{}` is both on the canvas and in the sidebar",
				id
			))),
			None => Ok(()),
		}
	}

	/// Empties the sidebar.
	pub fn reset(&mut self) {
		self.entries.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::viewport::types::{Edge, EdgeId, Group};

	fn keep(_: &SceneGraph, vertex: &Vertex) -> Point {
		vertex.center
	}

	fn setup() -> (SceneGraph, SidebarReconciler) {
		let mut scene = SceneGraph::new();
		for id in ["a", "b", "c", "d"] {
			scene
				.add_node(Vertex::new(id, Point::default()).into())
				.unwrap();
		}
		scene
			.add_node(Group::new("g", Point::default()).into())
			.unwrap();
		scene.add_edge(Edge::new("ab", Some("a"), Some("b"))).unwrap();
		(scene, SidebarReconciler::new())
	}

	fn id(s: &str) -> NodeId {
		NodeId::new(s)
	}

	#[test]
	fn test_exclude_then_include_restores_membership() {
		let (mut scene, mut sidebar) = setup();
		sidebar
			.exclude(&mut scene, &id("c"), ExclusionOrigin::User)
			.unwrap();
		assert!(!scene.contains(&id("c")));
		assert!(sidebar.is_owned(&id("c")));
		assert!(sidebar.entry(&id("c")).unwrap().vertex.is_excluded);

		sidebar.include(&mut scene, &id("c"), keep).unwrap();
		assert!(scene.contains(&id("c")));
		assert!(!sidebar.is_owned(&id("c")));
		assert!(!scene.node(&id("c")).unwrap().is_excluded());
		sidebar.verify(&scene).unwrap();
	}

	#[test]
	fn test_edge_visibility_follows_exclusion() {
		let (mut scene, mut sidebar) = setup();
		let ab = EdgeId::new("ab");
		assert!(scene.surface().has_edge(&ab));

		sidebar
			.exclude(&mut scene, &id("b"), ExclusionOrigin::User)
			.unwrap();
		assert!(!scene.surface().has_edge(&ab));
		assert!(scene.edge(&ab).is_some());

		sidebar.include(&mut scene, &id("b"), keep).unwrap();
		assert!(scene.surface().has_edge(&ab));
	}

	#[test]
	fn test_groups_are_rejected_without_mutation() {
		let (mut scene, mut sidebar) = setup();
		let err = sidebar
			.exclude(&mut scene, &id("g"), ExclusionOrigin::User)
			.unwrap_err();
		assert!(matches!(err, ViewportError::InvalidEntityKind { .. }));
		assert!(scene.contains(&id("g")));
		assert!(sidebar.is_empty());

		let err = sidebar
			.add_excluded(Group::new("h", Point::default()).into(), ExclusionOrigin::Loaded)
			.unwrap_err();
		assert!(matches!(err, ViewportError::InvalidEntityKind { .. }));
		assert!(sidebar.is_empty());

		let err = sidebar.include(&mut scene, &id("g"), keep).unwrap_err();
		assert!(matches!(err, ViewportError::InvalidEntityKind { .. }));
	}

	#[test]
	fn test_wrong_side_requests_are_rejected() {
		let (mut scene, mut sidebar) = setup();
		assert_eq!(
			sidebar.include(&mut scene, &id("a"), keep).unwrap_err(),
			ViewportError::NotExcluded(id("a"))
		);
		assert_eq!(
			sidebar.include(&mut scene, &id("zz"), keep).unwrap_err(),
			ViewportError::NotExcluded(id("zz"))
		);
		sidebar
			.exclude(&mut scene, &id("c"), ExclusionOrigin::User)
			.unwrap();
		assert_eq!(
			sidebar
				.exclude(&mut scene, &id("c"), ExclusionOrigin::User)
				.unwrap_err(),
			ViewportError::NotOnCanvas(id("c"))
		);
	}

	#[test]
	fn test_exclude_all_moves_only_unconnected_vertices() {
		let (mut scene, mut sidebar) = setup();
		let moved = sidebar.exclude_all(&mut scene).unwrap();

		assert_eq!(moved, vec![id("c"), id("d")]);
		assert!(scene.contains(&id("a")));
		assert!(scene.contains(&id("b")));
		// groups never take part
		assert!(scene.contains(&id("g")));
		assert!(
			sidebar
				.entries()
				.all(|e| e.origin == ExclusionOrigin::UnconnectedSweep)
		);
		sidebar.verify(&scene).unwrap();
	}

	#[test]
	fn test_exclude_all_keeps_vertices_with_hidden_neighbours() {
		let (mut scene, mut sidebar) = setup();
		// an edge to a node that is not on the canvas still counts
		scene.add_edge(Edge::new("cz", Some("c"), Some("z"))).unwrap();
		let moved = sidebar.exclude_all(&mut scene).unwrap();
		assert_eq!(moved, vec![id("d")]);
		assert!(scene.contains(&id("c")));
	}

	#[test]
	fn test_include_all_empties_the_sidebar() {
		let (mut scene, mut sidebar) = setup();
		sidebar.exclude_all(&mut scene).unwrap();
		let moved = sidebar
			.include_all(&mut scene, |_, _| Point::new(7.0, 7.0))
			.unwrap();
		assert_eq!(moved, vec![id("c"), id("d")]);
		assert!(sidebar.is_empty());
		assert_eq!(
			scene.node(&id("d")).map(Node::center),
			Some(Point::new(7.0, 7.0))
		);
	}

	#[test]
	fn test_add_excluded_marks_vertex() {
		let mut sidebar = SidebarReconciler::new();
		sidebar
			.add_excluded(Vertex::new("x", Point::default()).into(), ExclusionOrigin::Loaded)
			.unwrap();
		let entry = sidebar.entry(&id("x")).unwrap();
		assert!(entry.vertex.is_excluded);
		assert_eq!(entry.origin, ExclusionOrigin::Loaded);
		assert_eq!(
			sidebar
				.add_excluded(Vertex::new("x", Point::default()).into(), ExclusionOrigin::Loaded)
				.unwrap_err(),
			ViewportError::DuplicateNode(id("x"))
		);
	}
}
