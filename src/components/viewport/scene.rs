//! Registry of the nodes and edges currently placed on the canvas.
//!
//! The scene keeps a unified node list plus typed vertex and group sub-lists,
//! all in insertion order, and a [`Surface`] recording what is attached to each
//! of the three drawing layers. The canvas painter only draws what the surface
//! holds; tracked edges whose endpoints are missing or excluded stay in the
//! edge list but off the surface.

use indexmap::IndexMap;
use log::debug;

use super::error::ViewportError;
use super::types::{Edge, EdgeId, Group, Node, NodeId, Point, Vertex};

/// The three logical drawing layers. No z-order between them is implied
/// beyond insertion order within each layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
	/// Edge lines and arrowheads.
	Edges,
	/// Vertex shapes.
	Vertices,
	/// Group shapes.
	Groups,
}

impl Node {
	/// The layer this node renders into.
	pub fn layer(&self) -> Layer {
		match self {
			Node::Vertex(_) => Layer::Vertices,
			Node::Group(_) => Layer::Groups,
		}
	}
}

/// What is currently attached to each drawing layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Surface {
	edges: Vec<EdgeId>,
	vertices: Vec<NodeId>,
	groups: Vec<NodeId>,
}

impl Surface {
	/// Edges attached to the edges layer.
	pub fn edges(&self) -> &[EdgeId] {
		&self.edges
	}

	/// Vertices attached to the vertices layer.
	pub fn vertices(&self) -> &[NodeId] {
		&self.vertices
	}

	/// Groups attached to the groups layer.
	pub fn groups(&self) -> &[NodeId] {
		&self.groups
	}

	/// Whether the edge is drawn.
	pub fn has_edge(&self, id: &EdgeId) -> bool {
		self.edges.contains(id)
	}

	/// Whether the node is drawn on either node layer.
	pub fn has_node(&self, id: &NodeId) -> bool {
		self.vertices.contains(id) || self.groups.contains(id)
	}

	/// Number of drawables attached to `layer`.
	pub fn len(&self, layer: Layer) -> usize {
		match layer {
			Layer::Edges => self.edges.len(),
			Layer::Vertices => self.vertices.len(),
			Layer::Groups => self.groups.len(),
		}
	}

	fn attach_node(&mut self, node: &Node) {
		match node {
			Node::Vertex(v) => self.vertices.push(v.id.clone()),
			Node::Group(g) => self.groups.push(g.id.clone()),
		}
	}

	fn detach_node(&mut self, id: &NodeId) {
		self.vertices.retain(|v| v != id);
		self.groups.retain(|g| g != id);
	}

	fn clear(&mut self) {
		self.edges.clear();
		self.vertices.clear();
		self.groups.clear();
	}
}

/// The on-canvas scene.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
	nodes: IndexMap<NodeId, Node>,
	vertices: Vec<NodeId>,
	groups: Vec<NodeId>,
	edges: IndexMap<EdgeId, Edge>,
	surface: Surface,
	generation: u64,
}

impl SceneGraph {
	/// An empty scene.
	pub fn new() -> Self {
		Self::default()
	}

	/// Bumped by every [`SceneGraph::reset`]. Layout tasks started under an
	/// older generation are stale.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// What is currently attached to the drawing layers.
	pub fn surface(&self) -> &Surface {
		&self.surface
	}

	/// Adds a node and attaches it to its layer. A duplicate id is rejected
	/// without touching the scene.
	pub fn add_node(&mut self, node: Node) -> Result<(), ViewportError> {
		let id = node.id().clone();
		if self.nodes.contains_key(&id) {
			return Err(ViewportError::DuplicateNode(id));
		}

		match &node {
			Node::Vertex(_) => self.vertices.push(id.clone()),
			Node::Group(_) => self.groups.push(id.clone()),
		}
		self.surface.attach_node(&node);
		self.nodes.insert(id.clone(), node);
		debug!("diagram-canvas: node {} placed on canvas", id);

		if self.edges.values().any(|edge| edge.touches(&id)) {
			self.redraw_edges();
		}
		Ok(())
	}

	/// Removes the node from every list and from the surface. Edges that
	/// reference it are kept but stop rendering.
	pub fn remove_node(&mut self, id: &NodeId) -> Result<Node, ViewportError> {
		let node = self
			.nodes
			.shift_remove(id)
			.ok_or_else(|| ViewportError::UnknownNode(id.clone()))?;

		match &node {
			Node::Vertex(_) => self.vertices.retain(|v| v != id),
			Node::Group(_) => self.groups.retain(|g| g != id),
		}
		self.surface.detach_node(id);
		debug!("diagram-canvas: node {} removed from canvas", id);

		if self.edges.values().any(|edge| edge.touches(id)) {
			self.redraw_edges();
		}
		Ok(node)
	}

	/// Tracks an edge. It is drawn only while both endpoints are on the canvas.
	pub fn add_edge(&mut self, edge: Edge) -> Result<(), ViewportError> {
		if self.edges.contains_key(&edge.id) {
			return Err(ViewportError::DuplicateEdge(edge.id));
		}
		if self.is_edge_eligible(&edge) {
			self.surface.edges.push(edge.id.clone());
		}
		self.edges.insert(edge.id.clone(), edge);
		Ok(())
	}

	/// Detaches and forgets an edge.
	pub fn remove_edge(&mut self, id: &EdgeId) -> Result<Edge, ViewportError> {
		let edge = self
			.edges
			.shift_remove(id)
			.ok_or_else(|| ViewportError::UnknownEdge(id.clone()))?;
		self.surface.edges.retain(|e| e != id);
		Ok(edge)
	}

	/// An edge renders iff both endpoints are on the canvas and not excluded.
	pub fn is_edge_eligible(&self, edge: &Edge) -> bool {
		let placed = |endpoint: &Option<NodeId>| {
			endpoint
				.as_ref()
				.and_then(|id| self.nodes.get(id))
				.is_some_and(|node| !node.is_excluded())
		};
		placed(&edge.from) && placed(&edge.to)
	}

	/// Re-evaluates every tracked edge and rebuilds the edges layer.
	pub fn redraw_edges(&mut self) {
		let eligible: Vec<EdgeId> = self
			.edges
			.values()
			.filter(|edge| self.is_edge_eligible(edge))
			.map(|edge| edge.id.clone())
			.collect();
		debug!(
			"diagram-canvas: {} of {} edges rendered",
			eligible.len(),
			self.edges.len()
		);
		self.surface.edges = eligible;
	}

	/// True iff no tracked edge references the node.
	pub fn is_unconnected(&self, id: &NodeId) -> bool {
		!self.edges.values().any(|edge| edge.touches(id))
	}

	/// Whether the node is on the canvas.
	pub fn contains(&self, id: &NodeId) -> bool {
		self.nodes.contains_key(id)
	}

	/// Looks up an on-canvas node.
	pub fn node(&self, id: &NodeId) -> Option<&Node> {
		self.nodes.get(id)
	}

	/// Mutable access for label edits. Use [`SceneGraph::set_center`] to move
	/// a node so non-finite positions are rejected.
	pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
		self.nodes.get_mut(id)
	}

	/// Looks up a tracked edge.
	pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
		self.edges.get(id)
	}

	/// Moves a node. Returns false for unknown ids and non-finite positions.
	pub fn set_center(&mut self, id: &NodeId, center: Point) -> bool {
		if !center.is_finite() {
			return false;
		}
		match self.nodes.get_mut(id) {
			Some(node) => {
				node.set_center(center);
				true
			}
			None => false,
		}
	}

	/// All nodes in insertion order.
	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.nodes.values()
	}

	/// Ids of all nodes in insertion order.
	pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
		self.nodes.keys()
	}

	/// Vertices in insertion order.
	pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
		self.vertices
			.iter()
			.filter_map(|id| match self.nodes.get(id) {
				Some(Node::Vertex(v)) => Some(v),
				_ => None,
			})
	}

	/// Groups in insertion order.
	pub fn groups(&self) -> impl Iterator<Item = &Group> {
		self.groups.iter().filter_map(|id| match self.nodes.get(id) {
			Some(Node::Group(g)) => Some(g),
			_ => None,
		})
	}

	/// Tracked edges in insertion order, drawn or not.
	pub fn edges(&self) -> impl Iterator<Item = &Edge> {
		self.edges.values()
	}

	/// Number of on-canvas nodes.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Number of tracked edges.
	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	/// Centers of the on-canvas neighbours of `id`, reached through any
	/// tracked edge.
	pub fn neighbour_centers(&self, id: &NodeId) -> Vec<Point> {
		self.edges
			.values()
			.filter_map(|edge| match (&edge.from, &edge.to) {
				(Some(from), Some(to)) if from == id => Some(to),
				(Some(from), Some(to)) if to == id => Some(from),
				_ => None,
			})
			.filter_map(|other| self.nodes.get(other))
			.map(Node::center)
			.collect()
	}

	/// Clears every list and the surface, and invalidates in-flight layout runs.
	pub fn reset(&mut self) {
		self.nodes.clear();
		self.vertices.clear();
		self.groups.clear();
		self.edges.clear();
		self.surface.clear();
		self.generation += 1;
		debug!("diagram-canvas: scene reset (generation {})", self.generation);
	}
}
