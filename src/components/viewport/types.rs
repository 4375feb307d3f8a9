//! Diagram data structures: identities, geometry, nodes and edges.
//!
//! The serde records ([`DiagramData`], [`NodeRecord`], [`EdgeRecord`]) are what
//! the diagram source hands over. They are converted into the closed
//! [`Node`] and [`Edge`] types before anything touches the scene.

use std::fmt;

use serde::Deserialize;

use super::error::ViewportError;

/// A 2-D coordinate, either in world space or in screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// A point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Component-wise sum.
	pub fn add(self, other: Point) -> Self {
		Self::new(self.x + other.x, self.y + other.y)
	}

	/// Component-wise difference.
	pub fn sub(self, other: Point) -> Self {
		Self::new(self.x - other.x, self.y - other.y)
	}

	/// Both components multiplied by `factor`.
	pub fn scale(self, factor: f64) -> Self {
		Self::new(self.x * factor, self.y * factor)
	}

	/// Distance from the origin.
	pub fn hypot(self) -> f64 {
		self.x.hypot(self.y)
	}

	/// Whether both components are finite.
	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

/// Width and height of a rectangle, usually the visible viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Dimensions {
	/// Width.
	pub width: f64,
	/// Height.
	pub height: f64,
}

impl Dimensions {
	/// A rectangle of the given size.
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	/// Midpoint of a rectangle of this size anchored at the origin.
	pub fn midpoint(self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}
}

/// Stable identity of a node within a loaded diagram.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
	/// Wraps a raw id.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// The raw id.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Stable identity of an edge within a loaded diagram.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
	/// Wraps a raw id.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// The raw id.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for EdgeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Discriminant of the entities the core deals with, used in error reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
	/// A [`Vertex`].
	Vertex,
	/// A [`Group`].
	Group,
	/// An [`Edge`].
	Edge,
}

impl fmt::Display for EntityKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			EntityKind::Vertex => "vertex",
			EntityKind::Group => "group",
			EntityKind::Edge => "edge",
		})
	}
}

/// A leaf diagram node.
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
	/// Identity.
	pub id: NodeId,
	/// Text drawn next to the vertex.
	pub label: Option<String>,
	/// World position.
	pub center: Point,
	/// Set while the vertex sits in the sidebar.
	pub is_excluded: bool,
}

impl Vertex {
	/// An unlabelled vertex at `center`.
	pub fn new(id: impl Into<String>, center: Point) -> Self {
		Self {
			id: NodeId::new(id),
			label: None,
			center,
			is_excluded: false,
		}
	}

	/// Builder-style label.
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}
}

/// A container node aggregating member vertices.
///
/// Membership does not imply geometric nesting: a group is positioned like any
/// other node.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
	/// Identity.
	pub id: NodeId,
	/// Text drawn next to the group.
	pub label: Option<String>,
	/// World position.
	pub center: Point,
	/// Member vertex ids.
	pub members: Vec<NodeId>,
	/// Groups never enter the sidebar; adding a group with this set fails.
	pub is_excluded: bool,
}

impl Group {
	/// An empty group at `center`.
	pub fn new(id: impl Into<String>, center: Point) -> Self {
		Self {
			id: NodeId::new(id),
			label: None,
			center,
			members: Vec::new(),
			is_excluded: false,
		}
	}

	/// Builder-style member list.
	pub fn with_members<I, S>(mut self, members: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.members = members.into_iter().map(NodeId::new).collect();
		self
	}
}

/// A diagram node: either a [`Vertex`] or a [`Group`].
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
	/// Leaf node.
	Vertex(Vertex),
	/// Container node.
	Group(Group),
}

impl Node {
	/// Identity.
	pub fn id(&self) -> &NodeId {
		match self {
			Node::Vertex(v) => &v.id,
			Node::Group(g) => &g.id,
		}
	}

	/// Vertex or group.
	pub fn kind(&self) -> EntityKind {
		match self {
			Node::Vertex(_) => EntityKind::Vertex,
			Node::Group(_) => EntityKind::Group,
		}
	}

	/// World position.
	pub fn center(&self) -> Point {
		match self {
			Node::Vertex(v) => v.center,
			Node::Group(g) => g.center,
		}
	}

	/// Moves the node.
	pub fn set_center(&mut self, center: Point) {
		match self {
			Node::Vertex(v) => v.center = center,
			Node::Group(g) => g.center = center,
		}
	}

	/// Label, if any.
	pub fn label(&self) -> Option<&str> {
		match self {
			Node::Vertex(v) => v.label.as_deref(),
			Node::Group(g) => g.label.as_deref(),
		}
	}

	/// Text shown for the node in lists: its label, falling back to its id.
	pub fn display_name(&self) -> &str {
		self.label().unwrap_or(self.id().as_str())
	}

	/// Whether the node is flagged for the sidebar.
	pub fn is_excluded(&self) -> bool {
		match self {
			Node::Vertex(v) => v.is_excluded,
			Node::Group(g) => g.is_excluded,
		}
	}
}

impl From<Vertex> for Node {
	fn from(vertex: Vertex) -> Self {
		Node::Vertex(vertex)
	}
}

impl From<Group> for Node {
	fn from(group: Group) -> Self {
		Node::Group(group)
	}
}

/// A connection between two nodes. Either endpoint may still be unresolved.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	/// Identity.
	pub id: EdgeId,
	/// Source node, if resolved.
	pub from: Option<NodeId>,
	/// Target node, if resolved.
	pub to: Option<NodeId>,
}

impl Edge {
	/// An edge between optional endpoints.
	pub fn new(id: impl Into<String>, from: Option<&str>, to: Option<&str>) -> Self {
		Self {
			id: EdgeId::new(id),
			from: from.map(NodeId::new),
			to: to.map(NodeId::new),
		}
	}

	/// Whether either endpoint refers to `id`.
	pub fn touches(&self, id: &NodeId) -> bool {
		self.from.as_ref() == Some(id) || self.to.as_ref() == Some(id)
	}
}

/// A node as delivered by the diagram source.
#[derive(Clone, Debug, Deserialize)]
pub struct NodeRecord {
	/// Node id.
	pub id: String,
	/// `"vertex"` or `"group"`.
	pub kind: String,
	/// Text drawn next to the node.
	pub label: Option<String>,
	/// Initial world position. Seeded by the loader when absent.
	pub center: Option<Point>,
	/// Start the session in the sidebar instead of on the canvas.
	#[serde(default)]
	pub excluded: bool,
	/// Member vertex ids, groups only.
	#[serde(default)]
	pub members: Vec<String>,
}

impl NodeRecord {
	/// Converts the record into a [`Node`], placing it at `fallback` when the
	/// record carries no position.
	pub fn into_node(self, fallback: Point) -> Result<Node, ViewportError> {
		let center = self.center.filter(|c| c.is_finite()).unwrap_or(fallback);
		match self.kind.as_str() {
			"vertex" => Ok(Node::Vertex(Vertex {
				id: NodeId::new(self.id),
				label: self.label,
				center,
				is_excluded: false,
			})),
			"group" => Ok(Node::Group(Group {
				id: NodeId::new(self.id),
				label: self.label,
				center,
				members: self.members.into_iter().map(NodeId::new).collect(),
				is_excluded: false,
			})),
			other => Err(ViewportError::InvalidEntityKind {
				id: self.id,
				expected: "vertex or group".to_string(),
				found: other.to_string(),
			}),
		}
	}
}

/// An edge as delivered by the diagram source.
#[derive(Clone, Debug, Deserialize)]
pub struct EdgeRecord {
	/// Generated from the endpoints when absent.
	pub id: Option<String>,
	/// Source node id.
	pub from: Option<String>,
	/// Target node id.
	pub to: Option<String>,
}

impl EdgeRecord {
	/// Converts the record, generating an id from the endpoints and `index` when absent.
	pub fn into_edge(self, index: usize) -> Edge {
		let id = self.id.unwrap_or_else(|| {
			format!(
				"{}->{}#{}",
				self.from.as_deref().unwrap_or("?"),
				self.to.as_deref().unwrap_or("?"),
				index
			)
		});
		Edge {
			id: EdgeId::new(id),
			from: self.from.map(NodeId::new),
			to: self.to.map(NodeId::new),
		}
	}
}

/// Complete diagram data: nodes and edges.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DiagramData {
	/// Vertices and groups.
	#[serde(default)]
	pub nodes: Vec<NodeRecord>,
	/// Connections.
	#[serde(default)]
	pub edges: Vec<EdgeRecord>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_record_into_vertex_uses_fallback_center() {
		let record = NodeRecord {
			id: "a".into(),
			kind: "vertex".into(),
			label: Some("A".into()),
			center: None,
			excluded: false,
			members: Vec::new(),
		};
		let node = record.into_node(Point::new(3.0, 4.0)).unwrap();
		assert_eq!(node.kind(), EntityKind::Vertex);
		assert_eq!(node.center(), Point::new(3.0, 4.0));
		assert_eq!(node.display_name(), "A");
	}

	#[test]
	fn test_record_with_unknown_kind_is_rejected() {
		let record = NodeRecord {
			id: "x".into(),
			kind: "interface".into(),
			label: None,
			center: None,
			excluded: false,
			members: Vec::new(),
		};
		let err = record.into_node(Point::default()).unwrap_err();
		assert!(matches!(err, ViewportError::InvalidEntityKind { .. }));
	}

	#[test]
	fn test_diagram_data_deserializes() {
		let json = r#"{
			"nodes": [
				{ "id": "a", "kind": "vertex", "center": { "x": 1.0, "y": 2.0 } },
				{ "id": "g", "kind": "group", "members": ["a"] },
				{ "id": "b", "kind": "vertex", "excluded": true }
			],
			"edges": [ { "from": "a", "to": null } ]
		}"#;
		let data: DiagramData = serde_json::from_str(json).unwrap();
		assert_eq!(data.nodes.len(), 3);
		assert!(data.nodes[2].excluded);
		assert_eq!(data.nodes[1].members, vec!["a".to_string()]);

		let edge = data.edges[0].clone().into_edge(0);
		assert_eq!(edge.id.as_str(), "a->?#0");
		assert_eq!(edge.to, None);
	}

	#[test]
	fn test_edge_touches() {
		let edge = Edge::new("e", Some("a"), None);
		assert!(edge.touches(&NodeId::new("a")));
		assert!(!edge.touches(&NodeId::new("b")));
	}
}
