//! Error types for viewport, scene and sidebar operations.
//!
//! Every variant except [`ViewportError::InvariantViolation`] is a validation
//! failure raised before any state is touched, so a rejected operation leaves
//! the diagram exactly as it was.

use thiserror::Error;

use super::types::{EdgeId, NodeId};

/// The error type for diagram canvas operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewportError {
	/// The argument is not the node or edge variant the operation accepts.
	#[error("invalid entity kind for `{id}`: expected {expected}, found {found}")]
	InvalidEntityKind {
		id: String,
		expected: String,
		found: String,
	},

	#[error("node `{0}` is already part of the diagram")]
	DuplicateNode(NodeId),

	#[error("edge `{0}` is already part of the diagram")]
	DuplicateEdge(EdgeId),

	#[error("unknown node `{0}`")]
	UnknownNode(NodeId),

	#[error("unknown edge `{0}`")]
	UnknownEdge(EdgeId),

	#[error("node `{0}` is not in the sidebar list")]
	NotExcluded(NodeId),

	#[error("node `{0}` is not on the canvas")]
	NotOnCanvas(NodeId),

	/// Scene membership or edge endpoint consistency is broken. Never expected
	/// in correct usage; surfaced to the host instead of being repaired.
	#[error("membership invariant violated: {0}")]
	InvariantViolation(String),
}

impl ViewportError {
	/// Whether the error reports a broken internal invariant rather than a
	/// rejected request.
	pub fn is_fatal(&self) -> bool {
		matches!(self, ViewportError::InvariantViolation(_))
	}

	/// Status bar text. Broken invariants are prefixed so they read differently
	/// from a rejected request.
	pub fn notice(&self) -> String {
		if self.is_fatal() {
			format!("internal error: {}", self)
		} else {
			self.to_string()
		}
	}
}
