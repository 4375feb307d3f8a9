//! Diagram editor canvas.
//!
//! Typed nodes (vertices and groups) and edges are laid out by a force-directed
//! simulation, panned and zoomed through a [`Camera`], and kept in sync with a
//! minimap and a sidebar list of vertices that are not placed on the canvas.
//!
//! The plain-Rust core ([`DiagramState`] and the pieces it orchestrates) is
//! independent of the DOM; [`DiagramCanvas`] hosts it in the browser.
//!
//! # Example
//!
//! ```ignore
//! use diagram_canvas::{DiagramCanvas, DiagramData};
//!
//! let data: DiagramData = serde_json::from_str(r#"{
//!     "nodes": [
//!         { "id": "a", "kind": "vertex", "label": "A" },
//!         { "id": "b", "kind": "vertex", "excluded": true }
//!     ],
//!     "edges": [ { "from": "a", "to": "b" } ]
//! }"#)?;
//!
//! view! { <DiagramCanvas data=data fullscreen=true /> }
//! ```

pub mod camera;
mod component;
pub mod config;
pub mod error;
pub mod floaters;
pub mod interaction;
pub mod layout;
pub mod minimap;
mod render;
pub mod scale;
pub mod scene;
pub mod sidebar;
pub mod state;
pub mod theme;
pub mod types;

pub use camera::{Camera, CameraView, ZoomDirection};
pub use component::DiagramCanvas;
pub use config::{EditorConfig, LayoutConfig, MinimapConfig, ZoomConfig};
pub use error::ViewportError;
pub use floaters::{Floater, FloaterId, FloaterRegistry};
pub use interaction::{CaptureGuard, InteractionController, WheelOutcome};
pub use layout::{LayoutEngine, LayoutProgress, LayoutTask};
pub use minimap::Minimap;
pub use scene::{Layer, SceneGraph, Surface};
pub use sidebar::{ExclusionOrigin, SidebarEntry, SidebarReconciler};
pub use state::{DiagramState, SidebarItem};
pub use theme::Theme;
pub use types::{
	DiagramData, Dimensions, Edge, EdgeId, EdgeRecord, EntityKind, Group, Node, NodeId,
	NodeRecord, Point, Vertex,
};
