//! diagram-canvas: interactive diagram editor canvas.
//!
//! This crate provides a WASM-based editor view for diagrams of vertices,
//! groups and edges, with force-directed layout, pan/zoom, a minimap and a
//! sidebar of vertices kept off the canvas.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::viewport::{
	DiagramCanvas, DiagramData, DiagramState, EditorConfig, ViewportError,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("diagram-canvas: logging initialized");
}

/// Parses the JSON text of the `<script>` element with the given id.
fn read_script_json<T: DeserializeOwned>(id: &str) -> Option<T> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match serde_json::from_str::<T>(&json_text) {
		Ok(value) => Some(value),
		Err(e) => {
			warn!("diagram-canvas: failed to parse #{}: {}", id, e);
			None
		}
	}
}

/// Load diagram data from a script element with id="diagram-data".
/// Expected format: JSON with { nodes: [...], edges: [...] }
fn load_diagram_data() -> Option<DiagramData> {
	let data = read_script_json::<DiagramData>("diagram-data")?;
	info!(
		"diagram-canvas: read {} nodes, {} edges",
		data.nodes.len(),
		data.edges.len()
	);
	Some(data)
}

/// Load editor settings from a script element with id="editor-config".
/// Missing sections and fields keep their defaults.
fn load_config() -> EditorConfig {
	read_script_json("editor-config").unwrap_or_default()
}

/// Main application component.
/// Loads the diagram and settings from the DOM and renders the editor.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let diagram = load_diagram_data().unwrap_or_default();
	let diagram_signal = Signal::derive(move || diagram.clone());
	let config = load_config();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Diagram Editor" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-diagram">
			<DiagramCanvas data=diagram_signal config=config fullscreen=true />
			<div class="diagram-overlay">
				<p class="subtitle">
					"Drag to pan. Scroll or double-click to zoom. Right-click a vertex to move it to the sidebar."
				</p>
			</div>
		</div>
	}
}
