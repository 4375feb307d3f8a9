//! Minimap overlay: a scaled-down view of the whole diagram with the main
//! viewport's rectangle drawn on top.

use super::camera::CameraView;
use super::config::MinimapConfig;
use super::floaters::Floater;
use super::types::Point;

/// Overview floater tracking the camera.
#[derive(Clone, Debug)]
pub struct Minimap {
	view: Option<CameraView>,
	visible: bool,
	scale: f64,
}

impl Minimap {
	/// Hidden or shown per `config`. A non-positive scale falls back to the default.
	pub fn new(config: &MinimapConfig) -> Self {
		let scale = if config.scale.is_finite() && config.scale > 0.0 {
			config.scale
		} else {
			MinimapConfig::default().scale
		};
		Self {
			view: None,
			visible: config.visible,
			scale,
		}
	}

	/// Last camera view received, `None` until the first refresh.
	pub fn view(&self) -> Option<CameraView> {
		self.view
	}

	/// World-to-minimap scale factor.
	pub fn scale(&self) -> f64 {
		self.scale
	}

	/// Whether the minimap is drawn.
	pub fn is_visible(&self) -> bool {
		self.visible
	}

	/// Flips visibility and returns the new state.
	pub fn toggle(&mut self) -> bool {
		self.visible = !self.visible;
		self.visible
	}

	/// The main viewport's visible world rectangle as `(min, max)`.
	pub fn viewport_rect(&self) -> Option<(Point, Point)> {
		self.view.map(|view| view.visible_world_rect())
	}
}

impl Floater for Minimap {
	fn set_position(&mut self, view: &CameraView) {
		self.view = Some(*view);
	}
}
