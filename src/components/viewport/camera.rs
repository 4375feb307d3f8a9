//! Pan and zoom transform mapping world coordinates to screen coordinates.
//!
//! `screen = world * zoom + position`. The camera owns the
//! [`FloaterRegistry`] so that every effective mutation realigns the overlays
//! synchronously, in registration order.

use log::warn;

use super::config::ZoomConfig;
use super::floaters::FloaterRegistry;
use super::types::{Dimensions, Point};

/// Which way a zoom step goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
	/// Multiply the zoom by the step.
	In,
	/// Divide the zoom by the step.
	Out,
}

/// Snapshot of the camera handed to floaters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
	/// Translation in screen pixels.
	pub position: Point,
	/// Zoom factor `k`.
	pub zoom: f64,
	/// Visible rectangle in screen pixels.
	pub viewport: Dimensions,
}

impl CameraView {
	/// Maps a world point into screen space.
	pub fn world_to_screen(&self, world: Point) -> Point {
		world.scale(self.zoom).add(self.position)
	}

	/// Maps a screen point back into world space.
	pub fn screen_to_world(&self, screen: Point) -> Point {
		screen.sub(self.position).scale(1.0 / self.zoom)
	}

	/// Top-left and bottom-right world corners of the visible rectangle.
	pub fn visible_world_rect(&self) -> (Point, Point) {
		(
			self.screen_to_world(Point::default()),
			self.screen_to_world(Point::new(self.viewport.width, self.viewport.height)),
		)
	}
}

/// The viewport camera.
#[derive(Debug)]
pub struct Camera {
	position: Point,
	zoom: f64,
	viewport: Dimensions,
	config: ZoomConfig,
	floaters: FloaterRegistry,
}

impl Camera {
	/// Creates a camera at the origin with the configured initial zoom.
	pub fn new(config: &ZoomConfig, viewport: Dimensions) -> Self {
		let config = config.sanitized();
		Self {
			position: Point::default(),
			zoom: config.initial,
			viewport,
			config,
			floaters: FloaterRegistry::new(),
		}
	}

	/// Current translation in screen pixels.
	pub fn position(&self) -> Point {
		self.position
	}

	/// Current zoom factor.
	pub fn zoom(&self) -> f64 {
		self.zoom
	}

	/// Size of the hosting surface.
	pub fn viewport(&self) -> Dimensions {
		self.viewport
	}

	/// Snapshot handed to floaters.
	pub fn view(&self) -> CameraView {
		CameraView {
			position: self.position,
			zoom: self.zoom,
			viewport: self.viewport,
		}
	}

	/// Floaters refreshed on every camera change.
	pub fn floaters(&self) -> &FloaterRegistry {
		&self.floaters
	}

	/// Mutable access, for registering floaters.
	pub fn floaters_mut(&mut self) -> &mut FloaterRegistry {
		&mut self.floaters
	}

	/// `screen = world * zoom + position`.
	pub fn world_to_screen(&self, world: Point) -> Point {
		self.view().world_to_screen(world)
	}

	/// Inverse of [`Camera::world_to_screen`].
	pub fn screen_to_world(&self, screen: Point) -> Point {
		self.view().screen_to_world(screen)
	}

	/// Moves the camera so that world content shifts by `delta` screen pixels.
	pub fn pan(&mut self, delta: Point) {
		self.set_position(self.position.add(delta));
	}

	/// Moves the camera to an absolute position.
	pub fn set_position(&mut self, position: Point) {
		if !position.is_finite() {
			warn!(
				"diagram-canvas: ignoring non-finite camera position ({}, {})",
				position.x, position.y
			);
			return;
		}
		if position == self.position {
			return;
		}
		self.position = position;
		self.refresh_floaters();
	}

	/// Sets the zoom factor directly, clamped to the configured range and
	/// anchored at the viewport center.
	pub fn set_zoom(&mut self, zoom: f64) -> bool {
		if !zoom.is_finite() || zoom <= 0.0 {
			warn!("diagram-canvas: ignoring invalid zoom factor {}", zoom);
			return false;
		}
		self.apply_zoom(self.viewport.midpoint(), zoom)
	}

	/// Zooms one step in `direction` keeping the world point under `anchor`
	/// fixed on screen. Returns whether the camera changed.
	pub fn zoom_at(&mut self, anchor: Point, direction: ZoomDirection) -> bool {
		let target = match direction {
			ZoomDirection::In => self.zoom * self.config.step,
			ZoomDirection::Out => self.zoom / self.config.step,
		};
		self.apply_zoom(anchor, target)
	}

	/// One zoom step in, anchored at the viewport center.
	pub fn zoom_in(&mut self) -> bool {
		self.zoom_at(self.viewport.midpoint(), ZoomDirection::In)
	}

	/// One zoom step out, anchored at the viewport center.
	pub fn zoom_out(&mut self) -> bool {
		self.zoom_at(self.viewport.midpoint(), ZoomDirection::Out)
	}

	fn apply_zoom(&mut self, anchor: Point, target: f64) -> bool {
		if !anchor.is_finite() {
			warn!(
				"diagram-canvas: ignoring zoom anchored at non-finite point ({}, {})",
				anchor.x, anchor.y
			);
			return false;
		}
		let new_zoom = target.clamp(self.config.min, self.config.max);
		if new_zoom == self.zoom {
			return false;
		}
		let ratio = new_zoom / self.zoom;
		// anchor - (anchor - position) * ratio keeps screen_to_world(anchor) fixed
		let position = anchor.sub(anchor.sub(self.position).scale(ratio));
		if !position.is_finite() {
			return false;
		}
		self.position = position;
		self.zoom = new_zoom;
		self.refresh_floaters();
		true
	}

	/// Records the hosting surface's new visible rectangle.
	pub fn resize(&mut self, viewport: Dimensions) {
		if !(viewport.width.is_finite() && viewport.height.is_finite()) {
			return;
		}
		self.viewport = viewport;
		self.refresh_floaters();
	}

	/// Repositions every floater from the current state.
	pub fn refresh_floaters(&mut self) {
		let view = self.view();
		self.floaters.refresh_all(&view);
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use float_cmp::assert_approx_eq;

	use super::*;
	use crate::components::viewport::floaters::tests::Probe;

	fn camera() -> Camera {
		Camera::new(&ZoomConfig::default(), Dimensions::new(800.0, 600.0))
	}

	#[test]
	fn test_world_screen_roundtrip() {
		let mut cam = camera();
		cam.set_position(Point::new(40.0, -20.0));
		cam.zoom_at(Point::new(100.0, 100.0), ZoomDirection::In);

		let world = Point::new(12.5, -7.0);
		let back = cam.screen_to_world(cam.world_to_screen(world));
		assert_approx_eq!(f64, back.x, world.x, epsilon = 1e-9);
		assert_approx_eq!(f64, back.y, world.y, epsilon = 1e-9);
	}

	#[test]
	fn test_pan_translates_position() {
		let mut cam = camera();
		cam.pan(Point::new(5.0, -3.0));
		cam.pan(Point::new(1.0, 1.0));
		assert_eq!(cam.position(), Point::new(6.0, -2.0));
	}

	#[test]
	fn test_zoom_is_clamped() {
		let mut cam = camera();
		for _ in 0..200 {
			cam.zoom_at(Point::new(10.0, 10.0), ZoomDirection::In);
		}
		assert_eq!(cam.zoom(), 10.0);
		assert!(!cam.zoom_at(Point::new(10.0, 10.0), ZoomDirection::In));

		for _ in 0..200 {
			cam.zoom_at(Point::new(10.0, 10.0), ZoomDirection::Out);
		}
		assert_eq!(cam.zoom(), 0.1);
		assert!(cam.position().is_finite());
	}

	#[test]
	fn test_non_finite_inputs_are_ignored() {
		let mut cam = camera();
		cam.set_position(Point::new(f64::NAN, 0.0));
		assert_eq!(cam.position(), Point::default());
		assert!(!cam.zoom_at(Point::new(f64::INFINITY, 0.0), ZoomDirection::In));
		assert!(!cam.set_zoom(0.0));
		assert_eq!(cam.zoom(), 1.0);
	}

	#[test]
	fn test_toolbar_zoom_anchors_on_viewport_center() {
		let mut cam = camera();
		let before = cam.screen_to_world(Point::new(400.0, 300.0));
		cam.zoom_in();
		let after = cam.screen_to_world(Point::new(400.0, 300.0));
		assert_approx_eq!(f64, before.x, after.x, epsilon = 1e-9);
		assert_approx_eq!(f64, before.y, after.y, epsilon = 1e-9);
	}

	#[test]
	fn test_every_mutation_refreshes_floaters() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let probe = Probe::new("minimap", &log);
		let mut cam = camera();
		cam.floaters_mut().add(&probe);

		cam.pan(Point::new(1.0, 0.0));
		cam.zoom_at(Point::new(0.0, 0.0), ZoomDirection::In);
		cam.resize(Dimensions::new(10.0, 10.0));
		// no-op mutations do not notify
		cam.set_position(cam.position());

		assert_eq!(log.borrow().len(), 3);
		assert_eq!(probe.borrow().last, Some(cam.view()));
	}

	#[test]
	fn test_visible_world_rect() {
		let mut cam = camera();
		cam.set_position(Point::new(100.0, 50.0));
		let (min, max) = cam.view().visible_world_rect();
		assert_eq!(min, Point::new(-100.0, -50.0));
		assert_eq!(max, Point::new(700.0, 550.0));
	}
}
