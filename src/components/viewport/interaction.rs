//! Pointer, wheel and keyboard gestures translated into camera operations.
//!
//! Panning is a small state machine (`Idle -> Panning -> Idle`). Entering
//! `Panning` takes a [`CaptureGuard`] standing for the transient move/up
//! listeners; the guard runs its release on drop, so every way out of the
//! session (pointer up, cancel, a replacing pointer down, dropping the
//! controller) detaches them exactly once.

use std::fmt;

use log::debug;

use super::camera::{Camera, ZoomDirection};
use super::scene::SceneGraph;
use super::types::Point;

/// Scoped input capture. Holds the closure that detaches the listeners
/// attached for one pan session.
pub struct CaptureGuard {
	release: Option<Box<dyn FnOnce()>>,
}

impl CaptureGuard {
	/// Wraps the closure that detaches the listeners.
	pub fn new(release: impl FnOnce() + 'static) -> Self {
		Self {
			release: Some(Box::new(release)),
		}
	}

	/// A guard with nothing to release, for hosts that capture implicitly.
	pub fn detached() -> Self {
		Self { release: None }
	}

	/// Detaches now instead of on drop.
	pub fn release(mut self) {
		self.run();
	}

	fn run(&mut self) {
		if let Some(release) = self.release.take() {
			release();
		}
	}
}

impl Drop for CaptureGuard {
	fn drop(&mut self) {
		self.run();
	}
}

impl fmt::Debug for CaptureGuard {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CaptureGuard")
			.field("held", &self.release.is_some())
			.finish()
	}
}

#[derive(Debug)]
struct PanSession {
	start_pointer: Point,
	start_position: Point,
	_capture: CaptureGuard,
}

#[derive(Debug, Default)]
enum PanState {
	#[default]
	Idle,
	Panning(PanSession),
}

/// What the host should do with the native wheel event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WheelOutcome {
	/// Ctrl-wheel is a pinch gesture; the page must not zoom.
	pub suppress_default: bool,
	/// Whether the camera zoom changed.
	pub zoomed: bool,
}

/// Gesture state for one canvas.
#[derive(Debug, Default)]
pub struct InteractionController {
	state: PanState,
}

impl InteractionController {
	/// An idle controller.
	pub fn new() -> Self {
		Self::default()
	}

	/// Whether a pan session is in progress.
	pub fn is_panning(&self) -> bool {
		matches!(self.state, PanState::Panning(_))
	}

	/// Starts a pan session. A session already in progress is ended first and
	/// its capture released before the new one is held.
	pub fn pointer_down(&mut self, camera: &mut Camera, pointer: Point, capture: CaptureGuard) {
		camera.floaters_mut().close_all();
		if self.is_panning() {
			debug!("diagram-canvas: pointer down during pan, replacing session");
			self.state = PanState::Idle;
		}
		self.state = PanState::Panning(PanSession {
			start_pointer: pointer,
			start_position: camera.position(),
			_capture: capture,
		});
	}

	/// Follows the pointer while panning. Returns false when idle.
	pub fn pointer_move(&mut self, camera: &mut Camera, pointer: Point) -> bool {
		let PanState::Panning(session) = &self.state else {
			return false;
		};
		let position = session
			.start_position
			.add(pointer.sub(session.start_pointer));
		camera.set_position(position);
		true
	}

	/// Ends the pan session and re-renders edges.
	pub fn pointer_up(&mut self, scene: &mut SceneGraph) -> bool {
		match std::mem::take(&mut self.state) {
			PanState::Idle => false,
			PanState::Panning(session) => {
				drop(session);
				scene.redraw_edges();
				true
			}
		}
	}

	/// Aborts the pan session and puts the camera back where it started.
	pub fn cancel(&mut self, camera: &mut Camera) -> bool {
		match std::mem::take(&mut self.state) {
			PanState::Idle => false,
			PanState::Panning(session) => {
				camera.set_position(session.start_position);
				debug!("diagram-canvas: pan cancelled");
				true
			}
		}
	}

	/// Negative `delta_y` zooms in, positive zooms out, anchored at the pointer.
	/// A zero delta (horizontal-only scrolling) leaves the zoom alone. Ctrl is
	/// how browsers report a pinch, so the page zoom is suppressed then.
	pub fn wheel(
		&mut self,
		camera: &mut Camera,
		pointer: Point,
		delta_y: f64,
		ctrl: bool,
	) -> WheelOutcome {
		camera.floaters_mut().close_all();
		let zoomed = if delta_y < 0.0 {
			camera.zoom_at(pointer, ZoomDirection::In)
		} else if delta_y > 0.0 {
			camera.zoom_at(pointer, ZoomDirection::Out)
		} else {
			false
		};
		WheelOutcome {
			suppress_default: ctrl,
			zoomed,
		}
	}

	/// Zooms in one step, anchored at the pointer.
	pub fn double_click(&mut self, camera: &mut Camera, pointer: Point) -> bool {
		camera.floaters_mut().close_all();
		camera.zoom_at(pointer, ZoomDirection::In)
	}

	/// The sidebar list scrolled; edges anchored to list rows need redrawing.
	pub fn sidebar_scrolled(&mut self, camera: &mut Camera, scene: &mut SceneGraph) {
		camera.floaters_mut().close_all();
		scene.redraw_edges();
	}
}
