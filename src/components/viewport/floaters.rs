//! Overlay elements that follow the camera.
//!
//! A floater is anything drawn on top of the canvas that has to be repositioned
//! whenever the camera pans, zooms or the viewport resizes: the minimap,
//! popovers, context menus. The registry only holds weak references, so
//! dropping a floater elsewhere silently unregisters it and removing it here
//! never destroys it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, warn};

use super::camera::CameraView;

/// An overlay that repositions itself from the current camera view.
pub trait Floater {
	/// Realign with the camera. Called synchronously after every camera change.
	fn set_position(&mut self, view: &CameraView);

	/// Hide any open floating UI. Gestures call this before acting.
	fn close(&mut self) {}
}

/// Handle returned by [`FloaterRegistry::add`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FloaterId(u64);

struct Entry {
	id: FloaterId,
	floater: Weak<RefCell<dyn Floater>>,
}

/// Registration-ordered list of floaters.
#[derive(Default)]
pub struct FloaterRegistry {
	entries: Vec<Entry>,
	next_id: u64,
}

impl fmt::Debug for FloaterRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FloaterRegistry")
			.field("len", &self.entries.len())
			.finish()
	}
}

impl FloaterRegistry {
	/// An empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `floater` without taking ownership. It is dropped from the
	/// registry once its last strong reference goes away.
	pub fn add<F: Floater + 'static>(&mut self, floater: &Rc<RefCell<F>>) -> FloaterId {
		let id = FloaterId(self.next_id);
		self.next_id += 1;
		let shared: Rc<RefCell<dyn Floater>> = floater.clone();
		self.entries.push(Entry {
			id,
			floater: Rc::downgrade(&shared),
		});
		debug!("diagram-canvas: floater {:?} registered", id);
		id
	}

	/// Stops repositioning the floater. Returns whether it was registered.
	pub fn remove(&mut self, id: FloaterId) -> bool {
		let before = self.entries.len();
		self.entries.retain(|entry| entry.id != id);
		before != self.entries.len()
	}

	/// Number of registered floaters, including ones already dropped but not yet
	/// pruned by a refresh.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Calls [`Floater::set_position`] on every live floater in registration
	/// order and forgets the ones that have been dropped.
	pub fn refresh_all(&mut self, view: &CameraView) {
		self.entries.retain(|entry| {
			let Some(floater) = entry.floater.upgrade() else {
				return false;
			};
			match floater.try_borrow_mut() {
				Ok(mut floater) => floater.set_position(view),
				Err(_) => warn!(
					"diagram-canvas: floater {:?} busy during refresh, skipped",
					entry.id
				),
			}
			true
		});
	}

	/// Calls [`Floater::close`] on every live floater.
	pub fn close_all(&mut self) {
		for entry in &self.entries {
			if let Some(floater) = entry.floater.upgrade() {
				if let Ok(mut floater) = floater.try_borrow_mut() {
					floater.close();
				}
			}
		}
	}
}
