//! Behavioural configuration for the canvas core.
//!
//! Visual tuning lives in [`super::theme`] and [`super::scale`]; this module only
//! holds the knobs that change what the core computes. Every section has a
//! `Default` and can be partially overridden from JSON.

use serde::Deserialize;

/// Zoom bounds and step.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
	/// Lower bound of the zoom factor. Must be > 0.
	pub min: f64,
	/// Upper bound of the zoom factor.
	pub max: f64,
	/// Multiplier applied per zoom-in step; zoom-out divides by it.
	pub step: f64,
	/// Zoom factor at load time.
	pub initial: f64,
}

impl Default for ZoomConfig {
	fn default() -> Self {
		Self {
			min: 0.1,
			max: 10.0,
			step: 1.1,
			initial: 1.0,
		}
	}
}

impl ZoomConfig {
	/// Returns a copy with nonsensical values replaced by defaults.
	pub fn sanitized(&self) -> Self {
		let defaults = Self::default();
		let min = if self.min.is_finite() && self.min > 0.0 {
			self.min
		} else {
			defaults.min
		};
		let max = if self.max.is_finite() && self.max >= min {
			self.max
		} else {
			defaults.max.max(min)
		};
		let step = if self.step.is_finite() && self.step > 1.0 {
			self.step
		} else {
			defaults.step
		};
		let initial = if self.initial.is_finite() {
			self.initial.clamp(min, max)
		} else {
			defaults.initial.clamp(min, max)
		};
		Self {
			min,
			max,
			step,
			initial,
		}
	}
}

/// Force simulation parameters and termination bounds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	/// Repulsion strength between every pair of nodes.
	pub force_charge: f32,
	/// Spring strength along edges.
	pub force_spring: f32,
	/// Cap on the force magnitude, avoids singularities at tiny distances.
	pub force_max: f32,
	/// Velocity multiplier of the simulation.
	pub node_speed: f32,
	/// Velocity retained per step, `0..1`.
	pub damping_factor: f32,
	/// Mass of every simulated node.
	pub node_mass: f32,
	/// Simulated seconds per iteration.
	pub time_step: f32,
	/// Hard upper bound on iterations for one layout run.
	pub max_iterations: usize,
	/// The run converges once no node moves further than this in one step.
	pub convergence_threshold: f64,
	/// Largest distance a node may travel in one step.
	pub max_step: f64,
	/// Iterations per scheduler turn when a run is chunked.
	pub chunk_iterations: usize,
	/// Graphs up to this many nodes are laid out synchronously.
	pub sync_node_limit: usize,
	/// Seed for the jitter separating coincident nodes.
	pub seed: u64,
	/// Radius of the jitter applied to coincident nodes.
	pub jitter: f64,
	/// Radius of the circle unpositioned nodes are seeded on.
	pub seed_radius: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
			node_mass: 10.0,
			time_step: 0.016,
			max_iterations: 500,
			convergence_threshold: 0.05,
			max_step: 25.0,
			chunk_iterations: 20,
			sync_node_limit: 200,
			seed: 0x5eed,
			jitter: 5.0,
			seed_radius: 100.0,
		}
	}
}

/// Minimap floater settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MinimapConfig {
	/// World-to-minimap scale factor.
	pub scale: f64,
	/// Whether the minimap starts visible.
	pub visible: bool,
}

impl Default for MinimapConfig {
	fn default() -> Self {
		Self {
			scale: 0.1,
			visible: true,
		}
	}
}

/// Complete editor configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
	/// Zoom bounds.
	pub zoom: ZoomConfig,
	/// Layout simulation.
	pub layout: LayoutConfig,
	/// Minimap floater.
	pub minimap: MinimapConfig,
}
