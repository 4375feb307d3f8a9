//! Zoom-dependent sizes for painted diagram elements.
//!
//! Sizes are expressed in world units and resolved once per frame into
//! [`ScaledSizes`], ready to use after the canvas transform is applied.
//!
//! - [`ScaleBehavior::World`]: grows and shrinks with the zoom factor.
//! - [`ScaleBehavior::Screen`]: constant pixel size.
//! - [`ScaleBehavior::Clamped`]: world size bounded by min/max pixel sizes, so
//!   vertices stay clickable when zoomed far out.

/// How a size responds to the zoom factor.
#[derive(Clone, Debug, PartialEq)]
pub enum ScaleBehavior {
	/// Scales with the zoom.
	World,
	/// Fixed on screen.
	Screen,
	/// Scales with the zoom within screen-pixel bounds.
	Clamped {
		/// Smallest on-screen size.
		min_screen: f64,
		/// Largest on-screen size.
		max_screen: f64,
	},
}

impl ScaleBehavior {
	/// World-space size for `base` at zoom factor `k`.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Screen => base / k,
			// screen size = world size * k
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// Base sizes and how each one scales.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	/// Vertex radius in world units.
	pub vertex_radius: f64,
	/// Scaling of [`ScaleConfig::vertex_radius`].
	pub vertex_behavior: ScaleBehavior,
	/// Half-extent of the rounded square drawn for groups.
	pub group_half_size: f64,
	/// Scaling of [`ScaleConfig::group_half_size`].
	pub group_behavior: ScaleBehavior,
	/// Label font size in screen pixels.
	pub label_size: f64,
	/// Below this zoom labels stop shrinking.
	pub label_min_k: f64,
	/// Below this zoom labels are not drawn at all.
	pub label_cull_k: f64,
	/// Edge width in screen pixels.
	pub edge_width: f64,
	/// Arrowhead length in world units.
	pub arrow_size: f64,
	/// Scaling of [`ScaleConfig::arrow_size`].
	pub arrow_behavior: ScaleBehavior,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			vertex_radius: 8.0,
			vertex_behavior: ScaleBehavior::Clamped {
				min_screen: 4.0,
				max_screen: f64::INFINITY,
			},
			group_half_size: 14.0,
			group_behavior: ScaleBehavior::Clamped {
				min_screen: 6.0,
				max_screen: f64::INFINITY,
			},
			label_size: 11.0,
			label_min_k: 0.5,
			label_cull_k: 0.3,
			edge_width: 1.5,
			arrow_size: 6.0,
			arrow_behavior: ScaleBehavior::Clamped {
				min_screen: 0.0,
				max_screen: 18.0,
			},
		}
	}
}

/// Per-frame sizes in world space.
#[derive(Clone, Debug)]
pub struct ScaledSizes {
	/// Vertex radius.
	pub vertex_radius: f64,
	/// Half-extent of group squares.
	pub group_half_size: f64,
	/// CSS font shorthand, e.g. `"11px sans-serif"`.
	pub label_font: String,
	/// False when zoomed out past `label_cull_k`.
	pub show_labels: bool,
	/// Edge line width.
	pub edge_width: f64,
	/// Arrowhead length.
	pub arrow_size: f64,
}

impl ScaledSizes {
	/// Resolves every size for zoom factor `k`.
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let label_size = config.label_size / k.max(config.label_min_k);
		Self {
			vertex_radius: config.vertex_behavior.apply(config.vertex_radius, k),
			group_half_size: config.group_behavior.apply(config.group_half_size, k),
			label_font: format!("{}px sans-serif", label_size),
			show_labels: k >= config.label_cull_k,
			edge_width: config.edge_width / k,
			arrow_size: config.arrow_behavior.apply(config.arrow_size, k),
		}
	}
}
