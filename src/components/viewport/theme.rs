//! Colors and visual styles for the canvas and the minimap.

/// RGBA color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red.
	pub r: u8,
	/// Green.
	pub g: u8,
	/// Blue.
	pub b: u8,
	/// Alpha, `0.0..=1.0`.
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with alpha.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same color, different alpha.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten by `factor` (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		let up = |c: u8| (c as f64 + (255.0 - c as f64) * f) as u8;
		Self {
			r: up(self.r),
			g: up(self.g),
			b: up(self.b),
			a: self.a,
		}
	}

	/// Darken by `factor` (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		let down = |c: u8| (c as f64 * f) as u8;
		Self {
			r: down(self.r),
			g: down(self.g),
			b: down(self.b),
			a: self.a,
		}
	}

	/// CSS `rgba(...)` string.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Canvas background.
#[derive(Clone, Debug)]
pub struct BackgroundStyle {
	/// Base fill.
	pub color: Color,
	/// Outer color of the radial gradient, `None` for a flat fill.
	pub gradient_to: Option<Color>,
	/// Spacing of the dot grid in world units, 0 to disable.
	pub grid_spacing: f64,
	/// Dot grid color.
	pub grid_color: Color,
}

/// Edge lines and arrowheads.
#[derive(Clone, Debug)]
pub struct EdgeStyle {
	/// Stroke color.
	pub color: Color,
	/// Whether edges end in an arrow head at `to`.
	pub arrows: bool,
}

/// Vertex and group shapes.
#[derive(Clone, Debug)]
pub struct NodeStyle {
	/// Vertex fill.
	pub vertex_fill: Color,
	/// Group fill.
	pub group_fill: Color,
	/// Outline color.
	pub border: Color,
	/// Outline width in screen pixels.
	pub border_width: f64,
	/// Inner gradient highlight.
	pub use_gradient: bool,
	/// Label text color.
	pub label: Color,
}

/// Minimap colors.
#[derive(Clone, Debug)]
pub struct MinimapStyle {
	/// Minimap fill.
	pub background: Color,
	/// Node dots.
	pub node: Color,
	/// Visible-area frame.
	pub frame: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Name used by [`Theme::by_name`].
	pub name: &'static str,
	/// Canvas background.
	pub background: BackgroundStyle,
	/// Edges.
	pub edge: EdgeStyle,
	/// Nodes.
	pub node: NodeStyle,
	/// Minimap.
	pub minimap: MinimapStyle,
}

impl Theme {
	/// Dark slate theme (default)
	pub fn slate() -> Self {
		let vertex = Color::rgb(94, 129, 172);
		Self {
			name: "slate",
			background: BackgroundStyle {
				color: Color::rgb(22, 27, 34),
				gradient_to: Some(Color::rgb(30, 35, 42)),
				grid_spacing: 40.0,
				grid_color: Color::rgba(255, 255, 255, 0.05),
			},
			edge: EdgeStyle {
				color: Color::rgba(140, 160, 180, 0.6),
				arrows: true,
			},
			node: NodeStyle {
				vertex_fill: vertex,
				group_fill: Color::rgb(130, 120, 150).with_alpha(0.85),
				border: vertex.lighten(0.4),
				border_width: 1.0,
				use_gradient: true,
				label: Color::rgba(230, 235, 240, 0.9),
			},
			minimap: MinimapStyle {
				background: Color::rgba(10, 12, 16, 0.8),
				node: vertex.lighten(0.2),
				frame: Color::rgba(255, 255, 255, 0.7),
			},
		}
	}

	/// Light theme for printing and bright rooms
	pub fn paper() -> Self {
		let vertex = Color::rgb(70, 110, 140);
		Self {
			name: "paper",
			background: BackgroundStyle {
				color: Color::rgb(248, 248, 245),
				gradient_to: None,
				grid_spacing: 40.0,
				grid_color: Color::rgba(0, 0, 0, 0.06),
			},
			edge: EdgeStyle {
				color: Color::rgba(60, 70, 80, 0.6),
				arrows: true,
			},
			node: NodeStyle {
				vertex_fill: vertex,
				group_fill: Color::rgb(180, 136, 100).with_alpha(0.85),
				border: vertex.darken(0.3),
				border_width: 1.0,
				use_gradient: false,
				label: Color::rgb(30, 30, 30),
			},
			minimap: MinimapStyle {
				background: Color::rgba(255, 255, 255, 0.85),
				node: vertex,
				frame: Color::rgba(0, 0, 0, 0.6),
			},
		}
	}

	/// Looks a theme up by name, falling back to the default.
	pub fn by_name(name: &str) -> Self {
		match name {
			"paper" => Self::paper(),
			_ => Self::slate(),
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::slate()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_to_css() {
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
		assert_eq!(
			Color::rgba(1, 2, 3, 0.5).to_css(),
			"rgba(1, 2, 3, 0.5)"
		);
	}

	#[test]
	fn test_lighten_and_darken_bounds() {
		let c = Color::rgb(100, 100, 100);
		assert_eq!(c.lighten(1.0), Color::rgb(255, 255, 255));
		assert_eq!(c.darken(1.0), Color::rgb(0, 0, 0));
		assert_eq!(c.lighten(-3.0), c);
	}

	#[test]
	fn test_unknown_theme_falls_back() {
		assert_eq!(Theme::by_name("nope").name, "slate");
		assert_eq!(Theme::by_name("paper").name, "paper");
	}
}
