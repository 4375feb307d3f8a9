//! Canvas painting for the diagram and the minimap.
//!
//! The main canvas draws the scene surface layer by layer, each in insertion
//! order:
//! 1. Background and dot grid (screen space)
//! 2. Edges layer, with arrow heads at `to` (world space)
//! 3. Vertices layer, then groups layer, then labels

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::camera::CameraView;
use super::scale::{ScaleConfig, ScaledSizes};
use super::scene::SceneGraph;
use super::state::DiagramState;
use super::theme::Theme;
use super::types::{Dimensions, Node, Point};

/// Padding around the diagram inside the minimap, in minimap pixels.
const MINIMAP_PADDING: f64 = 8.0;

/// Paints the scene as seen through the camera.
pub fn render(
	state: &DiagramState,
	ctx: &CanvasRenderingContext2d,
	config: &ScaleConfig,
	theme: &Theme,
) {
	let view = state.camera().view();
	let sizes = ScaledSizes::new(config, view.zoom);

	draw_background(ctx, &view, theme);

	ctx.save();
	let _ = ctx.translate(view.position.x, view.position.y);
	let _ = ctx.scale(view.zoom, view.zoom);

	let scene = state.scene();
	draw_edges(ctx, scene, &sizes, theme);
	for id in scene.surface().vertices() {
		if let Some(node) = scene.node(id) {
			draw_vertex(ctx, node.center(), &sizes, theme);
		}
	}
	for id in scene.surface().groups() {
		if let Some(node) = scene.node(id) {
			draw_group(ctx, node.center(), &sizes, theme, view.zoom);
		}
	}
	if sizes.show_labels {
		draw_labels(ctx, scene, &sizes, theme);
	}

	ctx.restore();
}

fn draw_background(ctx: &CanvasRenderingContext2d, view: &CameraView, theme: &Theme) {
	let Dimensions { width, height } = view.viewport;
	let background = &theme.background;

	let gradient = background.gradient_to.and_then(|outer| {
		let gradient = ctx
			.create_radial_gradient(
				width / 2.0,
				height / 2.0,
				0.0,
				width / 2.0,
				height / 2.0,
				width.max(height) * 0.8,
			)
			.ok()?;
		gradient.add_color_stop(0.0, &outer.to_css()).ok()?;
		gradient
			.add_color_stop(1.0, &background.color.to_css())
			.ok()?;
		Some(gradient)
	});
	match gradient {
		#[allow(deprecated)]
		Some(gradient) => ctx.set_fill_style(&gradient),
		None => ctx.set_fill_style_str(&background.color.to_css()),
	}
	ctx.fill_rect(0.0, 0.0, width, height);

	let spacing = background.grid_spacing * view.zoom;
	// too dense to be useful and too many dots to paint
	if spacing < 8.0 {
		return;
	}
	ctx.set_fill_style_str(&background.grid_color.to_css());
	let start_x = view.position.x.rem_euclid(spacing);
	let start_y = view.position.y.rem_euclid(spacing);
	let mut x = start_x;
	while x < width {
		let mut y = start_y;
		while y < height {
			ctx.fill_rect(x - 1.0, y - 1.0, 2.0, 2.0);
			y += spacing;
		}
		x += spacing;
	}
}

/// How far from a node's center an edge should stop.
fn node_extent(node: &Node, sizes: &ScaledSizes) -> f64 {
	match node {
		Node::Vertex(_) => sizes.vertex_radius,
		Node::Group(_) => sizes.group_half_size,
	}
}

fn draw_edges(
	ctx: &CanvasRenderingContext2d,
	scene: &SceneGraph,
	sizes: &ScaledSizes,
	theme: &Theme,
) {
	let color = theme.edge.color.to_css();
	ctx.set_stroke_style_str(&color);
	ctx.set_fill_style_str(&color);
	ctx.set_line_width(sizes.edge_width);

	for id in scene.surface().edges() {
		let Some(edge) = scene.edge(id) else {
			continue;
		};
		let endpoints = edge
			.from
			.as_ref()
			.and_then(|from| scene.node(from))
			.zip(edge.to.as_ref().and_then(|to| scene.node(to)));
		let Some((from, to)) = endpoints else {
			continue;
		};

		let (start, end) = (from.center(), to.center());
		let delta = end.sub(start);
		let dist = delta.hypot();
		if dist < 0.001 {
			continue;
		}
		let unit = delta.scale(1.0 / dist);
		let head = if theme.edge.arrows { sizes.arrow_size } else { 0.0 };

		let tail = start.add(unit.scale(node_extent(from, sizes)));
		let tip = end.sub(unit.scale(node_extent(to, sizes)));
		let shaft_end = tip.sub(unit.scale(head));

		ctx.begin_path();
		ctx.move_to(tail.x, tail.y);
		ctx.line_to(shaft_end.x, shaft_end.y);
		ctx.stroke();

		if head > 0.0 {
			let side = Point::new(-unit.y, unit.x).scale(head * 0.5);
			ctx.begin_path();
			ctx.move_to(tip.x, tip.y);
			ctx.line_to(shaft_end.x + side.x, shaft_end.y + side.y);
			ctx.line_to(shaft_end.x - side.x, shaft_end.y - side.y);
			ctx.close_path();
			ctx.fill();
		}
	}
}

fn draw_vertex(ctx: &CanvasRenderingContext2d, center: Point, sizes: &ScaledSizes, theme: &Theme) {
	let style = &theme.node;
	let radius = sizes.vertex_radius;

	let gradient = style
		.use_gradient
		.then(|| {
			let gradient = ctx
				.create_radial_gradient(
					center.x - radius * 0.3,
					center.y - radius * 0.3,
					0.0,
					center.x,
					center.y,
					radius,
				)
				.ok()?;
			gradient
				.add_color_stop(0.0, &style.vertex_fill.lighten(0.4).to_css())
				.ok()?;
			gradient
				.add_color_stop(0.7, &style.vertex_fill.to_css())
				.ok()?;
			gradient
				.add_color_stop(1.0, &style.vertex_fill.darken(0.2).to_css())
				.ok()?;
			Some(gradient)
		})
		.flatten();

	ctx.begin_path();
	let _ = ctx.arc(center.x, center.y, radius, 0.0, 2.0 * PI);
	match gradient {
		#[allow(deprecated)]
		Some(gradient) => ctx.set_fill_style(&gradient),
		None => ctx.set_fill_style_str(&style.vertex_fill.to_css()),
	}
	ctx.fill();

	if style.border_width > 0.0 {
		ctx.set_stroke_style_str(&style.border.to_css());
		ctx.set_line_width(sizes.edge_width * style.border_width);
		ctx.stroke();
	}
}

fn draw_group(
	ctx: &CanvasRenderingContext2d,
	center: Point,
	sizes: &ScaledSizes,
	theme: &Theme,
	k: f64,
) {
	let style = &theme.node;
	let half = sizes.group_half_size;
	ctx.set_fill_style_str(&style.group_fill.to_css());
	ctx.fill_rect(center.x - half, center.y - half, half * 2.0, half * 2.0);
	if style.border_width > 0.0 {
		ctx.set_stroke_style_str(&style.border.to_css());
		ctx.set_line_width(style.border_width / k);
		ctx.stroke_rect(center.x - half, center.y - half, half * 2.0, half * 2.0);
	}
}

fn draw_labels(
	ctx: &CanvasRenderingContext2d,
	scene: &SceneGraph,
	sizes: &ScaledSizes,
	theme: &Theme,
) {
	ctx.set_fill_style_str(&theme.node.label.to_css());
	ctx.set_font(&sizes.label_font);
	for node in scene.nodes() {
		let center = node.center();
		let offset = node_extent(node, sizes) + 4.0;
		let _ = ctx.fill_text(node.display_name(), center.x + offset, center.y + 3.0);
	}
}

/// Bounding box of every on-canvas node center.
pub fn world_bounds(scene: &SceneGraph) -> Option<(Point, Point)> {
	scene.nodes().map(Node::center).fold(None, |acc, p| {
		Some(match acc {
			None => (p, p),
			Some((min, max)) => (
				Point::new(min.x.min(p.x), min.y.min(p.y)),
				Point::new(max.x.max(p.x), max.y.max(p.y)),
			),
		})
	})
}

/// Mapping from world coordinates into the minimap canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinimapProjection {
	/// Minimap pixels per world unit.
	pub scale: f64,
	/// Minimap position of the world origin.
	pub offset: Point,
}

impl MinimapProjection {
	/// Fits `bounds` into `size`, never magnifying past `max_scale`.
	pub fn fit(bounds: (Point, Point), size: Dimensions, max_scale: f64) -> Self {
		let (min, max) = bounds;
		let extent = max.sub(min);
		let room = Dimensions::new(
			(size.width - 2.0 * MINIMAP_PADDING).max(1.0),
			(size.height - 2.0 * MINIMAP_PADDING).max(1.0),
		);
		let fit = |room: f64, extent: f64| {
			if extent > f64::EPSILON {
				room / extent
			} else {
				f64::INFINITY
			}
		};
		let scale = fit(room.width, extent.x)
			.min(fit(room.height, extent.y))
			.min(max_scale);

		let center = min.add(extent.scale(0.5));
		let offset = size.midpoint().sub(center.scale(scale));
		Self { scale, offset }
	}

	/// World point to minimap pixel.
	pub fn project(&self, world: Point) -> Point {
		world.scale(self.scale).add(self.offset)
	}
}

/// Paints the whole diagram scaled down with the main viewport's frame.
pub fn render_minimap(
	state: &DiagramState,
	ctx: &CanvasRenderingContext2d,
	size: Dimensions,
	theme: &Theme,
) {
	ctx.clear_rect(0.0, 0.0, size.width, size.height);
	let minimap = state.minimap().borrow();
	if !minimap.is_visible() {
		return;
	}

	ctx.set_fill_style_str(&theme.minimap.background.to_css());
	ctx.fill_rect(0.0, 0.0, size.width, size.height);

	let Some(frame) = minimap.viewport_rect() else {
		return;
	};
	let bounds = match world_bounds(state.scene()) {
		Some((min, max)) => (
			Point::new(min.x.min(frame.0.x), min.y.min(frame.0.y)),
			Point::new(max.x.max(frame.1.x), max.y.max(frame.1.y)),
		),
		None => frame,
	};
	let projection = MinimapProjection::fit(bounds, size, minimap.scale());

	ctx.set_fill_style_str(&theme.minimap.node.to_css());
	for node in state.scene().nodes() {
		let p = projection.project(node.center());
		ctx.fill_rect(p.x - 1.5, p.y - 1.5, 3.0, 3.0);
	}

	let (top_left, bottom_right) = (projection.project(frame.0), projection.project(frame.1));
	ctx.set_stroke_style_str(&theme.minimap.frame.to_css());
	ctx.set_line_width(1.0);
	ctx.stroke_rect(
		top_left.x,
		top_left.y,
		bottom_right.x - top_left.x,
		bottom_right.y - top_left.y,
	);
}

#[cfg(test)]
mod tests {
	use float_cmp::assert_approx_eq;

	use super::*;
	use crate::components::viewport::types::Vertex;

	#[test]
	fn test_world_bounds() {
		let mut scene = SceneGraph::new();
		assert_eq!(world_bounds(&scene), None);
		for (id, x, y) in [("a", 0.0, 5.0), ("b", -10.0, 2.0), ("c", 4.0, 20.0)] {
			scene
				.add_node(Vertex::new(id, Point::new(x, y)).into())
				.unwrap();
		}
		assert_eq!(
			world_bounds(&scene),
			Some((Point::new(-10.0, 2.0), Point::new(4.0, 20.0)))
		);
	}

	#[test]
	fn test_minimap_projection_fits_and_centers() {
		let bounds = (Point::new(0.0, 0.0), Point::new(1000.0, 500.0));
		let size = Dimensions::new(216.0, 116.0);
		let projection = MinimapProjection::fit(bounds, size, 1.0);

		assert_approx_eq!(f64, projection.scale, 0.2, epsilon = 1e-12);
		let center = projection.project(Point::new(500.0, 250.0));
		assert_approx_eq!(f64, center.x, 108.0, epsilon = 1e-9);
		assert_approx_eq!(f64, center.y, 58.0, epsilon = 1e-9);
	}

	#[test]
	fn test_minimap_projection_caps_scale() {
		let bounds = (Point::new(5.0, 5.0), Point::new(5.0, 5.0));
		let projection = MinimapProjection::fit(bounds, Dimensions::new(100.0, 100.0), 0.1);
		assert_approx_eq!(f64, projection.scale, 0.1);
		let p = projection.project(Point::new(5.0, 5.0));
		assert_approx_eq!(f64, p.x, 50.0, epsilon = 1e-9);
		assert_approx_eq!(f64, p.y, 50.0, epsilon = 1e-9);
	}
}
