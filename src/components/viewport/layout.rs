//! Force-directed layout of the on-canvas nodes.
//!
//! Wraps the `force_graph` simulation (pairwise repulsion with a capped force,
//! springs along render-eligible edges, damped velocities) with what the
//! canvas editor needs on top of it:
//!
//! - a per-step displacement clamp and a convergence test on the largest
//!   displacement,
//! - a hard iteration cap so every run terminates,
//! - chunked execution through [`LayoutTask`] so large graphs can be spread
//!   across animation frames, cancelled explicitly or by a scene reset,
//! - seeded jitter for coincident nodes so runs are reproducible.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::camera::Camera;
use super::config::LayoutConfig;
use super::scene::SceneGraph;
use super::types::{NodeId, Point};

/// Attempts at nudging a node off an occupied position before giving up.
const MAX_JITTER_ATTEMPTS: usize = 8;

/// State of a layout run after a call to [`LayoutTask::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutProgress {
	/// More iterations remain.
	Running { iterations: usize },
	/// The largest per-node displacement fell below the threshold.
	Converged { iterations: usize },
	/// The iteration cap was hit before converging.
	CapReached { iterations: usize },
	/// The task was cancelled or the scene was reset underneath it.
	Cancelled,
}

impl LayoutProgress {
	/// Whether the run has stopped for any reason.
	pub fn is_finished(&self) -> bool {
		!matches!(self, LayoutProgress::Running { .. })
	}
}

/// Layout algorithm and its configuration.
#[derive(Clone, Debug)]
pub struct LayoutEngine {
	config: LayoutConfig,
}

impl LayoutEngine {
	/// Engine with a private copy of `config`.
	pub fn new(config: &LayoutConfig) -> Self {
		Self {
			config: config.clone(),
		}
	}

	pub fn config(&self) -> &LayoutConfig {
		&self.config
	}

	/// Prepares a run over the current scene. Nothing is written back until
	/// the task is stepped.
	pub fn start(&self, scene: &SceneGraph) -> LayoutTask {
		let config = &self.config;
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: config.force_charge,
			force_spring: config.force_spring,
			force_max: config.force_max,
			node_speed: config.node_speed,
			damping_factor: config.damping_factor,
		});
		let mut rng = StdRng::seed_from_u64(config.seed);
		let mut occupied = HashSet::new();
		let mut indices: HashMap<&NodeId, DefaultNodeIdx> = HashMap::new();

		for node in scene.nodes() {
			let mut center = node.center();
			for _ in 0..MAX_JITTER_ATTEMPTS {
				if !occupied.contains(&grid_key(center)) {
					break;
				}
				center = center.add(jitter(&mut rng, config.jitter.max(1.0)));
			}
			occupied.insert(grid_key(center));

			let idx = graph.add_node(NodeData {
				x: center.x as f32,
				y: center.y as f32,
				mass: config.node_mass,
				is_anchor: false,
				user_data: node.id().clone(),
			});
			indices.insert(node.id(), idx);
		}

		let mut springs = 0;
		for edge in scene.edges().filter(|edge| scene.is_edge_eligible(edge)) {
			let (Some(from), Some(to)) = (&edge.from, &edge.to) else {
				continue;
			};
			if let (Some(&a), Some(&b)) = (indices.get(from), indices.get(to)) {
				if a != b {
					graph.add_edge(a, b, EdgeData::default());
					springs += 1;
				}
			}
		}

		debug!(
			"diagram-canvas: layout started with {} nodes, {} springs",
			indices.len(),
			springs
		);

		let finished = if indices.is_empty() {
			Some(LayoutProgress::Converged { iterations: 0 })
		} else {
			None
		};

		LayoutTask {
			graph,
			generation: scene.generation(),
			iterations: 0,
			max_iterations: config.max_iterations,
			convergence_threshold: config.convergence_threshold,
			max_step: config.max_step.max(f64::EPSILON),
			time_step: config.time_step,
			last_displacement: f64::INFINITY,
			finished,
			cancelled: false,
		}
	}

	/// Runs a full layout synchronously. Bounded by `max_iterations`.
	pub fn run(&self, scene: &mut SceneGraph) -> LayoutProgress {
		let mut task = self.start(scene);
		let progress = task.step(scene, usize::MAX);
		info!("diagram-canvas: layout finished: {:?}", progress);
		progress
	}

	/// Mean center of every on-canvas node, `None` for an empty scene.
	pub fn centroid(scene: &SceneGraph) -> Option<Point> {
		let (sum, count) = scene
			.nodes()
			.filter(|node| !node.is_excluded())
			.fold((Point::default(), 0usize), |(acc, n), node| {
				(acc.add(node.center()), n + 1)
			});
		if count == 0 {
			return None;
		}
		let centroid = sum.scale(1.0 / count as f64);
		centroid.is_finite().then_some(centroid)
	}

	/// Pans the camera so the centroid of the on-canvas nodes sits in the middle
	/// of the viewport. No-op on an empty scene.
	pub fn center(&self, scene: &SceneGraph, camera: &mut Camera) -> bool {
		let Some(centroid) = Self::centroid(scene) else {
			return false;
		};
		let target = camera
			.viewport()
			.midpoint()
			.sub(centroid.scale(camera.zoom()));
		camera.set_position(target);
		true
	}

	/// Initial position for the `index`-th of `count` unpositioned nodes: a
	/// circle around `around`.
	pub fn seed_position(&self, index: usize, count: usize, around: Point) -> Point {
		let angle = (index as f64) * 2.0 * PI / count.max(1) as f64;
		around.add(Point::new(
			self.config.seed_radius * angle.cos(),
			self.config.seed_radius * angle.sin(),
		))
	}

	/// Where a node entering the canvas should appear: next to its on-canvas
	/// neighbours, or at `fallback` when it has none. The offset is derived from
	/// the seed and the node id, so it is reproducible.
	pub fn placement_for(&self, scene: &SceneGraph, id: &NodeId, fallback: Point) -> Point {
		let neighbours = scene.neighbour_centers(id);
		let base = if neighbours.is_empty() {
			fallback
		} else {
			neighbours
				.iter()
				.fold(Point::default(), |acc, p| acc.add(*p))
				.scale(1.0 / neighbours.len() as f64)
		};

		let mut hasher = DefaultHasher::new();
		id.hash(&mut hasher);
		let mut rng = StdRng::seed_from_u64(self.config.seed ^ hasher.finish());
		base.add(jitter(&mut rng, self.config.jitter))
	}
}

/// A layout run that can be advanced a few iterations at a time.
pub struct LayoutTask {
	graph: ForceGraph<NodeId, ()>,
	generation: u64,
	iterations: usize,
	max_iterations: usize,
	convergence_threshold: f64,
	max_step: f64,
	time_step: f32,
	last_displacement: f64,
	finished: Option<LayoutProgress>,
	cancelled: bool,
}

impl LayoutTask {
	/// Iterations run so far.
	pub fn iterations(&self) -> usize {
		self.iterations
	}

	/// Largest per-node displacement of the most recent iteration.
	pub fn last_displacement(&self) -> f64 {
		self.last_displacement
	}

	/// Stops the task; further steps report [`LayoutProgress::Cancelled`].
	pub fn cancel(&mut self) {
		self.cancelled = true;
	}

	/// Whether the scene has been reset since the task started.
	pub fn is_stale(&self, scene: &SceneGraph) -> bool {
		scene.generation() != self.generation
	}

	/// Runs at most `budget` iterations and writes the resulting centers back
	/// to the nodes still on the canvas.
	pub fn step(&mut self, scene: &mut SceneGraph, budget: usize) -> LayoutProgress {
		if self.cancelled || self.is_stale(scene) {
			self.cancelled = true;
			return LayoutProgress::Cancelled;
		}
		if let Some(done) = self.finished {
			return done;
		}

		let mut ran = 0;
		while ran < budget {
			if self.iterations >= self.max_iterations {
				self.finished = Some(LayoutProgress::CapReached {
					iterations: self.iterations,
				});
				break;
			}
			self.last_displacement = self.advance();
			self.iterations += 1;
			ran += 1;
			if self.last_displacement < self.convergence_threshold {
				self.finished = Some(LayoutProgress::Converged {
					iterations: self.iterations,
				});
				break;
			}
		}
		// the cap may be reached exactly at the end of the budget
		if self.finished.is_none() && self.iterations >= self.max_iterations {
			self.finished = Some(LayoutProgress::CapReached {
				iterations: self.iterations,
			});
		}

		self.write_back(scene);
		self.finished.unwrap_or(LayoutProgress::Running {
			iterations: self.iterations,
		})
	}

	/// One simulation step. Returns the largest displacement after clamping.
	fn advance(&mut self) -> f64 {
		let mut before: HashMap<DefaultNodeIdx, (f32, f32)> = HashMap::new();
		self.graph.visit_nodes(|node| {
			before.insert(node.index(), (node.x(), node.y()));
		});

		self.graph.update(self.time_step);

		let max_step = self.max_step;
		let mut largest: f64 = 0.0;
		self.graph.visit_nodes_mut(|node| {
			let Some(&(x0, y0)) = before.get(&node.index()) else {
				return;
			};
			let (x1, y1) = (node.data.x, node.data.y);
			if !(x1.is_finite() && y1.is_finite()) {
				node.data.x = x0;
				node.data.y = y0;
				largest = largest.max(max_step);
				return;
			}
			let (dx, dy) = ((x1 - x0) as f64, (y1 - y0) as f64);
			let distance = dx.hypot(dy);
			if distance > max_step {
				let factor = max_step / distance;
				node.data.x = (x0 as f64 + dx * factor) as f32;
				node.data.y = (y0 as f64 + dy * factor) as f32;
				largest = largest.max(max_step);
			} else {
				largest = largest.max(distance);
			}
		});
		largest
	}

	fn write_back(&self, scene: &mut SceneGraph) {
		self.graph.visit_nodes(|node| {
			let center = Point::new(node.x() as f64, node.y() as f64);
			scene.set_center(&node.data.user_data, center);
		});
	}
}

fn grid_key(p: Point) -> (i64, i64) {
	((p.x * 1000.0).round() as i64, (p.y * 1000.0).round() as i64)
}

fn jitter(rng: &mut StdRng, radius: f64) -> Point {
	if radius <= 0.0 {
		return Point::default();
	}
	Point::new(
		rng.random_range(-radius..radius),
		rng.random_range(-radius..radius),
	)
}
