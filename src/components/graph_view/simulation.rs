//! Physics layout built on `force_graph`.
//!
//! `force_graph` supplies charge repulsion, spring attraction and velocity
//! integration. On top of it this module keeps an energy level (`alpha`) that
//! decays every tick until the layout is considered settled, and adds the
//! link-distance, centering and collision passes the view relies on.
//! Pinned nodes are anchors: they keep their pinned position and are never
//! moved by any pass.

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::model::{GraphModel, NodeIdx, Viewport};

/// Preferred edge length.
pub const LINK_DISTANCE: f64 = 100.0;
/// Energy used by the static layouts to let edges settle.
pub const SETTLE_ALPHA: f64 = 0.1;
/// How long the static layouts let the simulation run, in seconds.
pub const SETTLE_SECS: f64 = 0.3;
/// Energy target while a node is being dragged.
pub const DRAG_ALPHA_TARGET: f64 = 0.3;

const ALPHA_MIN: f64 = 0.001;
// 1 - ALPHA_MIN^(1/300): reaches ALPHA_MIN from 1.0 in ~300 ticks.
const ALPHA_DECAY: f64 = 0.0228;
const NODE_MASS: f32 = 10.0;
const COLLIDE_STRENGTH: f64 = 0.7;

pub struct Simulation {
	graph: ForceGraph<NodeIdx, ()>,
	links: Vec<(NodeIdx, NodeIdx)>,
	link_strength: Vec<f64>,
	alpha: f64,
	alpha_target: f64,
	running: bool,
	settle_remaining: Option<f64>,
	center: (f64, f64),
	collide_radius: f64,
}

fn parameters() -> SimulationParameters {
	SimulationParameters {
		force_charge: 150.0,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	}
}

impl Simulation {
	pub fn new(viewport: Viewport, collide_radius: f64) -> Self {
		Self {
			graph: ForceGraph::new(parameters()),
			links: Vec::new(),
			link_strength: Vec::new(),
			alpha: 0.0,
			alpha_target: 0.0,
			running: false,
			settle_remaining: None,
			center: viewport.center(),
			collide_radius,
		}
	}

	/// Rebuilds the physics graph from the current model. Leaves the
	/// simulation stopped.
	pub fn reset(&mut self, model: &GraphModel) {
		self.stop();
		self.graph = ForceGraph::new(parameters());

		let handles: Vec<_> = model
			.nodes()
			.iter()
			.enumerate()
			.map(|(idx, node)| {
				self.graph.add_node(NodeData {
					x: node.x as f32,
					y: node.y as f32,
					mass: NODE_MASS,
					is_anchor: node.is_pinned(),
					user_data: idx,
				})
			})
			.collect();

		// self-loops carry no force
		self.links = model
			.edges()
			.iter()
			.filter(|e| e.source != e.target)
			.map(|e| (e.source, e.target))
			.collect();
		for &(source, target) in &self.links {
			self.graph
				.add_edge(handles[source], handles[target], EdgeData::default());
		}

		let mut degree = vec![0usize; model.len()];
		for &(s, t) in &self.links {
			degree[s] += 1;
			degree[t] += 1;
		}
		self.link_strength = self
			.links
			.iter()
			.map(|&(s, t)| 1.0 / degree[s].min(degree[t]).max(1) as f64)
			.collect();
	}

	pub fn resize(&mut self, viewport: Viewport) {
		self.center = viewport.center();
	}

	pub fn set_collide_radius(&mut self, radius: f64) {
		self.collide_radius = radius;
	}

	/// Runs from `alpha` until the energy decays away.
	pub fn restart(&mut self, alpha: f64) {
		self.alpha = alpha;
		self.running = true;
		self.settle_remaining = None;
	}

	/// Stops automatically after `secs` of simulated time.
	pub fn stop_after(&mut self, secs: f64) {
		self.settle_remaining = Some(secs);
	}

	pub fn stop(&mut self) {
		self.running = false;
		self.settle_remaining = None;
	}

	/// Drag start raises the target so the layout keeps reacting; drag end
	/// lowers it back to zero and lets the energy decay.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
		if target > 0.0 && !self.running {
			self.running = true;
			self.settle_remaining = None;
		}
	}

	#[cfg(test)]
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	/// Advances one tick of `dt` seconds and writes positions back into the
	/// model. Returns whether anything moved.
	pub fn step(&mut self, dt: f64, model: &mut GraphModel) -> bool {
		if !self.running {
			return false;
		}
		if let Some(remaining) = self.settle_remaining.as_mut() {
			*remaining -= dt;
			if *remaining <= 0.0 {
				self.stop();
				return false;
			}
		}

		self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;
		if self.alpha < ALPHA_MIN {
			self.stop();
			return false;
		}

		self.push_positions(model);
		self.graph.update((dt * self.alpha.min(1.0)) as f32);
		self.pull_positions(model);

		self.apply_links(model);
		self.apply_center(model);
		self.apply_collisions(model);
		self.push_positions(model);
		true
	}

	fn push_positions(&mut self, model: &GraphModel) {
		self.graph.visit_nodes_mut(|node| {
			if let Some(n) = model.node(node.data.user_data) {
				node.data.x = n.fx.unwrap_or(n.x) as f32;
				node.data.y = n.fy.unwrap_or(n.y) as f32;
				node.data.is_anchor = n.is_pinned();
			}
		});
	}

	fn pull_positions(&self, model: &mut GraphModel) {
		self.graph.visit_nodes(|node| {
			let Some(n) = model.node_mut(node.data.user_data) else {
				return;
			};
			let (x, y) = (node.x() as f64, node.y() as f64);
			if let (Some(fx), Some(fy)) = (n.fx, n.fy) {
				n.x = fx;
				n.y = fy;
			} else if x.is_finite() && y.is_finite() {
				n.x = x;
				n.y = y;
			}
		});
	}

	fn apply_links(&self, model: &mut GraphModel) {
		for (&(s, t), &strength) in self.links.iter().zip(&self.link_strength) {
			let nodes = model.nodes_mut();
			let (dx, dy) = (nodes[t].x - nodes[s].x, nodes[t].y - nodes[s].y);
			let len = (dx * dx + dy * dy).sqrt();
			if len < f64::EPSILON {
				continue;
			}
			let k = (len - LINK_DISTANCE) / len * self.alpha * strength * 0.5;
			let (sx, sy) = (dx * k, dy * k);
			if !nodes[t].is_pinned() {
				nodes[t].x -= sx;
				nodes[t].y -= sy;
			}
			if !nodes[s].is_pinned() {
				nodes[s].x += sx;
				nodes[s].y += sy;
			}
		}
	}

	fn apply_center(&self, model: &mut GraphModel) {
		let free: Vec<_> = model.nodes_mut().iter_mut().filter(|n| !n.is_pinned()).collect();
		if free.is_empty() {
			return;
		}
		let count = free.len() as f64;
		let (mx, my) = free
			.iter()
			.fold((0.0, 0.0), |(x, y), n| (x + n.x / count, y + n.y / count));
		let (ox, oy) = (self.center.0 - mx, self.center.1 - my);
		for node in free {
			node.x += ox;
			node.y += oy;
		}
	}

	fn apply_collisions(&self, model: &mut GraphModel) {
		let min_dist = self.collide_radius * 2.0;
		let nodes = model.nodes_mut();
		for i in 0..nodes.len() {
			for j in (i + 1)..nodes.len() {
				let (dx, dy) = (nodes[j].x - nodes[i].x, nodes[j].y - nodes[i].y);
				let dist = (dx * dx + dy * dy).sqrt();
				if dist >= min_dist || dist < f64::EPSILON {
					continue;
				}
				let push = (min_dist - dist) / dist * 0.5 * COLLIDE_STRENGTH;
				let (px, py) = (dx * push, dy * push);
				if !nodes[i].is_pinned() {
					nodes[i].x -= px;
					nodes[i].y -= py;
				}
				if !nodes[j].is_pinned() {
					nodes[j].x += px;
					nodes[j].y += py;
				}
			}
		}
	}
}
