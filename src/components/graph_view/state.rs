use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use super::config::ViewConfig;
use super::layout::{self, LayoutKind};
use super::model::{GraphModel, Node, NodeIdx, Viewport};
use super::simulation::{DRAG_ALPHA_TARGET, SETTLE_ALPHA, SETTLE_SECS, Simulation};
use super::transform::{Transition, ViewTransform};
use super::types::{GraphDocument, LoadError};

/// Scale applied when focusing a node.
pub const FOCUS_SCALE: f64 = 1.5;
/// Pointer tolerance around nodes, in graph units.
pub const HIT_SLOP: f64 = 2.0;
/// Pointer tolerance around edges, in screen pixels.
pub const EDGE_HIT_PX: f64 = 4.0;
/// Collision radius relative to the node radius.
const COLLIDE_FACTOR: f64 = 1.5;

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<NodeIdx>,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// What the pointer is over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Hover {
	#[default]
	Nothing,
	Node(NodeIdx),
	Edge(usize),
}

/// Emphasis around the selected node, faded in over a few frames.
#[derive(Clone, Debug, Default)]
pub struct HighlightState {
	pub node: Option<NodeIdx>,
	pub neighbors: HashSet<NodeIdx>,
	pub t: f64,
	delay_t: f64,
}

/// Content for the floating tooltip.
#[derive(Clone, Debug, PartialEq)]
pub enum TooltipContent {
	Node {
		label: String,
		kind: String,
		fields: Vec<(String, String)>,
	},
	Edge {
		source: String,
		relation: String,
		target: String,
	},
}

/// One row of the connected-edges list.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionRow {
	pub relation: String,
	pub peer_id: String,
	pub peer_label: String,
}

/// A selected node with its connections, as shown in the side panels.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSelection {
	pub node: Node,
	pub outgoing: Vec<ConnectionRow>,
	pub incoming: Vec<ConnectionRow>,
}

pub struct GraphViewState {
	pub config: ViewConfig,
	pub model: GraphModel,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: Hover,
	pub highlight: HighlightState,
	pub layout: LayoutKind,
	pub width: f64,
	pub height: f64,
	simulation: Simulation,
	transition: Option<Transition>,
	rng: SmallRng,
}

impl GraphViewState {
	pub fn new(config: ViewConfig, width: f64, height: f64, seed: u64) -> Self {
		let viewport = Viewport::new(width, height);
		let simulation = Simulation::new(viewport, config.node_radius * COLLIDE_FACTOR);
		Self {
			config,
			model: GraphModel::default(),
			transform: ViewTransform::IDENTITY,
			drag: DragState::default(),
			pan: PanState::default(),
			hover: Hover::Nothing,
			highlight: HighlightState::default(),
			layout: LayoutKind::Force,
			width,
			height,
			simulation,
			transition: None,
			rng: SmallRng::seed_from_u64(seed),
		}
	}

	pub fn viewport(&self) -> Viewport {
		Viewport::new(self.width, self.height)
	}

	/// Replaces the whole graph and runs the force layout. On error nothing
	/// changes.
	pub fn load_data(&mut self, doc: &GraphDocument) -> Result<(), LoadError> {
		let model = GraphModel::from_document(doc, self.viewport(), &self.config, &mut self.rng)?;
		self.model = model;
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.hover = Hover::Nothing;
		self.highlight = HighlightState::default();
		self.apply_layout(LayoutKind::Force);
		Ok(())
	}

	pub fn apply_layout(&mut self, kind: LayoutKind) {
		self.simulation.stop();
		self.model.unpin_all();
		self.layout = kind;

		let viewport = self.viewport();
		match kind {
			LayoutKind::Force => {}
			LayoutKind::Circular => layout::circular(&mut self.model, viewport),
			LayoutKind::Grid => layout::grid(&mut self.model, viewport),
			LayoutKind::Tree => {
				layout::tree(&mut self.model, viewport);
			}
		}

		self.simulation.reset(&self.model);
		if kind == LayoutKind::Force {
			self.simulation.restart(1.0);
		} else {
			self.simulation.restart(SETTLE_ALPHA);
			self.simulation.stop_after(SETTLE_SECS);
		}
	}

	pub fn search_nodes(&self, term: &str) -> Vec<&Node> {
		self.model.search(term)
	}

	/// Marks `idx` as selected and highlights its neighbourhood.
	pub fn select(&mut self, idx: NodeIdx) -> Option<NodeSelection> {
		self.model.node(idx)?;
		if self.highlight.node.is_none() {
			self.highlight.delay_t = 0.0;
		}
		self.highlight.node = Some(idx);
		self.highlight.neighbors = self.model.neighbors(idx);
		self.selection(idx)
	}

	pub fn selection(&self, idx: NodeIdx) -> Option<NodeSelection> {
		let node = self.model.node(idx)?.clone();
		let row = |relation: &str, peer: NodeIdx| {
			self.model.node(peer).map(|p| ConnectionRow {
				relation: relation.to_owned(),
				peer_id: p.id.clone(),
				peer_label: p.label.clone(),
			})
		};
		let connections = self.model.connections(idx);
		Some(NodeSelection {
			node,
			outgoing: connections
				.outgoing
				.iter()
				.filter_map(|e| row(&e.relation, e.target))
				.collect(),
			incoming: connections
				.incoming
				.iter()
				.filter_map(|e| row(&e.relation, e.source))
				.collect(),
		})
	}

	/// Selects the node and animates the view to centre on it.
	pub fn focus_node(&mut self, id: &str) -> Option<NodeSelection> {
		let idx = self.model.find(id)?;
		let selection = self.select(idx)?;
		let (x, y) = (selection.node.x, selection.node.y);
		let target = ViewTransform::centered_on(x, y, self.width, self.height, FOCUS_SCALE);
		self.transition = Some(Transition::new(self.transform, target));
		Some(selection)
	}

	pub fn reset_zoom(&mut self) {
		self.transition = Some(Transition::new(self.transform, ViewTransform::IDENTITY));
	}

	pub fn is_transitioning(&self) -> bool {
		self.transition.is_some()
	}

	/// Returns false for radii that are not positive.
	pub fn update_node_size(&mut self, radius: f64) -> bool {
		if !(radius.is_finite() && radius > 0.0) {
			return false;
		}
		self.config.node_radius = radius;
		self.simulation.set_collide_radius(radius * COLLIDE_FACTOR);
		true
	}

	pub fn node_radius(&self) -> f64 {
		self.config.node_radius
	}

	pub fn marker_offset(&self) -> f64 {
		self.config.marker_offset()
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		self.transform.screen_to_graph(sx, sy)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<NodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let reach = self.node_radius() + HIT_SLOP;
		// last drawn wins
		self.model
			.nodes()
			.iter()
			.rposition(|node| (node.x - gx).hypot(node.y - gy) < reach)
	}

	pub fn edge_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let reach = EDGE_HIT_PX / self.transform.k;
		let nodes = self.model.nodes();
		self.model.edges().iter().rposition(|edge| {
			let (a, b) = (&nodes[edge.source], &nodes[edge.target]);
			segment_distance(gx, gy, a.x, a.y, b.x, b.y) <= reach
		})
	}

	pub fn set_hover(&mut self, hover: Hover) -> bool {
		if self.hover == hover {
			return false;
		}
		self.hover = hover;
		true
	}

	pub fn tooltip(&self) -> Option<TooltipContent> {
		match self.hover {
			Hover::Nothing => None,
			Hover::Node(idx) => {
				let node = self.model.node(idx)?;
				Some(TooltipContent::Node {
					label: node.label.clone(),
					kind: node.kind().to_owned(),
					fields: self.config.tooltip_fields.select(&node.metadata),
				})
			}
			Hover::Edge(i) => {
				let edge = self.model.edges().get(i)?;
				let label = |idx| self.model.node(idx).map(|n| n.label.clone());
				Some(TooltipContent::Edge {
					source: label(edge.source)?,
					relation: edge.relation.clone(),
					target: label(edge.target)?,
				})
			}
		}
	}

	/// Pins the node under the pointer; the simulation keeps running while
	/// the drag lasts.
	pub fn begin_drag(&mut self, idx: NodeIdx, sx: f64, sy: f64) {
		let Some(node) = self.model.node_mut(idx) else {
			return;
		};
		let (nx, ny) = (node.x, node.y);
		node.pin(nx, ny);
		self.drag = DragState {
			active: true,
			node_idx: Some(idx),
			moved: false,
			start_x: sx,
			start_y: sy,
			node_start_x: nx,
			node_start_y: ny,
		};
		self.simulation.set_alpha_target(DRAG_ALPHA_TARGET);
	}

	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		if !self.drag.active {
			return;
		}
		let Some(idx) = self.drag.node_idx else {
			return;
		};
		let k = self.transform.k;
		let (dx, dy) = ((sx - self.drag.start_x) / k, (sy - self.drag.start_y) / k);
		if dx != 0.0 || dy != 0.0 {
			self.drag.moved = true;
		}
		let (nx, ny) = (self.drag.node_start_x + dx, self.drag.node_start_y + dy);
		if let Some(node) = self.model.node_mut(idx) {
			node.pin(nx, ny);
		}
	}

	/// Ends a drag. The node stays pinned where it was dropped. Returns the
	/// node when the press never moved, i.e. it was a click.
	pub fn end_drag(&mut self) -> Option<NodeIdx> {
		if !self.drag.active {
			return None;
		}
		let clicked = self.drag.node_idx.filter(|_| !self.drag.moved);
		self.drag = DragState::default();
		self.simulation.set_alpha_target(0.0);
		clicked
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.transition = None;
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	pub fn zoom_at(&mut self, sx: f64, sy: f64, delta_y: f64) {
		self.transition = None;
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		self.transform = self.transform.zoom_around(
			sx,
			sy,
			factor,
			self.config.min_zoom,
			self.config.max_zoom,
		);
	}

	pub fn is_highlighted(&self, idx: NodeIdx) -> bool {
		self.highlight.node == Some(idx) || self.highlight.neighbors.contains(&idx)
	}

	pub fn is_selected(&self, idx: NodeIdx) -> bool {
		self.highlight.node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.highlight.node.is_some()
	}

	pub fn is_simulating(&self) -> bool {
		self.simulation.is_running()
	}

	pub fn tick(&mut self, dt: f64) {
		self.simulation.step(dt, &mut self.model);

		if let Some(transition) = self.transition.as_mut() {
			let (transform, done) = transition.advance(dt);
			self.transform = transform;
			if done {
				self.transition = None;
			}
		}

		if self.highlight.node.is_some() {
			let (delay, speed) = (0.08, 1.8);
			self.highlight.delay_t = (self.highlight.delay_t + dt).min(delay);
			if self.highlight.delay_t >= delay {
				self.highlight.t += (1.0 - self.highlight.t) * (speed * dt).min(1.0);
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.simulation.resize(self.viewport());
	}
}

fn segment_distance(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
	let (dx, dy) = (bx - ax, by - ay);
	let len_sq = dx * dx + dy * dy;
	if len_sq < f64::EPSILON {
		return (px - ax).hypot(py - ay);
	}
	let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
	(px - (ax + t * dx)).hypot(py - (ay + t * dy))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn doc(value: serde_json::Value) -> GraphDocument {
		serde_json::from_value(value).unwrap()
	}

	fn threats() -> GraphDocument {
		doc(json!({"graph": {"directed": true, "nodes": {
			"log4shell": {"label": "Log4Shell", "metadata": {"category": "RCE", "type": "Vulnerability", "cvss": 10.0}},
			"jndi": {"label": "JNDI Lookup", "metadata": {"type": "Technique"}},
			"scanner": {"label": "Scanner", "metadata": {"type": "Tool"}}
		}, "edges": [
			{"source": "log4shell", "target": "jndi", "relation": "uses"},
			{"source": "scanner", "target": "log4shell", "relation": "detects"}
		]}}))
	}

	fn loaded() -> GraphViewState {
		let mut state = GraphViewState::new(ViewConfig::default(), 800.0, 600.0, 42);
		state.load_data(&threats()).unwrap();
		state
	}

	#[test]
	fn load_runs_force_layout() {
		let state = loaded();
		assert_eq!(state.model.len(), 3);
		assert_eq!(state.model.edges().len(), 2);
		assert_eq!(state.layout, LayoutKind::Force);
		assert!(state.is_simulating());
	}

	#[test]
	fn reload_replaces_everything() {
		let mut state = loaded();
		state.select(0);
		state
			.load_data(&doc(json!({"graph": {"nodes": {"x": {"label": "Other"}}}})))
			.unwrap();

		assert_eq!(state.model.len(), 1);
		assert!(state.model.edges().is_empty());
		assert!(state.search_nodes("log4").is_empty());
		assert_eq!(state.search_nodes("oth").len(), 1);
		assert!(!state.has_active_highlight());
	}

	#[test]
	fn rejected_document_keeps_previous_graph() {
		let mut state = loaded();
		assert!(matches!(
			state.load_data(&GraphDocument::default()),
			Err(LoadError::MissingGraph)
		));
		assert_eq!(state.model.len(), 3);
	}

	#[test]
	fn layouts_reset_pins() {
		let mut state = loaded();
		state.apply_layout(LayoutKind::Circular);
		assert!(state.model.nodes().iter().all(Node::is_pinned));
		assert!(state.is_simulating());

		for _ in 0..30 {
			state.tick(1.0 / 60.0);
		}
		assert!(!state.is_simulating());

		state.apply_layout(LayoutKind::Force);
		assert!(state.model.nodes().iter().all(|n| !n.is_pinned()));
	}

	#[test]
	fn node_size_updates_radius_and_marker() {
		let mut state = loaded();
		assert!(state.update_node_size(20.0));
		assert_eq!(state.node_radius(), 20.0);
		assert_eq!(state.marker_offset(), 50.0);
		assert!(!state.update_node_size(0.0));
		assert_eq!(state.node_radius(), 20.0);
	}

	#[test]
	fn focus_centres_and_selects() {
		let mut state = loaded();
		state.apply_layout(LayoutKind::Grid);
		assert!(state.focus_node("nope").is_none());
		assert!(!state.is_transitioning());

		let selection = state.focus_node("jndi").unwrap();
		assert_eq!(selection.node.id, "jndi");
		assert!(state.is_selected(1));
		assert!(state.is_highlighted(0));
		assert!(!state.is_highlighted(2));

		let (x, y) = (selection.node.x, selection.node.y);
		state.tick(1.0);
		assert!(!state.is_transitioning());
		assert_eq!(
			state.transform,
			ViewTransform::centered_on(x, y, 800.0, 600.0, FOCUS_SCALE)
		);

		state.reset_zoom();
		state.tick(1.0);
		assert_eq!(state.transform, ViewTransform::IDENTITY);
	}

	#[test]
	fn selection_lists_connections() {
		let state = loaded();
		let selection = state.selection(0).unwrap();
		assert_eq!(
			selection.outgoing,
			[ConnectionRow {
				relation: "uses".into(),
				peer_id: "jndi".into(),
				peer_label: "JNDI Lookup".into(),
			}]
		);
		assert_eq!(selection.incoming[0].peer_label, "Scanner");
		assert_eq!(selection.incoming[0].relation, "detects");
	}

	#[test]
	fn drag_pins_node_where_dropped() {
		let mut state = loaded();
		state.apply_layout(LayoutKind::Grid);
		let start = state.model.nodes()[2].clone();
		let (sx, sy) = state.transform.graph_to_screen(start.x, start.y);
		assert_eq!(state.node_at_position(sx, sy), Some(2));

		state.begin_drag(2, sx, sy);
		state.drag_to(sx + 30.0, sy - 10.0);
		assert_eq!(state.end_drag(), None);

		let node = &state.model.nodes()[2];
		assert_eq!((node.fx, node.fy), (Some(start.x + 30.0), Some(start.y - 10.0)));
		state.apply_layout(LayoutKind::Force);
		for _ in 0..5 {
			state.tick(1.0 / 60.0);
		}
		assert!(!state.model.nodes()[2].is_pinned());
	}

	#[test]
	fn press_without_motion_is_a_click() {
		let mut state = loaded();
		state.apply_layout(LayoutKind::Circular);
		let node = state.model.nodes()[0].clone();
		state.begin_drag(0, node.x, node.y);
		assert_eq!(state.end_drag(), Some(0));
		assert!(state.model.nodes()[0].is_pinned());
	}

	#[test]
	fn tooltips_for_nodes_and_edges() {
		let mut state = loaded();
		assert_eq!(state.tooltip(), None);

		state.set_hover(Hover::Node(0));
		assert_eq!(
			state.tooltip(),
			Some(TooltipContent::Node {
				label: "Log4Shell".into(),
				kind: "Vulnerability".into(),
				fields: vec![
					("CVSS Score".into(), "10.0".into()),
					("Category".into(), "RCE".into()),
				],
			})
		);

		assert!(state.set_hover(Hover::Edge(1)));
		assert!(!state.set_hover(Hover::Edge(1)));
		assert_eq!(
			state.tooltip(),
			Some(TooltipContent::Edge {
				source: "Scanner".into(),
				relation: "detects".into(),
				target: "Log4Shell".into(),
			})
		);
	}

	#[test]
	fn edge_hit_testing() {
		let mut state = loaded();
		state.apply_layout(LayoutKind::Grid);
		let nodes = state.model.nodes();
		let (a, b) = (&nodes[0], &nodes[1]);
		let (mx, my) = ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
		assert_eq!(state.edge_at_position(mx, my + 2.0), Some(0));
		assert_eq!(state.edge_at_position(mx, my + 40.0), None);
	}

	#[test]
	fn wheel_zoom_respects_extent() {
		let mut state = loaded();
		for _ in 0..100 {
			state.zoom_at(10.0, 10.0, -1.0);
		}
		assert_eq!(state.transform.k, 8.0);
		for _ in 0..200 {
			state.zoom_at(10.0, 10.0, 1.0);
		}
		assert_eq!(state.transform.k, 0.1);
	}

	#[test]
	fn segment_distance_clamps_to_endpoints() {
		assert_eq!(segment_distance(5.0, 3.0, 0.0, 0.0, 10.0, 0.0), 3.0);
		assert_eq!(segment_distance(13.0, 4.0, 0.0, 0.0, 10.0, 0.0), 5.0);
	}
}
