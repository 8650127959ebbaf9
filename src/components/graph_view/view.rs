use leptos::prelude::*;
use log::{debug, error, info, warn};
use web_sys::CanvasRenderingContext2d;

use super::config::ViewConfig;
use super::layout::LayoutKind;
use super::model::Node;
use super::render;
use super::state::{GraphViewState, Hover, NodeSelection, TooltipContent};
use super::stats::GraphStats;
use super::types::GraphDocument;

/// Offset of the tooltip from the pointer, in pixels.
const TOOLTIP_OFFSET: f64 = 10.0;

/// Tooltip content anchored at a page position.
#[derive(Clone, Debug, PartialEq)]
pub struct TooltipView {
	pub content: TooltipContent,
	pub left: f64,
	pub top: f64,
}

/// Handle to one graph view.
///
/// Constructed by whoever owns the page and passed to the canvas, the panels
/// and every control that drives it. Copying the handle does not copy the
/// graph.
#[derive(Clone, Copy)]
pub struct GraphView {
	state: StoredValue<GraphViewState, LocalStorage>,
	selection: RwSignal<Option<NodeSelection>>,
	tooltip: RwSignal<Option<TooltipView>>,
	stats: RwSignal<Option<GraphStats>>,
	node_radius: RwSignal<f64>,
	layout: RwSignal<LayoutKind>,
}

impl GraphView {
	pub fn new(config: ViewConfig) -> Self {
		let radius = config.node_radius;
		let seed = js_sys::Date::now() as u64;
		Self {
			state: StoredValue::new_local(GraphViewState::new(config, 0.0, 0.0, seed)),
			selection: RwSignal::new(None),
			tooltip: RwSignal::new(None),
			stats: RwSignal::new(None),
			node_radius: RwSignal::new(radius),
			layout: RwSignal::new(LayoutKind::Force),
		}
	}

	fn with_state<U>(&self, f: impl FnOnce(&mut GraphViewState) -> U) -> Option<U> {
		self.state.try_update_value(f)
	}

	/// Currently selected node, if any.
	pub fn selection(&self) -> ReadSignal<Option<NodeSelection>> {
		self.selection.read_only()
	}

	pub fn tooltip(&self) -> ReadSignal<Option<TooltipView>> {
		self.tooltip.read_only()
	}

	pub fn stats(&self) -> ReadSignal<Option<GraphStats>> {
		self.stats.read_only()
	}

	pub fn node_radius(&self) -> ReadSignal<f64> {
		self.node_radius.read_only()
	}

	pub fn layout(&self) -> ReadSignal<LayoutKind> {
		self.layout.read_only()
	}

	/// Replaces the graph with `doc`. A rejected document is logged and
	/// leaves the current graph in place.
	pub fn load_data(&self, doc: &GraphDocument) {
		let loaded = self.with_state(|s| s.load_data(doc).map(|()| GraphStats::compute(&s.model)));
		match loaded {
			Some(Ok(stats)) => {
				info!(
					"Loaded graph: {} nodes, {} edges",
					stats.node_count, stats.edge_count
				);
				self.selection.set(None);
				self.tooltip.set(None);
				self.stats.set(Some(stats));
				self.layout.set(LayoutKind::Force);
			}
			Some(Err(e)) => error!("{e}"),
			None => warn!("Graph view disposed; ignoring load"),
		}
	}

	pub fn apply_layout(&self, kind: LayoutKind) {
		info!("Applying {kind} layout");
		self.with_state(|s| s.apply_layout(kind));
		self.layout.set(kind);
	}

	/// Applies a layout by name, falling back to the force layout for names
	/// it does not know.
	pub fn apply_layout_named(&self, name: &str) {
		let kind = name.parse().unwrap_or_else(|e| {
			warn!("{e}, using force layout");
			LayoutKind::Force
		});
		self.apply_layout(kind);
	}

	pub fn search_nodes(&self, term: &str) -> Vec<Node> {
		self.with_state(|s| s.search_nodes(term).into_iter().cloned().collect())
			.unwrap_or_default()
	}

	/// Selects the node and centres the view on it. Unknown ids are ignored.
	pub fn focus_node(&self, id: &str) {
		match self.with_state(|s| s.focus_node(id)).flatten() {
			Some(selection) => {
				debug!("Focusing node {id}");
				self.selection.set(Some(selection));
			}
			None => debug!("No node with id {id}"),
		}
	}

	pub fn reset_zoom(&self) {
		self.with_state(GraphViewState::reset_zoom);
	}

	pub fn update_node_size(&self, radius: f64) {
		if self.with_state(|s| s.update_node_size(radius)) == Some(true) {
			debug!("Node radius set to {radius}");
			self.node_radius.set(radius);
		} else {
			warn!("Ignoring node radius {radius}");
		}
	}

	pub fn resize(&self, width: f64, height: f64) {
		self.with_state(|s| s.resize(width, height));
	}

	pub fn pointer_down(&self, x: f64, y: f64) {
		self.with_state(|s| match s.node_at_position(x, y) {
			Some(idx) => s.begin_drag(idx, x, y),
			None => s.begin_pan(x, y),
		});
	}

	/// `page_x`/`page_y` position the tooltip; `x`/`y` are canvas-relative.
	pub fn pointer_move(&self, x: f64, y: f64, page_x: f64, page_y: f64) {
		let changed = self
			.with_state(|s| {
				if s.drag.active {
					s.drag_to(x, y);
					return None;
				}
				s.pan_to(x, y);
				if s.pan.active {
					return None;
				}
				let hover = s
					.node_at_position(x, y)
					.map(Hover::Node)
					.or_else(|| s.edge_at_position(x, y).map(Hover::Edge))
					.unwrap_or_default();
				s.set_hover(hover).then(|| s.tooltip())
			})
			.flatten();

		if let Some(content) = changed {
			self.tooltip.set(content.map(|content| TooltipView {
				content,
				left: page_x + TOOLTIP_OFFSET,
				top: page_y + TOOLTIP_OFFSET,
			}));
		}
	}

	pub fn pointer_up(&self) {
		let clicked = self
			.with_state(|s| {
				s.end_pan();
				s.end_drag().and_then(|idx| s.select(idx))
			})
			.flatten();
		if let Some(selection) = clicked {
			debug!("Selected node {}", selection.node.id);
			self.selection.set(Some(selection));
		}
	}

	pub fn pointer_leave(&self) {
		self.with_state(|s| {
			s.end_drag();
			s.end_pan();
			s.set_hover(Hover::Nothing);
		});
		self.tooltip.set(None);
	}

	pub fn wheel(&self, x: f64, y: f64, delta_y: f64) {
		self.with_state(|s| s.zoom_at(x, y, delta_y));
	}

	/// Advances the simulation and animations by `dt` seconds and draws a
	/// frame.
	pub fn frame(&self, dt: f64, ctx: &CanvasRenderingContext2d) {
		self.with_state(|s| {
			s.tick(dt);
			render::render(s, ctx);
		});
	}
}
