//! Static placement strategies. Each one pins every node it places.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use thiserror::Error;

use super::model::{GraphModel, NodeIdx, Viewport};

/// Deepest tree level below the root.
pub const TREE_MAX_LEVELS: usize = 5;

const TREE_ROOT_Y: f64 = 50.0;
const TREE_LEVEL_SPACING: f64 = 100.0;
const TREE_CHILD_SPACING: f64 = 80.0;
const TREE_MARGIN: f64 = 50.0;
const TREE_OVERFLOW_ROW: f64 = 80.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutKind {
	#[default]
	Force,
	Circular,
	Grid,
	Tree,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown layout `{0}`")]
pub struct UnknownLayout(pub String);

impl LayoutKind {
	pub const ALL: [LayoutKind; 4] = [
		LayoutKind::Force,
		LayoutKind::Circular,
		LayoutKind::Grid,
		LayoutKind::Tree,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			LayoutKind::Force => "force",
			LayoutKind::Circular => "circular",
			LayoutKind::Grid => "grid",
			LayoutKind::Tree => "tree",
		}
	}

	/// Human-readable name for selectors.
	pub fn label(self) -> &'static str {
		match self {
			LayoutKind::Force => "Force-directed",
			LayoutKind::Circular => "Circular",
			LayoutKind::Grid => "Grid",
			LayoutKind::Tree => "Tree",
		}
	}
}

impl fmt::Display for LayoutKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for LayoutKind {
	type Err = UnknownLayout;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		LayoutKind::ALL
			.into_iter()
			.find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| UnknownLayout(s.to_owned()))
	}
}

/// Evenly spaced on a circle of radius 40% of the smaller viewport side.
pub fn circular(model: &mut GraphModel, viewport: Viewport) {
	let n = model.len();
	if n == 0 {
		return;
	}
	let radius = viewport.width.min(viewport.height) * 0.4;
	let step = 2.0 * PI / n as f64;
	let (cx, cy) = viewport.center();

	for (i, node) in model.nodes_mut().iter_mut().enumerate() {
		let angle = i as f64 * step;
		node.pin(cx + radius * angle.cos(), cy + radius * angle.sin());
	}
}

/// Square grid of `ceil(sqrt(n))` columns inside a 10% padding.
pub fn grid(model: &mut GraphModel, viewport: Viewport) {
	let n = model.len();
	if n == 0 {
		return;
	}
	let cols = grid_columns(n);
	let padding = viewport.width.min(viewport.height) * 0.1;
	let cell_w = (viewport.width - padding * 2.0) / cols as f64;
	let cell_h = (viewport.height - padding * 2.0) / cols as f64;

	for (i, node) in model.nodes_mut().iter_mut().enumerate() {
		let (col, row) = ((i % cols) as f64, (i / cols) as f64);
		node.pin(
			padding + col * cell_w + cell_w / 2.0,
			padding + row * cell_h + cell_h / 2.0,
		);
	}
}

pub fn grid_columns(n: usize) -> usize {
	(n as f64).sqrt().ceil() as usize
}

/// Outcome of [`tree`]: the chosen root and each node's level, `None` for
/// nodes placed in the overflow grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreePlacement {
	pub root: NodeIdx,
	pub levels: Vec<Option<usize>>,
}

/// The node with the strictly greatest out-degree, ties going to the source
/// seen first in edge order. Falls back to the first node.
pub fn find_root(model: &GraphModel) -> Option<NodeIdx> {
	let first = (!model.is_empty()).then_some(0)?;
	let mut out_degrees: IndexMap<NodeIdx, usize> = IndexMap::new();
	for edge in model.edges() {
		*out_degrees.entry(edge.source).or_default() += 1;
	}

	let mut root = first;
	let mut best = 0;
	for (&idx, &degree) in &out_degrees {
		if degree > best {
			best = degree;
			root = idx;
		}
	}
	Some(root)
}

/// Breadth-first hierarchy from [`find_root`], at most [`TREE_MAX_LEVELS`]
/// deep. Unreached nodes go into a grid anchored to the bottom edge.
pub fn tree(model: &mut GraphModel, viewport: Viewport) -> Option<TreePlacement> {
	let root = find_root(model)?;
	let mut levels: Vec<Option<usize>> = vec![None; model.len()];
	levels[root] = Some(0);

	let width = viewport.width;
	let mut positions: Vec<(NodeIdx, f64, f64)> = vec![(root, width / 2.0, TREE_ROOT_Y)];
	let mut frontier = vec![root];

	for level in 0..TREE_MAX_LEVELS {
		if frontier.is_empty() {
			break;
		}
		let mut next = Vec::new();
		for &parent in &frontier {
			let mut children: Vec<NodeIdx> = Vec::new();
			for edge in model.edges().iter().filter(|e| e.source == parent) {
				if levels[edge.target].is_none() && !children.contains(&edge.target) {
					children.push(edge.target);
				}
			}
			if children.is_empty() {
				continue;
			}

			let count = children.len();
			let level_y = TREE_LEVEL_SPACING + level as f64 * TREE_LEVEL_SPACING;
			let span = (width - 2.0 * TREE_MARGIN).min(count as f64 * TREE_CHILD_SPACING);
			let start_x = TREE_MARGIN.max((width - span) / 2.0);
			let gap = span / (count.max(2) - 1) as f64;

			for (i, child) in children.into_iter().enumerate() {
				levels[child] = Some(level + 1);
				positions.push((child, start_x + i as f64 * gap, level_y));
				next.push(child);
			}
		}
		frontier = next;
	}

	let remaining: Vec<NodeIdx> = (0..model.len()).filter(|&i| levels[i].is_none()).collect();
	if !remaining.is_empty() {
		let cols = grid_columns(remaining.len());
		let bottom = viewport.height - TREE_MARGIN;
		let cell_w = (width - 2.0 * TREE_MARGIN) / cols.max(1) as f64;
		for (i, &idx) in remaining.iter().enumerate() {
			let (col, row) = ((i % cols) as f64, (i / cols) as f64);
			positions.push((
				idx,
				TREE_MARGIN + col * cell_w + cell_w / 2.0,
				bottom - row * TREE_OVERFLOW_ROW,
			));
		}
	}

	for (idx, x, y) in positions {
		if let Some(node) = model.node_mut(idx) {
			node.pin(x, y);
		}
	}
	Some(TreePlacement { root, levels })
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::graph_view::model::tests::model_from;

	const VIEW: Viewport = Viewport {
		width: 1000.0,
		height: 800.0,
	};

	fn chain(n: usize) -> GraphModel {
		let nodes: serde_json::Map<String, serde_json::Value> =
			(0..n).map(|i| (format!("n{i}"), json!({}))).collect();
		let edges: Vec<_> = (1..n)
			.map(|i| json!({"source": format!("n{}", i - 1), "target": format!("n{i}")}))
			.collect();
		model_from(json!({"graph": {"nodes": nodes, "edges": edges}}), VIEW)
	}

	#[test]
	fn parses_layout_names() {
		assert_eq!("grid".parse::<LayoutKind>(), Ok(LayoutKind::Grid));
		assert_eq!(" Tree ".parse::<LayoutKind>(), Ok(LayoutKind::Tree));
		assert_eq!(
			"spiral".parse::<LayoutKind>(),
			Err(UnknownLayout("spiral".into()))
		);
		for kind in LayoutKind::ALL {
			assert_eq!(kind.to_string().parse::<LayoutKind>(), Ok(kind));
		}
	}

	#[test]
	fn circular_spacing_and_radius() {
		let mut model = chain(8);
		circular(&mut model, VIEW);
		let (cx, cy) = VIEW.center();
		let angles: Vec<f64> = model
			.nodes()
			.iter()
			.map(|n| {
				let r = ((n.x - cx).powi(2) + (n.y - cy).powi(2)).sqrt();
				assert!((r - 320.0).abs() < 1e-9);
				assert!(n.is_pinned());
				(n.y - cy).atan2(n.x - cx).rem_euclid(2.0 * PI)
			})
			.collect();
		for pair in angles.windows(2) {
			assert!((pair[1] - pair[0] - 2.0 * PI / 8.0).abs() < 1e-9);
		}
	}

	#[test]
	fn grid_columns_and_bounds() {
		assert_eq!(grid_columns(1), 1);
		assert_eq!(grid_columns(10), 4);
		assert_eq!(grid_columns(16), 4);

		let mut model = chain(10);
		grid(&mut model, VIEW);
		let padding = 80.0;
		let xs: Vec<f64> = model.nodes().iter().map(|n| n.x).collect();
		assert_eq!(xs[0], xs[4]);
		assert!(xs[0] < xs[1] && xs[1] < xs[2] && xs[2] < xs[3]);
		for node in model.nodes() {
			assert!(node.x >= padding && node.x <= VIEW.width - padding);
			assert!(node.y >= padding && node.y <= VIEW.height - padding);
		}
	}

	#[test]
	fn empty_model_is_left_alone() {
		let mut model = chain(0);
		circular(&mut model, VIEW);
		grid(&mut model, VIEW);
		assert_eq!(tree(&mut model, VIEW), None);
	}

	#[test]
	fn root_has_greatest_out_degree() {
		let model = model_from(
			json!({"graph": {"nodes": {"a": {}, "b": {}, "c": {}, "d": {}}, "edges": [
				{"source": "a", "target": "b"},
				{"source": "c", "target": "a"},
				{"source": "c", "target": "d"},
				{"source": "b", "target": "d"},
				{"source": "b", "target": "c"}
			]}}),
			VIEW,
		);
		// c and b both have two; c was seen first.
		assert_eq!(find_root(&model), Some(2));
		assert_eq!(find_root(&chain(3)), Some(0));
	}

	#[test]
	fn tree_caps_depth_and_places_everything() {
		let mut model = chain(9);
		let placement = tree(&mut model, VIEW).unwrap();
		assert_eq!(placement.root, 0);
		assert_eq!(placement.levels[5], Some(5));
		assert_eq!(placement.levels[6], None);
		assert!(
			placement
				.levels
				.iter()
				.flatten()
				.all(|&level| level <= TREE_MAX_LEVELS)
		);

		for (i, node) in model.nodes().iter().enumerate() {
			assert!(node.is_pinned());
			assert!(node.x.is_finite() && node.y.is_finite());
			if let Some(level) = placement.levels[i] {
				let expected = if level == 0 { 50.0 } else { 100.0 * level as f64 };
				assert_eq!(node.y, expected);
			} else {
				assert!(node.y > 500.0);
			}
		}
	}

	#[test]
	fn tree_handles_cycles_and_islands() {
		let mut model = model_from(
			json!({"graph": {"nodes": {"a": {}, "b": {}, "c": {}, "lonely": {}}, "edges": [
				{"source": "a", "target": "b"},
				{"source": "b", "target": "a"},
				{"source": "a", "target": "c"},
				{"source": "a", "target": "c"}
			]}}),
			VIEW,
		);
		let placement = tree(&mut model, VIEW).unwrap();
		assert_eq!(placement.levels, [Some(0), Some(1), Some(1), None]);

		let nodes = model.nodes();
		assert_eq!(nodes[0].x, 500.0);
		// two children spread over 160px, centred
		assert_eq!((nodes[1].x, nodes[2].x), (420.0, 580.0));
		assert_eq!(nodes[3].y, VIEW.height - 50.0);
	}
}
