use std::collections::{HashMap, HashSet};

use log::warn;
use rand::Rng;
use serde::Serialize;

use super::config::ViewConfig;
use super::types::{GraphDocument, LoadError, Metadata};

/// Position of a node in [`GraphModel::nodes`].
pub type NodeIdx = usize;

pub const DEFAULT_RELATION: &str = "relates_to";
const DEFAULT_KIND: &str = "Node";

/// Drawing area in graph coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
	pub id: String,
	pub label: String,
	pub metadata: Metadata,
	pub x: f64,
	pub y: f64,
	/// Pinned position, exempt from simulation forces.
	pub fx: Option<f64>,
	pub fy: Option<f64>,
	pub color: String,
}

impl Node {
	/// The `type` metadata field, when it is text.
	pub fn node_type(&self) -> Option<&str> {
		self.metadata.get("type").and_then(|v| v.as_text())
	}

	/// Type shown beside the label; "Node" when untyped.
	pub fn kind(&self) -> &str {
		self.node_type().unwrap_or(DEFAULT_KIND)
	}

	pub fn pin(&mut self, x: f64, y: f64) {
		self.x = x;
		self.y = y;
		self.fx = Some(x);
		self.fy = Some(y);
	}

	pub fn unpin(&mut self) {
		self.fx = None;
		self.fy = None;
	}

	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() && self.fy.is_some()
	}

	/// `needle` must already be lower-cased.
	fn matches(&self, needle: &str) -> bool {
		self.label.to_lowercase().contains(needle)
			|| self
				.metadata
				.values()
				.filter(|v| !v.is_blank())
				.any(|v| v.to_string().to_lowercase().contains(needle))
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
	pub source: NodeIdx,
	pub target: NodeIdx,
	pub relation: String,
	pub directed: bool,
}

/// Edges touching one node, split by direction.
#[derive(Debug, Default)]
pub struct Connections<'a> {
	pub outgoing: Vec<&'a Edge>,
	pub incoming: Vec<&'a Edge>,
}

impl Connections<'_> {
	pub fn is_empty(&self) -> bool {
		self.outgoing.is_empty() && self.incoming.is_empty()
	}
}

/// Nodes and edges built from one document. Replaced wholesale on reload.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	index: HashMap<String, NodeIdx>,
}

impl GraphModel {
	/// Builds the model, scattering nodes randomly over the viewport.
	/// Edges whose endpoints are unknown are dropped with a warning.
	pub fn from_document<R: Rng>(
		doc: &GraphDocument,
		viewport: Viewport,
		config: &ViewConfig,
		rng: &mut R,
	) -> Result<Self, LoadError> {
		let section = doc.section()?;

		let nodes: Vec<Node> = section
			.nodes
			.iter()
			.map(|(id, record)| {
				let ty = record.metadata.get("type").and_then(|v| v.as_text());
				Node {
					id: id.clone(),
					label: record.label.clone().unwrap_or_else(|| id.clone()),
					metadata: record.metadata.clone(),
					x: rng.gen_range(0.0..=viewport.width.max(0.0)),
					y: rng.gen_range(0.0..=viewport.height.max(0.0)),
					fx: None,
					fy: None,
					color: config.node_color_for(ty).to_owned(),
				}
			})
			.collect();
		let index: HashMap<String, NodeIdx> = nodes
			.iter()
			.enumerate()
			.map(|(i, node)| (node.id.clone(), i))
			.collect();

		let default_directed = section.directed.unwrap_or(true);
		let edges = section
			.edges
			.iter()
			.filter_map(|edge| {
				match (index.get(&edge.source), index.get(&edge.target)) {
					(Some(&source), Some(&target)) => Some(Edge {
						source,
						target,
						relation: edge
							.relation
							.clone()
							.unwrap_or_else(|| DEFAULT_RELATION.to_owned()),
						directed: edge.directed.unwrap_or(default_directed),
					}),
					_ => {
						warn!(
							"Edge references non-existent node: {} -> {}",
							edge.source, edge.target
						);
						None
					}
				}
			})
			.collect();

		Ok(Self {
			nodes,
			edges,
			index,
		})
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn nodes_mut(&mut self) -> &mut [Node] {
		&mut self.nodes
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn node(&self, idx: NodeIdx) -> Option<&Node> {
		self.nodes.get(idx)
	}

	pub fn node_mut(&mut self, idx: NodeIdx) -> Option<&mut Node> {
		self.nodes.get_mut(idx)
	}

	pub fn find(&self, id: &str) -> Option<NodeIdx> {
		self.index.get(id).copied()
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn unpin_all(&mut self) {
		self.nodes.iter_mut().for_each(Node::unpin);
	}

	/// Case-insensitive substring search over labels and metadata values,
	/// in node order. An empty term matches nothing.
	pub fn search(&self, term: &str) -> Vec<&Node> {
		if term.is_empty() {
			return Vec::new();
		}
		let needle = term.to_lowercase();
		self.nodes.iter().filter(|n| n.matches(&needle)).collect()
	}

	pub fn connections(&self, idx: NodeIdx) -> Connections<'_> {
		Connections {
			outgoing: self.edges.iter().filter(|e| e.source == idx).collect(),
			incoming: self.edges.iter().filter(|e| e.target == idx).collect(),
		}
	}

	/// Nodes sharing an edge with `idx`, in either direction.
	pub fn neighbors(&self, idx: NodeIdx) -> HashSet<NodeIdx> {
		self.edges
			.iter()
			.filter_map(|e| {
				if e.source == idx {
					Some(e.target)
				} else if e.target == idx {
					Some(e.source)
				} else {
					None
				}
			})
			.collect()
	}

	pub fn out_degrees(&self) -> Vec<usize> {
		let mut degrees = vec![0; self.nodes.len()];
		for edge in &self.edges {
			degrees[edge.source] += 1;
		}
		degrees
	}

	pub fn in_degrees(&self) -> Vec<usize> {
		let mut degrees = vec![0; self.nodes.len()];
		for edge in &self.edges {
			degrees[edge.target] += 1;
		}
		degrees
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use rand::SeedableRng;
	use rand::rngs::SmallRng;
	use serde_json::json;

	use super::*;

	pub(crate) fn model_from(value: serde_json::Value, viewport: Viewport) -> GraphModel {
		let doc: GraphDocument = serde_json::from_value(value).unwrap();
		let mut rng = SmallRng::seed_from_u64(7);
		GraphModel::from_document(&doc, viewport, &ViewConfig::default(), &mut rng).unwrap()
	}

	fn sample() -> GraphModel {
		model_from(
			json!({"graph": {"directed": true, "nodes": {
				"log4shell": {"label": "Log4Shell", "metadata": {"category": "RCE", "type": "Vulnerability"}},
				"cwe-502": {"label": "Deserialization", "metadata": {"type": "Weakness", "cvss": 0}},
				"host": {"metadata": {"ip": "192.168.1.5"}}
			}, "edges": [
				{"source": "log4shell", "target": "cwe-502", "relation": "exploits"},
				{"source": "log4shell", "target": "ghost"},
				{"source": "host", "target": "log4shell", "directed": false}
			]}}),
			Viewport::new(800.0, 600.0),
		)
	}

	#[test]
	fn load_counts_nodes_and_valid_edges() {
		let model = sample();
		assert_eq!(model.len(), 3);
		assert_eq!(model.edges().len(), 2);
		assert_eq!(model.find("host"), Some(2));
		assert_eq!(model.find("ghost"), None);
	}

	#[test]
	fn load_fills_defaults() {
		let model = sample();
		let host = &model.nodes()[2];
		assert_eq!(host.label, "host");
		assert_eq!(host.kind(), "Node");
		assert_eq!(host.color, "#4f46e5");
		assert_eq!(model.nodes()[0].color, "#f87171");

		assert_eq!(model.edges()[0].relation, "exploits");
		assert!(model.edges()[0].directed);
		assert_eq!(model.edges()[1].relation, DEFAULT_RELATION);
		assert!(!model.edges()[1].directed);
	}

	#[test]
	fn initial_positions_lie_in_viewport() {
		let model = sample();
		for node in model.nodes() {
			assert!((0.0..=800.0).contains(&node.x));
			assert!((0.0..=600.0).contains(&node.y));
			assert!(!node.is_pinned());
		}
	}

	#[test]
	fn graph_level_directed_flag_applies() {
		let model = model_from(
			json!({"graph": {"directed": false,
				"nodes": {"a": {}, "b": {}},
				"edges": [{"source": "a", "target": "b"}]}}),
			Viewport::new(100.0, 100.0),
		);
		assert!(!model.edges()[0].directed);
	}

	#[test]
	fn search_matches_label_or_metadata_case_insensitively() {
		let model = sample();
		let ids = |term| -> Vec<String> {
			model.search(term).into_iter().map(|n| n.id.clone()).collect()
		};
		assert_eq!(ids("rce"), ["log4shell"]);
		assert_eq!(ids("LOG4"), ["log4shell"]);
		assert_eq!(ids("168"), ["host"]);
		assert_eq!(ids("S"), ["log4shell", "cwe-502", "host"]);
		assert!(ids("").is_empty());
		// blank metadata values are not searched
		assert!(ids("0").is_empty());
	}

	#[test]
	fn connections_split_by_direction() {
		let model = sample();
		let conn = model.connections(0);
		assert_eq!(conn.outgoing.len(), 1);
		assert_eq!(conn.incoming.len(), 1);
		assert_eq!(conn.incoming[0].source, 2);
		assert_eq!(model.neighbors(0), HashSet::from([1, 2]));
		assert!(model.connections(1).outgoing.is_empty());
		assert_eq!(model.out_degrees(), [1, 0, 1]);
		assert_eq!(model.in_degrees(), [1, 1, 0]);
	}

	#[test]
	fn missing_graph_section_is_an_error() {
		let doc = GraphDocument::default();
		let mut rng = SmallRng::seed_from_u64(1);
		let result = GraphModel::from_document(
			&doc,
			Viewport::new(10.0, 10.0),
			&ViewConfig::default(),
			&mut rng,
		);
		assert!(matches!(result, Err(LoadError::MissingGraph)));
	}
}
