use std::collections::HashSet;
use std::fmt;

use petgraph::Direction::{Incoming, Outgoing};
use petgraph::algo::{connected_components, dijkstra};
use petgraph::graph::{DiGraph, NodeIndex, UnGraph};

use super::model::GraphModel;

/// Longest shortest path of the undirected graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Diameter {
	Hops(usize),
	NotConnected,
	/// No nodes to measure.
	#[default]
	Unavailable,
}

impl fmt::Display for Diameter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Diameter::Hops(hops) => write!(f, "{hops}"),
			Diameter::NotConnected => f.write_str("Not connected"),
			Diameter::Unavailable => f.write_str("N/A"),
		}
	}
}

/// Summary figures for a loaded graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphStats {
	pub node_count: usize,
	pub edge_count: usize,
	/// Directed density `m / (n (n - 1))`; zero below two nodes.
	pub density: f64,
	pub avg_in_degree: f64,
	pub avg_out_degree: f64,
	/// Whether the graph is connected when edge direction is ignored.
	pub weakly_connected: bool,
	pub diameter: Diameter,
	/// Mean directed clustering coefficient; `None` for an empty graph.
	pub avg_clustering: Option<f64>,
}

impl GraphStats {
	pub fn compute(model: &GraphModel) -> Self {
		let n = model.len();
		let m = model.edges().len();
		let density = if n > 1 {
			m as f64 / (n * (n - 1)) as f64
		} else {
			0.0
		};
		let avg = |total: usize| total as f64 / n.max(1) as f64;
		let directed = directed_graph(model);
		let weakly_connected = n > 0 && connected_components(&directed) == 1;

		Self {
			node_count: n,
			edge_count: m,
			density,
			avg_in_degree: avg(model.in_degrees().iter().sum()),
			avg_out_degree: avg(model.out_degrees().iter().sum()),
			weakly_connected,
			diameter: diameter(model, weakly_connected),
			avg_clustering: average_clustering(&directed),
		}
	}
}

/// Simple directed graph: parallel edges collapse into one.
fn directed_graph(model: &GraphModel) -> DiGraph<(), ()> {
	let mut graph = DiGraph::with_capacity(model.len(), model.edges().len());
	for _ in 0..model.len() {
		graph.add_node(());
	}
	let mut seen = HashSet::new();
	for edge in model.edges() {
		if seen.insert((edge.source, edge.target)) {
			graph.add_edge(NodeIndex::new(edge.source), NodeIndex::new(edge.target), ());
		}
	}
	graph
}

fn diameter(model: &GraphModel, connected: bool) -> Diameter {
	if model.is_empty() {
		return Diameter::Unavailable;
	}
	if !connected {
		return Diameter::NotConnected;
	}
	let mut graph = UnGraph::<(), ()>::with_capacity(model.len(), model.edges().len());
	for _ in 0..model.len() {
		graph.add_node(());
	}
	for edge in model.edges() {
		graph.add_edge(NodeIndex::new(edge.source), NodeIndex::new(edge.target), ());
	}
	let longest = graph
		.node_indices()
		.filter_map(|start| dijkstra(&graph, start, None, |_| 1usize).into_values().max())
		.max()
		.unwrap_or(0);
	Diameter::Hops(longest)
}

/// Directed clustering: for each node, triangles through it in either edge
/// direction over the number possible given its total and reciprocal degree.
fn average_clustering(graph: &DiGraph<(), ()>) -> Option<f64> {
	if graph.node_count() == 0 {
		return None;
	}
	let link = |a: NodeIndex, b: NodeIndex| {
		usize::from(graph.contains_edge(a, b)) + usize::from(graph.contains_edge(b, a))
	};
	let total: f64 = graph
		.node_indices()
		.map(|v| {
			let preds: HashSet<_> = graph.neighbors_directed(v, Incoming).filter(|&u| u != v).collect();
			let succs: HashSet<_> = graph.neighbors_directed(v, Outgoing).filter(|&u| u != v).collect();
			let degree = preds.len() + succs.len();
			let reciprocal = preds.intersection(&succs).count();
			let neighbours: Vec<_> = preds.union(&succs).copied().collect();

			let mut triangles = 0;
			for &u in &neighbours {
				for &w in &neighbours {
					if u != w {
						triangles += link(v, u) * link(u, w) * link(w, v);
					}
				}
			}
			let possible = degree * degree.saturating_sub(1) - 2 * reciprocal;
			if triangles == 0 || possible == 0 {
				0.0
			} else {
				triangles as f64 / (2 * possible) as f64
			}
		})
		.sum();
	Some(total / graph.node_count() as f64)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::graph_view::model::Viewport;
	use crate::components::graph_view::model::tests::model_from;

	fn stats_for(edges: serde_json::Value) -> GraphStats {
		let model = model_from(
			json!({"graph": {"nodes": {"a": {}, "b": {}, "c": {}}, "edges": edges}}),
			Viewport::new(100.0, 100.0),
		);
		GraphStats::compute(&model)
	}

	#[test]
	fn summarises_connected_graph() {
		let stats = stats_for(json!([
			{"source": "a", "target": "b"},
			{"source": "c", "target": "b"}
		]));
		assert_eq!(stats.node_count, 3);
		assert_eq!(stats.edge_count, 2);
		assert!((stats.density - 2.0 / 6.0).abs() < 1e-12);
		assert!((stats.avg_in_degree - 2.0 / 3.0).abs() < 1e-12);
		assert_eq!(stats.avg_in_degree, stats.avg_out_degree);
		assert!(stats.weakly_connected);
		assert_eq!(stats.diameter, Diameter::Hops(2));
		assert_eq!(stats.avg_clustering, Some(0.0));
	}

	#[test]
	fn detects_disconnected_and_empty_graphs() {
		let stats = stats_for(json!([{"source": "a", "target": "b"}]));
		assert!(!stats.weakly_connected);
		assert_eq!(stats.diameter, Diameter::NotConnected);
		assert_eq!(stats.diameter.to_string(), "Not connected");

		let empty = GraphStats::compute(&GraphModel::default());
		assert_eq!(empty.density, 0.0);
		assert_eq!(empty.avg_out_degree, 0.0);
		assert!(!empty.weakly_connected);
		assert_eq!(empty.diameter.to_string(), "N/A");
		assert_eq!(empty.avg_clustering, None);
	}

	#[test]
	fn clustering_counts_directed_triangles() {
		let cycle = stats_for(json!([
			{"source": "a", "target": "b"},
			{"source": "b", "target": "c"},
			{"source": "c", "target": "a"}
		]));
		assert_eq!(cycle.diameter, Diameter::Hops(1));
		assert!((cycle.avg_clustering.unwrap() - 0.5).abs() < 1e-12);

		let mutual = stats_for(json!([
			{"source": "a", "target": "b"}, {"source": "b", "target": "a"},
			{"source": "b", "target": "c"}, {"source": "c", "target": "b"},
			{"source": "c", "target": "a"}, {"source": "a", "target": "c"}
		]));
		assert!((mutual.avg_clustering.unwrap() - 1.0).abs() < 1e-12);
	}
}
