//! Side panels and the floating tooltip. Each one is optional: the page
//! decides which of them to place.

use leptos::prelude::*;

use super::state::{ConnectionRow, NodeSelection, TooltipContent};
use super::view::GraphView;

/// Metadata rows for the details panel: every non-null field except `type`,
/// with upper-cased keys.
pub fn detail_rows(selection: &NodeSelection) -> Vec<(String, String)> {
	selection
		.node
		.metadata
		.iter()
		.filter(|(key, value)| key.as_str() != "type" && !value.is_null())
		.map(|(key, value)| (key.to_uppercase(), value.to_string()))
		.collect()
}

#[component]
pub fn NodeTooltip(graph: GraphView) -> impl IntoView {
	let tooltip = graph.tooltip();
	move || {
		tooltip.get().map(|tip| {
			let body = match tip.content {
				TooltipContent::Node {
					label,
					kind,
					fields,
				} => view! {
					<div class="font-medium">{label}</div>
					<div class="text-xs text-gray-500">{kind}</div>
					{(!fields.is_empty())
						.then(|| {
							view! {
								<div class="mt-1 text-xs">
									{fields
										.into_iter()
										.map(|(label, value)| {
											view! {
												<div>
													<span class="text-gray-500">{format!("{label}:")}</span>
													" "
													{value}
												</div>
											}
										})
										.collect_view()}
								</div>
							}
						})}
				}
				.into_any(),
				TooltipContent::Edge {
					source,
					relation,
					target,
				} => view! {
					<div class="font-medium">"Relationship"</div>
					<div class="text-xs">
						<span class="text-blue-500">{source}</span>
						<span class="mx-2 text-gray-500">{relation}</span>
						<span class="text-blue-500">{target}</span>
					</div>
				}
				.into_any(),
			};
			view! {
				<div
					id="node-tooltip"
					class="graph-tooltip"
					style:left=format!("{}px", tip.left)
					style:top=format!("{}px", tip.top)
					style:display="block"
				>
					{body}
				</div>
			}
		})
	}
}

#[component]
pub fn NodeDetailsPanel(graph: GraphView) -> impl IntoView {
	let selection = graph.selection();
	view! {
		<div id="node-details" class="node-details">
			{move || match selection.get() {
				None => view! { <p class="italic">"Click a node to see its details"</p> }.into_any(),
				Some(selection) => {
					let rows = detail_rows(&selection);
					view! {
						<div class="mb-3">
							<h3 class="text-lg font-medium text-gray-900">{selection.node.label.clone()}</h3>
							<p class="text-sm text-indigo-600">{selection.node.kind().to_owned()}</p>
						</div>
						<div class="space-y-2">
							{rows
								.into_iter()
								.map(|(key, value)| {
									view! {
										<div>
											<span class="text-xs font-medium text-gray-500">{key}</span>
											<p class="mt-1 text-sm text-gray-900">{value}</p>
										</div>
									}
								})
								.collect_view()}
						</div>
					}
					.into_any()
				}
			}}
		</div>
	}
}

fn connection_group(title: &'static str, rows: Vec<ConnectionRow>, outgoing: bool) -> impl IntoView {
	let count = rows.len();
	(count > 0).then(|| {
		view! {
			<div>
				<h4 class="font-medium text-gray-700 mb-1">{format!("{title} ({count})")}</h4>
				<ul class="space-y-1">
					{rows
						.into_iter()
						.map(|row| {
							if outgoing {
								view! {
									<li class="flex items-center text-xs">
										<span class="text-gray-500 mr-1">{format!("{}:", row.relation)}</span>
										<span class="font-medium">{row.peer_label}</span>
									</li>
								}
								.into_any()
							} else {
								view! {
									<li class="flex items-center text-xs">
										<span class="font-medium">{row.peer_label}</span>
										<span class="text-gray-500 mx-1">{row.relation}</span>
									</li>
								}
								.into_any()
							}
						})
						.collect_view()}
				</ul>
			</div>
		}
	})
}

#[component]
pub fn EdgeListPanel(graph: GraphView) -> impl IntoView {
	let selection = graph.selection();
	view! {
		<div id="edge-list" class="edge-list">
			{move || {
				selection
					.get()
					.map(|selection| {
						if selection.outgoing.is_empty() && selection.incoming.is_empty() {
							view! { <p class="italic">"No connections for this node"</p> }.into_any()
						} else {
							view! {
								<div class="space-y-4">
									{connection_group("Outgoing", selection.outgoing, true)}
									{connection_group("Incoming", selection.incoming, false)}
								</div>
							}
							.into_any()
						}
					})
			}}
		</div>
	}
}

#[component]
pub fn GraphSummary(graph: GraphView) -> impl IntoView {
	let stats = graph.stats();
	move || {
		stats.get().map(|stats| {
			view! {
				<dl class="graph-summary">
					<dt>"Nodes"</dt>
					<dd>{stats.node_count}</dd>
					<dt>"Edges"</dt>
					<dd>{stats.edge_count}</dd>
					<dt>"Density"</dt>
					<dd>{format!("{:.3}", stats.density)}</dd>
					<dt>"Avg. in / out degree"</dt>
					<dd>{format!("{:.2} / {:.2}", stats.avg_in_degree, stats.avg_out_degree)}</dd>
					<dt>"Weakly connected"</dt>
					<dd>{if stats.weakly_connected { "yes" } else { "no" }}</dd>
					<dt>"Diameter"</dt>
					<dd>{stats.diameter.to_string()}</dd>
					<dt>"Avg. clustering"</dt>
					<dd>
						{stats
							.avg_clustering
							.map_or_else(|| "N/A".to_owned(), |c| format!("{c:.3}"))}
					</dd>
				</dl>
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::model::Node;

	#[test]
	fn detail_rows_skip_type_and_nulls() {
		let metadata = serde_json::from_value(serde_json::json!({
			"type": "Asset",
			"os": "Linux",
			"owner": null,
			"exposed": false
		}))
		.unwrap();
		let selection = NodeSelection {
			node: Node {
				id: "srv".into(),
				label: "Server".into(),
				metadata,
				x: 0.0,
				y: 0.0,
				fx: None,
				fy: None,
				color: "#60a5fa".into(),
			},
			outgoing: Vec::new(),
			incoming: Vec::new(),
		};
		assert_eq!(
			detail_rows(&selection),
			[
				("OS".to_owned(), "Linux".to_owned()),
				("EXPOSED".to_owned(), "false".to_owned()),
			]
		);
	}
}
