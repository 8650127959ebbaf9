//! Toolbar controls bound to a [`GraphView`].

use std::time::Duration;

use leptos::prelude::*;
use log::warn;

use crate::components::graph_view::model::Node;
use crate::components::graph_view::{GraphView, LayoutKind};

/// Delay between the last keystroke and the search running.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
/// Shortest trimmed term that triggers a search, in characters.
pub const MIN_SEARCH_LEN: usize = 2;
/// Results shown in the dropdown.
pub const MAX_RESULTS: usize = 10;

/// One row of the search dropdown.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
	pub id: String,
	pub label: String,
	pub kind: String,
}

/// What the search dropdown shows.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SearchOutcome {
	/// Term too short, or cleared.
	#[default]
	Hidden,
	NoMatches,
	Matches(Vec<SearchHit>),
}

/// The term to search for, or `None` when it is too short.
pub fn search_term(input: &str) -> Option<&str> {
	let term = input.trim();
	(term.chars().count() >= MIN_SEARCH_LEN).then_some(term)
}

/// Shapes search results for the dropdown.
pub fn search_outcome(matches: Vec<Node>) -> SearchOutcome {
	if matches.is_empty() {
		return SearchOutcome::NoMatches;
	}
	SearchOutcome::Matches(
		matches
			.into_iter()
			.take(MAX_RESULTS)
			.map(|node| SearchHit {
				kind: node.kind().to_owned(),
				id: node.id,
				label: node.label,
			})
			.collect(),
	)
}

fn run_search(graph: GraphView, input: &str) -> SearchOutcome {
	match search_term(input) {
		Some(term) => search_outcome(graph.search_nodes(term)),
		None => SearchOutcome::Hidden,
	}
}

#[component]
pub fn LayoutSelector(graph: GraphView) -> impl IntoView {
	let layout = graph.layout();
	view! {
		<label class="control">
			<span>"Layout"</span>
			<select
				id="layoutSelector"
				prop:value=move || layout.get().as_str()
				on:change=move |ev| graph.apply_layout_named(&event_target_value(&ev))
			>
				{LayoutKind::ALL
					.iter()
					.map(|kind| view! { <option value=kind.as_str()>{kind.label()}</option> })
					.collect_view()}
			</select>
		</label>
	}
}

#[component]
pub fn ResetZoomButton(graph: GraphView) -> impl IntoView {
	view! {
		<button id="resetZoomBtn" class="control-button" on:click=move |_| graph.reset_zoom()>
			"Reset zoom"
		</button>
	}
}

#[component]
pub fn NodeSizeSlider(
	graph: GraphView,
	#[prop(default = 4)] min: u32,
	#[prop(default = 20)] max: u32,
) -> impl IntoView {
	let radius = graph.node_radius();
	let on_input = move |ev: web_sys::Event| {
		let value = event_target_value(&ev);
		match value.parse::<u32>() {
			Ok(size) => graph.update_node_size(size as f64),
			Err(e) => warn!("Ignoring node size {value:?}: {e}"),
		}
	};
	view! {
		<label class="control">
			<span>"Node size"</span>
			<input
				id="nodeSizeSlider"
				type="range"
				min=min
				max=max
				prop:value=move || radius.get().to_string()
				on:input=on_input
			/>
		</label>
	}
}

/// Search field with a debounced dropdown of matching nodes. Picking a
/// result focuses that node.
#[component]
pub fn SearchBox(graph: GraphView) -> impl IntoView {
	let query = RwSignal::new(String::new());
	let outcome = RwSignal::new(SearchOutcome::Hidden);
	let pending = StoredValue::new(None::<TimeoutHandle>);

	let cancel_pending = move || {
		if let Some(handle) = pending.try_update_value(Option::take).flatten() {
			handle.clear();
		}
	};

	let on_input = move |ev: web_sys::Event| {
		query.set(event_target_value(&ev));
		cancel_pending();
		let scheduled = set_timeout_with_handle(
			move || {
				pending.set_value(None);
				outcome.set(run_search(graph, &query.get_untracked()));
			},
			SEARCH_DEBOUNCE,
		);
		match scheduled {
			Ok(handle) => pending.set_value(Some(handle)),
			Err(e) => warn!("Could not schedule search: {e:?}"),
		}
	};

	let search_now = move |_| {
		cancel_pending();
		outcome.set(run_search(graph, &query.get_untracked()));
	};

	let clear = move |_| {
		cancel_pending();
		query.set(String::new());
		outcome.set(SearchOutcome::Hidden);
	};

	let results = move || match outcome.get() {
		SearchOutcome::Hidden => ().into_any(),
		SearchOutcome::NoMatches => {
			view! { <p class="p-2 text-gray-500">"No matching nodes found"</p> }.into_any()
		}
		SearchOutcome::Matches(hits) => hits
			.into_iter()
			.map(|hit| {
				let SearchHit { id, label, kind } = hit;
				view! {
					<div class="search-result-item" on:click=move |_| graph.focus_node(&id)>
						<div class="font-medium">{label}</div>
						<div class="text-xs text-gray-500">{kind}</div>
					</div>
				}
			})
			.collect_view()
			.into_any(),
	};

	view! {
		<div class="search">
			<div class="search-row">
				<input
					id="searchInput"
					type="search"
					placeholder="Search nodes"
					prop:value=move || query.get()
					on:input=on_input
				/>
				<button id="searchBtn" class="control-button" on:click=search_now>
					"Search"
				</button>
				<button id="clearSearchBtn" class="control-button" on:click=clear>
					"Clear"
				</button>
			</div>
			<div id="searchResults" class="search-results">
				{results}
			</div>
		</div>
	}
}
