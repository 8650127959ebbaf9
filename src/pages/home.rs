use leptos::prelude::*;
use log::warn;
use wasm_bindgen::JsCast;
use web_sys::HtmlScriptElement;

use crate::components::controls::{LayoutSelector, NodeSizeSlider, ResetZoomButton, SearchBox};
use crate::components::graph_view::{
	EdgeListPanel, GraphCanvas, GraphDocument, GraphSummary, GraphView, LoadError,
	NodeDetailsPanel, NodeTooltip, ViewConfig,
};

/// Id of the `<script type="application/json">` element holding the graph.
const GRAPH_DATA_ID: &str = "graph-data";

/// Decodes the embedded document text. Missing text gives an empty document;
/// a document the view cannot use is left for the view to log and skip.
fn document_from(text: Option<String>) -> Result<GraphDocument, LoadError> {
	match text {
		Some(text) => GraphDocument::from_json(&text),
		None => {
			warn!("No #{GRAPH_DATA_ID} element on the page");
			Ok(GraphDocument::default())
		}
	}
}

fn embedded_document() -> Result<GraphDocument, LoadError> {
	document_from(
		web_sys::window()
			.and_then(|w| w.document())
			.and_then(|d| d.get_element_by_id(GRAPH_DATA_ID))
			.and_then(|el| el.dyn_into::<HtmlScriptElement>().ok())
			.and_then(|script| script.text().ok()),
	)
}

#[component]
fn Explorer(document: GraphDocument) -> impl IntoView {
	let graph = GraphView::new(ViewConfig::default());
	let data = Signal::stored(document);

	view! {
		<div class="explorer">
			<header class="toolbar">
				<h1>"Graph Explorer"</h1>
				<LayoutSelector graph=graph />
				<ResetZoomButton graph=graph />
				<NodeSizeSlider graph=graph />
				<SearchBox graph=graph />
			</header>
			<main class="explorer-body">
				<div id="graph-container" class="graph-container">
					<GraphCanvas graph=graph data=data />
				</div>
				<aside class="sidebar">
					<section>
						<h2>"Details"</h2>
						<NodeDetailsPanel graph=graph />
					</section>
					<section>
						<h2>"Connections"</h2>
						<EdgeListPanel graph=graph />
					</section>
					<section>
						<h2>"Summary"</h2>
						<GraphSummary graph=graph />
					</section>
				</aside>
			</main>
			<NodeTooltip graph=graph />
		</div>
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let document = embedded_document();

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>{document.map(|document| view! { <Explorer document=document /> })}</ErrorBoundary>
	}
}
