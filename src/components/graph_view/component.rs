use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use send_wrapper::SendWrapper;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, CustomEvent, CustomEventInit, HtmlCanvasElement, MouseEvent,
	WheelEvent, Window,
};

use super::state::NodeSelection;
use super::types::GraphDocument;
use super::view::GraphView;

/// Name of the DOM event fired on the canvas container when a node is
/// selected.
pub const NODE_SELECTED_EVENT: &str = "nodeSelected";

/// Longest frame step fed to the simulation, in seconds.
const MAX_FRAME_SECS: f64 = 0.1;

fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;
type ResizeCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Browser callbacks owned by one canvas, released when it unmounts.
#[derive(Clone, Default)]
struct LoopHandles {
	animate: FrameCallback,
	resize: ResizeCallback,
	frame_id: Rc<Cell<Option<i32>>>,
}

impl LoopHandles {
	/// Cancels the pending frame and detaches the resize listener before
	/// dropping the closures they point at.
	fn release(&self) {
		let window = web_sys::window();
		if let (Some(window), Some(id)) = (&window, self.frame_id.take()) {
			let _ = window.cancel_animation_frame(id);
		}
		self.animate.borrow_mut().take();
		if let (Some(window), Some(cb)) = (&window, self.resize.borrow_mut().take()) {
			let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
	}
}

/// Fires [`NODE_SELECTED_EVENT`] on `target` with the node record as detail.
fn dispatch_selection(target: &web_sys::Element, selection: &NodeSelection) {
	let serializer = serde_wasm_bindgen::Serializer::json_compatible();
	let detail = match selection.node.serialize(&serializer) {
		Ok(detail) => detail,
		Err(e) => {
			warn!("Could not serialize selected node: {e}");
			return;
		}
	};
	let init = CustomEventInit::new();
	init.set_bubbles(true);
	init.set_detail(&detail);
	match CustomEvent::new_with_event_init_dict(NODE_SELECTED_EVENT, &init) {
		Ok(event) => {
			let _ = target.dispatch_event(&event);
		}
		Err(e) => warn!("Could not create {NODE_SELECTED_EVENT} event: {e:?}"),
	}
}

/// Canvas surface for a [`GraphView`]. Loads `data` whenever it changes.
#[component]
pub fn GraphCanvas(
	graph: GraphView,
	#[prop(into)] data: Signal<GraphDocument>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	/// Called with every node selection, after the DOM event is dispatched.
	#[prop(optional)]
	on_select: Option<Callback<NodeSelection>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let ready = RwSignal::new(false);
	let handles = LoopHandles::default();
	let (animate_init, resize_cb_init, frame_id) = (
		handles.animate.clone(),
		handles.resize.clone(),
		handles.frame_id.clone(),
	);

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if animate_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			warn!("No window; graph canvas disabled");
			return;
		};

		let parent_size = |get: fn(&web_sys::Element) -> i32, fallback: f64| {
			canvas
				.parent_element()
				.map(|p| get(&p) as f64)
				.filter(|v| *v > 0.0)
				.unwrap_or(fallback)
		};
		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| parent_size(web_sys::Element::client_width, 800.0)),
				height.unwrap_or_else(|| parent_size(web_sys::Element::client_height, 600.0)),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		graph.resize(w, h);

		let ctx: CanvasRenderingContext2d = match canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into().ok())
		{
			Some(ctx) => ctx,
			None => {
				warn!("Canvas 2d context unavailable");
				return;
			}
		};

		if fullscreen {
			let canvas_resize = canvas.clone();
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				graph.resize(nw, nh);
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (animate_inner, frame_inner) = (animate_init.clone(), frame_id.clone());
		let last_frame = Cell::new(None::<f64>);
		*animate_init.borrow_mut() = Some(Closure::new(move |now: f64| {
			let dt = last_frame
				.replace(Some(now))
				.map(|last| ((now - last) / 1000.0).clamp(0.0, MAX_FRAME_SECS))
				.unwrap_or(0.0);
			graph.frame(dt, &ctx);
			if let Some(ref cb) = *animate_inner.borrow() {
				if let Some(window) = web_sys::window() {
					frame_inner.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			frame_id.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
		ready.set(true);
	});

	Effect::new(move |_| {
		let doc = data.get();
		if ready.get() {
			graph.load_data(&doc);
		}
	});

	let selection = graph.selection();
	Effect::new(move |_| {
		let Some(selection) = selection.get() else {
			return;
		};
		debug!("Notifying selection of {}", selection.node.id);
		if let Some(container) = canvas_ref.get_untracked().and_then(|c| c.parent_element()) {
			dispatch_selection(&container, &selection);
		}
		if let Some(cb) = on_select {
			cb.run(selection);
		}
	});

	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = canvas_point(&canvas, &ev);
		graph.pointer_down(x, y);
	};

	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = canvas_point(&canvas, &ev);
		graph.pointer_move(x, y, ev.page_x() as f64, ev.page_y() as f64);
	};

	let on_mouseup = move |_: MouseEvent| graph.pointer_up();

	let on_mouseleave = move |_: MouseEvent| graph.pointer_leave();

	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = canvas_point(&canvas, &ev);
		graph.wheel(x, y, ev.delta_y());
	};

	// on_cleanup requires Send + Sync
	let handles = SendWrapper::new(handles);
	on_cleanup(move || handles.release());

	view! {
		<canvas
			node_ref=canvas_ref
			class="graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cleanup_bounds<F: FnOnce() + Send + Sync + 'static>(f: F) -> F {
		f
	}

	#[test]
	fn loop_handles_can_be_moved_into_cleanup() {
		let handles = SendWrapper::new(LoopHandles::default());
		let observed = handles.frame_id.clone();
		let release = cleanup_bounds(move || handles.frame_id.set(Some(1)));
		release();
		assert_eq!(observed.get(), Some(1));
	}
}
