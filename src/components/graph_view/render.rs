use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::model::Edge;
use super::state::{GraphViewState, Hover};

/// Length of the arrow marker path in marker units.
const MARKER_LENGTH: f64 = 10.0;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(&state.config.background);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	draw_labels(state, ctx);
	ctx.restore();
}

fn edge_is_highlighted(state: &GraphViewState, edge: &Edge) -> bool {
	state.is_selected(edge.source) || state.is_selected(edge.target)
}

fn draw_edges(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	let config = &state.config;
	let t = ease_out_cubic(state.highlight.t);
	let has_highlight = state.has_active_highlight();
	// The marker is drawn in stroke-width units, offset back from the
	// target centre by its reference point.
	let unit = config.arrow_size / MARKER_LENGTH * config.edge_width;
	let (arrow_len, arrow_half) = (MARKER_LENGTH * unit, MARKER_LENGTH / 2.0 * unit);
	let tip_inset = (state.marker_offset() - MARKER_LENGTH) * unit;
	let nodes = state.model.nodes();

	for (i, edge) in state.model.edges().iter().enumerate() {
		let (a, b) = (&nodes[edge.source], &nodes[edge.target]);
		let (dx, dy) = (b.x - a.x, b.y - a.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		let hovered = state.hover == Hover::Edge(i);
		let highlighted = has_highlight && edge_is_highlighted(state, edge);
		let (alpha, width, color) = if hovered {
			(1.0, config.edge_width * 2.0, config.highlight_color.as_str())
		} else if highlighted {
			(
				0.6 + 0.4 * t,
				config.edge_width * (1.0 + 0.6 * t),
				config.highlight_color.as_str(),
			)
		} else if has_highlight {
			(1.0 - 0.7 * t, config.edge_width, config.edge_color.as_str())
		} else {
			(1.0, config.edge_width, config.edge_color.as_str())
		};

		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(color);
		ctx.set_line_width(width);
		let (ux, uy) = (dx / dist, dy / dist);
		let end_inset = if edge.directed { tip_inset + arrow_len } else { 0.0 };
		ctx.begin_path();
		ctx.move_to(a.x, a.y);
		ctx.line_to(b.x - ux * end_inset, b.y - uy * end_inset);
		ctx.stroke();

		if edge.directed {
			ctx.set_fill_style_str(color);
			let (tip_x, tip_y) = (b.x - ux * tip_inset, b.y - uy * tip_inset);
			let (back_x, back_y) = (tip_x - ux * arrow_len, tip_y - uy * arrow_len);
			let (px, py) = (-uy * arrow_half, ux * arrow_half);
			ctx.begin_path();
			ctx.move_to(tip_x, tip_y);
			ctx.line_to(back_x + px, back_y + py);
			ctx.line_to(back_x - px, back_y - py);
			ctx.close_path();
			ctx.fill();
		}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.highlight.t),
		state.transform.k,
	);
	let base = state.node_radius();

	for (idx, node) in state.model.nodes().iter().enumerate() {
		let (x, y) = (node.x, node.y);
		let highlighted = state.is_highlighted(idx);
		let selected = state.is_selected(idx);
		let (alpha, radius) = if !has_highlight || highlighted {
			let grow = if selected { 0.35 } else if highlighted { 0.2 } else { 0.0 };
			(1.0, base * (1.0 + grow * t))
		} else {
			(1.0 - 0.6 * t, base)
		};

		if selected && t > 0.01 {
			let glow_radius = base * (1.8 + 1.2 * t);
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius) {
				let _ = gradient.add_color_stop(0.0, &format!("rgba(99, 102, 241, {})", 0.35 * t));
				let _ = gradient.add_color_stop(0.6, &format!("rgba(99, 102, 241, {})", 0.1 * t));
				let _ = gradient.add_color_stop(1.0, "rgba(99, 102, 241, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&node.color);
		ctx.fill();
		ctx.set_stroke_style_str("#ffffff");
		ctx.set_line_width(1.5);
		ctx.stroke();
		ctx.set_global_alpha(1.0);

		if state.hover == Hover::Node(idx) {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&state.config.highlight_color);
			ctx.set_line_width(2.0 / k);
			ctx.stroke();
		}
	}
}

fn draw_labels(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	let config = &state.config;
	let (has_highlight, t) = (
		state.has_active_highlight(),
		ease_out_cubic(state.highlight.t),
	);
	ctx.set_font(&format!("{}px sans-serif", config.label_font_size));
	ctx.set_fill_style_str(&config.label_color);

	for (idx, node) in state.model.nodes().iter().enumerate() {
		let alpha = if has_highlight && !state.is_highlighted(idx) {
			1.0 - 0.6 * t
		} else {
			1.0
		};
		ctx.set_global_alpha(alpha);
		let _ = ctx.fill_text(&node.label, node.x + state.node_radius() + 2.0, node.y + 4.0);
	}
	ctx.set_global_alpha(1.0);
}
