use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::path::{ChannelPath, RenderedPath};
use super::state::BeadnetState;

/// Draw one frame. Reads state only.
pub fn render(state: &BeadnetState, ctx: &CanvasRenderingContext2d) {
	let opt = &state.ctx.options;
	ctx.set_fill_style_str(&opt.container.background_color);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_channels(state, ctx);
	draw_beads(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn trace(path: &RenderedPath, ctx: &CanvasRenderingContext2d) {
	ctx.begin_path();
	match path {
		RenderedPath::Line(line) => {
			ctx.move_to(line.from.x, line.from.y);
			ctx.line_to(line.to.x, line.to.y);
		}
		RenderedPath::Curve(curve) => {
			ctx.move_to(curve.from.x, curve.from.y);
			ctx.quadratic_curve_to(curve.control.x, curve.control.y, curve.to.x, curve.to.y);
		}
	}
}

fn draw_channels(state: &BeadnetState, ctx: &CanvasRenderingContext2d) {
	let opt = &state.ctx.options.channels;

	for (channel, path) in state.channel_paths() {
		let width = opt.stroke_width.for_capacity(channel.capacity());
		let dash = width * 2.0;
		trace(&path, ctx);
		ctx.set_line_width(width);
		if channel.highlighted {
			ctx.set_stroke_style_str(&opt.color_highlighted);
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(dash / 2.0),
			));
		} else {
			ctx.set_stroke_style_str(&opt.color);
		}
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());

		if opt.show_balance {
			// split read from the ledger, so it ticks with every arrival
			let mid = path.point_at_length(path.total_length() / 2.0);
			ctx.set_fill_style_str(&opt.color);
			ctx.set_font("12px Verdana");
			ctx.set_text_align("center");
			let _ = ctx.fill_text(
				&format!("{}:{}", channel.source_balance, channel.target_balance),
				mid.x,
				mid.y - width - 7.0,
			);
		}
	}
}

fn draw_beads(state: &BeadnetState, ctx: &CanvasRenderingContext2d) {
	let opt = &state.ctx.options;
	let beads = &opt.beads;

	for placement in state.bead_placements() {
		let (x, y) = (placement.point.x, placement.point.y);
		ctx.begin_path();
		let _ = ctx.arc(x, y, beads.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&beads.color);
		ctx.fill();
		ctx.set_line_width(beads.stroke_width);
		ctx.set_stroke_style_str(&beads.stroke_color);
		ctx.stroke();

		if beads.show_index {
			ctx.set_fill_style_str(&opt.container.background_color);
			ctx.set_font("8px sans-serif");
			ctx.set_text_align("center");
			let _ = ctx.fill_text(&placement.index.to_string(), x, y + 2.0);
		}
	}
}

fn draw_nodes(state: &BeadnetState, ctx: &CanvasRenderingContext2d) {
	let opt = &state.ctx.options;
	let positions = state.node_positions();
	let text_color = &opt.container.background_color;

	for node in state.ledger.nodes() {
		let Some(p) = positions.get(&node.id) else {
			continue;
		};
		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, opt.nodes.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&node.color);
		ctx.fill();
		ctx.set_line_width(opt.nodes.stroke_width);
		ctx.set_stroke_style_str(opt.node_stroke_color());
		ctx.stroke();

		ctx.set_fill_style_str(text_color);
		ctx.set_text_align("center");
		ctx.set_font("15px sans-serif");
		let _ = ctx.fill_text(&node.id, p.x, p.y);
		if opt.nodes.show_balance {
			ctx.set_font("12px sans-serif");
			let _ = ctx.fill_text(&node.balance.to_string(), p.x, p.y + 15.0);
		}
	}
}
