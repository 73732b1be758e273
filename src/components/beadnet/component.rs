use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::handle::Beadnet;
use super::render;

/// Canvas view of a [`Beadnet`], animated every frame.
#[component]
pub fn BeadnetCanvas(
	/// Network to draw; the caller keeps a clone to drive it.
	beadnet: Beadnet,
	/// Fill the window and follow its size.
	#[prop(default = false)]
	fullscreen: bool,
	/// Canvas width, otherwise the parent's.
	#[prop(default = None)]
	width: Option<f64>,
	/// Canvas height, otherwise the parent's.
	#[prop(default = None)]
	height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (net_init, animate_init, resize_cb_init) =
		(beadnet.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return,
			},
			_ => {
				log::warn!("canvas has no 2d context");
				return;
			}
		};
		{
			let mut s = net_init.state_mut();
			s.resize(w, h);
			s.transform.x = w / 2.0;
			s.transform.y = h / 2.0;
		}

		if fullscreen {
			let (net_resize, canvas_resize) = (net_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				net_resize.state_mut().resize(nw, nh);
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (net_anim, animate_inner) = (net_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			net_anim.tick(0.016);
			render::render(&net_anim.state(), &ctx);
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let net_md = beadnet.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		let hit = net_md.state().node_at_position(x, y);
		match hit {
			Some(id) => {
				net_md.on_drag_start(&id);
				let mut s = net_md.state_mut();
				s.drag.start_x = x;
				s.drag.start_y = y;
			}
			None => {
				let mut s = net_md.state_mut();
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let net_mm = beadnet.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		let dragged = {
			let s = net_mm.state();
			s.drag.node_id.clone().map(|id| {
				(
					id,
					s.drag.node_start_x + (x - s.drag.start_x) / s.transform.k,
					s.drag.node_start_y + (y - s.drag.start_y) / s.transform.k,
				)
			})
		};
		if let Some((id, nx, ny)) = dragged {
			net_mm.on_dragged(&id, nx, ny);
			return;
		}
		let mut s = net_mm.state_mut();
		if s.pan.active {
			s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
			s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
		}
	};

	let net_mu = beadnet.clone();
	let on_mouseup = move |_: MouseEvent| release(&net_mu);

	let net_ml = beadnet.clone();
	let on_mouseleave = move |_: MouseEvent| release(&net_ml);

	let net_wh = beadnet.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		net_wh.state_mut().zoom_at(x, y, factor);
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="beadnet-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	(
		window
			.inner_width()
			.ok()
			.and_then(|v| v.as_f64())
			.unwrap_or(800.0),
		window
			.inner_height()
			.ok()
			.and_then(|v| v.as_f64())
			.unwrap_or(600.0),
	)
}

fn local_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn release(beadnet: &Beadnet) {
	let dragged = beadnet.state().drag.node_id.clone();
	if let Some(id) = dragged {
		beadnet.on_drag_end(&id);
	}
	beadnet.state_mut().pan.active = false;
}
