//! Leptos component wrapping the explorer canvas.
//!
//! The component creates an HTML canvas element and wires up mouse/wheel event
//! handlers for panning, zooming and clicking. An animation loop runs via
//! `requestAnimationFrame`, easing the view and highlight opacity and
//! redrawing whenever something changed. Nodes are not draggable.
//!
//! The loop and the window resize listener belong to the mounted canvas and
//! are released when the component is disposed.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::adapter::RenderGraph;
use super::render::{self, Scene};
use super::state::{ViewCommand, ViewRequest};
use super::theme::Theme;
use super::transition::{OpacityFade, ViewAnimation};
use super::view::{PanState, ViewTransform, bounds_of, node_at, toolbar_rect};

/// Fixed animation step, as one frame at 60 fps.
const FRAME_DT: f64 = 0.016;

/// Canvas-side mirror of the explorer state plus everything the loop animates.
#[derive(Default)]
struct CanvasContext {
	graph: RenderGraph,
	selected: Option<String>,
	transform: ViewTransform,
	pan: PanState,
	view_anim: ViewAnimation,
	fade: OpacityFade,
	/// Latest view command not yet turned into an animation target.
	pending_view: Option<ViewCommand>,
	applied_seq: u64,
	width: f64,
	height: f64,
	time: f64,
	/// Set when the next frame must be drawn even if nothing animates.
	dirty: bool,
}

/// Browser callbacks registered for one mounted canvas.
#[derive(Default)]
struct FrameLoop {
	animate: Option<Closure<dyn FnMut()>>,
	resize: Option<Closure<dyn FnMut()>>,
	/// Id of the pending `requestAnimationFrame` callback.
	frame: Option<i32>,
	stopped: bool,
}

impl FrameLoop {
	/// Queue the next frame unless the loop was stopped.
	fn request_frame(&mut self, window: &Window) {
		if self.stopped {
			return;
		}
		self.frame = self
			.animate
			.as_ref()
			.and_then(|cb| window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
	}

	/// Cancel the pending frame, remove the resize listener and drop both
	/// closures, which breaks the animate closure's reference to itself.
	fn stop(&mut self) {
		self.stopped = true;
		let (frame, resize, animate) = (self.frame.take(), self.resize.take(), self.animate.take());
		if frame.is_none() && resize.is_none() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};
		if let Some(id) = frame {
			let _ = window.cancel_animation_frame(id);
		}
		if let Some(cb) = resize {
			let listener = cb.as_ref().unchecked_ref();
			let _ = window.remove_event_listener_with_callback("resize", listener);
		}
		drop(animate);
		debug!("catalog-explorer: canvas loop stopped");
	}
}

/// What a completed click hit.
enum ClickTarget {
	Toolbar(String),
	Node(String),
	Background,
}

impl CanvasContext {
	/// Take a new graph, restarting opacity when the layout changed.
	fn set_graph(&mut self, graph: RenderGraph) {
		let relaid = graph.nodes.len() != self.graph.nodes.len()
			|| graph
				.nodes
				.iter()
				.zip(&self.graph.nodes)
				.any(|(a, b)| a.id != b.id || a.position != b.position);
		if relaid {
			self.fade.reset(&graph);
		}
		self.graph = graph;
		self.dirty = true;
	}

	fn set_selected(&mut self, selected: Option<String>) {
		self.selected = selected;
		self.dirty = true;
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.dirty = true;
	}

	fn apply_pending_view(&mut self) {
		if self.width <= 0.0 || self.height <= 0.0 {
			return;
		}
		let Some(command) = self.pending_view.take() else {
			return;
		};
		if command.seq <= self.applied_seq {
			return;
		}
		self.applied_seq = command.seq;

		let (bounds, padding) = match &command.request {
			ViewRequest::FitAll { padding } => (bounds_of(&self.graph.nodes), *padding),
			ViewRequest::FitNodes { ids, padding } => (
				bounds_of(self.graph.nodes.iter().filter(|n| ids.contains(&n.id))),
				*padding,
			),
		};
		match bounds {
			Some(bounds) => {
				let target = ViewTransform::fit(bounds, self.width, self.height, padding);
				self.view_anim.start(target);
			}
			None => debug!("catalog-explorer: nothing to fit for view {}", command.seq),
		}
	}

	fn click_target(&self, x: f64, y: f64, app_base: &str) -> ClickTarget {
		let (gx, gy) = self.transform.screen_to_graph(x, y);

		let selected = self
			.selected
			.as_deref()
			.and_then(|id| self.graph.node(id));
		if let Some(node) = selected {
			if let (Some(action), Some(rect)) = (node.toolbar.as_ref(), toolbar_rect(node)) {
				if rect.contains(gx, gy) {
					return ClickTarget::Toolbar(action.href(app_base));
				}
			}
		}

		match node_at(&self.graph.nodes, gx, gy) {
			Some(node) if !node.is_group() => ClickTarget::Node(node.id.clone()),
			_ => ClickTarget::Background,
		}
	}

	/// Advance animations by `dt`; returns whether the frame needs drawing.
	fn tick(&mut self, dt: f64) -> bool {
		self.time += dt;
		self.apply_pending_view();
		let easing_view = !self.pan.active && self.view_anim.is_running();
		if easing_view {
			self.view_anim.tick(&mut self.transform, dt);
		}
		let fading = self.fade.tick(&self.graph, dt);
		let flowing = self.graph.edges.iter().any(|e| e.animated);
		std::mem::take(&mut self.dirty) || easing_view || fading || flowing
	}
}

fn viewport_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn event_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn set_cursor(canvas_ref: NodeRef<leptos::html::Canvas>, cursor: &str) {
	if let Some(canvas) = canvas_ref.get() {
		let canvas: HtmlCanvasElement = canvas.into();
		let _ = web_sys::HtmlElement::style(&canvas).set_property("cursor", cursor);
	}
}

fn navigate(href: &str) {
	let Some(window) = web_sys::window() else {
		return;
	};
	if let Err(e) = window.location().set_href(href) {
		warn!("catalog-explorer: navigation to {} failed: {:?}", href, e);
	}
}

/// Renders the lineage graph on a canvas element.
///
/// The component sizes itself to its parent container by default; set
/// `fullscreen = true` to fill the viewport and resize automatically with the
/// window. Explicit `width`/`height` override automatic sizing.
///
/// Clicking a card calls `on_node_click`, clicking empty space (or a domain
/// group) calls `on_background_click`, and clicking the selected node's
/// toolbar pill navigates to the entity page under `app_base`.
#[component]
pub fn ExplorerCanvas(
	#[prop(into)] graph: Signal<RenderGraph>,
	#[prop(into)] view: Signal<Option<ViewCommand>>,
	#[prop(into)] selected: Signal<Option<String>>,
	on_node_click: Callback<String>,
	on_background_click: Callback<()>,
	#[prop(into, default = String::new())] app_base: String,
	#[prop(default = Theme::default())] theme: Theme,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<CanvasContext>> = Rc::new(RefCell::new(CanvasContext::default()));
	let frames: Rc<RefCell<FrameLoop>> = Rc::new(RefCell::new(FrameLoop::default()));
	let (context_init, frames_init) = (context.clone(), frames.clone());

	let frames_owned = StoredValue::new_local(frames);
	on_cleanup(move || {
		frames_owned.try_with_value(|frames| frames.borrow_mut().stop());
	});

	let context_graph = context.clone();
	Effect::new(move |_| {
		let next = graph.get();
		context_graph.borrow_mut().set_graph(next);
	});

	let context_selected = context.clone();
	Effect::new(move |_| {
		context_selected.borrow_mut().set_selected(selected.get());
	});

	let context_view = context.clone();
	Effect::new(move |_| {
		if let Some(command) = view.get() {
			context_view.borrow_mut().pending_view = Some(command);
		}
	});

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			viewport_size(&window).unwrap_or((800.0, 600.0))
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
				Err(_) => {
					warn!("catalog-explorer: 2d context has an unexpected type");
					return;
				}
			},
			_ => {
				warn!("catalog-explorer: canvas 2d context unavailable");
				return;
			}
		};

		context_init.borrow_mut().resize(w, h);

		let mut frame_loop = frames_init.borrow_mut();
		frame_loop.stop();
		frame_loop.stopped = false;
		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			let cb: Closure<dyn FnMut()> = Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(viewport_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				context_resize.borrow_mut().resize(nw, nh);
			});
			let listener = cb.as_ref().unchecked_ref();
			let _ = window.add_event_listener_with_callback("resize", listener);
			frame_loop.resize = Some(cb);
		}

		let (context_anim, frames_anim) = (context_init.clone(), frames_init.clone());
		let theme = theme.clone();
		frame_loop.animate = Some(Closure::new(move || {
			{
				let mut c = context_anim.borrow_mut();
				if c.tick(FRAME_DT) {
					let scene = Scene {
						nodes: &c.graph.nodes,
						edges: &c.graph.edges,
						fade: &c.fade,
						transform: &c.transform,
						selected: c.selected.as_deref(),
						theme: &theme,
						width: c.width,
						height: c.height,
						time: c.time,
					};
					render::render(&scene, &ctx);
				}
			}
			if let Some(window) = web_sys::window() {
				frames_anim.borrow_mut().request_frame(&window);
			}
		}));
		frame_loop.request_frame(&window);
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = event_point(canvas_ref, &ev) else {
			return;
		};
		let mut c = context_md.borrow_mut();
		let c = &mut *c;
		c.view_anim.cancel();
		c.pan.begin(x, y, &c.transform);
		set_cursor(canvas_ref, "grabbing");
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = event_point(canvas_ref, &ev) else {
			return;
		};
		let mut c = context_mm.borrow_mut();
		let c = &mut *c;
		if c.pan.active {
			c.pan.drag_to(x, y, &mut c.transform);
			c.dirty = true;
		} else {
			let (gx, gy) = c.transform.screen_to_graph(x, y);
			let over_card = node_at(&c.graph.nodes, gx, gy).is_some_and(|n| !n.is_group());
			set_cursor(canvas_ref, if over_card { "pointer" } else { "grab" });
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some((x, y)) = event_point(canvas_ref, &ev) else {
			return;
		};
		let target = {
			let mut c = context_mu.borrow_mut();
			if !c.pan.end() {
				set_cursor(canvas_ref, "grab");
				return;
			}
			c.click_target(x, y, &app_base)
		};
		set_cursor(canvas_ref, "grab");
		match target {
			ClickTarget::Toolbar(href) => navigate(&href),
			ClickTarget::Node(id) => on_node_click.run(id),
			ClickTarget::Background => on_background_click.run(()),
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		context_ml.borrow_mut().pan.end();
		set_cursor(canvas_ref, "grab");
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = event_point(canvas_ref, &ev) else {
			return;
		};
		let mut c = context_wh.borrow_mut();
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		c.view_anim.cancel();
		c.transform = c.transform.zoom_at(x, y, factor);
		c.dirty = true;
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="explorer-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
