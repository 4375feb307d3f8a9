//! Leptos component hosting the diagram editor on an HTML canvas.
//!
//! The component owns a [`DiagramState`] behind `Rc<RefCell<_>>` shared by the
//! DOM closures. An animation loop runs via `requestAnimationFrame`, advancing
//! chunked layouts and repainting the canvas and the minimap each frame. The
//! sidebar list, toolbar and status bar are reactive views fed from signals
//! that are synced after every operation.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, Document, Element, Event, HtmlCanvasElement, KeyboardEvent, MouseEvent,
	WheelEvent, Window,
};

use super::config::EditorConfig;
use super::error::ViewportError;
use super::interaction::CaptureGuard;
use super::render;
use super::scale::{ScaleConfig, ScaledSizes};
use super::state::{DiagramState, SidebarItem};
use super::theme::Theme;
use super::types::{DiagramData, Dimensions, NodeId, Point};

const MINIMAP_WIDTH: f64 = 200.0;
const MINIMAP_HEIGHT: f64 = 120.0;

/// Editor state together with its visual configuration.
struct CanvasContext {
	state: DiagramState,
	scale: ScaleConfig,
	theme: Theme,
}

type SharedContext = Rc<RefCell<Option<CanvasContext>>>;

/// Closures that must outlive the effect that created them.
#[derive(Default)]
struct Listeners {
	animate: Option<Closure<dyn FnMut()>>,
	resize: Option<Closure<dyn FnMut()>>,
	keydown: Option<Closure<dyn FnMut(KeyboardEvent)>>,
	pan_move: Option<Closure<dyn FnMut(MouseEvent)>>,
	pan_up: Option<Closure<dyn FnMut(MouseEvent)>>,
}

/// Reactive mirrors of the parts of the state the markup shows.
#[derive(Clone, Copy)]
struct UiSignals {
	unconnected: RwSignal<Vec<SidebarItem>>,
	excluded: RwSignal<Vec<SidebarItem>>,
	count: RwSignal<usize>,
	minimap: RwSignal<bool>,
	notice: RwSignal<Option<String>>,
}

impl UiSignals {
	fn sync(&self, state: &DiagramState) {
		self.unconnected.set(state.unconnected_items());
		self.excluded.set(state.excluded_items());
		self.count.set(state.component_count());
		self.minimap.set(state.minimap().borrow().is_visible());
	}
}

/// Runs `op` against the editor state and mirrors the outcome into the UI.
fn apply<T>(
	context: &SharedContext,
	ui: UiSignals,
	op: impl FnOnce(&mut DiagramState) -> Result<T, ViewportError>,
) {
	let mut guard = context.borrow_mut();
	let Some(c) = guard.as_mut() else {
		return;
	};
	match op(&mut c.state) {
		Ok(_) => ui.notice.set(None),
		Err(err) => {
			if err.is_fatal() {
				error!("diagram-canvas: {}", err);
			} else {
				warn!("diagram-canvas: rejected: {}", err);
			}
			ui.notice.set(Some(err.notice()));
		}
	}
	ui.sync(&c.state);
}

fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> Point {
	let rect = canvas.get_bounding_client_rect();
	Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn window_size(window: &Window) -> Dimensions {
	let read = |v: Result<JsValue, JsValue>, fallback: f64| {
		v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	Dimensions::new(
		read(window.inner_width(), 800.0),
		read(window.inner_height(), 600.0),
	)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

/// Renders the diagram editor: canvas, toolbar, sidebar list, status bar and
/// minimap.
///
/// The canvas sizes itself to its parent container; set `fullscreen = true` to
/// fill the window and follow its resizes.
#[component]
pub fn DiagramCanvas(
	#[prop(into)] data: Signal<DiagramData>,
	#[prop(default = EditorConfig::default())] config: EditorConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(optional, into)] theme: Option<String>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let minimap_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: SharedContext = Rc::new(RefCell::new(None));
	let listeners: Rc<RefCell<Listeners>> = Rc::new(RefCell::new(Listeners::default()));
	let ui = UiSignals {
		unconnected: RwSignal::new(Vec::new()),
		excluded: RwSignal::new(Vec::new()),
		count: RwSignal::new(0),
		minimap: RwSignal::new(config.minimap.visible),
		notice: RwSignal::new(None),
	};
	let show_list = RwSignal::new(false);
	let theme = Theme::by_name(theme.as_deref().unwrap_or_default());

	let (context_init, listeners_init) = (context.clone(), listeners.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if context_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let size = if fullscreen {
			window_size(&window)
		} else {
			let parent = canvas.parent_element();
			Dimensions::new(
				parent
					.as_ref()
					.map(|p| p.client_width() as f64)
					.unwrap_or(800.0),
				parent
					.as_ref()
					.map(|p| p.client_height() as f64)
					.unwrap_or(600.0),
			)
		};
		canvas.set_width(size.width as u32);
		canvas.set_height(size.height as u32);

		let Some(ctx) = context_2d(&canvas) else {
			warn!("diagram-canvas: 2d context unavailable");
			return;
		};
		let minimap_ctx = minimap_ref.get().and_then(|m| {
			let m: HtmlCanvasElement = m.into();
			m.set_width(MINIMAP_WIDTH as u32);
			m.set_height(MINIMAP_HEIGHT as u32);
			context_2d(&m)
		});

		*context_init.borrow_mut() = Some(CanvasContext {
			state: DiagramState::new(&config, size),
			scale: ScaleConfig::default(),
			theme: theme.clone(),
		});

		let mut l = listeners_init.borrow_mut();

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			let resize = Closure::<dyn FnMut()>::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let size = window_size(&win);
				canvas_resize.set_width(size.width as u32);
				canvas_resize.set_height(size.height as u32);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.state.resize(size);
				}
			});
			let _ = window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref());
			l.resize = Some(resize);
		}

		let context_key = context_init.clone();
		let keydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |ev: KeyboardEvent| {
			if ev.key() != "Escape" {
				return;
			}
			if let Some(ref mut c) = *context_key.borrow_mut() {
				c.state.cancel_pan();
			}
		});
		let _ = window.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref());
		l.keydown = Some(keydown);

		// Attached to the document for the length of one pan session only; the
		// capture guard handed to the state removes them again.
		let (context_move, canvas_move) = (context_init.clone(), canvas.clone());
		l.pan_move = Some(Closure::new(move |ev: MouseEvent| {
			if let Some(ref mut c) = *context_move.borrow_mut() {
				c.state.pointer_move(canvas_point(&canvas_move, &ev));
			}
		}));
		let context_up = context_init.clone();
		l.pan_up = Some(Closure::new(move |_: MouseEvent| {
			if let Some(ref mut c) = *context_up.borrow_mut() {
				c.state.pointer_up();
			}
		}));

		let (context_anim, listeners_anim) = (context_init.clone(), listeners_init.clone());
		l.animate = Some(Closure::new(move || {
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				c.state.tick_layout();
				render::render(&c.state, &ctx, &c.scale, &c.theme);
				if let Some(ref mctx) = minimap_ctx {
					render::render_minimap(
						&c.state,
						mctx,
						Dimensions::new(MINIMAP_WIDTH, MINIMAP_HEIGHT),
						&c.theme,
					);
				}
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), &listeners_anim.borrow().animate) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = l.animate {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_data = context.clone();
	Effect::new(move |_| {
		let _ = canvas_ref.get();
		let data = data.get();
		if context_data.borrow().is_none() {
			return;
		}
		apply(&context_data, ui, move |state| state.load(data));
	});

	let (context_md, listeners_md) = (context.clone(), listeners.clone());
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(document) = web_sys::window().and_then(|w| w.document()) else {
			return;
		};
		if let Some(ref mut c) = *context_md.borrow_mut() {
			// end a stale session before its listeners are attached again
			if c.state.is_panning() {
				c.state.pointer_up();
			}
			let capture = capture_pan(&document, &listeners_md.borrow());
			c.state.pointer_down(canvas_point(&canvas, &ev), capture);
		}
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		if let Some(ref mut c) = *context_wh.borrow_mut() {
			let outcome = c
				.state
				.wheel(canvas_point(&canvas, &ev), ev.delta_y(), ev.ctrl_key());
			if outcome.suppress_default || outcome.zoomed {
				ev.prevent_default();
			}
		}
	};

	let context_dc = context.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		if let Some(ref mut c) = *context_dc.borrow_mut() {
			c.state.double_click(canvas_point(&canvas, &ev));
		}
	};

	// A vertex's own "move to sidebar" affordance.
	let context_cm = context.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let point = canvas_point(&canvas, &ev);
		let hit = context_cm.borrow().as_ref().and_then(|c| {
			let sizes = ScaledSizes::new(&c.scale, c.state.camera().zoom());
			c.state.vertex_at(point, sizes.vertex_radius)
		});
		if let Some(id) = hit {
			ev.prevent_default();
			apply(&context_cm, ui, |state| state.exclude(&id));
		}
	};

	let context_list = context.clone();
	let on_list_click = move |ev: MouseEvent| {
		let row = ev
			.target()
			.and_then(|t| t.dyn_into::<Element>().ok())
			.and_then(|el| el.closest("[data-id]").ok().flatten())
			.and_then(|el| el.get_attribute("data-id"));
		if let Some(id) = row {
			let id = NodeId::new(id);
			apply(&context_list, ui, |state| state.include(&id));
		}
	};

	let context_scroll = context.clone();
	let on_list_scroll = move |_: Event| {
		if let Some(ref mut c) = *context_scroll.borrow_mut() {
			c.state.sidebar_scrolled();
		}
	};

	let toolbar = |label: &'static str,
	               title: &'static str,
	               op: fn(&mut DiagramState) -> Result<(), ViewportError>| {
		let context = context.clone();
		view! {
			<button title=title on:click=move |_| apply(&context, ui, op)>
				{label}
			</button>
		}
	};

	let context_toggle = context.clone();
	let context_inc = context.clone();
	let context_exc = context.clone();
	let context_mm = context.clone();

	view! {
		<div class="diagram-editor">
			<canvas
				node_ref=canvas_ref
				class="diagram-canvas"
				on:mousedown=on_mousedown
				on:wheel=on_wheel
				on:dblclick=on_dblclick
				on:contextmenu=on_contextmenu
				style="display: block; cursor: grab;"
			/>
			<div class="diagram-toolbar">
				{toolbar("⌖", "Center", |s| {
					s.center();
					Ok(())
				})}
				{toolbar("+", "Zoom in", |s| {
					s.zoom_in();
					Ok(())
				})}
				{toolbar("−", "Zoom out", |s| {
					s.zoom_out();
					Ok(())
				})}
				{toolbar("↻", "Re-layout", |s| {
					s.relayout();
					Ok(())
				})}
			</div>
			<aside class="diagram-sidebar">
				<nav class="sidebar-navbar">
					<button
						title="Unconnected vertices"
						on:click=move |_| {
							show_list.update(|v| *v = !*v);
							if let Some(ref mut c) = *context_toggle.borrow_mut() {
								c.state.sidebar_scrolled();
							}
						}
					>
						"Unconnected vertices"
					</button>
				</nav>
				<section
					class="node-container unconnected-nodes"
					style:display=move || if show_list.get() { "block" } else { "none" }
				>
					<h2 class="node-container-title">"Unconnected vertices"</h2>
					<div class="sidebar-actions">
						<button on:click=move |_| apply(&context_inc, ui, |s| s.include_all())>
							"Include all"
						</button>
						<button on:click=move |_| apply(&context_exc, ui, |s| s.exclude_all())>
							"Exclude all"
						</button>
					</div>
					<ul
						class="sidebar-list"
						on:click=on_list_click.clone()
						on:scroll=on_list_scroll.clone()
					>
						<For
							each=move || ui.unconnected.get()
							key=|item| item.id.clone()
							children=sidebar_row
						/>
					</ul>
				</section>
				<section class="node-container excluded-nodes">
					<h2 class="node-container-title">"Excluded nodes"</h2>
					<ul class="sidebar-list" on:click=on_list_click on:scroll=on_list_scroll>
						<For
							each=move || ui.excluded.get()
							key=|item| item.id.clone()
							children=sidebar_row
						/>
					</ul>
				</section>
			</aside>
			<canvas
				node_ref=minimap_ref
				class="diagram-minimap"
				style:display=move || if ui.minimap.get() { "block" } else { "none" }
			/>
			<footer class="diagram-status">
				<span>{move || format!("loaded components: {}", ui.count.get())}</span>
				<span class="notice">{move || ui.notice.get().unwrap_or_default()}</span>
				<button on:click=move |_| {
					apply(&context_mm, ui, |s| {
						s.toggle_minimap();
						Ok(())
					})
				}>"toggle minimap"</button>
			</footer>
		</div>
	}
}

fn sidebar_row(item: SidebarItem) -> impl IntoView {
	view! {
		<li data-id=item.id.to_string() title="Place on canvas">
			{item.label}
		</li>
	}
}

/// Attaches the document-level pan listeners and returns the guard that
/// detaches them.
fn capture_pan(document: &Document, listeners: &Listeners) -> CaptureGuard {
	let (Some(on_move), Some(on_up)) = (&listeners.pan_move, &listeners.pan_up) else {
		return CaptureGuard::detached();
	};
	let on_move: js_sys::Function = on_move.as_ref().unchecked_ref::<js_sys::Function>().clone();
	let on_up: js_sys::Function = on_up.as_ref().unchecked_ref::<js_sys::Function>().clone();
	let _ = document.add_event_listener_with_callback("mousemove", &on_move);
	let _ = document.add_event_listener_with_callback("mouseup", &on_up);

	let document = document.clone();
	CaptureGuard::new(move || {
		let _ = document.remove_event_listener_with_callback("mousemove", &on_move);
		let _ = document.remove_event_listener_with_callback("mouseup", &on_up);
	})
}
