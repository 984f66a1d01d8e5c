pub mod assets;
pub mod config;
pub mod error;
pub mod logging;
pub mod stage;
pub mod ui;

// MVC Architecture
pub mod controller;
pub mod model;
pub mod view;

pub use config::ViewerConfig;
pub use error::{Result, ViewerError};
pub use stage::Stage;

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
#[cfg(target_arch = "wasm32")]
use web_sys::{Document, Event, HtmlCanvasElement, HtmlElement, MouseEvent, WheelEvent, Window};

#[cfg(target_arch = "wasm32")]
use assets::ProgressUpdate;
#[cfg(target_arch = "wasm32")]
use controller::input::wasm as web_input;
#[cfg(target_arch = "wasm32")]
use controller::FrameLoopContext;
#[cfg(target_arch = "wasm32")]
use view::GpuContext;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> std::result::Result<(), JsValue> {
    logging::init();
    let (window, document, canvas) = init_canvas()?;
    setup_app(&window, &document, &canvas).await
}

/// Main application setup for WASM
#[cfg(target_arch = "wasm32")]
async fn setup_app(window: &Window, document: &Document, canvas: &HtmlCanvasElement) -> std::result::Result<(), JsValue> {
    let (width, height) = (canvas.width(), canvas.height());
    let gpu = GpuContext::new(canvas, width, height)
        .await
        .map_err(|e| js_error(format!("GPU init failed: {e}")))?;

    let mut stage = Stage::new(ViewerConfig::default(), width, height);
    stage.start_loading();

    let ctx = Rc::new(RefCell::new(FrameLoopContext::new(stage, gpu)));
    let egui_events: Rc<RefCell<Vec<egui::Event>>> = Rc::new(RefCell::new(Vec::new()));
    setup_input_listeners(window, canvas, ctx.clone(), egui_events.clone())?;

    let loading_dom = LoadingDom::find(document);

    // Continuous redraw using requestAnimationFrame
    let f = RcCellCallback::new(window.clone(), {
        let window = window.clone();
        move || {
            let now = window.performance().map(|p| p.now()).unwrap_or(0.0);
            let dpr = window.device_pixel_ratio() as f32;
            let mut ctx = ctx.borrow_mut();

            let (w, h) = ctx.gpu.size();
            let mut raw_input = egui::RawInput::default();
            raw_input.time = Some(now / 1000.0);
            raw_input.screen_rect = Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(w as f32 / dpr, h as f32 / dpr),
            ));
            raw_input.events.extend(egui_events.borrow_mut().drain(..));

            ctx.frame(now, raw_input, dpr);
            loading_dom.apply(&ctx.stage.take_progress_updates());
        }
    });
    f.start()
}

/// Optional `#loading-bar` / `#loading-bar-container` elements supplied by
/// the hosting page.
#[cfg(target_arch = "wasm32")]
struct LoadingDom {
    bar: Option<HtmlElement>,
    container: Option<HtmlElement>,
}

#[cfg(target_arch = "wasm32")]
impl LoadingDom {
    fn find(document: &Document) -> Self {
        let lookup = |id: &str| document.get_element_by_id(id).and_then(|el| el.dyn_into::<HtmlElement>().ok());
        Self { bar: lookup("loading-bar"), container: lookup("loading-bar-container") }
    }

    fn apply(&self, updates: &[ProgressUpdate]) {
        for update in updates {
            let result = match update {
                ProgressUpdate::Advanced { fraction } => self
                    .bar
                    .as_ref()
                    .map(|bar| bar.style().set_property("width", &format!("{}%", (fraction * 100.0).round()))),
                ProgressUpdate::Completed => {
                    self.container.as_ref().map(|c| c.style().set_property("display", "none"))
                }
            };
            if let Some(Err(e)) = result {
                tracing::warn!(?e, "failed to update loading bar");
            }
        }
    }
}

/// Setup all input event listeners with platform-agnostic abstractions
#[cfg(target_arch = "wasm32")]
fn setup_input_listeners(
    window: &Window,
    canvas: &HtmlCanvasElement,
    ctx: Rc<RefCell<FrameLoopContext>>,
    egui_events: Rc<RefCell<Vec<egui::Event>>>,
) -> std::result::Result<(), JsValue> {
    let now = {
        let window = window.clone();
        move || window.performance().map(|p| p.now()).unwrap_or(0.0)
    };
    let dpr = {
        let window = window.clone();
        move || window.device_pixel_ratio()
    };

    // Mouse move: hand tracking, orbit drag, egui hover
    {
        let ctx = ctx.clone();
        let egui_events = egui_events.clone();
        let (now, dpr) = (now.clone(), dpr.clone());
        let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
            ctx.borrow_mut().stage.handle_input(web_input::mouse_move_to_input(&e, dpr()), now());
            egui_events
                .borrow_mut()
                .push(egui::Event::PointerMoved(egui::pos2(e.client_x() as f32, e.client_y() as f32)));
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
        mm.forget();
    }

    // Mouse down / up: orbit drag
    for (name, is_down) in [("mousedown", true), ("mouseup", false)] {
        let ctx = ctx.clone();
        let egui_events = egui_events.clone();
        let (now, dpr) = (now.clone(), dpr.clone());
        let cb = Closure::wrap(Box::new(move |e: MouseEvent| {
            ctx.borrow_mut().stage.handle_input(web_input::mouse_button_to_input(&e, dpr(), is_down), now());
            if e.button() == 0 {
                egui_events.borrow_mut().push(egui::Event::PointerButton {
                    pos: egui::pos2(e.client_x() as f32, e.client_y() as f32),
                    button: egui::PointerButton::Primary,
                    pressed: is_down,
                    modifiers: egui::Modifiers::default(),
                });
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback(name, cb.as_ref().unchecked_ref())?;
        cb.forget();
    }

    // Click: pick a target
    {
        let ctx = ctx.clone();
        let (now, dpr) = (now.clone(), dpr.clone());
        let click = Closure::wrap(Box::new(move |e: MouseEvent| {
            ctx.borrow_mut().stage.handle_input(web_input::mouse_click_to_input(&e, dpr()), now());
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
        click.forget();
    }

    // Mouse wheel: zoom
    {
        let ctx = ctx.clone();
        let now = now.clone();
        let wheel = Closure::wrap(Box::new(move |e: WheelEvent| {
            ctx.borrow_mut().stage.handle_input(web_input::mouse_wheel_to_input(&e), now());
            e.prevent_default();
        }) as Box<dyn FnMut(WheelEvent)>);
        canvas.add_event_listener_with_callback("wheel", wheel.as_ref().unchecked_ref())?;
        wheel.forget();
    }

    // Window resize: canvas, surface, depth buffer and camera aspect
    {
        let window_r = window.clone();
        let canvas = canvas.clone();
        let resize = Closure::wrap(Box::new(move |_e: Event| {
            let (w, h) = window_size(&window_r);
            canvas.set_width(w);
            canvas.set_height(h);
            ctx.borrow_mut().resize(w, h);
            tracing::debug!(w, h, "canvas resized");
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())?;
        resize.forget();
    }

    Ok(())
}

/// Window size in physical pixels.
#[cfg(target_arch = "wasm32")]
fn window_size(window: &Window) -> (u32, u32) {
    let dpr = window.device_pixel_ratio();
    let css = |v: std::result::Result<JsValue, JsValue>, fallback: f64| v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback);
    let w = css(window.inner_width(), 800.0);
    let h = css(window.inner_height(), 600.0);
    (((w * dpr) as u32).max(1), ((h * dpr) as u32).max(1))
}

#[cfg(target_arch = "wasm32")]
fn init_canvas() -> std::result::Result<(Window, Document, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or(js_error("no global `window`"))?;
    let document = window.document().ok_or(js_error("no document on window"))?;
    let body = document.body().ok_or(js_error("no body on document"))?;
    let canvas_el = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("failed to create canvas"))?;
    let (width, height) = window_size(&window);
    canvas_el.set_width(width);
    canvas_el.set_height(height);
    let style = canvas_el.style();
    style.set_property("width", "100vw")?;
    style.set_property("height", "100vh")?;
    style.set_property("display", "block")?;
    body.append_child(&canvas_el)?;
    Ok((window, document, canvas_el))
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

#[cfg(target_arch = "wasm32")]
struct RcCellCallback {
    inner: Rc<RefCell<Box<dyn FnMut()>>>,
    window: Window,
}

#[cfg(target_arch = "wasm32")]
impl RcCellCallback {
    fn new(window: Window, f: impl FnMut() + 'static) -> Self {
        Self { inner: Rc::new(RefCell::new(Box::new(f))), window }
    }

    fn start(self) -> std::result::Result<(), JsValue> {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            inner.borrow_mut().as_mut()();

            // Recursively schedule next frame
            if let Some(cb) = callback_clone.borrow().as_ref() {
                if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    tracing::error!(?e, "requestAnimationFrame failed, render loop stopped");
                }
            }
        }) as Box<dyn FnMut()>));

        if let Some(cb) = callback.borrow().as_ref() {
            self.window.request_animation_frame(cb.as_ref().unchecked_ref())?;
        }

        // Leak the closure to keep it alive
        std::mem::forget(callback);
        Ok(())
    }
}
