use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

// Import from the library crate
use stagehand::controller::{FrameLoopContext, InputEvent, InputState, MouseButton};
use stagehand::view::GpuContext;
use stagehand::{logging, Stage, ViewerConfig, ViewerError};

/// Pixels per wheel "line", roughly what browsers report.
const LINE_HEIGHT_PX: f32 = 100.0;

struct Running {
    window: Arc<Window>,
    egui_state: egui_winit::State,
    ctx: FrameLoopContext,
    /// Local copy used only to turn left releases into clicks.
    input: InputState,
}

struct App {
    config: ViewerConfig,
    started: Instant,
    running: Option<Running>,
    failure: Option<ViewerError>,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        Self { config, started: Instant::now(), running: None, failure: None }
    }

    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    fn launch(&self, event_loop: &ActiveEventLoop) -> stagehand::Result<Running> {
        let attributes = Window::default_attributes()
            .with_title("stagehand")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = event_loop
            .create_window(attributes)
            .map_err(|e| ViewerError::Gpu(format!("failed to create window: {e}")))?;
        let window = Arc::new(window);

        let gpu = pollster::block_on(GpuContext::new_native(window.clone()))?;
        let (width, height) = gpu.size();

        let mut stage = Stage::new(self.config.clone(), width, height);
        stage.start_loading();

        let ctx = FrameLoopContext::new(stage, gpu);
        let egui_state =
            egui_winit::State::new(ctx.egui_ctx.clone(), egui::ViewportId::ROOT, &window, None, None, None);

        info!(width, height, "native viewer started");
        Ok(Running { window, egui_state, ctx, input: InputState::new() })
    }
}

/// Winit window events → platform-independent input.
fn translate(event: &WindowEvent, pointer: Option<glam::Vec2>) -> Option<InputEvent> {
    let (x, y) = pointer.map(|p| (p.x, p.y)).unwrap_or_default();
    match event {
        WindowEvent::CursorMoved { position, .. } => {
            Some(InputEvent::PointerMoved { x: position.x as f32, y: position.y as f32 })
        }
        WindowEvent::MouseInput { state, button, .. } => {
            let button = match button {
                winit::event::MouseButton::Left => MouseButton::Left,
                winit::event::MouseButton::Right => MouseButton::Right,
                winit::event::MouseButton::Middle => MouseButton::Middle,
                _ => return None,
            };
            Some(match state {
                ElementState::Pressed => InputEvent::PointerDown { button, x, y },
                ElementState::Released => InputEvent::PointerUp { button, x, y },
            })
        }
        // Browser convention: positive delta scrolls down / zooms out.
        WindowEvent::MouseWheel { delta, .. } => {
            let delta_y = match delta {
                MouseScrollDelta::LineDelta(_, lines) => -lines * LINE_HEIGHT_PX,
                MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
            };
            Some(InputEvent::Wheel { delta_y })
        }
        WindowEvent::Resized(size) => Some(InputEvent::Resized { width: size.width, height: size.height }),
        _ => None,
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.launch(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(err) => {
                error!(%err, "failed to start viewer");
                self.failure = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let now = self.now();
        let Some(app) = self.running.as_mut() else { return };
        if window_id != app.window.id() {
            return;
        }

        let consumed = app.egui_state.on_window_event(app.window.as_ref(), &event).consumed;

        match &event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => app.ctx.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let raw_input = app.egui_state.take_egui_input(&app.window);
                let ppp = app.window.scale_factor() as f32;
                let platform_output = app.ctx.frame(now, raw_input, ppp);
                app.egui_state.handle_platform_output(&app.window, platform_output);
            }
            _ => {}
        }

        // The overlay swallows pointer events over its own widgets; resizes
        // always reach the stage.
        let Some(input) = translate(&event, app.input.pointer) else { return };
        if consumed && !matches!(input, InputEvent::Resized { .. }) {
            return;
        }

        let click = app.input.click_from_release(&input);
        app.input.process_event(&input);
        app.ctx.stage.handle_input(input, now);
        if let Some(click) = click {
            if let Some(outcome) = app.ctx.stage.handle_input(click, now) {
                tracing::debug!(?outcome, "click");
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(app) = self.running.as_ref() {
            app.window.request_redraw();
        }
    }
}

fn load_config() -> stagehand::Result<ViewerConfig> {
    let path = std::env::args().nth(1).or_else(|| std::env::var("STAGEHAND_CONFIG").ok());
    let Some(path) = path else {
        return Ok(ViewerConfig::default());
    };
    let text = std::fs::read_to_string(&path).map_err(|source| ViewerError::Io { path: path.clone(), source })?;
    let config = ViewerConfig::from_json(&text)?;
    info!(%path, "loaded configuration");
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = load_config().unwrap_or_else(|err| {
        warn!(%err, "falling back to the default configuration");
        ViewerConfig::default()
    });

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    match app.failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
