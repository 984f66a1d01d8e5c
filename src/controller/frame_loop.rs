use tracing::{error, warn};

use crate::model::timer::Millis;
use crate::stage::Stage;
use crate::ui;
use crate::view::{EguiFrame, GpuContext, Renderer};

/// Ties the stage to the GPU. One `frame` call per display refresh.
pub struct FrameLoopContext {
    pub stage: Stage,
    pub gpu: GpuContext,
    pub renderer: Renderer,
    pub egui_ctx: egui::Context,
}

impl FrameLoopContext {
    pub fn new(stage: Stage, gpu: GpuContext) -> Self {
        let renderer = Renderer::new(&gpu, stage.config().clear_color);
        Self { stage, gpu, renderer, egui_ctx: egui::Context::default() }
    }

    /// Applies a new surface size to the GPU side and the stage.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == self.gpu.size() {
            return;
        }
        self.gpu.resize(width, height);
        self.renderer.resize(&self.gpu.device, width, height);
        self.stage.resize(width, height);
    }

    /// Advance the stage and draw. Returns egui's platform output for the
    /// caller to act on (cursor icon and the like).
    pub fn frame(&mut self, now: Millis, raw_input: egui::RawInput, pixels_per_point: f32) -> egui::PlatformOutput {
        self.stage.tick(now);

        self.egui_ctx.set_pixels_per_point(pixels_per_point);
        let mut full_output = ui::build_ui(&self.egui_ctx, raw_input, self.stage.progress(), self.stage.registry());
        let primitives = self.egui_ctx.tessellate(std::mem::take(&mut full_output.shapes), pixels_per_point);
        let ui = EguiFrame {
            primitives,
            textures_delta: std::mem::take(&mut full_output.textures_delta),
            pixels_per_point,
        };

        match self.renderer.render(&self.gpu, self.stage.scene(), self.stage.camera(), Some(ui)) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost, reconfiguring");
                self.gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::Timeout) => warn!("surface timed out, skipping frame"),
            Err(err) => error!(%err, "failed to render frame"),
        }
        full_output.platform_output
    }
}
