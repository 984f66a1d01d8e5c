use egui::Context;

use crate::assets::LoadingProgress;
use crate::model::AnimationRegistry;

/// Build the overlay and return egui output
pub fn build_ui(
    egui_ctx: &Context,
    raw_input: egui::RawInput,
    progress: &LoadingProgress,
    registry: &AnimationRegistry,
) -> egui::FullOutput {
    egui_ctx.run(raw_input, |ctx| {
        if progress.is_complete() {
            draw_status(ctx, progress, registry);
        } else {
            draw_loading_bar(ctx, progress);
        }
    })
}

fn draw_loading_bar(ctx: &Context, progress: &LoadingProgress) {
    egui::Area::new(egui::Id::new("loading"))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.set_width(320.0);
            ui.label(egui::RichText::new("Loading scene").color(egui::Color32::WHITE));
            ui.add(
                egui::ProgressBar::new(progress.fraction())
                    .text(format!("{}%", progress.percent()))
                    .animate(true),
            );
        });
}

fn draw_status(ctx: &Context, progress: &LoadingProgress, registry: &AnimationRegistry) {
    egui::Area::new(egui::Id::new("status"))
        .anchor(egui::Align2::LEFT_BOTTOM, [8.0, -8.0])
        .show(ctx, |ui| {
            let small = |text: String| egui::RichText::new(text).small().color(egui::Color32::LIGHT_GRAY);
            ui.label(small("Click the character to animate it. Drag to orbit, scroll to zoom.".into()));
            let playing: Vec<&str> = registry
                .iter()
                .filter(|a| a.is_playing())
                .map(|a| a.clip().name.as_str())
                .collect();
            if !playing.is_empty() {
                ui.label(small(format!("Playing: {}", playing.join(", "))));
            }
            for source in progress.failed_sources() {
                ui.label(
                    egui::RichText::new(format!("Failed to load {source}"))
                        .small()
                        .color(egui::Color32::LIGHT_RED),
                );
            }
            if registry.is_empty() && !progress.failed_sources().is_empty() {
                ui.label(small("No animations loaded, clicks have no effect.".into()));
            }
        });
}
