//! Application state shared by the web and native front ends.
//!
//! A [`Stage`] is built once at startup and handed explicitly to whatever
//! drives frames and input. It never touches the GPU, so the whole
//! interaction model can be exercised headless.

use std::sync::Arc;

use glam::Vec2;
use tracing::{debug, error, info, warn};

use crate::assets::{AssetEvent, AssetKind, AssetLoader, AssetPayload, LoadingProgress, ProgressUpdate};
use crate::config::ViewerConfig;
use crate::controller::input::{InputEvent, InputState, MouseButton};
use crate::controller::interaction::{ClickOutcome, PointerInteractionController};
use crate::controller::orbit::OrbitControls;
use crate::controller::tracking::PointerTrackingController;
use crate::model::timer::Millis;
use crate::model::{
    AnimationRegistry, Camera, InteractionTargets, Model, ModelInstance, SceneGraph, StopScheduler, Transform,
    Viewport,
};

pub struct Stage {
    config: ViewerConfig,
    viewport: Viewport,
    camera: Camera,
    orbit: OrbitControls,
    scene: SceneGraph,
    registry: AnimationRegistry,
    timers: StopScheduler,
    interaction: PointerInteractionController,
    tracking: PointerTrackingController,
    input: InputState,
    progress: LoadingProgress,
    progress_updates: Vec<ProgressUpdate>,
    loader: AssetLoader,
}

impl Stage {
    pub fn new(config: ViewerConfig, width: u32, height: u32) -> Self {
        let viewport = Viewport::new(width, height);
        let camera = Camera::new(&config.camera, viewport);
        let orbit = OrbitControls::new(config.orbit.clone(), &camera);
        let interaction = PointerInteractionController::new(InteractionTargets::from_config(&config.targets));
        let tracking = PointerTrackingController::new(config.tracking.distance);
        let timers = StopScheduler::new(config.stop_policy);

        Self {
            viewport,
            camera,
            orbit,
            scene: SceneGraph::new(),
            registry: AnimationRegistry::new(),
            timers,
            interaction,
            tracking,
            input: InputState::new(),
            progress: LoadingProgress::new(AssetKind::ALL.len()),
            progress_updates: Vec::new(),
            loader: AssetLoader::new(),
            config,
        }
    }

    /// Kicks off every asset load. Results arrive on later ticks.
    pub fn start_loading(&mut self) {
        let started = self.loader.request_all(&self.config.assets);
        self.progress = LoadingProgress::new(started);
    }

    /// Channel end that feeds [`Stage::dispatch_assets`].
    pub fn asset_sender(&self) -> flume::Sender<AssetEvent> {
        self.loader.sender()
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn registry(&self) -> &AnimationRegistry {
        &self.registry
    }

    pub fn timers(&self) -> &StopScheduler {
        &self.timers
    }

    pub fn targets(&self) -> &InteractionTargets {
        self.interaction.targets()
    }

    pub fn progress(&self) -> &LoadingProgress {
        &self.progress
    }

    /// Progress changes since the last call, oldest first.
    pub fn take_progress_updates(&mut self) -> Vec<ProgressUpdate> {
        std::mem::take(&mut self.progress_updates)
    }

    /// Applies every asset event that has arrived so far.
    pub fn dispatch_assets(&mut self) -> usize {
        let events = self.loader.drain();
        let count = events.len();
        for event in events {
            self.dispatch_asset(event);
        }
        count
    }

    pub fn dispatch_asset(&mut self, event: AssetEvent) {
        let AssetEvent { kind, source, result } = event;
        let ok = match result {
            Ok(payload) => self.insert_asset(kind, &source, payload),
            Err(err) => {
                error!(%kind, %source, %err, "asset failed to load");
                false
            }
        };
        let updates = if ok {
            self.progress.record(true)
        } else {
            self.progress.record_failure(format!("{kind} ({source})"))
        };
        for update in &updates {
            match update {
                ProgressUpdate::Advanced { .. } => debug!(percent = self.progress.percent(), "loading progress"),
                ProgressUpdate::Completed => info!(failed = self.progress.failed(), "all assets finished loading"),
            }
        }
        self.progress_updates.extend(updates);
    }

    fn insert_asset(&mut self, kind: AssetKind, source: &str, payload: AssetPayload) -> bool {
        match (kind, payload) {
            (AssetKind::Environment, AssetPayload::Environment(env)) => {
                info!(%source, width = env.width, height = env.height, "environment ready");
                self.scene.set_environment(env);
            }
            (AssetKind::Character, AssetPayload::Model(model)) => {
                let model = Arc::new(model);
                self.registry.populate(&model.clips);
                let instance = self.place(&model, kind);
                self.scene.set_character(instance);
                info!(%source, clips = model.clips.len(), "character ready");
                if self.config.autoplay_first_clip && !self.registry.is_empty() {
                    if let Err(err) = self.registry.play(0) {
                        debug!(%err, "autoplay skipped");
                    }
                }
            }
            (AssetKind::Ground, AssetPayload::Model(model)) => {
                let instance = self.place(&Arc::new(model), kind);
                self.scene.set_ground(instance);
                info!(%source, "ground ready");
            }
            (AssetKind::Hand, AssetPayload::Model(model)) => {
                let mut instance = self.place(&Arc::new(model), kind);
                if let Some(pointer) = self.input.pointer {
                    self.tracking.on_move(pointer, self.viewport, &self.camera, Some(&mut instance));
                }
                self.scene.set_hand(instance);
                info!(%source, "hand ready");
            }
            (kind, _) => {
                warn!(%kind, %source, "payload does not match asset kind");
                return false;
            }
        }
        true
    }

    fn place(&self, model: &Arc<Model>, kind: AssetKind) -> ModelInstance {
        let placement = match kind {
            AssetKind::Character => self.config.character,
            AssetKind::Ground => self.config.ground,
            AssetKind::Hand | AssetKind::Environment => self.config.hand,
        };
        ModelInstance::new(Arc::clone(model), Transform::from(placement))
    }

    /// Routes one input event. Returns the click outcome for clicks.
    pub fn handle_input(&mut self, event: InputEvent, now: Millis) -> Option<ClickOutcome> {
        self.input.process_event(&event);
        match event {
            InputEvent::PointerMoved { x, y } => {
                let at = Vec2::new(x, y);
                self.orbit.drag_to(at, self.viewport);
                self.tracking.on_move(at, self.viewport, &self.camera, self.scene.hand.as_mut());
                None
            }
            InputEvent::PointerDown { button: MouseButton::Left, x, y } => {
                self.orbit.begin_drag(Vec2::new(x, y));
                None
            }
            InputEvent::PointerUp { button: MouseButton::Left, .. } => {
                self.orbit.end_drag();
                None
            }
            InputEvent::PointerDown { .. } | InputEvent::PointerUp { .. } => None,
            InputEvent::Click { x, y } => Some(self.click(Vec2::new(x, y), now)),
            InputEvent::Wheel { delta_y } => {
                self.orbit.wheel(delta_y);
                None
            }
            InputEvent::Resized { width, height } => {
                self.resize(width, height);
                None
            }
        }
    }

    pub fn click(&mut self, screen: Vec2, now: Millis) -> ClickOutcome {
        self.interaction.on_click(screen, self.viewport, &self.camera, &mut self.registry, &mut self.timers, now)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
        self.camera.set_aspect(self.viewport);
    }

    /// One frame of simulation: assets, due stops, a fixed animation step,
    /// posing and camera easing.
    pub fn tick(&mut self, now: Millis) {
        self.dispatch_assets();

        for stop in self.timers.take_due(now) {
            match self.registry.stop(stop.animation_index) {
                Ok(()) => debug!(target = stop.target.name(), animation = stop.animation_index, "scheduled stop fired"),
                Err(err) => debug!(%err, "scheduled stop had nothing to stop"),
            }
        }

        self.registry.advance(self.config.frame_step_seconds);
        if let Some(character) = self.scene.character.as_mut() {
            let pose = self.registry.pose(&character.model.rest_pose());
            character.set_pose(pose);
        }

        self.orbit.update(&mut self.camera);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewerError;
    use crate::model::animation::{AnimationClip, Channel, ChannelData, Interpolation, Keyframes};
    use crate::model::rig::Node;
    use glam::Vec3;

    fn character(clips: usize) -> Model {
        let clips = (0..clips)
            .map(|i| {
                Arc::new(AnimationClip::new(
                    format!("clip{i}"),
                    vec![Channel {
                        node: 0,
                        data: ChannelData::Translation(Keyframes::new(
                            vec![0.0, 1.0],
                            vec![Vec3::ZERO, Vec3::Y],
                            Interpolation::Linear,
                        )),
                    }],
                ))
            })
            .collect();
        Model { label: "character".into(), nodes: vec![Node::default()], roots: vec![0], clips, ..Default::default() }
    }

    fn loaded(kind: AssetKind, model: Model) -> AssetEvent {
        AssetEvent { kind, source: format!("{kind}.glb"), result: Ok(AssetPayload::Model(model)) }
    }

    #[test]
    fn character_load_populates_registry_and_autoplays() {
        let mut stage = Stage::new(ViewerConfig::default(), 800, 600);
        stage.dispatch_asset(loaded(AssetKind::Character, character(3)));
        assert_eq!(stage.registry().len(), 3);
        assert!(stage.registry().is_playing(0));
        assert!(stage.scene().character.is_some());
    }

    #[test]
    fn autoplay_can_be_switched_off() {
        let config = ViewerConfig { autoplay_first_clip: false, ..Default::default() };
        let mut stage = Stage::new(config, 800, 600);
        stage.dispatch_asset(loaded(AssetKind::Character, character(3)));
        assert!(!stage.registry().is_playing(0));
    }

    #[test]
    fn failed_load_still_advances_progress() {
        let mut stage = Stage::new(ViewerConfig::default(), 800, 600);
        stage.dispatch_asset(AssetEvent {
            kind: AssetKind::Ground,
            source: "road.glb".into(),
            result: Err(ViewerError::MissingAsset("road")),
        });
        assert_eq!(stage.progress().percent(), 25);
        assert_eq!(stage.progress().failed_sources(), ["ground (road.glb)".to_string()]);
        assert!(stage.scene().ground.is_none());
        assert_eq!(stage.take_progress_updates(), vec![ProgressUpdate::Advanced { fraction: 0.25 }]);
        assert!(stage.take_progress_updates().is_empty());
    }

    #[test]
    fn tick_poses_the_character() {
        let mut stage = Stage::new(ViewerConfig::default(), 800, 600);
        stage.dispatch_asset(loaded(AssetKind::Character, character(1)));
        for _ in 0..10 {
            stage.tick(0.0);
        }
        let y = stage.scene().character.as_ref().map(|c| c.pose()[0].translation.y);
        assert!(matches!(y, Some(y) if (y - 0.16).abs() < 1e-4), "{y:?}");
    }

    #[test]
    fn mismatched_payload_counts_as_failure() {
        let mut stage = Stage::new(ViewerConfig::default(), 800, 600);
        stage.dispatch_asset(AssetEvent {
            kind: AssetKind::Environment,
            source: "back.hdr".into(),
            result: Ok(AssetPayload::Model(character(0))),
        });
        assert!(stage.scene().environment.is_none());
        assert_eq!(stage.progress().failed(), 1);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut stage = Stage::new(ViewerConfig::default(), 800, 600);
        stage.handle_input(InputEvent::Resized { width: 1000, height: 500 }, 0.0);
        assert_eq!(stage.camera().aspect, 2.0);
        assert_eq!(stage.viewport(), Viewport::new(1000, 500));
    }
}
