use glam::Vec2;
use tracing::{debug, info};

use crate::model::timer::Millis;
use crate::model::{AnimationRegistry, Camera, InteractionTargets, StopScheduler, TargetId, Viewport};

/// What a click ended up doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    Missed,
    /// The target's clip was told to play and a stop was scheduled.
    Triggered { target: TargetId, animation_index: usize, stop_at: Millis },
    /// A target was hit but its clip is not in the registry (yet).
    NotReady { target: TargetId },
}

/// Click → ray → nearest target → play its clip for a fixed time.
#[derive(Debug, Clone)]
pub struct PointerInteractionController {
    targets: InteractionTargets,
}

impl PointerInteractionController {
    pub fn new(targets: InteractionTargets) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> &InteractionTargets {
        &self.targets
    }

    pub fn on_click(
        &self,
        screen: Vec2,
        viewport: Viewport,
        camera: &Camera,
        registry: &mut AnimationRegistry,
        timers: &mut StopScheduler,
        now: Millis,
    ) -> ClickOutcome {
        let ray = camera.ray_through(viewport.to_ndc(screen));
        let Some(hit) = self.targets.pick(&ray) else {
            return ClickOutcome::Missed;
        };
        let target = hit.target;

        if let Err(err) = registry.play(target.animation_index) {
            debug!(target = target.id.name(), %err, "click ignored");
            return ClickOutcome::NotReady { target: target.id };
        }
        let stop_at = timers.schedule(now, target.stop_after, target.id, target.animation_index);
        info!(
            target = target.id.name(),
            animation = target.animation_index,
            distance = hit.distance,
            stop_at,
            "target clicked"
        );

        ClickOutcome::Triggered { target: target.id, animation_index: target.animation_index, stop_at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, StopPolicy, TargetConfig};
    use crate::model::animation::AnimationClip;
    use std::sync::Arc;

    fn setup(clips: usize) -> (PointerInteractionController, Camera, Viewport, AnimationRegistry, StopScheduler) {
        let viewport = Viewport::new(800, 600);
        let camera = Camera::new(&CameraConfig::default(), viewport);
        let mut registry = AnimationRegistry::new();
        let clips: Vec<_> = (0..clips).map(|i| Arc::new(AnimationClip::new(format!("clip{i}"), vec![]))).collect();
        registry.populate(&clips);
        let controller = PointerInteractionController::new(InteractionTargets::from_config(&TargetConfig::default_layout()));
        (controller, camera, viewport, registry, StopScheduler::new(StopPolicy::Stack))
    }

    /// Pixel position of a world point under the default camera.
    fn screen_of(camera: &Camera, viewport: Viewport, world: glam::Vec3) -> Vec2 {
        let ndc = camera.view_proj().project_point3(world);
        Vec2::new((ndc.x + 1.0) / 2.0 * viewport.width, (1.0 - ndc.y) / 2.0 * viewport.height)
    }

    #[test]
    fn clicking_middle_plays_clip_one() {
        let (ctl, cam, vp, mut reg, mut timers) = setup(3);
        let at = screen_of(&cam, vp, glam::Vec3::new(0.0, 10.0, 0.0));
        let outcome = ctl.on_click(at, vp, &cam, &mut reg, &mut timers, 1000.0);

        assert_eq!(outcome, ClickOutcome::Triggered { target: TargetId::Middle, animation_index: 1, stop_at: 5000.0 });
        assert!(reg.is_playing(1));
        assert!(!reg.is_playing(0));
        assert_eq!(timers.pending().len(), 1);
    }

    #[test]
    fn clicking_empty_sky_changes_nothing() {
        let (ctl, cam, vp, mut reg, mut timers) = setup(3);
        let outcome = ctl.on_click(Vec2::new(2.0, 2.0), vp, &cam, &mut reg, &mut timers, 0.0);
        assert_eq!(outcome, ClickOutcome::Missed);
        assert!(reg.iter().all(|a| !a.is_playing()));
        assert!(timers.pending().is_empty());
    }

    #[test]
    fn short_registry_neither_plays_nor_schedules() {
        let (ctl, cam, vp, mut reg, mut timers) = setup(2);
        let at = screen_of(&cam, vp, glam::Vec3::new(0.0, 16.0, 0.0));
        let outcome = ctl.on_click(at, vp, &cam, &mut reg, &mut timers, 0.0);
        assert_eq!(outcome, ClickOutcome::NotReady { target: TargetId::Upper });
        assert!(timers.pending().is_empty());
        assert!(reg.iter().all(|a| !a.is_playing()));
    }
}
