use std::sync::Arc;

use super::clip::AnimationClip;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Once,
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Playback controller for one clip.
#[derive(Debug, Clone)]
pub struct AnimationAction {
    clip: Arc<AnimationClip>,
    pub time: f32,
    pub time_scale: f32,
    pub loop_mode: LoopMode,
    state: PlaybackState,
}

impl AnimationAction {
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        Self { clip, time: 0.0, time_scale: 1.0, loop_mode: LoopMode::Loop, state: PlaybackState::Stopped }
    }

    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Starts playback from the top. Does nothing if already playing.
    pub fn play(&mut self) {
        if self.state == PlaybackState::Stopped {
            self.time = 0.0;
            self.state = PlaybackState::Playing;
        }
    }

    /// Stops and rewinds. Stopping a stopped action does nothing.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.time = 0.0;
    }

    pub fn update(&mut self, dt: f32) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let duration = self.clip.duration;
        if duration <= 0.0 {
            return;
        }

        self.time += dt * self.time_scale;
        match self.loop_mode {
            LoopMode::Once => self.time = self.time.clamp(0.0, duration),
            LoopMode::Loop => self.time = self.time.rem_euclid(duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::animation::clip::{Channel, ChannelData};
    use crate::model::animation::track::{Interpolation, Keyframes};
    use glam::Vec3;

    fn action(duration: f32) -> AnimationAction {
        let clip = AnimationClip::new(
            "clip",
            vec![Channel {
                node: 0,
                data: ChannelData::Translation(Keyframes::new(vec![0.0, duration], vec![Vec3::ZERO, Vec3::X], Interpolation::Linear)),
            }],
        );
        AnimationAction::new(Arc::new(clip))
    }

    #[test]
    fn stopped_action_does_not_advance() {
        let mut a = action(1.0);
        a.update(0.5);
        assert_eq!(a.time, 0.0);
    }

    #[test]
    fn play_while_playing_keeps_time() {
        let mut a = action(1.0);
        a.play();
        a.update(0.25);
        a.play();
        assert!(a.is_playing());
        assert_eq!(a.time, 0.25);
    }

    #[test]
    fn loop_wraps_time() {
        let mut a = action(1.0);
        a.play();
        a.update(1.25);
        assert!((a.time - 0.25).abs() < 1e-6);
    }

    #[test]
    fn once_clamps_at_end() {
        let mut a = action(1.0);
        a.loop_mode = LoopMode::Once;
        a.play();
        a.update(3.0);
        assert_eq!(a.time, 1.0);
        assert!(a.is_playing());
    }

    #[test]
    fn stop_is_idempotent_and_rewinds() {
        let mut a = action(1.0);
        a.play();
        a.update(0.5);
        a.stop();
        a.stop();
        assert_eq!(a.state(), PlaybackState::Stopped);
        assert_eq!(a.time, 0.0);
    }
}
