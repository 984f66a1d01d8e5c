use std::sync::Arc;

use tracing::debug;

use super::action::AnimationAction;
use super::clip::{AnimationClip, ChannelData};
use crate::error::{Result, ViewerError};
use crate::model::transform::Transform;

/// Actions for the character's clips, in the order the asset declares them.
///
/// Targets refer to entries by position, so entries are only ever appended.
#[derive(Debug, Default)]
pub struct AnimationRegistry {
    actions: Vec<AnimationAction>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds one action per clip. Called once when the character loads.
    pub fn populate(&mut self, clips: &[Arc<AnimationClip>]) {
        self.actions.extend(clips.iter().cloned().map(AnimationAction::new));
        debug!(count = clips.len(), "animation registry populated");
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AnimationAction> {
        self.actions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimationAction> {
        self.actions.iter()
    }

    fn action_mut(&mut self, index: usize) -> Result<&mut AnimationAction> {
        let loaded = self.actions.len();
        self.actions.get_mut(index).ok_or(ViewerError::AnimationNotLoaded { index, loaded })
    }

    pub fn play(&mut self, index: usize) -> Result<()> {
        self.action_mut(index)?.play();
        Ok(())
    }

    pub fn stop(&mut self, index: usize) -> Result<()> {
        self.action_mut(index)?.stop();
        Ok(())
    }

    pub fn is_playing(&self, index: usize) -> bool {
        self.actions.get(index).is_some_and(AnimationAction::is_playing)
    }

    pub fn advance(&mut self, dt: f32) {
        for action in &mut self.actions {
            action.update(dt);
        }
    }

    /// Writes the blended pose of every playing action over `rest`.
    ///
    /// Nodes touched by several actions get the equal-weight average of their
    /// samples; untouched nodes keep their rest transform.
    pub fn pose(&self, rest: &[Transform]) -> Vec<Transform> {
        let mut pose = rest.to_vec();
        let mut weights = vec![[0u32; 3]; rest.len()];

        for action in self.actions.iter().filter(|a| a.is_playing()) {
            for channel in &action.clip().channels {
                let (Some(target), Some(w)) = (pose.get_mut(channel.node), weights.get_mut(channel.node)) else {
                    continue;
                };
                match &channel.data {
                    ChannelData::Translation(k) => {
                        if let Some(v) = k.sample(action.time) {
                            w[0] += 1;
                            target.translation = if w[0] == 1 { v } else { target.translation.lerp(v, 1.0 / w[0] as f32) };
                        }
                    }
                    ChannelData::Rotation(k) => {
                        if let Some(q) = k.sample(action.time) {
                            w[1] += 1;
                            target.rotation = if w[1] == 1 { q } else { target.rotation.slerp(q, 1.0 / w[1] as f32) };
                        }
                    }
                    ChannelData::Scale(k) => {
                        if let Some(v) = k.sample(action.time) {
                            w[2] += 1;
                            target.scale = if w[2] == 1 { v } else { target.scale.lerp(v, 1.0 / w[2] as f32) };
                        }
                    }
                }
            }
        }
        pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::animation::clip::Channel;
    use crate::model::animation::track::{Interpolation, Keyframes};
    use glam::Vec3;

    fn clip(node: usize, to: Vec3) -> Arc<AnimationClip> {
        Arc::new(AnimationClip::new(
            "slide",
            vec![Channel {
                node,
                data: ChannelData::Translation(Keyframes::new(vec![0.0, 1.0], vec![Vec3::ZERO, to], Interpolation::Linear)),
            }],
        ))
    }

    fn registry(n: usize) -> AnimationRegistry {
        let mut reg = AnimationRegistry::new();
        let clips: Vec<_> = (0..n).map(|i| clip(0, Vec3::X * (i + 1) as f32)).collect();
        reg.populate(&clips);
        reg
    }

    #[test]
    fn play_past_end_reports_not_loaded() {
        let mut reg = registry(2);
        let err = reg.play(2).unwrap_err();
        assert!(matches!(err, ViewerError::AnimationNotLoaded { index: 2, loaded: 2 }));
        assert!(reg.iter().all(|a| !a.is_playing()));
    }

    #[test]
    fn populate_keeps_declaration_order() {
        let reg = registry(3);
        let ends: Vec<_> = reg
            .iter()
            .map(|a| match &a.clip().channels[0].data {
                ChannelData::Translation(k) => k.values[1].x,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ends, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn pose_only_reflects_playing_actions() {
        let mut reg = registry(2);
        let rest = vec![Transform::IDENTITY];
        assert_eq!(reg.pose(&rest), rest);

        reg.play(0).unwrap();
        reg.advance(0.5);
        assert_eq!(reg.pose(&rest)[0].translation, Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn overlapping_actions_average() {
        let mut reg = registry(2);
        reg.play(0).unwrap();
        reg.play(1).unwrap();
        reg.advance(0.5);
        // 0.5 and 1.0 along X
        let pose = reg.pose(&[Transform::IDENTITY]);
        assert!((pose[0].translation.x - 0.75).abs() < 1e-6);
    }

    #[test]
    fn channels_for_missing_nodes_are_ignored() {
        let mut reg = AnimationRegistry::new();
        reg.populate(&[clip(5, Vec3::X)]);
        reg.play(0).unwrap();
        reg.advance(0.5);
        assert_eq!(reg.pose(&[Transform::IDENTITY]), vec![Transform::IDENTITY]);
    }
}
