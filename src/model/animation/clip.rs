use glam::{Quat, Vec3};

use super::track::Keyframes;

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelData {
    Translation(Keyframes<Vec3>),
    Rotation(Keyframes<Quat>),
    Scale(Keyframes<Vec3>),
}

impl ChannelData {
    fn end_time(&self) -> f32 {
        match self {
            ChannelData::Translation(k) | ChannelData::Scale(k) => k.end_time(),
            ChannelData::Rotation(k) => k.end_time(),
        }
    }
}

/// One animated property of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub node: usize,
    pub data: ChannelData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        let duration = channels.iter().map(|c| c.data.end_time()).fold(0.0_f32, f32::max);
        Self { name: name.into(), duration, channels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::animation::track::Interpolation;

    #[test]
    fn duration_is_longest_channel() {
        let clip = AnimationClip::new(
            "walk",
            vec![
                Channel {
                    node: 0,
                    data: ChannelData::Translation(Keyframes::new(vec![0.0, 1.5], vec![Vec3::ZERO; 2], Interpolation::Linear)),
                },
                Channel {
                    node: 1,
                    data: ChannelData::Rotation(Keyframes::new(vec![0.0, 2.25], vec![Quat::IDENTITY; 2], Interpolation::Linear)),
                },
            ],
        );
        assert_eq!(clip.duration, 2.25);
    }
}
