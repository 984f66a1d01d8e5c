pub mod action;
pub mod clip;
pub mod registry;
pub mod track;

pub use action::{AnimationAction, LoopMode, PlaybackState};
pub use clip::{AnimationClip, Channel, ChannelData};
pub use registry::AnimationRegistry;
pub use track::{Interpolation, Keyframes};
