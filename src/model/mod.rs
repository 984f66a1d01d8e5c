// MODEL: scene data, animation state and hit volumes
pub mod animation;
pub mod camera;
pub mod ray;
pub mod rig;
pub mod scene;
pub mod targets;
pub mod timer;
pub mod transform;

pub use animation::AnimationRegistry;
pub use camera::{Camera, Viewport};
pub use ray::{Aabb, Ray};
pub use rig::{Model, ModelInstance};
pub use scene::{EnvironmentMap, SceneGraph};
pub use targets::{InteractionTarget, InteractionTargets, TargetId};
pub use timer::{Millis, StopScheduler};
pub use transform::Transform;
