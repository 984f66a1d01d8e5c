// CONTROLLER: Input, interaction and the update loop
pub mod frame_loop;
pub mod input;
pub mod interaction;
pub mod orbit;
pub mod tracking;

pub use frame_loop::FrameLoopContext;
pub use input::{InputEvent, InputState, MouseButton};
pub use interaction::{ClickOutcome, PointerInteractionController};
pub use orbit::OrbitControls;
pub use tracking::{world_point, PointerTrackingController};
