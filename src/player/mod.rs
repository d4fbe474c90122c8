pub mod actions;
pub mod animation;
pub mod input;
pub mod movement;
mod plugin;
mod state;

pub use animation::{AnimationMessage, AnimationTrigger, LocomotionParameters};
pub use input::InputFrame;
pub use movement::{LocomotionOutput, TickContext};
pub use plugin::{spawn_player, PlayerPlugin};
pub use state::*;
