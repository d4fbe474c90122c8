pub mod camera;
pub mod config;
pub mod math;
pub mod physics;
pub mod player;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use camera::CameraPlugin;
pub use physics::PhysicsPlugin;
pub use player::PlayerPlugin;

use bevy::prelude::*;

/// Unified plugin that adds physics, the locomotion controller, and the
/// lock-on camera.
pub struct ThirdPersonPlugin;

impl Plugin for ThirdPersonPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<PhysicsPlugin>() {
            app.add_plugins(PhysicsPlugin);
        }
        if !app.is_plugin_added::<PlayerPlugin>() {
            app.add_plugins(PlayerPlugin);
        }
        if !app.is_plugin_added::<CameraPlugin>() {
            app.add_plugins(CameraPlugin);
        }
    }
}

pub mod prelude {
    pub use crate::camera::{
        spawn_camera, CameraBasis, CameraConfig, CameraPlugin, CameraRig, LockOnState,
        LockOnTarget,
    };
    pub use crate::config::{ConfigError, Tuning};
    pub use crate::physics::{GameLayer, GroundState, LandingSeverity, PhysicsPlugin};
    pub use crate::player::{
        spawn_player, AnimationMessage, AnimationTrigger, CharacterBody, InputFrame,
        Interacting, LocomotionParameters, Player, PlayerConfig, PlayerPlugin, RootMotion,
    };
    pub use crate::ThirdPersonPlugin;
}
