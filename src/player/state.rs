use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::physics::{CapsuleShape, GroundState};

/// Marker component for the player entity (also used as input context)
#[derive(Component, Default)]
pub struct Player;

/// Player movement configuration
#[derive(Component, Reflect, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct PlayerConfig {
    /// Walking speed in m/s (walk held)
    pub walk_speed: f32,
    /// Default movement speed in m/s
    pub run_speed: f32,
    /// Sprinting speed in m/s
    pub sprint_speed: f32,
    /// How quickly the body turns toward its heading (1/s)
    pub rotation_speed: f32,
    /// Vertical velocity change applied by a jump (m/s)
    pub jump_force: f32,
    /// Horizontal carry along the move direction applied by a jump (m/s)
    pub jump_forward_force: f32,
    /// Falls at or below this height play no landing animation (m)
    pub land_short_threshold: f32,
    /// Falls above this height play the normal landing (m)
    pub land_normal_threshold: f32,
    /// Falls above this height play the heavy landing (m)
    pub land_high_threshold: f32,
    /// How far below the capsule the ground probe reaches (m)
    pub ground_check_distance: f32,
    /// Slopes steeper than this (degrees) cannot be walked on
    pub slope_limit_deg: f32,
    /// Downhill acceleration on steep slopes (m/s²)
    pub slide_force: f32,
    /// Time the body stays grounded after losing ground contact (s)
    pub grounded_grace_time: f32,
    /// Downward velocity bias that keeps the body on bumps and stairs (m/s)
    pub stick_to_ground_velocity: f32,
    /// Additional downward acceleration while airborne (m/s²)
    pub extra_gravity: f32,
    /// An airborne body rising faster than this ignores ground contact (m/s)
    pub rise_velocity_threshold: f32,
    /// Reach of the wall probe used to cancel jump carry (m)
    pub wall_probe_distance: f32,
    /// Walls steeper than this (degrees) cancel jump carry
    pub wall_jump_cancel_angle_deg: f32,
    /// Collider radius
    pub radius: f32,
    /// Collider height
    pub height: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 2.0,
            run_speed: 4.0,
            sprint_speed: 6.0,
            rotation_speed: 10.0,
            jump_force: 8.0,
            jump_forward_force: 4.0,
            land_short_threshold: 1.0,
            land_normal_threshold: 2.0,
            land_high_threshold: 5.0,
            ground_check_distance: 0.3,
            slope_limit_deg: 45.0,
            slide_force: 40.0,
            grounded_grace_time: 0.15,
            stick_to_ground_velocity: 1.0,
            extra_gravity: 20.0,
            rise_velocity_threshold: 1.0,
            wall_probe_distance: 0.6,
            wall_jump_cancel_angle_deg: 60.0,
            radius: 0.4,
            height: 1.8,
        }
    }
}

impl PlayerConfig {
    pub fn capsule(&self) -> CapsuleShape {
        CapsuleShape::new(self.radius, self.height)
    }
}

/// Physical state of the character, mirrored from the rigid body at the start
/// of each physics tick and written back at its end.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct CharacterBody {
    /// Collider center
    pub position: Vec3,
    pub velocity: Vec3,
    pub facing: Quat,
    pub is_grounded: bool,
    /// Ground surface normal, world up while airborne
    pub ground_normal: Vec3,
    pub slope_angle_deg: f32,
    pub is_on_steep_slope: bool,
    /// Height at the moment the body last left the ground
    pub fall_start_height: f32,
    /// Physics clock reading of the last ground contact
    pub last_grounded_time: f32,
}

impl Default for CharacterBody {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            facing: Quat::IDENTITY,
            is_grounded: false,
            ground_normal: Vec3::Y,
            slope_angle_deg: 0.0,
            is_on_steep_slope: false,
            fall_start_height: 0.0,
            last_grounded_time: 0.0,
        }
    }
}

impl CharacterBody {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            fall_start_height: position.y,
            ..default()
        }
    }

    pub fn ground_state(&self) -> GroundState {
        match (self.is_grounded, self.is_on_steep_slope) {
            (false, _) => GroundState::Airborne,
            (true, true) => GroundState::OnSteepSlope,
            (true, false) => GroundState::Grounded,
        }
    }

    /// Horizontal facing direction.
    pub fn forward(&self) -> Vec3 {
        crate::math::flatten(self.facing * Vec3::NEG_Z)
    }

    /// Leaves the ground this instant, recording where the fall starts.
    pub fn leave_ground(&mut self) {
        self.is_grounded = false;
        self.is_on_steep_slope = false;
        self.ground_normal = Vec3::Y;
        self.slope_angle_deg = 0.0;
        self.fall_start_height = self.position.y;
    }
}

/// Marker: a blocking action animation is playing.
///
/// Owned by the animation collaborator, which inserts it when a blocking
/// trigger starts and removes it when the clip releases control. The
/// controller only reads it.
#[derive(Component)]
#[component(storage = "SparseSet")]
pub struct Interacting;

/// Velocity extracted from the playing clip while [`Interacting`].
#[derive(Component, Default, Deref, DerefMut)]
pub struct RootMotion(pub Vec3);
