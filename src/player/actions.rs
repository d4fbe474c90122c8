use bevy::prelude::*;

use super::animation::AnimationTrigger;
use super::input::InputFrame;
use super::movement::downhill_direction;
use super::state::*;
use crate::math::slope_angle_deg;
use crate::physics::PhysicsQuery;

/// On steep slopes actions need movement at least this aligned with downhill
pub const SLOPE_ALIGNMENT_DOT: f32 = 0.5;

/// Radius scale of the wall probe, keeping it off the floor
const WALL_PROBE_RADIUS_SCALE: f32 = 0.9;

/// Input below this squared magnitude counts as standing still
const STATIONARY_INPUT_SQUARED: f32 = 0.01;

/// Actions are allowed on steep slopes only when heading downhill.
pub fn slope_permits(body: &CharacterBody, move_dir: Vec3) -> bool {
    !body.is_on_steep_slope
        || move_dir.dot(downhill_direction(body.ground_normal)) >= SLOPE_ALIGNMENT_DOT
}

/// Picks the roll clip for the current input.
///
/// Locked on, the roll follows the input relative to the target: backward
/// beats sideways, sideways beats forward. Free, any input rolls forward
/// since the body already faces the move direction.
pub fn roll_variant(axes: Vec2, locked_on: bool) -> AnimationTrigger {
    if axes.length_squared() < STATIONARY_INPUT_SQUARED {
        return AnimationTrigger::Backstep;
    }
    if !locked_on {
        return AnimationTrigger::RollForward;
    }

    if axes.y < 0.0 {
        AnimationTrigger::RollBackward
    } else if axes.x > 0.0 {
        AnimationTrigger::RollRight
    } else if axes.x < 0.0 {
        AnimationTrigger::RollLeft
    } else {
        AnimationTrigger::RollForward
    }
}

/// Starts a roll or backstep on a dash press.
pub fn try_roll(
    body: &CharacterBody,
    frame: &InputFrame,
    move_dir: Vec3,
    locked_on: bool,
    interacting: bool,
) -> Option<AnimationTrigger> {
    if !frame.dash || !body.is_grounded || interacting || !slope_permits(body, move_dir) {
        return None;
    }

    let trigger = roll_variant(frame.move_axes, locked_on);
    debug!("dash -> {}", trigger.name());
    Some(trigger)
}

/// Whether a wall right ahead should swallow the jump's horizontal carry.
fn wall_ahead(body: &CharacterBody, move_dir: Vec3, world: &impl PhysicsQuery, config: &PlayerConfig) -> bool {
    let Ok(direction) = Dir3::new(move_dir) else {
        return false;
    };

    world
        .cast_capsule(
            config.capsule().shrunk(WALL_PROBE_RADIUS_SCALE),
            body.position,
            direction,
            config.wall_probe_distance,
        )
        .is_some_and(|hit| slope_angle_deg(hit.normal) > config.wall_jump_cancel_angle_deg)
}

/// Launches a sprinting jump.
///
/// Only a sprint can jump. The vertical velocity is reset first so the jump
/// height doesn't depend on what the body was doing, then the jump impulse and
/// the forward carry are added. The body leaves the ground immediately.
pub fn try_jump(
    body: &mut CharacterBody,
    frame: &InputFrame,
    move_dir: Vec3,
    sprinting: bool,
    interacting: bool,
    world: &impl PhysicsQuery,
    config: &PlayerConfig,
) -> Option<AnimationTrigger> {
    if !frame.jump || !body.is_grounded || !sprinting || interacting {
        return None;
    }
    if !slope_permits(body, move_dir) {
        return None;
    }

    let carry = if wall_ahead(body, move_dir, world, config) {
        Vec3::ZERO
    } else {
        move_dir
    };

    body.velocity.y = 0.0;
    body.velocity += Vec3::Y * config.jump_force + carry * config.jump_forward_force;
    body.leave_ground();

    debug!("jump, velocity {:?}", body.velocity);
    Some(AnimationTrigger::Jump)
}
