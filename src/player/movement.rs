use bevy::prelude::*;

use super::actions::{try_jump, try_roll};
use super::animation::{AnimationTrigger, LocomotionParameters};
use super::input::InputFrame;
use super::state::*;
use crate::camera::CameraBasis;
use crate::math::{exp_smoothing, look_yaw};
use crate::physics::PhysicsQuery;

/// Sprinting while locked on requires moving at least this much along the facing
pub const SPRINT_FORWARD_DOT: f32 = 0.7;

/// Input magnitude below which the character counts as idle
const MOVE_THRESHOLD: f32 = 0.1;

/// Flat distance to the lock target below which facing is left unchanged
const MIN_TARGET_DISTANCE_SQUARED: f32 = 0.01;

/// Read-only collaborators for one locomotion tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickContext {
    /// Camera basis committed by the last camera update
    pub basis: CameraBasis,
    /// Position of the current lock target, if locked on
    pub lock_target: Option<Vec3>,
    /// A blocking action animation is playing
    pub interacting: bool,
    /// Root motion velocity supplied by the playing clip
    pub root_motion: Option<Vec3>,
}

/// What a locomotion tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocomotionOutput {
    pub move_direction: Vec3,
    pub sprinting: bool,
    pub walking: bool,
    /// At most one action animation per tick
    pub trigger: Option<AnimationTrigger>,
    pub jump_consumed: bool,
    pub dash_consumed: bool,
    pub parameters: LocomotionParameters,
}

/// Converts move axes into a world-space direction relative to the camera.
pub fn move_direction(axes: Vec2, basis: &CameraBasis) -> Vec3 {
    let axes = axes.normalize_or_zero();
    (basis.flat_forward * axes.y + basis.flat_right * axes.x).normalize_or_zero()
}

/// Sprint needs sprint held and some movement. While locked on it also needs
/// the movement to be roughly along the facing.
pub fn is_sprinting(frame: &InputFrame, move_dir: Vec3, forward: Vec3, locked_on: bool) -> bool {
    frame.sprint
        && frame.move_direction().length() > MOVE_THRESHOLD
        && (!locked_on || move_dir.dot(forward) > SPRINT_FORWARD_DOT)
}

pub fn select_speed(config: &PlayerConfig, sprinting: bool, walking: bool) -> f32 {
    if sprinting {
        config.sprint_speed
    } else if walking {
        config.walk_speed
    } else {
        config.run_speed
    }
}

/// Direction gravity pulls along a surface.
pub fn downhill_direction(normal: Vec3) -> Vec3 {
    Vec3::NEG_Y.reject_from_normalized(normal).normalize_or_zero()
}

/// Sets horizontal velocity directly on walkable ground, keeping vertical.
pub fn drive_velocity(body: &mut CharacterBody, move_dir: Vec3, speed: f32) {
    if !body.is_grounded || body.is_on_steep_slope {
        return;
    }
    body.velocity.x = move_dir.x * speed;
    body.velocity.z = move_dir.z * speed;
}

/// Accelerates the body downhill on steep slopes.
pub fn apply_slide(body: &mut CharacterBody, config: &PlayerConfig, dt: f32) {
    if !body.is_on_steep_slope {
        return;
    }
    body.velocity += downhill_direction(body.ground_normal) * config.slide_force * dt;
}

/// Uses clip root motion as velocity, keeping gravity's vertical component.
///
/// On steep slopes the uphill part of the root motion is dropped and the
/// slide still applies, so an action can't carry the body up a slope.
pub fn apply_root_motion(
    body: &mut CharacterBody,
    root_velocity: Vec3,
    config: &PlayerConfig,
    dt: f32,
) {
    let mut velocity = Vec3::new(root_velocity.x, body.velocity.y, root_velocity.z);

    if body.is_on_steep_slope {
        let downhill = downhill_direction(body.ground_normal);
        let uphill = -downhill;
        if velocity.normalize_or_zero().dot(uphill) > 0.1 {
            velocity -= velocity.project_onto_normalized(uphill);
        }
        velocity += downhill * config.slide_force * dt;
    }

    body.velocity = velocity;
}

/// Turns the body toward the lock target, or else toward the move direction.
/// Yaw only; the camera's pitch never tilts the body.
pub fn face_heading(
    body: &mut CharacterBody,
    move_dir: Vec3,
    lock_target: Option<Vec3>,
    config: &PlayerConfig,
    dt: f32,
) {
    let target = match lock_target {
        Some(position) => {
            let to_target = Vec3::new(position.x - body.position.x, 0.0, position.z - body.position.z);
            if to_target.length_squared() < MIN_TARGET_DISTANCE_SQUARED {
                return;
            }
            look_yaw(to_target)
        }
        None if move_dir.length() > MOVE_THRESHOLD => look_yaw(move_dir),
        None => None,
    };

    if let Some(target) = target {
        body.facing = body
            .facing
            .slerp(target, exp_smoothing(config.rotation_speed, dt))
            .normalize();
    }
}

fn locomotion_parameters(
    body: &CharacterBody,
    frame: &InputFrame,
    config: &PlayerConfig,
    sprinting: bool,
    locked_on: bool,
) -> LocomotionParameters {
    let (forward_speed, lateral_speed) = if locked_on {
        let axes = frame.move_direction();
        (axes.y, axes.x)
    } else {
        let horizontal = Vec2::new(body.velocity.x, body.velocity.z).length();
        (horizontal / config.run_speed, 0.0)
    };

    LocomotionParameters {
        forward_speed,
        lateral_speed,
        sprinting,
        grounded: body.is_grounded,
        locked_on,
    }
}

/// Advances the character by one physics tick.
///
/// Runs after the ground sensor has updated `body` for this tick. Shapes the
/// velocity for the current ground state, turns the body, and gates the roll
/// and jump actions.
pub fn tick(
    body: &mut CharacterBody,
    frame: &InputFrame,
    ctx: &TickContext,
    world: &impl PhysicsQuery,
    config: &PlayerConfig,
    dt: f32,
) -> LocomotionOutput {
    let locked_on = ctx.lock_target.is_some();
    let move_dir = move_direction(frame.move_axes, &ctx.basis);
    let moving = frame.move_direction().length() > MOVE_THRESHOLD;
    let sprinting = is_sprinting(frame, move_dir, body.forward(), locked_on);
    let walking = frame.walk && moving;
    let speed = select_speed(config, sprinting, walking);

    if !ctx.interacting {
        face_heading(body, move_dir, ctx.lock_target, config, dt);
    }

    match ctx.root_motion.filter(|_| ctx.interacting) {
        Some(root_velocity) => apply_root_motion(body, root_velocity, config, dt),
        None => {
            drive_velocity(body, move_dir, speed);
            if !ctx.interacting {
                apply_slide(body, config, dt);
            }
        }
    }

    if !body.is_grounded {
        body.velocity.y -= config.extra_gravity * dt;
    }

    let mut output = LocomotionOutput {
        move_direction: move_dir,
        sprinting,
        walking,
        ..default()
    };

    output.trigger = try_roll(body, frame, move_dir, locked_on, ctx.interacting);
    output.dash_consumed = output.trigger.is_some();

    if output.trigger.is_none() {
        output.trigger = try_jump(body, frame, move_dir, sprinting, ctx.interacting, world, config);
        output.jump_consumed = output.trigger.is_some();
    }

    output.parameters = locomotion_parameters(body, frame, config, sprinting, locked_on);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{heading_yaw_deg, yaw_quat};
    use crate::physics::ground;
    use crate::testing::MockWorld;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const DT: f32 = 1.0 / 60.0;

    fn forward_input() -> InputFrame {
        InputFrame {
            move_axes: Vec2::Y,
            ..default()
        }
    }

    fn grounded_on(world: &MockWorld, config: &PlayerConfig) -> CharacterBody {
        let mut body = CharacterBody::at(Vec3::Y * config.height / 2.0);
        ground::evaluate(&mut body, config.capsule(), config, world, 0.0);
        body
    }

    #[test]
    fn move_direction_follows_camera_basis() {
        let basis = CameraBasis::from_yaw(90.0);
        let dir = move_direction(Vec2::Y, &basis);
        assert_relative_eq!(dir.x, 1.0, epsilon = 1.0e-5);
        assert_relative_eq!(dir.y, 0.0);

        let strafe = move_direction(Vec2::X, &basis);
        assert_relative_eq!(strafe.z, 1.0, epsilon = 1.0e-5);
    }

    #[test]
    fn diagonal_input_is_normalized() {
        let dir = move_direction(Vec2::new(1.0, 1.0), &CameraBasis::default());
        assert_relative_eq!(dir.length(), 1.0, epsilon = 1.0e-5);
    }

    #[rstest]
    #[case(true, true, 6.0)]
    #[case(true, false, 6.0)]
    #[case(false, true, 2.0)]
    #[case(false, false, 4.0)]
    fn speed_priority(#[case] sprinting: bool, #[case] walking: bool, #[case] expected: f32) {
        assert_eq!(select_speed(&PlayerConfig::default(), sprinting, walking), expected);
    }

    #[rstest]
    #[case(Vec3::NEG_Z, false, true)]
    #[case(Vec3::X, false, true)]
    #[case(Vec3::NEG_Z, true, true)]
    #[case(Vec3::X, true, false)]
    #[case(Vec3::Z, true, false)]
    fn sprint_while_locked_needs_forward_motion(
        #[case] move_dir: Vec3,
        #[case] locked: bool,
        #[case] expected: bool,
    ) {
        let frame = InputFrame {
            sprint: true,
            ..forward_input()
        };
        assert_eq!(is_sprinting(&frame, move_dir, Vec3::NEG_Z, locked), expected);
    }

    #[test]
    fn sprint_needs_movement() {
        let frame = InputFrame {
            sprint: true,
            ..default()
        };
        assert!(!is_sprinting(&frame, Vec3::ZERO, Vec3::NEG_Z, false));
    }

    #[test]
    fn walkable_slope_drives_velocity_directly() {
        let config = PlayerConfig::default();
        let world = MockWorld::slope(0.0, 20.0);
        let mut body = grounded_on(&world, &config);
        assert!(!body.is_on_steep_slope);

        let out = tick(&mut body, &forward_input(), &TickContext::default(), &world, &config, DT);

        assert_relative_eq!(body.velocity.z, -config.run_speed, epsilon = 1.0e-5);
        assert_relative_eq!(body.velocity.x, 0.0, epsilon = 1.0e-5);
        assert_eq!(out.trigger, None);
    }

    #[test]
    fn steep_slope_slides_instead_of_climbing() {
        let config = PlayerConfig::default();
        let world = MockWorld::slope(0.0, 60.0);
        let mut body = grounded_on(&world, &config);
        assert!(body.is_on_steep_slope);
        let before = body.velocity;

        tick(&mut body, &forward_input(), &TickContext::default(), &world, &config, DT);

        // Input pushes toward -Z (uphill); the slope pulls toward +Z
        let downhill = downhill_direction(body.ground_normal);
        assert!(downhill.z > 0.0);
        let delta = body.velocity - before;
        assert_relative_eq!(delta.length(), config.slide_force * DT, epsilon = 1.0e-4);
        assert!(delta.dot(downhill) > 0.0);
        assert!(body.velocity.z > before.z);
    }

    #[test]
    fn airborne_body_keeps_horizontal_velocity() {
        let config = PlayerConfig::default();
        let world = MockWorld::new();
        let mut body = CharacterBody::at(Vec3::Y * 10.0);
        body.velocity = Vec3::new(1.0, 0.0, 0.0);

        tick(&mut body, &forward_input(), &TickContext::default(), &world, &config, DT);

        assert_relative_eq!(body.velocity.x, 1.0);
        assert_relative_eq!(body.velocity.z, 0.0);
        assert_relative_eq!(body.velocity.y, -config.extra_gravity * DT, epsilon = 1.0e-6);
    }

    #[test]
    fn body_turns_gradually_toward_move_direction() {
        let config = PlayerConfig::default();
        let mut body = CharacterBody::default();

        face_heading(&mut body, Vec3::X, None, &config, DT);
        let yaw = heading_yaw_deg(body.facing);
        assert!(yaw > 0.0 && yaw < 90.0);

        for _ in 0..240 {
            face_heading(&mut body, Vec3::X, None, &config, DT);
        }
        assert_relative_eq!(heading_yaw_deg(body.facing), 90.0, epsilon = 0.1);
    }

    #[test]
    fn locked_body_faces_target_regardless_of_input() {
        let config = PlayerConfig::default();
        let mut body = CharacterBody::default();
        let target = Vec3::new(-5.0, 3.0, 0.0);

        for _ in 0..240 {
            face_heading(&mut body, Vec3::X, Some(target), &config, DT);
        }

        assert_relative_eq!(heading_yaw_deg(body.facing), -90.0, epsilon = 0.1);
        // No pitch toward the elevated target
        assert_relative_eq!((body.facing * Vec3::NEG_Z).y, 0.0, epsilon = 1.0e-5);
    }

    #[test]
    fn interacting_suppresses_rotation() {
        let config = PlayerConfig::default();
        let world = MockWorld::flat(0.0);
        let mut body = grounded_on(&world, &config);
        body.facing = yaw_quat(0.0);
        let ctx = TickContext {
            interacting: true,
            ..default()
        };
        let frame = InputFrame {
            move_axes: Vec2::X,
            ..default()
        };

        tick(&mut body, &frame, &ctx, &world, &config, DT);

        assert_eq!(body.facing, yaw_quat(0.0));
    }

    #[test]
    fn root_motion_cannot_climb_steep_slope() {
        let config = PlayerConfig::default();
        let world = MockWorld::slope(0.0, 60.0);
        let mut body = grounded_on(&world, &config);
        let uphill = -downhill_direction(body.ground_normal);

        apply_root_motion(&mut body, Vec3::new(0.0, 0.0, -3.0), &config, DT);

        assert!(body.velocity.dot(uphill) <= 1.0e-4);
    }

    #[test]
    fn locked_parameters_report_input_axes() {
        let config = PlayerConfig::default();
        let world = MockWorld::flat(0.0);
        let mut body = grounded_on(&world, &config);
        let ctx = TickContext {
            lock_target: Some(Vec3::new(0.0, 0.0, -5.0)),
            ..default()
        };
        let frame = InputFrame {
            move_axes: Vec2::new(1.0, 0.0),
            ..default()
        };

        let out = tick(&mut body, &frame, &ctx, &world, &config, DT);

        assert!(out.parameters.locked_on);
        assert_relative_eq!(out.parameters.lateral_speed, 1.0);
        assert_relative_eq!(out.parameters.forward_speed, 0.0);
    }
}
