use avian3d::prelude::*;
use bevy::prelude::*;
use bevy_enhanced_input::prelude::*;

use super::animation::{AnimationMessage, AnimationTrigger};
use super::input::*;
use super::movement::{self, TickContext};
use super::state::*;
use crate::camera::{CameraBasis, LockOnState, LockOnTarget};
use crate::config::Tuning;
use crate::physics::{ground, AvianQuery, GameLayer};

/// Plugin for the third-person locomotion controller
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EnhancedInputPlugin);

        app.add_input_context::<Player>();
        app.add_message::<AnimationMessage>();
        app.register_type::<PlayerConfig>();

        // Input observers
        app.add_observer(handle_move_input);
        app.add_observer(handle_move_end);
        app.add_observer(handle_look_input);
        app.add_observer(handle_sprint_start);
        app.add_observer(handle_sprint_end);
        app.add_observer(handle_walk_start);
        app.add_observer(handle_walk_end);
        app.add_observer(handle_jump_start);
        app.add_observer(handle_dash_start);
        app.add_observer(handle_lock_on_start);
        app.add_observer(handle_switch_left_start);
        app.add_observer(handle_switch_right_start);

        app.add_systems(Startup, spawn_player);

        // Fixed update systems for physics
        app.add_systems(
            FixedUpdate,
            (
                sync_body_from_physics,
                sense_ground,
                run_locomotion,
                write_body_to_physics,
                clear_action_edges,
            )
                .chain(),
        );

        // Look delta and lock edges belong to the render frame
        app.add_systems(Last, clear_frame_input);
    }
}

/// Ground probes see world geometry only
fn ground_filter(player: Entity) -> SpatialQueryFilter {
    SpatialQueryFilter::default()
        .with_mask(GameLayer::World)
        .with_excluded_entities([player])
}

/// Mirrors the rigid body into [`CharacterBody`] at the start of the tick
pub fn sync_body_from_physics(
    mut query: Query<(&Position, &LinearVelocity, &Rotation, &mut CharacterBody), With<Player>>,
) {
    for (position, velocity, rotation, mut body) in &mut query {
        body.position = position.0;
        body.velocity = velocity.0;
        body.facing = rotation.0;
    }
}

/// Runs the ground sensor and requests landing animations
pub fn sense_ground(
    spatial: SpatialQuery,
    time: Res<Time>,
    mut query: Query<(Entity, &PlayerConfig, &mut CharacterBody), With<Player>>,
    mut writer: MessageWriter<AnimationMessage>,
) {
    let now = time.elapsed_secs();

    for (entity, config, mut body) in &mut query {
        let world = AvianQuery::new(&spatial, ground_filter(entity));
        let result = ground::evaluate(&mut body, config.capsule(), config, &world, now);

        if let Some(severity) = result.landing {
            writer.write(AnimationMessage::trigger(entity, AnimationTrigger::Land(severity)));
        }
    }
}

/// Advances locomotion and forwards triggers and blend parameters
pub fn run_locomotion(
    spatial: SpatialQuery,
    time: Res<Time>,
    mut query: Query<
        (
            Entity,
            &PlayerConfig,
            &InputFrame,
            &mut CharacterBody,
            Has<Interacting>,
            Option<&RootMotion>,
        ),
        With<Player>,
    >,
    camera_query: Query<(&CameraBasis, &LockOnState)>,
    targets: Query<&GlobalTransform, With<LockOnTarget>>,
    mut writer: MessageWriter<AnimationMessage>,
) {
    let dt = time.delta_secs();

    // Without a camera, movement falls back to world axes
    let (basis, lock_target) = match camera_query.single() {
        Ok((basis, state)) => (
            *basis,
            state
                .lock_target
                .and_then(|target| targets.get(target).ok())
                .map(GlobalTransform::translation),
        ),
        Err(_) => (CameraBasis::default(), None),
    };

    for (entity, config, frame, mut body, interacting, root_motion) in &mut query {
        let ctx = TickContext {
            basis,
            lock_target,
            interacting,
            root_motion: root_motion.map(|motion| motion.0),
        };

        let world = AvianQuery::new(&spatial, ground_filter(entity));
        let output = movement::tick(&mut body, frame, &ctx, &world, config, dt);

        if let Some(trigger) = output.trigger {
            writer.write(AnimationMessage::trigger(entity, trigger));
        }
        writer.write(AnimationMessage::Locomotion {
            entity,
            parameters: output.parameters,
        });
    }
}

/// Hands the tick's velocity and facing back to the rigid body
pub fn write_body_to_physics(
    mut query: Query<(&CharacterBody, &mut LinearVelocity, &mut Rotation), With<Player>>,
) {
    for (body, mut velocity, mut rotation) in &mut query {
        velocity.0 = body.velocity;
        rotation.0 = body.facing;
    }
}

/// Spawns the player entity with all required components
pub fn spawn_player(mut commands: Commands, tuning: Option<Res<Tuning>>) {
    let config = tuning.map(|tuning| tuning.player).unwrap_or_default();
    let spawn_position = Vec3::new(0.0, config.height / 2.0 + 0.1, 0.0);

    commands
        .spawn((
            Player,
            config,
            CharacterBody::at(spawn_position),
            InputFrame::default(),
        ))
        .insert((
            // Physics - dynamic body with locked rotation; the controller owns velocity
            RigidBody::Dynamic,
            Collider::capsule(config.radius, config.capsule().segment_length()),
            CollisionLayers::new(
                GameLayer::Player,
                [GameLayer::World, GameLayer::Target, GameLayer::Trigger],
            ),
            LockedAxes::ROTATION_LOCKED,
            LinearVelocity::default(),
            TransformInterpolation,
            Friction::new(0.0),
            Restitution::new(0.0),
        ))
        .insert((
            Transform::from_translation(spawn_position),
            Visibility::default(),
        ))
        .insert(
            // Input bindings
            actions!(Player[
                (
                    Action::<MoveAction>::new(),
                    bindings![
                        (KeyCode::KeyW, SwizzleAxis::YXZ),
                        (KeyCode::KeyS, SwizzleAxis::YXZ, Negate::all()),
                        KeyCode::KeyD,
                        (KeyCode::KeyA, Negate::all()),
                    ],
                ),
                (
                    Action::<LookAction>::new(),
                    bindings![
                        Binding::mouse_motion(),
                    ],
                ),
                (
                    Action::<SprintAction>::new(),
                    bindings![KeyCode::ShiftLeft, GamepadButton::East],
                ),
                (
                    Action::<WalkAction>::new(),
                    bindings![KeyCode::KeyC, GamepadButton::LeftTrigger],
                ),
                (
                    Action::<JumpAction>::new(),
                    bindings![KeyCode::KeyF, GamepadButton::North],
                ),
                (
                    Action::<DashAction>::new(),
                    bindings![KeyCode::Space, GamepadButton::South],
                ),
                (
                    Action::<LockOnAction>::new(),
                    bindings![KeyCode::Tab, GamepadButton::RightThumb],
                ),
                (
                    Action::<SwitchTargetLeftAction>::new(),
                    bindings![KeyCode::KeyQ, GamepadButton::DPadLeft],
                ),
                (
                    Action::<SwitchTargetRightAction>::new(),
                    bindings![KeyCode::KeyE, GamepadButton::DPadRight],
                ),
            ]),
        );
}
