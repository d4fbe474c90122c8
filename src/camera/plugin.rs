use avian3d::prelude::*;
use bevy::prelude::*;

use super::lock_on::*;
use super::rig::*;
use super::targets::{LockOnTarget, TargetSet};
use super::viewport::ViewProjection;
use crate::config::Tuning;
use crate::math::heading_yaw_deg;
use crate::physics::{AvianQuery, GameLayer};
use crate::player::{CharacterBody, InputFrame, Player};

/// Plugin for the third-person camera and lock-on
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<CameraConfig>();
        app.register_type::<LockOnTarget>();

        app.add_systems(Startup, spawn_camera);

        app.add_systems(Update, (handle_lock_on_input, update_camera_rig).chain());
    }
}

/// Sight lines see world geometry and targets, never the player
fn sight_filter(player: Entity) -> SpatialQueryFilter {
    SpatialQueryFilter::default()
        .with_mask([GameLayer::World, GameLayer::Target])
        .with_excluded_entities([player])
}

/// The camera boom only collides with world geometry
fn boom_filter(player: Entity) -> SpatialQueryFilter {
    SpatialQueryFilter::default()
        .with_mask(GameLayer::World)
        .with_excluded_entities([player])
}

/// Spawns the follow camera
pub fn spawn_camera(mut commands: Commands, tuning: Option<Res<Tuning>>) {
    let config = tuning.map(|tuning| tuning.camera).unwrap_or_default();
    let rig = CameraRig::new(Vec3::ZERO, 0.0, &config);

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 60.0_f32.to_radians(),
            ..default()
        }),
        rig,
        config,
        LockOnState::default(),
        rig.basis(),
        Transform::from_translation(rig.pivot(&config) + Vec3::Z * config.camera_distance),
    ));
}

/// Toggles and switches the lock from this frame's input edges
pub fn handle_lock_on_input(
    spatial: SpatialQuery,
    player_query: Query<(Entity, &CharacterBody, &InputFrame), With<Player>>,
    targets_query: Query<(Entity, &GlobalTransform, &LockOnTarget)>,
    mut camera_query: Query<(&Camera, &GlobalTransform, &CameraConfig, &mut CameraRig, &mut LockOnState)>,
) {
    let Ok((player, body, frame)) = player_query.single() else {
        return;
    };
    if !(frame.lock_toggle || frame.switch_left || frame.switch_right) {
        return;
    }
    let Ok((camera, camera_transform, config, mut rig, mut state)) = camera_query.single_mut() else {
        return;
    };

    let targets: TargetSet = targets_query.iter().collect();
    let viewport = ViewProjection::from_camera(camera, camera_transform);
    let physics = AvianQuery::new(&spatial, sight_filter(player));
    let scene = LockOnScene {
        physics: &physics,
        targets: &targets,
        viewport: &viewport,
        character: Some(player),
        character_position: body.position,
        character_forward: body.forward(),
        camera_right: rig.basis().flat_right,
    };

    if frame.lock_toggle {
        match state.press_lock(&scene, &mut rig, heading_yaw_deg(body.facing), config) {
            LockTransition::Locked(target) => debug!("locked on {target}"),
            LockTransition::Released => debug!("lock released"),
        }
        return;
    }

    let Some(current) = state.lock_target else {
        return;
    };
    let direction = if frame.switch_left {
        SwitchDirection::Left
    } else {
        SwitchDirection::Right
    };
    if let Some(next) = scene.switch_target(current, direction, config) {
        state.lock_target = Some(next);
        debug!("lock switched {current} -> {next} ({direction:?})");
    }
}

/// Revalidates the lock, then moves the camera and commits its basis
pub fn update_camera_rig(
    time: Res<Time>,
    spatial: SpatialQuery,
    player_query: Query<(Entity, &CharacterBody, &InputFrame), With<Player>>,
    targets_query: Query<(Entity, &GlobalTransform, &LockOnTarget)>,
    mut camera_query: Query<
        (
            &Camera,
            &GlobalTransform,
            &CameraConfig,
            &mut CameraRig,
            &mut LockOnState,
            &mut CameraBasis,
            &mut Transform,
        ),
        Without<Player>,
    >,
) {
    let Ok((player, body, frame)) = player_query.single() else {
        return;
    };
    let Ok((camera, camera_transform, config, mut rig, mut state, mut basis, mut transform)) =
        camera_query.single_mut()
    else {
        return;
    };

    let targets: TargetSet = targets_query.iter().collect();

    if state.is_locked_on() {
        let viewport = ViewProjection::from_camera(camera, camera_transform);
        let physics = AvianQuery::new(&spatial, sight_filter(player));
        let scene = LockOnScene {
            physics: &physics,
            targets: &targets,
            viewport: &viewport,
            character: Some(player),
            character_position: body.position,
            character_forward: body.forward(),
            camera_right: basis.flat_right,
        };

        // Fall back to free look this same frame, from the character's heading
        state.revalidate_with_rig(&scene, &mut rig, heading_yaw_deg(body.facing), config);
    }

    let input = RigInput {
        character_position: body.position,
        look_delta: frame.look_delta,
        lock_point: state
            .lock_target
            .and_then(|target| targets.get(target))
            .map(|entry| entry.lock_point),
    };

    let boom = AvianQuery::new(&spatial, boom_filter(player));
    let pose = rig.tick(&input, config, &boom, time.delta_secs());

    *transform = pose.transform();
    *basis = rig.basis();
}
