use avian3d::prelude::*;
use bevy::{
    prelude::*,
    window::{CursorGrabMode, CursorOptions, PrimaryWindow},
};
use bevy_third_person::prelude::*;
use rand::prelude::*;

/// Number of lock-on dummies scattered around the arena
const DUMMY_COUNT: usize = 8;

fn main() {
    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Third Person Arena".into(),
            ..default()
        }),
        ..default()
    }))
    .add_plugins(ThirdPersonPlugin);

    // Optional tuning file as the first argument
    if let Some(path) = std::env::args().nth(1) {
        match Tuning::load(&path) {
            Ok(tuning) => {
                info!("loaded tuning from {path}");
                app.insert_resource(tuning);
            }
            Err(err) => warn!("ignoring tuning file {path}: {err}"),
        }
    }

    app.add_systems(Startup, (spawn_arena, setup_cursor_grab))
        .add_systems(Update, (toggle_cursor_grab, play_action_clips, finish_action_clips))
        .run();
}

// ── Arena ────────────────────────────────────────────────────────────

fn spawn_arena(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let ground_mat = materials.add(StandardMaterial {
        base_color: Color::srgb(0.35, 0.55, 0.35),
        perceptual_roughness: 0.9,
        ..default()
    });
    let ramp_mat = materials.add(StandardMaterial {
        base_color: Color::srgb(0.52, 0.50, 0.48),
        perceptual_roughness: 0.8,
        ..default()
    });
    let wall_mat = materials.add(StandardMaterial {
        base_color: Color::srgb(0.38, 0.36, 0.40),
        perceptual_roughness: 0.85,
        ..default()
    });
    let dummy_mat = materials.add(StandardMaterial {
        base_color: Color::srgb(0.7, 0.25, 0.2),
        perceptual_roughness: 0.6,
        ..default()
    });

    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(120.0, 120.0))),
        MeshMaterial3d(ground_mat),
        Transform::default(),
        RigidBody::Static,
        Collider::half_space(Vec3::Y),
        CollisionLayers::new(GameLayer::World, [GameLayer::Player, GameLayer::Target]),
    ));

    // A walkable ramp and one too steep to climb
    spawn_ramp(&mut commands, &mut meshes, ramp_mat.clone(), Vec3::new(-8.0, 0.0, -12.0), 20.0);
    spawn_ramp(&mut commands, &mut meshes, ramp_mat, Vec3::new(8.0, 0.0, -12.0), 60.0);

    // Cover to break lock-on sight lines
    spawn_box(&mut commands, &mut meshes, wall_mat.clone(), Vec3::new(6.0, 3.0, 0.5), Vec3::new(0.0, 1.5, 10.0));
    spawn_box(&mut commands, &mut meshes, wall_mat, Vec3::new(0.5, 3.0, 6.0), Vec3::new(-12.0, 1.5, 4.0));

    let mut rng = thread_rng();
    for _ in 0..DUMMY_COUNT {
        let position = Vec3::new(rng.gen_range(-20.0..20.0), 0.9, rng.gen_range(-25.0..25.0));
        commands.spawn((
            Mesh3d(meshes.add(Capsule3d::new(0.4, 1.0))),
            MeshMaterial3d(dummy_mat.clone()),
            Transform::from_translation(position),
            RigidBody::Static,
            Collider::capsule(0.4, 1.0),
            CollisionLayers::new(GameLayer::Target, [GameLayer::Player, GameLayer::World]),
            LockOnTarget {
                lock_offset: Vec3::Y * 0.6,
            },
        ));
    }

    commands.spawn((
        DirectionalLight {
            illuminance: 14000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.7, 0.5, 0.0)),
    ));

    info!("arena ready with {DUMMY_COUNT} dummies");
}

fn spawn_box(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    material: Handle<StandardMaterial>,
    size: Vec3,
    position: Vec3,
) {
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
        MeshMaterial3d(material),
        Transform::from_translation(position),
        RigidBody::Static,
        Collider::cuboid(size.x, size.y, size.z),
        CollisionLayers::new(GameLayer::World, [GameLayer::Player, GameLayer::Target]),
    ));
}

/// Slab tilted about X, rising toward -Z
fn spawn_ramp(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    material: Handle<StandardMaterial>,
    base: Vec3,
    degrees: f32,
) {
    let size = Vec3::new(5.0, 0.4, 10.0);
    let angle = degrees.to_radians();
    let rotation = Quat::from_rotation_x(angle);
    let center = base + rotation * Vec3::new(0.0, size.y / 2.0, -size.z / 2.0);

    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
        MeshMaterial3d(material),
        Transform::from_translation(center).with_rotation(rotation),
        RigidBody::Static,
        Collider::cuboid(size.x, size.y, size.z),
        CollisionLayers::new(GameLayer::World, [GameLayer::Player, GameLayer::Target]),
    ));
}

// ── Stand-in animation collaborator ──────────────────────────────────

/// How long a blocking clip keeps control of the body
const CLIP_SECONDS: f32 = 0.6;

/// Playing blocking clip
#[derive(Component)]
struct ActionClip(Timer);

/// Plays blocking clips as timers and drives roll root motion
fn play_action_clips(
    mut commands: Commands,
    mut reader: MessageReader<AnimationMessage>,
    bodies: Query<&CharacterBody>,
) {
    for message in reader.read() {
        let AnimationMessage::PlayTrigger {
            entity,
            name,
            blocks_other_actions,
        } = message
        else {
            continue;
        };
        debug!("clip {name}");
        if !blocks_other_actions {
            continue;
        }
        let Ok(body) = bodies.get(*entity) else {
            continue;
        };

        let forward = body.forward();
        let right = body.facing * Vec3::X;
        let root_motion = match *name {
            "Roll_Forward" => forward * 6.0,
            "Roll_Backward" => -forward * 5.0,
            "Roll_Left" => -right * 5.0,
            "Roll_Right" => right * 5.0,
            "Backstep" => -forward * 4.0,
            // Jumps and landings keep physics velocity
            _ => {
                commands
                    .entity(*entity)
                    .insert((Interacting, ActionClip(Timer::from_seconds(CLIP_SECONDS, TimerMode::Once))));
                continue;
            }
        };

        commands.entity(*entity).insert((
            Interacting,
            RootMotion(root_motion),
            ActionClip(Timer::from_seconds(CLIP_SECONDS, TimerMode::Once)),
        ));
    }
}

fn finish_action_clips(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut ActionClip)>,
) {
    for (entity, mut clip) in &mut query {
        if clip.0.tick(time.delta()).just_finished() {
            commands
                .entity(entity)
                .remove::<(Interacting, RootMotion, ActionClip)>();
        }
    }
}

// ── Cursor grab ──────────────────────────────────────────────────────

fn setup_cursor_grab(mut cursor_query: Query<&mut CursorOptions, With<PrimaryWindow>>) {
    if let Ok(mut cursor) = cursor_query.single_mut() {
        cursor.grab_mode = CursorGrabMode::Locked;
        cursor.visible = false;
    }
}

fn toggle_cursor_grab(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut cursor_query: Query<&mut CursorOptions, With<PrimaryWindow>>,
) {
    let Ok(mut cursor) = cursor_query.single_mut() else {
        return;
    };

    if keyboard.just_pressed(KeyCode::Escape) {
        cursor.grab_mode = CursorGrabMode::None;
        cursor.visible = true;
    } else if mouse.just_pressed(MouseButton::Left) && cursor.grab_mode == CursorGrabMode::None {
        cursor.grab_mode = CursorGrabMode::Locked;
        cursor.visible = false;
    }
}
