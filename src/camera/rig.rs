use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::lock_on::LockTransition;
use crate::math::{exp_smoothing, flatten, heading_yaw_deg, look_yaw, pitch_quat, smooth_damp, yaw_quat};
use crate::physics::PhysicsQuery;

/// Camera configuration
#[derive(Component, Reflect, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct CameraConfig {
    /// How quickly the rig catches up with the character (1/s)
    pub follow_speed: f32,
    /// Degrees of rotation per unit of look input
    pub mouse_sensitivity: f32,
    /// Lowest pitch in degrees (negative looks up)
    pub min_pitch: f32,
    /// Highest pitch in degrees (positive looks down)
    pub max_pitch: f32,
    /// How quickly the rig turns toward a locked target (1/s)
    pub lock_rotation_speed: f32,
    /// Targets farther than this from the character can't be locked (m)
    pub lock_on_radius: f32,
    /// Widest angle from the character's facing a target may be acquired at (degrees)
    pub lock_on_view_angle: f32,
    /// Height of the orbit pivot above the character's collider center (m)
    pub pivot_height: f32,
    /// Nominal distance from the pivot to the camera (m)
    pub camera_distance: f32,
    /// Radius of the collision probe (m)
    pub collision_radius: f32,
    /// Gap kept between the camera and whatever it collides with (m)
    pub collision_offset: f32,
    /// The camera never moves closer to the pivot than this (m)
    pub minimum_collision_distance: f32,
    /// Smoothing time of the collision distance (s)
    pub collision_smooth_time: f32,
    /// Fastest the collision distance may change (m/s)
    pub collision_max_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            follow_speed: 20.0,
            mouse_sensitivity: 0.1,
            min_pitch: -30.0,
            max_pitch: 60.0,
            lock_rotation_speed: 8.0,
            lock_on_radius: 15.0,
            lock_on_view_angle: 90.0,
            pivot_height: 0.7,
            camera_distance: 4.0,
            collision_radius: 0.2,
            collision_offset: 0.2,
            minimum_collision_distance: 0.5,
            collision_smooth_time: 0.05,
            collision_max_speed: 30.0,
        }
    }
}

impl CameraConfig {
    pub fn clamp_pitch(&self, pitch: f32) -> f32 {
        pitch.max(self.min_pitch).min(self.max_pitch)
    }

    fn distance_bounds(&self) -> (f32, f32) {
        let nominal = self.camera_distance;
        (self.minimum_collision_distance.min(nominal), nominal)
    }
}

/// Flattened camera axes, committed by the camera each frame and read by the
/// locomotion tick to make movement screen-relative.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub flat_forward: Vec3,
    pub flat_right: Vec3,
}

impl Default for CameraBasis {
    fn default() -> Self {
        Self {
            flat_forward: Vec3::NEG_Z,
            flat_right: Vec3::X,
        }
    }
}

impl CameraBasis {
    pub fn from_yaw(yaw_deg: f32) -> Self {
        let rotation = yaw_quat(yaw_deg);
        Self {
            flat_forward: flatten(rotation * Vec3::NEG_Z),
            flat_right: flatten(rotation * Vec3::X),
        }
    }
}

/// Camera placement produced by a rig tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub translation: Vec3,
    pub rotation: Quat,
    pub pivot: Vec3,
    /// Distance from pivot to camera after collision
    pub distance: f32,
}

impl CameraPose {
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.translation).with_rotation(self.rotation)
    }
}

/// What the rig follows this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RigInput {
    pub character_position: Vec3,
    /// Screen-space look input, +y when the mouse moves down
    pub look_delta: Vec2,
    /// Aim point of the locked target
    pub lock_point: Option<Vec3>,
}

/// Orbit camera state.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    /// Smoothed follow position (character collider center)
    pub position: Vec3,
    /// Degrees, positive turns right
    pub yaw: f32,
    /// Degrees, positive looks down
    pub pitch: f32,
    pub smoothed_distance: f32,
    distance_velocity: f32,
}

impl CameraRig {
    pub fn new(position: Vec3, yaw: f32, config: &CameraConfig) -> Self {
        Self {
            position,
            yaw,
            pitch: 0.0,
            smoothed_distance: config.camera_distance,
            distance_velocity: 0.0,
        }
    }

    pub fn rotation(&self) -> Quat {
        yaw_quat(self.yaw) * pitch_quat(self.pitch)
    }

    pub fn pivot(&self, config: &CameraConfig) -> Vec3 {
        self.position + Vec3::Y * config.pivot_height
    }

    pub fn basis(&self) -> CameraBasis {
        CameraBasis::from_yaw(self.yaw)
    }

    /// Returns to free look behind the character without snapping pitch.
    pub fn reset_to_heading(&mut self, heading_yaw_deg: f32, config: &CameraConfig) {
        self.yaw = heading_yaw_deg;
        self.pitch = config.clamp_pitch(self.pitch);
    }

    /// Follows up a lock button press. A release hands the camera back to
    /// free look behind the character.
    pub fn apply_lock_transition(
        &mut self,
        transition: LockTransition,
        heading_yaw_deg: f32,
        config: &CameraConfig,
    ) {
        if transition == LockTransition::Released {
            self.reset_to_heading(heading_yaw_deg, config);
        }
    }

    fn follow(&mut self, target: Vec3, config: &CameraConfig, dt: f32) {
        self.position = self.position.lerp(target, exp_smoothing(config.follow_speed, dt));
    }

    fn free_look(&mut self, look_delta: Vec2, config: &CameraConfig) {
        self.yaw += look_delta.x * config.mouse_sensitivity;
        self.pitch = config.clamp_pitch(self.pitch + look_delta.y * config.mouse_sensitivity);
    }

    /// Turns toward the lock point. Yaw follows the flat direction to the
    /// target; pitch comes from the target's elevation over the pivot and
    /// never from the character.
    fn locked_look(&mut self, lock_point: Vec3, config: &CameraConfig, dt: f32) {
        let t = exp_smoothing(config.lock_rotation_speed, dt);
        let pivot = self.pivot(config);
        let to_target = lock_point - pivot;

        // Overhead or underfoot targets have no usable heading
        let flat = Vec3::new(to_target.x, 0.0, to_target.z);
        if flat.length_squared() > 1.0e-3
            && let Some(target_yaw) = look_yaw(flat)
        {
            self.yaw = heading_yaw_deg(yaw_quat(self.yaw).slerp(target_yaw, t));
        }

        let target_pitch = -to_target.y.atan2(flat.length()).to_degrees();
        self.pitch = config.clamp_pitch(self.pitch + (target_pitch - self.pitch) * t);
    }

    /// Shortens the boom when something sits between the pivot and the
    /// nominal camera position. The distance eases in and out instead of
    /// popping, and always stays within the configured bounds.
    fn resolve_collision(
        &mut self,
        pivot: Vec3,
        rotation: Quat,
        config: &CameraConfig,
        world: &impl PhysicsQuery,
        dt: f32,
    ) -> f32 {
        let (min_distance, nominal) = config.distance_bounds();

        let desired = Dir3::new(rotation * Vec3::Z)
            .ok()
            .and_then(|back| world.cast_sphere(pivot, config.collision_radius, back, nominal))
            .map_or(nominal, |hit| {
                (pivot.distance(hit.point) - config.collision_offset).clamp(min_distance, nominal)
            });

        let smoothed = smooth_damp(
            self.smoothed_distance,
            desired,
            &mut self.distance_velocity,
            config.collision_smooth_time,
            config.collision_max_speed,
            dt,
        );

        let max_step = config.collision_max_speed * dt;
        let step = (smoothed - self.smoothed_distance).clamp(-max_step, max_step);
        self.smoothed_distance = (self.smoothed_distance + step).clamp(min_distance, nominal);
        self.smoothed_distance
    }

    /// Advances the rig by one frame.
    pub fn tick(
        &mut self,
        input: &RigInput,
        config: &CameraConfig,
        world: &impl PhysicsQuery,
        dt: f32,
    ) -> CameraPose {
        self.follow(input.character_position, config, dt);

        match input.lock_point {
            Some(lock_point) => self.locked_look(lock_point, config, dt),
            None => self.free_look(input.look_delta, config),
        }

        let rotation = self.rotation();
        let pivot = self.pivot(config);
        let distance = self.resolve_collision(pivot, rotation, config, world, dt);

        CameraPose {
            translation: pivot + rotation * Vec3::Z * distance,
            rotation,
            pivot,
            distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWorld;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn basis_is_flat_and_orthogonal() {
        let basis = CameraBasis::from_yaw(37.0);
        assert_relative_eq!(basis.flat_forward.y, 0.0);
        assert_relative_eq!(basis.flat_forward.dot(basis.flat_right), 0.0, epsilon = 1.0e-5);
        assert_relative_eq!(basis.flat_forward.length(), 1.0, epsilon = 1.0e-5);
    }

    #[test]
    fn follow_is_smoothed() {
        let config = CameraConfig::default();
        let world = MockWorld::new();
        let mut rig = CameraRig::new(Vec3::ZERO, 0.0, &config);
        let input = RigInput {
            character_position: Vec3::X * 10.0,
            ..default()
        };

        rig.tick(&input, &config, &world, DT);
        assert!(rig.position.x > 0.0 && rig.position.x < 10.0);

        for _ in 0..300 {
            rig.tick(&input, &config, &world, DT);
        }
        assert_relative_eq!(rig.position.x, 10.0, epsilon = 1.0e-3);
    }

    #[test]
    fn free_look_accumulates_and_clamps_pitch() {
        let config = CameraConfig::default();
        let world = MockWorld::new();
        let mut rig = CameraRig::new(Vec3::ZERO, 0.0, &config);
        let input = RigInput {
            look_delta: Vec2::new(100.0, 10_000.0),
            ..default()
        };

        rig.tick(&input, &config, &world, DT);

        assert_relative_eq!(rig.yaw, 100.0 * config.mouse_sensitivity);
        assert_relative_eq!(rig.pitch, config.max_pitch);

        let input = RigInput {
            look_delta: Vec2::new(0.0, -10_000.0),
            ..default()
        };
        rig.tick(&input, &config, &world, DT);
        assert_relative_eq!(rig.pitch, config.min_pitch);
    }

    #[test]
    fn mouse_down_looks_down() {
        let config = CameraConfig::default();
        let world = MockWorld::new();
        let mut rig = CameraRig::new(Vec3::ZERO, 0.0, &config);
        let input = RigInput {
            look_delta: Vec2::new(0.0, 100.0),
            ..default()
        };

        let pose = rig.tick(&input, &config, &world, DT);

        assert_relative_eq!(rig.pitch, 100.0 * config.mouse_sensitivity);
        let view = pose.rotation * Vec3::NEG_Z;
        assert!(view.y < 0.0);
        // The boom swings up behind the pivot
        assert!(pose.translation.y > pose.pivot.y);
    }

    #[test]
    fn release_resets_yaw_but_lock_does_not() {
        let config = CameraConfig::default();
        let mut rig = CameraRig::new(Vec3::ZERO, 40.0, &config);

        rig.apply_lock_transition(LockTransition::Locked(Entity::PLACEHOLDER), -20.0, &config);
        assert_eq!(rig.yaw, 40.0);

        rig.apply_lock_transition(LockTransition::Released, -20.0, &config);
        assert_eq!(rig.yaw, -20.0);
    }

    #[test]
    fn locked_look_turns_toward_target() {
        let config = CameraConfig::default();
        let world = MockWorld::new();
        let mut rig = CameraRig::new(Vec3::ZERO, 0.0, &config);
        let input = RigInput {
            lock_point: Some(Vec3::new(10.0, 0.0, 0.0)),
            look_delta: Vec2::new(500.0, 500.0),
            ..default()
        };

        for _ in 0..300 {
            rig.tick(&input, &config, &world, DT);
        }

        assert_relative_eq!(rig.yaw, 90.0, epsilon = 0.1);
        // Target below the pivot: look down
        let expected_pitch = config.pivot_height.atan2(10.0).to_degrees();
        assert_relative_eq!(rig.pitch, expected_pitch, epsilon = 0.1);
    }

    #[test]
    fn overhead_target_leaves_yaw_alone() {
        let config = CameraConfig::default();
        let world = MockWorld::new();
        let mut rig = CameraRig::new(Vec3::ZERO, 25.0, &config);
        let input = RigInput {
            lock_point: Some(Vec3::new(0.0, 10.0, 0.0)),
            ..default()
        };

        rig.tick(&input, &config, &world, DT);

        assert_relative_eq!(rig.yaw, 25.0);
        assert!(rig.pitch.is_finite());
        assert!(rig.pitch >= config.min_pitch);
    }

    #[test]
    fn collision_pulls_camera_in_smoothly() {
        let config = CameraConfig::default();
        let mut world = MockWorld::new();
        let mut rig = CameraRig::new(Vec3::ZERO, 0.0, &config);
        let input = RigInput::default();

        rig.tick(&input, &config, &world, DT);
        assert_relative_eq!(rig.smoothed_distance, config.camera_distance);

        // Wall right behind the pivot
        world.spawn_blocker(Vec3::new(0.0, config.pivot_height, 2.5), 1.0);

        let mut previous = rig.smoothed_distance;
        for _ in 0..120 {
            let pose = rig.tick(&input, &config, &world, DT);
            let (min, nominal) = config.distance_bounds();
            assert!(pose.distance >= min && pose.distance <= nominal);
            assert!((pose.distance - previous).abs() <= config.collision_max_speed * DT + 1.0e-5);
            previous = pose.distance;
        }

        // Sphere probe stops at 1.3, minus the offset
        assert_relative_eq!(rig.smoothed_distance, 1.3, epsilon = 1.0e-2);
    }

    #[test]
    fn collision_never_goes_below_minimum() {
        let config = CameraConfig::default();
        let mut world = MockWorld::new();
        world.spawn_blocker(Vec3::new(0.0, config.pivot_height, 0.9), 0.5);
        let mut rig = CameraRig::new(Vec3::ZERO, 0.0, &config);

        for _ in 0..120 {
            rig.tick(&RigInput::default(), &config, &world, DT);
        }

        assert_relative_eq!(rig.smoothed_distance, config.minimum_collision_distance, epsilon = 1.0e-3);
    }

    #[test]
    fn reset_to_heading_keeps_pitch_in_bounds() {
        let config = CameraConfig::default();
        let mut rig = CameraRig::new(Vec3::ZERO, 0.0, &config);
        rig.pitch = 80.0;

        rig.reset_to_heading(-45.0, &config);

        assert_eq!(rig.yaw, -45.0);
        assert_eq!(rig.pitch, config.max_pitch);
    }
}
