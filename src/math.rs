//! Heading, smoothing and slope helpers shared by the controller and the camera.
//!
//! Yaw and pitch are expressed in degrees. Positive yaw turns right (clockwise
//! seen from above), positive pitch looks down. Forward is `-Z`.

use bevy::prelude::*;

/// Horizontal magnitude below which a direction has no usable heading.
pub const MIN_HEADING_LENGTH_SQUARED: f32 = 1.0e-6;

/// Rotation about world up for a yaw angle in degrees.
pub fn yaw_quat(yaw_deg: f32) -> Quat {
    Quat::from_rotation_y(-yaw_deg.to_radians())
}

/// Rotation about the local X axis for a pitch angle in degrees.
pub fn pitch_quat(pitch_deg: f32) -> Quat {
    Quat::from_rotation_x(-pitch_deg.to_radians())
}

/// Yaw in degrees of the heading a rotation faces, ignoring any pitch or roll.
pub fn heading_yaw_deg(rotation: Quat) -> f32 {
    let forward = rotation * Vec3::NEG_Z;
    if forward.x * forward.x + forward.z * forward.z < MIN_HEADING_LENGTH_SQUARED {
        return 0.0;
    }
    forward.x.atan2(-forward.z).to_degrees()
}

/// Yaw-only rotation facing along `direction`.
///
/// Returns `None` when the direction has no horizontal component, e.g. a
/// target directly overhead.
pub fn look_yaw(direction: Vec3) -> Option<Quat> {
    if direction.x * direction.x + direction.z * direction.z < MIN_HEADING_LENGTH_SQUARED {
        return None;
    }
    Some(Quat::from_rotation_y((-direction.x).atan2(-direction.z)))
}

/// Drops the vertical component and renormalizes (zero if nothing is left).
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z).normalize_or_zero()
}

/// Interpolation factor for approaching a target at `speed` per second.
///
/// Exponential rather than `speed * dt` so the result does not depend on the
/// tick rate and never overshoots.
pub fn exp_smoothing(speed: f32, dt: f32) -> f32 {
    1.0 - (-speed * dt).exp()
}

/// Angle in degrees between a surface normal and world up.
pub fn slope_angle_deg(normal: Vec3) -> f32 {
    normal.angle_between(Vec3::Y).to_degrees()
}

/// Critically damped spring toward `target`.
///
/// `velocity` carries the spring state between calls. The result never
/// overshoots the target.
pub fn smooth_damp(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    max_speed: f32,
    dt: f32,
) -> f32 {
    if dt <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(1.0e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let max_change = max_speed * smooth_time;
    let change = (current - target).clamp(-max_change, max_change);
    let clamped_target = current - change;

    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = clamped_target + (change + temp) * decay;

    // Overshoot guard
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.0)]
    #[case(45.0)]
    #[case(90.0)]
    #[case(-135.0)]
    #[case(170.0)]
    fn yaw_survives_quat_round_trip(#[case] yaw: f32) {
        assert_relative_eq!(heading_yaw_deg(yaw_quat(yaw)), yaw, epsilon = 1.0e-3);
    }

    #[test]
    fn positive_yaw_turns_right() {
        let forward = yaw_quat(90.0) * Vec3::NEG_Z;
        assert_relative_eq!(forward.x, 1.0, epsilon = 1.0e-5);
        assert_relative_eq!(forward.z, 0.0, epsilon = 1.0e-5);
    }

    #[test]
    fn positive_pitch_looks_down() {
        let forward = pitch_quat(30.0) * Vec3::NEG_Z;
        assert!(forward.y < 0.0);
    }

    #[test]
    fn look_yaw_matches_yaw_quat() {
        let direction = Vec3::new(1.0, 0.3, -1.0);
        let rotation = look_yaw(direction).unwrap();
        assert_relative_eq!(heading_yaw_deg(rotation), 45.0, epsilon = 1.0e-3);
    }

    #[test]
    fn look_yaw_rejects_vertical_directions() {
        assert!(look_yaw(Vec3::Y).is_none());
        assert!(look_yaw(Vec3::ZERO).is_none());
    }

    #[test]
    fn exp_smoothing_is_tick_rate_independent() {
        let one_step = exp_smoothing(10.0, 0.1);
        let half = exp_smoothing(10.0, 0.05);
        let two_steps = 1.0 - (1.0 - half) * (1.0 - half);
        assert_relative_eq!(one_step, two_steps, epsilon = 1.0e-5);
    }

    #[test]
    fn smooth_damp_converges_without_overshoot() {
        let mut value = 4.0;
        let mut velocity = 0.0;
        for _ in 0..240 {
            value = smooth_damp(value, 1.0, &mut velocity, 0.05, f32::INFINITY, 1.0 / 60.0);
            assert!(value >= 1.0);
        }
        assert_relative_eq!(value, 1.0, epsilon = 1.0e-3);
    }

    #[test]
    fn slope_angle_of_flat_ground_is_zero() {
        assert_relative_eq!(slope_angle_deg(Vec3::Y), 0.0, epsilon = 1.0e-4);
        assert_relative_eq!(slope_angle_deg(Vec3::X), 90.0, epsilon = 1.0e-4);
    }
}
