use bevy::prelude::*;

use super::query::{CapsuleShape, PhysicsQuery};
use crate::math::slope_angle_deg;
use crate::player::{CharacterBody, PlayerConfig};

/// Surfaces at or above this angle (degrees) are walls, never slopes
pub const WALL_ANGLE_DEG: f32 = 89.0;

/// Extra probe reach past the configured ground check distance
pub const GROUND_SKIN: f32 = 0.05;

/// Radius scale of the ground probe relative to the collider, so grazing a
/// wall does not read as ground
pub const SENSOR_RADIUS_SCALE: f32 = 0.95;

/// Locomotion state derived from the ground probe each physics tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundState {
    Grounded,
    OnSteepSlope,
    Airborne,
}

/// Landing severity, classified from the fall distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LandingSeverity {
    Short,
    Normal,
    High,
}

impl LandingSeverity {
    /// Classifies a fall against ascending thresholds. Falls at or below the
    /// short threshold don't count as a landing.
    pub fn classify(fall_distance: f32, config: &PlayerConfig) -> Option<Self> {
        if fall_distance > config.land_high_threshold {
            Some(Self::High)
        } else if fall_distance > config.land_normal_threshold {
            Some(Self::Normal)
        } else if fall_distance > config.land_short_threshold {
            Some(Self::Short)
        } else {
            None
        }
    }
}

/// Result of a ground sensor evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundResult {
    pub is_grounded: bool,
    pub normal: Vec3,
    pub slope_angle_deg: f32,
    pub is_on_steep_slope: bool,
    /// Set on the tick the body regains the ground after a long enough fall
    pub landing: Option<LandingSeverity>,
}

impl GroundResult {
    pub fn state(&self) -> GroundState {
        match (self.is_grounded, self.is_on_steep_slope) {
            (false, _) => GroundState::Airborne,
            (true, true) => GroundState::OnSteepSlope,
            (true, false) => GroundState::Grounded,
        }
    }
}

/// A slope is steep when it exceeds the limit but is not yet a wall.
pub fn is_steep_slope(slope_angle_deg: f32, slope_limit_deg: f32) -> bool {
    slope_angle_deg > slope_limit_deg && slope_angle_deg < WALL_ANGLE_DEG
}

/// Probes below the body and updates its grounded state.
///
/// Casts a slightly slimmer capsule straight down from the collider. Contact
/// grounds the body and sticks it to the surface; losing contact only makes
/// it airborne once `grounded_grace_time` has passed, so seams and stair
/// edges don't read as falls. `now` is the physics clock in seconds.
pub fn evaluate(
    body: &mut CharacterBody,
    shape: CapsuleShape,
    config: &PlayerConfig,
    world: &impl PhysicsQuery,
    now: f32,
) -> GroundResult {
    let probe = shape.shrunk(SENSOR_RADIUS_SCALE);
    let reach = config.ground_check_distance + GROUND_SKIN;

    // A body that just jumped ignores the ground it is leaving
    let rising = !body.is_grounded && body.velocity.y > config.rise_velocity_threshold;

    let hit = world
        .cast_capsule(probe, body.position, Dir3::NEG_Y, reach)
        .filter(|_| !rising);

    let mut landing = None;

    if let Some(hit) = hit {
        let normal = hit.normal.normalize_or(Vec3::Y);
        let slope = slope_angle_deg(normal);

        if !body.is_grounded {
            let fall_distance = body.fall_start_height - body.position.y;
            landing = LandingSeverity::classify(fall_distance, config);
            if let Some(severity) = landing {
                debug!("landed ({severity:?}) after falling {fall_distance:.2}m");
            }
        }

        body.is_grounded = true;
        body.last_grounded_time = now;
        body.ground_normal = normal;
        body.slope_angle_deg = slope;
        body.is_on_steep_slope = is_steep_slope(slope, config.slope_limit_deg);

        // Stick to the surface instead of bouncing off bumps
        if body.velocity.y <= 0.0 {
            body.velocity = body.velocity.reject_from_normalized(normal);
            body.velocity.y -= config.stick_to_ground_velocity;
        }
    } else {
        body.ground_normal = Vec3::Y;
        body.slope_angle_deg = 0.0;
        body.is_on_steep_slope = false;

        let in_grace = now - body.last_grounded_time <= config.grounded_grace_time;
        if body.is_grounded && !in_grace {
            body.leave_ground();
        }
    }

    GroundResult {
        is_grounded: body.is_grounded,
        normal: body.ground_normal,
        slope_angle_deg: body.slope_angle_deg,
        is_on_steep_slope: body.is_on_steep_slope,
        landing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWorld;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const DT: f32 = 1.0 / 60.0;

    fn standing_body(config: &PlayerConfig, ground_height: f32) -> CharacterBody {
        CharacterBody::at(Vec3::new(0.0, ground_height + config.height / 2.0, 0.0))
    }

    #[rstest]
    #[case(0.0, false)]
    #[case(20.0, false)]
    #[case(45.0, false)]
    #[case(45.1, true)]
    #[case(60.0, true)]
    #[case(88.9, true)]
    #[case(89.0, false)]
    #[case(90.0, false)]
    fn steep_only_between_limit_and_wall(#[case] angle: f32, #[case] steep: bool) {
        assert_eq!(is_steep_slope(angle, 45.0), steep);
    }

    #[rstest]
    #[case(0.5, None)]
    #[case(1.0, None)]
    #[case(1.5, Some(LandingSeverity::Short))]
    #[case(2.0, Some(LandingSeverity::Short))]
    #[case(3.0, Some(LandingSeverity::Normal))]
    #[case(5.0, Some(LandingSeverity::Normal))]
    #[case(5.1, Some(LandingSeverity::High))]
    fn landing_classification(#[case] distance: f32, #[case] expected: Option<LandingSeverity>) {
        assert_eq!(LandingSeverity::classify(distance, &PlayerConfig::default()), expected);
    }

    #[test]
    fn landing_severity_is_monotonic_in_fall_distance() {
        let config = PlayerConfig::default();
        let mut previous = None;
        for step in 0..200 {
            let severity = LandingSeverity::classify(step as f32 * 0.05, &config);
            assert!(severity >= previous);
            previous = severity;
        }
    }

    #[test]
    fn flat_ground_grounds_the_body() {
        let config = PlayerConfig::default();
        let world = MockWorld::flat(0.0);
        let mut body = standing_body(&config, 0.0);

        let result = evaluate(&mut body, config.capsule(), &config, &world, 0.0);

        assert!(result.is_grounded);
        assert_eq!(result.state(), GroundState::Grounded);
        assert_relative_eq!(result.slope_angle_deg, 0.0, epsilon = 1.0e-3);
        assert!(body.is_grounded);
    }

    #[rstest]
    #[case(20.0, GroundState::Grounded)]
    #[case(60.0, GroundState::OnSteepSlope)]
    fn slope_classification_follows_the_surface(#[case] angle: f32, #[case] state: GroundState) {
        let config = PlayerConfig::default();
        let world = MockWorld::slope(0.0, angle);
        let mut body = standing_body(&config, 0.0);

        let result = evaluate(&mut body, config.capsule(), &config, &world, 0.0);

        assert_eq!(result.state(), state);
        assert_relative_eq!(result.slope_angle_deg, angle, epsilon = 1.0e-2);
    }

    #[test]
    fn near_vertical_surface_is_not_a_steep_slope() {
        let config = PlayerConfig::default();
        let world = MockWorld::slope(0.0, 89.5);
        let mut body = standing_body(&config, 0.0);

        let result = evaluate(&mut body, config.capsule(), &config, &world, 0.0);

        assert!(result.is_grounded);
        assert!(!result.is_on_steep_slope);
    }

    #[test]
    fn grounded_contact_sticks_velocity_to_the_surface() {
        let config = PlayerConfig::default();
        let world = MockWorld::flat(0.0);
        let mut body = standing_body(&config, 0.0);
        body.is_grounded = true;
        body.velocity = Vec3::new(3.0, -4.0, 0.0);

        evaluate(&mut body, config.capsule(), &config, &world, 0.0);

        assert_relative_eq!(body.velocity.x, 3.0, epsilon = 1.0e-5);
        assert_relative_eq!(body.velocity.y, -config.stick_to_ground_velocity, epsilon = 1.0e-5);
    }

    #[test]
    fn rising_velocity_is_left_alone() {
        let config = PlayerConfig::default();
        let world = MockWorld::flat(0.0);
        let mut body = standing_body(&config, 0.0);
        body.is_grounded = true;
        body.velocity = Vec3::new(0.0, 2.0, 0.0);

        evaluate(&mut body, config.capsule(), &config, &world, 0.0);

        assert_relative_eq!(body.velocity.y, 2.0);
    }

    #[test]
    fn short_gap_stays_grounded_within_grace_time() {
        let config = PlayerConfig::default();
        let mut world = MockWorld::flat(0.0);
        let mut body = standing_body(&config, 0.0);
        evaluate(&mut body, config.capsule(), &config, &world, 0.0);

        world.ground = None;
        let result = evaluate(&mut body, config.capsule(), &config, &world, DT);

        assert!(result.is_grounded);
        assert_eq!(result.normal, Vec3::Y);
        assert_eq!(result.slope_angle_deg, 0.0);
    }

    #[test]
    fn losing_ground_past_grace_time_records_fall_start() {
        let config = PlayerConfig::default();
        let mut world = MockWorld::flat(0.0);
        let mut body = standing_body(&config, 0.0);
        evaluate(&mut body, config.capsule(), &config, &world, 0.0);

        world.ground = None;
        body.position.y = 0.7;
        let result = evaluate(
            &mut body,
            config.capsule(),
            &config,
            &world,
            config.grounded_grace_time + DT,
        );

        assert!(!result.is_grounded);
        assert_eq!(result.state(), GroundState::Airborne);
        assert_relative_eq!(body.fall_start_height, 0.7);
    }

    #[test]
    fn landing_emits_exactly_once() {
        let config = PlayerConfig::default();
        let world = MockWorld::flat(0.0);
        let mut body = standing_body(&config, 0.0);
        body.fall_start_height = body.position.y + 3.0;

        let first = evaluate(&mut body, config.capsule(), &config, &world, 0.0);
        let second = evaluate(&mut body, config.capsule(), &config, &world, DT);

        assert_eq!(first.landing, Some(LandingSeverity::Normal));
        assert_eq!(second.landing, None);
    }

    #[test]
    fn jumping_body_ignores_ground_below() {
        let config = PlayerConfig::default();
        let world = MockWorld::flat(0.0);
        let mut body = standing_body(&config, 0.0);
        body.velocity.y = config.jump_force;

        let result = evaluate(&mut body, config.capsule(), &config, &world, 0.0);

        assert!(!result.is_grounded);
    }
}
