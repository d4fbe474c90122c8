//! Tuning files: player and camera tunables loaded from JSON.
//!
//! Every field is optional; missing fields keep their defaults.
//!
//! ```json
//! { "player": { "sprint_speed": 7.5 }, "camera": { "lock_on_radius": 20.0 } }
//! ```

use std::path::Path;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::CameraConfig;
use crate::player::PlayerConfig;

/// Errors raised while loading a tuning file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Player and camera tunables.
///
/// Inserted as a resource before startup, it replaces the defaults the player
/// and camera spawn with.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerConfig,
    pub camera: CameraConfig,
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: "must be positive",
        })
    }
}

impl Tuning {
    /// Parses and validates a tuning document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects values the controller and camera can't work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let player = &self.player;
        let camera = &self.camera;

        positive("player.walk_speed", player.walk_speed)?;
        positive("player.run_speed", player.run_speed)?;
        positive("player.sprint_speed", player.sprint_speed)?;
        positive("player.rotation_speed", player.rotation_speed)?;
        positive("player.radius", player.radius)?;
        positive("camera.follow_speed", camera.follow_speed)?;
        positive("camera.lock_rotation_speed", camera.lock_rotation_speed)?;
        positive("camera.lock_on_radius", camera.lock_on_radius)?;
        positive("camera.camera_distance", camera.camera_distance)?;

        if player.height < player.radius * 2.0 {
            return Err(ConfigError::Invalid {
                field: "player.height",
                reason: "must be at least twice the radius",
            });
        }

        if !(player.land_short_threshold < player.land_normal_threshold
            && player.land_normal_threshold < player.land_high_threshold)
        {
            return Err(ConfigError::Invalid {
                field: "player.land_*_threshold",
                reason: "landing thresholds must be strictly ascending",
            });
        }

        if camera.min_pitch >= camera.max_pitch {
            return Err(ConfigError::Invalid {
                field: "camera.min_pitch",
                reason: "must be below max_pitch",
            });
        }

        if camera.minimum_collision_distance > camera.camera_distance {
            return Err(ConfigError::Invalid {
                field: "camera.minimum_collision_distance",
                reason: "must not exceed camera_distance",
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn partial_documents_keep_defaults() {
        let tuning = Tuning::from_json(r#"{ "player": { "sprint_speed": 7.5 } }"#).unwrap();

        assert_eq!(tuning.player.sprint_speed, 7.5);
        assert_eq!(tuning.player.run_speed, PlayerConfig::default().run_speed);
        assert_eq!(tuning.camera, CameraConfig::default());
    }

    #[test]
    fn survives_serialization() {
        let mut tuning = Tuning::default();
        tuning.camera.lock_on_radius = 22.0;

        let parsed = Tuning::from_json(&tuning.to_json().unwrap()).unwrap();

        assert_eq!(parsed, tuning);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(Tuning::from_json("{ player: "), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            Tuning::load("/nonexistent/tuning.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[rstest]
    #[case(r#"{ "player": { "run_speed": 0.0 } }"#, "player.run_speed")]
    #[case(r#"{ "player": { "land_normal_threshold": 0.5 } }"#, "player.land_*_threshold")]
    #[case(r#"{ "player": { "radius": 1.0, "height": 1.5 } }"#, "player.height")]
    #[case(r#"{ "camera": { "min_pitch": 70.0 } }"#, "camera.min_pitch")]
    #[case(r#"{ "camera": { "lock_on_radius": -1.0 } }"#, "camera.lock_on_radius")]
    #[case(
        r#"{ "camera": { "minimum_collision_distance": 5.0 } }"#,
        "camera.minimum_collision_distance"
    )]
    fn invalid_values_are_rejected(#[case] json: &str, #[case] expected: &str) {
        match Tuning::from_json(json) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected invalid `{expected}`, got {other:?}"),
        }
    }
}
