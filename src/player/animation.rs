use bevy::prelude::*;

use crate::physics::LandingSeverity;

/// Action animations the controller can request by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationTrigger {
    Jump,
    Backstep,
    RollForward,
    RollBackward,
    RollLeft,
    RollRight,
    Land(LandingSeverity),
}

impl AnimationTrigger {
    /// Clip name understood by the animation collaborator
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jump => "Jump",
            Self::Backstep => "Backstep",
            Self::RollForward => "Roll_Forward",
            Self::RollBackward => "Roll_Backward",
            Self::RollLeft => "Roll_Left",
            Self::RollRight => "Roll_Right",
            Self::Land(LandingSeverity::Short) => "Land_Short",
            Self::Land(LandingSeverity::Normal) => "Land",
            Self::Land(LandingSeverity::High) => "Land_High",
        }
    }

    /// Whether the clip takes over the body until it finishes
    pub fn blocks_other_actions(&self) -> bool {
        !matches!(self, Self::Land(LandingSeverity::Short))
    }
}

/// Blend parameters for the locomotion animation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocomotionParameters {
    pub forward_speed: f32,
    pub lateral_speed: f32,
    pub sprinting: bool,
    pub grounded: bool,
    pub locked_on: bool,
}

/// Requests sent to the animation collaborator.
///
/// Consumers subscribe with `MessageReader<AnimationMessage>` to drive an
/// animation graph. The controller only names clips; blending and timing
/// belong to the consumer.
#[derive(Message, Clone, Debug)]
pub enum AnimationMessage {
    PlayTrigger {
        entity: Entity,
        name: &'static str,
        blocks_other_actions: bool,
    },
    Locomotion {
        entity: Entity,
        parameters: LocomotionParameters,
    },
}

impl AnimationMessage {
    pub fn trigger(entity: Entity, trigger: AnimationTrigger) -> Self {
        Self::PlayTrigger {
            entity,
            name: trigger.name(),
            blocks_other_actions: trigger.blocks_other_actions(),
        }
    }
}
