use bevy::ecs::observer::On;
use bevy::prelude::{Component, EntityEvent, Query, Vec2};
use bevy_enhanced_input::prelude::*;

/// Move in a direction (WASD)
#[derive(Debug, InputAction)]
#[action_output(Vec2)]
pub struct MoveAction;

/// Look around (mouse delta)
#[derive(Debug, InputAction)]
#[action_output(Vec2)]
pub struct LookAction;

/// Sprint action (hold)
#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct SprintAction;

/// Walk action (hold)
#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct WalkAction;

/// Jump action
#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct JumpAction;

/// Dodge roll / backstep action
#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct DashAction;

/// Toggle lock-on
#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct LockOnAction;

/// Switch lock to the next target on the left
#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct SwitchTargetLeftAction;

/// Switch lock to the next target on the right
#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct SwitchTargetRightAction;

/// Snapshot of the player's input.
///
/// Level-triggered fields mirror what is held. Edge-triggered fields are set
/// on press and cleared once their consumer has seen them: jump and dash by
/// the physics tick, lock and switch presses at the end of the frame.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    /// Move axes (x = right, y = forward)
    pub move_axes: Vec2,
    /// Mouse delta this frame (+y is down)
    pub look_delta: Vec2,
    pub sprint: bool,
    pub walk: bool,
    pub jump: bool,
    pub dash: bool,
    pub lock_toggle: bool,
    pub switch_left: bool,
    pub switch_right: bool,
}

impl InputFrame {
    /// Move axes normalized to unit length (zero when idle)
    pub fn move_direction(&self) -> Vec2 {
        self.move_axes.normalize_or_zero()
    }
}

/// System to handle move input via observer
pub fn handle_move_input(trigger: On<Fire<MoveAction>>, mut query: Query<&mut InputFrame>) {
    if let Ok(mut frame) = query.get_mut(trigger.event_target()) {
        frame.move_axes = trigger.value;
    }
}

/// Clear move input when all movement keys are released
pub fn handle_move_end(trigger: On<Complete<MoveAction>>, mut query: Query<&mut InputFrame>) {
    if let Ok(mut frame) = query.get_mut(trigger.event_target()) {
        frame.move_axes = Vec2::ZERO;
    }
}

/// System to handle look input via observer
pub fn handle_look_input(trigger: On<Fire<LookAction>>, mut query: Query<&mut InputFrame>) {
    if let Ok(mut frame) = query.get_mut(trigger.event_target()) {
        frame.look_delta = trigger.value;
    }
}

/// Handle sprint start
pub fn handle_sprint_start(trigger: On<Start<SprintAction>>, mut query: Query<&mut InputFrame>) {
    if let Ok(mut frame) = query.get_mut(trigger.event_target()) {
        frame.sprint = true;
    }
}

/// Handle sprint end
pub fn handle_sprint_end(trigger: On<Complete<SprintAction>>, mut query: Query<&mut InputFrame>) {
    if let Ok(mut frame) = query.get_mut(trigger.event_target()) {
        frame.sprint = false;
    }
}

pub fn handle_walk_start(trigger: On<Start<WalkAction>>, mut query: Query<&mut InputFrame>) {
    if let Ok(mut frame) = query.get_mut(trigger.event_target()) {
        frame.walk = true;
    }
}

pub fn handle_walk_end(trigger: On<Complete<WalkAction>>, mut query: Query<&mut InputFrame>) {
    if let Ok(mut frame) = query.get_mut(trigger.event_target()) {
        frame.walk = false;
    }
}

/// Handle jump press
pub fn handle_jump_start(trigger: On<Start<JumpAction>>, mut query: Query<&mut InputFrame>) {
    if let Ok(mut frame) = query.get_mut(trigger.event_target()) {
        frame.jump = true;
    }
}

/// Handle dash press
pub fn handle_dash_start(trigger: On<Start<DashAction>>, mut query: Query<&mut InputFrame>) {
    if let Ok(mut frame) = query.get_mut(trigger.event_target()) {
        frame.dash = true;
    }
}

pub fn handle_lock_on_start(trigger: On<Start<LockOnAction>>, mut query: Query<&mut InputFrame>) {
    if let Ok(mut frame) = query.get_mut(trigger.event_target()) {
        frame.lock_toggle = true;
    }
}

pub fn handle_switch_left_start(
    trigger: On<Start<SwitchTargetLeftAction>>,
    mut query: Query<&mut InputFrame>,
) {
    if let Ok(mut frame) = query.get_mut(trigger.event_target()) {
        frame.switch_left = true;
    }
}

pub fn handle_switch_right_start(
    trigger: On<Start<SwitchTargetRightAction>>,
    mut query: Query<&mut InputFrame>,
) {
    if let Ok(mut frame) = query.get_mut(trigger.event_target()) {
        frame.switch_right = true;
    }
}

/// Ends the jump and dash edges once a physics tick has seen them
pub fn clear_action_edges(mut query: Query<&mut InputFrame>) {
    for mut frame in &mut query {
        frame.jump = false;
        frame.dash = false;
    }
}

/// Clears look delta and lock edges each frame (should run at end of frame)
pub fn clear_frame_input(mut query: Query<&mut InputFrame>) {
    for mut frame in &mut query {
        frame.look_delta = Vec2::ZERO;
        frame.lock_toggle = false;
        frame.switch_left = false;
        frame.switch_right = false;
    }
}
